use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use common::Book;
use tokio::sync::RwLock;

use crate::error::Result;

/// A replica's local book map.
///
/// Each replica owns exactly one store; nothing is shared between replicas
/// except through the chain protocol.
#[derive(Debug, Clone, Default)]
pub struct BookStore {
    books: Arc<RwLock<HashMap<String, Book>>>,
}

impl BookStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `books`.
    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let books = books
            .into_iter()
            .map(|book| (book.id.clone(), book))
            .collect();
        Self {
            books: Arc::new(RwLock::new(books)),
        }
    }

    /// Loads a catalog file: a JSON object whose values are books.
    ///
    /// The keys are ignored; books are indexed by their own `id`.
    pub fn from_catalog_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_catalog_json(&raw)
    }

    /// Parses a catalog from its JSON text.
    pub fn from_catalog_json(raw: &str) -> Result<Self> {
        let catalog: HashMap<String, Book> = serde_json::from_str(raw)?;
        Ok(Self::with_books(catalog.into_values()))
    }

    /// Returns the stored copy of a book.
    pub async fn get(&self, id: &str) -> Option<Book> {
        self.books.read().await.get(id).cloned()
    }

    /// Overwrites (or inserts) a book.
    pub async fn put(&self, book: Book) {
        self.books.write().await.insert(book.id.clone(), book);
    }

    /// Returns all books ordered by id.
    pub async fn list(&self) -> Vec<Book> {
        let mut books: Vec<Book> = self.books.read().await.values().cloned().collect();
        books.sort_by(|a, b| a.id.cmp(&b.id));
        books
    }

    /// Returns the number of books held.
    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }

    /// Returns true if the store holds no books.
    pub async fn is_empty(&self) -> bool {
        self.books.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = BookStore::new();
        store.put(Book::new("B1", "Dune", 5)).await;
        store.put(Book::new("B1", "Dune", 3)).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("B1").await.unwrap().copies_available, 3);
    }

    #[tokio::test]
    async fn test_missing_book() {
        let store = BookStore::new();
        assert!(store.get("nope").await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let store = BookStore::with_books(vec![
            Book::new("B3", "Emma", 1),
            Book::new("B1", "Dune", 5),
            Book::new("B2", "Ulysses", 2),
        ]);
        let ids: Vec<String> = store.list().await.into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["B1", "B2", "B3"]);
    }

    #[tokio::test]
    async fn test_catalog_json_is_keyed_by_book_id() {
        let store = BookStore::from_catalog_json(
            r#"{
                "1": {"id": "B1", "title": "Dune", "author": "Herbert", "copiesAvailable": 5},
                "2": {"id": "B2", "title": "Emma", "copiesAvailable": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.get("B1").await.unwrap().author, "Herbert");
        assert!(store.get("1").await.is_none());
    }

    #[test]
    fn test_malformed_catalog() {
        assert!(BookStore::from_catalog_json("[1, 2]").is_err());
    }
}
