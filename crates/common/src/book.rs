//! The book record held by every inventory replica.

use serde::{Deserialize, Serialize};

/// A book in the inventory.
///
/// `copies_available` is unsigned: a stock level below zero cannot be
/// represented, so any deduction that would produce one has to be rejected
/// before an update is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub copies: u32,
    pub copies_available: u32,
    #[serde(default)]
    pub price: f64,
}

impl Book {
    /// Creates a book with the given stock and empty descriptive fields.
    pub fn new(id: impl Into<String>, title: impl Into<String>, copies_available: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: String::new(),
            description: String::new(),
            copies: copies_available,
            copies_available,
            price: 0.0,
        }
    }

    /// Returns a copy of this book with `quantity` copies removed, or `None`
    /// when fewer than `quantity` copies are available.
    pub fn deduct(&self, quantity: u32) -> Option<Book> {
        let remaining = self.copies_available.checked_sub(quantity)?;
        Some(Book {
            copies_available: remaining,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduct_within_stock() {
        let book = Book::new("B1", "Dune", 5);
        let updated = book.deduct(3).unwrap();
        assert_eq!(updated.copies_available, 2);
        assert_eq!(updated.id, "B1");
        assert_eq!(book.copies_available, 5);
    }

    #[test]
    fn deduct_entire_stock() {
        let book = Book::new("B1", "Dune", 5);
        assert_eq!(book.deduct(5).unwrap().copies_available, 0);
    }

    #[test]
    fn deduct_beyond_stock_is_rejected() {
        let book = Book::new("B1", "Dune", 5);
        assert!(book.deduct(10).is_none());
    }

    #[test]
    fn wire_format_is_camel_case() {
        let book = Book::new("B1", "Dune", 5);
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["copiesAvailable"], 5);

        let parsed: Book =
            serde_json::from_str(r#"{"id":"B2","title":"Emma","copiesAvailable":1}"#).unwrap();
        assert_eq!(parsed.copies_available, 1);
        assert_eq!(parsed.author, "");
    }

    #[test]
    fn negative_stock_does_not_deserialize() {
        let parsed =
            serde_json::from_str::<Book>(r#"{"id":"B2","title":"Emma","copiesAvailable":-1}"#);
        assert!(parsed.is_err());
    }
}
