use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position of a replica in a ring or chain.
///
/// Replica ids are 1-based: `1` is the chain head and the initial token
/// holder, `total` is the chain tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicaId(u32);

impl ReplicaId {
    /// The first replica: chain head and initial token holder.
    pub const FIRST: ReplicaId = ReplicaId(1);

    /// Creates a replica id, rejecting zero.
    pub fn new(id: u32) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    /// Returns the raw id.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Returns true if this replica occupies the last position of a
    /// `total`-sized chain.
    pub fn is_last(&self, total: u32) -> bool {
        self.0 == total
    }

    /// The next replica toward the tail, or `None` at the tail.
    pub fn next_in_chain(&self, total: u32) -> Option<ReplicaId> {
        (self.0 < total).then(|| ReplicaId(self.0 + 1))
    }

    /// The next replica toward the head, or `None` at the head.
    pub fn prev_in_chain(&self) -> Option<ReplicaId> {
        (self.0 > 1).then(|| ReplicaId(self.0 - 1))
    }

    /// The other replicas of a `total`-sized ring in traversal order,
    /// starting at `self + 1` and wrapping, excluding `self`.
    pub fn ring_successors(&self, total: u32) -> Vec<ReplicaId> {
        (1..total)
            .map(|step| ReplicaId((self.0 - 1 + step) % total + 1))
            .collect()
    }
}

impl std::fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReplicaId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u32 = s
            .trim()
            .parse()
            .map_err(|e| format!("invalid replica id {s:?}: {e}"))?;
        Self::new(raw).ok_or_else(|| "replica id must be positive".to_string())
    }
}

/// Identifier of one two-phase commit run.
///
/// Every dequeued order gets a fresh id so log lines and outcomes of
/// concurrent transactions on different replicas can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random transaction ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TransactionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> ReplicaId {
        ReplicaId::new(n).unwrap()
    }

    #[test]
    fn replica_id_rejects_zero() {
        assert!(ReplicaId::new(0).is_none());
        assert_eq!(ReplicaId::new(3).unwrap().get(), 3);
    }

    #[test]
    fn chain_neighbours() {
        assert_eq!(id(1).next_in_chain(3), Some(id(2)));
        assert_eq!(id(3).next_in_chain(3), None);
        assert_eq!(id(1).prev_in_chain(), None);
        assert_eq!(id(3).prev_in_chain(), Some(id(2)));
        assert!(id(3).is_last(3));
        assert!(!id(2).is_last(3));
    }

    #[test]
    fn ring_successors_wrap_and_skip_self() {
        let order: Vec<u32> = id(2).ring_successors(4).iter().map(|r| r.get()).collect();
        assert_eq!(order, vec![3, 4, 1]);

        let order: Vec<u32> = id(4).ring_successors(4).iter().map(|r| r.get()).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn ring_of_one_has_no_successors() {
        assert!(id(1).ring_successors(1).is_empty());
    }

    #[test]
    fn replica_id_parses_from_env_style_strings() {
        assert_eq!(" 2 ".parse::<ReplicaId>().unwrap(), id(2));
        assert!("0".parse::<ReplicaId>().is_err());
        assert!("two".parse::<ReplicaId>().is_err());
    }

    #[test]
    fn transaction_id_new_creates_unique_ids() {
        assert_ne!(TransactionId::new(), TransactionId::new());
    }

    #[test]
    fn transaction_id_is_transparent_on_the_wire() {
        let tx = TransactionId::new();
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(json, format!("\"{}\"", tx.as_uuid()));
    }
}
