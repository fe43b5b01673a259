//! Token-ring replica state machine.

/// The state of an executor replica in the token ring.
///
/// State transitions:
/// ```text
///                 PassToken received
/// IdleNoToken ───────────────────────► IdleHasToken
///      ▲                                  │  dequeued an order
///      │ order finished                   ▼
/// BusyNoToken ◄──── token passed ──── BusyHasToken
/// ```
///
/// An idle holder with nothing to dequeue, or a busy replica that receives
/// the token again, forwards the token straight away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReplicaState {
    /// Not holding the token, no order in progress.
    #[default]
    IdleNoToken,

    /// Holding the token and free to dequeue.
    IdleHasToken,

    /// Holding the token while an order is still executing.
    BusyHasToken,

    /// Executing an order after the token has moved on.
    BusyNoToken,
}

impl ReplicaState {
    /// Combines the two independent replica flags.
    pub fn from_flags(has_token: bool, busy: bool) -> Self {
        match (has_token, busy) {
            (false, false) => ReplicaState::IdleNoToken,
            (true, false) => ReplicaState::IdleHasToken,
            (true, true) => ReplicaState::BusyHasToken,
            (false, true) => ReplicaState::BusyNoToken,
        }
    }

    /// Initial state for a replica: replica 1 starts with the token.
    pub fn initial(is_first: bool) -> Self {
        Self::from_flags(is_first, false)
    }

    /// Returns true if the replica may dequeue in this state.
    pub fn can_dequeue(&self) -> bool {
        matches!(self, ReplicaState::IdleHasToken)
    }

    /// Returns true if the replica holds the token.
    pub fn holds_token(&self) -> bool {
        matches!(
            self,
            ReplicaState::IdleHasToken | ReplicaState::BusyHasToken
        )
    }

    /// Returns true if an order is executing.
    pub fn is_busy(&self) -> bool {
        matches!(self, ReplicaState::BusyHasToken | ReplicaState::BusyNoToken)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicaState::IdleNoToken => "IdleNoToken",
            ReplicaState::IdleHasToken => "IdleHasToken",
            ReplicaState::BusyHasToken => "BusyHasToken",
            ReplicaState::BusyNoToken => "BusyNoToken",
        }
    }
}

impl std::fmt::Display for ReplicaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        assert_eq!(ReplicaState::initial(true), ReplicaState::IdleHasToken);
        assert_eq!(ReplicaState::initial(false), ReplicaState::IdleNoToken);
        assert_eq!(ReplicaState::default(), ReplicaState::IdleNoToken);
    }

    #[test]
    fn test_only_idle_holder_dequeues() {
        assert!(!ReplicaState::IdleNoToken.can_dequeue());
        assert!(ReplicaState::IdleHasToken.can_dequeue());
        assert!(!ReplicaState::BusyHasToken.can_dequeue());
        assert!(!ReplicaState::BusyNoToken.can_dequeue());
    }

    #[test]
    fn test_flags_round_trip() {
        for state in [
            ReplicaState::IdleNoToken,
            ReplicaState::IdleHasToken,
            ReplicaState::BusyHasToken,
            ReplicaState::BusyNoToken,
        ] {
            assert_eq!(
                ReplicaState::from_flags(state.holds_token(), state.is_busy()),
                state
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ReplicaState::IdleNoToken.to_string(), "IdleNoToken");
        assert_eq!(ReplicaState::BusyHasToken.to_string(), "BusyHasToken");
    }
}
