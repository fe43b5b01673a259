//! Artificial delays for exercising the protocols under slow execution.

use std::collections::HashMap;
use std::time::Duration;

/// Delays injected into order execution. All zero by default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultInjection {
    /// Slept once per order after phase 2.
    pub execution_delay: Duration,
    /// Slept before a line item's inventory execution, keyed by book id.
    pub item_delays: HashMap<String, Duration>,
}

impl FaultInjection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_execution_delay(mut self, delay: Duration) -> Self {
        self.execution_delay = delay;
        self
    }

    pub fn with_item_delay(mut self, book_id: impl Into<String>, delay: Duration) -> Self {
        self.item_delays.insert(book_id.into(), delay);
        self
    }

    pub fn item_delay(&self, book_id: &str) -> Duration {
        self.item_delays.get(book_id).copied().unwrap_or_default()
    }

    /// Parses a `bookId=millis,bookId=millis` table.
    pub fn parse_item_delays(table: &str) -> Result<HashMap<String, Duration>, String> {
        table
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (book_id, millis) = entry
                    .split_once('=')
                    .ok_or_else(|| format!("expected bookId=millis, got {entry:?}"))?;
                let millis: u64 = millis
                    .trim()
                    .parse()
                    .map_err(|e| format!("invalid delay for {book_id}: {e}"))?;
                Ok((book_id.trim().to_string(), Duration::from_millis(millis)))
            })
            .collect()
    }
}
