use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Commit timestamp assigned by the ledger to every recorded version.
///
/// Wall-clock milliseconds paired with a logical counter, so two commits in
/// the same millisecond (or a clock that steps backwards) still produce a
/// strictly increasing sequence.
///
/// Ordering: `physical_ms` then `logical`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerTimestamp {
    /// Wall-clock milliseconds since UNIX epoch.
    pub physical_ms: u64,
    /// Tie-breaker for commits sharing a physical millisecond.
    pub logical: u32,
}

impl LedgerTimestamp {
    pub const fn new(physical_ms: u64, logical: u32) -> Self {
        Self {
            physical_ms,
            logical,
        }
    }

    /// Timestamp for the current wall-clock time.
    pub fn now() -> Self {
        let physical_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        Self::new(physical_ms, 0)
    }

    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// The next timestamp strictly after `self`, tracking the wall clock
    /// when it is ahead.
    pub fn next(&self) -> Self {
        self.next_at(Self::now().physical_ms)
    }

    /// Like [`next`](Self::next) with an explicit wall-clock reading.
    pub fn next_at(&self, now_ms: u64) -> Self {
        if now_ms > self.physical_ms {
            Self::new(now_ms, 0)
        } else {
            Self::new(self.physical_ms, self.logical.saturating_add(1))
        }
    }

    /// Wall-clock component as a UTC datetime.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.physical_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

impl fmt::Debug for LedgerTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedgerTimestamp({}ms.{})", self.physical_ms, self.logical)
    }
}

impl fmt::Display for LedgerTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(
                f,
                "{}#{}",
                dt.to_rfc3339_opts(SecondsFormat::Millis, true),
                self.logical
            ),
            None => write!(f, "{}ms#{}", self.physical_ms, self.logical),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_physical_then_logical() {
        assert!(LedgerTimestamp::new(100, 9) < LedgerTimestamp::new(200, 0));
        assert!(LedgerTimestamp::new(100, 1) < LedgerTimestamp::new(100, 2));
    }

    #[test]
    fn next_is_strictly_after_when_clock_lags() {
        let ts = LedgerTimestamp::new(5_000, 3);
        let next = ts.next_at(4_000);
        assert_eq!(next, LedgerTimestamp::new(5_000, 4));
        assert!(next > ts);
    }

    #[test]
    fn next_follows_clock_when_ahead() {
        let ts = LedgerTimestamp::new(5_000, 3);
        assert_eq!(ts.next_at(6_000), LedgerTimestamp::new(6_000, 0));
    }

    #[test]
    fn now_is_after_2020() {
        assert!(LedgerTimestamp::now().physical_ms > 1_577_836_800_000);
    }

    #[test]
    fn display_is_rfc3339() {
        let ts = LedgerTimestamp::new(0, 2);
        assert_eq!(ts.to_string(), "1970-01-01T00:00:00.000Z#2");
    }
}
