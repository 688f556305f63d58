use std::time::{SystemTime, UNIX_EPOCH};

/// Timestamp compression for binary log records.
///
/// Storing a full 8-byte timestamp on every record would dwarf many payloads,
/// so records carry a 4-byte offset in microseconds from a base timestamp
/// that is written out separately whenever it resets.

/// Largest offset representable in a record.
const REL_MAX: u64 = u32::MAX as u64;

/// Converts absolute microsecond timestamps into `(relative, is_base)`
/// pairs. The first call and any call whose offset would overflow 32 bits
/// reset the base.
///
/// # Examples
///
/// ```
/// use binform::TimestampConverter;
///
/// let mut clock = TimestampConverter::new();
/// let (rel, is_base) = clock.relative_micros();
/// assert_eq!(rel, 0);
/// assert!(is_base);
///
/// let (_, is_base) = clock.relative_micros();
/// assert!(!is_base);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TimestampConverter {
    base_micros: Option<u64>,
}

impl TimestampConverter {
    pub const fn new() -> Self {
        Self { base_micros: None }
    }

    /// Microseconds since the current base, plus a flag saying whether this
    /// call established a new base (in which case the offset is 0 and the
    /// caller should persist [`base_micros`](Self::base_micros)).
    pub fn relative_micros(&mut self) -> (u32, bool) {
        let now = now_micros();
        match self.base_micros {
            Some(base) => {
                let delta = now.saturating_sub(base);
                if delta > REL_MAX {
                    self.base_micros = Some(now);
                    (0, true)
                } else {
                    (delta as u32, false)
                }
            }
            None => {
                self.base_micros = Some(now);
                (0, true)
            }
        }
    }

    /// The current base, 0 before the first call.
    pub fn base_micros(&self) -> u64 {
        self.base_micros.unwrap_or(0)
    }

    /// Forces the next call to establish a new base.
    pub fn reset(&mut self) {
        self.base_micros = None;
    }
}

impl Default for TimestampConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Wall-clock microseconds since the epoch. Clamps to 0 if the system clock
/// reads before the epoch rather than failing a log call over it.
pub fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
