use std::fmt;

use serde::{Deserialize, Serialize};

/// Total order on every mutating operation within a document DB.
///
/// Assigned by the transaction log writer. The transaction log persists
/// operations in serial order; replay re-derives feed state deterministically
/// by reapplying them in the same order. A configuration change is itself a
/// serial-numbered operation (spec §3), so it interleaves with document
/// mutations in the same total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SerialNumber(u64);

impl SerialNumber {
    pub const ZERO: SerialNumber = SerialNumber(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the next serial number, panicking on overflow rather than
    /// silently wrapping into an already-used serial (a logic-programming
    /// invariant violation, spec §7).
    pub fn next(self) -> Self {
        Self(
            self.0
                .checked_add(1)
                .expect("serial number space exhausted"),
        )
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SerialNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<SerialNumber> for u64 {
    fn from(serial: SerialNumber) -> Self {
        serial.0
    }
}
