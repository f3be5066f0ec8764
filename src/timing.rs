//! Timing parameters for a single request/response exchange.
//!
//! The XY6020L does not answer instantly, and it acknowledges writes noticeably slower than it
//! answers reads. None of this is part of the protocol itself; the defaults below are what has
//! been observed to work and may need tuning for other firmware revisions.

use fugit::MillisDurationU32;

use crate::frame::TransactionKind;

/// Pause between sending a request and starting to read the reply.
pub const DEFAULT_SETTLE_DELAY_MS: u32 = 5;
/// Read timeout used for read-registers transactions.
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 10;
/// Read timeout used for write-single and write-multiple transactions.
pub const DEFAULT_WRITE_TIMEOUT_MS: u32 = 40;

/// Per deployment timing of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionTiming {
    /// Guard interval between transmit and the blocking read.
    pub settle_delay: MillisDurationU32,
    /// How long to wait for the reply to a read-registers request.
    pub read_timeout: MillisDurationU32,
    /// How long to wait for the acknowledgement of a write request.
    pub write_timeout: MillisDurationU32,
}

impl Default for TransactionTiming {
    fn default() -> Self {
        Self {
            settle_delay: MillisDurationU32::millis(DEFAULT_SETTLE_DELAY_MS),
            read_timeout: MillisDurationU32::millis(DEFAULT_READ_TIMEOUT_MS),
            write_timeout: MillisDurationU32::millis(DEFAULT_WRITE_TIMEOUT_MS),
        }
    }
}

impl TransactionTiming {
    pub fn with_settle_delay(mut self, delay: MillisDurationU32) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_read_timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Read timeout to configure on the link before a transaction of the given kind.
    pub fn timeout_for(&self, kind: TransactionKind) -> MillisDurationU32 {
        match kind {
            TransactionKind::Read => self.read_timeout,
            TransactionKind::Write => self.write_timeout,
        }
    }
}
