//! Our error types for the XY6020L.

use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Everything that can go wrong during a transaction with the converter.
///
/// None of these are retried internally. A failed write leaves it unknown whether the device
/// applied the change: the request may have been acted on even though the acknowledgement was
/// lost or corrupted.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),
    #[error("No serial link bound")]
    TransportUnavailable,
    #[error("Incomplete write, sent {sent} of {expected} bytes")]
    TransportWriteIncomplete { sent: usize, expected: usize },
    #[error("Incomplete read, received {received} of {expected} bytes")]
    TransportReadIncomplete { received: usize, expected: usize },
    #[error("Device exception: {0}")]
    DeviceException(ExceptionCode),
    #[error("Checksum mismatch, computed {computed:#06x} received {received:#06x}")]
    ChecksumMismatch { computed: u16, received: u16 },
    /// A valid frame that does not answer the request we sent, e.g. a late reply to an earlier
    /// transaction.
    #[error("Reply {unit_id:#04x}/{function:#04x} does not match the request")]
    UnexpectedReply { unit_id: u8, function: u8 },
    #[error("Serial communication error")]
    Serial(I),
}

impl<I: embedded_io::Error> From<core::num::TryFromIntError> for Error<I> {
    fn from(_: core::num::TryFromIntError) -> Self {
        Error::InvalidArgument(InvalidArgument::OutOfRange)
    }
}

/// Which precondition of a call was violated. Always raised before any byte is sent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
    #[error("register count {count} outside 1..={max}")]
    RegisterCount { count: u16, max: u16 },
    #[error("byte count {byte_count} does not match {count} registers")]
    ByteCount { count: u16, byte_count: u8 },
    #[error("data length {len} does not match byte count {byte_count}")]
    DataLength { len: usize, byte_count: u8 },
    #[error("preset slot {0} outside 0..=9")]
    PresetSlot(u16),
    #[error("slave address {0} outside 1..=247")]
    SlaveAddress(u8),
    #[error("value does not fit its register")]
    OutOfRange,
}

/// Exception codes a Modbus slave may answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionCode {
    IllegalFunction,
    IllegalDataAddress,
    IllegalDataValue,
    SlaveDeviceFailure,
    Acknowledge,
    SlaveDeviceBusy,
    NegativeAcknowledge,
    MemoryParityError,
    GatewayPathUnavailable,
    GatewayTargetFailedToRespond,
    /// Anything outside the standard table.
    Other(u8),
}

impl From<u8> for ExceptionCode {
    fn from(value: u8) -> Self {
        use ExceptionCode as EC;
        match value {
            0x01 => EC::IllegalFunction,
            0x02 => EC::IllegalDataAddress,
            0x03 => EC::IllegalDataValue,
            0x04 => EC::SlaveDeviceFailure,
            0x05 => EC::Acknowledge,
            0x06 => EC::SlaveDeviceBusy,
            0x07 => EC::NegativeAcknowledge,
            0x08 => EC::MemoryParityError,
            0x0A => EC::GatewayPathUnavailable,
            0x0B => EC::GatewayTargetFailedToRespond,
            other => EC::Other(other),
        }
    }
}

impl From<ExceptionCode> for u8 {
    fn from(value: ExceptionCode) -> Self {
        use ExceptionCode as EC;
        match value {
            EC::IllegalFunction => 0x01,
            EC::IllegalDataAddress => 0x02,
            EC::IllegalDataValue => 0x03,
            EC::SlaveDeviceFailure => 0x04,
            EC::Acknowledge => 0x05,
            EC::SlaveDeviceBusy => 0x06,
            EC::NegativeAcknowledge => 0x07,
            EC::MemoryParityError => 0x08,
            EC::GatewayPathUnavailable => 0x0A,
            EC::GatewayTargetFailedToRespond => 0x0B,
            EC::Other(code) => code,
        }
    }
}

impl core::fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?} ({:#04x})", self, u8::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_code_conversions() {
        for raw in 0u8..=0xFF {
            assert_eq!(u8::from(ExceptionCode::from(raw)), raw);
        }
        assert_eq!(ExceptionCode::from(0x02), ExceptionCode::IllegalDataAddress);
        assert_eq!(ExceptionCode::from(0x09), ExceptionCode::Other(0x09));
    }
}
