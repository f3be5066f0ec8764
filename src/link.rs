//! The serial link the client talks through.

use fugit::MillisDurationU32;

/// A half-duplex byte channel to the converter.
///
/// Bytes move through [embedded_io::Read] and [embedded_io::Write]. On top of that the link
/// must let us bound how long a read blocks, and give us a way to pause between transmitting a
/// request and reading the reply.
///
/// A read that runs into the configured timeout should either return `Ok(0)` or an error whose
/// [kind](embedded_io::Error::kind) is [embedded_io::ErrorKind::TimedOut]. Any other error is
/// passed up to the caller as [Error::Serial](crate::error::Error::Serial).
pub trait SerialLink: embedded_io::Read + embedded_io::Write {
    /// Bound every following read to the given duration.
    fn set_read_timeout(&mut self, timeout: MillisDurationU32) -> Result<(), Self::Error>;

    /// Block for the given duration.
    fn delay(&mut self, duration: MillisDurationU32);
}
