//! We use this mocking module in unit tests to emulate the converter's serial link.

use fugit::MillisDurationU32;

use crate::link::SerialLink;

/// Our mock type used to emulate a serial link.
///
/// Replies for consecutive transactions can be queued back to back: the client reads exactly
/// the number of bytes it expects, so it never consumes the next reply.
pub struct MockSerial {
    /// Everything the client transmitted.
    write_buffer: heapless::Vec<u8, 256>,
    /// Queued reply bytes.
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer
    read_position: usize,
    /// Accept at most this many bytes per write call. `Some(0)` simulates a stalled link.
    write_limit: Option<usize>,
    /// Number of flush calls.
    flushes: usize,
    /// Flag to simulate read errors
    should_error_on_read: bool,
    /// Every read timeout the client configured, in order.
    timeouts: heapless::Vec<u32, 16>,
    /// Every delay the client asked for, in order.
    delays: heapless::Vec<u32, 16>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MockSerialError {
    /// No more queued bytes before the timeout.
    #[error("Timeout")]
    Timeout,
    /// Simulated buffer overflow
    #[error("Buffer overflow")]
    BufferOverflow,
    /// Generic simulated error for testing
    #[error("Simulated error")]
    SimulatedError,
}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let accepted = match self.write_limit {
            Some(limit) => &buf[..buf.len().min(limit)],
            None => buf,
        };
        self.write_buffer
            .extend_from_slice(accepted)
            .map_err(|_| MockSerialError::BufferOverflow)?;
        Ok(accepted.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        if self.read_position >= self.read_buffer.len() {
            return Err(MockSerialError::Timeout);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        let bytes_to_read = core::cmp::min(buf.len(), available_bytes);

        buf[..bytes_to_read].copy_from_slice(
            &self.read_buffer[self.read_position..self.read_position + bytes_to_read],
        );

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl SerialLink for MockSerial {
    fn set_read_timeout(&mut self, timeout: MillisDurationU32) -> Result<(), Self::Error> {
        self.timeouts
            .push(timeout.to_millis())
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    fn delay(&mut self, duration: MillisDurationU32) {
        // Only the first few are worth recording.
        let _ = self.delays.push(duration.to_millis());
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            write_limit: None,
            flushes: 0,
            should_error_on_read: false,
            timeouts: heapless::Vec::new(),
            delays: heapless::Vec::new(),
        }
    }

    /// Queue bytes to be returned after anything already queued.
    pub fn push_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Clear the write buffer
    pub fn clear_written_data(&mut self) {
        self.write_buffer.clear();
    }

    /// Bytes queued but not read yet.
    pub fn unread(&self) -> usize {
        self.read_buffer.len() - self.read_position
    }

    /// Only accept up to `limit` bytes per write call.
    pub fn set_write_limit(&mut self, limit: Option<usize>) {
        self.write_limit = limit;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn timeouts(&self) -> &[u32] {
        &self.timeouts
    }

    pub fn delays(&self) -> &[u32] {
        &self.delays
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    #[test]
    fn test_write_data() {
        let mut mock = MockSerial::new();
        let test_data = b"Hello, World!";

        assert_eq!(mock.write(test_data), Ok(test_data.len()));
        assert_eq!(mock.written_data(), test_data);
    }

    #[test]
    fn test_write_limit() {
        let mut mock = MockSerial::new();
        mock.set_write_limit(Some(3));

        assert_eq!(mock.write(b"abcdef"), Ok(3));
        assert_eq!(mock.written_data(), b"abc");

        mock.set_write_limit(Some(0));
        assert_eq!(mock.write(b"def"), Ok(0));
        assert_eq!(mock.written_data(), b"abc");

        mock.clear_written_data();
        mock.set_write_limit(None);
        assert_eq!(mock.write(b"abcdef"), Ok(6));
        mock.flush().unwrap();
        assert_eq!(mock.flushes(), 1);
    }

    #[test]
    fn test_queued_reads() {
        let mut mock = MockSerial::new();
        mock.push_read_data(b"Hello").unwrap();
        mock.push_read_data(b" World").unwrap();

        let mut buffer1 = [0u8; 5];
        let mut buffer2 = [0u8; 6];
        assert_eq!(mock.read(&mut buffer1), Ok(5));
        assert_eq!(mock.unread(), 6);
        assert_eq!(mock.read(&mut buffer2), Ok(6));
        assert_eq!(&buffer1, b"Hello");
        assert_eq!(&buffer2, b" World");
    }

    #[test]
    fn test_read_timeout_after_data_exhausted() {
        let mut mock = MockSerial::new();
        mock.push_read_data(b"Hi").unwrap();

        let mut buffer = [0u8; 10];
        assert_eq!(mock.read(&mut buffer), Ok(2));

        let err = mock.read(&mut buffer).unwrap_err();
        assert_eq!(err, MockSerialError::Timeout);
        assert_eq!(err.kind(), embedded_io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_read_error_simulation() {
        let mut mock = MockSerial::new();
        mock.push_read_data(b"test data").unwrap();
        mock.set_read_error(true);

        let mut buffer = [0u8; 10];
        assert_eq!(mock.read(&mut buffer), Err(MockSerialError::SimulatedError));
    }

    #[test]
    fn test_set_read_data_buffer_overflow() {
        let mut mock = MockSerial::new();
        let large_data = vec![0u8; 300]; // Larger than 256 byte capacity

        assert_eq!(
            mock.push_read_data(&large_data),
            Err(MockSerialError::BufferOverflow)
        );
    }

    #[test]
    fn test_link_bookkeeping() {
        let mut mock = MockSerial::new();
        mock.set_read_timeout(MillisDurationU32::millis(10)).unwrap();
        mock.delay(MillisDurationU32::millis(5));
        mock.set_read_timeout(MillisDurationU32::millis(40)).unwrap();

        assert_eq!(mock.timeouts(), &[10, 40]);
        assert_eq!(mock.delays(), &[5]);
    }
}
