//! Driving a single request/response exchange with the converter.

use embedded_io::Error as _;
use log::{trace, warn};

use crate::{
    crc,
    error::{Error, ExceptionCode, Result},
    frame::{
        CRC_LEN, EXCEPTION_RESPONSE_LEN, HEADER_LEN, MAX_RESPONSE_LEN, Request, RequestBuffer,
        is_exception,
    },
    link::SerialLink,
    timing::TransactionTiming,
};

/// Unit id the converter ships with.
pub const DEFAULT_UNIT_ID: u8 = 0x01;

/// Upper bound on reads spent throwing away input after a reply we could not use.
const MAX_DISCARD_READS: usize = 8;

/// Owns the link to one converter and runs transactions on it, one at a time.
///
/// Each transaction is: encode, set the read timeout for the request kind, transmit and flush,
/// wait the settle delay, read the fixed-size reply, then check the exception flag, the checksum
/// and that the reply header answers our request. The first failing step ends the transaction.
/// Nothing is retried.
///
/// When a reply fails the checksum or answers some other request, whatever is still arriving is
/// read and dropped, so the next transaction starts on a frame boundary.
pub struct Transactor<S: SerialLink> {
    link: Option<S>,
    /// Default for the converter is 0x01.
    unit_id: u8,
    timing: TransactionTiming,
    request: RequestBuffer,
    response: [u8; MAX_RESPONSE_LEN],
}

impl<S: SerialLink> Transactor<S> {
    pub fn new(link: S, unit_id: u8, timing: TransactionTiming) -> Self {
        Self {
            link: Some(link),
            ..Self::unbound(unit_id, timing)
        }
    }

    /// A transactor with no link yet. Every transaction fails with
    /// [Error::TransportUnavailable] until one is [bound](Self::bind).
    pub fn unbound(unit_id: u8, timing: TransactionTiming) -> Self {
        Self {
            link: None,
            unit_id,
            timing,
            request: RequestBuffer::new(),
            response: [0; MAX_RESPONSE_LEN],
        }
    }

    /// Attach a link, returning the one previously bound.
    pub fn bind(&mut self, link: S) -> Option<S> {
        self.link.replace(link)
    }

    /// Detach and return the link.
    pub fn release(&mut self) -> Option<S> {
        self.link.take()
    }

    pub fn link(&self) -> Option<&S> {
        self.link.as_ref()
    }

    pub fn link_mut(&mut self) -> Option<&mut S> {
        self.link.as_mut()
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    /// Address every following frame to `unit_id`.
    pub fn set_unit_id(&mut self, unit_id: u8) {
        self.unit_id = unit_id;
    }

    pub fn timing(&self) -> TransactionTiming {
        self.timing
    }

    pub fn set_timing(&mut self, timing: TransactionTiming) {
        self.timing = timing;
    }

    /// Run one transaction and return the reply payload: everything between the unit id and
    /// function code header and the trailing checksum.
    pub fn execute(&mut self, request: &Request<'_>) -> Result<&[u8], S::Error> {
        request.encode(self.unit_id, &mut self.request)?;
        let link = self.link.as_mut().ok_or(Error::TransportUnavailable)?;

        let expected = request.response_len();
        link.set_read_timeout(self.timing.timeout_for(request.kind()))
            .map_err(Error::Serial)?;

        trace!("Sending {:02X?}", self.request.as_slice());
        write_frame(link, &self.request)?;

        link.delay(self.timing.settle_delay);

        let response = &mut self.response[..expected];
        response.fill(0);
        let received = read_within_timeout(link, response)?;
        let frame = &self.response[..received];
        trace!("Received {:02X?}", frame);

        if let Err(error) = check_reply(request, self.unit_id, frame, expected) {
            if matches!(error, Error::ChecksumMismatch { .. } | Error::UnexpectedReply { .. }) {
                let discarded = discard_pending(link, &mut self.response);
                if discarded > 0 {
                    warn!("Discarded {} trailing bytes", discarded);
                }
            }
            return Err(error);
        }

        Ok(&self.response[HEADER_LEN..expected - CRC_LEN])
    }

    /// Read `count` holding registers from `start` and return their raw bytes, two per register.
    pub fn read_holdings(&mut self, start: u16, count: u16) -> Result<&[u8], S::Error> {
        let payload = self.execute(&Request::read_holdings(start, count))?;
        // Skip the byte count.
        Ok(&payload[1..])
    }

    /// Write a single holding register.
    pub fn write_holding(&mut self, register: u16, value: u16) -> Result<(), S::Error> {
        self.execute(&Request::write_holding(register, value))?;
        Ok(())
    }

    /// Write consecutive holding registers from `start`, `data` holding two bytes per register.
    pub fn write_holdings(&mut self, start: u16, data: &[u8]) -> Result<(), S::Error> {
        self.execute(&Request::write_holdings(start, data))?;
        Ok(())
    }
}

/// Transmit all of `frame`, resuming after short writes, then flush.
fn write_frame<S: SerialLink>(link: &mut S, frame: &[u8]) -> Result<(), S::Error> {
    let mut sent = 0;
    while sent < frame.len() {
        match link.write(&frame[sent..]).map_err(Error::Serial)? {
            0 => {
                warn!("Incomplete write, sent {} of {} bytes", sent, frame.len());
                return Err(Error::TransportWriteIncomplete {
                    sent,
                    expected: frame.len(),
                });
            }
            n => sent += n,
        }
    }
    link.flush().map_err(Error::Serial)
}

/// Validate the `received` bytes in `frame` as the reply to `request`.
fn check_reply<I: embedded_io::Error>(
    request: &Request<'_>,
    unit_id: u8,
    frame: &[u8],
    expected: usize,
) -> Result<(), I> {
    let received = frame.len();
    if received < expected {
        // A rejected request is answered with a frame shorter than the one we wait for.
        if received >= EXCEPTION_RESPONSE_LEN
            && is_exception(frame[1])
            && crc::verify(&frame[..EXCEPTION_RESPONSE_LEN]).is_ok()
        {
            return Err(exception(request, unit_id, frame));
        }
        warn!("Incomplete read, received {} of {} bytes", received, expected);
        return Err(Error::TransportReadIncomplete { received, expected });
    }

    if is_exception(frame[1]) {
        return Err(exception(request, unit_id, frame));
    }

    if let Err((computed, received)) = crc::verify(frame) {
        warn!(
            "Invalid checksum - calculated={:04X} received={:04X} frame={:02X?}",
            computed, received, frame
        );
        return Err(Error::ChecksumMismatch { computed, received });
    }

    if !request.matches_reply(unit_id, frame) {
        return Err(unexpected(request, frame));
    }
    Ok(())
}

fn exception<I: embedded_io::Error>(request: &Request<'_>, unit_id: u8, frame: &[u8]) -> Error<I> {
    if !request.matches_reply(unit_id, frame) {
        return unexpected(request, frame);
    }
    let code = ExceptionCode::from(frame[2]);
    warn!("Device rejected {:?} with {}", request.function_code(), code);
    Error::DeviceException(code)
}

fn unexpected<I: embedded_io::Error>(request: &Request<'_>, frame: &[u8]) -> Error<I> {
    warn!("Reply {:02X?} does not answer {:?}", frame, request);
    Error::UnexpectedReply {
        unit_id: frame[0],
        function: frame[1],
    }
}

/// Read and drop input until the link goes quiet.
fn discard_pending<S: SerialLink>(link: &mut S, scratch: &mut [u8]) -> usize {
    let mut discarded = 0;
    for _ in 0..MAX_DISCARD_READS {
        match link.read(scratch) {
            Ok(0) | Err(_) => break,
            Ok(n) => discarded += n,
        }
    }
    discarded
}

/// Fill `buf` from the link, stopping early when the link times out.
fn read_within_timeout<S: SerialLink>(link: &mut S, buf: &mut [u8]) -> Result<usize, S::Error> {
    let mut received = 0;
    while received < buf.len() {
        match link.read(&mut buf[received..]) {
            Ok(0) => break,
            Ok(n) => received += n,
            Err(e) if matches!(e.kind(), embedded_io::ErrorKind::TimedOut) => break,
            Err(e) => return Err(Error::Serial(e)),
        }
    }
    Ok(received)
}
