//! Building the request frames we send to the converter.
//!
//! Every frame is `unit id, function code, payload, crc low, crc high`, with all payload words
//! big-endian. Only the three function codes the XY6020L understands are supported.

use heapless::Vec;

use crate::{crc::crc16, error::InvalidArgument};

/// The converter refuses to return more than this many registers in a single read.
pub const MAX_READ_REGISTERS: u16 = 30;
/// Largest block we write in one go, which is exactly one preset block.
pub const MAX_WRITE_REGISTERS: u16 = 14;

/// Unit id + function + start(2) + count(2) + byte count + data + crc(2).
pub const MAX_REQUEST_LEN: usize = 9 + 2 * MAX_WRITE_REGISTERS as usize;
/// Unit id + function + byte count + data + crc(2).
pub const MAX_RESPONSE_LEN: usize = 5 + 2 * MAX_READ_REGISTERS as usize;
/// Both write acknowledgements are 8 bytes long.
pub const WRITE_RESPONSE_LEN: usize = 8;
/// Unit id + function | 0x80 + exception code + crc(2).
pub const EXCEPTION_RESPONSE_LEN: usize = 5;
/// Set in the function code byte of a reply when the device rejected the request.
pub const EXCEPTION_FLAG: u8 = 0x80;
/// Bytes in front of the payload of every reply.
pub const HEADER_LEN: usize = 2;
pub const CRC_LEN: usize = 2;

/// Scratch buffer a request frame is assembled in.
pub type RequestBuffer = Vec<u8, MAX_REQUEST_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FunctionCode {
    ReadHoldings = 0x03,
    WriteHolding = 0x06,
    WriteHoldings = 0x10,
}

impl From<FunctionCode> for u8 {
    fn from(value: FunctionCode) -> Self {
        value as u8
    }
}

/// Reads and writes are answered with different latency, see
/// [TransactionTiming](crate::timing::TransactionTiming).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Read,
    Write,
}

/// One request to the converter, before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    /// Read `count` holding registers starting at `start`.
    ReadHoldings { start: u16, count: u16 },
    /// Write `value` to a single holding register.
    WriteHolding { register: u16, value: u16 },
    /// Write `count` registers starting at `start`. `data` holds `byte_count` bytes, two per
    /// register, each register big-endian.
    WriteHoldings {
        start: u16,
        count: u16,
        byte_count: u8,
        data: &'a [u8],
    },
}

impl<'a> Request<'a> {
    pub fn read_holdings(start: u16, count: u16) -> Self {
        Request::ReadHoldings { start, count }
    }

    pub fn write_holding(register: u16, value: u16) -> Self {
        Request::WriteHolding { register, value }
    }

    /// Write the registers encoded in `data`, deriving count and byte count from its length.
    pub fn write_holdings(start: u16, data: &'a [u8]) -> Self {
        Request::WriteHoldings {
            start,
            count: (data.len() / 2) as u16,
            byte_count: data.len() as u8,
            data,
        }
    }

    pub fn function_code(&self) -> FunctionCode {
        match self {
            Request::ReadHoldings { .. } => FunctionCode::ReadHoldings,
            Request::WriteHolding { .. } => FunctionCode::WriteHolding,
            Request::WriteHoldings { .. } => FunctionCode::WriteHoldings,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match self {
            Request::ReadHoldings { .. } => TransactionKind::Read,
            Request::WriteHolding { .. } | Request::WriteHoldings { .. } => {
                TransactionKind::Write
            }
        }
    }

    /// Length of a well-formed, non-exception reply to this request.
    pub fn response_len(&self) -> usize {
        match self {
            Request::ReadHoldings { count, .. } => 5 + 2 * *count as usize,
            Request::WriteHolding { .. } | Request::WriteHoldings { .. } => WRITE_RESPONSE_LEN,
        }
    }

    /// Check the request's preconditions without encoding it.
    pub fn validate(&self) -> Result<(), InvalidArgument> {
        match *self {
            Request::ReadHoldings { count, .. } => {
                if count == 0 || count > MAX_READ_REGISTERS {
                    return Err(InvalidArgument::RegisterCount {
                        count,
                        max: MAX_READ_REGISTERS,
                    });
                }
            }
            Request::WriteHolding { .. } => {}
            Request::WriteHoldings {
                count,
                byte_count,
                data,
                ..
            } => {
                if count == 0 || count > MAX_WRITE_REGISTERS {
                    return Err(InvalidArgument::RegisterCount {
                        count,
                        max: MAX_WRITE_REGISTERS,
                    });
                }
                if byte_count as u16 != count * 2 {
                    return Err(InvalidArgument::ByteCount { count, byte_count });
                }
                if data.len() != byte_count as usize {
                    return Err(InvalidArgument::DataLength {
                        len: data.len(),
                        byte_count,
                    });
                }
            }
        }
        Ok(())
    }

    /// Encode this request for `unit_id` into `frame`, checksum included.
    ///
    /// `frame` is cleared first. On error it is left empty, so a partial frame can never be
    /// sent by mistake.
    pub fn encode(&self, unit_id: u8, frame: &mut RequestBuffer) -> Result<(), InvalidArgument> {
        frame.clear();
        self.validate()?;

        let result = self.encode_unchecked(unit_id, frame);
        if result.is_err() {
            frame.clear();
        }
        result
    }

    fn encode_unchecked(
        &self,
        unit_id: u8,
        frame: &mut RequestBuffer,
    ) -> Result<(), InvalidArgument> {
        push(frame, &[unit_id, self.function_code().into()])?;
        match *self {
            Request::ReadHoldings { start, count } => {
                push(frame, &start.to_be_bytes())?;
                push(frame, &count.to_be_bytes())?;
            }
            Request::WriteHolding { register, value } => {
                push(frame, &register.to_be_bytes())?;
                push(frame, &value.to_be_bytes())?;
            }
            Request::WriteHoldings {
                start,
                count,
                byte_count,
                data,
            } => {
                push(frame, &start.to_be_bytes())?;
                push(frame, &count.to_be_bytes())?;
                push(frame, &[byte_count])?;
                push(frame, data)?;
            }
        }
        let crc = crc16(frame);
        push(frame, &crc.to_le_bytes())
    }

    /// Whether the header of a checksum-valid `reply` answers this request from `unit_id`.
    ///
    /// Reads must announce two bytes per requested register. A single write is echoed back
    /// verbatim and a block write repeats its start and count. Exception replies only have to
    /// carry our unit id and our function code with the exception flag set.
    pub fn matches_reply(&self, unit_id: u8, reply: &[u8]) -> bool {
        let function: u8 = self.function_code().into();
        match reply {
            [unit, code, ..] if is_exception(*code) => {
                *unit == unit_id && *code == function | EXCEPTION_FLAG
            }
            [unit, code, byte_count, ..] if *unit == unit_id && *code == function => match *self {
                Request::ReadHoldings { count, .. } => *byte_count as u16 == count * 2,
                Request::WriteHolding { register, value } => {
                    echoes(&reply[HEADER_LEN..], register, value)
                }
                Request::WriteHoldings { start, count, .. } => {
                    echoes(&reply[HEADER_LEN..], start, count)
                }
            },
            _ => false,
        }
    }
}

fn echoes(payload: &[u8], first: u16, second: u16) -> bool {
    match payload {
        [a, b, c, d, ..] => {
            u16::from_be_bytes([*a, *b]) == first && u16::from_be_bytes([*c, *d]) == second
        }
        _ => false,
    }
}

fn push(frame: &mut RequestBuffer, bytes: &[u8]) -> Result<(), InvalidArgument> {
    frame
        .extend_from_slice(bytes)
        .map_err(|_| InvalidArgument::DataLength {
            len: frame.len() + bytes.len(),
            byte_count: MAX_REQUEST_LEN as u8,
        })
}

/// Whether the function code byte of a reply flags an exception.
pub fn is_exception(function: u8) -> bool {
    function & EXCEPTION_FLAG != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmodbus::{ModbusProto, client::ModbusRequest};

    fn encode(request: Request<'_>) -> Result<RequestBuffer, InvalidArgument> {
        let mut frame = RequestBuffer::new();
        request.encode(0x01, &mut frame)?;
        Ok(frame)
    }

    #[test]
    fn bulk_read_frame() {
        let frame = encode(Request::read_holdings(0x00, 30)).unwrap();
        assert_eq!(
            frame.as_slice(),
            &[0x01, 0x03, 0x00, 0x00, 0x00, 0x1E, 0xC5, 0xC2]
        );
    }

    #[test]
    fn read_count_limits() {
        assert_eq!(
            encode(Request::read_holdings(0x00, 0)),
            Err(InvalidArgument::RegisterCount { count: 0, max: 30 })
        );
        assert_eq!(
            encode(Request::read_holdings(0x00, 31)),
            Err(InvalidArgument::RegisterCount { count: 31, max: 30 })
        );
        assert_eq!(encode(Request::read_holdings(0x00, 1)).unwrap().len(), 8);
        assert_eq!(encode(Request::read_holdings(0x00, 30)).unwrap().len(), 8);
    }

    #[test]
    fn write_single_frame() {
        let frame = encode(Request::write_holding(0x00, 2050)).unwrap();
        assert_eq!(
            frame.as_slice(),
            &[0x01, 0x06, 0x00, 0x00, 0x08, 0x02, 0x0F, 0xCB]
        );
    }

    #[test]
    fn write_multiple_frame() {
        let data = [0x01, 0xF4, 0x00, 0x64];
        let frame = encode(Request::write_holdings(0x70, &data)).unwrap();

        assert_eq!(frame.len(), 9 + data.len());
        assert_eq!(&frame[..7], &[0x01, 0x10, 0x00, 0x70, 0x00, 0x02, 0x04]);
        assert_eq!(&frame[7..11], &data);
        let crc = crc16(&frame[..11]).to_le_bytes();
        assert_eq!(&frame[11..], &crc);
    }

    #[test]
    fn write_multiple_limits() {
        let block = [0u8; 30];
        assert_eq!(
            encode(Request::write_holdings(0x50, &block)),
            Err(InvalidArgument::RegisterCount { count: 15, max: 14 })
        );
        assert_eq!(
            encode(Request::write_holdings(0x50, &[])),
            Err(InvalidArgument::RegisterCount { count: 0, max: 14 })
        );
        // A full preset block fits exactly.
        assert_eq!(
            encode(Request::write_holdings(0x50, &block[..28])).unwrap().len(),
            MAX_REQUEST_LEN
        );
    }

    #[test]
    fn write_multiple_mismatched_byte_count() {
        let data = [0u8; 4];
        let request = Request::WriteHoldings {
            start: 0x50,
            count: 2,
            byte_count: 3,
            data: &data,
        };
        assert_eq!(
            encode(request),
            Err(InvalidArgument::ByteCount {
                count: 2,
                byte_count: 3
            })
        );

        let request = Request::WriteHoldings {
            start: 0x50,
            count: 2,
            byte_count: 4,
            data: &data[..3],
        };
        assert_eq!(
            encode(request),
            Err(InvalidArgument::DataLength {
                len: 3,
                byte_count: 4
            })
        );
    }

    #[test]
    fn failed_encode_leaves_buffer_empty() {
        let mut frame = RequestBuffer::new();
        Request::write_holding(0x01, 0x02).encode(0x01, &mut frame).unwrap();
        assert!(!frame.is_empty());

        assert!(Request::read_holdings(0x00, 0).encode(0x01, &mut frame).is_err());
        assert!(frame.is_empty());
    }

    #[test]
    fn response_lengths() {
        assert_eq!(Request::read_holdings(0x00, 30).response_len(), 65);
        assert_eq!(Request::read_holdings(0x50, 14).response_len(), 33);
        assert_eq!(Request::write_holding(0x00, 1).response_len(), 8);
        assert_eq!(Request::write_holdings(0x50, &[0; 28]).response_len(), 8);
        assert_eq!(Request::read_holdings(0x00, 30).kind(), TransactionKind::Read);
        assert_eq!(Request::write_holding(0x00, 1).kind(), TransactionKind::Write);
    }

    #[test]
    fn replies_must_answer_their_request() {
        let set_volt = Request::write_holding(0x00, 2050);
        let set_current = Request::write_holding(0x01, 150);
        let echo = [0x01, 0x06, 0x00, 0x00, 0x08, 0x02, 0x0F, 0xCB];

        assert!(set_volt.matches_reply(0x01, &echo));
        // A late echo of an earlier write must not acknowledge the next one.
        assert!(!set_current.matches_reply(0x01, &echo));
        assert!(!Request::write_holding(0x00, 2051).matches_reply(0x01, &echo));
        assert!(!set_volt.matches_reply(0x05, &echo));

        let read = Request::read_holdings(0x80, 14);
        assert!(read.matches_reply(0x01, &[0x01, 0x03, 28]));
        assert!(!read.matches_reply(0x01, &[0x01, 0x03, 60]));
        assert!(!read.matches_reply(0x01, &[0x01, 0x06, 28]));

        let block = Request::write_holdings(0x70, &[0u8; 28]);
        assert!(block.matches_reply(0x01, &[0x01, 0x10, 0x00, 0x70, 0x00, 0x0E, 0x40, 0x16]));
        assert!(!block.matches_reply(0x01, &[0x01, 0x10, 0x00, 0x50, 0x00, 0x0E, 0x40, 0x16]));
        assert!(!block.matches_reply(0x01, &[0x01, 0x10, 0x00, 0x70]));
    }

    #[test]
    fn exception_replies_must_carry_our_function() {
        let read = Request::read_holdings(0x00, 30);
        assert!(read.matches_reply(0x01, &[0x01, 0x83, 0x02, 0xC0, 0xF1]));
        assert!(!read.matches_reply(0x01, &[0x01, 0x86, 0x03, 0x02, 0x61]));
        assert!(!read.matches_reply(0x02, &[0x01, 0x83, 0x02, 0xC0, 0xF1]));
        assert!(!read.matches_reply(0x01, &[0x01]));
    }

    #[test]
    fn frames_match_rmodbus() {
        let mut req = ModbusRequest::new(0x05, ModbusProto::Rtu);

        let mut expected = Vec::<u8, 64>::new();
        let mut ours = RequestBuffer::new();

        let mut reference: std::vec::Vec<u8> = std::vec::Vec::new();
        req.generate_get_holdings(0x80, 14, &mut reference).unwrap();
        Request::read_holdings(0x80, 14).encode(0x05, &mut ours).unwrap();
        assert_eq!(ours.as_slice(), reference.as_slice());

        reference.clear();
        req.generate_set_holding(0x1D, 4, &mut reference).unwrap();
        Request::write_holding(0x1D, 4).encode(0x05, &mut ours).unwrap();
        assert_eq!(ours.as_slice(), reference.as_slice());

        reference.clear();
        let words: [u16; 3] = [0x1234, 0x0000, 0xFFFF];
        req.generate_set_holdings_bulk(0x60, &words, &mut reference)
            .unwrap();
        for word in words {
            expected.extend_from_slice(&word.to_be_bytes()).unwrap();
        }
        Request::write_holdings(0x60, &expected)
            .encode(0x05, &mut ours)
            .unwrap();
        assert_eq!(ours.as_slice(), reference.as_slice());
    }
}
