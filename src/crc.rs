//! CRC-16 as used by the converter's Modbus RTU firmware.

const POLYNOMIAL: u16 = 0xA001;

/// Compute the 16-bit checksum over `bytes`.
///
/// Initial value 0xFFFF, reflected polynomial 0xA001, no final xor. On the wire the result is
/// sent low byte first.
pub fn crc16(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in bytes {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Check the trailing two bytes of `frame` against the checksum of everything before them.
///
/// Returns `(computed, received)` on mismatch.
pub fn verify(frame: &[u8]) -> Result<(), (u16, u16)> {
    if frame.len() < 2 {
        return Err((crc16(&[]), 0));
    }
    let (body, tail) = frame.split_at(frame.len() - 2);
    let computed = crc16(body);
    let received = u16::from_le_bytes([tail[0], tail[1]]);
    if computed == received {
        Ok(())
    } else {
        Err((computed, received))
    }
}
