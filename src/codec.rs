//! Conversions between raw register bytes, as they travel on the wire, and register values.
//!
//! Register `i` of a block occupies bytes `2i` (high) and `2i + 1` (low). 32-bit quantities
//! span two registers with the low word first, so the word order is little-endian while each
//! word is big-endian. The device expects exactly this layout back when we write.

/// The 16-bit word of register `index`.
#[inline]
pub fn word_at(bytes: &[u8], index: usize) -> u16 {
    u16::from_be_bytes([bytes[2 * index], bytes[2 * index + 1]])
}

/// The 32-bit value held in registers `index` (low word) and `index + 1` (high word).
#[inline]
pub fn dword_at(bytes: &[u8], index: usize) -> u32 {
    let low = word_at(bytes, index) as u32;
    let high = word_at(bytes, index + 1) as u32;
    (high << 16) | low
}

/// The low byte of register `index`, the second byte on the wire.
#[inline]
pub fn low_byte_at(bytes: &[u8], index: usize) -> u8 {
    bytes[2 * index + 1]
}

/// Flags only use the low byte of their register. Anything nonzero counts as set.
#[inline]
pub fn flag_at(bytes: &[u8], index: usize) -> bool {
    low_byte_at(bytes, index) != 0
}

#[inline]
pub fn put_word(bytes: &mut [u8], index: usize, value: u16) {
    bytes[2 * index..2 * index + 2].copy_from_slice(&value.to_be_bytes());
}

/// Store `value` across registers `index` and `index + 1`, low word first.
#[inline]
pub fn put_dword(bytes: &mut [u8], index: usize, value: u32) {
    put_word(bytes, index, value as u16);
    put_word(bytes, index + 1, (value >> 16) as u16);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_big_endian() {
        let bytes = [0x08, 0x02, 0x00, 0x64];
        assert_eq!(word_at(&bytes, 0), 2050);
        assert_eq!(word_at(&bytes, 1), 100);
    }

    #[test]
    fn dwords_are_low_word_first() {
        // Low word 0x5678, high word 0x1234.
        let bytes = [0x56, 0x78, 0x12, 0x34];
        assert_eq!(dword_at(&bytes, 0), 0x1234_5678);

        let mut out = [0u8; 4];
        put_dword(&mut out, 0, 0x1234_5678);
        assert_eq!(out, bytes);
    }

    #[test]
    fn flags_use_the_low_byte() {
        let bytes = [0x01, 0x00, 0x00, 0x01, 0x00, 0x7F];
        assert!(!flag_at(&bytes, 0));
        assert!(flag_at(&bytes, 1));
        assert!(flag_at(&bytes, 2));
        assert_eq!(low_byte_at(&bytes, 2), 0x7F);
    }

    #[test]
    fn put_word_only_touches_its_register() {
        let mut bytes = [0xAA; 6];
        put_word(&mut bytes, 1, 0x0102);
        assert_eq!(bytes, [0xAA, 0xAA, 0x01, 0x02, 0xAA, 0xAA]);
    }
}
