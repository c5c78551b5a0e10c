/**
 * Little endian readers for fixed offsets
 *
 * Callers are expected to have checked the buffer length against the
 * layout before reading, an out-of-bounds offset panics.
 *
 * # Example
 *
 * ```ignore
 * use crate::util::get_i16_le;
 * let buffer = [0x00, 0xCD, 0xAB];
 * assert!(get_i16_le(&buffer, 1) == 0xABCDu16 as i16);
 * ```
 */
pub fn get_i8(byte_stream: &[u8], offset: usize) -> i8 {
    byte_stream[offset] as i8
}

pub fn get_i16_le(byte_stream: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([byte_stream[offset], byte_stream[offset + 1]])
}

pub fn get_u16_le(byte_stream: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([byte_stream[offset], byte_stream[offset + 1]])
}

pub fn get_i32_le(byte_stream: &[u8], offset: usize) -> i32 {
    get_u32_le(byte_stream, offset) as i32
}

pub fn get_u32_le(byte_stream: &[u8], offset: usize) -> u32 {
    let mut buffer = [0u8; 4];
    buffer.copy_from_slice(&byte_stream[offset..offset + 4]);
    u32::from_le_bytes(buffer)
}
