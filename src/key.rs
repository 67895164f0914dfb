//! Key layout shared by boundary counters and queue items.
//!
//! Indices are written as zigzag varints (the `PutVarint` format) into a
//! fixed-width, zero-padded buffer. Item keys carry a one-byte prefix so they
//! can never equal a boundary key.

use crate::{Error, Result};

/// Longest varint encoding of a 64-bit value.
pub const MAX_VARINT_LEN: usize = 10;

/// Width of an encoded index value.
pub const INDEX_WIDTH: usize = MAX_VARINT_LEN;

/// Prefix of every item key.
pub const ITEM_PREFIX: u8 = b'i';

/// Width of an item key (prefix plus encoded index).
pub const ITEM_KEY_LEN: usize = 1 + INDEX_WIDTH;

pub const LOW_KEY: &[u8] = b"low";
pub const HIGH_KEY: &[u8] = b"high";

pub fn encode_index(index: i64) -> [u8; INDEX_WIDTH] {
    let mut buf = [0u8; INDEX_WIDTH];
    let mut ux = ((index << 1) ^ (index >> 63)) as u64;
    let mut pos = 0;
    while ux >= 0x80 {
        buf[pos] = (ux as u8) | 0x80;
        ux >>= 7;
        pos += 1;
    }
    buf[pos] = ux as u8;
    buf
}

/// Decodes a value written by [`encode_index`].
///
/// Bytes after the terminating group are ignored, so both the padded form and
/// a minimal-length varint decode to the same index.
pub fn decode_index(bytes: &[u8]) -> Result<i64> {
    let mut ux: u64 = 0;
    let mut shift = 0u32;
    for (pos, &byte) in bytes.iter().enumerate() {
        if pos == MAX_VARINT_LEN {
            return Err(Error::Corrupt("index varint overflows 64 bits"));
        }
        if byte < 0x80 {
            if pos == MAX_VARINT_LEN - 1 && byte > 1 {
                return Err(Error::Corrupt("index varint overflows 64 bits"));
            }
            ux |= u64::from(byte) << shift;
            let mut index = (ux >> 1) as i64;
            if ux & 1 != 0 {
                index = !index;
            }
            return Ok(index);
        }
        ux |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }
    Err(Error::Corrupt("index varint truncated"))
}

pub fn item_key(index: i64) -> [u8; ITEM_KEY_LEN] {
    let mut key = [0u8; ITEM_KEY_LEN];
    key[0] = ITEM_PREFIX;
    key[1..].copy_from_slice(&encode_index(index));
    key
}
