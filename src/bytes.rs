//! Byte and block helpers shared by the cipher modes
//!
//! All multi-byte values within a block are big-endian, which is the order AES and the Bluetooth
//! Specification sample data use.

use crate::{Block, BLOCK_SIZE};

/// XOR `other` into `block`
pub fn xor_block(block: &mut Block, other: &Block) {
    block.iter_mut().zip(other.iter()).for_each(|(b, o)| *b ^= *o);
}

/// XOR the bytes of `data` into the front of `block`
///
/// `data` must not be longer than a block.
pub fn xor_partial(block: &mut Block, data: &[u8]) {
    debug_assert!(data.len() <= BLOCK_SIZE);

    block.iter_mut().zip(data.iter()).for_each(|(b, d)| *b ^= *d);
}

/// Shift a block left by one bit
///
/// The most significant bit of each byte is carried into the least significant bit of the byte
/// before it. The most significant bit of the block is discarded.
pub fn left_shift_one_bit(block: &Block) -> Block {
    let mut shifted = [0u8; BLOCK_SIZE];

    let mut overflow = 0;

    for i in (0..BLOCK_SIZE).rev() {
        shifted[i] = (block[i] << 1) | overflow;

        overflow = block[i] >> 7;
    }

    shifted
}

/// Big-endian representation of a 16-bit length field
pub fn be16(val: u16) -> [u8; 2] {
    val.to_be_bytes()
}
