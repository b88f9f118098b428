//! AES-CMAC
//!
//! The message authentication code used by the Bluetooth cryptographic toolbox (v5.0 | Vol 3, Part
//! H, section 2.2.5). This is CMAC from NIST SP 800-38B restricted to AES-128, which is also
//! described in [The AES-CMAC Algorithm](https://datatracker.ietf.org/doc/rfc4493).
//!
//! A message of any length (including an empty one) can be authenticated. There is no upper bound
//! checked on the message length, that is left to the caller.

use crate::bytes::{left_shift_one_bit, xor_block};
use crate::{Block, BlockCipher, Key, BLOCK_SIZE};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// The constant *R<sub>128</sub>* (NIST SP 800-38B, section 5.3)
///
/// This is the last byte of the 128-bit R<sub>b</sub> value `0^120 || 10000111`.
const RB: u8 = 0x87;

/// The padding marker placed after the last byte of an incomplete block
const PADDING_MARKER: u8 = 0x80;

/// Derive the next subkey
///
/// The block is shifted left by one bit and, if the most significant bit of `k` was set, the last
/// byte is XORed with R<sub>b</sub>.
fn next_subkey(k: &Block) -> Block {
    let mut subkey = left_shift_one_bit(k);

    if k[0] & 0x80 != 0 {
        subkey[BLOCK_SIZE - 1] ^= RB;
    }

    subkey
}

/// AES-CMAC subkey generation algorithm
///
/// The return is `(K0, K1, K2)` where `K0` is the encryption of the zero block, `K1` is derived
/// from `K0`, and `K2` is derived from `K1`.
pub fn subkeys<C: BlockCipher>(cipher: &C, key: &Key) -> (Block, Block, Block) {
    let k0 = cipher.encrypt(key, &[0u8; BLOCK_SIZE]);

    let k1 = next_subkey(&k0);

    let k2 = next_subkey(&k1);

    (k0, k1, k2)
}

/// Calculate the CMAC over `len` bytes produced by `bytes`
fn generate_from_bytes<C, I>(cipher: &C, key: &Key, len: usize, mut bytes: I) -> Block
where
    C: BlockCipher,
    I: Iterator<Item = u8>,
{
    let (mut k0, mut k1, mut k2) = subkeys(cipher, key);

    // An empty message is one block of padding
    let block_count = if len == 0 { 1 } else { (len + BLOCK_SIZE - 1) / BLOCK_SIZE };

    let last_block_complete = len != 0 && len % BLOCK_SIZE == 0;

    let mut x = [0u8; BLOCK_SIZE];

    let mut block = [0u8; BLOCK_SIZE];

    for _ in 1..block_count {
        block.iter_mut().zip(bytes.by_ref()).for_each(|(b, m)| *b = m);

        xor_block(&mut x, &block);

        x = cipher.encrypt(key, &x);
    }

    let mut last_block = [0u8; BLOCK_SIZE];

    if last_block_complete {
        last_block.iter_mut().zip(bytes.by_ref()).for_each(|(b, m)| *b = m);

        xor_block(&mut last_block, &k1);
    } else {
        let r = len % BLOCK_SIZE;

        last_block.iter_mut().zip(bytes.by_ref()).for_each(|(b, m)| *b = m);

        last_block[r] = PADDING_MARKER;

        xor_block(&mut last_block, &k2);
    }

    xor_block(&mut x, &last_block);

    let tag = cipher.encrypt(key, &x);

    k0.zeroize();
    k1.zeroize();
    k2.zeroize();
    x.zeroize();
    block.zeroize();
    last_block.zeroize();

    tag
}

/// AES-CMAC algorithm
///
/// This Algorithm takes a AES-128 key along with a message in order to generate an authentication
/// code for the message. The returned tag is the full 128 bits, callers that need fewer bits
/// truncate it.
pub fn generate<C: BlockCipher>(cipher: &C, key: &Key, msg: &[u8]) -> Block {
    generate_from_bytes(cipher, key, msg.len(), msg.iter().copied())
}

/// AES-CMAC over the concatenation of `parts`
///
/// This produces the same tag as [`generate`] would for the message made by joining every slice
/// of `parts` in order, without the message needing to be in one buffer.
pub fn generate_slices<C: BlockCipher>(cipher: &C, key: &Key, parts: &[&[u8]]) -> Block {
    let len = parts.iter().map(|part| part.len()).sum();

    generate_from_bytes(cipher, key, len, parts.iter().flat_map(|part| part.iter().copied()))
}

/// Verification for AES-CMAC
///
/// This is used for verifying an `auth_code` given the `msg` and secret `key`. The comparison is
/// done in constant time.
pub fn verify<C: BlockCipher>(cipher: &C, key: &Key, msg: &[u8], auth_code: &Block) -> bool {
    let mut tag = generate(cipher, key, msg);

    let equal = tag[..].ct_eq(&auth_code[..]).into();

    tag.zeroize();

    equal
}
