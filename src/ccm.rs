//! AES-CCM
//!
//! Counter with CBC-MAC as used by the Bluetooth Mesh Profile (section 3.8.2) for encrypting
//! network and transport PDUs. This is the CCM of NIST SP 800-38C (and RFC 3610) with the field
//! widths fixed by Mesh:
//! * the nonce is 13 bytes, which leaves 2 bytes for the counter and the message length
//! * the MIC is either 4 or 8 bytes
//! * the additional data is less than 0xFF00 bytes, so its length is always encoded in two bytes
//!
//! The blocks are formatted as follows
//! ```text
//! B0 = [FLAGS | nonce | length(message) ]
//!   FLAGS bit 6:    Adata, 1 if there is additional data
//!   FLAGS bits 3-5: (mic length - 2) / 2
//!   FLAGS bits 0-2: 1 (the length field is 2 bytes)
//!
//! Ai = [ 0x01 | nonce | i ]
//! ```
//!
//! The MIC is always calculated over the plain text. Decryption requires the received MIC and will
//! return [`AuthenticationFailed`](Error::AuthenticationFailed) without the plain text if the
//! calculated MIC does not match it.

use crate::bytes::{be16, xor_block, xor_partial};
use crate::{Block, BlockCipher, Error, Key, Mic, MicSize, Nonce, BLOCK_SIZE};
use alloc::vec;
use alloc::vec::Vec;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// The additional data must be shorter than this (2^16 - 2^8)
const AAD_MAX_LEN: usize = 0xFF00;

/// The largest message that fits within the 2 byte length field of B0
const MESSAGE_MAX_LEN: usize = 0xFFFF;

/// The *Adata* bit of the B0 flags
const ADATA_FLAG: u8 = 0x40;

/// The flags of the counter blocks, this is the size of the length field minus one
const COUNTER_FLAGS: u8 = 0x01;

#[derive(Clone, Copy, PartialEq)]
enum Direction {
    Encrypt,
    Decrypt,
}

fn check_arguments(msg_len: usize, aad_len: usize) -> Result<(), Error> {
    if aad_len >= AAD_MAX_LEN {
        log::error!("(CCM) Additional data of {} bytes is too long", aad_len);

        Err(Error::AdditionalDataSize)
    } else if msg_len == 0 || msg_len > MESSAGE_MAX_LEN {
        log::error!("(CCM) Invalid message length of {} bytes", msg_len);

        Err(Error::MessageSize)
    } else {
        Ok(())
    }
}

/// Create the counter block *A<sub>i</sub>*
fn counter_block(nonce: &Nonce, i: u16) -> Block {
    let mut a = [0u8; BLOCK_SIZE];

    a[0] = COUNTER_FLAGS;
    a[1..14].copy_from_slice(nonce);
    a[14..].copy_from_slice(&be16(i));

    a
}

/// Create the first authentication block *B<sub>0</sub>*
fn first_block(nonce: &Nonce, msg_len: u16, has_aad: bool, mic_size: MicSize) -> Block {
    let mut b = [0u8; BLOCK_SIZE];

    let flags = (((mic_size.len() as u8 - 2) / 2) << 3) | COUNTER_FLAGS;

    b[0] = if has_aad { flags | ADATA_FLAG } else { flags };
    b[1..14].copy_from_slice(nonce);
    b[14..].copy_from_slice(&be16(msg_len));

    b
}

/// Fold the additional data into the CBC-MAC
///
/// The additional data is prefixed with its length as a two byte big-endian value. The last block
/// is padded with zeros.
fn cbc_mac_aad<C: BlockCipher>(cipher: &C, key: &Key, x: &mut Block, aad: &[u8]) {
    let length_field = be16(aad.len() as u16);

    let mut stream = length_field.iter().chain(aad.iter()).copied();

    let mut remaining = length_field.len() + aad.len();

    while remaining > 0 {
        let mut block = [0u8; BLOCK_SIZE];

        let taken = block.iter_mut().zip(stream.by_ref()).fold(0, |cnt, (b, a)| {
            *b = a;
            cnt + 1
        });

        remaining -= taken;

        xor_block(x, &block);

        *x = cipher.encrypt(key, x);

        block.zeroize();
    }
}

/// Run the CCM transform over `input`
///
/// The counter mode output is written to `output`, which must be the same length as `input`. The
/// returned `Mic` is the one calculated over the plain text, which is `input` when encrypting and
/// `output` when decrypting.
#[allow(clippy::too_many_arguments)]
fn transform<C: BlockCipher>(
    cipher: &C,
    key: &Key,
    nonce: &Nonce,
    input: &[u8],
    aad: &[u8],
    mic_size: MicSize,
    output: &mut [u8],
    direction: Direction,
) -> Mic {
    debug_assert_eq!(input.len(), output.len());

    // The mask for the MIC
    let mut c_mic = cipher.encrypt(key, &counter_block(nonce, 0));

    let b0 = first_block(nonce, input.len() as u16, !aad.is_empty(), mic_size);

    let mut x = cipher.encrypt(key, &b0);

    if !aad.is_empty() {
        cbc_mac_aad(cipher, key, &mut x, aad);
    }

    let mut key_stream = [0u8; BLOCK_SIZE];

    let mut plain_text = [0u8; BLOCK_SIZE];

    let chunks = input.chunks(BLOCK_SIZE).zip(output.chunks_mut(BLOCK_SIZE));

    for (j, (in_chunk, out_chunk)) in chunks.enumerate() {
        key_stream = cipher.encrypt(key, &counter_block(nonce, j as u16 + 1));

        out_chunk
            .iter_mut()
            .zip(in_chunk.iter().zip(key_stream.iter()))
            .for_each(|(o, (i, k))| *o = *i ^ *k);

        plain_text = [0u8; BLOCK_SIZE];

        match direction {
            Direction::Encrypt => xor_partial(&mut plain_text, in_chunk),
            Direction::Decrypt => xor_partial(&mut plain_text, out_chunk),
        }

        xor_block(&mut x, &plain_text);

        x = cipher.encrypt(key, &x);
    }

    xor_block(&mut c_mic, &x);

    let mic = Mic::from_block(&c_mic, mic_size);

    c_mic.zeroize();
    x.zeroize();
    key_stream.zeroize();
    plain_text.zeroize();

    mic
}

/// Encrypt a message and calculate its MIC
///
/// The returned vector is the cypher text with the MIC appended to it.
///
/// # Errors
/// * [`MessageSize`](Error::MessageSize) if `msg` is empty or longer than 0xFFFF bytes
/// * [`AdditionalDataSize`](Error::AdditionalDataSize) if `aad` is 0xFF00 bytes or longer
pub fn encrypt<C: BlockCipher>(
    cipher: &C,
    key: &Key,
    nonce: &Nonce,
    msg: &[u8],
    aad: &[u8],
    mic_size: MicSize,
) -> Result<Vec<u8>, Error> {
    let (mut cypher_text, mic) = encrypt_detached(cipher, key, nonce, msg, aad, mic_size)?;

    cypher_text.extend_from_slice(mic.as_slice());

    Ok(cypher_text)
}

/// Encrypt a message and calculate its MIC
///
/// This is the same as [`encrypt`] except the MIC is returned separately from the cypher text.
pub fn encrypt_detached<C: BlockCipher>(
    cipher: &C,
    key: &Key,
    nonce: &Nonce,
    msg: &[u8],
    aad: &[u8],
    mic_size: MicSize,
) -> Result<(Vec<u8>, Mic), Error> {
    check_arguments(msg.len(), aad.len())?;

    log::trace!("(CCM) Encrypting {} bytes with {} bytes of additional data", msg.len(), aad.len());

    let mut cypher_text = Vec::with_capacity(msg.len() + mic_size.len());

    cypher_text.resize(msg.len(), 0);

    let mic = transform(
        cipher,
        key,
        nonce,
        msg,
        aad,
        mic_size,
        &mut cypher_text,
        Direction::Encrypt,
    );

    Ok((cypher_text, mic))
}

/// Decrypt a message and check its MIC
///
/// `payload` is the cypher text followed by the MIC of `mic_size` bytes, the output of
/// [`encrypt`]. The plain text is only returned if the MIC is correct.
///
/// # Errors
/// * [`MessageSize`](Error::MessageSize) if the cypher text (`payload` without the MIC) is empty
///   or longer than 0xFFFF bytes
/// * [`AdditionalDataSize`](Error::AdditionalDataSize) if `aad` is 0xFF00 bytes or longer
/// * [`AuthenticationFailed`](Error::AuthenticationFailed) if the MIC does not match
pub fn decrypt<C: BlockCipher>(
    cipher: &C,
    key: &Key,
    nonce: &Nonce,
    payload: &[u8],
    aad: &[u8],
    mic_size: MicSize,
) -> Result<Vec<u8>, Error> {
    if payload.len() <= mic_size.len() {
        log::error!("(CCM) Payload of {} bytes has no cypher text", payload.len());

        return Err(Error::MessageSize);
    }

    let (cypher_text, mic_bytes) = payload.split_at(payload.len() - mic_size.len());

    let mic = Mic::new(mic_bytes)?;

    decrypt_detached(cipher, key, nonce, cypher_text, aad, &mic)
}

/// Decrypt a message and check it against a separately received MIC
///
/// The size of the MIC is taken from `mic`.
pub fn decrypt_detached<C: BlockCipher>(
    cipher: &C,
    key: &Key,
    nonce: &Nonce,
    cypher_text: &[u8],
    aad: &[u8],
    mic: &Mic,
) -> Result<Vec<u8>, Error> {
    check_arguments(cypher_text.len(), aad.len())?;

    log::trace!(
        "(CCM) Decrypting {} bytes with {} bytes of additional data",
        cypher_text.len(),
        aad.len()
    );

    let mut plain_text = vec![0u8; cypher_text.len()];

    let calculated = transform(
        cipher,
        key,
        nonce,
        cypher_text,
        aad,
        mic.size(),
        &mut plain_text,
        Direction::Decrypt,
    );

    if bool::from(calculated.ct_eq(mic)) {
        Ok(plain_text)
    } else {
        log::debug!("(CCM) MIC mismatch, dropping {} bytes of plain text", plain_text.len());

        plain_text.zeroize();

        Err(Error::AuthenticationFailed)
    }
}
