//! The AES-128 block cipher
//!
//! The cipher modes and toolbox functions of this crate never implement the rounds of AES
//! themselves, they only need something that encrypts a single block. This is the
//! [`BlockCipher`] trait. [`Aes128`] is a software implementation of it, but a certified
//! implementation provided by the platform may be used instead.

use crate::{Block, Key, BLOCK_SIZE};
use zeroize::Zeroize;

/// Encrypt a single block with AES-128
///
/// Implementations must be deterministic and must accept any key and plain text. There is no
/// error path, an implementation that can fail (such as one that asks a Bluetooth controller to
/// do the encryption) must deal with the failure before returning.
pub trait BlockCipher {
    fn encrypt(&self, key: &Key, plain_text: &Block) -> Block;
}

impl<C: BlockCipher + ?Sized> BlockCipher for &C {
    fn encrypt(&self, key: &Key, plain_text: &Block) -> Block {
        (**self).encrypt(key, plain_text)
    }
}

/// Software AES-128
///
/// This uses the [aes](https://crates.io/crates/aes) crate to generate the cypher text. This crate
/// will use the [AES Instruction Set](https://en.wikipedia.org/wiki/AES_instruction_set) when the
/// target supports it, otherwise it uses a bitsliced implementation. As of writing this
/// description the crate has not received a formal cryptographic review.
///
/// The key schedule is created for each block and cleared afterwards, nothing is kept between
/// calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct Aes128;

impl BlockCipher for Aes128 {
    fn encrypt(&self, key: &Key, plain_text: &Block) -> Block {
        use aes::cipher::generic_array::GenericArray;
        use aes::cipher::{BlockEncrypt, KeyInit};

        let cipher = aes::Aes128::new(GenericArray::from_slice(key.as_bytes()));

        let mut block = *plain_text;

        cipher.encrypt_block(GenericArray::from_mut_slice(&mut block));

        block
    }
}

/// Security function *e*
///
/// This is the encrypted data generator from the Bluetooth Specification (v5.0 | Vol 3, Part H,
/// section 2.2.1). It generates 128-bit encrypted data from a 128-bit key and 128-bit plain text
/// using AES-128. Both the input and output are in big-endian order.
pub fn e<C: BlockCipher>(cipher: &C, key: &Key, plain_text: &Block) -> Block {
    cipher.encrypt(key, plain_text)
}

/// Security function *e* with little-endian inputs and output
///
/// This is the order used by the HCI LE Encrypt command and the Security Manager PDUs.
pub fn e_le<C: BlockCipher>(cipher: &C, key_le: &Block, plain_text_le: &Block) -> Block {
    let mut key_be = *key_le;
    let mut plain_text = *plain_text_le;

    key_be.reverse();
    plain_text.reverse();

    let key = Key::new(key_be);

    key_be.zeroize();

    let mut cypher_text = cipher.encrypt(&key, &plain_text);

    plain_text.zeroize();

    cypher_text.reverse();

    cypher_text
}

/// 24-bit random address hash function
///
/// Used in random address creation and resolution (v5.0 | Vol 3, Part H, section 2.2.2).
///
/// The `prand` and the returned hash are in little-endian order, the order they appear within a
/// resolvable private address.
pub fn ah<C: BlockCipher>(cipher: &C, irk: &Key, prand: [u8; 3]) -> [u8; 3] {
    let mut r_padded = [0u8; BLOCK_SIZE];

    r_padded[13] = prand[2];
    r_padded[14] = prand[1];
    r_padded[15] = prand[0];

    let cypher_text = cipher.encrypt(irk, &r_padded);

    [cypher_text[15], cypher_text[14], cypher_text[13]]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// From FIPS-197, Appendix C.1
    #[test]
    fn aes_128_fips_197() {
        let key = Key::from(0x00010203_04050607_08090a0b_0c0d0e0fu128);

        let plain_text = 0x00112233_44556677_8899aabb_ccddeeffu128.to_be_bytes();

        assert_eq!(
            0x69c4e0d8_6a7b0430_d8cdb780_70b4c55au128.to_be_bytes(),
            e(&Aes128, &key, &plain_text)
        );
    }

    #[test]
    fn e_zero_block() {
        let k = Key::from(0x2b7e1516_28aed2a6_abf71588_09cf4f3cu128);

        assert_eq!(
            0x7df76b0c_1ab899b3_3e42f047_b91b546fu128.to_be_bytes(),
            e(&Aes128, &k, &[0; 16])
        );
    }

    #[test]
    fn e_le_is_reversed_e() {
        let key = 0x2b7e1516_28aed2a6_abf71588_09cf4f3cu128;
        let plain_text = 0x6bc1bee2_2e409f96_e93d7e11_7393172au128;

        let expected = e(&Aes128, &Key::from(key), &plain_text.to_be_bytes());

        let mut cypher_text = e_le(&Aes128, &key.to_le_bytes(), &plain_text.to_le_bytes());

        cypher_text.reverse();

        assert_eq!(expected, cypher_text);
    }

    /// Data is from section D.7 (Bluetooth Spec. v5.0 | Vol 3, Part H, Appendix D)
    #[test]
    fn ah_test() {
        let irk = Key::from(0xec0234a3_57c8ad05_341010a6_0a397d9bu128);

        let prand = [0x94, 0x81, 0x70];

        assert_eq!([0xaa, 0xfb, 0x0d], ah(&Aes128, &irk, prand));
    }

    #[test]
    fn cipher_by_reference() {
        fn encrypt_with<C: BlockCipher>(cipher: C, key: &Key) -> Block {
            cipher.encrypt(key, &[0; 16])
        }

        let key = Key::from(0x2b7e1516_28aed2a6_abf71588_09cf4f3cu128);

        assert_eq!(Aes128.encrypt(&key, &[0; 16]), encrypt_with(&Aes128, &key));
    }
}
