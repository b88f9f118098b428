//! Mesh key derivation
//!
//! The salt generation function and key derivation functions of the Mesh Profile (v1.0, section
//! 3.8.2). These are all built on [AES-CMAC](crate::cmac). The keys they create are what the
//! network and transport layers give to [`ccm`](crate::ccm).

use crate::{cmac, BlockCipher, Key};

/// Salt generation function *s1*
///
/// `s1(M) = AES-CMAC(ZERO, M)` where *ZERO* is the all zero key.
pub fn s1<C: BlockCipher>(cipher: &C, m: &[u8]) -> Key {
    Key::new(cmac::generate(cipher, &Key::default(), m))
}

/// Key derivation function *k1*
///
/// `k1(N, SALT, P) = AES-CMAC(AES-CMAC(SALT, N), P)`
///
/// This is used for the device key, the provisioning session keys, and the identity key.
pub fn k1<C: BlockCipher>(cipher: &C, n: &[u8], salt: &Key, p: &[u8]) -> Key {
    let t = Key::new(cmac::generate(cipher, salt, n));

    Key::new(cmac::generate(cipher, &t, p))
}

/// Network key material
///
/// The output of [`k2`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkKeys {
    /// The 7-bit network identifier
    pub nid: u8,
    pub encryption_key: Key,
    pub privacy_key: Key,
}

/// Network key material derivation function *k2*
///
/// Derives the NID, encryption key, and privacy key from a network key `n`. `p` is `0x00` for the
/// managed flooding security credentials, or the friendship information (`0x01 || LPNAddress ||
/// FriendAddress || LPNCounter || FriendCounter`) for friendship security credentials.
pub fn k2<C: BlockCipher>(cipher: &C, n: &Key, p: &[u8]) -> NetworkKeys {
    let salt = s1(cipher, b"smk2");

    let t = Key::new(cmac::generate(cipher, &salt, n.as_bytes()));

    let t1 = cmac::generate_slices(cipher, &t, &[p, &[0x01]]);

    let t2 = cmac::generate_slices(cipher, &t, &[&t1, p, &[0x02]]);

    let t3 = cmac::generate_slices(cipher, &t, &[&t2, p, &[0x03]]);

    NetworkKeys {
        nid: t1[15] & 0x7F,
        encryption_key: Key::new(t2),
        privacy_key: Key::new(t3),
    }
}

/// Derivation function *k3*
///
/// Derives the 64-bit public network ID from the network key `n`.
pub fn k3<C: BlockCipher>(cipher: &C, n: &Key) -> u64 {
    let salt = s1(cipher, b"smk3");

    let t = Key::new(cmac::generate(cipher, &salt, n.as_bytes()));

    let id = cmac::generate(cipher, &t, b"id64\x01");

    let mut low = [0u8; 8];

    low.copy_from_slice(&id[8..]);

    <u64>::from_be_bytes(low)
}

/// Derivation function *k4*
///
/// Derives the 6-bit application key identifier (AID) from an application key `n`.
pub fn k4<C: BlockCipher>(cipher: &C, n: &Key) -> u8 {
    let salt = s1(cipher, b"smk4");

    let t = Key::new(cmac::generate(cipher, &salt, n.as_bytes()));

    cmac::generate(cipher, &t, b"id6\x01")[15] & 0x3F
}
