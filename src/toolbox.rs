//! The Cryptographic Toolbox
//!
//! This contains the functions listed in the Bluetooth specification that are built from AES-CMAC
//! or the security function *e*. These functions are derived from the Bluetooth Specification v5.0
//! | Vol 3, Part H, section 2.2: *Cryptographic Toolbox*.
//!
//! It is generally not needed to use these functions directly as they tailor made for the Security
//! Manager protocol.
//!
//! # The Algorithms
//! The names of each algorithm match the names as stated in the Security Manager section of the
//! Host Volume of the Bluetooth Specification (V 5.0 | Vol 3, Part H, Section 2.2). Unfortunately
//! these names are shortened, making them obtuse to understand going by their name.
//!
//! The LE legacy pairing functions [`c1`] and [`s1`] are built using the security function
//! [`e`](crate::cipher::e).
//!
//! The LE secure connections functions [`f4`], [`f5`], [`f6`], and [`g2`], and the key conversion
//! functions [`h6`], [`h7`], and [`h8`] are built using [AES-CMAC](crate::cmac).
//!
//! # Byte Order
//! Every array input and output is in big-endian order, the way the values are written within the
//! specification. Values taken from (or put into) Security Manager PDUs are little-endian and need
//! to be reversed.

use crate::bytes::xor_block;
use crate::{cmac, Block, BlockCipher, Key, BLOCK_SIZE};
use zeroize::Zeroize;

/// The salt used by [`f5`] to generate the key *T* (v5.0 | Vol 3, Part H, section 2.2.7)
const F5_SALT: Key = Key::new([
    0x6C, 0x88, 0x83, 0x91, 0xAA, 0xF5, 0xA5, 0x38, 0x60, 0x37, 0x0B, 0xDB, 0x5A, 0x60, 0x83, 0xBE,
]);

/// The key identifier "btle" used by [`f5`] (v5.0 | Vol 3, Part H, section 2.2.7)
const F5_KEY_ID: [u8; 4] = *b"btle";

/// The bit length of the keys generated by [`f5`], as a 2 byte big-endian value
const F5_LENGTH: [u8; 2] = [0x01, 0x00];

/// Key ID for converting a BR/EDR link key into an LE LTK with [`h6`]
pub const KEY_ID_BRLE: [u8; 4] = *b"brle";

/// Key ID for converting an LE LTK into a BR/EDR link key with [`h6`]
pub const KEY_ID_LEBR: [u8; 4] = *b"lebr";

/// Key ID for creating the intermediate key from an LTK with [`h6`] (or the salt for [`h7`])
pub const KEY_ID_TMP1: [u8; 4] = *b"tmp1";

/// Key ID for creating the intermediate key from a link key with [`h6`] (or the salt for [`h7`])
pub const KEY_ID_TMP2: [u8; 4] = *b"tmp2";

/// The address structure used as input to pairing functions [`f5`] and [`f6`]
///
/// This is the 6 byte device address with the address type prepended to it. The most significant
/// byte is 0x0 if the address is a public address, or 0x1 if the address is a random address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairingAddress([u8; 7]);

impl PairingAddress {
    /// Create a `PairingAddress`
    ///
    /// The `addr` is in the little-endian order used by the HCI and Security Manager PDUs.
    pub fn new(addr: &[u8; 6], is_random_address: bool) -> Self {
        let init_byte: u8 = if is_random_address { 1 } else { 0 };

        let mut p_addr = [0, 0, 0, 0, 0, 0, init_byte];

        p_addr[..6].copy_from_slice(addr);

        // Reverse to put the address information into the correct byte order
        p_addr.reverse();

        PairingAddress(p_addr)
    }

    /// Create a `PairingAddress` from its big-endian bytes (address type first)
    pub fn from_bytes(bytes: [u8; 7]) -> Self {
        PairingAddress(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 7] {
        &self.0
    }
}

/// Phase 2 (LE legacy) confirm value function
///
/// # Inputs
/// - k: AES key (the temporary key)
/// - r: plain text
/// - pres: the 7 byte pairing response command
/// - preq: the 7 byte pairing request command
/// - iat: the initiating device address type, mapped to a boolean (random address is `true`)
/// - ia: the 6 byte initiating device address
/// - rat: the responding device address type, mapped to a boolean
/// - ra: the 6 byte responding device address
#[allow(clippy::too_many_arguments)]
pub fn c1<C: BlockCipher>(
    cipher: &C,
    k: &Key,
    r: &Block,
    pres: &[u8; 7],
    preq: &[u8; 7],
    iat: bool,
    ia: &[u8; 6],
    rat: bool,
    ra: &[u8; 6],
) -> Block {
    let mut p1 = c1_p1(pres, preq, iat, rat);

    let p2 = c1_p2(ia, ra);

    let mut m = *r;

    xor_block(&mut m, &p1);

    m = cipher.encrypt(k, &m);

    xor_block(&mut m, &p2);

    let confirm = cipher.encrypt(k, &m);

    p1.zeroize();
    m.zeroize();

    confirm
}

/// `p1 = pres || preq || rat' || iat'`
fn c1_p1(pres: &[u8; 7], preq: &[u8; 7], iat: bool, rat: bool) -> Block {
    let mut p1 = [0u8; BLOCK_SIZE];

    p1[0..7].copy_from_slice(pres);
    p1[7..14].copy_from_slice(preq);
    p1[14] = if rat { 1 } else { 0 };
    p1[15] = if iat { 1 } else { 0 };

    p1
}

/// `p2 = padding || ia || ra`
fn c1_p2(ia: &[u8; 6], ra: &[u8; 6]) -> Block {
    let mut p2 = [0u8; BLOCK_SIZE];

    p2[4..10].copy_from_slice(ia);
    p2[10..16].copy_from_slice(ra);

    p2
}

/// Phase 2 (LE legacy) short term key (STK) function
///
/// The STK is generated from the least significant 64 bits of `r1` and `r2`.
pub fn s1<C: BlockCipher>(cipher: &C, k: &Key, r1: &Block, r2: &Block) -> Key {
    let mut r_p = [0u8; BLOCK_SIZE];

    r_p[..8].copy_from_slice(&r1[8..]);
    r_p[8..].copy_from_slice(&r2[8..]);

    let stk = Key::new(cipher.encrypt(k, &r_p));

    r_p.zeroize();

    stk
}

/// Phase 2 (LE Secure) confirm value function
///
/// This function is used for generating the confirm values for the LE secure connections process,
/// however it is used differently depending on the type of security model.
///
/// # Inputs
/// The inputs u, v, x, and z depend on the type of model used for generating a secure connection.
/// The inputs of `f4` are a combination of *PKax*, *PKbx*, *Na(i)*, *Nb(i)*, ra, rb, rai, and rbi,
/// but not all of these are used for each model. Check the sections for each model to see what
/// values are used for the inputs to `f4`.
///
/// * PKax is the x coordinate of the public key of Device A
/// * PKbx is the x coordinate of the public key of Device B
/// * Na is the nonce from Device A
/// * Nb is the nonce from Device B
/// * Nai is a nonce value from the *i*th round from Device A
/// * Nbi is a nonce value from the *i*th round from Device B
/// * ra is a random value generated by Device A
/// * rb is a random value generated by Device B
/// * rai is generated by setting the most significant bit to 1 and the least significant bit is one
///   arbitrary bit of the passkey for device A. The value of rai can be either 0x80 or 0x81.
/// * rbi (see rai)
///
/// # Models Numeric Comparison or Just Works
///
/// ## Calculation of *Ca*
/// * u = PKax
/// * v = PKbx
/// * x = Na
/// * z = 0
///
/// ## Calculation of *Cb*
/// * u = PKbx
/// * v = PKax
/// * x = Nb
/// * z = 0
///
/// # Model Out-Of-Band
///
/// ## Calculation of *Ca*
/// * u = PKax
/// * v = PKax
/// * x = ra
/// * z = 0
///
/// # Model Passkey Entry
///
/// ## Calculation of *Cai*
/// * u = PKax
/// * v = PKbx
/// * x = Nai
/// * z = rai
pub fn f4<C: BlockCipher>(cipher: &C, u: &[u8; 32], v: &[u8; 32], x: &Key, z: u8) -> Block {
    cmac::generate_slices(cipher, x, &[u, v, &[z]])
}

/// Phase 2 (LE Secure) long term key (LTK) and MacKey function
///
/// # Calculating LTK and MacKey
///
/// To return a LTK (long term key) and a MacKey (message authentication code key), the inputs
/// needs to be mapped as follows:
///
/// * w:  The shared secret Diffie-Hellman key generated during LE Secure Connections pairing
///   phase 2
/// * n1: A randomly generated number sent from the master device to the slave
/// * n2: A randomly generated number sent from the slave device to the master
/// * a1: The device address of the *master*
/// * a2: The device address of the *slave*
///
/// The returned value is ( MacKey , LTK )
pub fn f5<C: BlockCipher>(
    cipher: &C,
    w: &[u8; 32],
    n1: &Block,
    n2: &Block,
    a1: &PairingAddress,
    a2: &PairingAddress,
) -> (Key, Key) {
    let key_t = Key::new(cmac::generate(cipher, &F5_SALT, w));

    // The 'Counter' is the first byte of the message
    let derive = |counter: u8| {
        Key::new(cmac::generate_slices(
            cipher,
            &key_t,
            &[&[counter], &F5_KEY_ID, n1, n2, &a1.0, &a2.0, &F5_LENGTH],
        ))
    };

    let mac_key = derive(0);

    let ltk = derive(1);

    (mac_key, ltk)
}

/// Phase 2 (LE Secure) check value generator function
///
/// This function is used for generating the check values for the LE secure connections process,
/// however it is used differently depending on the type of security model.
///
/// # Inputs
/// The inputs depend on the type of model used for generating a secure connection. The inputs of
/// `f6` are a combination of MacKey, Na, Nb, rb, ra, Na20, Nb20, IOcapA, IOCapB, A, and B but not
/// all of these are used for each model.
///
/// * MacKey is the MacKey generated from [`f5`]
/// * Na (and Na20) is the random number sent by the master to the slave
/// * Nb (and Nb20) is the random number sent by the slave to the master
/// * IOcapA is the capabilities of the master (AuthReq, OOB data flag, IO capability)
/// * IOcapB is the capabilities of the slave
/// * ra and rb are zero for numeric comparison, the passkey for passkey entry, or the OOB random
///   values
/// * A is the device address of the *master*
/// * B is the device address of the *slave*
///
/// # Models Numeric Comparison or Just Works
///
/// ## Calculation of *Ea*
/// * w = MacKey
/// * n1 = Na
/// * n2 = Nb
/// * r = 0
/// * io_cap = IOcapA
/// * a1 = A
/// * a2 = B
///
/// ## Calculation of *Eb*
/// * w = MacKey
/// * n1 = Nb
/// * n2 = Na
/// * r = 0
/// * io_cap = IOcapB
/// * a1 = B
/// * a2 = A
#[allow(clippy::too_many_arguments)]
pub fn f6<C: BlockCipher>(
    cipher: &C,
    w: &Key,
    n1: &Block,
    n2: &Block,
    r: &Block,
    io_cap: &[u8; 3],
    a1: &PairingAddress,
    a2: &PairingAddress,
) -> Block {
    cmac::generate_slices(cipher, w, &[n1, n2, r, io_cap, &a1.0, &a2.0])
}

/// Phase 2 (LE Secure) numeric comparison value generator function
///
/// Generating the numeric comparison value is performed by mapping the inputs as follows:
/// * u : PKax - the x-coordinate of the public key PKa of device A
/// * v : PKbx - the x-coordinate of the public key PKb of device B
/// * x : Na - the nonce from device A
/// * y : Nb - the nonce from device B
///
/// The return is the least significant 32 bits of the AES-CMAC. The six least significant
/// *digits* of it are the value displayed to the user, see [`numeric_comparison_value`].
pub fn g2<C: BlockCipher>(cipher: &C, u: &[u8; 32], v: &[u8; 32], x: &Key, y: &Block) -> u32 {
    let mac = cmac::generate_slices(cipher, x, &[u, v, y]);

    let mut low = [0u8; 4];

    low.copy_from_slice(&mac[12..]);

    <u32>::from_be_bytes(low)
}

/// The six digit number displayed to the user for numeric comparison
///
/// This is the output of [`g2`] modulo 10<sup>6</sup>.
pub fn numeric_comparison_value<C: BlockCipher>(
    cipher: &C,
    u: &[u8; 32],
    v: &[u8; 32],
    x: &Key,
    y: &Block,
) -> u32 {
    g2(cipher, u, v, x, y) % 1_000_000
}

/// Link key conversion function
///
/// Converts a key of a given size into a key of another type (v5.0 | Vol 3, Part H, section
/// 2.2.10). The `key_id` is four bytes, typically one of the `KEY_ID_*` constants of this module.
pub fn h6<C: BlockCipher>(cipher: &C, w: &Key, key_id: &[u8; 4]) -> Key {
    Key::new(cmac::generate(cipher, w, key_id))
}

/// Link key conversion function with a salt
///
/// (v5.0 | Vol 3, Part H, section 2.2.11)
pub fn h7<C: BlockCipher>(cipher: &C, salt: &Key, w: &Key) -> Key {
    Key::new(cmac::generate(cipher, salt, w.as_bytes()))
}

/// Key derivation function with a salt and key ID
///
/// `h8(K, S, keyID) = AES-CMAC(AES-CMAC(S, K), keyID)` (v5.2 | Vol 3, Part H, section 2.2.12).
pub fn h8<C: BlockCipher>(cipher: &C, k: &Key, s: &Key, key_id: &[u8; 4]) -> Key {
    let ik = Key::new(cmac::generate(cipher, s, k.as_bytes()));

    Key::new(cmac::generate(cipher, &ik, key_id))
}

/// Tests
///
/// The much of the test data can be retrieved from the end of the Security Manager specification
/// (v5.0 | Vol 3, Part H, Appendix D).
#[cfg(test)]
mod tests {

    use super::*;
    use crate::cipher::Aes128;

    /// This is handy for converting the byte data in the Bluetooth Specification into test data
    ///
    /// spec_data is the concatenation of the data as shown. Whitespace doesn't matter, and the
    /// label at the front of the data is skipped.
    ///
    /// ## Example
    /// Continuous data for 'M' shown in the bluetooth specification
    ///  M0             6bc1bee2 2e409f96 e93d7e11 7393172a
    ///  M1             ae2d8a57 1e03ac9c 9eb76fac 45af8e51
    /// Would translate to
    ///  spec_data      "6bc1bee2 2e409f96 e93d7e11 7393172a ae2d8a57 1e03ac9c 9eb76fac 45af8e51"
    fn parse_spec_test_data(spec_data: &str) -> Vec<u8> {
        let digits = spec_data
            .split_whitespace()
            .filter(|word| word.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()))
            .collect::<String>();

        (0..digits.len())
            .step_by(2)
            .map(|i| <u8>::from_str_radix(&digits[i..i + 2], 16).unwrap())
            .collect()
    }

    fn array_32(spec_data: &str) -> [u8; 32] {
        let mut a = [0u8; 32];

        a.copy_from_slice(&parse_spec_test_data(spec_data));

        a
    }

    fn address(spec_data: &str) -> PairingAddress {
        let mut a = [0u8; 7];

        a.copy_from_slice(&parse_spec_test_data(spec_data));

        PairingAddress::from_bytes(a)
    }

    fn block(val: u128) -> Block {
        val.to_be_bytes()
    }

    const U: &str = "
        U              20b003d2 f297be2c 5e2c83a7 e9f9a5b9
                       eff49111 acf4fddb cc030148 0e359de6
    ";

    const V: &str = "
        V              55188b3d 32f6bb9a 900afcfb eed4e72a
                       59cb9ac2 f19d7cfb 6b4fdd49 f47fc5fd
    ";

    const DH_KEY: &str = "
        DHKey(W)       ec0234a3 57c8ad05 341010a6 0a397d9b
                       99796b13 b4f866f1 868d34f3 73bfa698
    ";

    const NA: u128 = 0xd5cb8454_d177733e_ffffb2ec_712baeab;

    const NB: u128 = 0xa6e8e7cc_25a75f6e_216583f7_ff3dc4cf;

    const MAC_KEY: u128 = 0x2965f176_a1084a02_fd3f6a20_ce636e20;

    #[test]
    fn parse_spec_test_data_test() {
        assert_eq!(
            vec![0x00u8, 0x56, 0x12, 0x37, 0x37, 0xbf, 0xce],
            parse_spec_test_data("A1             00561237 37bfce")
        );
    }

    #[test]
    fn pairing_address_test() {
        let addr = PairingAddress::new(&[0xce, 0xbf, 0x37, 0x37, 0x12, 0x56], false);

        assert_eq!(address("A1             00561237 37bfce"), addr);

        let random = PairingAddress::new(&[0xce, 0xbf, 0x37, 0x37, 0x12, 0x56], true);

        assert_eq!(&[0x01u8, 0x56, 0x12, 0x37, 0x37, 0xbf, 0xce], random.as_bytes());
    }

    #[test]
    fn c1_p_test() {
        let pres = [0x05, 0x00, 0x08, 0x00, 0x00, 0x03, 0x02];
        let preq = [0x07, 0x07, 0x10, 0x00, 0x00, 0x01, 0x01];
        let ia = [0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6];
        let ra = [0xB1, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6];

        assert_eq!(block(0x05000800000302070710000001010001), c1_p1(&pres, &preq, true, false));

        assert_eq!(block(0x00000000A1A2A3A4A5A6B1B2B3B4B5B6), c1_p2(&ia, &ra));
    }

    #[test]
    fn c1_test() {
        let k = Key::from(0u128);
        let r = block(0x5783D52156AD6F0E6388274EC6702EE0);
        let pres = [0x05, 0x00, 0x08, 0x00, 0x00, 0x03, 0x02];
        let preq = [0x07, 0x07, 0x10, 0x00, 0x00, 0x01, 0x01];
        let ia = [0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6];
        let ra = [0xB1, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6];

        assert_eq!(
            block(0x1e1e3fef878988ead2a74dc5bef13b86),
            c1(&Aes128, &k, &r, &pres, &preq, true, &ia, false, &ra)
        );
    }

    #[test]
    fn s1_test() {
        let k = Key::from(0u128);
        let r1 = block(0x000F0E0D0C0B0A091122334455667788);
        let r2 = block(0x010203040506070899AABBCCDDEEFF00);

        assert_eq!(Key::from(0x9a1fe1f0e8b0f49b5b4216ae796da062u128), s1(&Aes128, &k, &r1, &r2));
    }

    /// Data is from section D.2 (Bluetooth Spec. v5.0 | Vol 3, Part H, Appendix D)
    #[test]
    fn f4_test() {
        let u = array_32(U);

        let v = array_32(V);

        let x = Key::from(NA);

        let z = 0;

        assert_eq!(block(0xf2c916f1_07a9bd1c_f1eda1be_a974872d), f4(&Aes128, &u, &v, &x, z));
    }

    /// Data is from section D.3 (Bluetooth Spec. v5.0 | Vol 3, Part H, Appendix D)
    #[test]
    fn f5_test() {
        let dh_key = array_32(DH_KEY);

        let a1 = address("A1             00561237 37bfce");

        let a2 = address("A2             00a71370 2dcfc1");

        let mac_key = Key::from(MAC_KEY);

        let ltk = Key::from(0x69867911_69d7cd23_980522b5_94750a38u128);

        let rslt = f5(&Aes128, &dh_key, &block(NA), &block(NB), &a1, &a2);

        // Key does not print its value, so compare the raw bytes for a useful failure message
        assert_eq!(mac_key.to_u128(), rslt.0.to_u128(), "MacKey");
        assert_eq!(ltk.to_u128(), rslt.1.to_u128(), "LTK");
        assert_eq!((mac_key, ltk), rslt);
    }

    /// Data is from section D.4 (Bluetooth Spec. v5.0 | Vol 3, Part H, Appendix D)
    #[test]
    fn f6_test() {
        let r = block(0x12a3343b_b453bb54_08da42d2_0c2d0fc8);

        let mut io_cap = [0u8; 3];

        io_cap.copy_from_slice(&parse_spec_test_data("IOcap          010102"));

        let a1 = address("A1             00561237 37bfce");

        let a2 = address("A2             00a71370 2dcfc1");

        assert_eq!(
            block(0xe3c47398_9cd0e8c5_d26c0b09_da958f61),
            f6(&Aes128, &Key::from(MAC_KEY), &block(NA), &block(NB), &r, &io_cap, &a1, &a2)
        );
    }

    /// Data is from section D.5 (Bluetooth Spec. v5.0 | Vol 3, Part H, Appendix D)
    #[test]
    fn g2_test() {
        let u = array_32(U);

        let v = array_32(V);

        let x = Key::from(NA);

        let y = block(NB);

        assert_eq!(0x2f9ed5ba, g2(&Aes128, &u, &v, &x, &y));

        assert_eq!(938554, numeric_comparison_value(&Aes128, &u, &v, &x, &y));
    }

    /// Data is from section D.6 (Bluetooth Spec. v5.0 | Vol 3, Part H, Appendix D)
    #[test]
    fn h6_test() {
        let w = Key::from(0xec0234a3_57c8ad05_341010a6_0a397d9bu128);

        assert_eq!(
            Key::from(0x2d9ae102_e76dc91c_e8d3a9e2_80b16399u128),
            h6(&Aes128, &w, &KEY_ID_LEBR)
        );
    }

    /// Data is from section D.8 (Bluetooth Spec. v5.0 | Vol 3, Part H, Appendix D)
    #[test]
    fn h7_test() {
        let salt = Key::from(0x00000000_00000000_00000000_746D7031u128);

        let w = Key::from(0xec0234a3_57c8ad05_341010a6_0a397d9bu128);

        assert_eq!(&KEY_ID_TMP1, &salt.as_bytes()[12..]);

        assert_eq!(Key::from(0xfb173597_c6a3c0ec_d2998c2a_75a57011u128), h7(&Aes128, &salt, &w));
    }

    #[test]
    fn h8_is_h7_then_h6() {
        let k = Key::from(0xec0234a3_57c8ad05_341010a6_0a397d9bu128);

        let s = Key::from(0x15_36_d1_8d_e3_d2_0d_f9_9b_70_04_c8_e6_d8_ad_4cu128);

        let key_id = [0xcc, 0x03, 0x01, 0x48];

        assert_eq!(h6(&Aes128, &h7(&Aes128, &s, &k), &key_id), h8(&Aes128, &k, &s, &key_id));

        assert_ne!(h8(&Aes128, &k, &s, &key_id), h8(&Aes128, &k, &s, &KEY_ID_TMP2));
    }
}
