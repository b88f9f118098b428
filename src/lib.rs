//! Bluetooth symmetric cryptography
//!
//! This is the cryptographic toolbox used by the Security Manager for LE Secure Connections
//! pairing and by the Mesh network and transport layers. It contains
//! * [AES-CMAC](cmac) as used by the Bluetooth Specification v5.0 | Vol 3, Part H, section 2.2.5
//! * [AES-CCM](ccm) formatted the way the Mesh Profile uses it (13 byte nonce, 4 or 8 byte MIC)
//! * the pairing functions [`f4`](toolbox::f4), [`f5`](toolbox::f5), [`f6`](toolbox::f6),
//!   [`g2`](toolbox::g2), [`h6`](toolbox::h6), and [`h7`](toolbox::h7)
//! * the Mesh key derivation functions in [`mesh`]
//!
//! Every function is generic over a [`BlockCipher`] so that an AES-128 implementation supplied by
//! the platform (or a certified hardware engine) can be used instead of the software
//! [`Aes128`](cipher::Aes128).
//!
//! Nothing here keeps state between calls. Keys are wrapped in [`Key`] which clears itself when
//! dropped.

// So this library can be used with no_std targets
#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod bytes;
pub mod ccm;
pub mod cipher;
pub mod cmac;
mod key;
pub mod mesh;
pub mod toolbox;

pub use cipher::BlockCipher;
pub use key::{Key, Mic, MicSize};

/// The size of an AES-128 block
pub const BLOCK_SIZE: usize = 16;

/// A single AES-128 block
pub type Block = [u8; BLOCK_SIZE];

/// The 13 byte nonce used by [`ccm`]
pub type Nonce = [u8; 13];

/// Errors returned by the CCM functions and the MIC constructors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The additional data is 0xFF00 bytes or longer
    AdditionalDataSize,
    /// The message is empty, does not fit within the 16-bit length field of the CCM blocks, or is
    /// shorter than its MIC
    MessageSize,
    /// The MIC is not 4 or 8 bytes
    MicSize,
    /// The received MIC does not match the MIC calculated over the message
    AuthenticationFailed,
}

impl Error {
    /// Check if the error is from an argument that was rejected before any calculation was done
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Error::AdditionalDataSize | Error::MessageSize | Error::MicSize => true,
            Error::AuthenticationFailed => false,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Error::AdditionalDataSize => {
                write!(f, "Additional data must be less than 0xFF00 bytes")
            }
            Error::MessageSize => {
                write!(f, "Invalid message size, must be between 1 and 0xFFFF bytes")
            }
            Error::MicSize => write!(f, "Bad MIC length, allowed sizes are 4 and 8"),
            Error::AuthenticationFailed => write!(f, "Message integrity check failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
