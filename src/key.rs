use crate::{Block, Error, BLOCK_SIZE};
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 128-bit key
///
/// The key is cleared from memory when it is dropped and it is never printed by `Debug`. Equality
/// is checked in constant time.
///
/// Keys are in big-endian order, the order the Bluetooth Specification shows its sample data. A
/// key received in a Security Manager or HCI packet is little-endian and must be reversed first
/// (see [`from_le_bytes`](Key::from_le_bytes)).
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; BLOCK_SIZE]);

impl Key {
    pub const fn new(bytes: [u8; BLOCK_SIZE]) -> Self {
        Key(bytes)
    }

    /// Create a key from little-endian bytes
    pub fn from_le_bytes(mut bytes: [u8; BLOCK_SIZE]) -> Self {
        bytes.reverse();

        let key = Key(bytes);

        bytes.zeroize();

        key
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }

    /// Get the key as a big-endian `u128`
    pub fn to_u128(&self) -> u128 {
        <u128>::from_be_bytes(self.0)
    }
}

impl From<[u8; BLOCK_SIZE]> for Key {
    fn from(bytes: [u8; BLOCK_SIZE]) -> Self {
        Key(bytes)
    }
}

/// The `u128` is converted to big-endian bytes
impl From<u128> for Key {
    fn from(val: u128) -> Self {
        Key(val.to_be_bytes())
    }
}

impl ConstantTimeEq for Key {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[..].ct_eq(&other.0[..])
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.ct_eq(other))
    }
}

impl Eq for Key {}

impl core::fmt::Debug for Key {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_tuple("Key").field(&"<secret key>").finish()
    }
}

/// The size of a CCM message integrity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicSize {
    /// 32-bit MIC, used by Mesh access messages and network PDUs of access messages
    Four,
    /// 64-bit MIC, used by Mesh control messages and segmented access messages with SZMIC set
    Eight,
}

#[allow(clippy::len_without_is_empty)]
impl MicSize {
    pub fn len(self) -> usize {
        match self {
            MicSize::Four => 4,
            MicSize::Eight => 8,
        }
    }
}

impl core::convert::TryFrom<usize> for MicSize {
    type Error = Error;

    fn try_from(len: usize) -> Result<Self, Self::Error> {
        match len {
            4 => Ok(MicSize::Four),
            8 => Ok(MicSize::Eight),
            _ => Err(Error::MicSize),
        }
    }
}

/// Message integrity check
///
/// The MIC produced by [`ccm`](crate::ccm). It is the first `size` bytes of the masked CBC-MAC.
/// Comparison between two `Mic`s is done in constant time.
#[derive(Clone, Copy)]
pub struct Mic {
    bytes: [u8; 8],
    size: MicSize,
}

impl Mic {
    /// Create a `Mic` from received bytes
    ///
    /// An error is returned if `bytes` is not four or eight bytes long.
    pub fn new(bytes: &[u8]) -> Result<Self, Error> {
        use core::convert::TryFrom;

        let size = MicSize::try_from(bytes.len())?;

        let mut mic = Mic { bytes: [0; 8], size };

        mic.bytes[..bytes.len()].copy_from_slice(bytes);

        Ok(mic)
    }

    /// Truncate `block` to a MIC of `size`
    pub(crate) fn from_block(block: &Block, size: MicSize) -> Self {
        let mut mic = Mic { bytes: [0; 8], size };

        mic.bytes[..size.len()].copy_from_slice(&block[..size.len()]);

        mic
    }

    pub fn size(&self) -> MicSize {
        self.size
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.size.len()]
    }
}

impl AsRef<[u8]> for Mic {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl ConstantTimeEq for Mic {
    fn ct_eq(&self, other: &Self) -> Choice {
        // the size of a MIC is public
        if self.size != other.size {
            Choice::from(0)
        } else {
            self.as_slice().ct_eq(other.as_slice())
        }
    }
}

impl PartialEq for Mic {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.ct_eq(other))
    }
}

impl Eq for Mic {}

impl core::fmt::Debug for Mic {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Mic({:02x?})", self.as_slice())
    }
}
