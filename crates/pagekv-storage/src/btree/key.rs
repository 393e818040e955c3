//! Key hashing and the composite order key.
//!
//! Records sort by a 64-bit order key: the key's rolling hash in the high 32
//! bits and the biased value in the low 32 bits. Equal hashes cluster
//! together, and within one key the values come out ascending.

use pagekv_common::{PagekvError, Result, MAX_KEY_LEN};

/// XOR bias mapping `i32` onto `u32` while preserving order.
pub const VALUE_BIAS: u32 = 0x8000_0000;

/// Rolling hash of a key, multiplier 101, masked after every step.
///
/// Bytes are sign-extended before they are added.
#[inline]
pub fn hash_key(key: &[u8], mask: u32) -> u32 {
    key.iter().fold(0u32, |h, &b| {
        h.wrapping_mul(101).wrapping_add(b as i8 as u32) & mask
    })
}

/// Builds the order key for `(hash, value)`.
#[inline]
pub fn order_key(hash: u32, value: i32) -> u64 {
    ((hash as u64) << 32) | (value as u32 ^ VALUE_BIAS) as u64
}

/// Smallest order key carrying `hash`.
#[inline]
pub fn min_order_key(hash: u32) -> u64 {
    (hash as u64) << 32
}

/// Hash component of an order key.
#[inline]
pub fn hash_of(order_key: u64) -> u32 {
    (order_key >> 32) as u32
}

/// Value component of an order key.
#[inline]
pub fn value_of(order_key: u64) -> i32 {
    (order_key as u32 ^ VALUE_BIAS) as i32
}

/// Rejects keys that do not fit a record.
#[inline]
pub fn check_key(key: &[u8]) -> Result<()> {
    if key.len() > MAX_KEY_LEN {
        return Err(PagekvError::KeyTooLarge {
            size: key.len(),
            max: MAX_KEY_LEN,
        });
    }
    Ok(())
}

/// A leaf record: key bytes plus order key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Record {
    key: [u8; MAX_KEY_LEN],
    len: u8,
    order_key: u64,
}

impl Record {
    /// Creates a record, failing if the key is too long.
    pub fn new(key: &[u8], order_key: u64) -> Result<Self> {
        check_key(key)?;
        let mut buf = [0u8; MAX_KEY_LEN];
        buf[..key.len()].copy_from_slice(key);
        Ok(Self {
            key: buf,
            len: key.len() as u8,
            order_key,
        })
    }

    /// Key bytes.
    #[inline]
    pub fn key(&self) -> &[u8] {
        &self.key[..self.len as usize]
    }

    /// Zero padded key buffer as stored on disk.
    #[inline]
    pub fn padded_key(&self) -> &[u8; MAX_KEY_LEN] {
        &self.key
    }

    #[inline]
    pub fn order_key(&self) -> u64 {
        self.order_key
    }

    #[inline]
    pub fn hash(&self) -> u32 {
        hash_of(self.order_key)
    }

    #[inline]
    pub fn value(&self) -> i32 {
        value_of(self.order_key)
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("key", &String::from_utf8_lossy(self.key()))
            .field("hash", &self.hash())
            .field("value", &self.value())
            .finish()
    }
}
