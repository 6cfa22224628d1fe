//! Version-aware binary reader and writer.
//!
//! Primitive values are encoded with bincode (little-endian, fixed-width
//! integers). Structural types implement [`Versioned`] and consult the
//! stream's format version to decide which fields exist.
use bincode::Options;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CampaignError;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

/// A type whose binary layout depends on the save format version.
pub trait Versioned: Sized {
    /// # Errors
    ///
    /// Returns `Format` if a field cannot be encoded.
    fn save(&self, writer: &mut SaveWriter) -> Result<(), CampaignError>;

    /// # Errors
    ///
    /// Returns `Format` for truncated or malformed data.
    fn load(reader: &mut SaveReader<'_>) -> Result<Self, CampaignError>;
}

#[derive(Debug)]
pub struct SaveWriter {
    buf: Vec<u8>,
    version: u32,
}

impl SaveWriter {
    #[must_use]
    pub const fn new(version: u32) -> Self {
        Self {
            buf: Vec::new(),
            version,
        }
    }

    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Whether fields introduced in `since` belong in this stream.
    #[must_use]
    pub const fn has(&self, since: u32) -> bool {
        self.version >= since
    }

    pub fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// # Errors
    ///
    /// Returns `Format` if bincode rejects the value.
    pub fn put<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CampaignError> {
        options().serialize_into(&mut self.buf, value)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Format` if the sequence is too long or an item fails to encode.
    pub fn put_seq<'a, T, I>(&mut self, items: I) -> Result<(), CampaignError>
    where
        T: Versioned + 'a,
        I: IntoIterator<Item = &'a T>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        let len = u32::try_from(items.len())
            .map_err(|_| CampaignError::format("sequence too long"))?;
        self.put(&len)?;
        for item in items {
            item.save(self)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug)]
pub struct SaveReader<'a> {
    rest: &'a [u8],
    version: u32,
}

impl<'a> SaveReader<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8], version: u32) -> Self {
        Self {
            rest: bytes,
            version,
        }
    }

    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub const fn has(&self, since: u32) -> bool {
        self.version >= since
    }

    pub(crate) const fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.rest.len()
    }

    /// # Errors
    ///
    /// Returns `Format` if fewer than `len` bytes remain.
    pub fn raw(&mut self, len: usize) -> Result<&'a [u8], CampaignError> {
        if self.rest.len() < len {
            return Err(CampaignError::format("unexpected end of data"));
        }
        let (head, tail) = self.rest.split_at(len);
        self.rest = tail;
        Ok(head)
    }

    /// # Errors
    ///
    /// Returns `Format` for truncated or malformed values.
    pub fn take<T: DeserializeOwned>(&mut self) -> Result<T, CampaignError> {
        let limit = u64::try_from(self.rest.len()).unwrap_or(u64::MAX);
        let value = options()
            .with_limit(limit)
            .deserialize_from(&mut self.rest)?;
        Ok(value)
    }

    /// # Errors
    ///
    /// Returns `Format` for truncated or malformed items.
    pub fn take_seq<T: Versioned>(&mut self) -> Result<Vec<T>, CampaignError> {
        let len: u32 = self.take()?;
        let mut items = Vec::new();
        for _ in 0..len {
            items.push(T::load(self)?);
        }
        Ok(items)
    }
}
