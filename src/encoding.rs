//! Canonical byte encoding
//!
//! Signatures are taken over these bytes, so two parties that hold logically
//! identical content must produce identical output. The layout is fixed:
//! integers little-endian, strings and byte blobs prefixed with a `u32`
//! length, optional values prefixed with a presence tag. Field order is the
//! order in which `encode` implementations write them and must never change.

use crate::crypto::{PublicKey, SecureHash};

/// Types with a canonical byte form
pub trait Canonical {
    /// Append this value's canonical bytes to `out`
    fn encode(&self, out: &mut CanonicalWriter);

    /// Canonical bytes of this value alone
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = CanonicalWriter::new();
        self.encode(&mut out);
        out.finish()
    }
}

/// Append-only builder for canonical bytes
#[derive(Default)]
pub struct CanonicalWriter {
    bytes: Vec<u8>,
}

impl CanonicalWriter {
    /// Empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Single byte, used for type and variant tags
    pub fn tag(&mut self, tag: u8) -> &mut Self {
        self.bytes.push(tag);
        self
    }

    /// Boolean as one byte
    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.tag(u8::from(value))
    }

    /// 4 bytes, little-endian
    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// 8 bytes, little-endian
    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Length-prefixed bytes
    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.u32(value.len() as u32);
        self.bytes.extend_from_slice(value);
        self
    }

    /// Length-prefixed UTF-8
    pub fn str(&mut self, value: &str) -> &mut Self {
        self.bytes(value.as_bytes())
    }

    /// Presence tag then the string
    pub fn opt_str(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(s) => self.tag(1).str(s),
            None => self.tag(0),
        }
    }

    /// Presence tag then the integer
    pub fn opt_u64(&mut self, value: Option<u64>) -> &mut Self {
        match value {
            Some(v) => self.tag(1).u64(v),
            None => self.tag(0),
        }
    }

    /// Raw 32 key bytes (fixed width, no prefix)
    pub fn key(&mut self, key: &PublicKey) -> &mut Self {
        self.bytes.extend_from_slice(key.as_bytes());
        self
    }

    /// Raw 32 digest bytes (fixed width, no prefix)
    pub fn hash(&mut self, hash: &SecureHash) -> &mut Self {
        self.bytes.extend_from_slice(hash.as_bytes());
        self
    }

    /// Count prefix then each item
    pub fn seq<T: Canonical>(&mut self, items: &[T]) -> &mut Self {
        self.u32(items.len() as u32);
        for item in items {
            item.encode(self);
        }
        self
    }

    /// Nested value
    pub fn value<T: Canonical + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.encode(self);
        self
    }

    /// Take the accumulated bytes
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
