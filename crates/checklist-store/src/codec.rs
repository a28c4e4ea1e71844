//! Pooled bincode serializers for payloads.
//!
//! A codec owns a reusable output buffer. Codecs are taken from a pool and
//! handed back when the guard is dropped, so threads never share one.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, StoreError};

/// Default number of idle codecs kept by a pool.
pub const DEFAULT_POOL_SIZE: usize = 4;

#[derive(Debug, Default)]
pub struct Codec {
    buf: Vec<u8>,
}

impl Codec {
    /// Encodes `value` into the codec's buffer and returns the bytes.
    pub fn encode<T: Serialize>(&mut self, what: &'static str, value: &T) -> Result<&[u8]> {
        self.buf.clear();
        bincode::serialize_into(&mut self.buf, value).map_err(|source| StoreError::Codec {
            operation: "encode",
            what,
            source,
        })?;
        Ok(&self.buf)
    }

    pub fn decode<T: DeserializeOwned>(&self, what: &'static str, bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes).map_err(|source| StoreError::Codec {
            operation: "decode",
            what,
            source,
        })
    }
}

#[derive(Debug)]
pub struct CodecPool {
    idle: Mutex<Vec<Codec>>,
    capacity: usize,
}

impl CodecPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Takes an idle codec or creates a fresh one.
    pub fn acquire(&self) -> PooledCodec<'_> {
        let codec = self.idle.lock().pop().unwrap_or_default();
        PooledCodec {
            pool: self,
            codec: Some(codec),
        }
    }

    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, codec: Codec) {
        let mut idle = self.idle.lock();
        if idle.len() < self.capacity {
            idle.push(codec);
        }
    }
}

impl Default for CodecPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

/// Guard returning its codec to the pool on drop.
pub struct PooledCodec<'a> {
    pool: &'a CodecPool,
    codec: Option<Codec>,
}

impl Deref for PooledCodec<'_> {
    type Target = Codec;

    fn deref(&self) -> &Codec {
        self.codec.as_ref().unwrap_or_else(|| unreachable!("codec taken before drop"))
    }
}

impl DerefMut for PooledCodec<'_> {
    fn deref_mut(&mut self) -> &mut Codec {
        self.codec.as_mut().unwrap_or_else(|| unreachable!("codec taken before drop"))
    }
}

impl Drop for PooledCodec<'_> {
    fn drop(&mut self) {
        if let Some(codec) = self.codec.take() {
            self.pool.release(codec);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklist_model::{ParsedName, Rank};

    #[test]
    fn test_codec_round_trip() {
        let pool = CodecPool::default();
        let name = ParsedName::preliminary(Some("42".into()), Rank::Subspecies);
        let bytes = pool.acquire().encode("name", &name).unwrap().to_vec();
        let decoded: ParsedName = pool.acquire().decode("name", &bytes).unwrap();
        assert_eq!(decoded, name);
    }

    #[test]
    fn test_pool_reuses_and_caps_codecs() {
        let pool = CodecPool::new(1);
        {
            let _a = pool.acquire();
            let _b = pool.acquire();
        }
        assert_eq!(pool.idle(), 1);
        let _c = pool.acquire();
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_pool_is_shared_across_threads() {
        let pool = CodecPool::new(2);
        std::thread::scope(|scope| {
            for i in 0..4u64 {
                let pool = &pool;
                scope.spawn(move || {
                    let mut codec = pool.acquire();
                    let bytes = codec.encode("key", &i).unwrap().to_vec();
                    let back: u64 = codec.decode("key", &bytes).unwrap();
                    assert_eq!(back, i);
                });
            }
        });
        assert!(pool.idle() <= 2);
    }
}
