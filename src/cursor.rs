//! Bounds-checked, seekable reader over an owned byte buffer.
//!
//! All multi-byte values are stored big-endian (the NBT and region formats
//! both use network byte order). A failed read never moves the cursor, but
//! callers treat the cursor as spent after any error.

use crate::error::{Error, Result};

/// Fixed-width values that can be decoded from big-endian bytes.
pub trait FromBigEndian: Sized {
    const SIZE: usize;

    /// Decode from exactly `SIZE` bytes.
    fn from_be_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_from_big_endian {
    ($($ty:ty),*) => {
        $(
            impl FromBigEndian for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn from_be_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_be_bytes(raw)
                }
            }
        )*
    };
}

impl_from_big_endian!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

#[derive(Debug, Clone)]
pub struct ByteCursor {
    data: Vec<u8>,
    position: usize,
}

impl ByteCursor {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::OutOfRange {
                position,
                requested: 0,
                length: self.data.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Borrow the next `size` bytes and advance past them.
    fn take(&mut self, size: usize) -> Result<&[u8]> {
        let end = self
            .position
            .checked_add(size)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::OutOfRange {
                position: self.position,
                requested: size,
                length: self.data.len(),
            })?;
        let start = self.position;
        self.position = end;
        Ok(&self.data[start..end])
    }

    /// Read one big-endian value of type `T`.
    pub fn read<T: FromBigEndian>(&mut self) -> Result<T> {
        self.take(T::SIZE).map(T::from_be_slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read()
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.read()
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read()
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.read()
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read()
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read()
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read()
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read()
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read()
    }

    pub fn read_bytes(&mut self, size: usize) -> Result<Vec<u8>> {
        self.take(size).map(<[u8]>::to_vec)
    }

    /// Read `size` bytes as text. Invalid UTF-8 is replaced, never rejected.
    pub fn read_string(&mut self, size: usize) -> Result<String> {
        self.take(size)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read `count` consecutive big-endian values.
    ///
    /// The whole extent is checked before anything is allocated, so a bogus
    /// count from corrupt input fails instead of reserving gigabytes.
    pub fn read_array<T: FromBigEndian>(&mut self, count: usize) -> Result<Vec<T>> {
        let size = count.checked_mul(T::SIZE).ok_or(Error::OutOfRange {
            position: self.position,
            requested: usize::MAX,
            length: self.data.len(),
        })?;
        let bytes = self.take(size)?;
        Ok(bytes.chunks_exact(T::SIZE).map(T::from_be_slice).collect())
    }
}
