//! Bounds-checked little-endian cursor over a byte buffer.
//!
//! The reader knows nothing about the `.lab` schema. Every read either
//! returns the decoded value and advances the cursor, or fails with a
//! [`ReadError`] and leaves the cursor where it was.

use crate::error::ReadError;

/// Cursor over borrowed bytes
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position (absolute byte offset)
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move the cursor to an absolute offset. Seeking to the end is allowed.
    pub fn seek(&mut self, offset: usize) -> Result<(), ReadError> {
        if offset > self.data.len() {
            return Err(ReadError::OffsetOutOfRange {
                offset,
                len: self.data.len(),
            });
        }
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), ReadError> {
        self.take(n).map(|_| ())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ReadError> {
        self.take(n)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ReadError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, ReadError> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    /// Read `N` consecutive f32 values
    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N], ReadError> {
        let start = self.pos;
        // Check the whole span first so a short read never consumes a prefix
        self.ensure(N * 4)?;
        let mut out = [0.0f32; N];
        for value in out.iter_mut() {
            *value = self.read_f32()?;
        }
        debug_assert_eq!(self.pos, start + N * 4);
        Ok(out)
    }

    /// Read exactly `n` bytes and trim everything from the first NUL on.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String, ReadError> {
        let offset = self.pos;
        let bytes = self.take(n)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        decode_utf8(&bytes[..end], offset)
    }

    /// Read up to and including the next NUL byte, or to the end of the buffer.
    ///
    /// The terminator is consumed but not returned.
    pub fn read_cstring(&mut self) -> Result<String, ReadError> {
        let offset = self.pos;
        let rest = &self.data[self.pos..];
        let (text, consumed) = match rest.iter().position(|&b| b == 0) {
            Some(nul) => (&rest[..nul], nul + 1),
            None => (rest, rest.len()),
        };
        let value = decode_utf8(text, offset)?;
        self.pos += consumed;
        Ok(value)
    }

    fn ensure(&self, requested: usize) -> Result<(), ReadError> {
        if requested > self.remaining() {
            return Err(ReadError::TruncatedInput {
                requested,
                available: self.remaining(),
                offset: self.pos,
            });
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ReadError> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

fn decode_utf8(bytes: &[u8], offset: usize) -> Result<String, ReadError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| ReadError::InvalidString { offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian_primitives() {
        let mut bytes = vec![0xAB];
        bytes.extend_from_slice(&0x1234u16.to_le_bytes());
        bytes.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        bytes.extend_from_slice(&1.5f32.to_le_bytes());

        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u32().unwrap(), 0xDEADBEEF);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_truncated_read_reports_context() {
        let bytes = [1u8, 2, 3];
        let mut reader = BinaryReader::new(&bytes);
        reader.skip(1).unwrap();

        let err = reader.read_u32().unwrap_err();
        assert_eq!(
            err,
            ReadError::TruncatedInput {
                requested: 4,
                available: 2,
                offset: 1,
            }
        );
        // Failed reads don't move the cursor
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_f32_array_is_all_or_nothing() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&2.0f32.to_le_bytes());

        let mut reader = BinaryReader::new(&bytes);
        assert!(matches!(
            reader.read_f32_array::<3>(),
            Err(ReadError::TruncatedInput { requested: 12, .. })
        ));
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_f32_array::<2>().unwrap(), [1.0, 2.0]);
    }

    #[test]
    fn test_fixed_string_trims_nul_padding() {
        let mut bytes = [0u8; 8];
        bytes[..5].copy_from_slice(b"Bip01");
        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(reader.read_fixed_string(8).unwrap(), "Bip01");
        assert_eq!(reader.position(), 8);
    }

    #[test]
    fn test_cstring_stops_at_nul_or_end() {
        let bytes = b"walk\0run";
        let mut reader = BinaryReader::new(bytes);
        assert_eq!(reader.read_cstring().unwrap(), "walk");
        assert_eq!(reader.position(), 5);
        assert_eq!(reader.read_cstring().unwrap(), "run");
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.read_cstring().unwrap(), "");
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let bytes = [0xFFu8, 0xFE, 0];
        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(
            reader.read_cstring(),
            Err(ReadError::InvalidString { offset: 0 })
        );
    }

    #[test]
    fn test_seek_bounds() {
        let bytes = [0u8; 4];
        let mut reader = BinaryReader::new(&bytes);
        reader.seek(4).unwrap();
        assert_eq!(reader.remaining(), 0);
        assert_eq!(
            reader.seek(5),
            Err(ReadError::OffsetOutOfRange { offset: 5, len: 4 })
        );
        assert_eq!(reader.position(), 4);
    }
}
