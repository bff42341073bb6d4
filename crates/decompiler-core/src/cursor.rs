//! Sequential, bounds-checked reader over an immutable image slice.

use crate::fault::DecodeFault;

/// Number of bytes shown by [`ByteCursor::inspect_here`].
pub const INSPECT_WINDOW_BYTES: usize = 4;

/// Read cursor over a borrowed byte buffer.
///
/// The offset always stays within `0..=len`. Consuming reads that would run
/// past the end fail with [`DecodeFault::OutOfBounds`] and leave the offset
/// untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor positioned at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    /// Returns the current read offset.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Moves the read offset.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeFault::OutOfBounds`] when `offset` is past the end.
    pub const fn seek(&mut self, offset: usize) -> Result<(), DecodeFault> {
        if offset > self.buffer.len() {
            return Err(DecodeFault::OutOfBounds {
                offset,
                requested: 0,
                len: self.buffer.len(),
            });
        }
        self.offset = offset;
        Ok(())
    }

    /// Returns the buffer length.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` when the buffer holds no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the underlying buffer.
    #[must_use]
    pub const fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeFault> {
        let end = self.offset.checked_add(N).filter(|end| *end <= self.buffer.len());
        let Some(end) = end else {
            return Err(DecodeFault::OutOfBounds {
                offset: self.offset,
                requested: N,
                len: self.buffer.len(),
            });
        };
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.buffer[self.offset..end]);
        self.offset = end;
        Ok(bytes)
    }

    /// Reads one unsigned byte.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeFault::OutOfBounds`] at the end of the buffer.
    pub fn uint8(&mut self) -> Result<u8, DecodeFault> {
        self.take::<1>().map(|[b]| b)
    }

    /// Reads one byte and sign-extends it.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeFault::OutOfBounds`] at the end of the buffer.
    pub fn int8(&mut self) -> Result<i8, DecodeFault> {
        self.take::<1>().map(i8::from_le_bytes)
    }

    /// Reads a little-endian 16-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeFault::OutOfBounds`] when fewer than two bytes remain.
    pub fn uint16(&mut self) -> Result<u16, DecodeFault> {
        self.take::<2>().map(u16::from_le_bytes)
    }

    /// Returns the byte at the current offset without advancing.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeFault::OutOfBounds`] at the end of the buffer.
    pub fn peek_uint8(&self) -> Result<u8, DecodeFault> {
        self.buffer
            .get(self.offset)
            .copied()
            .ok_or(DecodeFault::OutOfBounds {
                offset: self.offset,
                requested: 1,
                len: self.buffer.len(),
            })
    }

    /// Returns up to `length` raw bytes from `offset`, truncated at the end of
    /// the buffer. Never fails and never advances.
    #[must_use]
    pub fn inspect(&self, offset: usize, length: usize) -> &'a [u8] {
        let start = offset.min(self.buffer.len());
        let end = offset.saturating_add(length).min(self.buffer.len());
        &self.buffer[start..end]
    }

    /// Returns the diagnostic window at the current offset.
    #[must_use]
    pub fn inspect_here(&self) -> &'a [u8] {
        self.inspect(self.offset, INSPECT_WINDOW_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::ByteCursor;
    use crate::fault::DecodeFault;

    #[test]
    fn reads_advance_by_width() {
        let bytes = [0x21, 0x34, 0x12, 0xfe];
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.uint8(), Ok(0x21));
        assert_eq!(cursor.offset(), 1);
        assert_eq!(cursor.uint16(), Ok(0x1234));
        assert_eq!(cursor.offset(), 3);
        assert_eq!(cursor.int8(), Ok(-2));
        assert_eq!(cursor.offset(), 4);
    }

    #[test]
    fn peek_does_not_advance() {
        let bytes = [0xc9];
        let cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.peek_uint8(), Ok(0xc9));
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn short_uint16_fails_without_advancing() {
        let bytes = [0x00, 0x01];
        let mut cursor = ByteCursor::new(&bytes);
        cursor.uint8().expect("first byte");
        assert_eq!(
            cursor.uint16(),
            Err(DecodeFault::OutOfBounds {
                offset: 1,
                requested: 2,
                len: 2
            })
        );
        assert_eq!(cursor.offset(), 1);
    }

    #[test]
    fn inspect_truncates_at_end() {
        let bytes = [1, 2, 3];
        let cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.inspect(1, 4), &[2, 3]);
        assert_eq!(cursor.inspect(7, 4), &[] as &[u8]);
        assert_eq!(cursor.inspect_here(), &[1, 2, 3]);
    }

    #[test]
    fn seek_past_end_is_rejected() {
        let bytes = [0u8; 2];
        let mut cursor = ByteCursor::new(&bytes);
        assert!(cursor.seek(2).is_ok());
        assert!(cursor.seek(3).is_err());
        assert_eq!(cursor.offset(), 2);
    }

    proptest! {
        #[test]
        fn offset_never_exceeds_length(bytes in proptest::collection::vec(any::<u8>(), 0..16), reads in 0usize..24) {
            let mut cursor = ByteCursor::new(&bytes);
            for i in 0..reads {
                let _ = if i % 3 == 0 { cursor.uint16().map(|_| ()) } else { cursor.uint8().map(|_| ()) };
                prop_assert!(cursor.offset() <= bytes.len());
            }
        }
    }
}
