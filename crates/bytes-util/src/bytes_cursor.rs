use std::io;

use bytes::Bytes;

/// Extension trait for [`io::Cursor`] over [`Bytes`] that hands out zero-copy slices.
pub trait BytesCursorExt {
    /// Extracts the next `size` bytes, advancing the cursor.
    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes>;

    /// Extracts everything left in the cursor.
    fn extract_remaining(&mut self) -> Bytes;
}

impl BytesCursorExt for io::Cursor<Bytes> {
    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes> {
        let position = self.position() as usize;
        let available = self.get_ref().len().saturating_sub(position);
        if available < size {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "not enough bytes"));
        }

        let slice = self.get_ref().slice(position..position + size);
        self.set_position((position + size) as u64);

        Ok(slice)
    }

    fn extract_remaining(&mut self) -> Bytes {
        let position = (self.position() as usize).min(self.get_ref().len());
        let slice = self.get_ref().slice(position..);
        self.set_position(self.get_ref().len() as u64);
        slice
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_extract() {
        let mut cursor = io::Cursor::new(Bytes::from_static(&[1, 2, 3, 4, 5]));

        assert_eq!(cursor.extract_bytes(2).unwrap(), Bytes::from_static(&[1, 2]));
        assert!(cursor.extract_bytes(4).is_err());
        assert_eq!(cursor.extract_remaining(), Bytes::from_static(&[3, 4, 5]));
        assert!(cursor.extract_remaining().is_empty());
    }
}
