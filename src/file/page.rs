use super::error::{FileError, FileResult};

/// Size in bytes of an encoded integer
pub const INT_SIZE: usize = 4;

/// Fixed-size in-memory copy of one block
///
/// Integers are stored as 4 little-endian bytes. Strings are stored as a
/// 4-byte length followed by their UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    data: Vec<u8>,
}

impl Page {
    /// Create a zeroed page of `block_size` bytes
    pub fn new(block_size: usize) -> Self {
        Self {
            data: vec![0u8; block_size],
        }
    }

    /// Wrap raw bytes, e.g. a slice copied out of another page
    pub(crate) fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Number of bytes needed to store a string of `len` bytes
    pub fn str_size(len: usize) -> usize {
        INT_SIZE + len
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn get_int(&self, offset: usize) -> FileResult<i32> {
        let bytes = self.slice(offset, INT_SIZE)?;
        let mut buf = [0u8; INT_SIZE];
        buf.copy_from_slice(bytes);
        Ok(i32::from_le_bytes(buf))
    }

    pub fn set_int(&mut self, offset: usize, value: i32) -> FileResult<()> {
        self.slice_mut(offset, INT_SIZE)?
            .copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Offsets inside a page are stored as integers; this reads one back.
    pub(crate) fn get_offset(&self, offset: usize) -> FileResult<usize> {
        let value = self.get_int(offset)?;
        usize::try_from(value).map_err(|_| FileError::OutOfBounds {
            offset,
            len: INT_SIZE,
            page_size: self.data.len(),
        })
    }

    pub(crate) fn set_offset(&mut self, offset: usize, value: usize) -> FileResult<()> {
        // Offsets never exceed the block size, which is far below i32::MAX.
        self.set_int(offset, value as i32)
    }

    pub fn get_string(&self, offset: usize) -> FileResult<String> {
        let len = self.get_offset(offset)?;
        let bytes = self.slice(offset + INT_SIZE, len)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    pub fn set_string(&mut self, offset: usize, value: &str) -> FileResult<()> {
        let bytes = value.as_bytes();
        // Check the whole extent up front so a failed write leaves the page untouched
        self.slice(offset, Self::str_size(bytes.len()))?;
        self.set_offset(offset, bytes.len())?;
        self.slice_mut(offset + INT_SIZE, bytes.len())?
            .copy_from_slice(bytes);
        Ok(())
    }

    /// Zero every byte of the page
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    pub fn contents_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn slice(&self, offset: usize, len: usize) -> FileResult<&[u8]> {
        let page_size = self.data.len();
        offset
            .checked_add(len)
            .filter(|end| *end <= page_size)
            .map(|end| &self.data[offset..end])
            .ok_or(FileError::OutOfBounds {
                offset,
                len,
                page_size,
            })
    }

    fn slice_mut(&mut self, offset: usize, len: usize) -> FileResult<&mut [u8]> {
        let page_size = self.data.len();
        match offset.checked_add(len) {
            Some(end) if end <= page_size => Ok(&mut self.data[offset..end]),
            _ => Err(FileError::OutOfBounds {
                offset,
                len,
                page_size,
            }),
        }
    }
}
