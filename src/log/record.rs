use std::fmt;

use super::Lsn;
use super::error::{LogError, LogResult};
use crate::file::{FileError, INT_SIZE, Page};

/// A single value of a log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogValue {
    Int(i32),
    Str(String),
}

impl LogValue {
    /// Number of bytes this value occupies in a log block
    pub fn encoded_size(&self) -> usize {
        match self {
            LogValue::Int(_) => INT_SIZE,
            LogValue::Str(s) => Page::str_size(s.len()),
        }
    }

    pub(crate) fn write_to(&self, page: &mut Page, offset: usize) -> LogResult<()> {
        match self {
            LogValue::Int(i) => page.set_int(offset, *i)?,
            LogValue::Str(s) => page.set_string(offset, s)?,
        }
        Ok(())
    }
}

impl From<i32> for LogValue {
    fn from(value: i32) -> Self {
        LogValue::Int(value)
    }
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        LogValue::Str(value.to_string())
    }
}

impl From<String> for LogValue {
    fn from(value: String) -> Self {
        LogValue::Str(value)
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Int(i) => write!(f, "{}", i),
            LogValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Raw view of one log record, read field by field
///
/// The log layer does not know how many fields a record has or what their
/// types are. Callers read them back in the order they were appended.
#[derive(Debug, Clone)]
pub struct LogRecord {
    lsn: Lsn,
    data: Page,
    pos: usize,
}

impl LogRecord {
    pub(crate) fn new(lsn: Lsn, bytes: &[u8]) -> Self {
        Self {
            lsn,
            data: Page::from_bytes(bytes.to_vec()),
            pos: 0,
        }
    }

    /// LSN (log block number) of this record
    pub fn lsn(&self) -> Lsn {
        self.lsn
    }

    /// Encoded length of the record's values
    pub fn len(&self) -> usize {
        self.data.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes not yet consumed by `next_int`/`next_string`
    pub fn remaining(&self) -> usize {
        self.len() - self.pos
    }

    pub fn next_int(&mut self) -> LogResult<i32> {
        let value = self.data.get_int(self.pos).map_err(|e| self.past_end(e))?;
        self.pos += INT_SIZE;
        Ok(value)
    }

    pub fn next_string(&mut self) -> LogResult<String> {
        let value = self
            .data
            .get_string(self.pos)
            .map_err(|e| self.past_end(e))?;
        self.pos += Page::str_size(value.len());
        Ok(value)
    }

    fn past_end(&self, err: FileError) -> LogError {
        match err {
            FileError::OutOfBounds { .. } => LogError::ReadPastEnd {
                offset: self.pos,
                len: self.len(),
            },
            other => LogError::File(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(values: &[LogValue]) -> Vec<u8> {
        let size = values.iter().map(LogValue::encoded_size).sum();
        let mut page = Page::new(size);
        let mut offset = 0;
        for value in values {
            value.write_to(&mut page, offset).unwrap();
            offset += value.encoded_size();
        }
        page.contents().to_vec()
    }

    #[test]
    fn test_encoded_size() {
        assert_eq!(LogValue::Int(5).encoded_size(), 4);
        assert_eq!(LogValue::from("abc").encoded_size(), 7);
        assert_eq!(LogValue::from(String::new()).encoded_size(), 4);
    }

    #[test]
    fn test_sequential_reads() {
        let bytes = encode(&[1.into(), "tx".into(), (-3).into()]);
        let mut record = LogRecord::new(2, &bytes);

        assert_eq!(record.lsn(), 2);
        assert_eq!(record.len(), 4 + 6 + 4);
        assert_eq!(record.next_int().unwrap(), 1);
        assert_eq!(record.next_string().unwrap(), "tx");
        assert_eq!(record.remaining(), 4);
        assert_eq!(record.next_int().unwrap(), -3);
        assert_eq!(record.remaining(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let bytes = encode(&[7.into()]);
        let mut record = LogRecord::new(0, &bytes);

        record.next_int().unwrap();
        assert!(matches!(
            record.next_int(),
            Err(LogError::ReadPastEnd { offset: 4, len: 4 })
        ));
        assert!(matches!(
            record.next_string(),
            Err(LogError::ReadPastEnd { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(LogValue::Int(12).to_string(), "12");
        assert_eq!(LogValue::from("a b").to_string(), "\"a b\"");
    }
}
