use log::trace;
use std::sync::Arc;

use super::error::LogResult;
use super::record::LogRecord;
use super::{FIRST_POS, HEADER_SIZE, LAST_POS, TRAILER_SIZE};
use crate::file::{BlockId, FileError, FileManager, INT_SIZE, Page};

/// Order in which a [`LogIterator`] returns records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Newest record first
    Backward,
    /// Oldest record first
    Forward,
}

/// Last position a forward traversal may reach, captured when the iterator
/// is created so records appended afterwards are not visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ForwardBound {
    /// Number of the newest log block
    pub block: usize,
    /// Location of the last forward pointer in that block
    pub end: usize,
}

/// Cursor over the records of the log file
///
/// Holds its own copy of one log block at a time and only reads the log file,
/// so it never blocks appends. Created by [`LogManager::iterator`] (newest
/// first) or [`LogManager::forward_iterator`] (oldest first).
///
/// [`LogManager::iterator`]: super::LogManager::iterator
/// [`LogManager::forward_iterator`]: super::LogManager::forward_iterator
pub struct LogIterator {
    file_manager: Arc<FileManager>,
    block: BlockId,
    page: Page,
    /// Backward: location of the backward pointer of the record after the next
    /// one to return, 0 once the start of the block is reached.
    /// Forward: location of the forward pointer in front of the next record.
    current: usize,
    /// Set for forward traversal only
    bound: Option<ForwardBound>,
    /// Location of the last forward pointer of the current block
    block_end: usize,
}

impl LogIterator {
    /// Position a cursor after the last record of `page`
    pub(crate) fn backward(
        file_manager: Arc<FileManager>,
        block: BlockId,
        page: Page,
    ) -> LogResult<Self> {
        let current = page.get_offset(LAST_POS)?;
        Ok(Self {
            file_manager,
            block,
            page,
            current,
            bound: None,
            block_end: 0,
        })
    }

    /// Position a cursor in front of the first record of `page`
    pub(crate) fn forward(
        file_manager: Arc<FileManager>,
        block: BlockId,
        page: Page,
        bound: ForwardBound,
    ) -> LogResult<Self> {
        let mut iter = Self {
            file_manager,
            block,
            page,
            current: FIRST_POS,
            bound: Some(bound),
            block_end: 0,
        };
        iter.block_end = iter.end_of_block(bound)?;
        Ok(iter)
    }

    pub fn direction(&self) -> Direction {
        match self.bound {
            Some(_) => Direction::Forward,
            None => Direction::Backward,
        }
    }

    /// The block the cursor is positioned on
    pub fn current_block(&self) -> &BlockId {
        &self.block
    }

    /// Whether another record remains in this iterator's direction
    pub fn has_next(&self) -> bool {
        match self.bound {
            None => self.current > 0 || self.block.number() > 0,
            Some(bound) => self.current < self.block_end || self.block.number() < bound.block,
        }
    }

    /// Return the next record in this iterator's direction, crossing into the
    /// adjacent log block when the current one is exhausted
    pub fn next_record(&mut self) -> LogResult<Option<LogRecord>> {
        match self.bound {
            None => self.next_backward(),
            Some(bound) => self.next_forward(bound),
        }
    }

    fn next_backward(&mut self) -> LogResult<Option<LogRecord>> {
        while self.current == 0 {
            if self.block.number() == 0 {
                return Ok(None);
            }
            self.move_to(self.block.number() - 1)?;
            self.current = self.page.get_offset(LAST_POS)?;
        }

        let end = self.current;
        let previous = self.page.get_offset(end)?;
        if previous >= end {
            return Err(self.corrupt(end).into());
        }
        self.current = previous;

        let start = if previous == 0 {
            HEADER_SIZE
        } else {
            previous + TRAILER_SIZE
        };
        self.record(start, end).map(Some)
    }

    fn next_forward(&mut self, bound: ForwardBound) -> LogResult<Option<LogRecord>> {
        while self.current >= self.block_end {
            if self.block.number() >= bound.block {
                return Ok(None);
            }
            self.move_to(self.block.number() + 1)?;
            self.current = FIRST_POS;
            self.block_end = self.end_of_block(bound)?;
        }

        let start = self.current + INT_SIZE;
        let next = self.page.get_offset(self.current)?;
        if next < start + INT_SIZE {
            return Err(self.corrupt(self.current).into());
        }
        self.current = next;

        // The record's backward pointer sits just before its forward pointer
        self.record(start, next - INT_SIZE).map(Some)
    }

    fn end_of_block(&self, bound: ForwardBound) -> LogResult<usize> {
        if self.block.number() == bound.block {
            Ok(bound.end)
        } else {
            Ok(self.page.get_offset(LAST_POS)? + INT_SIZE)
        }
    }

    fn move_to(&mut self, number: usize) -> LogResult<()> {
        self.block = BlockId::new(self.block.file_name(), number);
        self.file_manager.read(&self.block, &mut self.page)?;
        trace!("Log iterator moved to {}", self.block);
        Ok(())
    }

    fn record(&self, start: usize, end: usize) -> LogResult<LogRecord> {
        let bytes = self
            .page
            .contents()
            .get(start..end)
            .ok_or_else(|| self.corrupt(start))?;
        Ok(LogRecord::new(self.block.number(), bytes))
    }

    fn corrupt(&self, offset: usize) -> FileError {
        FileError::OutOfBounds {
            offset,
            len: INT_SIZE,
            page_size: self.page.size(),
        }
    }
}

impl Iterator for LogIterator {
    type Item = LogResult<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{LogManager, LogValue};
    use tempfile::TempDir;

    fn setup_log(block_size: usize) -> (TempDir, LogManager) {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_manager =
            Arc::new(FileManager::with_block_size(temp_dir.path(), block_size).unwrap());
        let log = LogManager::new(file_manager, "test.log").unwrap();
        (temp_dir, log)
    }

    fn int_and_string(record: LogResult<LogRecord>) -> (i32, String) {
        let mut record = record.unwrap();
        (record.next_int().unwrap(), record.next_string().unwrap())
    }

    fn first_int(record: LogResult<LogRecord>) -> i32 {
        record.unwrap().next_int().unwrap()
    }

    /// Append `[i, "abcd"]` for every i; two such records fit in a 64 byte block
    fn append_numbered(log: &LogManager, range: std::ops::Range<i32>) {
        for i in range {
            log.append(&[i.into(), "abcd".into()]).unwrap();
        }
    }

    fn drain(iter: &mut LogIterator) {
        while iter.next().is_some() {}
    }

    #[test]
    fn test_empty_log() {
        let (_temp_dir, log) = setup_log(64);

        let mut backward = log.iterator().unwrap();
        assert_eq!(backward.direction(), Direction::Backward);
        assert!(!backward.has_next());
        assert!(backward.next().is_none());

        let mut forward = log.forward_iterator(&backward).unwrap();
        assert_eq!(forward.direction(), Direction::Forward);
        assert!(!forward.has_next());
        assert!(forward.next().is_none());
    }

    #[test]
    fn test_two_records_both_directions() {
        let (_temp_dir, log) = setup_log(4096);

        log.append(&[1.into(), "x".into()]).unwrap();
        log.append(&[2.into(), "y".into()]).unwrap();

        let mut backward = log.iterator().unwrap();
        assert!(backward.has_next());
        assert_eq!(int_and_string(backward.next().unwrap()), (2, "y".to_string()));
        assert!(backward.has_next());
        assert_eq!(int_and_string(backward.next().unwrap()), (1, "x".to_string()));
        assert!(!backward.has_next());
        assert!(backward.next().is_none());

        let mut forward = log.forward_iterator(&backward).unwrap();
        assert!(forward.has_next());
        assert_eq!(int_and_string(forward.next().unwrap()), (1, "x".to_string()));
        assert!(forward.has_next());
        assert_eq!(int_and_string(forward.next().unwrap()), (2, "y".to_string()));
        assert!(!forward.has_next());
        assert!(forward.next().is_none());
    }

    #[test]
    fn test_next_record_in_each_direction() {
        let (_temp_dir, log) = setup_log(64);
        append_numbered(&log, 0..3);

        let mut backward = log.iterator().unwrap();
        let mut seen = Vec::new();
        while backward.has_next() {
            let mut record = backward.next_record().unwrap().unwrap();
            seen.push(record.next_int().unwrap());
        }
        assert_eq!(seen, vec![2, 1, 0]);
        assert!(backward.next_record().unwrap().is_none());

        let mut forward = log.forward_iterator(&backward).unwrap();
        let mut seen = Vec::new();
        while forward.has_next() {
            let mut record = forward.next_record().unwrap().unwrap();
            seen.push(record.next_int().unwrap());
        }
        assert_eq!(seen, vec![0, 1, 2]);
        assert!(forward.next_record().unwrap().is_none());
    }

    #[test]
    fn test_crosses_block_boundaries() {
        let (_temp_dir, log) = setup_log(64);
        append_numbered(&log, 0..5);
        assert_eq!(log.current_lsn(), 2);

        let mut backward = log.iterator().unwrap();
        let mut seen = Vec::new();
        let mut lsns = Vec::new();
        while backward.has_next() {
            let mut record = backward.next_record().unwrap().unwrap();
            lsns.push(record.lsn());
            seen.push(record.next_int().unwrap());
        }
        assert_eq!(seen, vec![4, 3, 2, 1, 0]);
        assert_eq!(lsns, vec![2, 1, 1, 0, 0]);
        assert_eq!(backward.current_block().number(), 0);

        let forward: Vec<i32> = log.forward_iterator(&backward).unwrap().map(first_int).collect();
        assert_eq!(forward, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_full_last_block() {
        let (_temp_dir, log) = setup_log(64);
        append_numbered(&log, 0..4);

        let mut backward = log.iterator().unwrap();
        let seen: Vec<i32> = backward.by_ref().map(first_int).collect();
        assert_eq!(seen, vec![3, 2, 1, 0]);

        let forward: Vec<i32> = log.forward_iterator(&backward).unwrap().map(first_int).collect();
        assert_eq!(forward, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_forward_starts_at_backward_position() {
        let (_temp_dir, log) = setup_log(64);
        append_numbered(&log, 0..5);

        // One step back stays in the newest block
        let mut backward = log.iterator().unwrap();
        assert_eq!(first_int(backward.next().unwrap()), 4);
        let forward: Vec<i32> = log.forward_iterator(&backward).unwrap().map(first_int).collect();
        assert_eq!(forward, vec![4]);

        // Two steps back moves into block 1
        assert_eq!(first_int(backward.next().unwrap()), 3);
        let forward: Vec<i32> = log.forward_iterator(&backward).unwrap().map(first_int).collect();
        assert_eq!(forward, vec![2, 3, 4]);
    }

    #[test]
    fn test_forward_ignores_later_appends() {
        let (_temp_dir, log) = setup_log(64);
        append_numbered(&log, 0..3);

        let mut backward = log.iterator().unwrap();
        drain(&mut backward);
        let forward = log.forward_iterator(&backward).unwrap();

        append_numbered(&log, 3..8);
        log.flush(log.current_lsn()).unwrap();

        let seen: Vec<i32> = forward.map(first_int).collect();
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_backward_ignores_later_appends() {
        let (_temp_dir, log) = setup_log(4096);
        append_numbered(&log, 0..2);

        let backward = log.iterator().unwrap();
        append_numbered(&log, 2..4);

        let seen: Vec<i32> = backward.map(first_int).collect();
        assert_eq!(seen, vec![1, 0]);
    }

    #[test]
    fn test_many_records_round_trip() {
        let (_temp_dir, log) = setup_log(128);

        let expected: Vec<(i32, String)> = (0..200).map(|i| (i, format!("value-{}", i))).collect();
        for (i, s) in &expected {
            log.append(&[LogValue::Int(*i), LogValue::from(s.as_str())])
                .unwrap();
        }
        assert!(log.current_lsn() > 10);

        let mut backward = log.iterator().unwrap();
        let mut seen: Vec<(i32, String)> = backward.by_ref().map(int_and_string).collect();
        seen.reverse();
        assert_eq!(seen, expected);

        let forward: Vec<(i32, String)> = log
            .forward_iterator(&backward)
            .unwrap()
            .map(int_and_string)
            .collect();
        assert_eq!(forward, expected);
    }

    #[test]
    fn test_variable_length_records() {
        let (_temp_dir, log) = setup_log(64);

        log.append(&[]).unwrap();
        log.append(&["a somewhat long string".into()]).unwrap();
        log.append(&[7.into(), 8.into(), 9.into()]).unwrap();
        log.append(&["".into()]).unwrap();

        let mut backward = log.iterator().unwrap();
        let lens: Vec<usize> = backward.by_ref().map(|r| r.unwrap().len()).collect();
        assert_eq!(lens, vec![4, 12, 26, 0]);

        let mut forward = log.forward_iterator(&backward).unwrap();
        assert!(forward.next().unwrap().unwrap().is_empty());
        assert_eq!(
            forward.next().unwrap().unwrap().next_string().unwrap(),
            "a somewhat long string"
        );
        let mut ints = forward.next().unwrap().unwrap();
        assert_eq!(ints.next_int().unwrap(), 7);
        assert_eq!(ints.next_int().unwrap(), 8);
        assert_eq!(ints.next_int().unwrap(), 9);
        assert_eq!(forward.next().unwrap().unwrap().next_string().unwrap(), "");
        assert!(forward.next().is_none());
    }
}
