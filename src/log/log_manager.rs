use log::{debug, info, trace, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::error::{LogError, LogResult};
use super::log_iterator::{ForwardBound, LogIterator};
use super::record::LogValue;
use super::{FIRST_POS, HEADER_SIZE, LAST_POS, Lsn, TRAILER_SIZE};
use crate::file::{BlockId, FileManager, INT_SIZE, Page};

/// Mutable write state of the log, guarded by one lock
struct LogState {
    /// In-memory copy of the block currently being filled
    page: Page,
    current_block: BlockId,
    /// Offset where the next record's first value will be written
    current_pos: usize,
    /// Location of the forward pointer of the last record in the block, or
    /// `FIRST_POS` when the block is still empty
    last_forward: usize,
}

/// Append-only writer of the log file
///
/// Layout of every log block:
///
/// ```text
/// +----------+-----------+----------+-----+-----+----------+-----+-----+
/// | LAST_POS | FIRST_POS | values 1 | bwd | fwd | values 2 | bwd | fwd | ...
/// +----------+-----------+----------+-----+-----+----------+-----+-----+
/// ```
///
/// `LAST_POS` holds the location of the last record's backward pointer (0
/// when the block is empty). A backward pointer holds the location of the
/// previous record's backward pointer, or 0 for the first record. A forward
/// pointer holds the location of the next record's forward pointer, or
/// `FIRST_POS` for the last record; `FIRST_POS` itself acts as the forward
/// pointer in front of the first record. The values of a record start right
/// after the pointer that leads to it.
pub struct LogManager {
    file_manager: Arc<FileManager>,
    log_file: String,
    state: Mutex<LogState>,
}

impl LogManager {
    /// Open the log file, creating its first block if it is empty
    ///
    /// An existing log resumes after the last record of its last block.
    pub fn new(file_manager: Arc<FileManager>, log_file: &str) -> LogResult<Self> {
        let block_size = file_manager.block_size();
        let min_size = HEADER_SIZE + TRAILER_SIZE;
        if block_size < min_size {
            return Err(LogError::RecordTooLarge {
                size: min_size,
                capacity: block_size,
            });
        }

        let mut page = Page::new(block_size);
        let log_size = file_manager.size(log_file)?;

        let state = if log_size == 0 {
            let current_block = append_new_block(&file_manager, log_file, &mut page)?;
            info!("Created log file {}", log_file);
            LogState {
                page,
                current_block,
                current_pos: HEADER_SIZE,
                last_forward: FIRST_POS,
            }
        } else {
            let current_block = BlockId::new(log_file, log_size - 1);
            file_manager.read(&current_block, &mut page)?;

            let last_backward = page.get_offset(LAST_POS)?;
            let (current_pos, last_forward) = if last_backward == 0 {
                (HEADER_SIZE, FIRST_POS)
            } else {
                (last_backward + TRAILER_SIZE, last_backward + INT_SIZE)
            };
            info!(
                "Opened log file {} with {} blocks, resuming at offset {}",
                log_file, log_size, current_pos
            );

            LogState {
                page,
                current_block,
                current_pos,
                last_forward,
            }
        };

        Ok(Self {
            file_manager,
            log_file: log_file.to_string(),
            state: Mutex::new(state),
        })
    }

    /// Append a record and return its LSN
    ///
    /// Starts a new log block when the record does not fit in the current one.
    pub fn append(&self, values: &[LogValue]) -> LogResult<Lsn> {
        let record_size: usize =
            values.iter().map(LogValue::encoded_size).sum::<usize>() + TRAILER_SIZE;
        let capacity = self.file_manager.block_size() - HEADER_SIZE;
        if record_size > capacity {
            return Err(LogError::RecordTooLarge {
                size: record_size,
                capacity,
            });
        }

        let mut state = self.lock_state();

        if state.current_pos + record_size > state.page.size() {
            // The record doesn't fit, so move to the next block
            self.file_manager.write(&state.current_block, &state.page)?;
            state.current_block =
                append_new_block(&self.file_manager, &self.log_file, &mut state.page)?;
            state.current_pos = HEADER_SIZE;
            state.last_forward = FIRST_POS;
            debug!("Log rolled over to {}", state.current_block);
        }

        let start = state.current_pos;
        for value in values {
            let pos = state.current_pos;
            value.write_to(&mut state.page, pos)?;
            state.current_pos += value.encoded_size();
        }
        finalize_record(&mut state)?;

        trace!(
            "Appended {} values at offset {} of {}",
            values.len(),
            start,
            state.current_block
        );

        Ok(state.current_block.number())
    }

    /// Make sure the record with the given LSN is on disk
    ///
    /// Records in earlier blocks were written when the log rolled over, so
    /// only the current block ever needs writing.
    pub fn flush(&self, lsn: Lsn) -> LogResult<()> {
        let state = self.lock_state();
        if lsn >= state.current_block.number() {
            self.file_manager.write(&state.current_block, &state.page)?;
        }
        Ok(())
    }

    /// Iterate over the records newest-first
    pub fn iterator(&self) -> LogResult<LogIterator> {
        let state = self.lock_state();
        self.file_manager.write(&state.current_block, &state.page)?;

        LogIterator::backward(
            Arc::clone(&self.file_manager),
            state.current_block.clone(),
            state.page.clone(),
        )
    }

    /// Iterate over the records oldest-first
    ///
    /// Traversal starts at the first record of the block `backward` is
    /// currently positioned on (block 0 once it has been run to the end) and
    /// stops after the last record written before this call.
    pub fn forward_iterator(&self, backward: &LogIterator) -> LogResult<LogIterator> {
        let state = self.lock_state();
        self.file_manager.write(&state.current_block, &state.page)?;

        let start_block = backward.current_block().clone();
        let mut page = Page::new(state.page.size());
        self.file_manager.read(&start_block, &mut page)?;

        let bound = ForwardBound {
            block: state.current_block.number(),
            end: state.last_forward,
        };

        LogIterator::forward(Arc::clone(&self.file_manager), start_block, page, bound)
    }

    /// LSN of the most recently appended record
    pub fn current_lsn(&self) -> Lsn {
        self.lock_state().current_block.number()
    }

    pub fn log_file(&self) -> &str {
        &self.log_file
    }

    fn lock_state(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LogManager {
    fn drop(&mut self) {
        let state = self.lock_state();
        if let Err(e) = self.file_manager.write(&state.current_block, &state.page) {
            warn!("Failed to flush log tail of {}: {}", self.log_file, e);
        }
    }
}

/// Reset `page` to an empty log block and append it to the log file
fn append_new_block(
    file_manager: &FileManager,
    log_file: &str,
    page: &mut Page,
) -> LogResult<BlockId> {
    page.clear();
    page.set_offset(LAST_POS, 0)?;
    page.set_offset(FIRST_POS, FIRST_POS)?;
    Ok(file_manager.append(log_file, page)?)
}

/// Write the two trailing pointers of the record that ends at `current_pos`
/// and link it into both chains
fn finalize_record(state: &mut LogState) -> LogResult<()> {
    let backward = state.current_pos;
    let forward = backward + INT_SIZE;

    let previous_backward = state.page.get_offset(LAST_POS)?;
    state.page.set_offset(state.last_forward, forward)?;
    state.page.set_offset(backward, previous_backward)?;
    state.page.set_offset(forward, FIRST_POS)?;
    state.page.set_offset(LAST_POS, backward)?;

    state.last_forward = forward;
    state.current_pos += TRAILER_SIZE;
    Ok(())
}
