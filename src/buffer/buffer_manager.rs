use ahash::AHashMap;
use log::debug;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::TxId;
use super::buffer::Buffer;
use super::error::{BufferError, BufferResult};
use super::formatter::PageFormatter;
use crate::file::{BlockId, FileManager};
use crate::log::{LogManager, Lsn};

/// Handle to a slot of the buffer pool, valid while the slot is pinned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(usize);

impl BufferId {
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer {}", self.0)
    }
}

struct PoolState {
    buffers: Vec<Buffer>,
    /// Map from cached blocks to the slot holding them
    block_table: AHashMap<BlockId, usize>,
    /// Number of buffers with a pin count of 0
    num_available: usize,
    /// Logical clock used to order pins for replacement
    clock: u64,
}

impl PoolState {
    /// FIFO replacement: the unpinned buffer pinned longest ago, lowest slot
    /// first on ties. Never-used buffers have stamp 0 and go first.
    fn choose_unpinned_buffer(&self) -> Option<usize> {
        self.buffers
            .iter()
            .enumerate()
            .filter(|(_, buffer)| !buffer.is_pinned())
            .min_by_key(|(_, buffer)| buffer.stamp())
            .map(|(index, _)| index)
    }

    fn pin(&mut self, index: usize) {
        if !self.buffers[index].is_pinned() {
            self.num_available -= 1;
        }
        self.clock += 1;
        let stamp = self.clock;
        self.buffers[index].pin(stamp);
    }

    fn buffer(&self, id: BufferId) -> BufferResult<&Buffer> {
        self.buffers
            .get(id.0)
            .ok_or(BufferError::InvalidBuffer(id.0))
    }

    /// The buffer behind `id`, which the caller must have pinned
    fn pinned(&self, id: BufferId) -> BufferResult<&Buffer> {
        let buffer = self.buffer(id)?;
        if !buffer.is_pinned() {
            return Err(BufferError::NotPinned(id.0));
        }
        Ok(buffer)
    }

    fn pinned_mut(&mut self, id: BufferId) -> BufferResult<&mut Buffer> {
        let buffer = self
            .buffers
            .get_mut(id.0)
            .ok_or(BufferError::InvalidBuffer(id.0))?;
        if !buffer.is_pinned() {
            return Err(BufferError::NotPinned(id.0));
        }
        Ok(buffer)
    }
}

/// Fixed-size pool of page buffers with pin counts and FIFO replacement
///
/// Every operation runs under one lock over the whole pool, so choosing a
/// victim, updating the block table and counting pins happen as one step.
/// When every buffer is pinned, `pin` and `pin_new` fail immediately with
/// [`BufferError::Exhausted`]; waiting is up to the caller.
pub struct BufferPoolManager {
    file_manager: Arc<FileManager>,
    log_manager: Arc<LogManager>,
    state: Mutex<PoolState>,
}

impl BufferPoolManager {
    /// Create a buffer pool with `pool_size` buffers
    pub fn new(
        file_manager: Arc<FileManager>,
        log_manager: Arc<LogManager>,
        pool_size: usize,
    ) -> Self {
        let buffers = (0..pool_size)
            .map(|_| Buffer::new(file_manager.block_size()))
            .collect();

        Self {
            file_manager,
            log_manager,
            state: Mutex::new(PoolState {
                buffers,
                block_table: AHashMap::with_capacity(pool_size),
                num_available: pool_size,
                clock: 0,
            }),
        }
    }

    /// Pin a buffer to `block`, reading it from disk unless it is cached
    pub fn pin(&self, block: &BlockId) -> BufferResult<BufferId> {
        let mut state = self.lock_state();

        let cached = state.block_table.get(block).copied();
        let index = match cached {
            Some(index) => index,
            None => {
                let index = state
                    .choose_unpinned_buffer()
                    .ok_or(BufferError::Exhausted)?;
                self.evict(&mut state, index)?;

                state.buffers[index].assign_to_block(block.clone(), &self.file_manager)?;
                state.block_table.insert(block.clone(), index);
                debug!("Loaded {} into buffer {}", block, index);
                index
            }
        };

        state.pin(index);
        Ok(BufferId(index))
    }

    /// Append a new block to `file_name`, format it and pin a buffer to it
    ///
    /// No block is allocated when the pool is exhausted.
    pub fn pin_new<F: PageFormatter + ?Sized>(
        &self,
        file_name: &str,
        formatter: &F,
    ) -> BufferResult<BufferId> {
        let mut state = self.lock_state();

        let index = state
            .choose_unpinned_buffer()
            .ok_or(BufferError::Exhausted)?;
        self.evict(&mut state, index)?;

        let block =
            state.buffers[index].assign_to_new(file_name, formatter, &self.file_manager)?;
        debug!("Allocated {} in buffer {}", block, index);
        state.block_table.insert(block, index);

        state.pin(index);
        Ok(BufferId(index))
    }

    /// Release one pin on the buffer. It stays cached until reassigned.
    pub fn unpin(&self, id: BufferId) -> BufferResult<()> {
        let mut state = self.lock_state();

        let buffer = state.pinned_mut(id)?;
        buffer.unpin();
        if !buffer.is_pinned() {
            state.num_available += 1;
        }
        Ok(())
    }

    /// Write every buffer modified by `tx` to disk
    pub fn flush_all(&self, tx: TxId) -> BufferResult<()> {
        let mut state = self.lock_state();

        for buffer in state.buffers.iter_mut() {
            if buffer.is_modified_by(tx) {
                buffer.flush(&self.file_manager, &self.log_manager)?;
            }
        }
        Ok(())
    }

    /// Number of unpinned buffers
    pub fn available(&self) -> usize {
        self.lock_state().num_available
    }

    pub fn pool_size(&self) -> usize {
        self.lock_state().buffers.len()
    }

    /// Whether `block` is currently cached in some buffer
    pub fn contains_block(&self, block: &BlockId) -> bool {
        self.lock_state().block_table.contains_key(block)
    }

    /// The buffer caching `block`, if any
    pub fn buffer_for(&self, block: &BlockId) -> Option<BufferId> {
        self.lock_state().block_table.get(block).map(|&index| BufferId(index))
    }

    /// The block a buffer currently holds
    pub fn block(&self, id: BufferId) -> BufferResult<Option<BlockId>> {
        let state = self.lock_state();
        Ok(state.buffer(id)?.block().cloned())
    }

    pub fn pin_count(&self, id: BufferId) -> BufferResult<u32> {
        let state = self.lock_state();
        Ok(state.buffer(id)?.pin_count())
    }

    /// Transaction that dirtied the buffer since it was last written
    pub fn modified_by(&self, id: BufferId) -> BufferResult<Option<TxId>> {
        let state = self.lock_state();
        Ok(state.buffer(id)?.modified_by())
    }

    pub fn get_int(&self, id: BufferId, offset: usize) -> BufferResult<i32> {
        let state = self.lock_state();
        Ok(state.pinned(id)?.page().get_int(offset)?)
    }

    pub fn get_string(&self, id: BufferId, offset: usize) -> BufferResult<String> {
        let state = self.lock_state();
        Ok(state.pinned(id)?.page().get_string(offset)?)
    }

    /// Write an integer into a pinned buffer on behalf of `tx`
    ///
    /// `lsn` is the log record describing the change; the log is flushed up
    /// to it before the page is written back.
    pub fn set_int(
        &self,
        id: BufferId,
        offset: usize,
        value: i32,
        tx: TxId,
        lsn: Option<Lsn>,
    ) -> BufferResult<()> {
        let mut state = self.lock_state();
        let buffer = state.pinned_mut(id)?;
        buffer.page_mut().set_int(offset, value)?;
        buffer.set_modified(tx, lsn);
        Ok(())
    }

    /// Write a string into a pinned buffer on behalf of `tx`
    pub fn set_string(
        &self,
        id: BufferId,
        offset: usize,
        value: &str,
        tx: TxId,
        lsn: Option<Lsn>,
    ) -> BufferResult<()> {
        let mut state = self.lock_state();
        let buffer = state.pinned_mut(id)?;
        buffer.page_mut().set_string(offset, value)?;
        buffer.set_modified(tx, lsn);
        Ok(())
    }

    /// Detach the victim at `index` from its old block, writing it back first
    /// if it is dirty
    fn evict(&self, state: &mut PoolState, index: usize) -> BufferResult<()> {
        let buffer = &mut state.buffers[index];
        buffer.flush(&self.file_manager, &self.log_manager)?;

        if let Some(old) = buffer.take_block() {
            debug!("Evicting {} from buffer {}", old, index);
            state.block_table.remove(&old);
        }
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
