use super::TxId;
use super::error::BufferResult;
use super::formatter::PageFormatter;
use crate::file::{BlockId, FileManager, Page};
use crate::log::{LogManager, Lsn};

/// One slot of the buffer pool
///
/// Wraps a page together with the block it mirrors and the bookkeeping the
/// pool needs: how many clients have it pinned, which transaction dirtied it
/// and when it was last pinned.
pub(crate) struct Buffer {
    page: Page,
    block: Option<BlockId>,
    pins: u32,
    /// Transaction that modified the page since it was last written
    modified_by: Option<TxId>,
    /// LSN of the log record describing the latest modification
    lsn: Option<Lsn>,
    /// Logical time of the last pin, 0 if never pinned
    stamp: u64,
}

impl Buffer {
    pub fn new(block_size: usize) -> Self {
        Self {
            page: Page::new(block_size),
            block: None,
            pins: 0,
            modified_by: None,
            lsn: None,
            stamp: 0,
        }
    }

    pub fn block(&self) -> Option<&BlockId> {
        self.block.as_ref()
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn pin_count(&self) -> u32 {
        self.pins
    }

    pub fn is_pinned(&self) -> bool {
        self.pins > 0
    }

    pub fn pin(&mut self, stamp: u64) {
        self.pins += 1;
        self.stamp = stamp;
    }

    pub fn unpin(&mut self) {
        self.pins -= 1;
    }

    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn is_modified_by(&self, tx: TxId) -> bool {
        self.modified_by == Some(tx)
    }

    pub fn modified_by(&self) -> Option<TxId> {
        self.modified_by
    }

    /// Record that `tx` changed the page. A `None` LSN means the change was
    /// not logged, so the previous LSN still applies.
    pub fn set_modified(&mut self, tx: TxId, lsn: Option<Lsn>) {
        self.modified_by = Some(tx);
        if lsn.is_some() {
            self.lsn = lsn;
        }
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    /// Write the page to disk if it is dirty, forcing the log first so the
    /// log record for the change is durable before the change itself
    pub fn flush(&mut self, file_manager: &FileManager, log: &LogManager) -> BufferResult<()> {
        if self.modified_by.is_none() {
            return Ok(());
        }
        if let Some(block) = &self.block {
            if let Some(lsn) = self.lsn {
                log.flush(lsn)?;
            }
            file_manager.write(block, &self.page)?;
        }
        self.modified_by = None;
        Ok(())
    }

    /// Forget the current block. The caller must have flushed the buffer.
    pub fn take_block(&mut self) -> Option<BlockId> {
        self.block.take()
    }

    /// Load `block` from disk into this (unpinned, clean) buffer
    pub fn assign_to_block(&mut self, block: BlockId, file_manager: &FileManager) -> BufferResult<()> {
        file_manager.read(&block, &mut self.page)?;
        self.block = Some(block);
        self.modified_by = None;
        self.lsn = None;
        Ok(())
    }

    /// Format a fresh page, append it to `file_name` and hold the new block
    pub fn assign_to_new<F: PageFormatter + ?Sized>(
        &mut self,
        file_name: &str,
        formatter: &F,
        file_manager: &FileManager,
    ) -> BufferResult<BlockId> {
        self.page.clear();
        formatter.format(&mut self.page)?;
        let block = file_manager.append(file_name, &self.page)?;
        self.block = Some(block.clone());
        self.modified_by = None;
        self.lsn = None;
        Ok(block)
    }
}
