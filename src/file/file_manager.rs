use ahash::AHashMap;
use std::collections::hash_map::Entry;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{BLOCK_SIZE, MAX_BLOCK_SIZE};
use super::block::BlockId;
use super::error::{FileError, FileResult};
use super::page::Page;

/// Block-level access to the files of one database directory
///
/// Files are opened lazily on first access and stay open for the lifetime of
/// the manager. All operations go through one lock on the open-file table, so
/// the manager can be shared between the log manager and the buffer pool.
pub struct FileManager {
    db_dir: PathBuf,
    block_size: usize,
    is_new: bool,
    /// Map from file names (relative to `db_dir`) to open files
    open_files: Mutex<AHashMap<String, File>>,
}

impl FileManager {
    /// Open (or create) the database directory with the default block size
    pub fn new<P: AsRef<Path>>(db_dir: P) -> FileResult<Self> {
        Self::with_block_size(db_dir, BLOCK_SIZE)
    }

    /// Open (or create) the database directory with a specific block size
    pub fn with_block_size<P: AsRef<Path>>(db_dir: P, block_size: usize) -> FileResult<Self> {
        if block_size == 0 || block_size > MAX_BLOCK_SIZE {
            return Err(FileError::InvalidBlockSize(block_size));
        }

        let db_dir = db_dir.as_ref().to_path_buf();
        let is_new = !db_dir.exists();

        if is_new {
            std::fs::create_dir_all(&db_dir)?;
        }

        Ok(Self {
            db_dir,
            block_size,
            is_new,
            open_files: Mutex::new(AHashMap::new()),
        })
    }

    /// Read the block into `page`. Bytes past the end of the file read as zeros.
    pub fn read(&self, block: &BlockId, page: &mut Page) -> FileResult<()> {
        self.check_page(page)?;

        let mut open_files = self.open_files.lock().unwrap_or_else(PoisonError::into_inner);
        let file = self.get_file(&mut open_files, block.file_name())?;

        file.seek(SeekFrom::Start(self.offset_of(block.number())))?;

        let buffer = page.contents_mut();
        let mut bytes_read = 0;
        while bytes_read < buffer.len() {
            let n = file.read(&mut buffer[bytes_read..])?;
            if n == 0 {
                break;
            }
            bytes_read += n;
        }

        // If we read less than a block, fill the rest with zeros
        buffer[bytes_read..].fill(0);

        Ok(())
    }

    /// Write `page` to the block, extending the file if necessary
    pub fn write(&self, block: &BlockId, page: &Page) -> FileResult<()> {
        self.check_page(page)?;

        let mut open_files = self.open_files.lock().unwrap_or_else(PoisonError::into_inner);
        let file = self.get_file(&mut open_files, block.file_name())?;

        file.seek(SeekFrom::Start(self.offset_of(block.number())))?;
        file.write_all(page.contents())?;

        Ok(())
    }

    /// Write `page` as a new block at the end of the file and return its id
    pub fn append(&self, file_name: &str, page: &Page) -> FileResult<BlockId> {
        self.check_page(page)?;

        let mut open_files = self.open_files.lock().unwrap_or_else(PoisonError::into_inner);
        let file = self.get_file(&mut open_files, file_name)?;

        let number = self.block_count(file)?;
        let block = BlockId::new(file_name, number);

        file.seek(SeekFrom::Start(self.offset_of(number)))?;
        file.write_all(page.contents())?;

        Ok(block)
    }

    /// Get the number of blocks in a file (0 if it does not exist yet)
    pub fn size(&self, file_name: &str) -> FileResult<usize> {
        let mut open_files = self.open_files.lock().unwrap_or_else(PoisonError::into_inner);
        let file = self.get_file(&mut open_files, file_name)?;
        self.block_count(file)
    }

    /// Sync every open file to disk
    pub fn sync_all(&self) -> FileResult<()> {
        let open_files = self.open_files.lock().unwrap_or_else(PoisonError::into_inner);
        for file in open_files.values() {
            file.sync_data()?;
        }
        Ok(())
    }

    /// Whether the database directory was created by this manager
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    fn get_file<'a>(
        &self,
        open_files: &'a mut AHashMap<String, File>,
        file_name: &str,
    ) -> FileResult<&'a mut File> {
        let file = match open_files.entry(file_name.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(self.db_dir.join(file_name))?;
                entry.insert(file)
            }
        };
        Ok(file)
    }

    fn block_count(&self, file: &File) -> FileResult<usize> {
        let file_size = file.metadata()?.len();
        Ok(file_size.div_ceil(self.block_size as u64) as usize)
    }

    fn offset_of(&self, number: usize) -> u64 {
        (number * self.block_size) as u64
    }

    fn check_page(&self, page: &Page) -> FileResult<()> {
        if page.size() != self.block_size {
            return Err(FileError::InvalidPageSize {
                expected: self.block_size,
                actual: page.size(),
            });
        }
        Ok(())
    }
}
