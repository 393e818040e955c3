//! Disk manager for page-level file I/O.

use bytes::{Buf, BufMut, BytesMut};
use pagekv_common::page::{PageId, PAGE_SIZE};
use pagekv_common::{PagekvError, Result};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads and writes fixed-size pages of a single page file.
///
/// Page `n` lives at byte offset `n * PAGE_SIZE`. Reads past the end of the
/// file are not errors: they report the page as uninitialized.
pub struct DiskManager {
    /// The page file.
    file: File,
    /// Path to the file.
    path: PathBuf,
    /// Number of whole pages currently in the file.
    num_pages: u32,
    /// Enable fsync in `sync`.
    fsync_enabled: bool,
}

impl DiskManager {
    /// Opens or creates the page file at `path`.
    pub fn open(path: impl Into<PathBuf>, fsync_enabled: bool) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let file_size = file.metadata()?.len();
        let num_pages = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            path,
            num_pages,
            fsync_enabled,
        })
    }

    /// Returns the page file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of whole pages in the file.
    #[inline]
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Reads a page into `buf`.
    ///
    /// Returns false and zeroes `buf` when the page lies past the end of the file.
    pub fn read_page(&mut self, page_id: PageId, buf: &mut [u8; PAGE_SIZE]) -> Result<bool> {
        if page_id.0 >= self.num_pages {
            buf.fill(0);
            return Ok(false);
        }

        self.file.seek(SeekFrom::Start(page_id.offset()))?;
        self.file.read_exact(buf)?;
        Ok(true)
    }

    /// Writes a page, extending the file if needed.
    pub fn write_page(&mut self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()> {
        self.file.seek(SeekFrom::Start(page_id.offset()))?;
        self.file.write_all(data)?;

        // Update page count if we extended the file
        if page_id.0 >= self.num_pages {
            self.num_pages = page_id.0 + 1;
        }

        Ok(())
    }

    /// Shrinks or grows the file to exactly `pages` pages.
    pub fn truncate(&mut self, pages: u32) -> Result<()> {
        self.file.set_len(pages as u64 * PAGE_SIZE as u64)?;
        self.num_pages = pages;
        debug!(pages, path = %self.path.display(), "disk.truncate");
        Ok(())
    }

    /// Flushes pending writes to disk when fsync is enabled.
    pub fn sync(&self) -> Result<()> {
        if self.fsync_enabled {
            self.file.sync_all()?;
        }
        Ok(())
    }
}

/// Page allocation state persisted between runs.
///
/// Layout, little endian: `file_size: u32`, `free_count: u32`, then
/// `free_count` page ids ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFileMeta {
    /// Next never-used page id.
    pub file_size: u32,
    /// Freed page ids eligible for reuse, ascending.
    pub free_ids: Vec<u32>,
}

impl PageFileMeta {
    /// Encodes the metadata.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(8 + 4 * self.free_ids.len());
        buf.put_u32_le(self.file_size);
        buf.put_u32_le(self.free_ids.len() as u32);
        for &id in &self.free_ids {
            buf.put_u32_le(id);
        }
        buf
    }

    /// Decodes metadata written by `encode`.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.remaining() < 8 {
            return Err(PagekvError::Internal(format!(
                "metadata truncated: {} bytes",
                data.len()
            )));
        }
        let file_size = data.get_u32_le();
        let count = data.get_u32_le() as usize;
        if data.remaining() < count * 4 {
            return Err(PagekvError::Internal(format!(
                "metadata lists {count} free ids but holds {} bytes",
                data.remaining()
            )));
        }

        let mut free_ids = Vec::with_capacity(count);
        for _ in 0..count {
            free_ids.push(data.get_u32_le());
        }
        Ok(Self { file_size, free_ids })
    }

    /// Loads metadata from `path`, or `None` if the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read(path) {
            Ok(data) => Self::decode(&data).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes metadata to a temporary sibling of `path`, then renames it into place.
    pub fn store(&self, path: &Path, fsync_enabled: bool) -> Result<()> {
        let tmp = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&self.encode())?;
            if fsync_enabled {
                file.sync_all()?;
            }
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_disk_manager() -> (DiskManager, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let dm = DiskManager::open(dir.path().join("data.bin"), false).unwrap();
        (dm, dir)
    }

    fn page_with(byte: u8) -> Box<[u8; PAGE_SIZE]> {
        Box::new([byte; PAGE_SIZE])
    }

    #[test]
    fn test_disk_manager_open_creates_file() {
        let (dm, dir) = create_test_disk_manager();
        assert!(dir.path().join("data.bin").exists());
        assert_eq!(dm.path(), dir.path().join("data.bin"));
        assert_eq!(dm.num_pages(), 0);
    }

    #[test]
    fn test_disk_manager_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store").join("data.bin");
        let dm = DiskManager::open(&path, false).unwrap();
        assert!(path.exists());
        assert_eq!(dm.num_pages(), 0);
    }

    #[test]
    fn test_disk_manager_write_read() {
        let (mut dm, _dir) = create_test_disk_manager();

        let mut data = Box::new([0u8; PAGE_SIZE]);
        data[0] = 0xAB;
        data[100] = 0xCD;
        data[PAGE_SIZE - 1] = 0xEF;
        dm.write_page(PageId(0), &data).unwrap();

        let mut read = Box::new([0u8; PAGE_SIZE]);
        assert!(dm.read_page(PageId(0), &mut read).unwrap());
        assert_eq!(read[0], 0xAB);
        assert_eq!(read[100], 0xCD);
        assert_eq!(read[PAGE_SIZE - 1], 0xEF);
    }

    #[test]
    fn test_disk_manager_read_past_end() {
        let (mut dm, _dir) = create_test_disk_manager();
        dm.write_page(PageId(0), &page_with(1)).unwrap();

        let mut buf = page_with(0xFF);
        assert!(!dm.read_page(PageId(99), &mut buf).unwrap());
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_disk_manager_sparse_write_extends() {
        let (mut dm, _dir) = create_test_disk_manager();
        dm.write_page(PageId(4), &page_with(4)).unwrap();
        assert_eq!(dm.num_pages(), 5);

        // The hole reads back as zeros.
        let mut buf = page_with(0xFF);
        assert!(dm.read_page(PageId(2), &mut buf).unwrap());
        assert!(buf.iter().all(|&b| b == 0));

        assert!(dm.read_page(PageId(4), &mut buf).unwrap());
        assert_eq!(buf[17], 4);
    }

    #[test]
    fn test_disk_manager_overwrite_page() {
        let (mut dm, _dir) = create_test_disk_manager();

        dm.write_page(PageId(0), &page_with(0xAA)).unwrap();
        dm.write_page(PageId(0), &page_with(0xBB)).unwrap();

        let mut buf = page_with(0);
        dm.read_page(PageId(0), &mut buf).unwrap();
        assert_eq!(buf[0], 0xBB);
        assert_eq!(dm.num_pages(), 1);
    }

    #[test]
    fn test_disk_manager_truncate() {
        let (mut dm, dir) = create_test_disk_manager();
        for i in 0..4u32 {
            dm.write_page(PageId(i), &page_with(i as u8)).unwrap();
        }
        dm.truncate(2).unwrap();
        dm.sync().unwrap();

        assert_eq!(dm.num_pages(), 2);
        let len = std::fs::metadata(dir.path().join("data.bin")).unwrap().len();
        assert_eq!(len, 2 * PAGE_SIZE as u64);

        let mut buf = page_with(0xFF);
        assert!(!dm.read_page(PageId(3), &mut buf).unwrap());
    }

    #[test]
    fn test_disk_manager_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");

        {
            let mut dm = DiskManager::open(&path, true).unwrap();
            dm.write_page(PageId(0), &page_with(0x11)).unwrap();
            dm.write_page(PageId(1), &page_with(0xFF)).unwrap();
            dm.sync().unwrap();
        }

        let mut dm = DiskManager::open(&path, true).unwrap();
        assert_eq!(dm.num_pages(), 2);
        let mut buf = page_with(0);
        dm.read_page(PageId(1), &mut buf).unwrap();
        assert_eq!(buf[0], 0xFF);
    }

    #[test]
    fn test_page_file_meta_encode_layout() {
        let meta = PageFileMeta {
            file_size: 9,
            free_ids: vec![2, 5],
        };
        let encoded = meta.encode();
        assert_eq!(
            &encoded[..],
            &[9, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0, 5, 0, 0, 0]
        );
        assert_eq!(PageFileMeta::decode(&encoded).unwrap(), meta);
    }

    #[test]
    fn test_page_file_meta_decode_truncated() {
        assert!(PageFileMeta::decode(&[1, 0, 0]).is_err());
        // Claims three ids, holds one.
        assert!(PageFileMeta::decode(&[0, 0, 0, 0, 3, 0, 0, 0, 1, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_page_file_meta_store_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("info.bin");

        assert_eq!(PageFileMeta::load(&path).unwrap(), None);

        let meta = PageFileMeta {
            file_size: 42,
            free_ids: vec![1, 7, 30],
        };
        meta.store(&path, false).unwrap();
        assert_eq!(PageFileMeta::load(&path).unwrap(), Some(meta));
        assert!(!path.with_extension("tmp").exists());
    }
}
