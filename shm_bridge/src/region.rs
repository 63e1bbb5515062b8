//! Byte-range access to a mapped region.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::Mutex;

/// A mapped view of a region owned by another process.
///
/// The writer mutates the region without any lock, so reads are
/// best-effort copies and may observe a record mid-update.
pub trait Region {
    /// Number of mapped bytes.
    fn len(&self) -> usize;

    /// Copies bytes starting at `offset` into `buf`.
    ///
    /// # Returns
    /// The number of bytes copied, less than `buf.len()` when the mapping
    /// ends first and zero when `offset` is past the end.
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes all of `data` at `offset`.
    ///
    /// # Errors
    /// Fails without writing anything if the range does not fit or the
    /// mapping is read-only.
    fn write_at(&mut self, offset: usize, data: &[u8]) -> io::Result<()>;

    /// Checks that the backing object still exists.
    fn probe(&self) -> io::Result<()>;

    /// Human readable origin of the mapping, for logs.
    fn describe(&self) -> String;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads up to `len` bytes at `offset` into a new buffer.
    fn read_range(&self, offset: usize, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; len];
        let n = self.read_at(offset, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}

/// Copies the clamped overlap of `[offset, offset + buf.len())` out of `src`.
pub(crate) fn copy_out(src: &[u8], offset: usize, buf: &mut [u8]) -> usize {
    let Some(available) = src.len().checked_sub(offset) else {
        return 0;
    };

    let n = available.min(buf.len());
    buf[..n].copy_from_slice(&src[offset..offset + n]);
    n
}

/// Checks that `[offset, offset + len)` fits inside `size` bytes.
pub(crate) fn check_write(size: usize, offset: usize, len: usize) -> io::Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("write of {len} bytes at {offset} exceeds region of {size} bytes"),
        )),
    }
}

/// An in-process region.
///
/// Clones share the same bytes, which lets a test or an embedded writer
/// hold one handle while the bridge reads through another.
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    bytes: Arc<Mutex<Vec<u8>>>,
    released: Arc<AtomicBool>,
    label: String,
}

impl MemoryRegion {
    /// Creates a zeroed region of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self::from_bytes(vec![0; size])
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(Mutex::new(bytes)),
            released: Arc::new(AtomicBool::new(false)),
            label: "memory".to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Writes `data` at `offset` on behalf of the owning writer, growing
    /// the buffer if needed.
    pub fn store(&self, offset: usize, data: &[u8]) {
        let mut bytes = self.bytes.lock();
        let end = offset + data.len();
        if bytes.len() < end {
            bytes.resize(end, 0);
        }
        bytes[offset..end].copy_from_slice(data);
    }

    /// Shrinks or grows the buffer, as a writer truncating its mapping would.
    pub fn resize(&self, size: usize) {
        self.bytes.lock().resize(size, 0);
    }

    /// Marks the region as released; every handle's `probe` fails afterwards.
    pub fn release(&self) {
        self.released.store(true, Ordering::Release);
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Region for MemoryRegion {
    fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> io::Result<usize> {
        Ok(copy_out(&self.bytes.lock(), offset, buf))
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) -> io::Result<()> {
        let mut bytes = self.bytes.lock();
        check_write(bytes.len(), offset, data.len())?;
        bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn probe(&self) -> io::Result<()> {
        if self.is_released() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} region was released", self.label),
            ));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
