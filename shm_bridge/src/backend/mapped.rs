use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use memmap2::{Mmap, MmapMut, MmapOptions};

use crate::{
    layout::REGION_SIZE,
    region::{Region, check_write, copy_out},
};

enum Mapping {
    ReadWrite(MmapMut),
    ReadOnly(Mmap),
}

impl Mapping {
    fn bytes(&self) -> &[u8] {
        match self {
            Mapping::ReadWrite(m) => &m[..],
            Mapping::ReadOnly(m) => &m[..],
        }
    }
}

/// A memory mapping of a shared memory object or file.
pub struct MappedRegion {
    map: Mapping,
    file: File,
    path: Option<PathBuf>,
    origin: String,
}

impl MappedRegion {
    /// Maps at most `REGION_SIZE` bytes of `file`.
    ///
    /// # Arguments
    /// * `file` - The opened backing object.
    /// * `writable` - Whether `file` was opened read-write.
    /// * `origin` - Description used in logs.
    /// * `path` - Filesystem path, if the object has one.
    ///
    /// # Errors
    /// Returns `NotFound` for an empty object, which a writer that has not
    /// sized its region yet leaves behind.
    pub fn map(file: File, writable: bool, origin: String, path: Option<&Path>) -> io::Result<Self> {
        let size = file.metadata()?.len() as usize;
        if size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{origin} is empty"),
            ));
        }

        let mut opts = MmapOptions::new();
        opts.len(size.min(REGION_SIZE));

        // SAFETY: The mapping is shared with a writer process that mutates it
        //         concurrently. Every access copies bytes out or in and never
        //         hands out references that outlive the call, so a torn update
        //         yields wrong bytes rather than an invalid Rust value.
        let map = if writable {
            Mapping::ReadWrite(unsafe { opts.map_mut(&file)? })
        } else {
            Mapping::ReadOnly(unsafe { opts.map(&file)? })
        };

        Ok(Self {
            map,
            file,
            path: path.map(Path::to_path_buf),
            origin,
        })
    }

    pub fn is_writable(&self) -> bool {
        matches!(self.map, Mapping::ReadWrite(_))
    }
}

impl Region for MappedRegion {
    fn len(&self) -> usize {
        self.map.bytes().len()
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> io::Result<usize> {
        Ok(copy_out(self.map.bytes(), offset, buf))
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) -> io::Result<()> {
        let Mapping::ReadWrite(map) = &mut self.map else {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is mapped read-only", self.origin),
            ));
        };

        check_write(map.len(), offset, data.len())?;
        map[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn probe(&self) -> io::Result<()> {
        let gone = || {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} was released by its writer", self.origin),
            )
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;

            if self.file.metadata()?.nlink() == 0 {
                return Err(gone());
            }
        }

        if let Some(path) = &self.path {
            if !path.exists() {
                return Err(gone());
            }
        }

        let size = self.file.metadata()?.len();
        if size < self.len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} shrank to {size} bytes below its {} byte mapping", self.origin, self.len()),
            ));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.origin.clone()
    }
}

/// Opens `path` read-write, falling back to read-only when not permitted.
pub(crate) fn open_file(path: &Path) -> io::Result<(File, bool)> {
    match File::options().read(true).write(true).open(path) {
        Ok(file) => Ok((file, true)),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            Ok((File::open(path)?, false))
        }
        Err(e) => Err(e),
    }
}
