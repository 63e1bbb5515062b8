use std::{
    io,
    path::{Path, PathBuf},
};

use super::{Backend, base_name, mapped};
use crate::region::Region;

/// Resolves a name to a file under a well-known directory (`/dev/shm` by default).
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the logical `name` resolves to.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(base_name(name))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Backend for FileBackend {
    fn label(&self) -> &'static str {
        "file"
    }

    fn candidates(&self, name: &str) -> Vec<String> {
        vec![base_name(name)]
    }

    fn open(&self, candidate: &str) -> io::Result<Box<dyn Region>> {
        let path = self.path_for(candidate);
        let (file, writable) = mapped::open_file(&path)?;
        let origin = format!("file:{}", path.display());
        let region = mapped::MappedRegion::map(file, writable, origin, Some(path.as_path()))?;
        Ok(Box::new(region))
    }
}
