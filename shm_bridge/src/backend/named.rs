use std::io;

use super::{Backend, candidate_names};
use crate::region::Region;

/// OS named shared memory: POSIX `shm_open` objects on unix, file mapping
/// objects on Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedBackend;

/// The `shm_open` name for `candidate`: a single leading slash, no others stripped.
pub fn posix_name(candidate: &str) -> String {
    format!("/{}", candidate.trim_start_matches('/'))
}

impl Backend for NamedBackend {
    fn label(&self) -> &'static str {
        "named"
    }

    fn candidates(&self, name: &str) -> Vec<String> {
        candidate_names(name)
    }

    #[cfg(unix)]
    fn open(&self, candidate: &str) -> io::Result<Box<dyn Region>> {
        use std::fs::File;

        use rustix::{fs::Mode, io::Errno, shm};

        use super::MappedRegion;

        let name = posix_name(candidate);
        let (fd, writable) = match shm::open(name.as_str(), shm::OFlags::RDWR, Mode::empty()) {
            Ok(fd) => (fd, true),
            Err(Errno::ACCESS) => (
                shm::open(name.as_str(), shm::OFlags::RDONLY, Mode::empty())?,
                false,
            ),
            Err(e) => return Err(e.into()),
        };

        let region = MappedRegion::map(File::from(fd), writable, format!("shm:{name}"), None)?;
        Ok(Box::new(region))
    }

    #[cfg(windows)]
    fn open(&self, candidate: &str) -> io::Result<Box<dyn Region>> {
        Ok(Box::new(super::view::ViewRegion::open(candidate)?))
    }

    #[cfg(not(any(unix, windows)))]
    fn open(&self, candidate: &str) -> io::Result<Box<dyn Region>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("named mapping '{candidate}' is not supported on this platform"),
        ))
    }
}
