//! Platform backends that resolve a logical region name to a mapping.

mod file;
mod mapped;
mod memory;
mod named;
#[cfg(windows)]
mod view;

use std::{env, io, path::Path};

use log::debug;

use crate::region::Region;

pub use file::FileBackend;
pub use mapped::MappedRegion;
pub use memory::MemoryBackend;
pub use named::NamedBackend;

/// Default directory scanned by the file backend.
pub const DEFAULT_SHM_DIR: &str = "/dev/shm";

/// Session-local namespace prefix used for named mappings.
pub const LOCAL_NAMESPACE: &str = "Local\\";
const GLOBAL_NAMESPACE: &str = "Global\\";

/// A way of locating and mapping a region by name.
pub trait Backend {
    /// Short label used in logs.
    fn label(&self) -> &'static str;

    /// Concrete names to try for the logical `name`, in order.
    fn candidates(&self, name: &str) -> Vec<String>;

    /// Maps the region behind `candidate`.
    ///
    /// # Errors
    /// Returns `io::ErrorKind::NotFound` when nothing is published under
    /// that name.
    fn open(&self, candidate: &str) -> io::Result<Box<dyn Region>>;
}

/// Which backends to try when discovering a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Pick by platform: named then file-backed on unix, named on Windows,
    /// file-backed elsewhere.
    #[default]
    Auto,
    Named,
    File,
}

/// Builds the backend list for `kind` on the running platform.
///
/// # Arguments
/// * `kind` - The requested backend selection.
/// * `shm_dir` - Directory the file backend resolves names in.
pub fn platform_backends(kind: BackendKind, shm_dir: &Path) -> Vec<Box<dyn Backend>> {
    let backends: Vec<Box<dyn Backend>> = match (kind, env::consts::FAMILY) {
        (BackendKind::Auto, "unix") => {
            vec![Box::new(NamedBackend), Box::new(FileBackend::new(shm_dir))]
        }
        (BackendKind::Auto, "windows") => vec![Box::new(NamedBackend)],
        (BackendKind::Auto, _) => vec![Box::new(FileBackend::new(shm_dir))],
        (BackendKind::Named, _) => vec![Box::new(NamedBackend)],
        (BackendKind::File, _) => vec![Box::new(FileBackend::new(shm_dir))],
    };

    debug!(
        "backends for {kind:?} on {}: {:?}",
        env::consts::OS,
        backends.iter().map(|b| b.label()).collect::<Vec<_>>()
    );
    backends
}

/// Names tried for a named mapping: the name as given, then its alternate
/// namespace form.
///
/// A name carrying a `Local\` or `Global\` prefix falls back to the bare
/// name; a bare name falls back to `Local\<name>`.
pub fn candidate_names(name: &str) -> Vec<String> {
    let alternate = match strip_namespace(name) {
        Some(bare) => bare.to_string(),
        None => format!("{LOCAL_NAMESPACE}{name}"),
    };

    vec![name.to_string(), alternate]
}

fn strip_namespace(name: &str) -> Option<&str> {
    name.strip_prefix(LOCAL_NAMESPACE)
        .or_else(|| name.strip_prefix(GLOBAL_NAMESPACE))
}

/// Last path component of `name` once `\` separators are normalised.
pub fn base_name(name: &str) -> String {
    name.replace('\\', "/")
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
