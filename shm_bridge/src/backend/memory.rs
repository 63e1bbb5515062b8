use std::{collections::HashMap, io, sync::Arc};

use parking_lot::Mutex;

use super::{Backend, candidate_names};
use crate::region::{MemoryRegion, Region};

/// In-process registry of named `MemoryRegion`s.
///
/// Resolves names with the same namespace fallback as the named backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    regions: Arc<Mutex<HashMap<String, MemoryRegion>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `region` discoverable under `name`.
    pub fn publish(&self, name: &str, region: MemoryRegion) {
        self.regions.lock().insert(name.to_string(), region);
    }

    /// Removes and releases the region under `name`, as an exiting writer would.
    pub fn withdraw(&self, name: &str) -> Option<MemoryRegion> {
        let region = self.regions.lock().remove(name)?;
        region.release();
        Some(region)
    }
}

impl Backend for MemoryBackend {
    fn label(&self) -> &'static str {
        "memory"
    }

    fn candidates(&self, name: &str) -> Vec<String> {
        candidate_names(name)
    }

    fn open(&self, candidate: &str) -> io::Result<Box<dyn Region>> {
        self.regions
            .lock()
            .get(candidate)
            .cloned()
            .map(|region| Box::new(region) as Box<dyn Region>)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("nothing published as '{candidate}'"),
                )
            })
    }
}
