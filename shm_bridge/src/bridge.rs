//! Discovery, validation and reconnection on top of the backends.

use std::path::Path;

use log::{debug, info, warn};

use crate::{
    backend::{self, Backend, BackendKind},
    error::{BridgeError, Result},
    layout::{
        COMMAND_OFFSET, COMMAND_SIZE, ControlCommand, HEADER_SIZE, MonitorHeader,
        WORKER_STATUS_SIZE, WorkerStatus, worker_offset,
    },
    region::Region,
};

/// One read of the region.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// No region, or a header whose worker count is outside `(0, 32]`.
    NotRunning,
    Live(LiveSnapshot),
}

/// Header plus every worker record that decoded cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSnapshot {
    pub header: MonitorHeader,
    pub workers: Vec<WorkerStatus>,
    /// Indices whose record came back short (torn) this read.
    pub skipped: Vec<usize>,
}

/// Decodes `(index, bytes)` records, skipping any with the wrong length.
///
/// # Returns
/// The decoded workers in input order and the indices that were skipped.
pub fn decode_workers<'a, I>(records: I) -> (Vec<WorkerStatus>, Vec<usize>)
where
    I: IntoIterator<Item = (usize, &'a [u8])>,
{
    let mut workers = Vec::new();
    let mut skipped = Vec::new();

    for (index, bytes) in records {
        match WorkerStatus::decode(bytes) {
            Some(status) => workers.push(status),
            None => skipped.push(index),
        }
    }

    (workers, skipped)
}

/// Reader-side handle to a named monitor region.
///
/// Holds at most one mapping. Every call probes it first; a mapping whose
/// writer went away is dropped and discovery runs again, so a restarted
/// writer is picked up without rebuilding the bridge.
pub struct Bridge {
    name: String,
    backends: Vec<Box<dyn Backend>>,
    region: Option<Box<dyn Region>>,
}

impl Bridge {
    /// Creates a bridge that looks `name` up through `backends` in order.
    ///
    /// No mapping is attempted until the first call that needs one.
    pub fn new(name: impl Into<String>, backends: Vec<Box<dyn Backend>>) -> Self {
        Self {
            name: name.into(),
            backends,
            region: None,
        }
    }

    /// Creates a bridge over the backends chosen for this platform.
    pub fn for_platform(name: impl Into<String>, kind: BackendKind, shm_dir: &Path) -> Self {
        Self::new(name, backend::platform_backends(kind, shm_dir))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a mapping is currently held. It may still turn out stale.
    pub fn is_connected(&self) -> bool {
        self.region.is_some()
    }

    /// Description of the held mapping, if any.
    pub fn origin(&self) -> Option<String> {
        self.region.as_ref().map(|r| r.describe())
    }

    /// Ensures a live mapping is held, discovering one if needed.
    ///
    /// # Errors
    /// `BridgeError::NotFound` when no backend yields a region whose header
    /// passes the worker count check.
    pub fn connect(&mut self) -> Result<()> {
        self.region().map(|_| ())
    }

    /// Drops the held mapping.
    pub fn disconnect(&mut self) {
        if let Some(region) = self.region.take() {
            debug!("dropping mapping {}", region.describe());
        }
    }

    /// Reads the header and every worker record.
    ///
    /// A header outside the worker count bounds yields `Snapshot::NotRunning`
    /// and drops the mapping so the next call rediscovers it.
    ///
    /// # Errors
    /// Only I/O failures on an established mapping. A missing region is
    /// reported as `Snapshot::NotRunning`.
    pub fn read_snapshot(&mut self) -> Result<Snapshot> {
        let region = match self.region() {
            Ok(region) => region,
            Err(BridgeError::NotFound { .. }) => return Ok(Snapshot::NotRunning),
            Err(e) => return Err(e),
        };

        let header = match read_header(&**region)? {
            Some(header) if header.is_live() => header,
            _ => {
                debug!("header of {} no longer live", region.describe());
                self.disconnect();
                return Ok(Snapshot::NotRunning);
            }
        };

        let count = header.worker_count as usize;
        let mut raw = Vec::with_capacity(count);
        for index in 0..count {
            raw.push(region.read_range(worker_offset(index), WORKER_STATUS_SIZE)?);
        }

        let (workers, skipped) =
            decode_workers(raw.iter().enumerate().map(|(i, b)| (i, b.as_slice())));

        if !skipped.is_empty() {
            debug!("skipped torn records {skipped:?}");
        }

        Ok(Snapshot::Live(LiveSnapshot {
            header,
            workers,
            skipped,
        }))
    }

    /// Reads the mailbox.
    pub fn read_command(&mut self) -> Result<ControlCommand> {
        let region = self.region()?;
        let bytes = region.read_range(COMMAND_OFFSET, COMMAND_SIZE)?;

        ControlCommand::decode(&bytes).ok_or_else(|| {
            BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("mailbox read returned {} bytes", bytes.len()),
            ))
        })
    }

    /// Overwrites the mailbox with `cmd`. The only write the bridge performs.
    pub fn write_command(&mut self, cmd: &ControlCommand) -> Result<()> {
        let region = self.region()?;
        region.write_at(COMMAND_OFFSET, &cmd.encode())?;
        Ok(())
    }

    fn region(&mut self) -> Result<&mut Box<dyn Region>> {
        if let Some(Err(e)) = self.region.as_ref().map(|r| r.probe()) {
            info!("lost region '{}': {e}", self.name);
            self.region = None;
        }

        if self.region.is_none() {
            let region = self.discover()?;
            info!("attached to '{}' via {}", self.name, region.describe());
            self.region = Some(region);
        }

        self.region
            .as_mut()
            .ok_or_else(|| BridgeError::not_found(&self.name))
    }

    fn discover(&self) -> Result<Box<dyn Region>> {
        for backend in &self.backends {
            for candidate in backend.candidates(&self.name) {
                let region = match backend.open(&candidate) {
                    Ok(region) => region,
                    Err(e) => {
                        debug!("{} backend: '{candidate}' unavailable: {e}", backend.label());
                        continue;
                    }
                };

                match read_header(&*region) {
                    Ok(Some(header)) if header.is_live() => return Ok(region),
                    Ok(header) => debug!(
                        "{} backend: '{candidate}' has no active writer ({:?})",
                        backend.label(),
                        header.map(|h| h.worker_count)
                    ),
                    Err(e) => warn!("{} backend: reading '{candidate}' failed: {e}", backend.label()),
                }
            }
        }

        Err(BridgeError::not_found(&self.name))
    }
}

/// Reads the header, `None` if the mapping is too short to hold one.
fn read_header(region: &dyn Region) -> std::io::Result<Option<MonitorHeader>> {
    let bytes = region.read_range(0, HEADER_SIZE)?;
    Ok(MonitorHeader::decode(&bytes))
}
