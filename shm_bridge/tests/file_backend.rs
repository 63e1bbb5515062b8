use std::{fs, path::Path};

use shm_bridge::{
    Bridge, BackendKind, Command, CommandKind, ControlCommand, MonitorHeader, Snapshot,
    WorkerStatus,
    backend::FileBackend,
    layout::{COMMAND_OFFSET, COMMAND_SIZE, REGION_SIZE, worker_offset},
    send_command,
};

fn write_region(dir: &Path, name: &str, workers: i32) {
    let mut bytes = vec![0; REGION_SIZE];
    let header = MonitorHeader {
        worker_count: workers,
        global_best_score: 4242,
    };
    bytes[..12].copy_from_slice(&header.encode());

    for id in 0..workers {
        let status = WorkerStatus {
            id,
            iteration_count: 1000 + id as i64,
            temperature: 1.5,
            ..Default::default()
        };
        let at = worker_offset(id as usize);
        bytes[at..at + status.encode().len()].copy_from_slice(&status.encode());
    }

    fs::write(dir.join(name), bytes).unwrap();
}

#[test]
fn reads_file_backed_region() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path(), "SAMonitor4D", 3);

    let mut bridge = Bridge::for_platform("Local\\SAMonitor4D", BackendKind::File, dir.path());
    let Snapshot::Live(live) = bridge.read_snapshot().unwrap() else {
        panic!("expected a live snapshot");
    };

    assert_eq!(live.header.global_best_score, 4242);
    assert_eq!(live.workers.len(), 3);
    assert_eq!(live.workers[2].iteration_count, 1002);
    assert!(bridge.origin().unwrap().starts_with("file:"));
}

#[test]
fn command_lands_in_backing_file() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path(), "SAMonitor4D", 2);

    let mut bridge = Bridge::new(
        "SAMonitor4D",
        vec![Box::new(FileBackend::new(dir.path()))],
    );
    assert!(send_command(&mut bridge, &Command::new(1, CommandKind::SoftReseed)));

    let bytes = fs::read(dir.path().join("SAMonitor4D")).unwrap();
    let record = ControlCommand::decode(&bytes[COMMAND_OFFSET..COMMAND_OFFSET + COMMAND_SIZE]).unwrap();
    assert_eq!(record.target_worker, 1);
    assert_eq!(record.command_type, 1);
    assert_eq!(record.processed, 0);
}

#[test]
fn removed_file_means_not_running_then_recovers() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path(), "SAMonitor4D", 2);

    let mut bridge = Bridge::for_platform("SAMonitor4D", BackendKind::File, dir.path());
    assert!(matches!(bridge.read_snapshot().unwrap(), Snapshot::Live(_)));

    fs::remove_file(dir.path().join("SAMonitor4D")).unwrap();
    assert_eq!(bridge.read_snapshot().unwrap(), Snapshot::NotRunning);

    write_region(dir.path(), "SAMonitor4D", 5);
    let Snapshot::Live(live) = bridge.read_snapshot().unwrap() else {
        panic!("expected the restarted writer");
    };
    assert_eq!(live.header.worker_count, 5);
}

#[test]
fn zeroed_file_is_not_running() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path(), "SAMonitor4D", 0);

    let mut bridge = Bridge::for_platform("SAMonitor4D", BackendKind::File, dir.path());
    assert_eq!(bridge.read_snapshot().unwrap(), Snapshot::NotRunning);
    assert!(bridge.connect().unwrap_err().is_not_found());
}

#[test]
fn shrunk_file_is_remapped_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path(), "SAMonitor4D", 3);

    let mut bridge = Bridge::for_platform("SAMonitor4D", BackendKind::File, dir.path());
    assert!(matches!(bridge.read_snapshot().unwrap(), Snapshot::Live(_)));

    let path = dir.path().join("SAMonitor4D");
    fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_len((worker_offset(2) + 100) as u64)
        .unwrap();

    let Snapshot::Live(live) = bridge.read_snapshot().unwrap() else {
        panic!("expected a live snapshot over the shorter file");
    };
    assert_eq!(live.workers.len(), 2);
    assert_eq!(live.skipped, vec![2]);
}
