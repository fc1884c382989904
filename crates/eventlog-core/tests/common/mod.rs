//! Shared helpers for reading event files back in tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use eventlog_core::proto::masked_crc32c;
use eventlog_core::proto::schema::{event::What, value::Kind, Event, Value};
use prost::Message;

/// Decode every framed record in `path`, checking both checksums.
pub fn read_events(path: &Path) -> Vec<Event> {
    let data = std::fs::read(path).unwrap();
    let mut events = Vec::new();
    let mut rest = data.as_slice();
    while !rest.is_empty() {
        let (len_bytes, tail) = rest.split_at(8);
        let len = u64::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
        let (len_crc, tail) = tail.split_at(4);
        assert_eq!(
            u32::from_le_bytes(len_crc.try_into().unwrap()),
            masked_crc32c(len_bytes),
            "length checksum mismatch"
        );
        let (payload, tail) = tail.split_at(len);
        let (payload_crc, tail) = tail.split_at(4);
        assert_eq!(
            u32::from_le_bytes(payload_crc.try_into().unwrap()),
            masked_crc32c(payload),
            "payload checksum mismatch"
        );
        events.push(Event::decode(payload).unwrap());
        rest = tail;
    }
    events
}

/// Event files in `dir`, sorted by name.
pub fn event_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("tfevents.") && name.ends_with(".out"))
        })
        .collect();
    files.sort();
    files
}

/// `(step, values)` for each summary record, in file order.
pub fn summaries(events: &[Event]) -> Vec<(i64, Vec<Value>)> {
    events
        .iter()
        .filter_map(|event| match &event.what {
            Some(What::Summary(summary)) => Some((event.step, summary.value.clone())),
            _ => None,
        })
        .collect()
}

pub fn scalar(value: &Value) -> Option<f32> {
    match value.kind {
        Some(Kind::SimpleValue(v)) => Some(v),
        _ => None,
    }
}

pub fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Poll `condition` every few milliseconds until it holds or `deadline`
/// passes.
pub fn wait_until(deadline: Duration, condition: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

/// Route `tracing` output to the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
