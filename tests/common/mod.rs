#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use tea_sales_core::{
    core::time::ManualClock,
    storage::{InMemoryStore, JsonStore},
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap(),
    ))
}

/// A JSON store in a fresh directory that outlives the test body.
pub fn json_store(clock: Arc<ManualClock>) -> JsonStore {
    let temp = TempDir::new().expect("create temp dir");
    let root = temp.path().join("data");
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    JsonStore::with_clock(root, clock).expect("open json store")
}

pub fn memory_store() -> InMemoryStore {
    InMemoryStore::with_clock(clock())
}
