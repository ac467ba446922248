#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, sync::Mutex};

use chrono::NaiveDate;
use daily_budget::{
    ledger::Ledger,
    storage::{JsonFileStore, KeyValueStore},
    time::ManualClock,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub struct TestEnv {
    pub base: PathBuf,
    pub store: Arc<JsonFileStore>,
    pub clock: Arc<ManualClock>,
}

impl TestEnv {
    pub fn open_ledger(&self) -> Ledger {
        Ledger::open(self.store.clone(), self.clock.clone()).expect("open ledger")
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Creates an isolated file-backed store and a clock parked at 09:00 on `start`.
pub fn setup_test_env(start: NaiveDate) -> TestEnv {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let store = JsonFileStore::new(base.join("store")).expect("create json store");
    TestEnv {
        base,
        store: Arc::new(store),
        clock: Arc::new(ManualClock::at(start, 9, 0)),
    }
}
