#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use barbershop_core::ShopApp;
use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use shop_core::FixedClock;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Fresh data directory that outlives the calling test.
pub fn test_root() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn clock_at(year: i32, month: u32, day: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap(),
    ))
}

/// App over an isolated directory with the clock frozen at 10:00 UTC on the given day.
pub fn app_at(year: i32, month: u32, day: u32) -> ShopApp {
    ShopApp::open(test_root(), clock_at(year, month, day)).expect("open app")
}
