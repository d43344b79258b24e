#![cfg(feature = "__test_data")]

use std::path::{Path, PathBuf};

use crate::corpus::load_dir;
use crate::Segmenter;

#[test]
fn test_data() {
    crate::test_cases::run(&segmenter(&crate_data_dir()));
}

/// Load the segmenter from the corpus files in `dir`, panicking with context on failure
pub fn segmenter(dir: &Path) -> Segmenter {
    load_dir(dir).unwrap_or_else(|e| panic!("failed to load data from {:?}: {}", dir, e))
}

pub fn crate_data_dir() -> PathBuf {
    PathBuf::from(format!("{}/../data", env!("CARGO_MANIFEST_DIR")))
}
