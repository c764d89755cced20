//! Durable per-package benchmark results.
//!
//! One JSON file per package, pretty-printed so results stay readable
//! without tooling. A field is present exactly when the corresponding unit
//! of work completed; the orchestrator treats absence as "still to do".

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name of the result record inside a package work directory.
pub const RESULT_FILE: &str = "result.json";

/// Measurements for one codec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodecRecord {
    /// Wall-clock seconds for the single compress invocation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_time: Option<f64>,
    /// Byte size of the produced archive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_size: Option<u64>,
    /// Baseline decompression samples taken back-to-back with
    /// `decompression_time`, index-aligned with it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_time: Option<Vec<f64>>,
    /// This codec's own decompression samples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decompression_time: Option<Vec<f64>>,
}

/// Accumulated results for one package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Total byte size of the unpacked source tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncompressed_size: Option<u64>,
    /// Per-codec entries, keyed by codec name.
    #[serde(flatten)]
    pub codecs: BTreeMap<String, CodecRecord>,
}

impl PackageRecord {
    /// Entry for `name`, if any unit of work for it has completed.
    pub fn codec(&self, name: &str) -> Option<&CodecRecord> {
        self.codecs.get(name)
    }

    /// Entry for `name`, created empty if absent.
    pub fn codec_mut(&mut self, name: &str) -> &mut CodecRecord {
        self.codecs.entry(name.to_string()).or_default()
    }
}

/// Loads and saves one package's [`PackageRecord`].
///
/// Records are independent per package; benchmarking several packages in
/// sequence resumes each from its own file.
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    /// Store backed by `result.json` inside the package work directory.
    pub fn new(work_dir: &Path) -> Self {
        Self {
            path: work_dir.join(RESULT_FILE),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record. A missing or unparsable file yields an empty
    /// record; corrupt state is healed by the next save, never surfaced.
    pub fn load(&self) -> PackageRecord {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
            Err(_) => PackageRecord::default(),
        }
    }

    /// Persist the record, replacing any previous contents. The write goes
    /// through a temp file and rename so an interrupted save cannot leave
    /// a truncated record behind.
    pub fn save(&self, record: &PackageRecord) -> io::Result<()> {
        let text = serde_json::to_string_pretty(record)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)
    }
}
