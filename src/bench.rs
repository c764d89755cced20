//! The benchmark state machine.
//!
//! Per package: unpack once, compress with every codec, then time
//! decompression differentially against the baseline. Each unit of work is
//! persisted as soon as it completes, and a unit is skipped only when both
//! the record fields and the on-disk artifact for it exist, so a run
//! interrupted at any point resumes with at most one unit lost.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

use crate::codec::{CodecRegistry, DecompressOp};
use crate::fsutil::{dir_size, rm_rf};
use crate::io_utils::io_error;
use crate::store::{CodecRecord, PackageRecord, ResultStore};
use crate::BenchError;

/// Required input archive suffix. The package name is the file name with
/// this suffix stripped.
pub const PACKAGE_SUFFIX: &str = ".tar.bz2";

/// Timed repetitions per decompression measurement. `baseline_time` and
/// `decompression_time` both carry exactly this many samples,
/// index-aligned for per-run ratio analysis downstream.
pub const DECOMPRESS_RUNS: usize = 10;

/// Archive artifact suffix, one file per codec in the work directory.
const ARCHIVE_SUFFIX: &str = ".test";
/// Scratch extraction suffix used while timing decompression.
const SCRATCH_SUFFIX: &str = ".decompressed";
/// The unpacked source tree inside the work directory.
const UNCOMPRESSED_DIR: &str = "uncompressed";

/// Derive the package name from an input path, rejecting anything that is
/// not a `.tar.bz2` archive. Runs before any filesystem mutation.
pub fn package_name(input: &Path) -> Result<String, BenchError> {
    input
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(PACKAGE_SUFFIX))
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            BenchError::InvalidInput(format!(
                "'{}' is not a package archive (expected *{})",
                input.display(),
                PACKAGE_SUFFIX
            ))
        })
}

/// Drives all benchmark phases, one package at a time.
pub struct Benchmark<'a> {
    registry: &'a CodecRegistry,
    work_root: PathBuf,
}

impl<'a> Benchmark<'a> {
    pub fn new(registry: &'a CodecRegistry, work_root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            work_root: work_root.into(),
        }
    }

    /// Run every outstanding unit of work for one package archive.
    ///
    /// On failure the record keeps exactly the state of the last completed
    /// unit; re-invocation retries the failed unit from scratch.
    pub fn run_package(&self, input: &Path) -> Result<(), BenchError> {
        let package = package_name(input)?;
        eprintln!("Processing {package}...");

        // Tools that run from inside the tree need absolute paths.
        let input = input
            .canonicalize()
            .map_err(|e| io_error("opening package archive", input, e))?;
        let work_dir = self.work_root.join(&package);
        fs::create_dir_all(&work_dir)
            .map_err(|e| io_error("creating work directory", &work_dir, e))?;
        let work_dir = work_dir
            .canonicalize()
            .map_err(|e| io_error("resolving work directory", &work_dir, e))?;

        let store = ResultStore::new(&work_dir);
        let mut record = store.load();

        self.unpack(&input, &work_dir, &store, &mut record)?;
        self.compress_all(&work_dir, &store, &mut record)?;
        self.decompress_all(&work_dir, &store, &mut record)?;
        Ok(())
    }

    /// Unpack the input archive with the baseline decompressor and record
    /// the tree's size. Skipped when both the tree and the recorded size
    /// are present.
    fn unpack(
        &self,
        input: &Path,
        work_dir: &Path,
        store: &ResultStore,
        record: &mut PackageRecord,
    ) -> Result<(), BenchError> {
        let uncompressed = work_dir.join(UNCOMPRESSED_DIR);
        if uncompressed.exists() && record.uncompressed_size.is_some() {
            return Ok(());
        }
        eprintln!("Unpacking...");
        rm_rf(&uncompressed).map_err(|e| io_error("removing stale tree", &uncompressed, e))?;
        self.registry.baseline().decompress.run(input, &uncompressed)?;
        let size =
            dir_size(&uncompressed).map_err(|e| io_error("measuring tree", &uncompressed, e))?;
        record.uncompressed_size = Some(size);
        self.persist(store, record)
    }

    /// Compress the unpacked tree with every codec, timing each single
    /// invocation. A codec is skipped only when its archive artifact and
    /// both record fields are present.
    fn compress_all(
        &self,
        work_dir: &Path,
        store: &ResultStore,
        record: &mut PackageRecord,
    ) -> Result<(), BenchError> {
        let uncompressed = work_dir.join(UNCOMPRESSED_DIR);
        for codec in self.registry.iter() {
            let archive = work_dir.join(format!("{}{}", codec.name, ARCHIVE_SUFFIX));
            let done = record.codec(&codec.name).is_some_and(|entry| {
                entry.compressed_size.is_some() && entry.compression_time.is_some()
            });
            if archive.exists() && done {
                continue;
            }
            eprintln!("Compressing with {}...", codec.name);
            rm_rf(&archive).map_err(|e| io_error("removing stale archive", &archive, e))?;

            let start = Instant::now();
            codec.compress.run(&archive, &uncompressed)?;
            let elapsed = start.elapsed().as_secs_f64();
            let size = fs::metadata(&archive)
                .map_err(|e| io_error("reading archive size", &archive, e))?
                .len();

            // A fresh archive invalidates decompression samples taken
            // against its predecessor; the entry is replaced whole.
            record.codecs.insert(
                codec.name.clone(),
                CodecRecord {
                    compression_time: Some(elapsed),
                    compressed_size: Some(size),
                    ..CodecRecord::default()
                },
            );
            self.persist(store, record)?;
        }
        Ok(())
    }

    /// Time decompression for every codec differentially: ten baseline
    /// runs, then ten runs of the codec's own decompressor, back-to-back
    /// so machine-load variance stays local to the pairing. Both lists
    /// are persisted in a single write.
    fn decompress_all(
        &self,
        work_dir: &Path,
        store: &ResultStore,
        record: &mut PackageRecord,
    ) -> Result<(), BenchError> {
        let baseline = self.registry.baseline();
        let baseline_archive = work_dir.join(format!("{}{}", baseline.name, ARCHIVE_SUFFIX));
        for codec in self.registry.iter() {
            let done = record
                .codec(&codec.name)
                .is_some_and(|entry| entry.decompression_time.is_some());
            if done {
                continue;
            }
            eprintln!("Decompressing with {}...", codec.name);
            let archive = work_dir.join(format!("{}{}", codec.name, ARCHIVE_SUFFIX));
            let scratch = work_dir.join(format!("{}{}", codec.name, SCRATCH_SUFFIX));
            rm_rf(&scratch).map_err(|e| io_error("removing stale scratch", &scratch, e))?;

            let baseline_times =
                timed_runs(&baseline.decompress, &baseline_archive, &scratch, "baseline")?;
            let times = timed_runs(&codec.decompress, &archive, &scratch, &codec.name)?;

            let entry = record.codec_mut(&codec.name);
            entry.baseline_time = Some(baseline_times);
            entry.decompression_time = Some(times);
            self.persist(store, record)?;
        }
        Ok(())
    }

    fn persist(&self, store: &ResultStore, record: &PackageRecord) -> Result<(), BenchError> {
        store
            .save(record)
            .map_err(|e| io_error("writing results", store.path(), e))?;
        Ok(())
    }
}

/// Wall-clock one decompression op [`DECOMPRESS_RUNS`] times, wiping the
/// scratch tree after every repetition.
fn timed_runs(
    op: &DecompressOp,
    archive: &Path,
    scratch: &Path,
    label: &str,
) -> Result<Vec<f64>, BenchError> {
    let bar = ProgressBar::new(DECOMPRESS_RUNS as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg:12} [{bar:20}] {pos}/{len}")
            .expect("progress template")
            .progress_chars("=> "),
    );
    bar.set_message(label.to_string());
    let mut times = Vec::with_capacity(DECOMPRESS_RUNS);
    for _ in 0..DECOMPRESS_RUNS {
        let start = Instant::now();
        op.run(archive, scratch)?;
        times.push(start.elapsed().as_secs_f64());
        rm_rf(scratch).map_err(|e| io_error("removing scratch", scratch, e))?;
        bar.inc(1);
    }
    bar.finish_and_clear();
    Ok(times)
}
