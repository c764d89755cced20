//! Benchmark harness for external archive compression tool-chains.
//!
//! Feeds a package tarball through every codec in a fixed registry,
//! recording sizes and wall-clock timings into a resumable per-package
//! result file. Decompression is timed differentially: each codec's runs
//! are paired with back-to-back baseline runs so machine-load variance
//! stays local to the comparison. Completed units of work are skipped on
//! re-runs; the persisted record is the retry mechanism.

pub mod bench;
pub mod codec;
pub mod error;
pub mod fsutil;
pub mod io_utils;
pub mod process;
pub mod store;

pub use bench::{package_name, Benchmark, DECOMPRESS_RUNS, PACKAGE_SUFFIX};
pub use codec::{Codec, CodecRegistry, CompressOp, DecompressOp};
pub use error::BenchError;
pub use store::{CodecRecord, PackageRecord, ResultStore};
