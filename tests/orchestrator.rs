use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use packbench::{
    BenchError, Benchmark, Codec, CodecRegistry, CompressOp, DecompressOp, PackageRecord,
    ResultStore, DECOMPRESS_RUNS,
};

/// Build a `.tar.bz2` package archive containing the given files.
fn make_package(dir: &Path, stem: &str, files: &[(&str, usize)]) -> PathBuf {
    let tree = dir.join("tree");
    for (name, size) in files {
        let path = tree.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, vec![b'a'; *size]).unwrap();
    }
    let archive = dir.join(format!("{stem}.tar.bz2"));
    let status = Command::new("tar")
        .args([
            "-cjf",
            archive.to_str().unwrap(),
            "-C",
            tree.to_str().unwrap(),
            ".",
        ])
        .status()
        .expect("tar failed to start");
    assert!(status.success());
    archive
}

/// bz2 baseline plus gz, both via plain tar.
fn plain_registry() -> CodecRegistry {
    CodecRegistry::new(
        vec![
            Codec::new("bz2", CompressOp::Tar('j'), DecompressOp::Untar('j')),
            Codec::new("gz", CompressOp::Tar('z'), DecompressOp::Untar('z')),
        ],
        "bz2",
    )
    .unwrap()
}

/// Same tool-chains, with every invocation appending a line to `counter`.
fn counting_registry(counter: &Path) -> CodecRegistry {
    let count = |cmd: &str| format!("{cmd} && echo x >> {}", counter.to_str().unwrap());
    CodecRegistry::new(
        vec![
            Codec::new(
                "bz2",
                CompressOp::Pipeline(count("tar -cjf {archive} -C {dir} .")),
                DecompressOp::Pipeline(count("tar -xjf {archive} -C {dir}")),
            ),
            Codec::new(
                "gz",
                CompressOp::Pipeline(count("tar -czf {archive} -C {dir} .")),
                DecompressOp::Pipeline(count("tar -xzf {archive} -C {dir}")),
            ),
        ],
        "bz2",
    )
    .unwrap()
}

fn invocations(counter: &Path) -> usize {
    fs::read_to_string(counter)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

fn load_record(work_root: &Path, package: &str) -> PackageRecord {
    ResultStore::new(&work_root.join(package)).load()
}

#[test]
fn full_run_records_complete_entries() {
    let dir = tempfile::tempdir().unwrap();
    let archive = make_package(dir.path(), "pkg-1.0", &[("data.bin", 100)]);
    let work_root = dir.path().join("work");

    let registry = plain_registry();
    Benchmark::new(&registry, &work_root)
        .run_package(&archive)
        .unwrap();

    let record = load_record(&work_root, "pkg-1.0");
    assert_eq!(record.uncompressed_size, Some(100));
    for name in ["bz2", "gz"] {
        let entry = record.codec(name).unwrap();
        assert!(entry.compressed_size.unwrap() > 0);
        assert!(entry.compression_time.unwrap() >= 0.0);
        assert_eq!(entry.baseline_time.as_ref().unwrap().len(), DECOMPRESS_RUNS);
        assert_eq!(
            entry.decompression_time.as_ref().unwrap().len(),
            DECOMPRESS_RUNS
        );
        assert!(entry
            .decompression_time
            .as_ref()
            .unwrap()
            .iter()
            .all(|t| *t >= 0.0));
    }
}

#[test]
fn rerun_invokes_no_tools() {
    let dir = tempfile::tempdir().unwrap();
    let archive = make_package(dir.path(), "pkg-1.0", &[("data.bin", 100)]);
    let work_root = dir.path().join("work");
    let counter = dir.path().join("invocations");

    let registry = counting_registry(&counter);
    let bench = Benchmark::new(&registry, &work_root);

    bench.run_package(&archive).unwrap();
    // 1 unpack + 2 compressions + 2 codecs x (10 baseline + 10 own) runs.
    let first = invocations(&counter);
    assert_eq!(first, 1 + 2 + 2 * (2 * DECOMPRESS_RUNS));
    let record = load_record(&work_root, "pkg-1.0");

    bench.run_package(&archive).unwrap();
    assert_eq!(invocations(&counter), first);
    assert_eq!(load_record(&work_root, "pkg-1.0"), record);
}

#[test]
fn partial_progress_is_preserved_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let archive = make_package(dir.path(), "pkg-1.0", &[("data.bin", 256)]);
    let work_root = dir.path().join("work");

    // First run knows only the baseline codec, as if the process died
    // before ever reaching gz.
    let only_bz2 = CodecRegistry::new(
        vec![Codec::new(
            "bz2",
            CompressOp::Tar('j'),
            DecompressOp::Untar('j'),
        )],
        "bz2",
    )
    .unwrap();
    Benchmark::new(&only_bz2, &work_root)
        .run_package(&archive)
        .unwrap();
    let before = load_record(&work_root, "pkg-1.0");

    let registry = plain_registry();
    Benchmark::new(&registry, &work_root)
        .run_package(&archive)
        .unwrap();
    let after = load_record(&work_root, "pkg-1.0");

    // bz2's fields survive byte-identical; gz is filled in.
    assert_eq!(after.codec("bz2"), before.codec("bz2"));
    assert_eq!(after.uncompressed_size, before.uncompressed_size);
    let gz = after.codec("gz").unwrap();
    assert!(gz.compressed_size.is_some());
    assert_eq!(gz.decompression_time.as_ref().unwrap().len(), DECOMPRESS_RUNS);
}

#[test]
fn missing_artifact_forces_rework() {
    let dir = tempfile::tempdir().unwrap();
    let archive = make_package(dir.path(), "pkg-1.0", &[("data.bin", 100)]);
    let work_root = dir.path().join("work");
    let counter = dir.path().join("invocations");

    let registry = counting_registry(&counter);
    let bench = Benchmark::new(&registry, &work_root);
    bench.run_package(&archive).unwrap();
    let first = invocations(&counter);

    let gz_archive = work_root.join("pkg-1.0/gz.test");
    fs::remove_file(&gz_archive).unwrap();
    bench.run_package(&archive).unwrap();

    // Recompressing gz resets its entry, so its decompression pairing
    // reruns too: 1 compress + 10 baseline + 10 own.
    assert_eq!(invocations(&counter), first + 1 + 2 * DECOMPRESS_RUNS);
    assert!(gz_archive.exists());
    let record = load_record(&work_root, "pkg-1.0");
    assert_eq!(
        record
            .codec("gz")
            .unwrap()
            .decompression_time
            .as_ref()
            .unwrap()
            .len(),
        DECOMPRESS_RUNS
    );
}

#[test]
fn corrupt_record_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let archive = make_package(dir.path(), "pkg-1.0", &[("data.bin", 100)]);
    let work_root = dir.path().join("work");
    let work_dir = work_root.join("pkg-1.0");
    fs::create_dir_all(&work_dir).unwrap();
    fs::write(work_dir.join("result.json"), "}}} definitely not json").unwrap();

    let registry = plain_registry();
    Benchmark::new(&registry, &work_root)
        .run_package(&archive)
        .unwrap();

    let record = load_record(&work_root, "pkg-1.0");
    assert_eq!(record.uncompressed_size, Some(100));
    assert!(record.codec("gz").unwrap().decompression_time.is_some());
}

#[test]
fn invalid_input_creates_no_work_dir() {
    let dir = tempfile::tempdir().unwrap();
    let work_root = dir.path().join("work");
    let registry = plain_registry();

    let err = Benchmark::new(&registry, &work_root)
        .run_package(Path::new("notapackage.zip"))
        .unwrap_err();
    assert!(matches!(err, BenchError::InvalidInput(_)));
    assert!(!work_root.exists());
}

#[test]
fn missing_input_fails_before_any_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let work_root = dir.path().join("work");
    let registry = plain_registry();

    let err = Benchmark::new(&registry, &work_root)
        .run_package(&dir.path().join("ghost-1.0.tar.bz2"))
        .unwrap_err();
    assert!(matches!(err, BenchError::Io(_)));
    assert!(!work_root.exists());
}

#[test]
fn tool_failure_keeps_the_last_persisted_state() {
    let dir = tempfile::tempdir().unwrap();
    let archive = make_package(dir.path(), "pkg-1.0", &[("data.bin", 100)]);
    let work_root = dir.path().join("work");

    let registry = CodecRegistry::new(
        vec![
            Codec::new("bz2", CompressOp::Tar('j'), DecompressOp::Untar('j')),
            Codec::new(
                "broken",
                CompressOp::Pipeline("false".to_string()),
                DecompressOp::Untar('j'),
            ),
        ],
        "bz2",
    )
    .unwrap();

    let err = Benchmark::new(&registry, &work_root)
        .run_package(&archive)
        .unwrap_err();
    assert!(matches!(err, BenchError::Tool(_)));

    // Everything up to the failing unit is recorded; nothing partial is.
    let record = load_record(&work_root, "pkg-1.0");
    assert_eq!(record.uncompressed_size, Some(100));
    let bz2 = record.codec("bz2").unwrap();
    assert!(bz2.compressed_size.is_some());
    assert!(bz2.compression_time.is_some());
    assert!(record.codec("broken").is_none());
}
