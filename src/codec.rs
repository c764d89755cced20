//! The fixed table of compression tool-chains under benchmark.
//!
//! Every codec is a named pair of operations: build an archive from an
//! uncompressed tree, and unpack an archive into a destination tree. The
//! operations are plain data describing how the external tool is invoked;
//! adding a codec means adding one entry to [`CodecRegistry::standard`].

use std::fs;
use std::path::{Path, PathBuf};

use crate::fsutil::rm_rf;
use crate::process::{run_argv, run_shell};
use crate::BenchError;

/// How a codec builds its archive from an uncompressed tree.
///
/// Archive paths must be absolute: some variants run the tool from inside
/// the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressOp {
    /// Single `tar` invocation with the given compression flag.
    Tar(char),
    /// Archiver invoked from inside the tree: `<tool> <args..> <archive> .`.
    InTree { tool: String, args: Vec<String> },
    /// Shell pipeline; `{dir}` and `{archive}` are substituted.
    Pipeline(String),
    /// Plain tar into `<archive>.temp`, then a pipeline with `{temp}` and
    /// `{archive}` substituted. The temp file is removed whether or not
    /// the tool succeeded.
    Staged(String),
}

impl CompressOp {
    /// Build `archive` from the tree at `dir`.
    pub fn run(&self, archive: &Path, dir: &Path) -> Result<(), BenchError> {
        match self {
            CompressOp::Tar(flag) => {
                let mode = format!("-c{flag}f");
                run_argv(&["tar", &mode, utf8(archive)?, "-C", utf8(dir)?, "."], None)
            }
            CompressOp::InTree { tool, args } => {
                let mut argv = vec![tool.as_str()];
                argv.extend(args.iter().map(String::as_str));
                argv.push(utf8(archive)?);
                argv.push(".");
                run_argv(&argv, Some(dir))
            }
            CompressOp::Pipeline(template) => {
                let cmd = template
                    .replace("{dir}", utf8(dir)?)
                    .replace("{archive}", utf8(archive)?);
                run_shell(&cmd, None)
            }
            CompressOp::Staged(template) => {
                let temp = temp_path(archive);
                let cmd = template
                    .replace("{temp}", utf8(&temp)?)
                    .replace("{archive}", utf8(archive)?);
                let result = run_argv(
                    &["tar", "-cf", utf8(&temp)?, "-C", utf8(dir)?, "."],
                    None,
                )
                .and_then(|()| run_shell(&cmd, None));
                let cleanup = rm_rf(&temp);
                result?;
                cleanup?;
                Ok(())
            }
        }
    }
}

/// How a codec unpacks an archive into a destination tree.
///
/// The destination directory is created before the tool runs. Several
/// codecs share one decompress value (e.g. all gzip-framed entries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecompressOp {
    /// `tar -x<flag>f` into the destination.
    Untar(char),
    /// `7zr x` with the destination passed via `-o`.
    SevenZ,
    /// `unzip -q` with the destination passed via `-d`.
    Unzip,
    /// Shell pipeline; `{archive}` and `{dir}` are substituted.
    Pipeline(String),
    /// Pipeline with `{archive}` and `{temp}` substituted producing a
    /// plain tar at `<archive>.temp`, which is then extracted into the
    /// destination. The temp file is removed whether or not the tool
    /// succeeded.
    Staged(String),
}

impl DecompressOp {
    /// Unpack `archive` into `dir`.
    pub fn run(&self, archive: &Path, dir: &Path) -> Result<(), BenchError> {
        fs::create_dir_all(dir)?;
        match self {
            DecompressOp::Untar(flag) => {
                let mode = format!("-x{flag}f");
                run_argv(&["tar", &mode, utf8(archive)?, "-C", utf8(dir)?], None)
            }
            DecompressOp::SevenZ => {
                let dest = format!("-o{}", utf8(dir)?);
                run_argv(&["7zr", "x", utf8(archive)?, &dest, "-y"], None)
            }
            DecompressOp::Unzip => {
                run_argv(&["unzip", "-q", utf8(archive)?, "-d", utf8(dir)?], None)
            }
            DecompressOp::Pipeline(template) => {
                let cmd = template
                    .replace("{archive}", utf8(archive)?)
                    .replace("{dir}", utf8(dir)?);
                run_shell(&cmd, None)
            }
            DecompressOp::Staged(template) => {
                let temp = temp_path(archive);
                let cmd = template
                    .replace("{archive}", utf8(archive)?)
                    .replace("{temp}", utf8(&temp)?);
                let result = run_shell(&cmd, None).and_then(|()| {
                    run_argv(&["tar", "-xf", utf8(&temp)?, "-C", utf8(dir)?], None)
                });
                let cleanup = rm_rf(&temp);
                result?;
                cleanup?;
                Ok(())
            }
        }
    }
}

/// A named compression tool-chain.
#[derive(Debug, Clone)]
pub struct Codec {
    pub name: String,
    pub compress: CompressOp,
    pub decompress: DecompressOp,
}

impl Codec {
    pub fn new(name: &str, compress: CompressOp, decompress: DecompressOp) -> Self {
        Self {
            name: name.to_string(),
            compress,
            decompress,
        }
    }
}

/// Ordered, immutable table of codecs with a designated baseline.
///
/// Iteration order fixes benchmark execution order. It carries no meaning
/// beyond deterministic output.
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    codecs: Vec<Codec>,
    baseline: usize,
}

impl CodecRegistry {
    /// Build a registry from a codec list and the name of the baseline
    /// codec, whose format must match the input archives. Duplicate codec
    /// names and an unknown baseline are rejected.
    pub fn new(codecs: Vec<Codec>, baseline: &str) -> Result<Self, BenchError> {
        for (i, codec) in codecs.iter().enumerate() {
            if codecs[..i].iter().any(|c| c.name == codec.name) {
                return Err(BenchError::InvalidInput(format!(
                    "duplicate codec name '{}'",
                    codec.name
                )));
            }
        }
        let baseline = codecs
            .iter()
            .position(|c| c.name == baseline)
            .ok_or_else(|| {
                BenchError::InvalidInput(format!("baseline codec '{baseline}' is not registered"))
            })?;
        Ok(Self { codecs, baseline })
    }

    /// The standard tool-chain table, with bzip2 as baseline.
    ///
    /// The gzip-framed entries (`gz`, `zopfli`, `zopfli50`) share one
    /// decompress value, as do the xz, 7z, zstd and brotli level pairs.
    pub fn standard() -> Self {
        let codecs = vec![
            Codec::new("bz2", CompressOp::Tar('j'), DecompressOp::Untar('j')),
            Codec::new("gz", CompressOp::Tar('z'), DecompressOp::Untar('z')),
            Codec::new(
                "zopfli",
                CompressOp::Staged("zopfli -c {temp} > {archive}".to_string()),
                DecompressOp::Untar('z'),
            ),
            Codec::new(
                "zopfli50",
                CompressOp::Staged("zopfli --i50 -c {temp} > {archive}".to_string()),
                DecompressOp::Untar('z'),
            ),
            Codec::new("xz", CompressOp::Tar('J'), DecompressOp::Untar('J')),
            Codec::new(
                "xz9",
                CompressOp::Pipeline("tar -c -C {dir} . | xz -9 > {archive}".to_string()),
                DecompressOp::Untar('J'),
            ),
            Codec::new(
                "7z",
                CompressOp::InTree {
                    tool: "7zr".to_string(),
                    args: vec!["a".to_string()],
                },
                DecompressOp::SevenZ,
            ),
            Codec::new(
                "7z9",
                CompressOp::InTree {
                    tool: "7zr".to_string(),
                    args: vec!["a".to_string(), "-mx=9".to_string()],
                },
                DecompressOp::SevenZ,
            ),
            Codec::new(
                "zstd",
                CompressOp::Staged("zstd -q -f {temp} -o {archive}".to_string()),
                DecompressOp::Staged("zstd -q -f -d {archive} -o {temp}".to_string()),
            ),
            Codec::new(
                "zstd19",
                CompressOp::Staged("zstd -q -f -19 {temp} -o {archive}".to_string()),
                DecompressOp::Staged("zstd -q -f -d {archive} -o {temp}".to_string()),
            ),
            Codec::new(
                "zip",
                CompressOp::InTree {
                    tool: "zip".to_string(),
                    args: vec!["-qr".to_string()],
                },
                DecompressOp::Unzip,
            ),
            Codec::new(
                "brotli",
                CompressOp::Pipeline("tar -c -C {dir} . | brotli -c > {archive}".to_string()),
                DecompressOp::Pipeline("brotli -dc {archive} | tar -x -C {dir}".to_string()),
            ),
            Codec::new(
                "brotli24",
                CompressOp::Pipeline(
                    "tar -c -C {dir} . | brotli -q 11 --large_window=24 -c > {archive}"
                        .to_string(),
                ),
                DecompressOp::Pipeline("brotli -dc {archive} | tar -x -C {dir}".to_string()),
            ),
        ];
        Self::new(codecs, "bz2").expect("standard codec table is well formed")
    }

    /// Codecs in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &Codec> {
        self.codecs.iter()
    }

    /// Look a codec up by name.
    pub fn get(&self, name: &str) -> Option<&Codec> {
        self.codecs.iter().find(|c| c.name == name)
    }

    /// The fixed baseline codec used for unpacking and differential timing.
    pub fn baseline(&self) -> &Codec {
        &self.codecs[self.baseline]
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Restrict the registry to the named codecs, keeping their original
    /// order. The baseline is always retained: unpacking and every
    /// differential timing pair depend on it. Unknown names are rejected.
    pub fn retain(&self, names: &[String]) -> Result<Self, BenchError> {
        for name in names {
            if self.get(name).is_none() {
                return Err(BenchError::InvalidInput(format!("unknown codec '{name}'")));
            }
        }
        let baseline = self.baseline().name.clone();
        let codecs = self
            .codecs
            .iter()
            .filter(|c| c.name == baseline || names.iter().any(|n| *n == c.name))
            .cloned()
            .collect();
        Self::new(codecs, &baseline)
    }
}

fn utf8(path: &Path) -> Result<&str, BenchError> {
    path.to_str().ok_or_else(|| {
        BenchError::InvalidInput(format!("path is not valid UTF-8: {}", path.display()))
    })
}

fn temp_path(archive: &Path) -> PathBuf {
    let mut os = archive.as_os_str().to_os_string();
    os.push(".temp");
    PathBuf::from(os)
}
