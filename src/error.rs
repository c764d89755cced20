use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    /// Input path does not name a supported package archive.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An external compressor or decompressor exited abnormally or could
    /// not be launched.
    #[error("tool execution failed: {0}")]
    Tool(String),

    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
