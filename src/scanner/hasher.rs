//! Streaming content fingerprints.
//!
//! # Overview
//!
//! [`Fingerprinter`] reads a file through a fixed-size buffer and feeds it to
//! the configured digest, so memory use is bounded by the buffer regardless of
//! file size. The fingerprint is the lowercase hex encoding of the digest.
//!
//! MD5 is the default: it is a deduplication key, not a security boundary, and
//! its 128-bit digest keeps collision odds negligible for a single machine.
//! BLAKE3 is available when a wider digest is preferred.
//!
//! # Example
//!
//! ```no_run
//! use dupesift::scanner::{FingerprintAlgorithm, Fingerprinter};
//! use std::path::Path;
//!
//! let fp = Fingerprinter::new(FingerprintAlgorithm::Md5);
//! let hex = fp.fingerprint(Path::new("Cargo.toml")).unwrap();
//! assert_eq!(hex.len(), 32);
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use super::HashError;

/// Default read buffer size (8 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Digest used for content fingerprints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    /// 128-bit MD5
    #[default]
    Md5,
    /// 256-bit BLAKE3
    Blake3,
}

impl FingerprintAlgorithm {
    /// Length of the hex fingerprint this algorithm produces.
    #[must_use]
    pub fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Blake3 => 64,
        }
    }
}

impl std::fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Md5 => write!(f, "md5"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

enum DigestState {
    Md5(Md5),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    fn new(algorithm: FingerprintAlgorithm) -> Self {
        match algorithm {
            FingerprintAlgorithm::Md5 => Self::Md5(Md5::new()),
            FingerprintAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finish_hex(self) -> String {
        match self {
            Self::Md5(h) => to_hex(&h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// Lowercase hex encoding of `bytes`.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Streaming file fingerprinter.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    algorithm: FingerprintAlgorithm,
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(FingerprintAlgorithm::default())
    }
}

impl Fingerprinter {
    /// Create a fingerprinter with the default 8 KiB buffer.
    #[must_use]
    pub fn new(algorithm: FingerprintAlgorithm) -> Self {
        Self {
            algorithm,
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Use a different read buffer size. Zero is bumped to one byte.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Abort reads early once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    /// The configured buffer size.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Fingerprint the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or if
    /// shutdown was requested while reading.
    pub fn fingerprint(&self, path: &Path) -> Result<String, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.fingerprint_reader(&mut file)
            .map_err(|e| HashError::from_io(path, e))
    }

    /// Fingerprint everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Propagates read errors; returns `Interrupted` on shutdown.
    pub fn fingerprint_reader<R: Read>(&self, reader: &mut R) -> std::io::Result<String> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(std::io::Error::new(ErrorKind::Interrupted, "shutdown requested"));
            }
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => state.update(&buffer[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(state.finish_hex())
    }

    /// Fingerprint an in-memory buffer.
    #[must_use]
    pub fn fingerprint_bytes(&self, data: &[u8]) -> String {
        let mut state = DigestState::new(self.algorithm);
        state.update(data);
        state.finish_hex()
    }
}
