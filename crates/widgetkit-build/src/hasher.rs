//! Content hashing for the output directory.
//!
//! One digest covers the package version and every top-level `.js`/`.css`
//! file, so a change to any widget re-hashes all of them. The digest is cut
//! to [`HASH_LEN`] hex characters to keep file names short; two different
//! builds can collide, and that risk is accepted.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
pub const HASH_LEN: usize = 4;

/// Extensions of files that are hashed and renamed.
const HASHED_EXTENSIONS: &[&str] = &["js", "css"];

/// Errors that can occur while hashing outputs.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("Failed to list {path}: {source}")]
    Scan {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: String,
        to: String,
        source: std::io::Error,
    },
}

/// Outcome of hashing an output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashReport {
    /// Short hex digest applied to every file
    pub hash: String,

    /// `(old, new)` paths of every renamed file
    pub renamed: Vec<(PathBuf, PathBuf)>,
}

/// Computes the shared content hash and applies it to file names.
#[derive(Debug, Clone)]
pub struct ContentHasher {
    version: String,
}

impl ContentHasher {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Digest a set of `(file name, contents)` pairs.
    ///
    /// The version is fed first, then each file's name followed by its bytes,
    /// in lexicographic order of file name.
    pub fn digest(&self, files: &[(String, Vec<u8>)]) -> String {
        let mut sorted: Vec<&(String, Vec<u8>)> = files.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = Sha256::new();
        hasher.update(self.version.as_bytes());

        for (name, bytes) in sorted {
            hasher.update(name.as_bytes());
            hasher.update(bytes);
        }

        let mut hex = format!("{:x}", hasher.finalize());
        hex.truncate(HASH_LEN);
        hex
    }

    /// Hash every top-level `.js`/`.css` file in `out_dir` and rename each
    /// one to `{stem}-{hash}.{ext}`.
    ///
    /// Sub-directories are not scanned. Renames are not transactional; a
    /// failure part way through leaves a mix of hashed and unhashed names.
    pub fn hash_dir(&self, out_dir: &Path) -> Result<HashReport, HashError> {
        let outputs = collect_outputs(out_dir)?;

        let files: Vec<(String, Vec<u8>)> = outputs
            .par_iter()
            .map(|(name, path)| {
                fs::read(path)
                    .map(|bytes| (name.clone(), bytes))
                    .map_err(|e| HashError::Read {
                        path: path.display().to_string(),
                        source: e,
                    })
            })
            .collect::<Result<_, _>>()?;

        let hash = self.digest(&files);
        let mut renamed = Vec::with_capacity(outputs.len());

        for (name, path) in outputs {
            let target = out_dir.join(hashed_file_name(&name, &hash));

            fs::rename(&path, &target).map_err(|e| HashError::Rename {
                from: path.display().to_string(),
                to: target.display().to_string(),
                source: e,
            })?;

            tracing::info!("{} -> {}", path.display(), target.display());
            renamed.push((path, target));
        }

        Ok(HashReport { hash, renamed })
    }
}

/// Insert `-{hash}` before a file name's extension.
pub fn hashed_file_name(name: &str, hash: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}-{}.{}", stem, hash, ext),
        None => format!("{}-{}", name, hash),
    }
}

/// Top-level hashable files in `out_dir`, sorted by name.
fn collect_outputs(out_dir: &Path) -> Result<Vec<(String, PathBuf)>, HashError> {
    let scan_err = |e: std::io::Error| HashError::Scan {
        path: out_dir.display().to_string(),
        source: e,
    };

    let mut outputs = Vec::new();

    for item in fs::read_dir(out_dir).map_err(scan_err)? {
        let item = item.map_err(scan_err)?;
        let path = item.path();

        if !path.is_file() {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !HASHED_EXTENSIONS.contains(&ext) {
            continue;
        }

        let name = item.file_name().to_string_lossy().into_owned();
        outputs.push((name, path));
    }

    outputs.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(outputs)
}
