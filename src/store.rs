/// Carrier files on disk: naming, listing and deletion
///
/// Carriers are named `<prefix><random alnum>.<ext>` (by default
/// `enc_XXXXXXXXXX.png`) and live in a plain directory.

use crate::crypto;
use crate::error::{Result, StegoError};
use rand::Rng;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Random carrier file name
pub fn candidate_name<R: Rng + ?Sized>(rng: &mut R, prefix: &str, name_length: usize, ext: &str) -> String {
    format!("{prefix}{}.{ext}", crypto::random_alnum(rng, name_length))
}

/// Whether `name` looks like a carrier produced with this prefix/extension
pub fn is_candidate(name: &str, prefix: &str, ext: &str) -> bool {
    let suffix = format!(".{ext}");
    name.len() > prefix.len() + suffix.len() && name.starts_with(prefix) && name.ends_with(&suffix)
}

/// Create a new, previously non-existent carrier file in `dir`
pub fn create_unique<R: Rng + ?Sized>(
    dir: &Path,
    prefix: &str,
    name_length: usize,
    ext: &str,
    rng: &mut R,
) -> Result<(PathBuf, File)> {
    loop {
        let path = dir.join(candidate_name(rng, prefix, name_length, ext));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "name taken, drawing another");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Create a fresh carrier file in `dir` and fill it with `write`.
/// A failed write removes the file again so no partial carrier is left behind.
pub fn write_unique<R, F>(
    dir: &Path,
    prefix: &str,
    name_length: usize,
    ext: &str,
    rng: &mut R,
    write: F,
) -> Result<PathBuf>
where
    R: Rng + ?Sized,
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let (path, mut file) = create_unique(dir, prefix, name_length, ext, rng)?;
    if let Err(e) = write(&mut file) {
        drop(file);
        if let Err(rm) = fs::remove_file(&path) {
            warn!(path = %path.display(), error = %rm, "could not remove partial carrier");
        }
        return Err(e.into());
    }
    Ok(path)
}

/// Carrier files directly inside `dir`, sorted by name
pub fn list_candidates(dir: &Path, prefix: &str, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_str().is_some_and(|n| is_candidate(n, prefix, ext)) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Delete a carrier file. Refuses anything whose name is not a carrier name.
pub fn delete_candidate(path: &Path, prefix: &str, ext: &str) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if !is_candidate(name, prefix, ext) {
        return Err(StegoError::NotACarrier(path.display().to_string()));
    }
    fs::remove_file(path)?;
    info!(path = %path.display(), "carrier deleted");
    Ok(())
}
