//! # Hushpix Steganographic Secret Store
//!
//! Hides a short secret inside a freshly synthesized 720×720 RGBA image and
//! recovers it later from that image alone.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! // Encode into a new enc_XXXXXXXXXX.png in the current directory
//! let path = hushpix::encode("correct horse battery staple", Path::new("."))?;
//!
//! // Decode (self-decrypting: the image carries everything needed)
//! let decoded = hushpix::decode(&path)?;
//! assert_eq!(decoded.secret, "correct horse battery staple");
//! for warning in &decoded.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **AES-256-CBC + HMAC-SHA256**: ciphertext and MAC keyed from a PBKDF2-derived key
//! - **Keyed scattering**: payload bytes are placed by an MT19937 Fisher–Yates shuffle
//! - **Redundancy**: every header field and payload byte is stored more than once and voted on decode
//! - **Synthetic covers**: gradient, blobs and Gaussian noise; no user photo needed
//!
//! The key is derived from a salt stored in the image itself, so anyone holding
//! the file and the format can recover the secret. This is obscurity, not a
//! password vault.
//!
//! ## Modules
//!
//! - `steganography`: Main engine (encode/decode pipeline)
//! - `layout`, `prng`: Header offsets and keyed payload placement
//! - `crypto`, `redundancy`: Primitives and voting
//! - `cover`, `raster`, `store`: Cover synthesis, image files, carrier files on disk

pub mod config;
pub mod cover;
pub mod crypto;
pub mod error;
pub mod layout;
pub mod prng;
pub mod raster;
pub mod redundancy;
pub mod steganography;
pub mod store;

// Re-export main types for convenience
pub use config::CarrierConfig;
pub use error::{Result, StegoError};
pub use raster::{Carrier, ImageCodec, RasterCodec};
pub use redundancy::LengthResolution;
pub use steganography::{Decoded, HeaderReadout, HushpixStego, Stage, Warning};

use std::path::{Path, PathBuf};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hide `secret` in a new carrier file inside `dir`, returning its path
///
/// # Examples
///
/// ```no_run
/// let path = hushpix::encode("hunter2", std::path::Path::new("/tmp"))?;
/// println!("wrote {}", path.display());
/// # Ok::<(), hushpix::StegoError>(())
/// ```
pub fn encode(secret: &str, dir: &Path) -> Result<PathBuf> {
    HushpixStego::new()?.encode_to_dir(secret, dir)
}

/// Recover the secret from a carrier file, with any warnings raised on the way
pub fn decode(path: &Path) -> Result<Decoded> {
    HushpixStego::for_path(path)?.decode_file(path)
}

/// Default-named carrier files (`enc_*.png`) in `dir`, sorted
pub fn list_candidate_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let config = CarrierConfig::default();
    store::list_candidates(dir, &config.file_prefix, &config.file_extension)
}

/// Delete a carrier file; refuses paths that are not named like one
pub fn delete_candidate(path: &Path) -> Result<()> {
    let config = CarrierConfig::default();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    raster::lossless_format(ext)?;
    store::delete_candidate(path, &config.file_prefix, ext)
}
