/// Carrier format parameters
/// Every component takes these explicitly; nothing reads process-wide state

use crate::error::{Result, StegoError};
use std::ops::RangeInclusive;

/// Fixed carrier edge length (pixels)
pub const DEFAULT_DIMENSION: u32 = 720;
/// PBKDF2-HMAC-SHA256 rounds for the AES key
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;
/// Bytes at each end of the carrier excluded from payload placement
pub const DEFAULT_MARGIN: usize = 300;
/// Largest ciphertext length accepted by the median/minimum fallbacks
pub const DEFAULT_LENGTH_CEILING: u32 = 10_000;
/// Length used when no redundant copy passes the ceiling
pub const DEFAULT_FALLBACK_LENGTH: u32 = 1_000;

/// Format and synthesis parameters for a carrier.
///
/// `Default` is the interoperable format (720×720 RGBA, 100k KDF rounds).
/// Tests shrink `kdf_iterations` or the dimensions; two parties only
/// interoperate when they share the same values.
#[derive(Clone, Debug, PartialEq)]
pub struct CarrierConfig {
    pub width: u32,
    pub height: u32,
    pub kdf_iterations: u32,
    pub margin: usize,
    pub length_ceiling: u32,
    pub fallback_length: u32,
    /// Standard deviation of the per-channel Gaussian noise
    pub noise_sigma: f64,
    pub shape_count: RangeInclusive<u32>,
    pub shape_radius: RangeInclusive<u32>,
    pub shape_opacity: RangeInclusive<f64>,
    pub file_prefix: String,
    pub file_extension: String,
    /// Random alphanumeric characters between prefix and extension
    pub name_length: usize,
    /// Upper bound on tied payload bytes the decoder will try to repair with the MAC
    pub max_tie_repair: usize,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_DIMENSION,
            height: DEFAULT_DIMENSION,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            margin: DEFAULT_MARGIN,
            length_ceiling: DEFAULT_LENGTH_CEILING,
            fallback_length: DEFAULT_FALLBACK_LENGTH,
            noise_sigma: 10.0,
            shape_count: 10..=25,
            shape_radius: 30..=150,
            shape_opacity: 0.1..=0.3,
            file_prefix: "enc_".to_string(),
            file_extension: "png".to_string(),
            name_length: 10,
            max_tie_repair: 8,
        }
    }
}

impl CarrierConfig {
    /// Total carrier size in bytes (RGBA)
    #[inline]
    pub fn image_size(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Bytes per pixel row
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width as usize * 4
    }

    /// Check numeric sanity. Header offset placement is checked separately by
    /// [`crate::layout::HeaderLayout::new`].
    pub fn validate(&self) -> Result<()> {
        if self.width < 160 || self.height < 16 {
            return Err(invalid(format!(
                "carrier {}x{} is too small (minimum 160x16)",
                self.width, self.height
            )));
        }
        if self.image_size() <= self.margin * 2 + 4 {
            return Err(invalid("margin leaves no payload region"));
        }
        if self.image_size() / 4 > u32::MAX as usize {
            return Err(invalid("too many payload slots for a 32-bit shuffle"));
        }
        if self.kdf_iterations == 0 {
            return Err(invalid("kdf_iterations must be non-zero"));
        }
        if self.length_ceiling == 0 || self.fallback_length > self.length_ceiling {
            return Err(invalid("fallback_length must not exceed length_ceiling"));
        }
        if !(self.noise_sigma.is_finite() && self.noise_sigma >= 0.0) {
            return Err(invalid("noise_sigma must be finite and non-negative"));
        }
        if self.shape_count.is_empty() || self.shape_radius.is_empty() || *self.shape_radius.start() == 0 {
            return Err(invalid("shape ranges must be non-empty with a positive radius"));
        }
        let (lo, hi) = (*self.shape_opacity.start(), *self.shape_opacity.end());
        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
            return Err(invalid("shape_opacity must be a range within [0, 1]"));
        }
        if self.file_extension.is_empty() || self.file_prefix.is_empty() {
            return Err(invalid("file prefix and extension must be non-empty"));
        }
        if self.name_length == 0 {
            return Err(invalid("name_length must be non-zero"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> StegoError {
    StegoError::InvalidConfig(msg.into())
}
