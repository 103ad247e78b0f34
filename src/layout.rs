/// Embedding layout: fixed header offsets and the keyed payload permutation
///
/// Header fields live at absolute byte offsets that depend only on the carrier
/// dimensions. Payload bytes are scattered over every pixel's first byte inside
/// `(margin, image_size - margin)`, in an order shuffled by [`crate::prng`].

use crate::config::CarrierConfig;
use crate::crypto::{self, DIGEST_CHARS, IV_LEN, MAC_LEN, SALT_LEN};
use crate::error::{Result, StegoError};
use crate::prng;

/// Width of the stored ciphertext length (u32 LE)
pub const LENGTH_BYTES: usize = 4;

/// A run of consecutive carrier bytes holding one copy of a field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Run {
    /// Byte `i` of the field lives at `start + i`
    Ascending(usize),
    /// Byte `i` of the field lives at `start - i`
    Descending(usize),
}

impl Run {
    #[inline]
    pub fn offset(self, i: usize) -> usize {
        match self {
            Run::Ascending(start) => start + i,
            Run::Descending(start) => start - i,
        }
    }

    pub fn write(self, buf: &mut [u8], data: &[u8]) {
        for (i, &b) in data.iter().enumerate() {
            buf[self.offset(i)] = b;
        }
    }

    pub fn read<const LEN: usize>(self, buf: &[u8]) -> [u8; LEN] {
        let mut out = [0u8; LEN];
        for (i, b) in out.iter_mut().enumerate() {
            *b = buf[self.offset(i)];
        }
        out
    }
}

/// Absolute placement of every redundant header copy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderLayout {
    pub length: [Run; 3],
    pub salt: [Run; 2],
    pub iv: [Run; 3],
    pub digest: [Run; 2],
    pub mac: [Run; 3],
}

impl HeaderLayout {
    /// Compute offsets for `config`, failing if any copy falls outside the
    /// carrier or two header bytes collide.
    pub fn new(config: &CarrierConfig) -> Result<Self> {
        let row = config.row_bytes();
        let size = config.image_size();
        let (w, h) = (config.width as usize, config.height as usize);

        let layout = Self {
            length: [
                Run::Ascending(0),
                Run::Ascending(row - LENGTH_BYTES),
                Run::Ascending(row * 2),
            ],
            salt: [Run::Ascending(20), Run::Descending(row - 20)],
            iv: [
                Run::Ascending(100),
                Run::Descending(row - 100),
                Run::Ascending((h / 2 * w + w / 2) * 4),
            ],
            digest: [Run::Ascending(200), Run::Descending(size - 200)],
            mac: [
                Run::Descending(size - 40),
                Run::Descending(size - 40 - MAC_LEN),
                Run::Ascending(400),
            ],
        };

        let mut used: Vec<usize> = layout
            .fields()
            .flat_map(|(_, runs, len)| {
                runs.iter()
                    .flat_map(move |run| (0..len).map(move |i| run.offset(i)))
                    .collect::<Vec<_>>()
            })
            .collect();
        let total = used.len();
        if used.iter().any(|&off| off >= size) {
            return Err(StegoError::InvalidConfig("header field outside the carrier".into()));
        }
        used.sort_unstable();
        used.dedup();
        if used.len() != total {
            return Err(StegoError::InvalidConfig("header fields overlap for these dimensions".into()));
        }
        Ok(layout)
    }

    /// (name, copies, field length) for each header field
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &[Run], usize)> {
        [
            ("length", &self.length[..], LENGTH_BYTES),
            ("salt", &self.salt[..], SALT_LEN),
            ("iv", &self.iv[..], IV_LEN),
            ("digest", &self.digest[..], DIGEST_CHARS),
            ("mac", &self.mac[..], MAC_LEN),
        ]
        .into_iter()
    }
}

/// Candidate payload offsets in raster order: each pixel's first byte
/// strictly inside `(margin, image_size - margin)`.
pub fn eligible_offsets(config: &CarrierConfig) -> Vec<usize> {
    let size = config.image_size();
    let (lo, hi) = (config.margin, size.saturating_sub(config.margin));
    (0..size)
        .step_by(4)
        .filter(|&off| off > lo && off < hi)
        .collect()
}

/// Keyed ordering of the eligible payload offsets.
///
/// Payload byte `i` goes to `slots[i]` and, when it exists, to
/// `slots[i + slots.len() / 3]`.
#[derive(Clone, Debug)]
pub struct PayloadLayout {
    slots: Vec<usize>,
}

impl PayloadLayout {
    /// Shuffle the eligible offsets with an explicit seed
    pub fn with_seed(config: &CarrierConfig, seed: u32) -> Self {
        let mut slots = eligible_offsets(config);
        prng::shuffle(&mut slots, seed);
        Self { slots }
    }

    /// Seed from `SHA256(key || salt)` and shuffle
    pub fn derive(config: &CarrierConfig, key: &[u8], salt: &[u8]) -> Self {
        Self::with_seed(config, crypto::derive_seed(key, salt))
    }

    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    /// Maximum number of payload bytes that get at least one slot
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Primary and redundant carrier offsets for payload byte `i`
    pub fn slots_for(&self, i: usize) -> (Option<usize>, Option<usize>) {
        let stride = self.slots.len() / 3;
        (self.slots.get(i).copied(), self.slots.get(i + stride).copied())
    }
}
