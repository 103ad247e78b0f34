/// Cover image synthesis
///
/// Builds a plausible "photo" to carry the payload: a diagonal two-colour
/// gradient, soft translucent blobs, then Gaussian sensor-like noise.
/// Purely cosmetic; nothing here is needed to decode.

use crate::config::CarrierConfig;
use crate::error::{Result, StegoError};
use crate::raster::Carrier;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;

/// A soft round blob blended over the gradient
#[derive(Clone, Copy, Debug)]
struct Blob {
    cx: f64,
    cy: f64,
    radius: f64,
    color: [f64; 3],
    opacity: f64,
}

impl Blob {
    fn random<R: Rng + ?Sized>(config: &CarrierConfig, rng: &mut R) -> Self {
        Self {
            cx: rng.gen_range(0..config.width) as f64,
            cy: rng.gen_range(0..config.height) as f64,
            radius: rng.gen_range(config.shape_radius.clone()) as f64,
            color: random_color(rng),
            opacity: rng.gen_range(config.shape_opacity.clone()),
        }
    }
}

/// Generate a fresh cover carrier with the configured dimensions
pub fn synthesize<R: Rng + ?Sized>(config: &CarrierConfig, rng: &mut R) -> Result<Carrier> {
    let noise = Normal::new(0.0, config.noise_sigma)
        .map_err(|e| StegoError::InvalidConfig(format!("noise distribution: {e}")))?;

    let mut carrier = Carrier::blank(config.width, config.height);
    let row_bytes = config.row_bytes();

    let start = random_color(rng);
    let end = random_color(rng);
    paint_gradient(carrier.bytes_mut(), config, row_bytes, start, end);

    let count = rng.gen_range(config.shape_count.clone());
    for _ in 0..count {
        let blob = Blob::random(config, rng);
        paint_blob(carrier.bytes_mut(), config, row_bytes, &blob);
    }

    if config.noise_sigma > 0.0 {
        add_noise(carrier.bytes_mut(), &noise, rng);
    }

    Ok(carrier)
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> [f64; 3] {
    [rng.gen::<u8>() as f64, rng.gen::<u8>() as f64, rng.gen::<u8>() as f64]
}

#[inline]
fn to_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Stage 1: blend factor `0.5 * (x/w + y/h)` from `start` to `end`, opaque alpha
fn paint_gradient(buf: &mut [u8], config: &CarrierConfig, row_bytes: usize, start: [f64; 3], end: [f64; 3]) {
    let (w, h) = (config.width as f64, config.height as f64);
    buf.par_chunks_mut(row_bytes).enumerate().for_each(|(y, row)| {
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let b = 0.5 * (x as f64 / w + y as f64 / h);
            for c in 0..3 {
                px[c] = to_channel(start[c] * (1.0 - b) + end[c] * b);
            }
            px[3] = 255;
        }
    });
}

/// Stage 2: pull pixels inside the blob toward its colour with weight
/// `opacity * (1 - d/r)^2`. Alpha is left untouched.
fn paint_blob(buf: &mut [u8], config: &CarrierConfig, row_bytes: usize, blob: &Blob) {
    let y_lo = (blob.cy - blob.radius).floor().max(0.0) as usize;
    let y_hi = ((blob.cy + blob.radius).ceil() as usize).min(config.height as usize - 1);
    let x_lo = (blob.cx - blob.radius).floor().max(0.0) as usize;
    let x_hi = ((blob.cx + blob.radius).ceil() as usize).min(config.width as usize - 1);

    buf.par_chunks_mut(row_bytes)
        .enumerate()
        .skip(y_lo)
        .take(y_hi + 1 - y_lo)
        .for_each(|(y, row)| {
            let dy = y as f64 - blob.cy;
            for x in x_lo..=x_hi {
                let dx = x as f64 - blob.cx;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist >= blob.radius {
                    continue;
                }
                let falloff = 1.0 - dist / blob.radius;
                let f = blob.opacity * falloff * falloff;
                let px = &mut row[x * 4..x * 4 + 3];
                for c in 0..3 {
                    px[c] = to_channel(px[c] as f64 * (1.0 - f) + blob.color[c] * f);
                }
            }
        });
}

/// Stage 3: independent zero-mean Gaussian noise on R, G and B
fn add_noise<R: Rng + ?Sized>(buf: &mut [u8], noise: &Normal<f64>, rng: &mut R) {
    for px in buf.chunks_exact_mut(4) {
        for c in px.iter_mut().take(3) {
            *c = to_channel(*c as f64 + noise.sample(rng));
        }
    }
}
