//! Intensity normalization and pseudo-color mapping.

use std::sync::OnceLock;

use image::{Rgb, RgbImage};
use ndarray::{Array2, ArrayView2};

/// Inferno-style anchors, evenly spaced over `0..=255`.
const INFERNO_ANCHORS: [[u8; 3]; 9] = [
    [0, 0, 4],
    [31, 12, 72],
    [85, 15, 109],
    [136, 34, 106],
    [186, 54, 85],
    [227, 89, 51],
    [249, 140, 10],
    [249, 201, 50],
    [252, 255, 164],
];

/// Stretch a frame to the full 8-bit range using its own finite min and max.
///
/// Non-finite samples map to 0, as does every sample of a constant frame.
pub fn normalize(frame: &ArrayView2<'_, f32>) -> Array2<u8> {
    let Some((min, max)) = finite_range(frame) else {
        return Array2::zeros(frame.raw_dim());
    };
    let span = max - min;
    if span <= 0.0 {
        return Array2::zeros(frame.raw_dim());
    }

    frame.mapv(|v| {
        if v.is_finite() {
            ((v - min) * 255.0 / span).round().clamp(0.0, 255.0) as u8
        } else {
            0
        }
    })
}

fn finite_range(frame: &ArrayView2<'_, f32>) -> Option<(f32, f32)> {
    frame
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// The 256-entry palette, built once on first use.
pub fn inferno_lut() -> &'static [[u8; 3]; 256] {
    static LUT: OnceLock<[[u8; 3]; 256]> = OnceLock::new();
    LUT.get_or_init(|| {
        let segments = (INFERNO_ANCHORS.len() - 1) as f32;
        let mut lut = [[0u8; 3]; 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            let pos = i as f32 / 255.0 * segments;
            let lo = (pos.floor() as usize).min(INFERNO_ANCHORS.len() - 2);
            let t = pos - lo as f32;
            let (a, b) = (INFERNO_ANCHORS[lo], INFERNO_ANCHORS[lo + 1]);
            for channel in 0..3 {
                let value = a[channel] as f32 + (b[channel] as f32 - a[channel] as f32) * t;
                entry[channel] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
        lut
    })
}

/// Map normalized intensities to an RGB image.
pub fn apply_colormap(intensity: &Array2<u8>) -> RgbImage {
    let lut = inferno_lut();
    let (height, width) = intensity.dim();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        Rgb(lut[intensity[[y as usize, x as usize]] as usize])
    })
}
