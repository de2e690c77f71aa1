//! Fixed-size separable Gaussian blur with mirrored borders.

use crate::domain::pixel_grid::PixelGrid;

const CHANNELS: usize = 3;

/// Normalized 1-D Gaussian weights, applied along rows and then columns.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel {
    weights: Vec<f32>,
}

impl GaussianKernel {
    /// Builds a `size`-tap kernel whose sigma is derived from its size:
    /// `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
    pub fn from_size(size: usize) -> Self {
        let size = size.max(1) | 1; // odd sizes only
        Self::with_sigma(size, sigma_for_size(size))
    }

    pub fn with_sigma(size: usize, sigma: f64) -> Self {
        let radius = (size / 2) as f64;
        let raw: Vec<f64> = (0..size)
            .map(|i| {
                let d = i as f64 - radius;
                (-(d * d) / (2.0 * sigma * sigma)).exp()
            })
            .collect();
        let sum: f64 = raw.iter().sum();
        Self {
            weights: raw.into_iter().map(|w| (w / sum) as f32).collect(),
        }
    }

    fn radius(&self) -> isize {
        (self.weights.len() / 2) as isize
    }

    /// Blurs every channel of `grid` in place.
    pub fn apply(&self, grid: &mut PixelGrid) {
        let (width, height) = grid.dimensions();
        let (width, height) = (width as usize, height as usize);
        let radius = self.radius();
        let row_stride = width * CHANNELS;

        let mut horizontal = vec![0f32; row_stride * height];
        {
            let src = grid.as_rgb().as_raw();
            for y in 0..height {
                let row = &src[y * row_stride..(y + 1) * row_stride];
                let out = &mut horizontal[y * row_stride..(y + 1) * row_stride];
                for x in 0..width {
                    let mut acc = [0f32; CHANNELS];
                    for (k, w) in self.weights.iter().enumerate() {
                        let sx = reflect_101(x as isize + k as isize - radius, width);
                        for (c, a) in acc.iter_mut().enumerate() {
                            *a += w * f32::from(row[sx * CHANNELS + c]);
                        }
                    }
                    out[x * CHANNELS..(x + 1) * CHANNELS].copy_from_slice(&acc);
                }
            }
        }

        let dst = grid.samples_mut();
        for y in 0..height {
            let taps: Vec<usize> = (0..self.weights.len())
                .map(|k| reflect_101(y as isize + k as isize - radius, height))
                .collect();
            for i in 0..row_stride {
                let value: f32 = self
                    .weights
                    .iter()
                    .zip(&taps)
                    .map(|(w, &sy)| w * horizontal[sy * row_stride + i])
                    .sum();
                dst[y * row_stride + i] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

pub fn sigma_for_size(size: usize) -> f64 {
    0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Mirrors `i` into `0..len` without repeating the edge sample
/// (`dcb|abcd|cba`). Reflects repeatedly when the kernel is wider than the
/// image.
fn reflect_101(mut i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    while i < 0 || i > last {
        i = if i < 0 { -i } else { 2 * last - i };
    }
    i as usize
}
