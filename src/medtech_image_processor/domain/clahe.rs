//! Contrast Limited Adaptive Histogram Equalization on a single 8-bit plane.
//!
//! The plane is cut into a grid of tiles, each tile gets its own clipped
//! equalization lookup table, and every sample is remapped by bilinearly
//! blending the tables of the four tiles whose centres surround it.

use image::imageops;
use image::GrayImage;
use imageproc::stats::histogram;

const BINS: usize = 256;

type Lut = [u8; BINS];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clahe {
    clip_limit: f32,
    tiles_x: u32,
    tiles_y: u32,
}

impl Clahe {
    /// `clip_limit` is a multiple of a tile's uniform bin height
    /// (`tile_area / 256`).
    pub const fn new(clip_limit: f32, tiles_x: u32, tiles_y: u32) -> Self {
        Self {
            clip_limit,
            tiles_x,
            tiles_y,
        }
    }

    pub fn apply(&self, plane: &mut GrayImage) {
        let (width, height) = plane.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let layout = TileLayout::new(width, height, self.tiles_x, self.tiles_y);
        let luts = self.tile_luts(plane, &layout);
        let cols = layout.cols();

        // 列方向の補間係数は行ごとに変わらないので先に計算しておく
        let columns = layout.x.weights();
        let rows = layout.y.weights();

        for (y, &(ty1, ty2, ya)) in rows.iter().enumerate() {
            let top = &luts[ty1 * cols..(ty1 + 1) * cols];
            let bottom = &luts[ty2 * cols..(ty2 + 1) * cols];

            for (x, &(tx1, tx2, xa)) in columns.iter().enumerate() {
                let pixel = plane.get_pixel_mut(x as u32, y as u32);
                let v = pixel.0[0] as usize;

                let upper = f32::from(top[tx1][v]) * (1.0 - xa) + f32::from(top[tx2][v]) * xa;
                let lower = f32::from(bottom[tx1][v]) * (1.0 - xa) + f32::from(bottom[tx2][v]) * xa;
                let blended = upper * (1.0 - ya) + lower * ya;

                pixel.0[0] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    /// Lookup tables in row-major tile order.
    fn tile_luts(&self, plane: &GrayImage, layout: &TileLayout) -> Vec<Lut> {
        let mut luts = Vec::with_capacity(layout.cols() * layout.rows());

        for (y0, y1) in layout.y.spans() {
            for (x0, x1) in layout.x.spans() {
                let (w, h) = (x1 - x0, y1 - y0);
                let tile = imageops::crop_imm(plane, x0, y0, w, h).to_image();
                let hist = histogram(&tile).channels[0];
                luts.push(self.clipped_lut(hist, w * h));
            }
        }

        luts
    }

    fn clipped_lut(&self, mut hist: [u32; BINS], area: u32) -> Lut {
        if hist.iter().filter(|&&count| count > 0).count() <= 1 {
            return identity_lut();
        }

        let limit = ((self.clip_limit * area as f32 / BINS as f32) as u32).max(1);
        let mut clipped = 0u32;
        for count in hist.iter_mut() {
            if *count > limit {
                clipped += *count - limit;
                *count = limit;
            }
        }

        let batch = clipped / BINS as u32;
        let mut residual = clipped % BINS as u32;
        for count in hist.iter_mut() {
            *count += batch;
        }
        if residual > 0 {
            let step = (BINS as u32 / residual).max(1) as usize;
            let mut bin = 0;
            while bin < BINS && residual > 0 {
                hist[bin] += 1;
                residual -= 1;
                bin += step;
            }
        }

        let scale = (BINS - 1) as f32 / area as f32;
        let mut lut = [0u8; BINS];
        let mut cdf = 0u32;
        for (entry, count) in lut.iter_mut().zip(hist.iter()) {
            cdf += count;
            *entry = (cdf as f32 * scale).round().clamp(0.0, 255.0) as u8;
        }
        lut
    }
}

/// Tile boundaries along both axes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TileLayout {
    x: AxisTiles,
    y: AxisTiles,
}

impl TileLayout {
    fn new(width: u32, height: u32, tiles_x: u32, tiles_y: u32) -> Self {
        Self {
            x: AxisTiles::new(width, tiles_x),
            y: AxisTiles::new(height, tiles_y),
        }
    }

    fn cols(&self) -> usize {
        self.x.count()
    }

    fn rows(&self) -> usize {
        self.y.count()
    }
}

/// `count + 1` boundaries splitting `0..len` into tiles whose sizes differ by
/// at most one sample. An axis shorter than the requested tile count gets one
/// tile per sample.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AxisTiles {
    bounds: Vec<u32>,
}

impl AxisTiles {
    fn new(len: u32, tiles: u32) -> Self {
        let count = u64::from(tiles.min(len).max(1));
        let bounds = (0..=count)
            .map(|t| (t * u64::from(len) / count) as u32)
            .collect();
        Self { bounds }
    }

    fn count(&self) -> usize {
        self.bounds.len() - 1
    }

    fn spans(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.bounds.windows(2).map(|pair| (pair[0], pair[1]))
    }

    fn centres(&self) -> Vec<f32> {
        self.spans()
            .map(|(start, end)| (start + end - 1) as f32 / 2.0)
            .collect()
    }

    /// For every sample on the axis, the two tiles whose centres surround it
    /// and the weight of the second one. Samples outside the outermost
    /// centres use that tile alone.
    fn weights(&self) -> Vec<(usize, usize, f32)> {
        let centres = self.centres();
        let last = centres.len() - 1;
        let len = self.bounds[last + 1];

        (0..len)
            .map(|i| {
                let p = i as f32;
                if p <= centres[0] {
                    (0, 0, 0.0)
                } else if p >= centres[last] {
                    (last, last, 0.0)
                } else {
                    let lo = centres.partition_point(|&c| c <= p) - 1;
                    let weight = (p - centres[lo]) / (centres[lo + 1] - centres[lo]);
                    (lo, lo + 1, weight)
                }
            })
            .collect()
    }
}

fn identity_lut() -> Lut {
    std::array::from_fn(|v| v as u8)
}
