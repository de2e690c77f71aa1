//! 8-bit CIE L*a*b* planes used while equalizing luminance.
//!
//! The encoding follows the usual 8-bit convention: `L` is scaled from
//! `0..=100` to `0..=255`, `a` and `b` are offset by 128. Conversion assumes
//! sRGB companding and a D65 white point.

use image::{GrayImage, Luma};

use crate::domain::pixel_grid::PixelGrid;

const WHITE_X: f32 = 0.950_456;
const WHITE_Z: f32 = 1.088_754;
const EPSILON: f32 = 0.008_856;
const KAPPA: f32 = 903.3;

/// Owned L, a and b planes with the dimensions of the grid they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabGrid {
    lightness: GrayImage,
    a: GrayImage,
    b: GrayImage,
}

impl LabGrid {
    pub fn from_pixels(grid: &PixelGrid) -> Self {
        let (width, height) = grid.dimensions();
        let mut lightness = GrayImage::new(width, height);
        let mut a = GrayImage::new(width, height);
        let mut b = GrayImage::new(width, height);

        for (x, y, pixel) in grid.as_rgb().enumerate_pixels() {
            let [l8, a8, b8] = rgb_to_lab8(pixel.0);
            lightness.put_pixel(x, y, Luma([l8]));
            a.put_pixel(x, y, Luma([a8]));
            b.put_pixel(x, y, Luma([b8]));
        }

        Self { lightness, a, b }
    }

    pub fn lightness_mut(&mut self) -> &mut GrayImage {
        &mut self.lightness
    }

    /// Converts back to RGB, overwriting `grid` in place. `grid` must be the
    /// grid this value was built from (or one of the same size).
    pub fn write_into(&self, grid: &mut PixelGrid) {
        debug_assert_eq!(grid.dimensions(), self.lightness.dimensions());
        let planes = self
            .lightness
            .as_raw()
            .iter()
            .zip(self.a.as_raw())
            .zip(self.b.as_raw());
        for (rgb, ((l, a), b)) in grid.samples_mut().chunks_exact_mut(3).zip(planes) {
            rgb.copy_from_slice(&lab8_to_rgb([*l, *a, *b]));
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn lab_f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(f: f32) -> f32 {
    let cube = f * f * f;
    if cube > EPSILON {
        cube
    } else {
        (f - 16.0 / 116.0) / 7.787
    }
}

fn saturate(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

pub fn rgb_to_lab8([r, g, b]: [u8; 3]) -> [u8; 3] {
    let r = srgb_to_linear(f32::from(r) / 255.0);
    let g = srgb_to_linear(f32::from(g) / 255.0);
    let b = srgb_to_linear(f32::from(b) / 255.0);

    let x = (0.412_453 * r + 0.357_580 * g + 0.180_423 * b) / WHITE_X;
    let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
    let z = (0.019_334 * r + 0.119_193 * g + 0.950_227 * b) / WHITE_Z;

    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
    let l = if y > EPSILON { 116.0 * fy - 16.0 } else { KAPPA * y };

    [
        saturate(l * 255.0 / 100.0),
        saturate(500.0 * (fx - fy) + 128.0),
        saturate(200.0 * (fy - fz) + 128.0),
    ]
}

pub fn lab8_to_rgb([l8, a8, b8]: [u8; 3]) -> [u8; 3] {
    let l = f32::from(l8) * 100.0 / 255.0;
    let a = f32::from(a8) - 128.0;
    let b = f32::from(b8) - 128.0;

    let fy = (l + 16.0) / 116.0;
    let y = if l > KAPPA * EPSILON { fy * fy * fy } else { l / KAPPA };
    let x = lab_f_inv(fy + a / 500.0) * WHITE_X;
    let z = lab_f_inv(fy - b / 200.0) * WHITE_Z;

    let r = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let g = -0.969_256 * x + 1.875_991 * y + 0.041_556 * z;
    let bl = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;

    [r, g, bl].map(|c| saturate(linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0))
}
