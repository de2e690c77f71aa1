use crate::domain::clahe::Clahe;
use crate::domain::color_space::LabGrid;
use crate::domain::gaussian::GaussianKernel;
use crate::domain::phase::Phase;
use crate::domain::pixel_grid::PixelGrid;

pub const CLAHE_CLIP_LIMIT: f32 = 3.0;
pub const CLAHE_TILE_GRID: (u32, u32) = (8, 8);
pub const BLUR_KERNEL_SIZE: usize = 15;

/// Routes the grid to the transform for `phase`. Output dimensions always
/// match the input.
pub fn apply_phase(phase: Phase, grid: PixelGrid) -> PixelGrid {
    match phase {
        Phase::Arterial => enhance_contrast(grid),
        Phase::Venous => smooth(grid),
    }
}

/// Arterial look: CLAHE on the L channel of L*a*b*, chroma untouched.
pub fn enhance_contrast(mut grid: PixelGrid) -> PixelGrid {
    let mut lab = LabGrid::from_pixels(&grid);
    Clahe::new(CLAHE_CLIP_LIMIT, CLAHE_TILE_GRID.0, CLAHE_TILE_GRID.1).apply(lab.lightness_mut());
    lab.write_into(&mut grid);
    grid
}

/// Venous look: 15x15 Gaussian blur.
pub fn smooth(mut grid: PixelGrid) -> PixelGrid {
    GaussianKernel::from_size(BLUR_KERNEL_SIZE).apply(&mut grid);
    grid
}
