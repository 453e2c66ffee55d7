/*! Load a starting grid from an image file.
Pixels are tiled into `cell_size x cell_size` blocks, one block per
cell; each block's center pixel is matched to the nearest palette
color (`super::nearest_cell`). This is a client-side convenience for
building initial maps, unrelated to the wire protocol.
*/

use ::image::GenericImageView;

use crate::grid::Grid;

/// Load an image from `path` and quantize it into a [`Grid`].
///
/// The resulting grid is `floor(img.width() / cell_size) x
/// floor(img.height() / cell_size)` cells.
///
/// # Errors
///
/// Returns [`crate::Error::Image`] if the file can't be decoded, or if
/// `cell_size` is zero or larger than the image in either dimension
/// (which would produce an empty grid).
pub fn load_grid(path: &std::path::Path, cell_size: u32) -> Result<Grid, crate::Error> {
    let img = ::image::open(path).map_err(|e| crate::Error::image(format!("{e}")))?;
    grid_from_image(&img, cell_size)
}

fn grid_from_image(
    img: &::image::DynamicImage,
    cell_size: u32,
) -> Result<Grid, crate::Error> {
    if cell_size == 0 {
        return Err(crate::Error::image("cell_size must be at least 1"));
    }
    let (iw, ih) = img.dimensions();
    let width = iw / cell_size;
    let height = ih / cell_size;
    if width == 0 || height == 0 {
        return Err(crate::Error::image(format!(
            "image {iw}x{ih} too small for cell_size {cell_size}"
        )));
    }
    let rgb = img.to_rgb8();
    let mut grid = Grid::new(width, height);
    for gy in 0..height {
        for gx in 0..width {
            let px = (gx * cell_size + cell_size / 2).min(iw - 1);
            let py = (gy * cell_size + cell_size / 2).min(ih - 1);
            let p = rgb.get_pixel(px, py);
            let cell = super::nearest_cell([p[0], p[1], p[2]]);
            grid.set(gx, gy, cell);
        }
    }
    Ok(grid)
}
