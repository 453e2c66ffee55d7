/*! Adapters between Wireworld grids and the outside world: loading a
starting map from an image, and displaying decoded frames. Neither is
part of the wire protocol; both are client-side conveniences.
*/

pub mod display;
pub mod image;

/// The four cell states' canonical RGB colors, in the order cell bits
/// encode them (`Insulator`, `Wire`, `Head`, `Tail`).
pub const PALETTE: [(crate::cell::Cell, [u8; 3]); 4] = [
    (crate::cell::Cell::Insulator, [0, 0, 0]),
    (crate::cell::Cell::Wire, [255, 170, 0]),
    (crate::cell::Cell::Head, [0, 102, 255]),
    (crate::cell::Cell::Tail, [255, 0, 0]),
];

/// Find the palette entry closest to `rgb` by Manhattan distance, ties
/// broken by palette order.
#[must_use]
pub fn nearest_cell(rgb: [u8; 3]) -> crate::cell::Cell {
    PALETTE
        .iter()
        .min_by_key(|(_, color)| {
            color
                .iter()
                .zip(rgb.iter())
                .map(|(a, b)| (*a as i32 - *b as i32).unsigned_abs())
                .sum::<u32>()
        })
        .map(|(cell, _)| *cell)
        .expect("PALETTE is non-empty")
}

/// The palette color for a cell state.
#[must_use]
pub fn color_for(cell: crate::cell::Cell) -> [u8; 3] {
    PALETTE
        .iter()
        .find(|(c, _)| *c == cell)
        .map(|(_, color)| *color)
        .expect("every Cell variant has a PALETTE entry")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn nearest_cell_picks_exact_matches() {
        assert_eq!(nearest_cell([0, 0, 0]), Cell::Insulator);
        assert_eq!(nearest_cell([255, 170, 0]), Cell::Wire);
        assert_eq!(nearest_cell([0, 102, 255]), Cell::Head);
        assert_eq!(nearest_cell([255, 0, 0]), Cell::Tail);
    }

    #[test]
    fn nearest_cell_picks_closest_on_noisy_input() {
        assert_eq!(nearest_cell([250, 5, 5]), Cell::Tail);
        assert_eq!(nearest_cell([10, 10, 10]), Cell::Insulator);
    }

    #[test]
    fn color_roundtrips_through_nearest_cell() {
        for (cell, color) in PALETTE {
            assert_eq!(nearest_cell(color), cell);
            assert_eq!(color_for(cell), color);
        }
    }
}
