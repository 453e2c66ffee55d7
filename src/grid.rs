/*! Grid & Rule Engine.

Stores cells in a padded arena (width+2) x (height+2), the outer ring
being a permanent Insulator border that is never read past and never
written to after construction. `step` computes one generation from
`current` into `next`; `DoubleBuffer` owns the pair and swaps them.
*/

use rayon::prelude::*;

use crate::cell::Cell;

/// The eight Moore-neighborhood offsets, `|dx|,|dy| <= 1`, excluding `(0,0)`.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// A rectangular cell grid, padded by one insulator cell on each side.
///
/// Coordinates passed to [`Grid::get`]/[`Grid::set`] are in *interior*
/// (wire) coordinates: `0..width`, `0..height`. The border is addressed
/// only internally, by `get_padded`/`index`.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a new grid of the given interior size, all cells (including
    /// the border) initialized to `Insulator`.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        let padded = (width as usize + 2) * (height as usize + 2);
        Self {
            width,
            height,
            cells: vec![Cell::Insulator; padded],
        }
    }

    /// Build a grid from a row-major (x fastest) sequence of interior
    /// cells, the order `codec::unpack` produces.
    ///
    /// # Panics
    ///
    /// Panics if `cells.len() != width * height`.
    #[must_use]
    pub fn from_row_major(width: u32, height: u32, cells: &[Cell]) -> Self {
        assert_eq!(cells.len(), (width as usize) * (height as usize));
        let mut grid = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                grid.set(x, y, cells[(y * width + x) as usize]);
            }
        }
        grid
    }

    /// Interior width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Interior height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    fn padded_width(&self) -> u32 {
        self.width + 2
    }

    fn index(&self, px: u32, py: u32) -> usize {
        (py * self.padded_width() + px) as usize
    }

    /// Read a cell by padded (arena) coordinates: `0..=width+1`, `0..=height+1`.
    fn get_padded(&self, px: u32, py: u32) -> Cell {
        self.cells[self.index(px, py)]
    }

    /// Read an interior cell. `x < width`, `y < height`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Cell {
        debug_assert!(x < self.width && y < self.height);
        self.get_padded(x + 1, y + 1)
    }

    /// Write an interior cell. `x < width`, `y < height`.
    pub fn set(&mut self, x: u32, y: u32, cell: Cell) {
        debug_assert!(x < self.width && y < self.height);
        let idx = self.index(x + 1, y + 1);
        self.cells[idx] = cell;
    }

    /// Iterate interior cells row-major, x varying fastest — the order the
    /// wire format and [`crate::codec`] use.
    pub fn iter_row_major(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| self.get(x, y)))
    }
}

fn apply_rule(current: &Grid, px: u32, py: u32) -> Cell {
    match current.get_padded(px, py) {
        Cell::Insulator => Cell::Insulator,
        Cell::Head => Cell::Tail,
        Cell::Tail => Cell::Wire,
        Cell::Wire => {
            let heads = NEIGHBOR_OFFSETS
                .iter()
                .filter(|(dx, dy)| {
                    let nx = (px as i32 + dx) as u32;
                    let ny = (py as i32 + dy) as u32;
                    current.get_padded(nx, ny) == Cell::Head
                })
                .count();
            if heads == 1 || heads == 2 {
                Cell::Head
            } else {
                Cell::Wire
            }
        }
    }
}

/// Compute one generation: read `current`, write a complete next
/// generation into `next`. Must not read `next` nor write `current`.
///
/// Interior rows are updated in parallel with `rayon`, since each row's
/// write target is disjoint from every other row's and all reads target
/// `current` only.
pub fn step(current: &Grid, next: &mut Grid) {
    assert_eq!(current.width, next.width);
    assert_eq!(current.height, next.height);
    let pw = current.padded_width() as usize;
    let height = current.height;
    next.cells
        .par_chunks_mut(pw)
        .enumerate()
        .skip(1)
        .take(height as usize)
        .for_each(|(py, row)| {
            for px in 1..=current.width {
                row[px as usize] = apply_rule(current, px, py as u32);
            }
        });
}

/// A pair of same-shaped grids, one holding the current generation, the
/// other scratch space for the next. `step`/`advance` swap roles after
/// every generation so no reallocation happens per step.
pub struct DoubleBuffer {
    current: Grid,
    next: Grid,
}

impl DoubleBuffer {
    /// Start a double buffer from an initial grid; the scratch buffer is
    /// a same-shaped blank grid.
    #[must_use]
    pub fn from_initial(grid: Grid) -> Self {
        let next = Grid::new(grid.width(), grid.height());
        Self {
            current: grid,
            next,
        }
    }

    /// The current generation.
    #[must_use]
    pub fn current(&self) -> &Grid {
        &self.current
    }

    /// Compute one generation and swap buffer roles.
    pub fn step(&mut self) {
        step(&self.current, &mut self.next);
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Compute `sampling` generations, swapping after each, so exactly
    /// `sampling` generations elapse per call.
    ///
    /// # Panics
    ///
    /// Panics if `sampling` is zero.
    pub fn advance(&mut self, sampling: u32) {
        assert!(sampling > 0, "sampling must be at least 1");
        for _ in 0..sampling {
            self.step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(cells: &[Cell], width: u32, height: u32) -> Grid {
        Grid::from_row_major(width, height, cells)
    }

    #[test]
    fn minimal_wire_oscillates_with_period_3() {
        use Cell::*;
        let mut dbuf = DoubleBuffer::from_initial(grid_from(&[Wire, Head, Wire], 3, 1));

        dbuf.step();
        assert_eq!(
            dbuf.current().iter_row_major().collect::<Vec<_>>(),
            vec![Head, Tail, Head]
        );

        dbuf.step();
        assert_eq!(
            dbuf.current().iter_row_major().collect::<Vec<_>>(),
            vec![Tail, Wire, Tail]
        );

        dbuf.step();
        assert_eq!(
            dbuf.current().iter_row_major().collect::<Vec<_>>(),
            vec![Wire, Head, Wire]
        );
    }

    #[test]
    fn diode_segment_propagates_forward() {
        use Cell::*;
        let mut dbuf =
            DoubleBuffer::from_initial(grid_from(&[Head, Tail, Wire, Wire, Wire], 5, 1));

        dbuf.step();
        assert_eq!(
            dbuf.current().iter_row_major().collect::<Vec<_>>(),
            vec![Tail, Wire, Head, Wire, Wire]
        );

        dbuf.step();
        assert_eq!(
            dbuf.current().iter_row_major().collect::<Vec<_>>(),
            vec![Wire, Wire, Tail, Head, Wire]
        );

        dbuf.step();
        assert_eq!(
            dbuf.current().iter_row_major().collect::<Vec<_>>(),
            vec![Wire, Wire, Wire, Tail, Head]
        );
    }

    #[test]
    fn head_always_decays_to_tail() {
        use Cell::*;
        // A lone Head with no Wire neighbors: should still become Tail.
        let mut dbuf = DoubleBuffer::from_initial(grid_from(
            &[Insulator, Head, Insulator],
            3,
            1,
        ));
        dbuf.step();
        assert_eq!(dbuf.current().get(1, 0), Tail);
    }

    #[test]
    fn insulator_is_invariant() {
        use Cell::*;
        let mut dbuf =
            DoubleBuffer::from_initial(grid_from(&[Head, Insulator, Head], 3, 1));
        dbuf.step();
        assert_eq!(dbuf.current().get(1, 0), Insulator);
    }

    #[test]
    fn wire_to_head_requires_one_or_two_neighbors() {
        use Cell::*;
        // Cross of Wire with varying numbers of Head neighbors.
        // 3x3 grid, center Wire, corners Head (4 corners are diagonal
        // neighbors of the center).
        let cells = vec![
            Head, Insulator, Head, //
            Insulator, Wire, Insulator, //
            Head, Insulator, Head,
        ];
        let mut dbuf = DoubleBuffer::from_initial(grid_from(&cells, 3, 3));
        dbuf.step();
        // 4 Head neighbors -> stays Wire.
        assert_eq!(dbuf.current().get(1, 1), Wire);
    }

    #[test]
    fn advance_runs_exactly_sampling_generations() {
        use Cell::*;
        let mut dbuf = DoubleBuffer::from_initial(grid_from(&[Wire, Head, Wire], 3, 1));
        dbuf.advance(3);
        assert_eq!(
            dbuf.current().iter_row_major().collect::<Vec<_>>(),
            vec![Wire, Head, Wire]
        );
    }

    #[test]
    fn border_never_mutates() {
        use Cell::*;
        // All-wire interior; border stays Insulator regardless of activity.
        let mut dbuf = DoubleBuffer::from_initial(grid_from(
            &[Wire, Wire, Wire, Wire],
            2,
            2,
        ));
        for _ in 0..5 {
            dbuf.step();
        }
        // Indirectly assert via get_padded being unreachable: instead check
        // that a grid built fresh at the same size has Insulator border by
        // construction, and that stepping didn't touch dims/shape.
        assert_eq!(dbuf.current().width(), 2);
        assert_eq!(dbuf.current().height(), 2);
    }
}
