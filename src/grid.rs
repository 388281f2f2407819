use rayon::prelude::*;
use rayon::slice::Chunks;

/// One sample per pixel, row-major, row 0 at the top of the surface.
#[derive(Clone, Debug)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub w: usize,
    pub h: usize,
}

impl<T: Copy + Default + Send> Grid<T> {
    /// Fill every cell from `f(x, y)`, one rayon task per row.
    pub fn from_fn_par<F>(w: usize, h: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> T + Sync,
    {
        let mut data = vec![T::default(); w * h];
        if w > 0 {
            data.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = f(x, y);
                }
            });
        }
        Self { data, w, h }
    }
}

impl<T: Sync> Grid<T> {
    /// Rows top to bottom as a parallel iterator. Empty for a zero-width grid.
    pub fn par_rows(&self) -> Chunks<'_, T> {
        self.data.par_chunks(self.w.max(1))
    }
}
