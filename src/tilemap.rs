/// A dense 2D grid stored as a flat row-major buffer (`y * width + x`).
///
/// The grid does not wrap; every region and chunk is a
/// bounded window onto an unbounded plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Fill the entire map with a value.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> Tilemap<T> {
    /// Wrap an existing row-major buffer.
    ///
    /// Returns `None` when the buffer length does not match `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self { width, height, data })
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "tile ({}, {}) out of bounds", x, y);
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Bounds-checked lookup for signed coordinates.
    pub fn try_get(&self, x: i64, y: i64) -> Option<&T> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(&self.data[y as usize * self.width + x as usize])
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn same_size<U>(&self, other: &Tilemap<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw row-major cells.
    pub fn values(&self) -> &[T] {
        &self.data
    }

    /// One row of cells.
    pub fn row(&self, y: usize) -> &[T] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Mutable row slices, in order. Rows are disjoint so they can be handed to
    /// separate workers.
    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, T> {
        self.data.chunks_exact_mut(self.width.max(1))
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl Tilemap<f32> {
    /// Minimum and maximum cell value, or `None` for an empty map.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        if self.data.is_empty() {
            return None;
        }
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &v in &self.data {
            if v < min { min = v; }
            if v > max { max = v; }
        }
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_layout() {
        let mut map = Tilemap::new_with(3, 2, 0u8);
        map.set(2, 1, 7);
        assert_eq!(map.values()[1 * 3 + 2], 7);
        assert_eq!(*map.get(2, 1), 7);
        assert_eq!(map.row(1), &[0, 0, 7]);
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(Tilemap::from_vec(2, 2, vec![1, 2, 3]).is_none());
        let map = Tilemap::from_vec(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(*map.get(1, 1), 4);
    }

    #[test]
    fn test_try_get_outside_is_none() {
        let map = Tilemap::new_with(4, 4, 1.0f32);
        assert!(map.try_get(-1, 0).is_none());
        assert!(map.try_get(4, 0).is_none());
        assert_eq!(map.try_get(3, 3), Some(&1.0));
    }

    #[test]
    fn test_min_max() {
        let map = Tilemap::from_vec(2, 2, vec![0.5f32, -1.0, 2.0, 0.0]).unwrap();
        assert_eq!(map.min_max(), Some((-1.0, 2.0)));
        let empty: Tilemap<f32> = Tilemap::new(0, 0);
        assert_eq!(empty.min_max(), None);
    }

    #[test]
    fn test_iter_coordinates() {
        let map = Tilemap::from_vec(2, 2, vec!['a', 'b', 'c', 'd']).unwrap();
        let cells: Vec<_> = map.iter().map(|(x, y, c)| (x, y, *c)).collect();
        assert_eq!(cells, vec![(0, 0, 'a'), (1, 0, 'b'), (0, 1, 'c'), (1, 1, 'd')]);
    }
}
