/// A bounded 2D grid stored row-major. Unlike a world map this grid never
/// wraps: lookups outside `[0, width) x [0, height)` yield `None`.
#[derive(Clone, Debug)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

/// Integer tile coordinate on the grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TileCoord {
    pub tx: usize,
    pub ty: usize,
}

impl TileCoord {
    pub fn new(tx: usize, ty: usize) -> Self {
        Self { tx, ty }
    }

    /// Offset this coordinate, returning `None` if it would go negative.
    pub fn offset(&self, dx: i32, dy: i32) -> Option<TileCoord> {
        let x = self.tx as i64 + dx as i64;
        let y = self.ty as i64 + dy as i64;
        if x < 0 || y < 0 {
            return None;
        }
        Some(TileCoord::new(x as usize, y as usize))
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({},{})", self.tx, self.ty)
    }
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
}

impl<T> Tilemap<T> {
    /// Build a grid by calling `f(x, y)` for every cell in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Get a cell. Panics when out of bounds; use [`Tilemap::try_get`] for
    /// lookups that may fall off the grid.
    pub fn get(&self, x: usize, y: usize) -> &T {
        let idx = self.index(x, y);
        &self.data[idx]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    /// Bounds-checked lookup with signed coordinates.
    pub fn try_get(&self, x: i64, y: i64) -> Option<&T> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(&self.data[self.index(x as usize, y as usize)])
    }

    pub fn try_get_mut(&mut self, x: i64, y: i64) -> Option<&mut T> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let idx = self.index(x as usize, y as usize);
        Some(&mut self.data[idx])
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            (idx % width, idx / width, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            (idx % width, idx / width, val)
        })
    }

    /// Map every cell into a new grid of the same size.
    pub fn map<U>(&self, mut f: impl FnMut(usize, usize, &T) -> U) -> Tilemap<U> {
        let data = self.iter().map(|(x, y, v)| f(x, y, v)).collect();
        Tilemap {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_get_out_of_bounds_is_none() {
        let map = Tilemap::new_with(3, 2, 7u8);
        assert_eq!(map.try_get(0, 0), Some(&7));
        assert_eq!(map.try_get(2, 1), Some(&7));
        assert_eq!(map.try_get(-1, 0), None);
        assert_eq!(map.try_get(3, 0), None);
        assert_eq!(map.try_get(0, 2), None);
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let map = Tilemap::from_fn(3, 2, |x, y| x + y * 10);
        assert_eq!(*map.get(2, 0), 2);
        assert_eq!(*map.get(1, 1), 11);
        let order: Vec<usize> = map.iter().map(|(_, _, v)| *v).collect();
        assert_eq!(order, vec![0, 1, 2, 10, 11, 12]);
    }

    #[test]
    fn test_coord_offset() {
        let c = TileCoord::new(0, 3);
        assert_eq!(c.offset(-1, 0), None);
        assert_eq!(c.offset(1, -1), Some(TileCoord::new(1, 2)));
    }
}
