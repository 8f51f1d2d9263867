use std::fmt;

/// Chunk coordinate on the horizontal plane.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Default)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

/// Integer block coordinate.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Default)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block cell containing a fractional position.
    pub fn containing(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
            z: z.floor() as i32,
        }
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<(f64, f64, f64)> for BlockPos {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::containing(x, y, z)
    }
}

impl From<[f64; 3]> for BlockPos {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::containing(x, y, z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractional_positions_floor() {
        assert_eq!(BlockPos::from((1.9, 64.0, -0.5)), BlockPos::new(1, 64, -1));
        assert_eq!(BlockPos::from([-3.0, 0.99, 7.5]), BlockPos::new(-3, 0, 7));
    }
}
