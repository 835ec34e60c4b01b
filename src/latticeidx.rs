use nalgebra::Point3;

/// In-layer spacing between square-face neighbors.
pub const SQUARE_DISTANCE: f32 = 2.0 * 2.82842712475;
/// Euclidean distance to a hexagon-face neighbor across one layer.
pub const HEXAGON_DISTANCE: f32 = SQUARE_DISTANCE * 0.866025404;
/// Spacing between consecutive layers along z.
pub const LAYER_DISTANCE: f32 = SQUARE_DISTANCE * 0.5;

pub const NEIGHBOR_COUNT: usize = 14;
const SQUARE_NEIGHBORS: usize = 6;

/// Which face a neighbor slot shares with the center cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Square,
    Hexagon,
}

/// Discrete slot in the packed truncated-octahedron lattice.
///
/// z is the layer axis. Odd layers sit half a cell off in x and y, so a
/// square-face step along z crosses two layers while hexagon-face steps
/// cross one.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LatticeIdx {
    pub idx: [i32; 3],
}

impl LatticeIdx {
    pub fn new(idx: [i32; 3]) -> Self {
        Self { idx }
    }

    pub fn offset(&self, d: [i32; 3]) -> Self {
        Self {
            idx: [
                self.idx[0] + d[0],
                self.idx[1] + d[1],
                self.idx[2] + d[2],
            ],
        }
    }

    pub fn bb_min(&self, other: &Self) -> Self {
        Self {
            idx: [
                self.idx[0].min(other.idx[0]),
                self.idx[1].min(other.idx[1]),
                self.idx[2].min(other.idx[2]),
            ],
        }
    }

    pub fn bb_max(&self, other: &Self) -> Self {
        Self {
            idx: [
                self.idx[0].max(other.idx[0]),
                self.idx[1].max(other.idx[1]),
                self.idx[2].max(other.idx[2]),
            ],
        }
    }

    fn layer_is_odd(&self) -> bool {
        self.idx[2] % 2 != 0
    }
}

impl From<[i32; 3]> for LatticeIdx {
    fn from(idx: [i32; 3]) -> Self {
        Self { idx }
    }
}

impl std::ops::Index<usize> for LatticeIdx {
    type Output = i32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.idx[index]
    }
}

fn layer_offset(z: i32) -> f32 {
    if z % 2 != 0 {
        SQUARE_DISTANCE * 0.5
    } else {
        0.0
    }
}

/// Project a world position onto its lattice slot.
pub fn to_lattice(pos: &Point3<f32>) -> LatticeIdx {
    let z = (pos.z / LAYER_DISTANCE).round() as i32;
    let off = layer_offset(z);

    let x = ((pos.x - off) / SQUARE_DISTANCE).round() as i32;
    let y = ((pos.y - off) / SQUARE_DISTANCE).round() as i32;
    LatticeIdx::new([x, y, z])
}

/// World-space center of a lattice slot.
pub fn to_world(coord: LatticeIdx) -> Point3<f32> {
    let off = layer_offset(coord.idx[2]);
    Point3::new(
        coord.idx[0] as f32 * SQUARE_DISTANCE + off,
        coord.idx[1] as f32 * SQUARE_DISTANCE + off,
        coord.idx[2] as f32 * LAYER_DISTANCE,
    )
}

/// Snap a world position to the center of its slot.
pub fn snap(pos: &Point3<f32>) -> Point3<f32> {
    to_world(to_lattice(pos))
}

/// The 14 neighbor slots of a coordinate, fixed order: 6 square-face
/// (+x, -x, +y, -y, +z, -z), then 8 hexagon-face, upper layer before lower.
///
/// The hexagon deltas depend on layer parity; the two parity sets are
/// mutually inverse, so the relation is symmetric.
pub fn neighbor_coords(coord: LatticeIdx) -> [LatticeIdx; NEIGHBOR_COUNT] {
    let a = if coord.layer_is_odd() { 1 } else { -1 };

    [
        coord.offset([1, 0, 0]),
        coord.offset([-1, 0, 0]),
        coord.offset([0, 1, 0]),
        coord.offset([0, -1, 0]),
        coord.offset([0, 0, 2]),
        coord.offset([0, 0, -2]),
        coord.offset([0, 0, 1]),
        coord.offset([a, 0, 1]),
        coord.offset([0, a, 1]),
        coord.offset([a, a, 1]),
        coord.offset([0, 0, -1]),
        coord.offset([a, 0, -1]),
        coord.offset([0, a, -1]),
        coord.offset([a, a, -1]),
    ]
}

/// Neighbor slots as world positions, same fixed order as [`neighbor_coords`].
pub fn neighbor_positions(pos: &Point3<f32>) -> [Point3<f32>; NEIGHBOR_COUNT] {
    neighbor_coords(to_lattice(pos)).map(to_world)
}

/// Face type of the n-th entry of [`neighbor_coords`].
pub fn face_of(neighbor_index: usize) -> Face {
    if neighbor_index < SQUARE_NEIGHBORS {
        Face::Square
    } else {
        Face::Hexagon
    }
}
