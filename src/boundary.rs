use nalgebra::{Point3, Vector3};

const MIN_EXTENT: f32 = 50.0;

/// Shape of the simulated volume, chosen at construction. Adding a shape is
/// a variant addition; every variant is a prism along z (the layer axis).
#[derive(Clone, Debug)]
pub enum BoundaryShape {
    Rectangle { width: f32, depth: f32, height: f32 },
    Cylinder { radius: f32, height: f32 },
    PolygonPrism { sides: usize, radius: f32, height: f32 },
}

/// The simulated volume: a containment predicate plus the manager surface
/// around it (enable/disable, outline, pre-lock resizing).
///
/// Owned by the simulation core; collaborators borrow it read-only. Once
/// [`Boundary::lock_size`] is called the shape is frozen for the run and a
/// clone can cross threads without synchronization.
#[derive(Clone, Debug)]
pub struct Boundary {
    shape: BoundaryShape,
    center: Point3<f32>,
    enabled: bool,
    visible: bool,
    resizable: bool,
}

impl Default for Boundary {
    fn default() -> Self {
        Self::new(
            BoundaryShape::Rectangle {
                width: 700.0,
                depth: 700.0,
                height: 50.0,
            },
            Point3::origin(),
        )
    }
}

impl Boundary {
    pub fn new(shape: BoundaryShape, center: Point3<f32>) -> Self {
        Self {
            shape,
            center,
            enabled: true,
            visible: true,
            resizable: true,
        }
    }

    /// A disabled boundary accepts every point.
    pub fn contains(&self, point: &Point3<f32>) -> bool {
        if !self.enabled {
            return true;
        }

        let d = point - self.center;
        match self.shape {
            BoundaryShape::Rectangle {
                width,
                depth,
                height,
            } => {
                d.x.abs() <= width / 2.0 && d.y.abs() <= depth / 2.0 && d.z.abs() <= height / 2.0
            }
            BoundaryShape::Cylinder { radius, height } => {
                d.x * d.x + d.y * d.y <= radius * radius && d.z.abs() <= height / 2.0
            }
            BoundaryShape::PolygonPrism {
                sides,
                radius,
                height,
            } => d.z.abs() <= height / 2.0 && polygon_contains(sides, radius, d.x, d.y),
        }
    }

    pub fn lock_size(&mut self) {
        self.resizable = false;
    }

    pub fn can_resize(&self) -> bool {
        self.resizable
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn center(&self) -> Point3<f32> {
        self.center
    }

    pub fn width(&self) -> f32 {
        match self.shape {
            BoundaryShape::Rectangle { width, .. } => width,
            BoundaryShape::Cylinder { radius, .. }
            | BoundaryShape::PolygonPrism { radius, .. } => radius * 2.0,
        }
    }

    pub fn depth(&self) -> f32 {
        match self.shape {
            BoundaryShape::Rectangle { depth, .. } => depth,
            BoundaryShape::Cylinder { radius, .. }
            | BoundaryShape::PolygonPrism { radius, .. } => radius * 2.0,
        }
    }

    pub fn height(&self) -> f32 {
        match self.shape {
            BoundaryShape::Rectangle { height, .. }
            | BoundaryShape::Cylinder { height, .. }
            | BoundaryShape::PolygonPrism { height, .. } => height,
        }
    }

    /// World-space box enclosing the volume, used to size a dense index.
    pub fn aabb(&self) -> (Point3<f32>, Point3<f32>) {
        let half = Vector3::new(
            self.width() / 2.0,
            self.depth() / 2.0,
            self.height() / 2.0,
        );
        (self.center - half, self.center + half)
    }

    pub fn set_width(&mut self, value: f32) {
        if !self.resizable {
            return;
        }
        let value = value.max(MIN_EXTENT);
        match &mut self.shape {
            BoundaryShape::Rectangle { width, .. } => *width = value,
            BoundaryShape::Cylinder { radius, .. }
            | BoundaryShape::PolygonPrism { radius, .. } => *radius = value / 2.0,
        }
    }

    pub fn set_depth(&mut self, value: f32) {
        if !self.resizable {
            return;
        }
        let value = value.max(MIN_EXTENT);
        match &mut self.shape {
            BoundaryShape::Rectangle { depth, .. } => *depth = value,
            BoundaryShape::Cylinder { radius, .. }
            | BoundaryShape::PolygonPrism { radius, .. } => *radius = value / 2.0,
        }
    }

    pub fn set_height(&mut self, value: f32) {
        if !self.resizable {
            return;
        }
        let value = value.max(MIN_EXTENT / 2.0);
        match &mut self.shape {
            BoundaryShape::Rectangle { height, .. }
            | BoundaryShape::Cylinder { height, .. }
            | BoundaryShape::PolygonPrism { height, .. } => *height = value,
        }
    }

    /// Outline as world-space line segments for the renderer. Empty when
    /// the boundary is hidden or disabled.
    pub fn wireframe_outline(&self) -> Vec<[Point3<f32>; 2]> {
        if !self.visible || !self.enabled {
            return Vec::new();
        }

        match self.shape {
            BoundaryShape::Rectangle {
                width,
                depth,
                height,
            } => {
                let ring = [
                    (-width / 2.0, -depth / 2.0),
                    (width / 2.0, -depth / 2.0),
                    (width / 2.0, depth / 2.0),
                    (-width / 2.0, depth / 2.0),
                ];
                self.prism_outline(&ring, height)
            }
            BoundaryShape::Cylinder { radius, height } => {
                self.prism_outline(&ring_points(24, radius), height)
            }
            BoundaryShape::PolygonPrism {
                sides,
                radius,
                height,
            } => self.prism_outline(&ring_points(sides, radius), height),
        }
    }

    fn prism_outline(&self, ring: &[(f32, f32)], height: f32) -> Vec<[Point3<f32>; 2]> {
        let mut lines = Vec::with_capacity(ring.len() * 3);
        let at = |x: f32, y: f32, z: f32| {
            Point3::new(self.center.x + x, self.center.y + y, self.center.z + z)
        };

        for (i, &(x0, y0)) in ring.iter().enumerate() {
            let (x1, y1) = ring[(i + 1) % ring.len()];
            lines.push([at(x0, y0, -height / 2.0), at(x1, y1, -height / 2.0)]);
            lines.push([at(x0, y0, height / 2.0), at(x1, y1, height / 2.0)]);
            lines.push([at(x0, y0, -height / 2.0), at(x0, y0, height / 2.0)]);
        }
        lines
    }
}

fn ring_points(sides: usize, radius: f32) -> Vec<(f32, f32)> {
    (0..sides.max(3))
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / sides.max(3) as f32;
            (radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

// convex regular polygon test, vertices counter-clockwise
fn polygon_contains(sides: usize, radius: f32, x: f32, y: f32) -> bool {
    let ring = ring_points(sides, radius);
    for (i, &(x0, y0)) in ring.iter().enumerate() {
        let (x1, y1) = ring[(i + 1) % ring.len()];
        let cross = (x1 - x0) * (y - y0) - (y1 - y0) * (x - x0);
        if cross < 0.0 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_contains() {
        let b = Boundary::new(
            BoundaryShape::Rectangle {
                width: 100.0,
                depth: 60.0,
                height: 20.0,
            },
            Point3::origin(),
        );
        assert!(b.contains(&Point3::new(49.0, 29.0, 9.0)));
        assert!(!b.contains(&Point3::new(51.0, 0.0, 0.0)));
        assert!(!b.contains(&Point3::new(0.0, 0.0, 11.0)));
    }

    #[test]
    fn test_cylinder_contains() {
        let b = Boundary::new(
            BoundaryShape::Cylinder {
                radius: 10.0,
                height: 8.0,
            },
            Point3::new(5.0, 0.0, 0.0),
        );
        assert!(b.contains(&Point3::new(5.0, 9.0, 0.0)));
        assert!(!b.contains(&Point3::new(5.0, 11.0, 0.0)));
        assert!(!b.contains(&Point3::new(5.0, 0.0, 5.0)));
    }

    #[test]
    fn test_polygon_prism_contains() {
        let b = Boundary::new(
            BoundaryShape::PolygonPrism {
                sides: 6,
                radius: 10.0,
                height: 10.0,
            },
            Point3::origin(),
        );
        assert!(b.contains(&Point3::origin()));
        // a hexagon vertex lies on the circumcircle; beyond it is outside
        assert!(!b.contains(&Point3::new(10.5, 0.0, 0.0)));
        // edge midpoints are at the apothem, inside the circumradius
        assert!(b.contains(&Point3::new(0.0, 8.0, 0.0)));
    }

    #[test]
    fn test_disabled_accepts_everything() {
        let mut b = Boundary::default();
        b.set_enabled(false);
        assert!(b.contains(&Point3::new(1.0e6, -1.0e6, 1.0e6)));
    }

    #[test]
    fn test_resize_after_lock_is_noop() {
        let mut b = Boundary::default();
        b.lock_size();
        let w = b.width();
        b.set_width(w + 100.0);
        assert_eq!(b.width(), w);
        assert!(!b.can_resize());
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let mut b = Boundary::default();
        b.set_width(1.0);
        assert_eq!(b.width(), MIN_EXTENT);
    }
}
