// src/geometry.rs

// Continuous-plane primitives shared by the obstacle views: distance
// queries against segments and the inflated triangle-inclusion test used
// when rasterizing obstacles onto the occupancy grid.

use log::warn;

/// A point in the continuous plane, meters.
pub type Point = nalgebra::Point2<f64>;
/// A displacement in the continuous plane, meters.
pub type Vector = nalgebra::Vector2<f64>;

/// Tolerance used for geometric equality and arrival tests.
pub const DIST_EPS: f64 = 1e-3;

/// A circular obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Center of the disk
    pub center: Point,
    /// Radius in meters
    pub radius: f64,
}

/// A triangular obstacle. Rectangles are stored as two of these sharing a
/// diagonal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub a: Point,
    /// Second vertex
    pub b: Point,
    /// Third vertex
    pub c: Point,
}

/// Distance from `p` to the infinite line through `a` and `b`.
///
/// Returns the sentinel `-1.0` when `a` and `b` are closer than [`DIST_EPS`]
/// and no line is defined.
pub fn point_line_dist(a: Point, b: Point, p: Point) -> f64 {
    let ab = b - a;
    if ab.norm() < DIST_EPS {
        warn!("degenerate segment in line distance query: {:?} ~ {:?}", a, b);
        return -1.0;
    }
    ab.perp(&(a - p)).abs() / ab.norm()
}

/// Distance from `p` to the segment `a`-`b`.
///
/// Past either endpoint the endpoint distance is used; otherwise the
/// perpendicular line distance.
pub fn point_segment_dist(a: Point, b: Point, p: Point) -> f64 {
    let to_p_from_a = p - a;
    let to_p_from_b = p - b;
    if (b - a).dot(&to_p_from_a) < -DIST_EPS {
        to_p_from_a.norm()
    } else if (a - b).dot(&to_p_from_b) < -DIST_EPS {
        to_p_from_b.norm()
    } else {
        point_line_dist(a, b, p)
    }
}

/// Unsigned area of the triangle with the given vertices.
pub fn triangle_area(a: Point, b: Point, c: Point) -> f64 {
    ((a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y)) / 2.0).abs()
}

impl Triangle {
    /// Whether `p` lies inside the triangle or within `margin` of one of
    /// its edges (segment distance, not line distance).
    ///
    /// The inside test compares the triangle area against the sum of the
    /// three sub-triangle areas at `p`; the margin is what inflates
    /// obstacles to account for the robot body.
    pub fn contains_with_margin(&self, p: Point, margin: f64) -> bool {
        let area = triangle_area(self.a, self.b, self.c);
        let a1 = triangle_area(p, self.b, self.c);
        let a2 = triangle_area(self.a, p, self.c);
        let a3 = triangle_area(self.a, self.b, p);
        if (area - a1 - a2 - a3).abs() < DIST_EPS {
            return true;
        }
        point_segment_dist(self.a, self.b, p) < margin
            || point_segment_dist(self.a, self.c, p) < margin
            || point_segment_dist(self.b, self.c, p) < margin
    }
}
