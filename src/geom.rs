//! Polygons and the regions built out of them.

use kurbo::{BezPath, Point, Rect};

/// A closed polygon.
///
/// The closing edge from the last point back to the first one is implicit: the
/// first point is *not* repeated at the end.
#[derive(Clone, PartialEq)]
pub struct Polygon {
    points: Vec<Point>,
}

/// The visible area of a shape: a set of polygons, interpreted with the
/// even-odd fill rule.
///
/// After flattening, the polygons of a region come straight from the geometry
/// kernel, so a region with a hole shows up as an outer polygon plus an inner
/// polygon for the hole.
pub type Region = Vec<Polygon>;

impl std::fmt::Debug for Polygon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.points.iter().map(|p| (p.x, p.y)))
            .finish()
    }
}

impl Polygon {
    /// Creates a polygon from its points, without any validation.
    ///
    /// If the first point is repeated at the end, the repetition is dropped.
    pub fn new(mut points: Vec<Point>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Polygon { points }
    }

    pub(crate) fn from_samples(points: Vec<Point>) -> Self {
        Polygon { points }
    }

    /// The points of this polygon, in order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The number of points (which is also the number of edges).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Do we have no points at all?
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The signed area, positive for counter-clockwise polygons in a y-up
    /// coordinate system.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        let mut sum = 0.0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            sum += p.x * q.y - q.x * p.y;
        }
        sum / 2.0
    }

    /// The unsigned area enclosed by this polygon.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// The smallest axis-aligned rectangle containing all our points.
    pub fn bounding_box(&self) -> Rect {
        let mut points = self.points.iter();
        let Some(first) = points.next() else {
            return Rect::ZERO;
        };
        points.fold(Rect::from_points(*first, *first), |rect, p| {
            rect.union_pt(*p)
        })
    }

    /// Are all the coordinates finite?
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }

    /// Converts this polygon to a closed path of line segments.
    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut points = self.points.iter();
        if let Some(p) = points.next() {
            path.move_to(*p);
            for q in points {
                path.line_to(*q);
            }
            path.close_path();
        }
        path
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Polygon::new(points)
    }
}

/// The area of a region under the even-odd rule, assuming that its polygons
/// don't cross one another.
///
/// Holes are counted negatively by nesting depth, which is what the even-odd rule
/// gives for properly nested polygons.
pub fn region_area(region: &[Polygon]) -> f64 {
    let mut area = 0.0;
    for (i, poly) in region.iter().enumerate() {
        let Some(inside) = interior_point(poly) else {
            continue;
        };
        let depth = region
            .iter()
            .enumerate()
            .filter(|(j, other)| *j != i && contains(other, inside))
            .count();
        if depth % 2 == 0 {
            area += poly.area();
        } else {
            area -= poly.area();
        }
    }
    area
}

/// Even-odd point-in-polygon test.
pub fn contains(poly: &Polygon, p: Point) -> bool {
    let pts = poly.points();
    let n = pts.len();
    let mut inside = false;
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

// A point just inside `poly`, next to the midpoint of its first non-degenerate edge.
//
// Used only to decide the nesting of non-crossing polygons, so it's enough that the
// point is closer to this polygon than to any other one.
fn interior_point(poly: &Polygon) -> Option<Point> {
    let pts = poly.points();
    let n = pts.len();
    if n < 3 {
        return None;
    }
    let sign = poly.signed_area().signum();
    let bbox = poly.bounding_box();
    let scale = bbox.width().max(bbox.height());
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        let d = b - a;
        let len = d.hypot();
        if len == 0.0 {
            continue;
        }
        // For a counter-clockwise polygon, the interior is to the left of each edge.
        let normal = kurbo::Vec2::new(-d.y, d.x) * (sign / len);
        let inside = a.midpoint(b) + normal * (scale * 1e-6).min(len * 1e-3);
        if contains(poly, inside) {
            return Some(inside);
        }
    }
    None
}
