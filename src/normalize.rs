//! Turning input primitives into polygons.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use kurbo::Point;

use crate::geom::{Polygon, Region};

/// The number of points that an ellipse gets sampled at.
pub const ELLIPSE_SAMPLES: usize = 50;

/// An axis-aligned ellipse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipse {
    /// Horizontal coordinate of the center.
    pub cx: f64,
    /// Vertical coordinate of the center.
    pub cy: f64,
    /// Horizontal radius.
    pub rx: f64,
    /// Vertical radius.
    pub ry: f64,
}

impl Ellipse {
    /// A circle is an ellipse with equal radii.
    pub fn circle(cx: f64, cy: f64, r: f64) -> Self {
        Ellipse { cx, cy, rx: r, ry: r }
    }

    /// Samples the ellipse at [`ELLIPSE_SAMPLES`] equally spaced angles, starting
    /// from angle zero.
    ///
    /// This does no validation; see [`Primitive::normalize`] for that.
    pub fn to_polygon(&self) -> Polygon {
        let points = (0..ELLIPSE_SAMPLES)
            .map(|i| {
                let theta = TAU * i as f64 / ELLIPSE_SAMPLES as f64;
                Point::new(
                    self.cx + self.rx * theta.cos(),
                    self.cy + self.ry * theta.sin(),
                )
            })
            .collect();
        // Don't go through `Polygon::new`: a degenerate ellipse might have
        // matching first and last points and we want to keep all the samples.
        Polygon::from_samples(points)
    }
}

/// A drawing primitive, as handed over by the parser.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// A freeform closed contour, taken verbatim.
    Contour(Vec<Point>),
    /// Several closed contours making up one shape, filled with the even-odd rule.
    ///
    /// This is what you get from a path with more than one subpath, like a ring.
    Compound(Vec<Vec<Point>>),
    /// An ellipse, which gets tessellated.
    Ellipse(Ellipse),
}

/// Reasons for rejecting a primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InvalidGeometry {
    /// Some coordinate (or radius) was infinite or NaN.
    NonFinite,
    /// A contour had fewer than three points. The payload is the number of points it had.
    TooFewPoints(usize),
    /// An ellipse had a zero or negative radius.
    NonPositiveRadius {
        /// The horizontal radius.
        rx: f64,
        /// The vertical radius.
        ry: f64,
    },
    /// A compound primitive had no contours at all.
    EmptyCompound,
}

impl std::fmt::Display for InvalidGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidGeometry::NonFinite => write!(f, "a coordinate was not finite"),
            InvalidGeometry::TooFewPoints(n) => {
                write!(f, "a contour had {n} points, but at least 3 are needed")
            }
            InvalidGeometry::NonPositiveRadius { rx, ry } => {
                write!(f, "ellipse radii must be positive, got ({rx}, {ry})")
            }
            InvalidGeometry::EmptyCompound => write!(f, "a compound shape had no contours"),
        }
    }
}

impl std::error::Error for InvalidGeometry {}

fn contour_to_polygon(points: &[Point]) -> Result<Polygon, InvalidGeometry> {
    let poly = Polygon::new(points.to_vec());
    if !poly.is_finite() {
        return Err(InvalidGeometry::NonFinite);
    }
    if poly.len() < 3 {
        return Err(InvalidGeometry::TooFewPoints(poly.len()));
    }
    Ok(poly)
}

impl Primitive {
    /// Converts this primitive to the polygons that make up its initial region.
    ///
    /// Contours and ellipses always produce exactly one polygon; compound
    /// primitives produce one polygon per contour.
    pub fn normalize(&self) -> Result<Region, InvalidGeometry> {
        match self {
            Primitive::Contour(points) => Ok(vec![contour_to_polygon(points)?]),
            Primitive::Compound(contours) => {
                if contours.is_empty() {
                    return Err(InvalidGeometry::EmptyCompound);
                }
                contours.iter().map(|c| contour_to_polygon(c)).collect()
            }
            Primitive::Ellipse(e) => {
                if ![e.cx, e.cy, e.rx, e.ry].iter().all(|x| x.is_finite()) {
                    return Err(InvalidGeometry::NonFinite);
                }
                if e.rx <= 0.0 || e.ry <= 0.0 {
                    return Err(InvalidGeometry::NonPositiveRadius { rx: e.rx, ry: e.ry });
                }
                Ok(vec![e.to_polygon()])
            }
        }
    }
}

/// Opaque per-shape attributes, carried through flattening untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<String, String>,
}

impl Metadata {
    /// Creates empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only the attributes that survive flattening: `style`, `id`, and
    /// anything namespaced (like `inkscape:label`).
    ///
    /// Everything else (notably geometry attributes like `d` or `cx`) describes
    /// the input shape and would be wrong on the output.
    pub fn whitelisted<K, V>(attrs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        attrs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| Metadata::is_whitelisted(k))
            .collect()
    }

    /// Does this attribute name survive [`Metadata::whitelisted`]?
    pub fn is_whitelisted(key: &str) -> bool {
        key == "style" || key == "id" || key.contains(':')
    }

    /// Sets an attribute, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Looks up an attribute.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterates over attributes, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Do we have no attributes?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Metadata {
            entries: iter.into_iter().collect(),
        }
    }
}

/// One shape of the input drawing: its geometry and its metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct InputShape {
    /// The geometry.
    pub primitive: Primitive,
    /// Attributes to copy onto every output record derived from this shape.
    pub metadata: Metadata,
}

impl InputShape {
    /// A shape with no metadata.
    pub fn new(primitive: Primitive) -> Self {
        InputShape {
            primitive,
            metadata: Metadata::default(),
        }
    }

    /// Attaches metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn ellipse_sampling() {
        let e = Ellipse {
            cx: 0.0,
            cy: 0.0,
            rx: 10.0,
            ry: 5.0,
        };
        let region = Primitive::Ellipse(e).normalize().unwrap();
        assert_eq!(region.len(), 1);
        let poly = &region[0];
        assert_eq!(poly.len(), 50);
        for p in poly.points() {
            assert!((-10.0..=10.0).contains(&p.x), "{p:?}");
            assert!((-5.0..=5.0).contains(&p.y), "{p:?}");
        }
        assert_eq!(poly.points()[0], Point::new(10.0, 0.0));
        // The 50-gon inscribed in the ellipse is a little smaller than it.
        let exact = std::f64::consts::PI * 50.0;
        assert!(poly.area() < exact);
        assert!(poly.area() > exact * 0.99);
    }

    #[test]
    fn contour_is_verbatim() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 1.0),
            Point::new(1.0, 2.0),
        ];
        let region = Primitive::Contour(points.clone()).normalize().unwrap();
        assert_eq!(region, vec![Polygon::new(points)]);
    }

    #[test]
    fn compound_keeps_every_contour() {
        let outer = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        let inner = vec![
            Point::new(1.0, 1.0),
            Point::new(2.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(1.0, 2.0),
        ];
        let region = Primitive::Compound(vec![outer, inner]).normalize().unwrap();
        assert_eq!(region.len(), 2);
        assert!((crate::geom::region_area(&region) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_primitives() {
        let bad_radius = Primitive::Ellipse(Ellipse::circle(0.0, 0.0, 0.0));
        assert_matches!(
            bad_radius.normalize(),
            Err(InvalidGeometry::NonPositiveRadius { .. })
        );

        let negative = Primitive::Ellipse(Ellipse {
            cx: 0.0,
            cy: 0.0,
            rx: 1.0,
            ry: -1.0,
        });
        assert_matches!(
            negative.normalize(),
            Err(InvalidGeometry::NonPositiveRadius { rx, ry }) if rx == 1.0 && ry == -1.0
        );

        let nan = Primitive::Ellipse(Ellipse::circle(f64::NAN, 0.0, 1.0));
        assert_matches!(nan.normalize(), Err(InvalidGeometry::NonFinite));

        let line = Primitive::Contour(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert_matches!(line.normalize(), Err(InvalidGeometry::TooFewPoints(2)));

        // A triangle with its first point repeated is still only a triangle, but
        // two points plus a repetition is not.
        let closed_line = Primitive::Contour(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
        ]);
        assert_matches!(closed_line.normalize(), Err(InvalidGeometry::TooFewPoints(2)));

        let infinite = Primitive::Contour(vec![
            Point::new(0.0, 0.0),
            Point::new(f64::INFINITY, 0.0),
            Point::new(0.0, 1.0),
        ]);
        assert_matches!(infinite.normalize(), Err(InvalidGeometry::NonFinite));

        assert_matches!(
            Primitive::Compound(vec![]).normalize(),
            Err(InvalidGeometry::EmptyCompound)
        );
    }

    #[test]
    fn whitelist() {
        let meta = Metadata::whitelisted([
            ("id", "petal"),
            ("style", "fill:red"),
            ("inkscape:label", "Petal"),
            ("d", "M 0 0 Z"),
            ("cx", "3"),
            ("fill", "blue"),
        ]);
        let keys: Vec<_> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["id", "inkscape:label", "style"]);
        assert_eq!(meta.get("style"), Some("fill:red"));
        assert_eq!(meta.get("fill"), None);
    }
}
