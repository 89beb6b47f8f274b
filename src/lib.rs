#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
pub mod assemble;
pub mod flatten;
mod geom;
pub mod kernel;
pub mod normalize;

pub use assemble::{assemble, OutputRecord};
pub use flatten::{FlattenStats, Rank, Shape, Stack};
pub use geom::{contains, region_area, Polygon, Region};
pub use kernel::{FillRule, GeometryKernel, KernelError, OverlayKernel};
pub use normalize::{Ellipse, InputShape, InvalidGeometry, Metadata, Primitive, ELLIPSE_SAMPLES};

/// Flattening failed.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// One of the input primitives couldn't be turned into a polygon.
    InvalidGeometry {
        /// The position of the offending primitive in the input.
        index: usize,
        /// What was wrong with it.
        reason: InvalidGeometry,
    },
    /// The geometry kernel failed while trimming one shape by another.
    ClippingFailed {
        /// The shape on top, which was being subtracted.
        occluder: Rank,
        /// The shape underneath, which was being trimmed.
        subject: Rank,
        /// The kernel's complaint.
        source: KernelError,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidGeometry { index, reason } => {
                write!(f, "invalid geometry in shape {index}: {reason}")
            }
            Error::ClippingFailed {
                occluder, subject, ..
            } => write!(f, "failed to trim shape of rank {subject} by rank {occluder}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidGeometry { reason, .. } => Some(reason),
            Error::ClippingFailed { source, .. } => Some(source),
        }
    }
}

/// Flattens drawings using a particular geometry kernel.
#[derive(Clone, Debug, Default)]
pub struct Flattener<K = OverlayKernel> {
    kernel: K,
}

impl<K: GeometryKernel> Flattener<K> {
    /// Creates a flattener that does its polygon arithmetic with `kernel`.
    pub fn new(kernel: K) -> Self {
        Flattener { kernel }
    }

    /// Trims every shape of `shapes` (given in document order, bottom first) by
    /// everything painted above it, and returns the visible pieces.
    ///
    /// See [`assemble`] for the order and contents of the output.
    pub fn flatten(&self, shapes: Vec<InputShape>) -> Result<Vec<OutputRecord>, Error> {
        let (stack, _) = self.flatten_stack(shapes)?;
        Ok(assemble(stack))
    }

    /// Like [`Flattener::flatten`], but returns the flattened shapes themselves
    /// instead of one record per polygon.
    pub fn flatten_stack(&self, shapes: Vec<InputShape>) -> Result<(Stack, FlattenStats), Error> {
        Stack::from_drawing(shapes)?.flatten(&self.kernel)
    }
}

/// Flattens a drawing with the default kernel.
///
/// `shapes` are in document order, so the last one is on top.
pub fn flatten_shapes(shapes: Vec<InputShape>) -> Result<Vec<OutputRecord>, Error> {
    Flattener::<OverlayKernel>::default().flatten(shapes)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use kurbo::Point;

    use super::*;

    #[test]
    fn ellipse_under_square() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let mut meta = Metadata::new();
        meta.insert("id", "blob");
        let records = flatten_shapes(vec![
            InputShape::new(Primitive::Ellipse(Ellipse::circle(10.0, 5.0, 3.0)))
                .with_metadata(meta.clone()),
            InputShape::new(Primitive::Contour(square.clone())),
        ])
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rank, Rank(0));
        assert_eq!(records[0].polygon, Polygon::new(square));
        assert_eq!(records[1].metadata, meta);
        // Half of the circle sticks out.
        let area = records[1].polygon.area();
        let half = std::f64::consts::PI * 9.0 / 2.0;
        assert!(area < half && area > half * 0.98, "{area}");
    }

    #[test]
    fn small_occluder_with_min_area() {
        let square = |x: f64, y: f64, size: f64| {
            Primitive::Contour(vec![
                Point::new(x, y),
                Point::new(x + size, y),
                Point::new(x + size, y + size),
                Point::new(x, y + size),
            ])
        };
        // The overlap is smaller than `min_area`, but it still gets cut out.
        let (stack, stats) = Flattener::new(OverlayKernel::with_min_area(1.0))
            .flatten_stack(vec![
                InputShape::new(square(0.0, 0.0, 10.0)),
                InputShape::new(square(4.0, 4.0, 0.5)),
            ])
            .unwrap();
        assert_eq!(stats.trimmed, 1);
        let bottom = &stack[Rank(1)].regions;
        assert_eq!(bottom.len(), 2);
        assert!((region_area(bottom) - 99.75).abs() < 1e-6);
    }

    #[test]
    fn errors_chain() {
        let err = flatten_shapes(vec![InputShape::new(Primitive::Contour(vec![]))]).unwrap_err();
        assert_matches!(
            err,
            Error::InvalidGeometry {
                index: 0,
                reason: InvalidGeometry::TooFewPoints(0)
            }
        );
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("at least 3"));
    }

    #[test]
    fn empty_input() {
        assert!(flatten_shapes(vec![]).unwrap().is_empty());
    }
}
