//! The boolean geometry kernel that flattening is built on.
//!
//! Flattening only needs two operations from a kernel: an overlap test and a
//! set difference. They're abstracted behind [`GeometryKernel`] so that tests
//! can substitute a fake, and so that other polygon clippers can be plugged in.

use i_overlay::core::fill_rule::FillRule as OverlayFillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use kurbo::Point;

use crate::geom::Polygon;

/// A fill rule tells us how to decide whether a point is "inside" a set of polygons.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FillRule {
    /// The point is "inside" if its winding number is odd.
    EvenOdd,
    /// The point is "inside" if its winding number is non-zero.
    NonZero,
}

/// The kernel couldn't handle its input.
#[derive(Clone, Debug, PartialEq)]
pub enum KernelError {
    /// At least one of the inputs was infinite.
    Infinity,
    /// At least one of the inputs was not a number.
    NaN,
    /// Some other kernel-specific failure.
    Failed(String),
}

impl std::fmt::Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::Infinity => write!(f, "one of the inputs was infinite"),
            KernelError::NaN => write!(f, "one of the inputs had a NaN"),
            KernelError::Failed(msg) => write!(f, "geometry kernel failed: {msg}"),
        }
    }
}

impl std::error::Error for KernelError {}

/// Polygon boolean operations.
///
/// Both operands of every operation are sets of polygons, interpreted with a
/// fill rule. Implementations must be pure: the same inputs always give the
/// same answer.
pub trait GeometryKernel {
    /// Do the two sets share any area with positive measure?
    ///
    /// Touching along an edge or at a point doesn't count.
    fn intersects(
        &self,
        set_a: &[Polygon],
        set_b: &[Polygon],
        fill_rule: FillRule,
    ) -> Result<bool, KernelError>;

    /// Computes `subject` minus `clip`.
    ///
    /// The result is a set of polygons with no overlapping area. It may be empty,
    /// if `clip` covers all of `subject`.
    fn difference(
        &self,
        subject: &[Polygon],
        clip: &[Polygon],
        fill_rule: FillRule,
    ) -> Result<Vec<Polygon>, KernelError>;
}

impl<K: GeometryKernel + ?Sized> GeometryKernel for &K {
    fn intersects(
        &self,
        set_a: &[Polygon],
        set_b: &[Polygon],
        fill_rule: FillRule,
    ) -> Result<bool, KernelError> {
        (**self).intersects(set_a, set_b, fill_rule)
    }

    fn difference(
        &self,
        subject: &[Polygon],
        clip: &[Polygon],
        fill_rule: FillRule,
    ) -> Result<Vec<Polygon>, KernelError> {
        (**self).difference(subject, clip, fill_rule)
    }
}

/// A kernel backed by [`i_overlay`].
///
/// `i_overlay` snaps the floating-point input onto an integer grid sized to the
/// inputs' bounding box, does the boolean operation exactly, and scales the
/// result back, so the usual floating-point clipping failures don't come up.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverlayKernel {
    /// Pieces of a difference with no more than this much area get dropped.
    ///
    /// Snapping to the integer grid can leave slivers along shared edges. The
    /// overlap test ignores this: any overlap at all counts.
    pub min_area: f64,
}

impl OverlayKernel {
    /// A kernel that drops difference pieces with area at most `min_area`.
    pub fn with_min_area(min_area: f64) -> Self {
        OverlayKernel { min_area }
    }

    fn apply(
        &self,
        subject: &[Polygon],
        clip: &[Polygon],
        rule: OverlayRule,
        fill_rule: FillRule,
        min_area: f64,
    ) -> Result<Vec<Polygon>, KernelError> {
        let subject = to_contours(subject)?;
        let clip = to_contours(clip)?;
        let fill_rule = match fill_rule {
            FillRule::EvenOdd => OverlayFillRule::EvenOdd,
            FillRule::NonZero => OverlayFillRule::NonZero,
        };

        // The output is a list of shapes, each of which is an outer contour followed
        // by its holes. We don't care about the grouping, only about the contours.
        let shapes = subject.overlay(&clip, rule, fill_rule);
        Ok(shapes
            .into_iter()
            .flatten()
            .filter(|contour| contour.len() >= 3)
            .map(|contour| {
                Polygon::new(contour.into_iter().map(|[x, y]| Point::new(x, y)).collect())
            })
            .filter(|poly| poly.area() > min_area)
            .collect())
    }
}

// Converts to i_overlay's representation, checking that everything is finite.
fn to_contours(polys: &[Polygon]) -> Result<Vec<Vec<[f64; 2]>>, KernelError> {
    polys
        .iter()
        .map(|poly| {
            poly.points()
                .iter()
                .map(|p| {
                    if p.x.is_nan() || p.y.is_nan() {
                        Err(KernelError::NaN)
                    } else if p.x.is_infinite() || p.y.is_infinite() {
                        Err(KernelError::Infinity)
                    } else {
                        Ok([p.x, p.y])
                    }
                })
                .collect()
        })
        .collect()
}

impl GeometryKernel for OverlayKernel {
    fn intersects(
        &self,
        set_a: &[Polygon],
        set_b: &[Polygon],
        fill_rule: FillRule,
    ) -> Result<bool, KernelError> {
        // Cheap rejection first: if the bounding boxes don't overlap, neither do the sets.
        let bbox = |set: &[Polygon]| {
            set.iter()
                .map(Polygon::bounding_box)
                .reduce(|a, b| a.union(b))
        };
        let (Some(box_a), Some(box_b)) = (bbox(set_a), bbox(set_b)) else {
            return Ok(false);
        };
        if box_a.intersect(box_b).area() <= 0.0 {
            // Still validate the input, so that bad coordinates are reported
            // the same way whether or not they're near anything.
            to_contours(set_a)?;
            to_contours(set_b)?;
            return Ok(false);
        }

        let overlap = self.apply(set_a, set_b, OverlayRule::Intersect, fill_rule, 0.0)?;
        Ok(!overlap.is_empty())
    }

    fn difference(
        &self,
        subject: &[Polygon],
        clip: &[Polygon],
        fill_rule: FillRule,
    ) -> Result<Vec<Polygon>, KernelError> {
        self.apply(subject, clip, OverlayRule::Difference, fill_rule, self.min_area)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::geom::region_area;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    #[test]
    fn overlapping_squares() {
        let k = OverlayKernel::default();
        let a = [rect(0.0, 0.0, 10.0, 10.0)];
        let b = [rect(5.0, 5.0, 15.0, 15.0)];
        assert!(k.intersects(&a, &b, FillRule::EvenOdd).unwrap());

        let diff = k.difference(&b, &a, FillRule::EvenOdd).unwrap();
        assert_eq!(diff.len(), 1);
        assert!((region_area(&diff) - 75.0).abs() < 1e-6);
    }

    #[test]
    fn touching_is_not_intersecting() {
        let k = OverlayKernel::default();
        let a = [rect(0.0, 0.0, 1.0, 1.0)];
        let b = [rect(1.0, 0.0, 2.0, 1.0)];
        let c = [rect(3.0, 3.0, 4.0, 4.0)];
        assert!(!k.intersects(&a, &b, FillRule::EvenOdd).unwrap());
        assert!(!k.intersects(&a, &c, FillRule::EvenOdd).unwrap());
        assert!(!k.intersects(&a, &[], FillRule::EvenOdd).unwrap());
    }

    #[test]
    fn full_cover_is_empty() {
        let k = OverlayKernel::default();
        let big = [rect(-1.0, -1.0, 5.0, 5.0)];
        let small = [rect(0.0, 0.0, 1.0, 1.0)];
        assert!(k.difference(&small, &big, FillRule::EvenOdd).unwrap().is_empty());
    }

    #[test]
    fn punching_a_hole() {
        let k = OverlayKernel::default();
        let big = [rect(0.0, 0.0, 10.0, 10.0)];
        let small = [rect(4.0, 4.0, 6.0, 6.0)];
        let diff = k.difference(&big, &small, FillRule::EvenOdd).unwrap();
        assert_eq!(diff.len(), 2);
        assert!((region_area(&diff) - 96.0).abs() < 1e-6);
    }

    #[test]
    fn small_overlaps_still_count() {
        let k = OverlayKernel::with_min_area(1.0);
        let big = [rect(0.0, 0.0, 10.0, 10.0)];
        let small = [rect(4.0, 4.0, 4.5, 4.5)];
        assert!(k.intersects(&big, &small, FillRule::EvenOdd).unwrap());
        assert!(k.difference(&small, &big, FillRule::EvenOdd).unwrap().is_empty());

        // The filter does apply to what's left after a difference.
        let sliver = [rect(9.5, 0.0, 10.5, 1.0)];
        assert!(k.difference(&sliver, &big, FillRule::EvenOdd).unwrap().is_empty());
        assert_eq!(
            OverlayKernel::default()
                .difference(&sliver, &big, FillRule::EvenOdd)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn bad_coordinates() {
        let k = OverlayKernel::default();
        let a = [rect(0.0, 0.0, f64::NAN, 1.0)];
        let b = [rect(0.0, 0.0, f64::INFINITY, 1.0)];
        let ok = [rect(0.0, 0.0, 1.0, 1.0)];
        assert_matches!(
            k.difference(&ok, &a, FillRule::EvenOdd),
            Err(KernelError::NaN)
        );
        assert_matches!(
            k.difference(&b, &ok, FillRule::EvenOdd),
            Err(KernelError::Infinity)
        );
    }
}
