//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;
use kurbo::Point;

use crate::{
    flatten::{Rank, Stack},
    kernel::{FillRule, GeometryKernel, OverlayKernel},
    normalize::{Ellipse, InputShape, Primitive},
};

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

// Drawings live on a modest canvas, like the ones we get from real files.
fn coord(u: &mut Unstructured<'_>) -> Result<f64, arbitrary::Error> {
    float_in_range(-100.0, 100.0, u)
}

/// Generate a point, with some chance of landing exactly on a point we already have.
fn point(existing: &[Point], u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    let reuse: bool = u.arbitrary()?;
    if reuse && !existing.is_empty() {
        let idx = u.choose_index(existing.len())?;
        Ok(existing[idx])
    } else {
        Ok(Point::new(coord(u)?, coord(u)?))
    }
}

/// Generate an arbitrary contour with between 3 and 8 points.
///
/// The contour may well be self-intersecting.
pub fn contour(existing: &[Point], u: &mut Unstructured<'_>) -> Result<Vec<Point>, arbitrary::Error> {
    let len = u.int_in_range(3..=8)?;
    (0..len).map(|_| point(existing, u)).collect()
}

/// Generate an ellipse with positive radii.
pub fn ellipse(u: &mut Unstructured<'_>) -> Result<Ellipse, arbitrary::Error> {
    Ok(Ellipse {
        cx: coord(u)?,
        cy: coord(u)?,
        rx: float_in_range(0.5, 50.0, u)?,
        ry: float_in_range(0.5, 50.0, u)?,
    })
}

/// Generate a valid primitive.
///
/// Contours have a chance to reuse the vertices of earlier contours, since
/// shared vertices and edges are where the kernel is most likely to struggle.
pub fn primitive(existing: &[Point], u: &mut Unstructured<'_>) -> Result<Primitive, arbitrary::Error> {
    match u.int_in_range(0..=2)? {
        0 => Ok(Primitive::Ellipse(ellipse(u)?)),
        1 => Ok(Primitive::Contour(contour(existing, u)?)),
        _ => {
            let n = u.int_in_range(1..=3)?;
            let contours = (0..n)
                .map(|_| contour(existing, u))
                .collect::<Result<_, _>>()?;
            Ok(Primitive::Compound(contours))
        }
    }
}

/// Generate a drawing of up to 8 shapes.
pub fn drawing(u: &mut Unstructured<'_>) -> Result<Vec<InputShape>, arbitrary::Error> {
    let len = u.int_in_range(0..=8)?;
    let mut points = Vec::new();
    let mut shapes = Vec::with_capacity(len);
    for _ in 0..len {
        let prim = primitive(&points, u)?;
        match &prim {
            Primitive::Contour(c) => points.extend_from_slice(c),
            Primitive::Compound(cs) => points.extend(cs.iter().flatten()),
            Primitive::Ellipse(_) => {}
        }
        shapes.push(InputShape::new(prim));
    }
    Ok(shapes)
}

/// Flattens an arbitrary drawing and checks the basic guarantees: the top shape
/// is untouched, nothing gets bigger, and the kernel doesn't fail.
pub fn flatten_invariants(u: &mut Unstructured<'_>) -> Result<(), arbitrary::Error> {
    let shapes = drawing(u)?;
    let kernel = OverlayKernel::default();
    // Contours can collapse below three points if the generator ran out of data.
    let input = Stack::from_drawing(shapes).map_err(|_| arbitrary::Error::IncorrectFormat)?;
    let (output, _) = input
        .clone()
        .flatten(&kernel)
        .expect("the kernel accepts finite input");

    if !input.is_empty() {
        assert_eq!(input[Rank(0)], output[Rank(0)]);
    }
    // The input can be self-intersecting, so measure areas by the kernel's
    // idea of them instead of trusting the raw polygons.
    let area = |region: &[crate::geom::Polygon]| {
        let resolved = kernel
            .difference(region, &[], FillRule::EvenOdd)
            .expect("the kernel accepts finite input");
        crate::geom::region_area(&resolved)
    };
    for (before, after) in input.shapes().zip(output.shapes()) {
        let a0 = area(&before.regions);
        let a1 = area(&after.regions);
        assert!(
            a1 <= a0 + 1e-2,
            "{:?} grew from {a0} to {a1}",
            after.rank
        );
    }
    Ok(())
}
