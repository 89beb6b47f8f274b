//! Resolving occlusion between stacked shapes.
//!
//! The input is a drawing, which is a list of shapes in document order: later
//! shapes get painted on top of earlier ones. We assign every shape a [`Rank`]
//! so that the last shape in the document gets rank zero, the one before it
//! gets rank one, and so on. Then we trim every shape by all the shapes with
//! smaller rank, so that afterwards each point of the canvas belongs to at most
//! one shape: the one that would have been visible there.
//!
//! This is a quadratic scan over pairs of shapes, which is fine for the sizes
//! of drawings that we deal with. The order of the scan matters, though: shape
//! `b` gets trimmed by rank `0`, then the result gets trimmed by rank `1`, and
//! so on up to rank `b - 1`.

use crate::geom::{Polygon, Region};
use crate::kernel::{FillRule, GeometryKernel};
use crate::normalize::{InputShape, Metadata};
use crate::Error;

/// The position of a shape in the stacking order.
///
/// Rank zero is on top of everything; larger ranks are further down.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Rank(pub usize);

impl std::fmt::Debug for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r_{}", self.0)
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A shape taking part in flattening.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    /// Where we are in the stacking order.
    pub rank: Rank,
    /// Where we were in the input document.
    pub source_index: usize,
    /// The currently visible part of the shape.
    ///
    /// This starts out as the whole shape and only ever shrinks. If it becomes
    /// empty, the shape is completely hidden.
    pub regions: Region,
    /// Attributes carried along for the output.
    pub metadata: Metadata,
}

impl Shape {
    /// Is this shape completely hidden?
    pub fn is_consumed(&self) -> bool {
        self.regions.is_empty()
    }
}

/// An arena of shapes, indexed by their [`Rank`].
///
/// Shapes are stored in rank order, so the shape at index `i` has rank `i`.
#[derive(Clone, Debug, Default)]
pub struct Stack {
    shapes: Vec<Shape>,
}

/// Counts of what happened during a call to [`Stack::flatten`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlattenStats {
    /// Pairs that were skipped because one side had nothing left.
    pub skipped_empty: usize,
    /// Pairs whose overlap test came back negative.
    pub skipped_disjoint: usize,
    /// Pairs for which we computed a difference.
    pub trimmed: usize,
    /// Shapes that ended up completely hidden.
    pub consumed: usize,
}

impl Stack {
    /// Normalizes the shapes of a drawing, given in document order, and assigns their ranks.
    ///
    /// The shape at document index `i` gets rank `n - 1 - i`.
    pub fn from_drawing(shapes: Vec<InputShape>) -> Result<Stack, Error> {
        let n = shapes.len();
        let mut ranked = shapes
            .into_iter()
            .enumerate()
            .map(|(index, shape)| {
                let regions = shape
                    .primitive
                    .normalize()
                    .map_err(|reason| Error::InvalidGeometry { index, reason })?;
                Ok(Shape {
                    rank: Rank(n - 1 - index),
                    source_index: index,
                    regions,
                    metadata: shape.metadata,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        ranked.reverse();
        debug_assert!(ranked.iter().enumerate().all(|(i, s)| s.rank == Rank(i)));
        Ok(Stack { shapes: ranked })
    }

    /// Builds a stack from regions that are already in rank order (topmost first).
    pub fn from_ranked(regions: impl IntoIterator<Item = (Region, Metadata)>) -> Stack {
        let mut shapes: Vec<Shape> = regions
            .into_iter()
            .enumerate()
            .map(|(i, (regions, metadata))| Shape {
                rank: Rank(i),
                source_index: 0,
                regions,
                metadata,
            })
            .collect();
        let n = shapes.len();
        for s in &mut shapes {
            s.source_index = n - 1 - s.rank.0;
        }
        Stack { shapes }
    }

    /// The number of shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Are there no shapes at all?
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Iterates over all the ranks, from the top down.
    pub fn ranks(&self) -> impl Iterator<Item = Rank> {
        (0..self.shapes.len()).map(Rank)
    }

    /// Iterates over all the shapes, from the top down.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    /// Consumes the stack, returning its shapes from the top down.
    pub fn into_shapes(self) -> Vec<Shape> {
        self.shapes
    }

    /// Trims every shape by all the shapes above it.
    ///
    /// Afterwards, no two shapes' regions overlap, and each shape's region is what
    /// was left of it after painting everything above it. The topmost shape is
    /// never changed.
    ///
    /// If the kernel fails on any pair, the whole operation fails: the partially
    /// trimmed stack is dropped along with `self`.
    pub fn flatten<K: GeometryKernel>(
        mut self,
        kernel: &K,
    ) -> Result<(Stack, FlattenStats), Error> {
        let mut stats = FlattenStats::default();
        log::debug!("flattening {} shapes", self.shapes.len());

        for b in 0..self.shapes.len() {
            let (above, rest) = self.shapes.split_at_mut(b);
            let subject = &mut rest[0];

            for occluder in above.iter() {
                if subject.regions.is_empty() {
                    // Everything else above us would be skipped anyway.
                    stats.skipped_empty += b - occluder.rank.0;
                    break;
                }
                if occluder.regions.is_empty() {
                    stats.skipped_empty += 1;
                    continue;
                }
                trim(kernel, occluder, subject, &mut stats)?;
            }

            if subject.is_consumed() {
                log::trace!("{:?} is completely hidden", subject.rank);
                stats.consumed += 1;
            }
        }

        log::debug!(
            "flattened: {} trimmed, {} disjoint, {} skipped, {} hidden",
            stats.trimmed,
            stats.skipped_disjoint,
            stats.skipped_empty,
            stats.consumed
        );
        Ok((self, stats))
    }

    /// Renders every shape's region in its own colour, for debugging.
    #[cfg(feature = "debug-svg")]
    pub fn dump_svg(&self) -> svg::Document {
        let colors = [
            "#005F73", "#0A9396", "#94D2BD", "#E9D8A6", "#EE9B00", "#CA6702", "#BB3E03", "#AE2012",
            "#9B2226",
        ];

        let bbox = self
            .shapes
            .iter()
            .flat_map(|s| s.regions.iter())
            .map(Polygon::bounding_box)
            .reduce(|a, b| a.union(b))
            .unwrap_or(kurbo::Rect::ZERO);
        let stroke_width = bbox.width().max(bbox.height()) / 512.0;
        let mut document = svg::Document::new().set(
            "viewBox",
            (bbox.x0, bbox.y0, bbox.width(), bbox.height()),
        );

        // Paint from the bottom up, so that any overlap (which would be a bug) is
        // painted the way the original drawing was.
        for shape in self.shapes.iter().rev() {
            let mut outline = kurbo::BezPath::new();
            for poly in &shape.regions {
                outline.extend(poly.to_bez_path().elements().iter().copied());
            }
            let path = svg::node::element::Path::new()
                .set("d", outline.to_svg())
                .set("stroke", "black")
                .set("stroke-width", stroke_width)
                .set("fill-rule", "evenodd")
                .set("fill", colors[shape.rank.0 % colors.len()]);
            document = document.add(path);
        }
        document
    }
}

// Trims `subject` by `occluder`, if they overlap.
fn trim<K: GeometryKernel>(
    kernel: &K,
    occluder: &Shape,
    subject: &mut Shape,
    stats: &mut FlattenStats,
) -> Result<(), Error> {
    let (occluder_rank, subject_rank) = (occluder.rank, subject.rank);
    let failed = move |source| Error::ClippingFailed {
        occluder: occluder_rank,
        subject: subject_rank,
        source,
    };

    // Disjoint pairs must not reach `difference`: a region that's already final
    // shouldn't pick up rounding from the kernel's integer grid.
    let overlaps = kernel
        .intersects(&subject.regions, &occluder.regions, FillRule::EvenOdd)
        .map_err(failed)?;
    if !overlaps {
        log::trace!("{:?} and {:?} are disjoint", occluder.rank, subject.rank);
        stats.skipped_disjoint += 1;
        return Ok(());
    }

    let remaining: Vec<Polygon> = kernel
        .difference(&subject.regions, &occluder.regions, FillRule::EvenOdd)
        .map_err(failed)?;
    log::trace!(
        "{:?} trimmed by {:?}: {} polygons left",
        subject.rank,
        occluder.rank,
        remaining.len()
    );
    stats.trimmed += 1;
    subject.regions = remaining;
    Ok(())
}

impl std::ops::Index<Rank> for Stack {
    type Output = Shape;

    fn index(&self, index: Rank) -> &Self::Output {
        &self.shapes[index.0]
    }
}
