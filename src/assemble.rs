//! Turning flattened shapes back into output records.

use crate::flatten::{Rank, Stack};
use crate::geom::Polygon;
use crate::normalize::Metadata;

/// One polygon of the flattened drawing, along with the attributes of the
/// shape that it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputRecord {
    /// The stacking rank of the shape that this polygon came from.
    pub rank: Rank,
    /// The document index of the shape that this polygon came from.
    pub source_index: usize,
    /// The polygon.
    pub polygon: Polygon,
    /// A copy of the source shape's metadata.
    pub metadata: Metadata,
}

/// Emits one record per polygon of every shape, topmost shape first.
///
/// Hidden shapes emit nothing. A shape that got split into several pieces (or that
/// has a hole) emits one record per polygon, all carrying the same metadata.
pub fn assemble(stack: Stack) -> Vec<OutputRecord> {
    let mut records = Vec::new();
    for shape in stack.into_shapes() {
        let rank = shape.rank;
        let source_index = shape.source_index;
        let metadata = shape.metadata;
        records.extend(shape.regions.into_iter().map(|polygon| OutputRecord {
            rank,
            source_index,
            polygon,
            metadata: metadata.clone(),
        }));
    }
    log::debug!("assembled {} output records", records.len());
    records
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;

    fn tri(x: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(x, 0.0),
            Point::new(x + 1.0, 0.0),
            Point::new(x, 1.0),
        ])
    }

    fn meta(id: &str) -> Metadata {
        let mut m = Metadata::new();
        m.insert("id", id);
        m
    }

    #[test]
    fn one_record_per_polygon() {
        let stack = Stack::from_ranked([
            (vec![tri(0.0), tri(2.0)], meta("top")),
            (vec![], meta("hidden")),
            (vec![tri(4.0)], meta("bottom")),
        ]);
        let records = assemble(stack);

        let summary: Vec<_> = records
            .iter()
            .map(|r| (r.rank, r.source_index, r.metadata.get("id").unwrap()))
            .collect();
        assert_eq!(
            summary,
            [
                (Rank(0), 2, "top"),
                (Rank(0), 2, "top"),
                (Rank(2), 0, "bottom")
            ]
        );
        assert_eq!(records[1].polygon, tri(2.0));
    }

    #[test]
    fn nothing_in_nothing_out() {
        assert!(assemble(Stack::default()).is_empty());
    }
}
