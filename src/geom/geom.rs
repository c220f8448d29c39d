use geo::{Area, BooleanOps, BoundingRect, MultiPolygon};
use rstar::RTree;

use crate::geom::BoundingBox;

/// A collection of MultiPolygons in one CRS, indexed by an R-tree over their bounding boxes.
#[derive(Debug, Clone)]
pub(crate) struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    /// Empty shapes keep their index but never appear in spatial queries.
    pub(crate) fn new(shapes: Vec<MultiPolygon<f64>>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| shape.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
            shapes,
        }
    }

    /// Get the number of MultiPolygons.
    #[inline] pub(crate) fn len(&self) -> usize { self.shapes.len() }

    /// Planar area of every shape, in squared CRS units.
    pub(crate) fn areas(&self) -> Vec<f64> {
        self.shapes.iter().map(|shape| shape.unsigned_area()).collect()
    }

    /// Spatial join against `others`: for every shape in `others`, every shape of `self`
    /// whose interior overlaps it, with the overlap area.
    ///
    /// Returns `(other_idx, self_idx, overlap_area)` triples ordered by `other_idx`, then `self_idx`.
    /// Pure boundary touches are dropped.
    pub(crate) fn overlaps_with(&self, others: &Geometries) -> Vec<(usize, usize, f64)> {
        let mut pairs = Vec::new();

        for (j, other) in others.shapes.iter().enumerate() {
            let Some(rect) = other.bounding_rect() else { continue };

            let mut candidates = self.rtree
                .locate_in_envelope_intersecting(&BoundingBox::search_envelope(&rect))
                .map(|bb| bb.idx())
                .collect::<Vec<_>>();
            candidates.sort_unstable();

            for i in candidates {
                let area = self.shapes[i].intersection(other).unsigned_area();
                if area > 0.0 { pairs.push((j, i, area)) }
            }
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};

    use super::*;

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x, y: y), (x: x + size, y: y), (x: x + size, y: y + size), (x: x, y: y + size), (x: x, y: y),
        ]])
    }

    #[test]
    fn overlaps_skip_touching_neighbours() {
        let cells = Geometries::new(vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0), square(5.0, 5.0, 1.0)]);
        // Right edge of the area lies on the boundary between cells 0 and 1.
        let areas = Geometries::new(vec![square(0.5, 0.0, 0.5)]);

        let pairs = cells.overlaps_with(&areas);
        assert_eq!(pairs.len(), 1);
        let (area, cell, overlap) = pairs[0];
        assert_eq!((area, cell), (0, 0));
        assert!((overlap - 0.25).abs() < 1e-12);
    }

    #[test]
    fn overlaps_span_multiple_cells() {
        let cells = Geometries::new(vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)]);
        let areas = Geometries::new(vec![square(0.5, 0.0, 1.0)]);

        let pairs = cells.overlaps_with(&areas);
        assert_eq!(pairs.iter().map(|&(_, c, _)| c).collect::<Vec<_>>(), vec![0, 1]);
        assert!(pairs.iter().all(|&(_, _, a)| (a - 0.5).abs() < 1e-12));
    }

    #[test]
    fn empty_shapes_are_not_indexed() {
        let cells = Geometries::new(vec![MultiPolygon(vec![]), square(0.0, 0.0, 1.0)]);
        let areas = Geometries::new(vec![square(-1.0, -1.0, 3.0)]);

        assert_eq!(cells.len(), 2);
        let pairs = cells.overlaps_with(&areas);
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].0, pairs[0].1), (0, 1));
        assert!((pairs[0].2 - 1.0).abs() < 1e-12);
    }
}
