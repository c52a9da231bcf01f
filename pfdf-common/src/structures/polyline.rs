/*
This code is part of the pfdf-rs geospatial analysis library.
Adapted from whitebox-tools' `Polyline` (src/structures/polyline.rs); the
`MultiPolyline` wrapper and the bounding-box helper were dropped since no
pfdf consumer needs them (bounding boxes live in `pfdf-raster` instead, to
avoid a dependency cycle).
*/

use super::Point2D;
use std::ops::Index;

/// An ordered chain of vertices in world coordinates — the polyline
/// representation of a stream segment.
#[derive(Default, Clone, Debug)]
pub struct Polyline {
    pub vertices: Vec<Point2D>,
    pub id: usize,
    pub split_points: Vec<(f64, Point2D)>,
}

impl PartialEq for Polyline {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && (0..self.len()).all(|i| self.vertices[i].nearly_equals(&other.vertices[i]))
    }
}

impl Index<usize> for Polyline {
    type Output = Point2D;

    fn index<'a>(&'a self, index: usize) -> &'a Point2D {
        &self.vertices[index]
    }
}

impl Polyline {
    pub fn new(vertices: &[Point2D], id: usize) -> Polyline {
        Polyline {
            vertices: vertices.to_vec(),
            id,
            split_points: vec![],
        }
    }

    pub fn new_empty(id: usize) -> Polyline {
        Polyline {
            vertices: vec![],
            id,
            split_points: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn num_splits(&self) -> usize {
        self.split_points.len()
    }

    /// Cumulative Euclidean length of the polyline.
    pub fn length(&self) -> f64 {
        let mut total = 0f64;
        for a in 0..self.len().saturating_sub(1) {
            total += self.vertices[a].distance(&self.vertices[a + 1]);
        }
        total
    }

    pub fn get(&self, index: usize) -> Point2D {
        self.vertices[index]
    }

    pub fn first_vertex(&self) -> Point2D {
        self.vertices[0]
    }

    pub fn last_vertex(&self) -> Point2D {
        self.vertices[self.vertices.len() - 1]
    }

    pub fn push(&mut self, v: Point2D) {
        self.vertices.push(v);
    }

    /// Inserts a split point into the polyline, used to eventually break it
    /// into two new lines at `split()`. `position` is a fractional index
    /// along the polyline: an integer position duplicates that vertex (the
    /// shared endpoint used when splitting a stream segment at a pixel).
    pub fn insert_split_point(&mut self, position: f64, point: Point2D) {
        if position > 0f64 && position < (self.len() - 1) as f64 {
            self.split_points.push((position, point));
        }
    }

    /// Splits the polyline at its current `split_points`, returning the
    /// resulting pieces in order; each piece shares its boundary vertex with
    /// its neighbour. Returns `[self]` unchanged if there are no split
    /// points.
    pub fn split(&mut self) -> Vec<Polyline> {
        self.split_points
            .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        let mut ret: Vec<Polyline> = Vec::with_capacity(self.split_points.len() + 1);
        if self.num_splits() > 0 {
            let mut line: Vec<Point2D> = vec![];
            let mut next_split = 0;
            let mut upper_index = self.split_points[next_split].0.floor() as usize;
            let mut is_integer = self.split_points[next_split].0.fract() == 0f64;

            let mut i = 0;
            while i < self.len() {
                if i <= upper_index {
                    line.push(self.vertices[i]);
                } else {
                    if !is_integer {
                        line.push(self.split_points[next_split].1);
                    }
                    ret.push(Polyline::new(&line, self.id));
                    line.clear();
                    line.push(self.split_points[next_split].1);
                    next_split += 1;
                    i -= 1;
                    if next_split < self.num_splits() {
                        upper_index = self.split_points[next_split].0.floor() as usize;
                        is_integer = self.split_points[next_split].0.fract() == 0f64;
                    } else {
                        upper_index = self.len() - 1;
                    }
                }
                i += 1;
            }
            ret.push(Polyline::new(&line, self.id));
            return ret;
        }
        ret.push(Polyline::new(&self.vertices, self.id));
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_at_vertex_shares_the_boundary_point() {
        let mut pl = Polyline::new(
            &[
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 0.0),
                Point2D::new(2.0, 0.0),
                Point2D::new(3.0, 0.0),
            ],
            1,
        );
        pl.insert_split_point(2.0, Point2D::new(2.0, 0.0));
        let pieces = pl.split();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].last_vertex(), pieces[1].first_vertex());
        assert_eq!(pieces[0].len(), 3);
        assert_eq!(pieces[1].len(), 2);
    }

    #[test]
    fn length_sums_segment_distances() {
        let pl = Polyline::new(&[Point2D::new(0.0, 0.0), Point2D::new(3.0, 4.0)], 1);
        assert!((pl.length() - 5.0).abs() < 1e-12);
    }
}
