//! Common tangents of two disjoint convex polygons.
//!
//! The computation has two phases. First we locate the closest features of the two
//! polygons by repeatedly halving a pair of boundary chunks, which gives us a line
//! that separates them. Then, starting from the vertices furthest from that line,
//! we bisect the boundary branches facing each other until both collapse to the
//! touching vertices of a tangent.
//!
//! Both polygons must be clockwise. Indices in this module may exceed the
//! number of vertices of a polygon; they are always taken cyclically.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::{
    geom::{signed_doubled_triangle_area, Point},
    polygon::Polygon,
    tolerance::{closest_parameters_between_segments, GeometryTolerance},
};

/// Boundary chunks known to contain the closest features of two polygons.
///
/// The chunk on P runs clockwise from `p1` to `p2`, and the chunk on Q runs clockwise
/// from `q2` to `q1`. A chunk with equal ends is a single vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunks {
    /// First vertex of the chunk on P.
    pub p1: usize,
    /// Last vertex of the chunk on P.
    pub p2: usize,
    /// Last vertex of the chunk on Q.
    pub q1: usize,
    /// First vertex of the chunk on Q.
    pub q2: usize,
}

impl Chunks {
    // Renames the chunks as though P and Q traded places.
    fn swap_polygons(&mut self) {
        std::mem::swap(&mut self.q1, &mut self.p2);
        std::mem::swap(&mut self.q2, &mut self.p1);
    }
}

/// A line separating two polygons: the perpendicular bisector of their closest points.
#[derive(Clone, Copy, Debug)]
pub struct DividingBisector {
    /// The midpoint of the closest points.
    pub pivot: Point,
    /// The direction of the bisector.
    pub ray: Point,
    /// The chunks holding the closest features.
    pub chunks: Chunks,
}

/// The four common tangents of two polygons, as `(vertex of P, vertex of Q)` pairs.
///
/// "Left" and "right" say on which side of the directed segment from P's vertex to
/// Q's vertex the corresponding polygon lies. The left/left and right/right tangents
/// are the outer ones; the other two cross between the polygons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tangents {
    /// P and Q both on the left.
    pub left_p_left_q: (usize, usize),
    /// P on the left, Q on the right.
    pub left_p_right_q: (usize, usize),
    /// P on the right, Q on the left.
    pub right_p_left_q: (usize, usize),
    /// P and Q both on the right.
    pub right_p_right_q: (usize, usize),
}

// The angles at the medians of the two chunks, between the line joining the
// medians and the adjacent sides.
#[derive(Clone, Copy, Debug)]
struct Angles {
    a1: f64,
    a2: f64,
    b1: f64,
    b2: f64,
}

impl Angles {
    fn swap_polygons(&mut self) {
        std::mem::swap(&mut self.b1, &mut self.a2);
        std::mem::swap(&mut self.a1, &mut self.b2);
    }
}

/// Computes tangents and closest points between two disjoint convex polygons.
#[derive(Clone, Debug)]
pub struct TangentPair<'a> {
    p: Polygon<'a>,
    q: Polygon<'a>,
    tol: GeometryTolerance,
    upper_branch_on_p: bool,
    lower_branch_on_q: bool,
}

impl<'a> TangentPair<'a> {
    /// Prepares to compute tangents between `p` and `q`.
    pub fn new(p: &Polygon<'a>, q: &Polygon<'a>) -> Self {
        TangentPair {
            p: p.clone(),
            q: q.clone(),
            tol: p.tolerance(),
            upper_branch_on_p: false,
            lower_branch_on_q: false,
        }
    }

    /// All four common tangents.
    pub fn tangents(&mut self) -> Tangents {
        let bisector = self.find_dividing_bisector();
        let (left_p_left_q, left_p_right_q) = self.left_tangents_from(&bisector);
        let (right_p_left_q, right_p_right_q) = self.right_tangents_from(&bisector);
        Tangents {
            left_p_left_q,
            left_p_right_q,
            right_p_left_q,
            right_p_right_q,
        }
    }

    /// The two tangents having P on their left: `(left_p_left_q, left_p_right_q)`.
    pub fn calculate_left_tangents(&mut self) -> ((usize, usize), (usize, usize)) {
        let bisector = self.find_dividing_bisector();
        self.left_tangents_from(&bisector)
    }

    /// The two tangents having P on their right: `(right_p_left_q, right_p_right_q)`.
    pub fn calculate_right_tangents(&mut self) -> ((usize, usize), (usize, usize)) {
        let bisector = self.find_dividing_bisector();
        self.right_tangents_from(&bisector)
    }

    /// A point of P and a point of Q that are as close as possible.
    pub fn find_closest_points(&mut self) -> (Point, Point) {
        let (_, p, q) = self.find_closest_features();
        (p, q)
    }

    /// The perpendicular bisector of the closest points.
    pub fn find_dividing_bisector(&mut self) -> DividingBisector {
        let (chunks, p, q) = self.find_closest_features();
        DividingBisector {
            pivot: (p + q) / 2.0,
            ray: (p - q).rotate(FRAC_PI_2),
            chunks,
        }
    }

    fn left_tangents_from(
        &mut self,
        bisector: &DividingBisector,
    ) -> ((usize, usize), (usize, usize)) {
        let c = bisector.chunks;
        let (pf, qf) = self.furthest_vertices(bisector);

        self.upper_branch_on_p = false;
        self.lower_branch_on_q = true;
        let (p, q) = self.tangent_between_branches(pf, c.p1, qf, c.q1);
        let left_left = self.slide_to_support(p, q, true, true);

        self.lower_branch_on_q = false;
        let (p, q) = self.tangent_between_branches(pf, c.p1, qf, c.q2);
        let left_right = self.slide_to_support(p, q, true, false);

        (left_left, left_right)
    }

    fn right_tangents_from(
        &mut self,
        bisector: &DividingBisector,
    ) -> ((usize, usize), (usize, usize)) {
        let c = bisector.chunks;
        let (pf, qf) = self.furthest_vertices(bisector);

        self.upper_branch_on_p = true;
        self.lower_branch_on_q = true;
        let (p, q) = self.tangent_between_branches(pf, c.p2, qf, c.q1);
        let right_left = self.slide_to_support(p, q, false, true);

        self.lower_branch_on_q = false;
        let (p, q) = self.tangent_between_branches(pf, c.p2, qf, c.q2);
        let right_right = self.slide_to_support(p, q, false, false);

        (right_left, right_right)
    }

    fn furthest_vertices(&self, bisector: &DividingBisector) -> (usize, usize) {
        let c = bisector.chunks;
        let pf =
            self.p
                .find_the_furthest_vertex_from_bisector(c.p1, c.p2, bisector.pivot, bisector.ray);
        let qf =
            self.q
                .find_the_furthest_vertex_from_bisector(c.q2, c.q1, bisector.pivot, bisector.ray);
        (pf, qf)
    }

    // The branch helpers below read the branch flags so that the same walk serves
    // all four tangents.

    fn left_from_line_on_p(&self, vertex: usize, line_start: Point, line_end: Point) -> bool {
        let p = self.p.pnt(vertex);
        if self.upper_branch_on_p {
            self.tol.left_of_line_or_on_line(line_end, p, line_start)
        } else {
            self.tol.right_of_line_or_on_line(line_end, p, line_start)
        }
    }

    fn left_from_line_on_q(&self, vertex: usize, line_start: Point, line_end: Point) -> bool {
        let q = self.q.pnt(vertex);
        if self.lower_branch_on_q {
            self.tol.left_of_line_or_on_line(line_end, q, line_start)
        } else {
            self.tol.right_of_line_or_on_line(line_end, q, line_start)
        }
    }

    fn prev_on_p(&self, i: usize) -> usize {
        if self.upper_branch_on_p {
            self.p.prev(i)
        } else {
            self.p.next(i)
        }
    }

    fn next_on_p(&self, i: usize) -> usize {
        if self.upper_branch_on_p {
            self.p.next(i)
        } else {
            self.p.prev(i)
        }
    }

    fn prev_on_q(&self, i: usize) -> usize {
        if self.lower_branch_on_q {
            self.q.prev(i)
        } else {
            self.q.next(i)
        }
    }

    fn next_on_q(&self, i: usize) -> usize {
        if self.lower_branch_on_q {
            self.q.next(i)
        } else {
            self.q.prev(i)
        }
    }

    fn median_on_p(&self, i: usize, j: usize) -> usize {
        if self.upper_branch_on_p {
            self.p.median(i, j)
        } else {
            self.p.median(j, i)
        }
    }

    fn median_on_q(&self, i: usize, j: usize) -> usize {
        if self.lower_branch_on_q {
            self.q.median(i, j)
        } else {
            self.q.median(j, i)
        }
    }

    fn mod_on_p(&self, p0: usize, p1: usize) -> usize {
        let (p0, p1) = (p0 as isize, p1 as isize);
        if self.upper_branch_on_p {
            self.p.module(p1 - p0)
        } else {
            self.p.module(p0 - p1)
        }
    }

    fn mod_on_q(&self, q0: usize, q1: usize) -> usize {
        let (q0, q1) = (q0 as isize, q1 as isize);
        if self.lower_branch_on_q {
            self.q.module(q1 - q0)
        } else {
            self.q.module(q0 - q1)
        }
    }

    // Bisects the branch of P from `p0` to `p1` and the branch of Q from `q0` to
    // `q1` until both are single vertices.
    fn tangent_between_branches(
        &self,
        mut p0: usize,
        mut p1: usize,
        mut q0: usize,
        mut q1: usize,
    ) -> (usize, usize) {
        while p1 != p0 || q1 != q0 {
            let mp = if p1 != p0 { self.median_on_p(p0, p1) } else { p0 };
            let mq = if q1 != q0 { self.median_on_q(q0, q1) } else { q0 };
            let mpp = self.p.pnt(mp);
            let mqp = self.q.pnt(mq);

            let mut moved_p = true;
            if self.mod_on_p(p0, p1) > 1 {
                if self.left_from_line_on_p(self.next_on_p(mp), mpp, mqp) {
                    p0 = mp;
                } else if self.left_from_line_on_p(self.prev_on_p(mp), mpp, mqp) {
                    p1 = mp;
                } else {
                    moved_p = false;
                }
            } else if p1 != p0 {
                if self.left_from_line_on_p(p1, self.p.pnt(p0), mqp) {
                    p0 = p1;
                } else if self.left_from_line_on_p(p0, self.p.pnt(p1), mqp) {
                    p1 = p0;
                } else {
                    moved_p = false;
                }
            } else {
                moved_p = false;
            }

            let mut moved_q = true;
            if self.mod_on_q(q0, q1) > 1 {
                if self.left_from_line_on_q(self.next_on_q(mq), mqp, mpp) {
                    q0 = mq;
                } else if self.left_from_line_on_q(self.prev_on_q(mq), mqp, mpp) {
                    q1 = mq;
                } else {
                    moved_q = false;
                }
            } else if q1 != q0 {
                if self.left_from_line_on_q(q1, self.q.pnt(q0), mpp) {
                    q0 = q1;
                } else if self.left_from_line_on_q(q0, self.q.pnt(q1), mpp) {
                    q1 = q0;
                } else {
                    moved_q = false;
                }
            } else {
                moved_q = false;
            }

            if !moved_p && !moved_q {
                p0 = mp;
                p1 = mp;
                q0 = mq;
                q1 = mq;
            }
        }
        (p0 % self.p.len(), q1 % self.q.len())
    }

    // The branch walk tests each polygon against the other's median from the
    // previous step, so when both branches collapse at once the result can be one
    // vertex short of a supporting line. Walking along the boundaries while a
    // neighbor is on the wrong side fixes that.
    fn slide_to_support(
        &self,
        mut pi: usize,
        mut qi: usize,
        p_on_left: bool,
        q_on_left: bool,
    ) -> (usize, usize) {
        let wrong_side = |pt: Point, on_left: bool, a: Point, b: Point| {
            let area = signed_doubled_triangle_area(a, b, pt);
            if on_left {
                area < 0.0
            } else {
                area > 0.0
            }
        };

        for _ in 0..self.p.len() + self.q.len() {
            let a = self.p.pnt(pi);
            let b = self.q.pnt(qi);
            let p_step = [self.p.next(pi), self.p.prev(pi)]
                .into_iter()
                .find(|&i| wrong_side(self.p.pnt(i), p_on_left, a, b));
            if let Some(i) = p_step {
                pi = i;
                continue;
            }
            let q_step = [self.q.next(qi), self.q.prev(qi)]
                .into_iter()
                .find(|&i| wrong_side(self.q.pnt(i), q_on_left, a, b));
            match q_step {
                Some(i) => qi = i,
                None => break,
            }
        }
        (pi % self.p.len(), qi % self.q.len())
    }

    fn find_closest_features(&mut self) -> (Chunks, Point, Point) {
        // Starting from the tangent points as seen from the other polygon, the chunks
        // cover the parts of the boundaries facing each other.
        let (mut p2, p1) = self.p.tangent_points(self.q.pnt(0));
        if p2 == p1 {
            p2 += self.p.len();
        }
        let (mut q1, q2) = self.q.tangent_points(self.p.pnt(0));
        if q2 == q1 {
            q1 += self.q.len();
        }
        let mut chunks = Chunks { p1, p2, q1, q2 };

        if self.shrink_to_short_chunks(&mut chunks) {
            let (p, q) = self.closest_in_short_chunks(&mut chunks);
            (chunks, p, q)
        } else {
            tracing::debug!(?chunks, "chunk bisection stalled, scanning all sides");
            self.brute_force_closest_features()
        }
    }

    fn chunks_are_long(&self, c: &Chunks) -> bool {
        let p_len = self.p.module(c.p2 as isize - c.p1 as isize) + 1;
        if p_len > 2 {
            return true;
        }
        let q_len = self.q.module(c.q1 as isize - c.q2 as isize) + 1;
        if q_len > 2 {
            return true;
        }
        p_len == 2 && q_len == 2
    }

    // Returns false if the chunks stop shrinking.
    fn shrink_to_short_chunks(&mut self, c: &mut Chunks) -> bool {
        let max_steps = 4 * (self.p.len() + self.q.len()) + 8;
        let mut steps = 0;
        while self.chunks_are_long(c) {
            let before = *c;
            self.shrink_chunks(c);
            steps += 1;
            if *c == before || steps > max_steps {
                return false;
            }
        }
        true
    }

    fn closest_in_short_chunks(&self, c: &mut Chunks) -> (Point, Point) {
        let (p, q, tol) = (&self.p, &self.q, &self.tol);
        if p.module(c.p2 as isize - c.p1 as isize) == 0 {
            let pc = p.pnt(c.p2);
            let qc = if q.module(c.q1 as isize - c.q2 as isize) == 0 {
                q.pnt(c.q1)
            } else {
                let qc = tol.closest_point_on_segment(pc, q.pnt(c.q1), q.pnt(c.q2));
                if tol.close_points(qc, q.pnt(c.q1)) {
                    c.q2 = c.q1;
                } else if tol.close_points(qc, q.pnt(c.q2)) {
                    c.q1 = c.q2;
                }
                qc
            };
            (pc, qc)
        } else {
            let qc = q.pnt(c.q1);
            let pc = tol.closest_point_on_segment(qc, p.pnt(c.p1), p.pnt(c.p2));
            if tol.close_points(pc, p.pnt(c.p1)) {
                c.p2 = c.p1;
            } else if tol.close_points(pc, p.pnt(c.p2)) {
                c.p1 = c.p2;
            }
            (pc, qc)
        }
    }

    fn brute_force_closest_features(&self) -> (Chunks, Point, Point) {
        let (np, nq) = (self.p.len(), self.q.len());
        let candidate = |i: usize, j: usize| {
            let (a0, a1) = (self.p.pnt(i), self.p.pnt(i + 1));
            let (b0, b1) = (self.q.pnt(j), self.q.pnt(j + 1));
            let (s, t) = closest_parameters_between_segments(a0, a1, b0, b1);
            let (pc, qc) = (a0.affine(a1, s), b0.affine(b1, t));
            // Parameters clamped to an end of a side are exact.
            let (p1, p2) = if s == 0.0 {
                (i, i)
            } else if s == 1.0 {
                ((i + 1) % np, (i + 1) % np)
            } else {
                (i, (i + 1) % np)
            };
            let (q2, q1) = if t == 0.0 {
                (j, j)
            } else if t == 1.0 {
                ((j + 1) % nq, (j + 1) % nq)
            } else {
                (j, (j + 1) % nq)
            };
            ((pc - qc).length(), Chunks { p1, p2, q1, q2 }, pc, qc)
        };

        let mut best = candidate(0, 0);
        for i in 0..np {
            for j in 0..nq {
                let c = candidate(i, j);
                if c.0 < best.0 {
                    best = c;
                }
            }
        }
        (best.1, best.2, best.3)
    }

    fn angles_at_median(&self, mp: usize, mq: usize) -> Angles {
        let (p, q, tol) = (&self.p, &self.q, &self.tol);
        let mpp = p.pnt(mp);
        let mqp = q.pnt(mq);
        Angles {
            a1: tol.angle(mqp, mpp, p.pnt(p.prev(mp))),
            a2: tol.angle(p.pnt(p.next(mp)), mpp, mqp),
            b1: tol.angle(q.pnt(q.next(mq)), mqp, mpp),
            b2: tol.angle(mpp, mqp, q.pnt(q.prev(mq))),
        }
    }

    fn shrink_chunks(&mut self, c: &mut Chunks) {
        let mp = if c.p1 == c.p2 {
            c.p1
        } else {
            self.p.median(c.p1, c.p2)
        };
        let mq = if c.q1 == c.q2 {
            c.q1
        } else {
            self.q.median(c.q2, c.q1)
        };
        let angles = self.angles_at_median(mp, mq);

        if self.internal_cut(c, mp, mq, &angles)
            || self.one_vertex_chunk(c, mp, mq, &angles)
            || self.two_vertex_chunk(c, mp, mq, &angles)
        {
            return;
        }

        if c.p2 == self.p.next(c.p1) && c.q1 == self.q.next(c.q2) {
            let (s, t) = closest_parameters_between_segments(
                self.p.pnt(c.p1),
                self.p.pnt(c.p2),
                self.q.pnt(c.q1),
                self.q.pnt(c.q2),
            );
            if s == 0.0 {
                c.p2 = c.p1;
            } else if s == 1.0 {
                c.p1 = c.p2;
            } else if t == 0.0 {
                c.q2 = c.q1;
            } else if t == 1.0 {
                c.q1 = c.q2;
            }
            return;
        }

        let Angles { a1, a2, b1, b2 } = angles;
        if a1 <= PI && a2 <= PI && b1 <= PI && b2 <= PI {
            if a1 + b1 > PI {
                if a1 >= FRAC_PI_2 {
                    c.p1 = mp;
                } else {
                    c.q1 = mq;
                }
            } else if a2 >= FRAC_PI_2 {
                c.p2 = mp;
            } else {
                c.q2 = mq;
            }
        } else if a1 > PI {
            c.p1 = mp;
        } else if a2 > PI {
            c.p2 = mp;
        } else if b1 > PI {
            c.q1 = mq;
        } else {
            c.q2 = mq;
        }
    }

    // If the line between the medians cuts through one of the polygons, the half
    // of that polygon's chunk on the far side of the other polygon can go.
    fn internal_cut(&self, c: &mut Chunks, mp: usize, mq: usize, angles: &Angles) -> bool {
        let (p, q, tol) = (&self.p, &self.q, &self.tol);
        let mpp = p.pnt(mp);
        let mqp = q.pnt(mq);
        let mut cut = false;

        if angles.a1 >= PI && angles.a2 >= PI {
            let o = tol.orientation(mpp, mqp, q.pnt(0));
            let next_o = tol.orientation(mpp, mqp, p.pnt(p.next(mp)));
            if o == next_o {
                c.p1 = p.next(mp);
            } else {
                c.p2 = p.prev(mp);
            }
            cut = true;
        }

        if angles.b1 >= PI && angles.b2 >= PI {
            let o = tol.orientation(mpp, mqp, p.pnt(0));
            let next_o = tol.orientation(mpp, mqp, q.pnt(q.next(mq)));
            if o == next_o {
                c.q2 = q.next(mq);
            } else {
                c.q1 = q.prev(mq);
            }
            cut = true;
        }

        cut
    }

    fn one_vertex_chunk(&self, c: &mut Chunks, mp: usize, mq: usize, angles: &Angles) -> bool {
        if c.p1 == c.p2 {
            if angles.b1 >= FRAC_PI_2 {
                c.q1 = mq;
            } else {
                c.q2 = mq;
            }
            true
        } else if c.q1 == c.q2 {
            if angles.a1 >= FRAC_PI_2 {
                c.p1 = mp;
            } else {
                c.p2 = mp;
            }
            true
        } else {
            false
        }
    }

    // Handles the case where exactly one of the chunks is a single side.
    fn two_vertex_chunk(&mut self, c: &mut Chunks, mp: usize, mq: usize, angles: &Angles) -> bool {
        let p_is_side = c.p2 == self.p.next(c.p1);
        let q_is_side = c.q1 == self.q.next(c.q2);

        if p_is_side && !q_is_side {
            self.chunk_with_short_side(c, mp, mq, angles);
            true
        } else if q_is_side && !p_is_side {
            let mut angles = *angles;
            self.swap_polygons(c, &mut angles);
            self.chunk_with_short_side(c, mq, mp, &angles);
            self.swap_polygons(c, &mut angles);
            true
        } else {
            false
        }
    }

    fn swap_polygons(&mut self, c: &mut Chunks, angles: &mut Angles) {
        std::mem::swap(&mut self.p, &mut self.q);
        c.swap_polygons();
        angles.swap_polygons();
    }

    // P's chunk is the single side from `p1` to `p2`.
    fn chunk_with_short_side(&self, c: &mut Chunks, mp: usize, mq: usize, angles: &Angles) {
        let Angles { a1, a2, b1, b2 } = *angles;
        if mp == c.p2 {
            self.chunk_with_median_at_side_end(c, mq, a1, b1, b2);
        } else if a2 <= PI {
            if a2 + b2 >= PI {
                if a2 >= FRAC_PI_2 {
                    c.p2 = c.p1;
                } else {
                    c.q2 = mq;
                }
            } else if b1 >= FRAC_PI_2 {
                c.q1 = mq;
            } else if a2 < b2
                && self
                    .tol
                    .can_project(self.q.pnt(mq), self.p.pnt(c.p1), self.p.pnt(c.p2))
            {
                c.q1 = mq;
            } else if a2 < b2 {
                c.p1 = c.p2;
            }
        } else if a1 + b1 <= PI {
            c.p1 = c.p2;
        } else {
            c.p2 = c.p1;
        }
    }

    fn chunk_with_median_at_side_end(&self, c: &mut Chunks, mq: usize, a1: f64, b1: f64, b2: f64) {
        if a1 <= PI {
            if a1 + b1 >= PI {
                if a1 >= FRAC_PI_2 {
                    c.p1 = c.p2;
                } else {
                    c.q1 = mq;
                }
            } else if b2 >= FRAC_PI_2 {
                c.q2 = mq;
            } else if a1 < b2
                && self
                    .tol
                    .can_project(self.q.pnt(mq), self.p.pnt(c.p1), self.p.pnt(c.p2))
            {
                c.q2 = mq;
            } else if a1 < b2 {
                c.p2 = c.p1;
            }
        } else {
            c.p2 = c.p1;
            if b1 >= PI {
                c.q1 = mq;
            } else if b2 >= PI {
                c.q2 = mq;
            }
        }
    }
}
