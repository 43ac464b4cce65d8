//! Logarithmic-time extremum search over unimodal and bimodal sequences.
//!
//! The angles at which an external point sees the vertices of a convex polygon,
//! measured from the polygon's first vertex, form a *bimodal* sequence: going around
//! the polygon they rise to one extremum and fall to the other (or the other way
//! around). [`BimodalSequence`] reduces that to the unimodal case.

/// How a sequence behaves around an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Behavior {
    Increasing,
    Decreasing,
    Extremum,
}

/// A sequence that first rises and then falls, or first falls and then rises.
///
/// Monotone sequences count as unimodal too.
pub struct UnimodalSequence<F> {
    f: F,
    len: usize,
}

impl<F: Fn(usize) -> f64> UnimodalSequence<F> {
    /// Wraps the sequence `f(0), ..., f(len - 1)`.
    ///
    /// Panics if `len` is zero.
    pub fn new(f: F, len: usize) -> Self {
        assert!(len > 0);
        UnimodalSequence { f, len }
    }

    /// The index of a smallest element.
    pub fn find_minimum(&self) -> usize {
        self.find_extremum(|a, b| a < b)
    }

    /// The index of a largest element.
    pub fn find_maximum(&self) -> usize {
        self.find_extremum(|a, b| a > b)
    }

    // `better(a, b)` says that the value `a` is strictly more extreme than `b`.
    //
    // Assumes the sequence moves towards the extremum and then away from it. A
    // sequence shaped the other way around has its extremum at one of the ends,
    // which is why the ends are compared at the end.
    fn find_extremum(&self, better: impl Fn(f64, f64) -> bool) -> usize {
        let f = &self.f;
        let last = self.len - 1;
        let (mut a, mut b) = (0, last);

        let mut best = loop {
            if b - a <= 1 {
                break if better(f(b), f(a)) { b } else { a };
            }
            let m = a + (b - a) / 2;
            match self.behavior_at(m) {
                // Moving towards the extremum means it's ahead of us.
                Behavior::Increasing if better(f(m + 1), f(m)) => a = m,
                Behavior::Decreasing if better(f(m + 1), f(m)) => a = m,
                Behavior::Increasing | Behavior::Decreasing => b = m,
                Behavior::Extremum => break m,
            }
        };

        // A flat run or a sequence that is "inside out" can still have its extremum
        // at one of the ends.
        for end in [0, last] {
            if better(f(end), f(best)) {
                best = end;
            }
        }
        best
    }

    fn behavior_at(&self, m: usize) -> Behavior {
        let f = &self.f;
        let (prev, here, next) = (f(m - 1), f(m), f(m + 1));
        if prev < here && here < next {
            Behavior::Increasing
        } else if prev > here && here > next {
            Behavior::Decreasing
        } else {
            Behavior::Extremum
        }
    }
}

/// A sequence that is unimodal up to a cyclic shift.
///
/// More precisely, a sequence with at most one local maximum and one local minimum
/// when read cyclically, such as the angles under which a convex polygon is seen
/// from outside.
pub struct BimodalSequence<F> {
    f: F,
    len: usize,
}

impl<F: Fn(usize) -> f64> BimodalSequence<F> {
    /// Wraps the sequence `f(0), ..., f(len - 1)`.
    ///
    /// Panics if `len` is zero.
    pub fn new(f: F, len: usize) -> Self {
        assert!(len > 0);
        BimodalSequence { f, len }
    }

    /// The index of a smallest element.
    pub fn find_minimum(&self) -> usize {
        let first = (self.f)(0);
        let last = (self.f)(self.len - 1);
        if first == last {
            return UnimodalSequence::new(&self.f, self.len).find_minimum();
        }

        // Replacing the sequence by its pointwise minimum with the line through its
        // endpoints flattens the part that wraps around, leaving a unimodal sequence
        // with the same minimum.
        let chord = self.chord(first, last);
        UnimodalSequence::new(|i| (self.f)(i).min(chord(i)), self.len).find_minimum()
    }

    /// The index of a largest element.
    pub fn find_maximum(&self) -> usize {
        let first = (self.f)(0);
        let last = (self.f)(self.len - 1);
        if first == last {
            return UnimodalSequence::new(&self.f, self.len).find_maximum();
        }

        let chord = self.chord(first, last);
        UnimodalSequence::new(|i| (self.f)(i).max(chord(i)), self.len).find_maximum()
    }

    fn chord(&self, first: f64, last: f64) -> impl Fn(usize) -> f64 {
        let slope = (last - first) / (self.len - 1) as f64;
        move |i| first + slope * i as f64
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn unimodal() {
        let hill = [0.0, 1.0, 3.0, 4.0, 2.0, -1.0];
        let seq = UnimodalSequence::new(|i| hill[i], hill.len());
        assert_eq!(seq.find_maximum(), 3);
        assert_eq!(seq.find_minimum(), 5);

        let valley = [3.0, 1.0, 0.5, 2.0];
        let seq = UnimodalSequence::new(|i| valley[i], valley.len());
        assert_eq!(seq.find_minimum(), 2);
        assert_eq!(seq.find_maximum(), 0);

        let single = [7.0];
        let seq = UnimodalSequence::new(|i| single[i], 1);
        assert_eq!(seq.find_minimum(), 0);
        assert_eq!(seq.find_maximum(), 0);
    }

    #[test]
    fn ties_stop_the_search() {
        let plateau = [0.0, 1.0, 2.0, 2.0, 1.0, 0.0];
        let seq = UnimodalSequence::new(|i| plateau[i], plateau.len());
        let max = seq.find_maximum();
        assert!(max == 2 || max == 3);
    }

    #[test]
    fn wrap_around_maximum() {
        let angles = [0.0, -0.3, -0.6, -0.2, 0.4, 0.9, 0.5, 0.2];
        let seq = BimodalSequence::new(|i| angles[i], angles.len());
        assert_eq!(seq.find_maximum(), 5);
        assert_eq!(seq.find_minimum(), 2);
    }

    #[test]
    fn wrap_around_minimum() {
        let angles = [0.0, 0.5, 0.9, 0.3, -0.4, -0.8, -0.7, -0.1];
        let seq = BimodalSequence::new(|i| angles[i], angles.len());
        assert_eq!(seq.find_maximum(), 2);
        assert_eq!(seq.find_minimum(), 5);
    }

    // A cyclic shift of a strictly "hill-shaped" sequence.
    fn shifted_hill() -> impl Strategy<Value = Vec<f64>> {
        (3usize..40)
            .prop_flat_map(|len| (Just(len), 0..len, 0..len))
            .prop_map(|(len, peak, shift)| {
                let base: Vec<f64> = (0..len)
                    .map(|i| -((i as f64) - (peak as f64)).abs() - 0.01 * i as f64)
                    .collect();
                (0..len).map(|i| base[(i + shift) % len]).collect()
            })
    }

    proptest! {
        #[test]
        fn bimodal_matches_linear_scan(values in shifted_hill()) {
            let seq = BimodalSequence::new(|i| values[i], values.len());
            let max = seq.find_maximum();
            let min = seq.find_minimum();
            let true_max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let true_min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            prop_assert_eq!(values[max], true_max);
            prop_assert_eq!(values[min], true_min);
        }
    }
}
