//! Random draws of historical years.
//!
//! Every simulated year picks one historical row uniformly at random,
//! independently of every other year. All randomness flows through a
//! [`PathRng`] derived from the run seed, so a run is reproducible and the
//! same [`PathMatrix`] can be handed to every scenario being compared.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use super::error::DataError;

/// Deterministic RNG for one stream of path draws.
pub struct PathRng {
    inner: Pcg64Mcg,
}

impl PathRng {
    /// Derive a stream from the run seed. `stream` must be stable for a
    /// given index name within a run.
    pub fn new(seed: u64, stream: u64) -> Self {
        let derived_seed = seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    fn below(&mut self, n: usize) -> usize {
        self.inner.gen_range(0..n)
    }
}

/// Row indices into a historical return sequence, `[year][simulation]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatrix {
    rows: Vec<Vec<usize>>,
    simulations: usize,
    sequence_length: usize,
}

impl PathMatrix {
    /// Draw `num_years` rows of `num_simulations` indices in
    /// `[0, sequence_length)`.
    pub fn generate(
        num_years: usize,
        num_simulations: usize,
        sequence_length: usize,
        rng: &mut PathRng,
    ) -> Result<Self, DataError> {
        if sequence_length == 0 {
            return Err(DataError::EmptySeries);
        }
        let rows = (0..num_years)
            .map(|_| {
                (0..num_simulations)
                    .map(|_| rng.below(sequence_length))
                    .collect()
            })
            .collect();
        Ok(Self {
            rows,
            simulations: num_simulations,
            sequence_length,
        })
    }

    pub fn years(&self) -> usize {
        self.rows.len()
    }

    pub fn simulations(&self) -> usize {
        self.simulations
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn year(&self, year: usize) -> &[usize] {
        &self.rows[year]
    }

    #[cfg(test)]
    pub(crate) fn from_rows(rows: Vec<Vec<usize>>, sequence_length: usize) -> Self {
        let simulations = rows.first().map_or(0, Vec::len);
        assert!(rows.iter().all(|row| row.len() == simulations));
        assert!(rows.iter().flatten().all(|&idx| idx < sequence_length));
        Self {
            rows,
            simulations,
            sequence_length,
        }
    }
}

/// Stable stream id for an index name (FNV-1a), so adding or reordering
/// scenarios never changes the draws for an index.
pub fn stream_for_index(index: &str) -> u64 {
    index.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    #[test]
    fn same_seed_and_stream_reproduce_the_matrix() {
        let a = PathMatrix::generate(18, 500, 97, &mut PathRng::new(42, 3)).unwrap();
        let b = PathMatrix::generate(18, 500, 97, &mut PathRng::new(42, 3)).unwrap();
        assert_eq!(a, b);

        let c = PathMatrix::generate(18, 500, 97, &mut PathRng::new(43, 3)).unwrap();
        assert_ne!(a, c);
        let d = PathMatrix::generate(18, 500, 97, &mut PathRng::new(42, 4)).unwrap();
        assert_ne!(a, d);
    }

    #[test]
    fn single_observation_always_draws_row_zero() {
        let matrix = PathMatrix::generate(5, 64, 1, &mut PathRng::new(7, 0)).unwrap();
        for year in 0..matrix.years() {
            assert!(matrix.year(year).iter().all(|&idx| idx == 0));
        }
    }

    #[test]
    fn draws_cover_every_historical_row() {
        let matrix = PathMatrix::generate(1, 20_000, 10, &mut PathRng::new(1, 0)).unwrap();
        let mut counts = [0usize; 10];
        for &idx in matrix.year(0) {
            counts[idx] += 1;
        }
        for count in counts {
            // Expected 2_000 per bucket.
            assert!((1_700..=2_300).contains(&count), "count {count}");
        }
    }

    #[test]
    fn empty_series_cannot_be_drawn_from() {
        assert!(matches!(
            PathMatrix::generate(3, 10, 0, &mut PathRng::new(1, 0)),
            Err(DataError::EmptySeries)
        ));
    }

    #[test]
    fn stream_ids_differ_between_index_names() {
        assert_ne!(stream_for_index("DJIA"), stream_for_index("Wilshire_5000"));
        assert_eq!(stream_for_index("DJIA"), stream_for_index("DJIA"));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_matrix_has_requested_shape_and_range(
            years in 0usize..20,
            sims in 1usize..200,
            len in 1usize..120,
            seed in proptest::num::u64::ANY,
        ) {
            let matrix = PathMatrix::generate(years, sims, len, &mut PathRng::new(seed, 0)).unwrap();
            prop_assert_eq!(matrix.years(), years);
            prop_assert_eq!(matrix.simulations(), sims);
            prop_assert_eq!(matrix.sequence_length(), len);
            for year in 0..years {
                prop_assert_eq!(matrix.year(year).len(), sims);
                prop_assert!(matrix.year(year).iter().all(|&idx| idx < len));
            }
        }
    }
}
