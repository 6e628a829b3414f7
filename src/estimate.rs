//! Count-based estimation of a chain from an observation sequence.
//!
//! Given a sequence of observed state labels, the estimator:
//!
//! 1. registers each distinct label at its first occurrence (so registry
//!    order is first-appearance order),
//! 2. counts every consecutive pair `obs[t] → obs[t+1]` into a square count
//!    matrix,
//! 3. normalizes each count row to unit mass, yielding the maximum-likelihood
//!    transition estimate.
//!
//! Counts are kept in `f64` so the count matrix and the probability matrix
//! share a representation and [`normalize_rows`] applies to both.
//!
//! [`ChainModel::train`] is all-or-nothing: the counts are normalized before
//! they touch the model, so a failure (too few observations, or a label that
//! only ever appears at the end of the sequence and so has no outgoing
//! observations) leaves the previous registry and matrix fully intact.

use crate::chain::{normalize_rows, ChainModel};
use crate::{Error, Result};
use ndarray::Array2;
use std::collections::HashMap;

/// Minimum observation count for estimation: one transition needs two
/// observations.
const MIN_OBSERVATIONS: usize = 2;

/// Builds the first-appearance label registry and the raw transition count
/// matrix for `observations`.
///
/// Fails with [`Error::InsufficientData`] when fewer than two observations
/// are given. Rows of the returned matrix sum to the number of times the row
/// label was observed with a successor.
pub fn transition_counts<S: AsRef<str>>(observations: &[S]) -> Result<(Vec<String>, Array2<f64>)> {
    if observations.len() < MIN_OBSERVATIONS {
        return Err(Error::InsufficientData(observations.len()));
    }

    let mut labels: Vec<String> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for obs in observations {
        let label = obs.as_ref();
        if !index.contains_key(label) {
            index.insert(label, labels.len());
            labels.push(label.to_string());
        }
    }

    let n = labels.len();
    let mut counts = Array2::<f64>::zeros((n, n));
    for window in observations.windows(2) {
        let from = index[window[0].as_ref()];
        let to = index[window[1].as_ref()];
        counts[[from, to]] += 1.0;
    }
    Ok((labels, counts))
}

impl ChainModel {
    /// Replaces the registry and matrix with the maximum-likelihood estimate
    /// from `observations` (normalized transition counts).
    ///
    /// The cursor and the strict-rows flag are left as they are; a cursor
    /// naming a label absent from `observations` becomes stale, exactly as
    /// after [`ChainModel::delete_state`].
    ///
    /// Fails with [`Error::InsufficientData`] on fewer than two observations
    /// and with [`Error::DegenerateRow`] when some label has no outgoing
    /// observations (it only appears as the final element). On failure the
    /// model is unchanged.
    pub fn train<S: AsRef<str>>(&mut self, observations: &[S]) -> Result<()> {
        let (labels, mut counts) = transition_counts(observations)?;
        normalize_rows(&mut counts, &labels)?;
        self.replace_parts(labels, counts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn transition_counts_needs_two_observations() {
        let err = transition_counts::<&str>(&[]).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(0)));
        let err = transition_counts(&["A"]).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(1)));
    }

    #[test]
    fn transition_counts_registers_labels_in_first_appearance_order() {
        let (labels, counts) = transition_counts(&["B", "A", "B", "C"]).unwrap();
        assert_eq!(labels, ["B", "A", "C"]);
        // windows: B→A, A→B, B→C
        assert_eq!(counts[[0, 1]], 1.0);
        assert_eq!(counts[[1, 0]], 1.0);
        assert_eq!(counts[[0, 2]], 1.0);
        assert_eq!(counts.sum(), 3.0);
    }

    #[test]
    fn train_estimates_the_aabb_chain_exactly() {
        // windows A→A, A→B, B→B give count rows [1,1] and [0,1]
        let (labels, counts) = transition_counts(&["A", "A", "B", "B"]).unwrap();
        assert_eq!(labels, ["A", "B"]);
        assert_eq!(counts[[0, 0]], 1.0);
        assert_eq!(counts[[0, 1]], 1.0);
        assert_eq!(counts[[1, 0]], 0.0);
        assert_eq!(counts[[1, 1]], 1.0);

        let mut m = ChainModel::new();
        m.train(&["A", "A", "B", "B"]).unwrap();

        assert_eq!(m.states(), ["A", "B"]);
        assert_eq!(m.transition("A", "A").unwrap(), 0.5);
        assert_eq!(m.transition("A", "B").unwrap(), 0.5);
        assert_eq!(m.transition("B", "A").unwrap(), 0.0);
        assert_eq!(m.transition("B", "B").unwrap(), 1.0);
        m.validate_rows().unwrap();
    }

    #[test]
    fn train_is_deterministic_in_its_input() {
        let obs = ["R", "S", "S", "R", "C", "R", "S"];
        let mut a = ChainModel::new();
        let mut b = ChainModel::new();
        a.train(&obs).unwrap();
        b.train(&obs).unwrap();

        assert_eq!(a.states(), b.states());
        assert_eq!(a.matrix(), b.matrix());
    }

    #[test]
    fn train_replaces_an_existing_model_wholesale() {
        let mut m = ChainModel::new();
        m.add_state("old").unwrap();
        m.set_transition("old", "old", 1.0).unwrap();

        m.train(&["A", "B", "A"]).unwrap();
        assert_eq!(m.states(), ["A", "B"]);
        assert!(!m.contains("old"));
    }

    #[test]
    fn train_fails_whole_on_a_terminal_only_label() {
        let mut m = ChainModel::new();
        m.train(&["A", "B", "A"]).unwrap();
        let states_before = m.states().to_vec();
        let matrix_before = m.matrix().to_owned();

        // "Y" appears only as the final observation: its row has no mass
        let err = m.train(&["X", "Y"]).unwrap_err();
        assert!(matches!(err, Error::DegenerateRow(l) if l == "Y"));
        assert_eq!(m.states(), &states_before[..]);
        assert_eq!(m.matrix().to_owned(), matrix_before);
    }

    #[test]
    fn train_leaves_the_cursor_alone() {
        let mut m = ChainModel::new();
        m.set_current("B");
        m.train(&["A", "B", "A"]).unwrap();
        assert_eq!(m.current_state(), Some("B"));

        // retraining without "B" leaves the cursor stale rather than clearing it
        m.train(&["A", "C", "A"]).unwrap();
        assert_eq!(m.current_state(), Some("B"));
        assert!(matches!(
            m.step_from_draw(0.5),
            Err(crate::Error::UnknownState(l)) if l == "B"
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            .. ProptestConfig::default()
        })]
        #[test]
        fn prop_trained_rows_are_stochastic(
            mut tags in prop::collection::vec(0u8..5, 1..60),
        ) {
            // closing the sequence on its first element guarantees every
            // label has at least one outgoing observation
            tags.push(tags[0]);
            let obs: Vec<String> = tags.iter().map(|t| format!("s{t}")).collect();

            let mut m = ChainModel::new();
            m.train(&obs).unwrap();
            m.validate_rows().unwrap();
            prop_assert!(m.len() <= 5);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            .. ProptestConfig::default()
        })]
        #[test]
        fn prop_counts_row_sums_match_outgoing_occurrences(
            tags in prop::collection::vec(0u8..4, 2..40),
        ) {
            let obs: Vec<String> = tags.iter().map(|t| format!("s{t}")).collect();
            let (labels, counts) = transition_counts(&obs).unwrap();

            for (i, label) in labels.iter().enumerate() {
                // occurrences at non-final positions each contribute one window
                let outgoing = obs[..obs.len() - 1]
                    .iter()
                    .filter(|o| *o == label)
                    .count();
                prop_assert_eq!(counts.row(i).sum(), outgoing as f64);
            }
        }
    }
}
