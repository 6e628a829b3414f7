//! # markovchain
//!
//! Discrete-time, finite-state Markov chains as a library primitive.
//!
//! This crate is intentionally small:
//!
//! - it implements one stateful component, [`chain::ChainModel`]: an ordered
//!   state registry kept in lockstep with a square transition-weight matrix
//!   and a current-state cursor,
//! - it supports mutating states and weights, sampling a random walk, and
//!   estimating ("training") a transition matrix from an observed sequence
//!   by frequency counting and row normalization,
//! - it does not provide persistence, continuous-time chains, or
//!   hidden-Markov inference (those belong elsewhere).
//!
//! ## Public invariants (must not change)
//!
//! - **Registry and matrix move together**: after every operation,
//!   `states.len() == matrix.nrows() == matrix.ncols()` and the label→index
//!   map agrees with the ordered registry. A mutator that fails changes
//!   nothing.
//! - **Determinism knobs are explicit**: sampling takes
//!   `&mut impl rand::Rng`; the crate never owns a hidden RNG.
//!   [`chain::ChainModel::step_from_draw`] exposes the draw itself.
//! - **No hidden normalization**: writing a weight never renormalizes its
//!   row. Rows become row-stochastic only through
//!   [`chain::ChainModel::normalize`] (or `train`, which ends with the same
//!   rescaling), and those state the postcondition in their doc comments.
//!
//! ## Module map
//!
//! - `chain`: the ChainModel component (registry, matrix, cursor, sampling)
//! - `estimate`: maximum-likelihood estimation from an observed sequence
//! - `metrics`: chi-square / cellwise-deviation comparison of two matrices
//! - `render`: plain-text tabular rendering (the sole output channel)

pub mod chain;
pub mod estimate;
pub mod metrics;
pub mod render;

/// markovchain error variants.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `add_state` with a label already in the registry.
    #[error("state '{0}' already exists")]
    DuplicateState(String),

    /// A referenced label (or the cursor itself) is not a registered state.
    #[error("'{0}' is not a defined state")]
    UnknownState(String),

    /// Opt-in strict check: a row's weights do not sum to 1 within
    /// [`chain::ROW_SUM_EPSILON`].
    #[error("transitions out of '{label}' sum to {sum}, expected 1")]
    InvalidDistribution { label: String, sum: f64 },

    /// `normalize` on a row with zero total mass.
    #[error("transitions out of '{0}' have zero total mass; cannot normalize")]
    DegenerateRow(String),

    /// `train` needs at least two observations to see one transition.
    #[error("training needs at least 2 observations, got {0}")]
    InsufficientData(usize),

    /// `step` walked the whole row without the cumulative weight exceeding
    /// the draw (the row's total mass is below 1).
    #[error(
        "row for '{label}' exhausted at cumulative mass {mass} without exceeding draw {draw}"
    )]
    SamplingExhausted { label: String, draw: f64, mass: f64 },

    /// Two compared matrices (or a label list and its matrix) disagree in
    /// shape.
    #[error("shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    /// Domain error: an input cell or argument violates a precondition.
    #[error("domain error: {0}")]
    Domain(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
