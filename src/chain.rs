//! The ChainModel component: state registry, transition matrix, cursor.
//!
//! A [`ChainModel`] couples three pieces that must never drift apart:
//!
//! - an ordered registry of unique state labels (insertion order is index
//!   order),
//! - a square weight matrix, `matrix[[i, j]]` = weight of moving from
//!   `states[i]` to `states[j]`,
//! - a current-state cursor used by [`ChainModel::step`].
//!
//! A derived label→index map shadows the registry so label lookups are O(1);
//! the ordered registry stays the source of truth for iteration order.
//!
//! Weights are plain nonnegative numbers, not enforced probabilities: rows
//! may be built up incrementally across several [`ChainModel::set_transition`]
//! calls and only become row-stochastic through [`ChainModel::normalize`].
//! The strict write-time row check exists but is opt-in
//! ([`ChainModel::set_strict_rows`]), off by default.
//!
//! Positional indices are invalidated by [`ChainModel::delete_state`] (later
//! states shift down one slot); only label-based access is stable across
//! mutations.

use crate::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::Rng;
use std::collections::HashMap;

/// Tolerance for row-sum checks: the opt-in strict write check,
/// [`ChainModel::validate_rows`], and the postcondition of
/// [`ChainModel::normalize`] all compare row sums to 1 within this epsilon.
pub const ROW_SUM_EPSILON: f64 = 1e-10;

/// Placeholder rendered into [`Error::UnknownState`] when the cursor is unset.
const UNSET: &str = "(unset)";

/// A discrete-time, finite-state Markov chain.
#[derive(Debug, Clone)]
pub struct ChainModel {
    states: Vec<String>,
    index: HashMap<String, usize>,
    matrix: Array2<f64>,
    current: Option<String>,
    strict_rows: bool,
}

impl Default for ChainModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainModel {
    /// An empty chain: no states, a 0×0 matrix, unset cursor, strict row
    /// validation off.
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            index: HashMap::new(),
            matrix: Array2::zeros((0, 0)),
            current: None,
            strict_rows: false,
        }
    }

    /// Builds a chain directly from an ordered label list and a square weight
    /// matrix (e.g. a hand-built or externally estimated chain).
    ///
    /// Validates that labels are unique and that `matrix` is square with side
    /// `states.len()`. Deliberately does **not** demand row-stochasticity;
    /// write-time validation is off by default everywhere in this crate.
    pub fn from_parts(states: Vec<String>, matrix: Array2<f64>) -> Result<Self> {
        let n = states.len();
        if matrix.nrows() != n || matrix.ncols() != n {
            return Err(Error::ShapeMismatch {
                left: (matrix.nrows(), matrix.ncols()),
                right: (n, n),
            });
        }
        let mut index = HashMap::with_capacity(n);
        for (i, label) in states.iter().enumerate() {
            if index.insert(label.clone(), i).is_some() {
                return Err(Error::DuplicateState(label.clone()));
            }
        }
        Ok(Self {
            states,
            index,
            matrix,
            current: None,
            strict_rows: false,
        })
    }

    /// Number of registered states (also the matrix side length).
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Registered labels in index order.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Position of `label` in the registry, if registered. Positions are not
    /// stable across [`Self::delete_state`] or [`Self::sort_states_like`].
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// The full weight matrix, rows and columns in registry order.
    pub fn matrix(&self) -> ArrayView2<'_, f64> {
        self.matrix.view()
    }

    /// The outgoing weight row for `label`.
    pub fn row(&self, label: &str) -> Result<ArrayView1<'_, f64>> {
        let i = self
            .index_of(label)
            .ok_or_else(|| Error::UnknownState(label.to_string()))?;
        Ok(self.matrix.row(i))
    }

    /// The weight of the `from → to` transition.
    pub fn transition(&self, from: &str, to: &str) -> Result<f64> {
        let r = self
            .index_of(from)
            .ok_or_else(|| Error::UnknownState(from.to_string()))?;
        let c = self
            .index_of(to)
            .ok_or_else(|| Error::UnknownState(to.to_string()))?;
        Ok(self.matrix[[r, c]])
    }

    /// Registers `label` as the next state, growing the matrix by one row and
    /// one column of zeros. Existing cells keep their positions.
    pub fn add_state(&mut self, label: impl Into<String>) -> Result<()> {
        self.add_state_with_fill(label, 0.0)
    }

    /// Like [`Self::add_state`], but seeds the new row and column with `fill`.
    pub fn add_state_with_fill(&mut self, label: impl Into<String>, fill: f64) -> Result<()> {
        let label = label.into();
        if self.index.contains_key(&label) {
            return Err(Error::DuplicateState(label));
        }

        let n = self.states.len();
        let mut grown = Array2::from_elem((n + 1, n + 1), fill);
        for i in 0..n {
            for j in 0..n {
                grown[[i, j]] = self.matrix[[i, j]];
            }
        }
        self.matrix = grown;
        self.index.insert(label.clone(), n);
        self.states.push(label);
        Ok(())
    }

    /// Removes `label`, its matrix row and its matrix column. States after
    /// the removed index shift down one position.
    ///
    /// The cursor is not touched: if it named the removed label it is now
    /// stale, and the next [`Self::step`] fails with [`Error::UnknownState`]
    /// until the cursor is reset (or the label re-added).
    pub fn delete_state(&mut self, label: &str) -> Result<()> {
        let id = self
            .index_of(label)
            .ok_or_else(|| Error::UnknownState(label.to_string()))?;

        let n = self.states.len();
        let mut shrunk = Array2::<f64>::zeros((n - 1, n - 1));
        for (di, si) in (0..n).filter(|&r| r != id).enumerate() {
            for (dj, sj) in (0..n).filter(|&c| c != id).enumerate() {
                shrunk[[di, dj]] = self.matrix[[si, sj]];
            }
        }
        self.matrix = shrunk;
        self.states.remove(id);
        self.index.remove(label);
        for (i, s) in self.states.iter().enumerate().skip(id) {
            if let Some(slot) = self.index.get_mut(s) {
                *slot = i;
            }
        }
        debug_assert_eq!(self.index.len(), self.states.len());
        Ok(())
    }

    /// Overwrites the `from → to` weight. The row is **not** renormalized.
    ///
    /// With strict row validation on, the row sum is checked after the write
    /// against 1 ± [`ROW_SUM_EPSILON`]; on failure the previous value is
    /// restored and [`Error::InvalidDistribution`] returned, so a failed call
    /// changes nothing.
    pub fn set_transition(&mut self, from: &str, to: &str, weight: f64) -> Result<()> {
        let r = self
            .index_of(from)
            .ok_or_else(|| Error::UnknownState(from.to_string()))?;
        let c = self
            .index_of(to)
            .ok_or_else(|| Error::UnknownState(to.to_string()))?;

        let previous = self.matrix[[r, c]];
        self.matrix[[r, c]] = weight;

        if self.strict_rows {
            let sum = self.matrix.row(r).sum();
            if !sum.is_finite() || (sum - 1.0).abs() > ROW_SUM_EPSILON {
                self.matrix[[r, c]] = previous;
                return Err(Error::InvalidDistribution {
                    label: from.to_string(),
                    sum,
                });
            }
        }
        Ok(())
    }

    /// Toggles the strict write-time row check. Off by default so rows can be
    /// built incrementally across several [`Self::set_transition`] calls.
    pub fn set_strict_rows(&mut self, on: bool) {
        self.strict_rows = on;
    }

    pub fn strict_rows(&self) -> bool {
        self.strict_rows
    }

    /// Moves the cursor to `label` without validating membership, so the
    /// cursor may be set before its state exists; validation is deferred to
    /// [`Self::step`].
    pub fn set_current(&mut self, label: impl Into<String>) {
        self.current = Some(label.into());
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// The cursor, or `None` when unset.
    pub fn current_state(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Checks every row sums to 1 within [`ROW_SUM_EPSILON`], reporting the
    /// first offender. This is the on-demand form of the strict write check
    /// and the postcondition oracle for [`Self::normalize`].
    pub fn validate_rows(&self) -> Result<()> {
        for (i, label) in self.states.iter().enumerate() {
            let sum = self.matrix.row(i).sum();
            if !sum.is_finite() || (sum - 1.0).abs() > ROW_SUM_EPSILON {
                return Err(Error::InvalidDistribution {
                    label: label.clone(),
                    sum,
                });
            }
        }
        Ok(())
    }

    /// Samples the next state with one uniform draw from `rng`, moving the
    /// cursor to it.
    ///
    /// Exactly one draw is consumed per call. See [`Self::step_from_draw`]
    /// for the deterministic core and its failure modes.
    pub fn step(&mut self, rng: &mut impl Rng) -> Result<&str> {
        let u: f64 = rng.random();
        self.step_from_draw(u)
    }

    /// The deterministic core of [`Self::step`]: walks the cursor's row in
    /// state order accumulating weights and selects the first state whose
    /// running sum strictly exceeds `u`, then moves the cursor there and
    /// returns the label.
    ///
    /// `u` must lie in `[0, 1)`. Fails with [`Error::UnknownState`] when the
    /// cursor is unset or stale, and with [`Error::SamplingExhausted`] when
    /// the row's total mass is at or below `u` (a sub-stochastic row's
    /// residual mass selects nothing); the cursor is left unchanged on every
    /// failure path.
    ///
    /// This is public so fixed-draw behavior can be tested without
    /// re-deriving RNG streams.
    pub fn step_from_draw(&mut self, u: f64) -> Result<&str> {
        debug_assert!(u.is_finite() && (0.0..1.0).contains(&u));

        let row = self.cursor_index()?;
        let n = self.states.len();
        let mut acc = 0.0f64;
        let mut hit = None;
        for c in 0..n {
            acc += self.matrix[[row, c]];
            if u < acc {
                hit = Some(c);
                break;
            }
        }

        match hit {
            Some(c) => {
                self.current = Some(self.states[c].clone());
                Ok(&self.states[c])
            }
            None => Err(Error::SamplingExhausted {
                label: self.states[row].clone(),
                draw: u,
                mass: acc,
            }),
        }
    }

    /// Records the current label, then samples `steps` transitions, returning
    /// the full `steps + 1`-label history (walk origin included).
    ///
    /// Fails up front like [`Self::step`] when the cursor is unset or stale.
    pub fn walk(&mut self, steps: usize, rng: &mut impl Rng) -> Result<Vec<String>> {
        let start = self.cursor_index()?;
        let mut history = Vec::with_capacity(steps + 1);
        history.push(self.states[start].clone());
        for _ in 0..steps {
            let next = self.step(rng)?.to_string();
            history.push(next);
        }
        Ok(history)
    }

    /// Divides each row by its sum, making the matrix row-stochastic.
    ///
    /// All row sums are checked first: a row with zero total mass fails with
    /// [`Error::DegenerateRow`] and the matrix is left untouched.
    /// Postcondition: every row sums to 1 within [`ROW_SUM_EPSILON`]
    /// ([`Self::validate_rows`] succeeds).
    pub fn normalize(&mut self) -> Result<()> {
        normalize_rows(&mut self.matrix, &self.states)
    }

    /// Stable-reorders the registry to match the relative order of labels in
    /// `example`, permuting matrix rows and columns identically so every
    /// `from → to` weight keeps its meaning.
    ///
    /// Labels absent from `example` all compare equal with a maximal key:
    /// they sink after the listed labels and keep their relative order among
    /// themselves (undefined-but-stable). Sorting twice by the same example
    /// equals sorting once. The cursor is unaffected (labels do not change).
    pub fn sort_states_like<S: AsRef<str>>(&mut self, example: &[S]) {
        let n = self.states.len();

        // First occurrence wins when `example` repeats a label.
        let mut rank: HashMap<&str, usize> = HashMap::with_capacity(example.len());
        for (pos, e) in example.iter().enumerate() {
            rank.entry(e.as_ref()).or_insert(pos);
        }

        let mut perm: Vec<usize> = (0..n).collect();
        perm.sort_by_key(|&i| rank.get(self.states[i].as_str()).copied().unwrap_or(usize::MAX));

        let states: Vec<String> = perm.iter().map(|&i| self.states[i].clone()).collect();
        let mut matrix = Array2::<f64>::zeros((n, n));
        for (di, &si) in perm.iter().enumerate() {
            for (dj, &sj) in perm.iter().enumerate() {
                matrix[[di, dj]] = self.matrix[[si, sj]];
            }
        }
        self.replace_parts(states, matrix);
    }

    /// Swaps in a freshly built registry + matrix pair and rebuilds the
    /// derived index. Callers guarantee `states` is duplicate-free and
    /// `matrix` is square with side `states.len()`.
    pub(crate) fn replace_parts(&mut self, states: Vec<String>, matrix: Array2<f64>) {
        debug_assert_eq!(matrix.nrows(), states.len());
        debug_assert_eq!(matrix.ncols(), states.len());

        self.index.clear();
        for (i, label) in states.iter().enumerate() {
            self.index.insert(label.clone(), i);
        }
        debug_assert_eq!(self.index.len(), states.len());
        self.states = states;
        self.matrix = matrix;
    }

    /// Resolves the cursor to its row index, failing on an unset or stale
    /// cursor.
    fn cursor_index(&self) -> Result<usize> {
        match self.current.as_deref() {
            None => Err(Error::UnknownState(UNSET.to_string())),
            Some(label) => self
                .index
                .get(label)
                .copied()
                .ok_or_else(|| Error::UnknownState(label.to_string())),
        }
    }
}

/// Rescales each row of `matrix` to unit mass, naming failed rows after
/// `labels`. All sums are computed (and checked nonzero) before any cell is
/// written, so a failure leaves the matrix untouched.
pub(crate) fn normalize_rows(matrix: &mut Array2<f64>, labels: &[String]) -> Result<()> {
    let n = labels.len();
    debug_assert_eq!(matrix.nrows(), n);
    debug_assert_eq!(matrix.ncols(), n);

    let mut sums = Vec::with_capacity(n);
    for (i, label) in labels.iter().enumerate() {
        let sum = matrix.row(i).sum();
        if sum == 0.0 {
            return Err(Error::DegenerateRow(label.clone()));
        }
        sums.push(sum);
    }
    for i in 0..n {
        for j in 0..n {
            matrix[[i, j]] /= sums[i];
        }
    }
    Ok(())
}
