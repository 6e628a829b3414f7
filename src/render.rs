//! Plain-text tabular rendering of a chain.
//!
//! One header line of tab-led labels, then one line per state with its
//! outgoing weights fixed to 3 decimals. A diagnostic format for eyeballing
//! a matrix, not a serialization: it is not meant to be re-parsed and makes
//! no round-trip guarantee.

use crate::chain::ChainModel;
use std::fmt;

impl fmt::Display for ChainModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let matrix = self.matrix();
        for label in self.states() {
            write!(f, "\t{label}")?;
        }
        for (i, label) in self.states().iter().enumerate() {
            write!(f, "\n{label}")?;
            for j in 0..self.len() {
                write!(f, "\t{:.3}", matrix[[i, j]])?;
            }
        }
        Ok(())
    }
}

impl ChainModel {
    /// The [`fmt::Display`] rendering as an owned `String`.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_tab_separated_table() {
        let mut m = ChainModel::new();
        m.add_state("A").unwrap();
        m.add_state("B").unwrap();
        m.set_transition("A", "A", 0.25).unwrap();
        m.set_transition("A", "B", 0.75).unwrap();
        m.set_transition("B", "A", 1.0 / 3.0).unwrap();
        m.set_transition("B", "B", 2.0 / 3.0).unwrap();

        assert_eq!(m.to_text(), "\tA\tB\nA\t0.250\t0.750\nB\t0.333\t0.667");
    }

    #[test]
    fn weights_are_fixed_to_three_decimals() {
        let mut m = ChainModel::new();
        m.add_state("A").unwrap();
        m.set_transition("A", "A", 1.0).unwrap();
        assert_eq!(m.to_text(), "\tA\nA\t1.000");
    }

    #[test]
    fn an_empty_chain_renders_as_an_empty_string() {
        let m = ChainModel::new();
        assert_eq!(m.to_text(), "");
    }
}
