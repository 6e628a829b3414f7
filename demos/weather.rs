//! Weather chain, minimal runnable demo.
//!
//! Prints:
//! - the source rainy/cloudy/sunny transition table
//! - a seeded 10-step walk
//! - the chain re-estimated from a longer walk, and its distance to the source

use markovchain::chain::ChainModel;
use markovchain::metrics::{chi_square_statistic, max_abs_deviation};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut weather = ChainModel::new();
    for label in ["R", "C", "S"] {
        weather.add_state(label)?;
    }
    for (from, row) in [
        ("R", [0.2, 0.3, 0.5]),
        ("C", [0.2, 0.5, 0.3]),
        ("S", [0.1, 0.3, 0.6]),
    ] {
        for (to, w) in ["R", "C", "S"].into_iter().zip(row) {
            weather.set_transition(from, to, w)?;
        }
    }
    weather.validate_rows()?;

    println!("source chain:");
    println!("{weather}");
    println!();

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    weather.set_current("S");
    let short = weather.walk(10, &mut rng)?;
    println!("10-step walk from S: {}", short.join(" -> "));
    println!();

    weather.set_current("S");
    let history = weather.walk(5_000, &mut rng)?;
    let mut estimated = ChainModel::new();
    estimated.train(&history)?;
    estimated.sort_states_like(&["R", "C", "S"]);

    println!("chain re-estimated from a 5000-step walk:");
    println!("{estimated}");
    println!();

    let chi2 = chi_square_statistic(&estimated.matrix(), &weather.matrix())?;
    let dev = max_abs_deviation(&estimated.matrix(), &weather.matrix())?;
    println!("chi^2 to source   = {chi2:.5}");
    println!("max abs deviation = {dev:.5}");

    Ok(())
}
