//! Player-relative knowledge of a game.
//!
//! - `information_set`: one player's exact hand plus the public record and
//!   everything inferred from it.
//! - `determinizer`: samples full game states consistent with an
//!   information set.

mod determinizer;
mod information_set;

pub use determinizer::{DeterminizeError, Determinizer};
pub use information_set::InformationSet;
