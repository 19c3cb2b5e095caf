use core::fmt;
use serde::{Deserialize, Serialize};

/// Schnapsen ranks. Discriminants are the trick points, which also give the
/// order of strength within a suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rank {
    Jack = 2,
    Queen = 3,
    King = 4,
    Ten = 10,
    Ace = 11,
}

impl Rank {
    pub const ORDERED: [Rank; 5] = [Rank::Jack, Rank::Queen, Rank::King, Rank::Ten, Rank::Ace];

    pub const fn points(self) -> u32 {
        self as u32
    }

    /// Position of the rank within [`Rank::ORDERED`].
    pub const fn index(self) -> usize {
        match self {
            Rank::Jack => 0,
            Rank::Queen => 1,
            Rank::King => 2,
            Rank::Ten => 3,
            Rank::Ace => 4,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Rank::Jack),
            1 => Some(Rank::Queen),
            2 => Some(Rank::King),
            3 => Some(Rank::Ten),
            4 => Some(Rank::Ace),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ten => "10",
            Rank::Ace => "A",
        };
        f.write_str(text)
    }
}
