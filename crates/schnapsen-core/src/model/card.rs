use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

pub const DECK_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub const fn points(self) -> u32 {
        self.rank.points()
    }

    pub fn is_trump(self, trump: Suit) -> bool {
        self.suit == trump
    }

    /// Returns the other half of a marriage for a King or Queen.
    pub const fn marriage_partner(self) -> Option<Card> {
        match self.rank {
            Rank::King => Some(Card::new(Rank::Queen, self.suit)),
            Rank::Queen => Some(Card::new(Rank::King, self.suit)),
            _ => None,
        }
    }

    /// Whether this card, played in response, takes the trick led by `led`.
    pub fn beats(self, led: Card, trump: Suit) -> bool {
        if self.suit == led.suit {
            self.rank > led.rank
        } else {
            self.suit == trump
        }
    }

    /// Dense identifier in `0..DECK_SIZE`.
    pub const fn to_id(self) -> u8 {
        (self.suit.index() * 5 + self.rank.index()) as u8
    }

    pub const fn from_id(id: u8) -> Option<Card> {
        let id = id as usize;
        if id >= DECK_SIZE {
            return None;
        }
        match (Rank::from_index(id % 5), Suit::from_index(id / 5)) {
            (Some(rank), Some(suit)) => Some(Card::new(rank, suit)),
            _ => None,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

#[cfg(test)]
mod tests {
    use super::{Card, DECK_SIZE, Rank, Suit};

    #[test]
    fn trump_beats_any_plain_card() {
        let led = Card::new(Rank::Ace, Suit::Clubs);
        let trump = Card::new(Rank::Jack, Suit::Hearts);
        assert!(trump.beats(led, Suit::Hearts));
        assert!(!led.beats(trump, Suit::Hearts));
    }

    #[test]
    fn off_suit_never_beats_the_lead() {
        let led = Card::new(Rank::Jack, Suit::Clubs);
        let discard = Card::new(Rank::Ace, Suit::Spades);
        assert!(!discard.beats(led, Suit::Hearts));
    }

    #[test]
    fn ten_outranks_king_within_suit() {
        let led = Card::new(Rank::King, Suit::Diamonds);
        assert!(Card::new(Rank::Ten, Suit::Diamonds).beats(led, Suit::Clubs));
        assert!(!Card::new(Rank::Queen, Suit::Diamonds).beats(led, Suit::Clubs));
    }

    #[test]
    fn marriage_partner_pairs_king_and_queen() {
        let king = Card::new(Rank::King, Suit::Spades);
        assert_eq!(king.marriage_partner(), Some(Card::new(Rank::Queen, Suit::Spades)));
        assert_eq!(Card::new(Rank::Ace, Suit::Spades).marriage_partner(), None);
    }

    #[test]
    fn ids_are_dense_and_unique() {
        let mut seen = [false; DECK_SIZE];
        for id in 0..DECK_SIZE as u8 {
            let card = Card::from_id(id).expect("valid id");
            assert_eq!(card.to_id(), id);
            assert!(!seen[id as usize]);
            seen[id as usize] = true;
        }
        assert_eq!(Card::from_id(DECK_SIZE as u8), None);
    }

    #[test]
    fn display_is_rank_then_suit() {
        assert_eq!(Card::new(Rank::Ten, Suit::Hearts).to_string(), "10H");
    }
}
