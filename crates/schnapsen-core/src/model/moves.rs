use crate::model::card::Card;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

/// A single public action by the player to move.
///
/// Leading may take several moves: an optional trump-Jack exchange, an
/// optional close, an optional marriage declaration, then the card itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    PlayCard(Card),
    /// Declares King and Queen of the suit; the next move must lead one of them.
    DeclareMarriage(Suit),
    CloseTalon,
    ExchangeTrumpJack,
}

impl Move {
    pub const fn card(self) -> Option<Card> {
        match self {
            Move::PlayCard(card) => Some(card),
            _ => None,
        }
    }

    /// Whether the move hands the turn on (only card plays do).
    pub const fn ends_turn(self) -> bool {
        matches!(self, Move::PlayCard(_))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::PlayCard(card) => write!(f, "{card}"),
            Move::DeclareMarriage(suit) => write!(f, "marriage {suit}"),
            Move::CloseTalon => f.write_str("close"),
            Move::ExchangeTrumpJack => f.write_str("exchange"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Move;
    use crate::model::card::Card;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    #[test]
    fn only_card_plays_end_the_turn() {
        assert!(Move::PlayCard(Card::new(Rank::Ace, Suit::Clubs)).ends_turn());
        assert!(!Move::CloseTalon.ends_turn());
        assert!(!Move::DeclareMarriage(Suit::Hearts).ends_turn());
        assert!(!Move::ExchangeTrumpJack.ends_turn());
    }

    #[test]
    fn display_labels() {
        assert_eq!(Move::PlayCard(Card::new(Rank::Queen, Suit::Spades)).to_string(), "QS");
        assert_eq!(Move::DeclareMarriage(Suit::Hearts).to_string(), "marriage H");
    }

    #[test]
    fn moves_serialize_as_tagged_values() {
        let json = serde_json::to_string(&Move::PlayCard(Card::new(Rank::Ten, Suit::Diamonds)))
            .expect("serialize move");
        assert_eq!(json, r#"{"PlayCard":{"rank":"Ten","suit":"Diamonds"}}"#);
        let back: Move = serde_json::from_str(r#""CloseTalon""#).expect("deserialize move");
        assert_eq!(back, Move::CloseTalon);
    }
}
