//! Sampling of full game states consistent with an information set.

use super::InformationSet;
use crate::game::{GameState, ZoneViolation};
use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::PlayerId;
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

/// Assigns every unseen card to the opponent's hand or the talon.
///
/// Cards of a suit the opponent is known to lack are forced into the talon;
/// the opponent's unrevealed cards are a uniform subset of the remaining
/// candidates and the talon order is a uniform shuffle, so every assignment
/// consistent with the constraints is equally likely.
#[derive(Debug, Default)]
pub struct Determinizer;

impl Determinizer {
    pub fn determinize<R: Rng + ?Sized>(
        info: &InformationSet,
        rng: &mut R,
    ) -> Result<GameState, DeterminizeError> {
        let me = info.perspective();
        let opponent = info.opponent();
        let public = info.public();

        let revealed = public.revealed(opponent);
        let hand_size = public.hand_size(opponent);
        if revealed.len() > hand_size {
            return Err(DeterminizeError::TooManyRevealed {
                player: opponent,
                revealed: revealed.len(),
                hand_size,
            });
        }
        let voids = public.voids(opponent);
        if let Some(card) = revealed.iter().copied().find(|card| voids.contains(card.suit)) {
            return Err(DeterminizeError::RevealedInVoidSuit {
                player: opponent,
                card,
            });
        }

        let (mut candidates, forced): (Vec<Card>, Vec<Card>) = info
            .unseen_cards()
            .into_iter()
            .partition(|card| !voids.contains(card.suit));
        let needed = hand_size - revealed.len();
        if candidates.len() < needed {
            return Err(DeterminizeError::InsufficientCandidates {
                player: opponent,
                needed,
                available: candidates.len(),
            });
        }

        candidates.shuffle(rng);
        let mut talon = candidates.split_off(needed);
        talon.extend(forced);
        if talon.len() != public.talon_len() {
            return Err(DeterminizeError::TalonMismatch {
                expected: public.talon_len(),
                found: talon.len(),
            });
        }
        talon.shuffle(rng);

        let mut opponent_cards = revealed.to_vec();
        opponent_cards.extend(candidates);
        let mut hands = [Hand::new(), Hand::new()];
        hands[me.index()] = info.hand().clone();
        hands[opponent.index()] = Hand::with_cards(opponent_cards);

        let state = GameState::from_parts(public.clone(), hands, talon);
        state.verify_zones().map_err(DeterminizeError::Zones)?;
        Ok(state)
    }
}

/// The recorded constraints admit no full state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeterminizeError {
    TooManyRevealed {
        player: PlayerId,
        revealed: usize,
        hand_size: usize,
    },
    RevealedInVoidSuit { player: PlayerId, card: Card },
    InsufficientCandidates {
        player: PlayerId,
        needed: usize,
        available: usize,
    },
    TalonMismatch { expected: usize, found: usize },
    Zones(ZoneViolation),
}

impl fmt::Display for DeterminizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inconsistent information set: ")?;
        match self {
            DeterminizeError::TooManyRevealed {
                player,
                revealed,
                hand_size,
            } => write!(
                f,
                "{revealed} cards revealed for {player} who holds {hand_size}"
            ),
            DeterminizeError::RevealedInVoidSuit { player, card } => {
                write!(f, "{player} is void in the suit of revealed {card}")
            }
            DeterminizeError::InsufficientCandidates {
                player,
                needed,
                available,
            } => write!(
                f,
                "{player} needs {needed} more cards but only {available} fit"
            ),
            DeterminizeError::TalonMismatch { expected, found } => {
                write!(f, "talon should hold {expected} cards, {found} left over")
            }
            DeterminizeError::Zones(violation) => write!(f, "{violation}"),
        }
    }
}

impl std::error::Error for DeterminizeError {}

#[cfg(test)]
mod tests {
    use super::Determinizer;
    use crate::game::GameState;
    use crate::info::InformationSet;
    use crate::model::deck::Deck;
    use crate::model::player::PlayerId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn keeps_own_hand_and_public_record() {
        let state = GameState::deal(&Deck::shuffled_with_seed(21), PlayerId::One);
        let info = InformationSet::from_state(&state, PlayerId::One);
        let mut rng = StdRng::seed_from_u64(9);
        let sample = Determinizer::determinize(&info, &mut rng).unwrap();
        assert_eq!(sample.hand(PlayerId::One), state.hand(PlayerId::One));
        assert_eq!(sample.public(), state.public());
        assert_eq!(sample.talon().len(), 9);
    }

    #[test]
    fn samples_vary_with_the_rng() {
        let state = GameState::deal(&Deck::shuffled_with_seed(4), PlayerId::Two);
        let info = InformationSet::from_state(&state, PlayerId::Two);
        let mut rng = StdRng::seed_from_u64(1);
        let first = Determinizer::determinize(&info, &mut rng).unwrap();
        let distinct = (0..20)
            .map(|_| Determinizer::determinize(&info, &mut rng).unwrap())
            .any(|sample| sample.hand(PlayerId::One) != first.hand(PlayerId::One));
        assert!(distinct);
    }
}
