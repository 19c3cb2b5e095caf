//! One player's view of a game in progress.

use crate::game::{DrawSource, GameError, GameState, Observation, PublicState};
use crate::model::card::{Card, DECK_SIZE};
use crate::model::hand::Hand;
use crate::model::moves::Move;
use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use crate::model::suit::SuitMask;

/// Own hand plus the public record, as seen from `perspective`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InformationSet {
    perspective: PlayerId,
    public: PublicState,
    hand: Hand,
}

impl InformationSet {
    /// Projects a full state onto what `perspective` may know.
    pub fn from_state(state: &GameState, perspective: PlayerId) -> Self {
        Self {
            perspective,
            public: state.public().clone(),
            hand: state.hand(perspective).clone(),
        }
    }

    pub fn perspective(&self) -> PlayerId {
        self.perspective
    }

    pub fn opponent(&self) -> PlayerId {
        self.perspective.other()
    }

    pub fn public(&self) -> &PublicState {
        &self.public
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn to_move(&self) -> PlayerId {
        self.public.turn()
    }

    pub fn is_my_turn(&self) -> bool {
        self.public.turn() == self.perspective && !self.is_terminal()
    }

    pub fn is_terminal(&self) -> bool {
        self.public.outcome().is_some()
    }

    pub fn history(&self) -> &[Move] {
        self.public.history()
    }

    /// Suits the opponent has been shown not to hold.
    pub fn opponent_voids(&self) -> SuitMask {
        self.public.voids(self.opponent())
    }

    /// Cards publicly known to be in the opponent's hand.
    pub fn opponent_known(&self) -> &[Card] {
        self.public.revealed(self.opponent())
    }

    /// Legal moves for the owner; empty when it is not their turn.
    pub fn legal_moves(&self) -> Vec<Move> {
        if !self.is_my_turn() {
            return Vec::new();
        }
        self.public.legal_moves(&self.hand)
    }

    /// Cards whose location is unknown: in the talon or in the opponent's
    /// hand without having been revealed.
    pub fn unseen_cards(&self) -> Vec<Card> {
        let mut seen = [false; DECK_SIZE];
        let known = self
            .hand
            .iter()
            .copied()
            .chain(self.public.played_cards())
            .chain(self.public.trump_card())
            .chain(self.opponent_known().iter().copied());
        for card in known {
            seen[card.to_id() as usize] = true;
        }
        (0..DECK_SIZE as u8)
            .filter(|id| !seen[*id as usize])
            .filter_map(Card::from_id)
            .collect()
    }

    /// Folds one move into the view. `observation` must carry the card the
    /// owner drew face down, if the move completed a trick that triggered
    /// a draw. On error the information set is left unchanged.
    pub fn update(
        &mut self,
        mv: Move,
        is_own_move: bool,
        observation: &Observation,
    ) -> Result<(), GameError> {
        if self.is_terminal() {
            return Err(GameError::GameOver);
        }
        let actor = if is_own_move {
            self.perspective
        } else {
            self.opponent()
        };
        let expected = self.public.turn();
        if actor != expected {
            return Err(GameError::OutOfTurn { expected, actual: actor });
        }
        if is_own_move {
            if !self.public.legal_moves(&self.hand).contains(&mv) {
                return Err(GameError::IllegalMove { player: actor, mv });
            }
        } else if !self.opponent_may_play(mv) {
            return Err(GameError::IllegalMove { player: actor, mv });
        }

        let mut next = self.clone();
        next.apply_move(actor, mv, observation)?;
        *self = next;
        Ok(())
    }

    fn apply_move(
        &mut self,
        actor: PlayerId,
        mv: Move,
        observation: &Observation,
    ) -> Result<(), GameError> {
        if actor == self.perspective {
            match mv {
                Move::PlayCard(card) => {
                    self.hand.remove(card);
                }
                Move::ExchangeTrumpJack => {
                    if let Some(face_up) = self.public.trump_card() {
                        self.hand.remove(Card::new(Rank::Jack, self.public.trump()));
                        self.hand.add(face_up);
                    }
                }
                Move::DeclareMarriage(_) | Move::CloseTalon => {}
            }
        }

        self.public.advance(actor, mv);
        while let Some((player, source)) = self.public.take_draw() {
            if player != self.perspective {
                continue;
            }
            let card = match source {
                DrawSource::FaceUp(card) => card,
                DrawSource::FaceDown => observation
                    .drawn
                    .ok_or(GameError::MissingDraw { player })?,
            };
            self.hand.add(card);
        }
        Ok(())
    }

    /// Cheap plausibility check for a move whose legality we cannot verify
    /// without the opponent's hand.
    fn opponent_may_play(&self, mv: Move) -> bool {
        let Move::PlayCard(card) = mv else {
            return true;
        };
        if self.hand.contains(card) || self.public.trump_card() == Some(card) {
            return false;
        }
        if self.public.played_cards().any(|played| played == card) {
            return false;
        }
        match self.public.announced() {
            Some(suit) => {
                card.suit == suit && matches!(card.rank, Rank::King | Rank::Queen)
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InformationSet;
    use crate::game::{GameError, GameState, Observation};
    use crate::model::deck::Deck;
    use crate::model::moves::Move;
    use crate::model::player::PlayerId;

    #[test]
    fn fourteen_cards_start_unseen() {
        let state = GameState::deal(&Deck::shuffled_with_seed(3), PlayerId::One);
        let info = InformationSet::from_state(&state, PlayerId::Two);
        assert_eq!(info.unseen_cards().len(), 14);
        assert!(!info.is_my_turn());
        assert!(info.legal_moves().is_empty());
    }

    #[test]
    fn own_draw_requires_observation() {
        let mut state = GameState::deal(&Deck::shuffled_with_seed(11), PlayerId::One);
        let mut info = InformationSet::from_state(&state, PlayerId::One);
        let lead = state.legal_moves()[0];
        let first = state.apply(lead).unwrap();
        info.update(lead, true, &first.observation(PlayerId::One))
            .unwrap();

        let reply = state.legal_moves()[0];
        let before = info.clone();
        let err = info
            .update(reply, false, &Observation::default())
            .unwrap_err();
        assert_eq!(err, GameError::MissingDraw { player: PlayerId::One });
        assert_eq!(info, before);

        let second = state.apply(reply).unwrap();
        info.update(reply, false, &second.observation(PlayerId::One))
            .unwrap();
        assert_eq!(info.hand(), state.hand(PlayerId::One));
    }

    #[test]
    fn rejects_opponent_card_we_hold() {
        let state = GameState::deal(&Deck::shuffled_with_seed(5), PlayerId::One);
        let mut info = InformationSet::from_state(&state, PlayerId::Two);
        let ours = info.hand().cards()[0];
        assert!(matches!(
            info.update(Move::PlayCard(ours), false, &Observation::default()),
            Err(GameError::IllegalMove { .. })
        ));
    }
}
