use crate::game::error::{GameError, ZoneViolation};
use crate::game::outcome::Outcome;
use crate::game::public::{DrawSource, HAND_SIZE, PublicState};
use crate::model::card::{Card, DECK_SIZE};
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::moves::Move;
use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use crate::model::trick::TrickResult;

/// Full-information state of one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    public: PublicState,
    hands: [Hand; 2],
    /// Face-down stack; the next card to draw is the last element.
    talon: Vec<Card>,
}

/// One card leaving the stock after a trick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    pub player: PlayerId,
    pub card: Card,
    pub face_up: bool,
}

/// Everything that happened while applying one move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub actor: PlayerId,
    pub mv: Move,
    pub trick: Option<TrickResult>,
    pub draws: Vec<Draw>,
}

/// What one player privately learns from a transition: the face-down card
/// they drew, if any. Public reveals travel through the move history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Observation {
    pub drawn: Option<Card>,
}

impl Transition {
    pub fn observation(&self, viewer: PlayerId) -> Observation {
        Observation {
            drawn: self
                .draws
                .iter()
                .find(|draw| draw.player == viewer && !draw.face_up)
                .map(|draw| draw.card),
        }
    }
}

impl GameState {
    /// Deals five cards to each player, nine face down to the talon and turns
    /// the last card of the deck face up as the trump card.
    pub fn deal(deck: &Deck, leader: PlayerId) -> Self {
        let cards = deck.cards();
        let first = HAND_SIZE;
        let second = 2 * HAND_SIZE;
        let hands = [
            Hand::with_cards(cards[..first].to_vec()),
            Hand::with_cards(cards[first..second].to_vec()),
        ];
        let mut talon = cards[second..DECK_SIZE - 1].to_vec();
        talon.reverse();
        let public = PublicState::new(cards[DECK_SIZE - 1], leader);
        Self {
            public,
            hands,
            talon,
        }
    }

    pub(crate) fn from_parts(public: PublicState, hands: [Hand; 2], talon: Vec<Card>) -> Self {
        Self {
            public,
            hands,
            talon,
        }
    }

    pub fn public(&self) -> &PublicState {
        &self.public
    }

    pub fn hand(&self, player: PlayerId) -> &Hand {
        &self.hands[player.index()]
    }

    pub fn talon(&self) -> &[Card] {
        &self.talon
    }

    pub fn to_move(&self) -> PlayerId {
        self.public.turn()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.public.outcome()
    }

    pub fn is_terminal(&self) -> bool {
        self.public.outcome().is_some()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.public.legal_moves(self.hand(self.to_move()))
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.legal_moves().contains(&mv)
    }

    /// Validates and applies `mv`. On error the state is untouched.
    pub fn apply(&mut self, mv: Move) -> Result<Transition, GameError> {
        if self.is_terminal() {
            return Err(GameError::GameOver);
        }
        if !self.is_legal(mv) {
            return Err(GameError::IllegalMove {
                player: self.to_move(),
                mv,
            });
        }
        let transition = self.apply_unchecked(mv);
        if let Err(violation) = self.verify_zones() {
            panic!("card conservation broken after {mv}: {violation}");
        }
        Ok(transition)
    }

    /// Applies a move already known to be legal. Search rollouts use this to
    /// skip the legality scan.
    pub fn apply_unchecked(&mut self, mv: Move) -> Transition {
        let actor = self.to_move();
        let hand = &mut self.hands[actor.index()];
        match mv {
            Move::PlayCard(card) => {
                let removed = hand.remove(card);
                debug_assert!(removed, "{actor} does not hold {card}");
            }
            Move::ExchangeTrumpJack => {
                if let Some(face_up) = self.public.trump_card() {
                    hand.remove(Card::new(Rank::Jack, self.public.trump()));
                    hand.add(face_up);
                }
            }
            Move::DeclareMarriage(_) | Move::CloseTalon => {}
        }

        let trick = self.public.advance(actor, mv);
        let mut draws = Vec::new();
        while let Some((player, source)) = self.public.take_draw() {
            let (card, face_up) = match source {
                DrawSource::FaceDown => match self.talon.pop() {
                    Some(card) => (card, false),
                    None => break,
                },
                DrawSource::FaceUp(card) => (card, true),
            };
            self.hands[player.index()].add(card);
            draws.push(Draw {
                player,
                card,
                face_up,
            });
        }
        debug_assert!(self.verify_zones().is_ok(), "zones broken after {mv}");

        Transition {
            actor,
            mv,
            trick,
            draws,
        }
    }

    /// Checks that the zones partition the 20-card deck and agree with the
    /// public counts.
    pub fn verify_zones(&self) -> Result<(), ZoneViolation> {
        for player in PlayerId::BOTH {
            let actual = self.hand(player).len();
            let recorded = self.public.hand_size(player);
            if actual != recorded {
                return Err(ZoneViolation::HandSize {
                    player,
                    recorded,
                    actual,
                });
            }
        }
        if self.talon.len() != self.public.talon_len() {
            return Err(ZoneViolation::TalonSize {
                recorded: self.public.talon_len(),
                actual: self.talon.len(),
            });
        }

        let mut seen = [false; DECK_SIZE];
        let mut found = 0;
        let zones = self
            .hands
            .iter()
            .flat_map(|hand| hand.iter().copied())
            .chain(self.talon.iter().copied())
            .chain(self.public.trump_card())
            .chain(self.public.played_cards());
        for card in zones {
            let slot = &mut seen[card.to_id() as usize];
            if *slot {
                return Err(ZoneViolation::Duplicate(card));
            }
            *slot = true;
            found += 1;
        }
        if found != DECK_SIZE {
            return Err(ZoneViolation::CardCount { found });
        }
        Ok(())
    }
}
