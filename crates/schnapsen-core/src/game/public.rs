use crate::game::outcome::{EndReason, Outcome};
use crate::model::card::{Card, DECK_SIZE};
use crate::model::hand::Hand;
use crate::model::moves::Move;
use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use crate::model::score::{ScoreBoard, game_points_against};
use crate::model::suit::{Suit, SuitMask};
use crate::model::trick::{Trick, TrickResult};

pub const HAND_SIZE: usize = 5;
/// Face-down cards left after the deal; the face-up trump card is counted apart.
pub const INITIAL_TALON: usize = DECK_SIZE - 2 * HAND_SIZE - 1;

/// Where the next drawn card comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawSource {
    FaceDown,
    FaceUp(Card),
}

/// Everything both players can see at the table.
///
/// The full [`GameState`](crate::game::GameState) and every
/// [`InformationSet`](crate::info::InformationSet) drive the same public
/// record through [`PublicState::advance`], so legality and scoring have a
/// single source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicState {
    trump: Suit,
    trump_card: Option<Card>,
    talon_len: usize,
    hand_sizes: [usize; 2],
    turn: PlayerId,
    trick: Trick,
    won: [Vec<Card>; 2],
    scores: ScoreBoard,
    marriages: Vec<(PlayerId, Suit)>,
    announced: Option<Suit>,
    closed_by: Option<PlayerId>,
    closing_stake: Option<u32>,
    revealed: [Vec<Card>; 2],
    voids: [SuitMask; 2],
    history: Vec<Move>,
    last_trick: Option<TrickResult>,
    pending_draws: u8,
    outcome: Option<Outcome>,
}

impl PublicState {
    pub(crate) fn new(trump_card: Card, leader: PlayerId) -> Self {
        Self {
            trump: trump_card.suit,
            trump_card: Some(trump_card),
            talon_len: INITIAL_TALON,
            hand_sizes: [HAND_SIZE; 2],
            turn: leader,
            trick: Trick::new(leader),
            won: [Vec::new(), Vec::new()],
            scores: ScoreBoard::new(),
            marriages: Vec::new(),
            announced: None,
            closed_by: None,
            closing_stake: None,
            revealed: [Vec::new(), Vec::new()],
            voids: [SuitMask::EMPTY; 2],
            history: Vec::new(),
            last_trick: None,
            pending_draws: 0,
            outcome: None,
        }
    }

    pub fn trump(&self) -> Suit {
        self.trump
    }

    /// The face-up card under the talon, until it is drawn.
    pub fn trump_card(&self) -> Option<Card> {
        self.trump_card
    }

    /// Face-down cards left in the talon.
    pub fn talon_len(&self) -> usize {
        self.talon_len
    }

    /// Cards still available to draw, face-up card included.
    pub fn stock_len(&self) -> usize {
        self.talon_len + usize::from(self.trump_card.is_some())
    }

    pub fn hand_size(&self, player: PlayerId) -> usize {
        self.hand_sizes[player.index()]
    }

    pub fn turn(&self) -> PlayerId {
        self.turn
    }

    pub fn trick(&self) -> &Trick {
        &self.trick
    }

    pub fn won_cards(&self, player: PlayerId) -> &[Card] {
        &self.won[player.index()]
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    pub fn marriages(&self) -> &[(PlayerId, Suit)] {
        &self.marriages
    }

    /// The marriage declared this turn whose card has not been played yet.
    pub fn announced(&self) -> Option<Suit> {
        self.announced
    }

    pub fn closed_by(&self) -> Option<PlayerId> {
        self.closed_by
    }

    /// Opponent's banked score when the talon was closed.
    pub fn closing_stake(&self) -> Option<u32> {
        self.closing_stake
    }

    pub fn is_closed(&self) -> bool {
        self.closed_by.is_some()
    }

    /// Cards publicly known to sit in `player`'s hand.
    pub fn revealed(&self, player: PlayerId) -> &[Card] {
        &self.revealed[player.index()]
    }

    /// Suits `player` is known not to hold.
    pub fn voids(&self, player: PlayerId) -> SuitMask {
        self.voids[player.index()]
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn last_trick(&self) -> Option<&TrickResult> {
        self.last_trick.as_ref()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Strict follow rules apply once the talon is closed or exhausted.
    pub fn strict_rules(&self) -> bool {
        self.is_closed() || self.stock_len() == 0
    }

    pub fn is_leading(&self) -> bool {
        self.trick.is_empty()
    }

    /// Cards that left every hand for good: won tricks and the open trick.
    pub fn played_cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.won
            .iter()
            .flatten()
            .copied()
            .chain(self.trick.plays().iter().map(|play| play.card))
    }

    pub fn legal_moves(&self, hand: &Hand) -> Vec<Move> {
        if self.outcome.is_some() || self.pending_draws > 0 {
            return Vec::new();
        }
        if let Some(suit) = self.announced {
            return [Rank::King, Rank::Queen]
                .into_iter()
                .map(|rank| Card::new(rank, suit))
                .filter(|card| hand.contains(*card))
                .map(Move::PlayCard)
                .collect();
        }
        let Some(led) = self.trick.lead_card() else {
            return self.leading_moves(hand);
        };
        if !self.strict_rules() {
            return hand.iter().copied().map(Move::PlayCard).collect();
        }
        follow_options(hand, led, self.trump)
            .into_iter()
            .map(Move::PlayCard)
            .collect()
    }

    fn leading_moves(&self, hand: &Hand) -> Vec<Move> {
        let mut moves: Vec<Move> = hand.iter().copied().map(Move::PlayCard).collect();
        moves.extend(
            Suit::ALL
                .into_iter()
                .filter(|suit| hand.has_marriage(*suit))
                .map(Move::DeclareMarriage),
        );
        if self.closed_by.is_none() && self.stock_len() >= 2 {
            moves.push(Move::CloseTalon);
        }
        if !self.strict_rules()
            && self.trump_card.is_some()
            && hand.contains(Card::new(Rank::Jack, self.trump))
        {
            moves.push(Move::ExchangeTrumpJack);
        }
        moves
    }

    /// Applies `mv` by `actor` to the public record. The caller has already
    /// checked legality and updated whatever private hands it tracks.
    pub(crate) fn advance(&mut self, actor: PlayerId, mv: Move) -> Option<TrickResult> {
        debug_assert_eq!(actor, self.turn, "{actor} moved out of turn");
        self.history.push(mv);
        match mv {
            Move::CloseTalon => {
                self.closed_by = Some(actor);
                self.closing_stake = Some(self.scores.score(actor.other()));
                None
            }
            Move::ExchangeTrumpJack => {
                let jack = Card::new(Rank::Jack, self.trump);
                if let Some(previous) = self.trump_card.replace(jack) {
                    self.reveal(actor, previous);
                }
                self.revealed[actor.index()].retain(|card| *card != jack);
                None
            }
            Move::DeclareMarriage(suit) => {
                let points = if suit == self.trump { 40 } else { 20 };
                self.scores.declare_marriage(actor, points);
                self.marriages.push((actor, suit));
                self.announced = Some(suit);
                self.reveal(actor, Card::new(Rank::King, suit));
                self.reveal(actor, Card::new(Rank::Queen, suit));
                None
            }
            Move::PlayCard(card) => self.play_card(actor, card),
        }
    }

    fn play_card(&mut self, actor: PlayerId, card: Card) -> Option<TrickResult> {
        let idx = actor.index();
        self.announced = None;
        self.hand_sizes[idx] = self.hand_sizes[idx].saturating_sub(1);
        self.revealed[idx].retain(|known| *known != card);
        let played = self.trick.play(actor, card);
        debug_assert!(played.is_ok(), "trick rejected {card}: {played:?}");
        self.turn = actor.other();

        let result = self.trick.resolve(self.trump)?;
        if self.strict_rules() {
            self.infer_voids(&result);
        }
        let winner = result.winner;
        self.won[winner.index()].extend(result.cards());
        self.scores.add_trick(winner, result.points);
        self.trick = Trick::new(winner);
        self.turn = winner;
        self.last_trick = Some(result);
        self.outcome = self.settle(winner);
        if self.outcome.is_none() && !self.is_closed() && self.stock_len() > 0 {
            self.pending_draws = 2;
        }
        Some(result)
    }

    /// Takes the next draw after a trick, winner first. Returns `None` once
    /// both players have drawn.
    pub(crate) fn take_draw(&mut self) -> Option<(PlayerId, DrawSource)> {
        let last_winner = self.last_trick?.winner;
        let player = match self.pending_draws {
            2 => last_winner,
            1 => last_winner.other(),
            _ => return None,
        };
        self.pending_draws -= 1;
        let source = if self.talon_len > 0 {
            self.talon_len -= 1;
            DrawSource::FaceDown
        } else if let Some(card) = self.trump_card.take() {
            self.reveal(player, card);
            DrawSource::FaceUp(card)
        } else {
            self.pending_draws = 0;
            return None;
        };
        self.hand_sizes[player.index()] += 1;
        Some((player, source))
    }

    fn reveal(&mut self, player: PlayerId, card: Card) {
        let known = &mut self.revealed[player.index()];
        if !known.contains(&card) {
            known.push(card);
        }
    }

    fn infer_voids(&mut self, result: &TrickResult) {
        let led = result.lead.card.suit;
        let replied = result.reply.card.suit;
        if replied == led {
            return;
        }
        let voids = &mut self.voids[result.reply.player.index()];
        voids.insert(led);
        if replied != self.trump {
            voids.insert(self.trump);
        }
    }

    fn settle(&self, last_winner: PlayerId) -> Option<Outcome> {
        let hands_empty = self.hand_sizes.iter().all(|size| *size == 0);
        if let Some(closer) = self.closed_by {
            if self.scores.has_reached_target(closer) {
                return Some(self.outcome_for(closer, EndReason::ReachedTarget));
            }
            if self.scores.has_reached_target(closer.other()) || hands_empty {
                let stake = self.closing_stake.unwrap_or(0);
                return Some(Outcome {
                    winner: closer.other(),
                    game_points: game_points_against(stake).max(2),
                    reason: EndReason::ClosingForfeit,
                    scores: self.scores.standings(),
                });
            }
            return None;
        }
        if self.scores.has_reached_target(last_winner) {
            Some(self.outcome_for(last_winner, EndReason::ReachedTarget))
        } else if hands_empty {
            Some(self.outcome_for(last_winner, EndReason::LastTrick))
        } else {
            None
        }
    }

    fn outcome_for(&self, winner: PlayerId, reason: EndReason) -> Outcome {
        Outcome {
            winner,
            game_points: game_points_against(self.scores.score(winner.other())),
            reason,
            scores: self.scores.standings(),
        }
    }
}

/// Cards a responder may play under the strict rules: a higher card of the
/// led suit, else any card of it, else a trump, else anything.
pub fn follow_options(hand: &Hand, led: Card, trump: Suit) -> Vec<Card> {
    let same_suit: Vec<Card> = hand
        .iter()
        .copied()
        .filter(|card| card.suit == led.suit)
        .collect();
    let higher: Vec<Card> = same_suit
        .iter()
        .copied()
        .filter(|card| card.rank > led.rank)
        .collect();
    if !higher.is_empty() {
        return higher;
    }
    if !same_suit.is_empty() {
        return same_suit;
    }
    let trumps: Vec<Card> = hand
        .iter()
        .copied()
        .filter(|card| card.suit == trump)
        .collect();
    if !trumps.is_empty() {
        return trumps;
    }
    hand.cards().to_vec()
}
