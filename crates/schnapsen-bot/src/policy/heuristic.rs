use super::{AgentView, Policy};
use crate::search::SearchError;
use rand::rngs::StdRng;
use schnapsen_core::game::PublicState;
use schnapsen_core::model::card::Card;
use schnapsen_core::model::hand::Hand;
use schnapsen_core::model::moves::Move;
use schnapsen_core::model::player::PlayerId;
use schnapsen_core::model::suit::Suit;
use tracing::{Level, event};

/// Closing only pays off with a score this close to 66.
const CLOSE_THRESHOLD: u32 = 46;
const TRUMP_SPEND_PENALTY: i32 = 15;
const BREAK_MARRIAGE_PENALTY: i32 = 25;

/// Greedy one-ply player. Also drives heuristic rollouts.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicPolicy;

impl HeuristicPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Highest-scoring move; ties go to the earliest in `legal`.
    pub fn pick(public: &PublicState, hand: &Hand, legal: &[Move]) -> Option<Move> {
        let player = public.turn();
        let mut best: Option<(Move, i32)> = None;
        for &mv in legal {
            let score = score_move(public, hand, player, mv);
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((mv, score)),
            }
        }
        best.map(|(mv, _)| mv)
    }
}

impl Policy for HeuristicPolicy {
    fn choose_move(&mut self, view: AgentView<'_>, _rng: &mut StdRng) -> Result<Move, SearchError> {
        let legal = view.legal_moves();
        let choice = Self::pick(view.public(), view.hand(), &legal).ok_or(SearchError::NoLegalMoves)?;
        event!(
            target: "schnapsen_bot::heuristic",
            Level::DEBUG,
            player = %view.to_move(),
            legal_count = legal.len(),
            chosen = %choice,
        );
        Ok(choice)
    }
}

/// Rates `mv` for `player`: declare marriages, win tricks cheaply, shed
/// low cards, keep trumps and marriage partners.
pub fn score_move(public: &PublicState, hand: &Hand, player: PlayerId, mv: Move) -> i32 {
    let trump = public.trump();
    match mv {
        Move::DeclareMarriage(suit) if suit == trump => 200,
        Move::DeclareMarriage(_) => 150,
        Move::ExchangeTrumpJack => 180,
        Move::CloseTalon => {
            let scores = public.scores();
            let reach = scores.score(player) + scores.pending(player);
            let trumps = hand.iter().filter(|card| card.suit == trump).count();
            if reach >= CLOSE_THRESHOLD && trumps >= 2 {
                120
            } else {
                -1000
            }
        }
        Move::PlayCard(card) => match public.trick().lead_card() {
            None => lead_score(public, hand, card, trump),
            Some(led) => follow_score(led, card, trump),
        },
    }
}

fn lead_score(public: &PublicState, hand: &Hand, card: Card, trump: Suit) -> i32 {
    let mut score = -(card.points() as i32);
    if card.suit == trump {
        score -= TRUMP_SPEND_PENALTY;
    }
    let keeps_marriage = public.announced().is_none()
        && card
            .marriage_partner()
            .is_some_and(|partner| hand.contains(partner));
    if keeps_marriage {
        score -= BREAK_MARRIAGE_PENALTY;
    }
    score
}

fn follow_score(led: Card, card: Card, trump: Suit) -> i32 {
    let spends_trump = card.suit == trump && led.suit != trump;
    if card.beats(led, trump) {
        let mut score = 100 + led.points() as i32 - card.points() as i32;
        if spends_trump {
            score -= TRUMP_SPEND_PENALTY;
        }
        // Not worth a trump to take a worthless lead.
        if spends_trump && led.points() < 10 {
            score -= 100;
        }
        score
    } else {
        let mut score = -(card.points() as i32);
        if card.suit == trump {
            score -= TRUMP_SPEND_PENALTY;
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::{HeuristicPolicy, score_move};
    use schnapsen_core::game::GameState;
    use schnapsen_core::model::card::Card;
    use schnapsen_core::model::deck::Deck;
    use schnapsen_core::model::moves::Move;
    use schnapsen_core::model::player::PlayerId;
    use schnapsen_core::model::rank::Rank;
    use schnapsen_core::model::suit::Suit;

    fn c(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn arranged(p1: [Card; 5], p2: [Card; 5]) -> GameState {
        let mut cards = Vec::new();
        cards.extend(p1);
        cards.extend(p2);
        for card in Deck::standard().cards() {
            if !cards.contains(card) && *card != c(Rank::Jack, Suit::Hearts) {
                cards.push(*card);
            }
        }
        cards.push(c(Rank::Jack, Suit::Hearts));
        GameState::deal(&Deck::from_order(cards).unwrap(), PlayerId::One)
    }

    #[test]
    fn declares_marriage_before_anything_else() {
        let state = arranged(
            [c(Rank::King, Suit::Clubs), c(Rank::Queen, Suit::Clubs), c(Rank::Ace, Suit::Spades), c(Rank::Jack, Suit::Diamonds), c(Rank::Ten, Suit::Hearts)],
            [c(Rank::Jack, Suit::Clubs), c(Rank::Ten, Suit::Clubs), c(Rank::Ace, Suit::Clubs), c(Rank::Jack, Suit::Spades), c(Rank::Queen, Suit::Spades)],
        );
        let legal = state.legal_moves();
        let choice = HeuristicPolicy::pick(state.public(), state.hand(PlayerId::One), &legal);
        assert_eq!(choice, Some(Move::DeclareMarriage(Suit::Clubs)));
    }

    #[test]
    fn wins_cheaply_and_sheds_low_otherwise() {
        let mut state = arranged(
            [c(Rank::Ten, Suit::Spades), c(Rank::Queen, Suit::Clubs), c(Rank::Ace, Suit::Diamonds), c(Rank::Jack, Suit::Diamonds), c(Rank::Ten, Suit::Hearts)],
            [c(Rank::Ace, Suit::Spades), c(Rank::King, Suit::Spades), c(Rank::Jack, Suit::Clubs), c(Rank::Queen, Suit::Spades), c(Rank::Ace, Suit::Hearts)],
        );
        state.apply(Move::PlayCard(c(Rank::Ten, Suit::Spades))).unwrap();
        let legal = state.legal_moves();
        let choice = HeuristicPolicy::pick(state.public(), state.hand(PlayerId::Two), &legal);
        assert_eq!(choice, Some(Move::PlayCard(c(Rank::Ace, Suit::Spades))));

        let hand = state.hand(PlayerId::Two);
        let trump_ruff = score_move(state.public(), hand, PlayerId::Two, Move::PlayCard(c(Rank::Ace, Suit::Hearts)));
        let shed = score_move(state.public(), hand, PlayerId::Two, Move::PlayCard(c(Rank::Jack, Suit::Clubs)));
        assert!(trump_ruff > shed);
    }
}
