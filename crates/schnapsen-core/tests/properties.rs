use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use schnapsen_core::game::{EndReason, GameState};
use schnapsen_core::info::{Determinizer, InformationSet};
use schnapsen_core::model::moves::Move;
use schnapsen_core::model::player::PlayerId;
use schnapsen_core::{new_game_with_leader, update_information_set};

const GAMES: u64 = 200;

fn seed_for(game: u64) -> u64 {
    let mut rng = StdRng::seed_from_u64(20260101 ^ game);
    rng.next_u64()
}

/// Plays one random game, handing every intermediate state and both views
/// to `check`.
fn play_random<F>(game: u64, mut check: F) -> GameState
where
    F: FnMut(&GameState, &[InformationSet; 2]),
{
    let leader = if game % 2 == 0 {
        PlayerId::One
    } else {
        PlayerId::Two
    };
    let (mut state, mut views) = new_game_with_leader(seed_for(game), leader);
    let mut rng = StdRng::seed_from_u64(game);
    check(&state, &views);
    while !state.is_terminal() {
        let moves = state.legal_moves();
        let mv = *moves.choose(&mut rng).expect("live game has a legal move");
        let actor = state.to_move();
        let transition = state.apply(mv).expect("legal move applies");
        for player in PlayerId::BOTH {
            views[player.index()] = update_information_set(
                &views[player.index()],
                mv,
                player == actor,
                &transition.observation(player),
            )
            .expect("view accepts the true move");
        }
        check(&state, &views);
    }
    state
}

#[test]
fn zones_always_hold_the_whole_deck() {
    for game in 0..GAMES {
        play_random(game, |state, _| {
            if let Err(violation) = state.verify_zones() {
                panic!("game {game}: {violation}");
            }
        });
    }
}

#[test]
fn every_listed_move_is_accepted() {
    for game in 0..GAMES {
        play_random(game, |state, _| {
            for mv in state.legal_moves() {
                let mut probe = state.clone();
                assert!(probe.apply(mv).is_ok(), "game {game}: {mv} rejected");
            }
        });
    }
}

#[test]
fn views_track_the_true_hand_and_public_record() {
    for game in 0..GAMES {
        play_random(game, |state, views| {
            for player in PlayerId::BOTH {
                let view = &views[player.index()];
                assert_eq!(view.hand(), state.hand(player), "game {game}");
                assert_eq!(view.public(), state.public(), "game {game}");
                if view.is_my_turn() {
                    assert_eq!(view.legal_moves(), state.legal_moves());
                }
            }
        });
    }
}

#[test]
fn outcomes_follow_the_scoring_table() {
    for game in 0..GAMES {
        let state = play_random(game, |_, _| {});
        let outcome = state.outcome().copied().expect("random game terminates");
        let loser_score = outcome.score(outcome.loser());
        match outcome.reason {
            EndReason::ClosingForfeit => {
                let closer = state.public().closed_by().expect("forfeit needs a closer");
                assert_eq!(outcome.winner, closer.other());
                assert!(outcome.game_points >= 2);
            }
            EndReason::ReachedTarget | EndReason::LastTrick => {
                let expected = if loser_score == 0 {
                    3
                } else if loser_score < 33 {
                    2
                } else {
                    1
                };
                assert_eq!(outcome.game_points, expected, "game {game}");
            }
        }
        if outcome.reason == EndReason::ReachedTarget {
            assert!(outcome.score(outcome.winner) >= 66);
        }
    }
}

#[test]
fn samples_agree_with_everything_the_player_knows() {
    let mut rng = StdRng::seed_from_u64(77);
    for game in 0..GAMES / 4 {
        play_random(game, |state, views| {
            if state.is_terminal() {
                return;
            }
            for view in views {
                let sample = Determinizer::determinize(view, &mut rng)
                    .unwrap_or_else(|err| panic!("game {game}: {err}"));
                let me = view.perspective();
                let opponent = me.other();
                assert_eq!(sample.hand(me), view.hand());
                assert_eq!(sample.public(), state.public());
                assert_eq!(sample.hand(opponent).len(), state.hand(opponent).len());
                for card in view.opponent_known() {
                    assert!(sample.hand(opponent).contains(*card));
                }
                if !sample.is_terminal() {
                    assert!(!sample.legal_moves().is_empty());
                }
            }
        });
    }
}

#[test]
fn excluded_suits_never_reach_the_opponent_hand() {
    // Find a position where the opponent has shown a void.
    let mut found = None;
    for game in 0..GAMES {
        play_random(game, |state, views| {
            if found.is_some() || state.is_terminal() {
                return;
            }
            for view in views {
                if !view.opponent_voids().is_empty() {
                    found = Some(view.clone());
                    return;
                }
            }
        });
        if found.is_some() {
            break;
        }
    }
    let view = found.expect("some random game reveals a void");
    let voids = view.opponent_voids();
    let opponent = view.opponent();
    let mut rng = StdRng::seed_from_u64(1000);
    for _ in 0..1000 {
        let sample = Determinizer::determinize(&view, &mut rng).expect("consistent view");
        assert!(
            sample
                .hand(opponent)
                .iter()
                .all(|card| !voids.contains(card.suit))
        );
    }
}

#[test]
fn closing_is_only_offered_to_the_leader() {
    for game in 0..GAMES / 4 {
        play_random(game, |state, _| {
            let moves = state.legal_moves();
            if !state.public().is_leading() {
                assert!(!moves.contains(&Move::CloseTalon));
                assert!(!moves.contains(&Move::ExchangeTrumpJack));
                assert!(!moves.iter().any(|mv| matches!(mv, Move::DeclareMarriage(_))));
            }
        });
    }
}
