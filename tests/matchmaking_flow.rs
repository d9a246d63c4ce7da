//! Queue-driven match formation

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use royale_server::arena::StaticArenaProvider;
use royale_server::config::GameSettings;
use royale_server::game::{MatchMode, MatchState};
use royale_server::matchmaking::QueueError;
use royale_server::util::time::TICKS_PER_SECOND;

use common::{fast_settings, players, system, test_arena, tick_n, SwitchableArenas};

#[tokio::test]
async fn test_tenth_join_forms_one_match() {
    let mut settings = GameSettings::default();
    settings.modes.battle_royale.min_players = 10;
    settings.modes.battle_royale.max_players = 100;
    let arenas = Arc::new(StaticArenaProvider::new(vec![test_arena("plains")]));
    let sys = system(settings, arenas);
    let roster = players(10);

    for (i, p) in roster.iter().take(9).enumerate() {
        let position = assert_ok!(sys.queue.join(p.clone(), MatchMode::BattleRoyale).await);
        assert_eq!(position, i + 1);
    }
    assert_eq!(sys.registry.active_match_count(), 0);
    assert_eq!(sys.queue.queue_size(MatchMode::BattleRoyale).await, 9);

    assert_ok!(sys.queue.join(roster[9].clone(), MatchMode::BattleRoyale).await);
    assert_eq!(sys.registry.active_match_count(), 1);
    assert_eq!(sys.queue.queue_size(MatchMode::BattleRoyale).await, 0);

    let game = sys.registry.matches().remove(0);
    assert_eq!(game.participant_count(), 10);
    assert_eq!(game.state(), MatchState::Starting);
    assert!(roster.iter().all(|p| sys.registry.is_in_match(&p.id)));
}

#[tokio::test]
async fn test_overflow_stays_queued_oldest_first() {
    let arenas = SwitchableArenas::new(test_arena("switch"), false);
    let sys = system(fast_settings(), arenas.clone());
    let roster = players(6);
    for p in &roster {
        assert_ok!(sys.queue.join(p.clone(), MatchMode::BattleRoyale).await);
    }
    // no arena: the queue is preserved
    assert_eq!(sys.registry.active_match_count(), 0);
    assert_eq!(sys.queue.queue_size(MatchMode::BattleRoyale).await, 6);

    arenas.set_available(true);
    let first = sys.queue.try_start(MatchMode::BattleRoyale).await.unwrap();
    let expected: Vec<_> = roster[..4].iter().map(|p| p.id).collect();
    assert_eq!(first.participant_ids(), expected);
    assert_eq!(sys.queue.queue_size(MatchMode::BattleRoyale).await, 2);

    let second = sys.queue.try_start(MatchMode::BattleRoyale).await.unwrap();
    assert_eq!(second.participant_count(), 2);
    assert_eq!(sys.queue.queue_size(MatchMode::BattleRoyale).await, 0);
    assert!(sys.queue.try_start(MatchMode::BattleRoyale).await.is_none());
}

#[tokio::test]
async fn test_requeue_after_match_ends() {
    let arenas = Arc::new(StaticArenaProvider::new(vec![test_arena("loop")]));
    let sys = system(fast_settings(), arenas);
    let roster = players(2);
    for p in &roster {
        assert_ok!(sys.queue.join(p.clone(), MatchMode::BattleRoyale).await);
    }
    let game = sys.registry.match_of(&roster[0].id).unwrap();

    let err = assert_err!(sys.queue.join(roster[0].clone(), MatchMode::BattleRoyale).await);
    assert_eq!(err, QueueError::AlreadyInMatch);

    tick_n(&sys.registry, 2 * TICKS_PER_SECOND + 1);
    sys.registry.report_elimination(&roster[1].id, Some(roster[0].id));
    tick_n(&sys.registry, TICKS_PER_SECOND + 1);
    assert_eq!(game.state(), MatchState::Ended);

    let position = assert_ok!(sys.queue.join(roster[0].clone(), MatchMode::Resurgence).await);
    assert_eq!(position, 1);
}

#[tokio::test]
async fn test_leave_before_threshold() {
    let arenas = Arc::new(StaticArenaProvider::new(vec![test_arena("exit")]));
    let sys = system(fast_settings(), arenas);
    let roster = players(3);

    assert_ok!(sys.queue.join(roster[0].clone(), MatchMode::Resurgence).await);
    assert_ok!(sys.queue.join(roster[1].clone(), MatchMode::Resurgence).await);
    assert!(sys.queue.leave(&roster[0].id, MatchMode::Resurgence).await);
    assert_ok!(sys.queue.join(roster[2].clone(), MatchMode::Resurgence).await);

    // resurgence needs three
    assert_eq!(sys.registry.active_match_count(), 0);
    assert_eq!(
        sys.queue.position(&roster[2].id).await,
        Some((MatchMode::Resurgence, 2))
    );
}

#[tokio::test(start_paused = true)]
async fn test_safety_net_recheck_forms_match() {
    let arenas = SwitchableArenas::new(test_arena("late"), false);
    let sys = system(fast_settings(), arenas.clone());
    for p in players(2) {
        assert_ok!(sys.queue.join(p, MatchMode::BattleRoyale).await);
    }
    assert_eq!(sys.registry.active_match_count(), 0);

    let recheck = tokio::spawn(sys.queue.clone().run());
    arenas.set_available(true);
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    assert_eq!(sys.registry.active_match_count(), 1);
    assert_eq!(sys.queue.queue_size(MatchMode::BattleRoyale).await, 0);
    recheck.abort();
}
