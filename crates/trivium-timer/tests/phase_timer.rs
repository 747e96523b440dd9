//! Integration tests for the tagged phase-deadline timer.
//!
//! Uses `start_paused` Tokio time so deadlines resolve deterministically:
//! `sleep_until` completes the instant the virtual clock reaches it.

use std::time::Duration;

use tokio::time;
use trivium_timer::PhaseTimer;

/// The kind of tag a room actor would use: (phase discriminant, index).
type Tag = (u8, usize);

const QUESTION: u8 = 1;
const REVEAL: u8 = 2;

// =========================================================================
// Arming and accessors
// =========================================================================

#[test]
fn test_new_timer_is_unarmed() {
    let timer: PhaseTimer<Tag> = PhaseTimer::new();
    assert!(!timer.is_armed());
    assert_eq!(timer.tag(), None);
    assert_eq!(timer.remaining(), None);
}

#[tokio::test(start_paused = true)]
async fn test_arm_sets_tag_and_remaining() {
    let mut timer = PhaseTimer::new();
    timer.arm(Duration::from_secs(20), (QUESTION, 0));

    assert!(timer.is_armed());
    assert_eq!(timer.tag(), Some((QUESTION, 0)));
    assert_eq!(timer.remaining(), Some(Duration::from_secs(20)));
}

#[tokio::test(start_paused = true)]
async fn test_remaining_decreases_as_time_passes() {
    let mut timer = PhaseTimer::new();
    timer.arm(Duration::from_secs(20), (QUESTION, 0));

    time::advance(Duration::from_secs(5)).await;
    assert_eq!(timer.remaining(), Some(Duration::from_secs(15)));

    time::advance(Duration::from_secs(30)).await;
    // Past the deadline, remaining saturates at zero.
    assert_eq!(timer.remaining(), Some(Duration::ZERO));
}

#[tokio::test(start_paused = true)]
async fn test_clear_disarms() {
    let mut timer = PhaseTimer::new();
    timer.arm(Duration::from_secs(5), (QUESTION, 0));
    timer.clear();

    assert!(!timer.is_armed());
    assert_eq!(timer.tag(), None);
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_fired_returns_tag_at_deadline() {
    let mut timer = PhaseTimer::new();
    timer.arm(Duration::from_secs(20), (QUESTION, 3));

    let start = time::Instant::now();
    let tag = timer.fired().await;

    assert_eq!(tag, (QUESTION, 3));
    assert_eq!(start.elapsed(), Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn test_fired_does_not_disarm() {
    // The caller owns the transition; a fire leaves the deadline in place
    // until it's explicitly re-armed or cleared.
    let mut timer = PhaseTimer::new();
    timer.arm(Duration::from_secs(1), (QUESTION, 0));

    let _ = timer.fired().await;
    assert!(timer.is_armed());
    assert_eq!(timer.tag(), Some((QUESTION, 0)));
}

#[tokio::test(start_paused = true)]
async fn test_unarmed_timer_pends_forever() {
    let timer: PhaseTimer<Tag> = PhaseTimer::new();

    tokio::select! {
        tag = timer.fired() => panic!("unarmed timer fired with {tag:?}"),
        _ = time::sleep(Duration::from_secs(3600)) => {}
    }
}

#[tokio::test(start_paused = true)]
async fn test_rearm_replaces_previous_deadline() {
    // Re-arming IS the cancellation path: the old (phase, index) tag must
    // never fire once a transition has replaced it.
    let mut timer = PhaseTimer::new();
    timer.arm(Duration::from_secs(20), (QUESTION, 0));
    timer.arm(Duration::from_secs(5), (REVEAL, 0));

    let start = time::Instant::now();
    let tag = timer.fired().await;

    assert_eq!(tag, (REVEAL, 0), "replaced tag must win");
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_cleared_timer_never_fires() {
    let mut timer = PhaseTimer::new();
    timer.arm(Duration::from_secs(1), (QUESTION, 0));
    timer.clear();

    tokio::select! {
        tag = timer.fired() => panic!("cleared timer fired with {tag:?}"),
        _ = time::sleep(Duration::from_secs(10)) => {}
    }
}

#[tokio::test(start_paused = true)]
async fn test_select_loop_sees_commands_while_armed() {
    // The integration shape from the crate docs: an actor loop must keep
    // servicing its command channel while a deadline is pending.
    let (tx, mut rx) = tokio::sync::mpsc::channel::<u32>(4);
    let mut timer = PhaseTimer::new();
    timer.arm(Duration::from_secs(60), (QUESTION, 0));

    tx.send(7).await.unwrap();

    tokio::select! {
        cmd = rx.recv() => assert_eq!(cmd, Some(7)),
        tag = timer.fired() => panic!("deadline fired early with {tag:?}"),
    }
}
