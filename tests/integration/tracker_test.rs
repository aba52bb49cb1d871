use osc_watch::core::tracker::sync_count_for;
use osc_watch::core::{AvatarParameter, ResyncTracker};

const PARAM: AvatarParameter = AvatarParameter::MinuteZeroPlace;

#[test]
fn test_first_observation_always_sends() {
    for sync_count in [1, 2, 5, 100] {
        let mut tracker = ResyncTracker::new(sync_count);
        assert!(tracker.observe(PARAM, 0), "sync_count={}", sync_count);
    }
}

#[test]
fn test_sync_count_one_sends_every_tick() {
    let mut tracker = ResyncTracker::new(1);
    for _ in 0..10 {
        assert!(tracker.observe(PARAM, 4));
    }
}

#[test]
fn test_unchanged_value_resent_after_sync_count_ticks() {
    let mut tracker = ResyncTracker::new(4);
    let sent: Vec<bool> = (0..9).map(|_| tracker.observe(PARAM, 7)).collect();
    assert_eq!(
        sent,
        vec![true, false, false, false, true, false, false, false, true]
    );
}

#[test]
fn test_change_sends_immediately_and_restarts_countdown() {
    let mut tracker = ResyncTracker::new(3);
    assert!(tracker.observe(PARAM, 1));
    assert!(!tracker.observe(PARAM, 1));
    assert!(tracker.observe(PARAM, 2));
    assert!(!tracker.observe(PARAM, 2));
    assert!(!tracker.observe(PARAM, 2));
    assert!(tracker.observe(PARAM, 2));
    assert_eq!(tracker.state(PARAM).last_sent_value, Some(2));
}

#[test]
fn test_parameters_are_tracked_independently() {
    let mut tracker = ResyncTracker::new(5);
    assert!(tracker.observe(AvatarParameter::HourTenPlace, 1));
    assert!(tracker.observe(AvatarParameter::HourZeroPlace, 1));
    assert!(!tracker.observe(AvatarParameter::HourTenPlace, 1));
    assert!(tracker.observe(AvatarParameter::HourZeroPlace, 2));
}

#[test]
fn test_sync_count_derivation() {
    assert_eq!(sync_count_for(5.0, 5.0), 1);
    assert_eq!(sync_count_for(30.0, 5.0), 6);
    assert_eq!(sync_count_for(12.0, 5.0), 2);
    assert_eq!(sync_count_for(1.0, 5.0), 1);
    assert_eq!(ResyncTracker::new(0).sync_count(), 1);
}
