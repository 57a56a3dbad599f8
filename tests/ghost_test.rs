//! Integration tests for ghosting detection

mod common;

use chrono::Duration;
use common::{conversation, group_chat, received, sent, ts};
use imessage_wrapped_rust::ghost::{GhostConfig, GhostStats};

#[test]
fn test_unanswered_inbound_after_forty_days() {
    let chat = conversation(
        "alice",
        vec![
            sent("1", "2024-10-01T09:00:00Z", "are we still on for friday?"),
            received("2", "2024-10-01T09:05:00Z", "yes! let me check the time"),
        ],
    );
    let config = GhostConfig::from_days(30, false).unwrap();
    let stats = GhostStats::compute([&chat], 2024, &config, Some(ts("2024-11-10T09:05:00Z")));

    assert_eq!(stats.ghosts(), 1);
    assert_eq!(stats.you_ghosted.get("alice"), Some(&ts("2024-10-01T09:05:00Z")));
    assert!(stats.ghosted_you.is_empty());
    assert_eq!(stats.ghost_ratio(), None);
}

#[test]
fn test_only_latest_event_per_direction() {
    let chat = conversation(
        "bob",
        vec![
            sent("1", "2024-01-01T10:00:00Z", "happy new year"),
            received("2", "2024-02-15T10:00:00Z", "sorry, you too"),
            sent("3", "2024-06-01T10:00:00Z", "summer plans?"),
            received("4", "2024-07-20T10:00:00Z", "beach!"),
            sent("5", "2024-07-20T10:01:00Z", "nice"),
        ],
    );
    let config = GhostConfig::from_days(30, false).unwrap();
    let stats = GhostStats::compute([&chat], 2024, &config, Some(ts("2024-07-21T00:00:00Z")));

    // January's unanswered message is shadowed by the June one
    assert_eq!(stats.ghosted_you.get("bob"), Some(&ts("2024-06-01T10:00:00Z")));
    assert_eq!(stats.you_ghosted.get("bob"), Some(&ts("2024-02-15T10:00:00Z")));
    assert_eq!(stats.ghost_ratio(), Some(1.0));
}

#[test]
fn test_group_chats_are_opt_in() {
    let family = group_chat(
        "chat7",
        "Family",
        vec![received("1", "2024-03-01T10:00:00Z", "anyone home?")],
    );
    let reference = Some(ts("2024-12-01T00:00:00Z"));

    let skipped = GhostStats::compute([&family], 2024, &GhostConfig::default(), reference);
    assert_eq!(skipped.ghosts(), 0);

    let config = GhostConfig::new(Duration::days(7), true).unwrap();
    let included = GhostStats::compute([&family], 2024, &config, reference);
    assert_eq!(included.ghosts(), 1);
}

#[test]
fn test_out_of_year_messages_are_ignored() {
    let chat = conversation(
        "carol",
        vec![received("1", "2023-05-01T10:00:00Z", "long time no see")],
    );
    let stats = GhostStats::compute(
        [&chat],
        2024,
        &GhostConfig::default(),
        Some(ts("2024-12-31T00:00:00Z")),
    );
    assert!(stats.you_ghosted.is_empty());
    assert!(stats.ghosted_you.is_empty());
}

#[test]
fn test_non_positive_timeline_rejected() {
    assert!(GhostConfig::from_days(0, false).is_err());
    assert!(GhostConfig::from_days(-3, true).is_err());
    assert!(GhostConfig::new(Duration::seconds(-1), false).is_err());
    assert_eq!(GhostConfig::default().timeline(), Duration::days(7));
}
