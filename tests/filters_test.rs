//! Integration tests for conversation filters

mod common;

use common::{conversation, received, sent};
use imessage_wrapped_rust::filters::{
    configured_filters, default_filters, passes_all, ConversationFilter, FnFilter, MinSentFilter,
    ReciprocityFilter,
};
use imessage_wrapped_rust::models::{Conversation, Message};

fn thread(sent_count: usize, received_count: usize) -> Conversation {
    let mut messages: Vec<Message> = (0..sent_count)
        .map(|i| sent(&format!("s{i}"), "2024-05-01T10:00:00Z", "hey"))
        .collect();
    messages.extend(
        (0..received_count).map(|i| received(&format!("r{i}"), "2024-05-01T11:00:00Z", "hi")),
    );
    conversation("thread", messages)
}

#[test]
fn test_reciprocity_threshold() {
    let filter = ReciprocityFilter::default();
    assert!(filter.keep(&thread(2, 18), 2024));
    assert!(!filter.keep(&thread(2, 19), 2024));
    assert!(!filter.keep(&thread(0, 5), 2024));
    // too little traffic to judge
    assert!(filter.keep(&thread(0, 1), 2024));
    assert_eq!(filter.name(), "reciprocity");
}

#[test]
fn test_min_sent_counts_only_target_year() {
    let mut chat = thread(1, 3);
    chat.messages
        .push(sent("old", "2023-12-31T23:00:00Z", "last year"));

    let filter = MinSentFilter::new(2);
    assert!(!filter.keep(&chat, 2024));
    assert!(filter.keep(&thread(2, 0), 2024));
}

#[test]
fn test_default_chain_requires_both() {
    let filters = default_filters();
    assert_eq!(filters.len(), 2);
    assert!(passes_all(&filters, &thread(3, 4), 2024));
    assert!(!passes_all(&filters, &thread(1, 1), 2024));
    assert!(!passes_all(&filters, &thread(2, 40), 2024));
}

#[test]
fn test_configured_chain() {
    let filters = configured_filters(1.0, 1).unwrap();
    assert!(passes_all(&filters, &thread(1, 1), 2024));
    assert!(!passes_all(&filters, &thread(1, 2), 2024));

    assert!(configured_filters(0.0, 1).is_err());
    assert!(configured_filters(f64::NAN, 1).is_err());
}

#[test]
fn test_closure_filter_and_empty_chain() {
    let named: Vec<Box<dyn ConversationFilter>> = vec![Box::new(FnFilter::new(
        "named_only",
        |c: &Conversation, _year: i32| c.display_name.is_some(),
    ))];
    assert!(!passes_all(&named, &thread(5, 5), 2024));
    assert_eq!(named[0].name(), "named_only");

    assert!(passes_all(&[], &thread(0, 50), 2024));
}
