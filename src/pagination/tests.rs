//! Tests for pagination module

use super::*;
use pretty_assertions::assert_eq;

// ============================================================================
// NextPage Tests
// ============================================================================

#[test]
fn test_next_page_with_url() {
    let next = NextPage::with_url("https://sta.example.com/v1.0/Things?$skip=100");
    assert!(next.is_continue());
    assert!(!next.is_done());

    if let NextPage::Continue { query_params, url } = next {
        assert!(query_params.is_empty());
        assert_eq!(
            url,
            Some("https://sta.example.com/v1.0/Things?$skip=100".to_string())
        );
    } else {
        panic!("Expected Continue");
    }
}

#[test]
fn test_next_page_done() {
    let next = NextPage::Done;
    assert!(next.is_done());
    assert!(!next.is_continue());
}

// ============================================================================
// PaginationState Tests
// ============================================================================

#[test]
fn test_pagination_state_default() {
    let state = PaginationState::new();
    assert_eq!(state.pages, 0);
    assert_eq!(state.skip, 0);
    assert_eq!(state.total_fetched, 0);
    assert_eq!(state.bytes, 0);
    assert!(!state.done);
}

#[test]
fn test_pagination_state_record_page() {
    let mut state = PaginationState::new();

    state.record_page(&PageSummary::new(100).with_bytes(2048));
    state.record_page(&PageSummary::new(20).with_bytes(512));

    assert_eq!(state.pages, 2);
    assert_eq!(state.total_fetched, 120);
    assert_eq!(state.bytes, 2560);
}

// ============================================================================
// Next Link Paginator Tests
// ============================================================================

#[test]
fn test_next_link_paginator_follows_link() {
    let paginator = NextLinkPaginator::new();
    let mut state = PaginationState::new();
    assert!(paginator.initial_params(&state).is_empty());

    let page = PageSummary::new(100)
        .with_next_link(Some("https://sta.example.com/Observations?$skip=100".into()));
    let next = paginator.process_page(&page, &mut state);

    assert_eq!(
        next,
        NextPage::with_url("https://sta.example.com/Observations?$skip=100")
    );
    assert_eq!(state.total_fetched, 100);
    assert!(!state.done);
}

#[test]
fn test_next_link_paginator_stops_without_link() {
    let paginator = NextLinkPaginator::new();
    let mut state = PaginationState::new();

    let next = paginator.process_page(&PageSummary::new(3), &mut state);

    assert!(next.is_done());
    assert!(state.done);
    assert_eq!(state.pages, 1);
}

#[test]
fn test_next_link_paginator_ignores_empty_link() {
    let paginator = NextLinkPaginator::new();
    let mut state = PaginationState::new();

    let page = PageSummary::new(3).with_next_link(Some(String::new()));
    assert!(paginator.process_page(&page, &mut state).is_done());
}

// ============================================================================
// Skip/Top Paginator Tests
// ============================================================================

#[test]
fn test_skip_top_paginator_initial_params() {
    let paginator = SkipTopPaginator::new(50);
    let state = PaginationState::new();

    assert_eq!(
        paginator.initial_params(&state),
        vec![
            ("$top".to_string(), "50".to_string()),
            ("$skip".to_string(), "0".to_string()),
        ]
    );
}

#[test]
fn test_skip_top_paginator_continues_on_full_page() {
    let paginator = SkipTopPaginator::new(50);
    let mut state = PaginationState::new();

    let next = paginator.process_page(&PageSummary::new(50), &mut state);
    assert_eq!(
        next,
        NextPage::with_params(vec![
            ("$top".to_string(), "50".to_string()),
            ("$skip".to_string(), "50".to_string()),
        ])
    );

    let next = paginator.process_page(&PageSummary::new(50), &mut state);
    assert!(next.is_continue());
    assert_eq!(state.skip, 100);
}

#[test]
fn test_skip_top_paginator_stops_on_short_page() {
    let paginator = SkipTopPaginator::new(50);
    let mut state = PaginationState::new();

    let next = paginator.process_page(&PageSummary::new(12), &mut state);

    assert!(next.is_done());
    assert!(state.done);
    assert_eq!(state.total_fetched, 12);
}

#[test]
fn test_skip_top_paginator_clamps_zero_top() {
    let paginator = SkipTopPaginator::new(0);
    assert_eq!(paginator.top, 1);
    assert_eq!(SkipTopPaginator::default().top, 100);
}

// ============================================================================
// Single Page Tests
// ============================================================================

#[test]
fn test_single_page_paginator_ignores_next_link() {
    let paginator = SinglePagePaginator;
    let mut state = PaginationState::new();

    let page = PageSummary::new(100).with_next_link(Some("https://sta.example.com/next".into()));
    let next = paginator.process_page(&page, &mut state);

    assert!(next.is_done());
    assert!(state.done);
    assert_eq!(state.total_fetched, 100);
}
