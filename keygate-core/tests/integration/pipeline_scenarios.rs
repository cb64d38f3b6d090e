//! Pipeline ordering and short-circuit scenarios
//!
//! Each test fixes the four control documents and checks both the decision
//! and exactly which documents were fetched.

use super::{gate_with, APPROVED, BLOCKED, STATUS, TOOL};
use keygate_core::{Decision, DocumentKind, GateError};

#[tokio::test]
async fn test_empty_key_costs_no_fetch() {
    let (gate, fetcher) = gate_with("ON", "PAID", "", "");

    let err = gate.decide("").await.unwrap_err();

    assert_eq!(err, GateError::MissingKey);
    assert_eq!(err.to_string(), "Key is required.");
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_tool_off_ignores_every_other_document() {
    for tool in ["OFF", "on", "", "ON!", "MAINTENANCE", "O N"] {
        // status is invalid on purpose: it must never be read
        let (gate, fetcher) = gate_with(tool, "EXPIRED", "key-1", "");

        assert_eq!(gate.decide("key-1").await.unwrap(), Decision::Off, "tool={:?}", tool);
        assert_eq!(fetcher.requested(), vec![TOOL]);
    }
}

#[tokio::test]
async fn test_tool_on_tolerates_surrounding_whitespace() {
    let (gate, _fetcher) = gate_with("\n  ON \r\n", "TRIAL", "", "");
    assert_eq!(gate.decide("key-1").await.unwrap(), Decision::Active);
}

#[tokio::test]
async fn test_blocked_beats_approved() {
    let (gate, fetcher) = gate_with("ON", "PAID", "key-1\n", "key-1\n");

    assert_eq!(gate.decide("key-1").await.unwrap(), Decision::Blocked);
    // approval list is never consulted once blocked
    assert_eq!(fetcher.calls_for(APPROVED), 0);
}

#[tokio::test]
async fn test_blocked_on_trial() {
    let (gate, _fetcher) = gate_with("ON", "TRIAL", "a\nkey-1\nb", "");
    assert_eq!(gate.decide("key-1").await.unwrap(), Decision::Blocked);
}

#[tokio::test]
async fn test_trial_skips_approval_list() {
    let (gate, fetcher) = gate_with("ON", "TRIAL", "someone-else", "");

    assert_eq!(gate.decide("key-1").await.unwrap(), Decision::Active);
    assert_eq!(fetcher.requested(), vec![TOOL, STATUS, BLOCKED]);
}

#[tokio::test]
async fn test_trial_skips_unreachable_approval_list() {
    let (gate, fetcher) = gate_with("ON", "TRIAL", "", "");
    fetcher.set_failure(APPROVED);

    assert_eq!(gate.decide("key-1").await.unwrap(), Decision::Active);
}

#[tokio::test]
async fn test_paid_requires_approval() {
    let (gate, fetcher) = gate_with("ON", "PAID", "", "key-2\nkey-3\n");

    let evaluation = gate.evaluate("key-1").await.unwrap();
    assert_eq!(evaluation.decision, Decision::NotApproved);
    assert_eq!(evaluation.documents, DocumentKind::ALL.to_vec());
    assert_eq!(fetcher.requested(), vec![TOOL, STATUS, BLOCKED, APPROVED]);
}

#[tokio::test]
async fn test_paid_and_approved_is_active() {
    let (gate, _fetcher) = gate_with("ON", "PAID", "key-9", "key-2\nkey-1\n");
    assert_eq!(gate.decide("key-1").await.unwrap(), Decision::Active);
}

#[tokio::test]
async fn test_unknown_tier_is_upstream_error() {
    for status in ["EXPIRED", "paid", "Trial", "", "PAID TRIAL"] {
        let (gate, fetcher) = gate_with("ON", status, "", "key-1");

        let err = gate.decide("key-1").await.unwrap_err();
        assert!(
            matches!(err, GateError::InvalidUpstreamState { .. }),
            "status={:?}",
            status
        );
        assert_eq!(err.to_string(), "Invalid status from server.");
        assert_eq!(fetcher.requested(), vec![TOOL, STATUS]);
    }
}

#[tokio::test]
async fn test_fetch_failure_stops_pipeline_at_each_step() {
    let cases = [
        (TOOL, DocumentKind::ToolControl, 1),
        (STATUS, DocumentKind::Status, 2),
        (BLOCKED, DocumentKind::BlockList, 3),
        (APPROVED, DocumentKind::ApprovalList, 4),
    ];

    for (url, kind, calls) in cases {
        let (gate, fetcher) = gate_with("ON", "PAID", "", "key-1");
        fetcher.set_failure(url);

        let err = gate.decide("key-1").await.unwrap_err();
        assert_eq!(err, GateError::UpstreamUnavailable { document: kind });
        assert_eq!(err.to_string(), "Network Error");
        assert_eq!(fetcher.calls(), calls, "failing {}", kind);
    }
}

#[tokio::test]
async fn test_failure_never_defaults_to_off_or_active() {
    let (gate, fetcher) = gate_with("OFF", "TRIAL", "", "");
    fetcher.set_failure(TOOL);
    assert!(gate.decide("key-1").await.is_err());

    let (gate, fetcher) = gate_with("ON", "TRIAL", "", "");
    fetcher.set_failure(BLOCKED);
    assert!(gate.decide("key-1").await.is_err());
}

#[tokio::test]
async fn test_substring_matching_is_preserved() {
    // "key" is contained in "key-1", so it is treated as blocked
    let (gate, _fetcher) = gate_with("ON", "TRIAL", "key-1\n", "");
    assert_eq!(gate.decide("key").await.unwrap(), Decision::Blocked);

    // and approved on the paid tier for the same reason
    let (gate, _fetcher) = gate_with("ON", "PAID", "", "key-1\n");
    assert_eq!(gate.decide("key").await.unwrap(), Decision::Active);
}

#[tokio::test]
async fn test_documents_reread_on_every_decision() {
    let (gate, fetcher) = gate_with("ON", "TRIAL", "", "");
    assert_eq!(gate.decide("key-1").await.unwrap(), Decision::Active);

    fetcher.set_document(TOOL, "OFF");
    assert_eq!(gate.decide("key-1").await.unwrap(), Decision::Off);

    fetcher.set_document(TOOL, "ON");
    fetcher.set_document(BLOCKED, "key-1");
    assert_eq!(gate.decide("key-1").await.unwrap(), Decision::Blocked);
}

#[tokio::test]
async fn test_concurrent_decisions_are_independent() {
    let (gate, fetcher) = gate_with("ON", "PAID", "bad-key", "good-key");

    let mut handles = Vec::new();
    for i in 0..32 {
        let gate = gate.clone();
        handles.push(tokio::spawn(async move {
            let key = match i % 3 {
                0 => "good-key",
                1 => "bad-key",
                _ => "stranger",
            };
            (key, gate.decide(key).await.unwrap())
        }));
    }

    for handle in handles {
        let (key, decision) = handle.await.unwrap();
        let expected = match key {
            "good-key" => Decision::Active,
            "bad-key" => Decision::Blocked,
            _ => Decision::NotApproved,
        };
        assert_eq!(decision, expected, "key={}", key);
    }

    assert_eq!(gate.metrics().snapshot().decisions(), 32);
    assert!(fetcher.calls() >= 32 * 3);
}
