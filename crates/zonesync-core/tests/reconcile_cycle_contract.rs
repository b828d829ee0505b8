//! Contract Test: Reconciliation Cycle
//!
//! Verifies the decision rule of a single cycle:
//! - Drifted records get exactly one update carrying the public IP
//! - Matching records are left alone (no update call)
//! - Records with non-IP content are reported and never overwritten
//! - Resolver failure short-circuits before any provider call
//! - List failure short-circuits before any update call
//! - Every matching record is reconciled independently

mod common;

use common::*;
use zonesync_core::engine::{RecordStatus, SkipReason};

#[tokio::test]
async fn drifted_record_is_updated_with_public_ip() {
    let resolver = FakeResolver::returning("203.0.113.9");
    let zone = FakeZoneSource::new(vec![a_record("r1", NAME, "203.0.113.5")]);

    let report = reconciler(&resolver, &zone)
        .run_cycle(&config(), &context())
        .await;

    assert_eq!(zone.update_calls(), 1);
    assert_eq!(
        zone.updates(),
        vec![UpdateCall {
            zone_id: ZONE.to_string(),
            record_id: "r1".to_string(),
            content: "203.0.113.9".to_string(),
        }]
    );
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(
        report.outcomes[0].status,
        RecordStatus::Updated {
            previous: "203.0.113.5".to_string(),
            current: "203.0.113.9".to_string(),
        }
    );
    assert_eq!(report.public_ip, Some("203.0.113.9".parse().unwrap()));
    assert!(!report.has_failures());
}

#[tokio::test]
async fn matching_record_is_unchanged() {
    let resolver = FakeResolver::returning("203.0.113.9");
    let zone = FakeZoneSource::new(vec![a_record("r1", NAME, "203.0.113.9")]);

    let report = reconciler(&resolver, &zone)
        .run_cycle(&config(), &context())
        .await;

    assert_eq!(zone.update_calls(), 0, "no update when content already matches");
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].status, RecordStatus::Unchanged);
}

#[tokio::test]
async fn invalid_remote_content_is_never_overwritten() {
    let resolver = FakeResolver::returning("203.0.113.9");
    let zone = FakeZoneSource::new(vec![a_record("r1", NAME, "not-an-ip")]);

    let report = reconciler(&resolver, &zone)
        .run_cycle(&config(), &context())
        .await;

    assert_eq!(zone.update_calls(), 0);
    assert_eq!(
        report.outcomes[0].status,
        RecordStatus::InvalidRemoteIp {
            content: "not-an-ip".to_string()
        }
    );
    assert_eq!(zone.content_of("r1").as_deref(), Some("not-an-ip"));
}

#[tokio::test]
async fn resolver_failure_makes_no_provider_calls() {
    let resolver = FakeResolver::failing("connection refused");
    let zone = FakeZoneSource::new(vec![a_record("r1", NAME, "203.0.113.5")]);

    let report = reconciler(&resolver, &zone)
        .run_cycle(&config(), &context())
        .await;

    assert_eq!(resolver.calls(), 1);
    assert_eq!(zone.list_calls(), 0, "list must be skipped");
    assert_eq!(zone.update_calls(), 0, "update must be skipped");
    assert!(report.outcomes.is_empty());
    assert_eq!(report.public_ip, None);
    assert!(matches!(
        report.skipped,
        Some(SkipReason::ResolutionFailed(ref msg)) if msg.contains("connection refused")
    ));
}

#[tokio::test]
async fn list_failure_makes_no_update_calls() {
    let resolver = FakeResolver::returning("203.0.113.9");
    let zone = FakeZoneSource::new(vec![a_record("r1", NAME, "203.0.113.5")])
        .failing_list("Authentication failed");

    let report = reconciler(&resolver, &zone)
        .run_cycle(&config(), &context())
        .await;

    assert_eq!(zone.list_calls(), 1);
    assert_eq!(zone.update_calls(), 0);
    assert!(report.outcomes.is_empty());
    assert!(matches!(report.skipped, Some(SkipReason::ListFailed(_))));
}

#[tokio::test]
async fn zero_matches_is_an_empty_result() {
    let resolver = FakeResolver::returning("203.0.113.9");
    let zone = FakeZoneSource::new(vec![
        a_record("r1", "www.example.com", "203.0.113.5"),
        a_record("r2", "example.com", "203.0.113.5"),
    ]);

    let report = reconciler(&resolver, &zone)
        .run_cycle(&config(), &context())
        .await;

    assert!(report.outcomes.is_empty());
    assert!(report.skipped.is_none(), "no match is not an error");
    assert!(!report.has_failures());
    assert_eq!(zone.update_calls(), 0);
}

#[tokio::test]
async fn name_match_is_exact() {
    let resolver = FakeResolver::returning("203.0.113.9");
    let zone = FakeZoneSource::new(vec![
        a_record("upper", "Home.example.com", "203.0.113.5"),
        a_record("dotted", "home.example.com.", "203.0.113.5"),
        a_record("sub", "www.home.example.com", "203.0.113.5"),
        a_record("exact", NAME, "203.0.113.5"),
    ]);

    let report = reconciler(&resolver, &zone)
        .run_cycle(&config(), &context())
        .await;

    let ids: Vec<_> = report.outcomes.iter().map(|o| o.record_id.as_str()).collect();
    assert_eq!(ids, vec!["exact"]);
    assert_eq!(zone.update_calls(), 1);
}

#[tokio::test]
async fn duplicate_records_are_reconciled_independently() {
    let resolver = FakeResolver::returning("203.0.113.9");
    let zone = FakeZoneSource::new(vec![
        a_record("r1", NAME, "203.0.113.5"),
        a_record("r2", NAME, "203.0.113.6"),
        a_record("r3", NAME, "203.0.113.9"),
        a_record("r4", NAME, "garbage"),
    ])
    .failing_update_for("r1");

    let report = reconciler(&resolver, &zone)
        .run_cycle(&config(), &context())
        .await;

    // r1 fails, r2 still gets its update
    assert_eq!(zone.update_calls(), 2);
    assert_eq!(report.outcomes.len(), 4);
    assert!(matches!(
        report.outcomes[0].status,
        RecordStatus::UpdateFailed { .. }
    ));
    assert!(matches!(report.outcomes[1].status, RecordStatus::Updated { .. }));
    assert_eq!(report.outcomes[2].status, RecordStatus::Unchanged);
    assert!(matches!(
        report.outcomes[3].status,
        RecordStatus::InvalidRemoteIp { .. }
    ));

    let summary = report.summary();
    assert_eq!(summary.matched, 4);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.update_failed, 1);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.invalid, 1);
    assert_eq!(zone.content_of("r1").as_deref(), Some("203.0.113.5"));
    assert_eq!(zone.content_of("r2").as_deref(), Some("203.0.113.9"));
}

#[tokio::test]
async fn repeated_cycles_without_drift_issue_no_updates() {
    let resolver = FakeResolver::returning("203.0.113.9");
    let zone = FakeZoneSource::new(vec![a_record("r1", NAME, "203.0.113.5")]);
    let reconciler = reconciler(&resolver, &zone);
    let config = config();

    for cycle in 1..=5 {
        let ctx = zonesync_core::CycleContext::new(cycle, config.cycle_budget());
        reconciler.run_cycle(&config, &ctx).await;
    }

    // Only the first cycle saw drift
    assert_eq!(zone.update_calls(), 1);
    assert_eq!(zone.list_calls(), 5);
    assert_eq!(resolver.calls(), 5);
}

#[tokio::test]
async fn new_public_ip_is_picked_up_next_cycle() {
    let resolver = FakeResolver::returning("203.0.113.9");
    let zone = FakeZoneSource::new(vec![a_record("r1", NAME, "203.0.113.9")]);
    let reconciler = reconciler(&resolver, &zone);

    let first = reconciler.run_cycle(&config(), &context()).await;
    assert_eq!(first.outcomes[0].status, RecordStatus::Unchanged);

    resolver.set_ip("198.51.100.20");
    let second = reconciler.run_cycle(&config(), &context()).await;
    assert!(matches!(second.outcomes[0].status, RecordStatus::Updated { .. }));
    assert_eq!(zone.content_of("r1").as_deref(), Some("198.51.100.20"));
}

#[tokio::test]
async fn comparison_is_plain_string_equality() {
    // Same address, different spelling: treated as drift
    let resolver = FakeResolver::returning("2001:db8::1");
    let zone = FakeZoneSource::new(vec![zonesync_core::DnsRecord::new(
        "r6",
        NAME,
        "AAAA",
        "2001:0db8:0000:0000:0000:0000:0000:0001",
    )]);

    let report = reconciler(&resolver, &zone)
        .run_cycle(&config(), &context())
        .await;

    assert_eq!(zone.update_calls(), 1);
    assert_eq!(zone.updates()[0].content, "2001:db8::1");
    assert!(matches!(report.outcomes[0].status, RecordStatus::Updated { .. }));
}

#[tokio::test]
async fn configured_zone_is_listed() {
    let resolver = FakeResolver::returning("203.0.113.9");
    let zone = FakeZoneSource::new(Vec::new());

    let report = reconciler(&resolver, &zone)
        .run_cycle(&config(), &context())
        .await;

    assert_eq!(zone.listed_zones(), vec![ZONE.to_string()]);
    assert_eq!(report.cycle, 1);
}
