//! Integration tests for the reconciliation engine.
//!
//! Drives the public handlers over in-memory stores and stub Stripe
//! collaborators:
//! 1. Webhook intake is idempotent per event id
//! 2. Customer to account links are write-once
//! 3. Subscription merges are monotonic in event time, in any delivery order
//! 4. Product metadata is refetched only after the staleness window
//! 5. Backfill, replay and recovery converge on the same state

mod common;

use std::sync::Arc;

use proptest::prelude::*;

use common::{checkout, subscription_event, TestApp, CREATED, DELETED, UPDATED};
use entitlement_reconciler::application::handlers::billing::{
    GetEntitlementsQuery, IngestResult, ReconcileOutcome,
};
use entitlement_reconciler::domain::billing::{
    calculate_entitlements, ProductTier, ReconcileError, SubscriptionStatus,
};
use entitlement_reconciler::domain::foundation::{AccountId, CustomerId, EventId, SubscriptionId};
use entitlement_reconciler::ports::{
    CustomerAccountRepository, DeadLetterStore, SubscriptionStateRepository,
};

fn account(id: &str) -> AccountId {
    AccountId::new(id).unwrap()
}

fn sub_id(id: &str) -> SubscriptionId {
    SubscriptionId::new(id).unwrap()
}

async fn entitlement_tier(app: &TestApp, acct: &str, include_testing: bool) -> ProductTier {
    app.entitlements
        .handle(GetEntitlementsQuery {
            account: account(acct),
            include_testing,
        })
        .await
        .unwrap()
        .license
}

// =============================================================================
// End-to-end
// =============================================================================

#[tokio::test]
async fn checkout_then_subscription_then_stale_cancel() {
    let app = TestApp::new();
    app.catalog.put("prod_1", "pro", true);

    app.ingest
        .handle(app.delivery(&checkout("evt_1", 500, "cus_1", "acct_1")))
        .await
        .unwrap();
    assert_eq!(
        app.accounts
            .find_account(&CustomerId::new("cus_1").unwrap())
            .await
            .unwrap(),
        Some(account("acct_1"))
    );

    app.ingest
        .handle(app.delivery(&subscription_event(
            "evt_2", 1_000, CREATED, "sub_1", "cus_1", "active", "prod_1", 1,
        )))
        .await
        .unwrap();

    let stale = app
        .ingest
        .handle(app.delivery(&subscription_event(
            "evt_3", 900, UPDATED, "sub_1", "cus_1", "canceled", "prod_1", 1,
        )))
        .await
        .unwrap();
    assert_eq!(stale.outcome().map(ReconcileOutcome::label), Some("subscription_stale"));

    let record = app
        .state
        .find(&account("acct_1"), &sub_id("sub_1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, SubscriptionStatus::Active);
    assert_eq!(record.event_date, 1_000);
    assert_eq!(record.product.code.as_deref(), Some("pro"));

    assert_eq!(calculate_entitlements(&[record], true).license, ProductTier::Pro);
    assert_eq!(entitlement_tier(&app, "acct_1", false).await, ProductTier::Pro);
}

#[tokio::test]
async fn cancellation_after_activation_drops_to_free() {
    let app = TestApp::new();
    let events = [
        checkout("evt_1", 500, "cus_1", "acct_1"),
        subscription_event("evt_2", 1_000, CREATED, "sub_1", "cus_1", "active", "prod_pro", 1),
        subscription_event("evt_3", 2_000, DELETED, "sub_1", "cus_1", "canceled", "prod_pro", 1),
    ];
    for event in &events {
        app.ingest.handle(app.delivery(event)).await.unwrap();
    }

    assert_eq!(entitlement_tier(&app, "acct_1", false).await, ProductTier::Free);
}

// =============================================================================
// Idempotent intake
// =============================================================================

#[tokio::test]
async fn redelivered_event_is_logged_once_and_not_reapplied() {
    let app = TestApp::new();
    let event = checkout("evt_1", 500, "cus_1", "acct_1");

    let first = app.ingest.handle(app.delivery(&event)).await.unwrap();
    let second = app.ingest.handle(app.delivery(&event)).await.unwrap();
    let third = app.ingest.handle(app.delivery(&event)).await.unwrap();

    assert!(matches!(first, IngestResult::Recorded { .. }));
    assert!(matches!(second, IngestResult::Duplicate { outcome: None, .. }));
    assert!(matches!(third, IngestResult::Duplicate { outcome: None, .. }));
    assert_eq!(app.event_log.len().await, 1);
}

#[tokio::test]
async fn concurrent_redeliveries_record_exactly_once() {
    let app = Arc::new(TestApp::new());
    let event = checkout("evt_1", 500, "cus_1", "acct_1");

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let app = app.clone();
        let cmd = app.delivery(&event);
        tasks.push(tokio::spawn(async move { app.ingest.handle(cmd).await.unwrap() }));
    }
    let mut recorded = 0;
    for task in tasks {
        if matches!(task.await.unwrap(), IngestResult::Recorded { .. }) {
            recorded += 1;
        }
    }

    assert_eq!(recorded, 1);
    assert_eq!(app.event_log.len().await, 1);
}

#[tokio::test]
async fn expired_signature_is_rejected() {
    let app = TestApp::new();
    let cmd = app.delivery(&checkout("evt_1", 500, "cus_1", "acct_1"));
    app.clock.advance_secs(301);

    let err = app.ingest.handle(cmd).await.unwrap_err();

    assert!(matches!(err, ReconcileError::SignatureInvalid(_)));
    assert_eq!(app.event_log.len().await, 0);
}

// =============================================================================
// Identity
// =============================================================================

#[tokio::test]
async fn first_checkout_wins_the_customer() {
    let app = TestApp::new();

    app.ingest
        .handle(app.delivery(&checkout("evt_1", 500, "cus_1", "acct_1")))
        .await
        .unwrap();
    let second = app
        .ingest
        .handle(app.delivery(&checkout("evt_2", 600, "cus_1", "acct_2")))
        .await
        .unwrap();

    assert_eq!(second.outcome(), Some(&ReconcileOutcome::IdentityUnchanged));
    assert_eq!(
        app.identity.resolve(&CustomerId::new("cus_1").unwrap()).await.unwrap(),
        account("acct_1")
    );
}

#[tokio::test]
async fn subscription_before_checkout_is_dead_lettered_then_recovered() {
    let app = TestApp::with_history(vec![subscription_event(
        "evt_2", 1_000, CREATED, "sub_1", "cus_1", "active", "prod_pro", 1,
    )]);
    let early = subscription_event("evt_2", 1_000, CREATED, "sub_1", "cus_1", "active", "prod_pro", 1);

    let result = app.ingest.handle(app.delivery(&early)).await.unwrap();
    assert!(result.outcome().unwrap().is_failure());
    let letters = app.list_dead_letters.handle().await.unwrap();
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].code, "IDENTITY_NOT_FOUND");

    app.ingest
        .handle(app.delivery(&checkout("evt_1", 500, "cus_1", "acct_1")))
        .await
        .unwrap();
    let recovered = app.recover.handle(&EventId::new("evt_2").unwrap()).await.unwrap();

    assert_eq!(recovered.outcome().map(ReconcileOutcome::label), Some("subscription_applied"));
    assert_eq!(entitlement_tier(&app, "acct_1", false).await, ProductTier::Pro);
}

// =============================================================================
// Monotonic merge
// =============================================================================

#[tokio::test]
async fn out_of_order_delivery_keeps_newest_state() {
    let app = TestApp::new();
    app.ingest
        .handle(app.delivery(&checkout("evt_1", 500, "cus_1", "acct_1")))
        .await
        .unwrap();

    // Newest first, then older ones.
    for (id, created, status) in [("evt_4", 4_000, "active"), ("evt_3", 3_000, "past_due"), ("evt_2", 2_000, "trialing")] {
        app.ingest
            .handle(app.delivery(&subscription_event(
                id, created, UPDATED, "sub_1", "cus_1", status, "prod_pro", 1,
            )))
            .await
            .unwrap();
    }

    let record = app.state.find(&account("acct_1"), &sub_id("sub_1")).await.unwrap().unwrap();
    assert_eq!(record.event_date, 4_000);
    assert_eq!(record.status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn equal_timestamp_does_not_overwrite() {
    let app = TestApp::new();
    app.ingest
        .handle(app.delivery(&checkout("evt_1", 500, "cus_1", "acct_1")))
        .await
        .unwrap();

    app.ingest
        .handle(app.delivery(&subscription_event("evt_2", 1_000, CREATED, "sub_1", "cus_1", "active", "prod_pro", 1)))
        .await
        .unwrap();
    let tie = app
        .ingest
        .handle(app.delivery(&subscription_event("evt_3", 1_000, UPDATED, "sub_1", "cus_1", "canceled", "prod_pro", 1)))
        .await
        .unwrap();

    assert_eq!(tie.outcome().map(ReconcileOutcome::label), Some("subscription_stale"));
}

#[tokio::test]
async fn concurrent_writers_on_one_subscription_keep_the_newest() {
    let app = Arc::new(TestApp::new());
    app.ingest
        .handle(app.delivery(&checkout("evt_1", 500, "cus_1", "acct_1")))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for n in 1..=20i64 {
        let app = app.clone();
        let status = if n == 20 { "active" } else { "past_due" };
        let event = subscription_event(
            &format!("evt_c{}", n),
            1_000 + n,
            UPDATED,
            "sub_1",
            "cus_1",
            status,
            "prod_pro",
            1,
        );
        tasks.push(tokio::spawn(async move {
            app.ingest.handle(app.delivery(&event)).await.unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let record = app.state.find(&account("acct_1"), &sub_id("sub_1")).await.unwrap().unwrap();
    assert_eq!(record.event_date, 1_020);
    assert_eq!(record.status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn sibling_subscriptions_are_kept_and_highest_tier_wins() {
    let app = TestApp::new();
    app.ingest
        .handle(app.delivery(&checkout("evt_1", 500, "cus_1", "acct_1")))
        .await
        .unwrap();
    app.ingest
        .handle(app.delivery(&subscription_event("evt_2", 1_000, CREATED, "sub_1", "cus_1", "active", "prod_standard", 1)))
        .await
        .unwrap();
    app.ingest
        .handle(app.delivery(&subscription_event("evt_3", 1_100, CREATED, "sub_2", "cus_1", "active", "prod_enterprise", 40)))
        .await
        .unwrap();

    assert_eq!(app.state.list_for_account(&account("acct_1")).await.unwrap().len(), 2);
    let entitlement = app
        .entitlements
        .handle(GetEntitlementsQuery {
            account: account("acct_1"),
            include_testing: false,
        })
        .await
        .unwrap();
    assert_eq!(entitlement.license, ProductTier::Enterprise);
    assert_eq!(entitlement.seats, 40);
    assert!(entitlement.team);
}

#[tokio::test]
async fn test_mode_product_counts_only_when_requested() {
    let app = TestApp::new();
    app.ingest
        .handle(app.delivery(&checkout("evt_1", 500, "cus_1", "acct_1")))
        .await
        .unwrap();
    app.ingest
        .handle(app.delivery(&subscription_event("evt_2", 1_000, CREATED, "sub_1", "cus_1", "active", "prod_pro_test", 1)))
        .await
        .unwrap();

    assert_eq!(entitlement_tier(&app, "acct_1", false).await, ProductTier::Free);
    assert_eq!(entitlement_tier(&app, "acct_1", true).await, ProductTier::Pro);
}

// =============================================================================
// Product staleness
// =============================================================================

#[tokio::test]
async fn product_is_refetched_only_after_a_week() {
    let app = TestApp::new();
    app.ingest
        .handle(app.delivery(&checkout("evt_1", 500, "cus_1", "acct_1")))
        .await
        .unwrap();

    app.ingest
        .handle(app.delivery(&subscription_event("evt_2", 1_000, CREATED, "sub_1", "cus_1", "active", "prod_pro", 1)))
        .await
        .unwrap();
    assert_eq!(app.catalog.fetches(), 1);

    app.clock.advance_secs(6 * 24 * 3600);
    app.ingest
        .ingest_verified(
            subscription_event("evt_3", 2_000, UPDATED, "sub_1", "cus_1", "active", "prod_pro", 2),
            entitlement_reconciler::application::handlers::billing::DuplicatePolicy::Skip,
        )
        .await
        .unwrap();
    assert_eq!(app.catalog.fetches(), 1);

    app.clock.advance_secs(2 * 24 * 3600);
    app.catalog.put("prod_pro", "enterprise", true);
    app.ingest
        .ingest_verified(
            subscription_event("evt_4", 3_000, UPDATED, "sub_1", "cus_1", "active", "prod_pro", 3),
            entitlement_reconciler::application::handlers::billing::DuplicatePolicy::Skip,
        )
        .await
        .unwrap();
    assert_eq!(app.catalog.fetches(), 2);
    assert_eq!(entitlement_tier(&app, "acct_1", false).await, ProductTier::Enterprise);
}

// =============================================================================
// Backfill and replay
// =============================================================================

fn history() -> Vec<entitlement_reconciler::domain::billing::StripeEvent> {
    vec![
        checkout("evt_1", 500, "cus_1", "acct_1"),
        checkout("evt_5", 600, "cus_2", "acct_2"),
        subscription_event("evt_2", 1_000, CREATED, "sub_1", "cus_1", "trialing", "prod_pro", 1),
        subscription_event("evt_6", 1_100, CREATED, "sub_9", "cus_2", "active", "prod_enterprise", 9),
        subscription_event("evt_3", 2_000, UPDATED, "sub_1", "cus_1", "active", "prod_pro", 1),
        subscription_event("evt_4", 2_500, CREATED, "sub_2", "cus_1", "active", "prod_standard", 1),
    ]
}

#[tokio::test]
async fn backfill_rebuilds_an_empty_account() {
    let app = TestApp::with_history(history());

    let summary = app.backfill.handle(&account("acct_1")).await.unwrap();

    assert_eq!(summary.fetched, 6);
    assert_eq!(summary.replayed, 4);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.new_active_subscriptions, 2);
    assert!(app.state.list_for_account(&account("acct_2")).await.unwrap().is_empty());
    assert_eq!(entitlement_tier(&app, "acct_1", false).await, ProductTier::Pro);
}

#[tokio::test]
async fn backfill_after_live_delivery_adds_nothing_new() {
    let app = TestApp::with_history(history());
    for event in history().iter().filter(|e| e.id.as_str() != "evt_5" && e.id.as_str() != "evt_6") {
        app.ingest.handle(app.delivery(event)).await.unwrap();
    }

    let summary = app.backfill.handle(&account("acct_1")).await.unwrap();

    assert_eq!(summary.new_active_subscriptions, 0);
    assert!(app.dead_letters.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn replay_converges_after_a_second_pass() {
    let app = TestApp::new();
    for event in history() {
        app.ingest.handle(app.delivery(&event)).await.unwrap();
    }
    let before = app.state.list_for_account(&account("acct_1")).await.unwrap();

    app.replay.handle().await.unwrap();
    let summary = app.replay.handle().await.unwrap();

    assert_eq!(summary.replayed, 6);
    assert_eq!(summary.failed, 0);
    assert_eq!(app.state.list_for_account(&account("acct_1")).await.unwrap(), before);
}

// =============================================================================
// Order insensitivity
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_delivery_order_yields_the_newest_record(
        order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let statuses = ["incomplete", "trialing", "active", "past_due", "active", "canceled"];
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();

        let record = runtime.block_on(async {
            let app = TestApp::new();
            app.ingest
                .handle(app.delivery(&checkout("evt_0", 100, "cus_1", "acct_1")))
                .await
                .unwrap();
            for i in &order {
                let event = subscription_event(
                    &format!("evt_{}", i + 1),
                    1_000 + *i as i64,
                    UPDATED,
                    "sub_1",
                    "cus_1",
                    statuses[*i],
                    "prod_pro",
                    1,
                );
                app.ingest.handle(app.delivery(&event)).await.unwrap();
            }
            app.state.find(&account("acct_1"), &sub_id("sub_1")).await.unwrap().unwrap()
        });

        prop_assert_eq!(record.event_date, 1_005);
        prop_assert_eq!(record.status, SubscriptionStatus::Canceled);
    }
}
