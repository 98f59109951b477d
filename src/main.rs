use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use entitlement_reconciler::adapters::auth::JwtAdminValidator;
use entitlement_reconciler::adapters::cache::{DisabledEntitlementCache, TtlEntitlementCache};
use entitlement_reconciler::adapters::http::{reconciler_router, ReconcilerAppState};
use entitlement_reconciler::adapters::postgres::{
    run_migrations, PostgresCustomerAccounts, PostgresDeadLetters, PostgresEventLog,
    PostgresProductSnapshots, PostgresSubscriptionState,
};
use entitlement_reconciler::adapters::stripe::{StripeClient, StripeConfig, StripeSignatureVerifier};
use entitlement_reconciler::application::handlers::billing::{
    BackfillAccountHandler, EventReconciler, GetEntitlementsHandler, IdentityMapper,
    IngestWebhookHandler, ListDeadLettersHandler, ProductCache, RecoverEventHandler,
    ReplayEventsHandler, SubscriptionMerger,
};
use entitlement_reconciler::config::AppConfig;
use entitlement_reconciler::ports::{Clock, EntitlementCache, SystemClock};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let state = build_state(&config, pool);
    let app = reconciler_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        environment = ?config.server.environment,
        stripe_test_mode = config.payment.is_test_mode(),
        "Entitlement reconciler listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    // JSON lines in production, human-readable output elsewhere.
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()
            .ok();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
            .ok();
    }
}

fn build_state(config: &AppConfig, pool: sqlx::PgPool) -> ReconcilerAppState {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let reconciliation = &config.reconciliation;

    let event_log = Arc::new(PostgresEventLog::new(pool.clone()));
    let accounts = Arc::new(PostgresCustomerAccounts::new(pool.clone()));
    let subscriptions = Arc::new(PostgresSubscriptionState::new(pool.clone()));
    let snapshots = Arc::new(PostgresProductSnapshots::new(pool.clone()));
    let dead_letters = Arc::new(PostgresDeadLetters::new(pool));

    let stripe = Arc::new(StripeClient::new(
        StripeConfig::new(config.payment.stripe_api_key.clone())
            .with_base_url(config.payment.api_base_url.clone()),
    ));
    let verifier = Arc::new(
        StripeSignatureVerifier::new(config.payment.stripe_webhook_secret.clone())
            .with_tolerance_secs(config.payment.signature_tolerance_secs)
            .with_clock(clock.clone()),
    );

    let identity = Arc::new(IdentityMapper::new(accounts));
    let products = Arc::new(
        ProductCache::new(snapshots, stripe.clone(), clock.clone())
            .with_staleness_window(reconciliation.product_staleness()),
    );
    let merger = Arc::new(SubscriptionMerger::new(subscriptions.clone(), products));
    let reconciler = Arc::new(EventReconciler::new(
        identity.clone(),
        merger,
        dead_letters.clone(),
        clock,
    ));
    let ingest = Arc::new(IngestWebhookHandler::new(
        verifier,
        event_log.clone(),
        reconciler.clone(),
    ));

    let cache: Arc<dyn EntitlementCache> = if reconciliation.entitlement_cache_enabled {
        Arc::new(TtlEntitlementCache::new(reconciliation.entitlement_cache_ttl()))
    } else {
        Arc::new(DisabledEntitlementCache)
    };

    ReconcilerAppState {
        ingest: ingest.clone(),
        entitlements: Arc::new(GetEntitlementsHandler::new(subscriptions.clone(), cache)),
        replay: Arc::new(ReplayEventsHandler::new(event_log, reconciler)),
        backfill: Arc::new(
            BackfillAccountHandler::new(stripe.clone(), ingest.clone(), identity, subscriptions)
                .with_page_size(reconciliation.backfill_page_size),
        ),
        recover: Arc::new(RecoverEventHandler::new(stripe, ingest)),
        dead_letters: Arc::new(ListDeadLettersHandler::new(dead_letters)),
        admin_validator: Arc::new(JwtAdminValidator::new(
            config.admin.jwt_secret.clone(),
            config.admin.jwt_issuer.clone(),
        )),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
