use std::sync::Arc;

use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, register_gauge, Counter, CounterVec, Gauge};
use tracing::warn;

use crate::db::{RegistrationStore, Store};
use crate::models::registration::RegistrationStatus;

lazy_static! {
    // ── Event counters (increment on each event) ────────────────────────────
    pub static ref REGISTRATIONS_SUBMITTED_COUNTER: Counter = register_counter!(
        "api_registrations_submitted_total",
        "Cadastros recebidos pelo formulário público"
    ).unwrap();

    pub static ref REGISTRATIONS_APPROVED_COUNTER: CounterVec = register_counter_vec!(
        "api_registrations_approved_total",
        "Aprovações de cadastro por resultado",
        &["outcome"]
    ).unwrap();

    pub static ref NOTIFICATIONS_SEEN_COUNTER: CounterVec = register_counter_vec!(
        "api_notifications_seen_total",
        "Notificações marcadas como vistas por tipo",
        &["kind"]
    ).unwrap();

    pub static ref STALE_ACCOUNTS_PURGED_COUNTER: Counter = register_counter!(
        "api_stale_accounts_purged_total",
        "Contas não ativadas removidas pela limpeza"
    ).unwrap();

    // ── Business metrics ────────────────────────────────────────────────────
    pub static ref PENDING_REGISTRATIONS_GAUGE: Gauge = register_gauge!(
        "semear_pending_registrations",
        "Cadastros aguardando análise"
    ).unwrap();
}

/// Spawn the background metrics collector (refreshes every 5 minutes).
pub fn start(store: Arc<dyn Store>) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = collect(store.as_ref()).await {
                warn!("Metrics: collection failed: {}", e);
            }
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
        }
    });
}

async fn collect(store: &dyn Store) -> anyhow::Result<()> {
    let pending = store
        .count_registrations(RegistrationStatus::AwaitingReview)
        .await?;
    PENDING_REGISTRATIONS_GAUGE.set(pending as f64);
    Ok(())
}
