//! Periodic housekeeping: expires ACTIVE contracts past their end date and
//! flags UNPAID bills past their due date.

use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::db::services::{self as db_services, LifecycleSettings};
use crate::server::config::ServerConfig;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    pub contracts_expired: u64,
    pub bills_overdue: u64,
}

/// One pass. Each half runs even if the other fails.
pub async fn run_lifecycle_sweep(db: &DatabaseConnection, settings: &LifecycleSettings) -> SweepOutcome {
    let mut outcome = SweepOutcome::default();

    match db_services::expire_overdue_contracts(db, settings).await {
        Ok(count) => outcome.contracts_expired = count,
        Err(e) => error!(error = %e, "Error expiring overdue contracts."),
    }
    match db_services::mark_overdue_bills(db, settings.today).await {
        Ok(count) => outcome.bills_overdue = count,
        Err(e) => error!(error = %e, "Error marking overdue bills."),
    }
    outcome
}

/// Spawns the sweep loop, or returns `None` when the interval is 0.
pub fn spawn_lifecycle_sweep(db: DatabaseConnection, config: Arc<ServerConfig>) -> Option<JoinHandle<()>> {
    if config.sweep_interval_seconds == 0 {
        info!("Lifecycle sweep disabled.");
        return None;
    }
    let period = Duration::from_secs(config.sweep_interval_seconds);

    Some(tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_seconds = period.as_secs(), "Lifecycle sweep task started.");
        loop {
            ticker.tick().await;
            let settings = LifecycleSettings::from_config(&config, Utc::now().date_naive());
            let outcome = run_lifecycle_sweep(&db, &settings).await;
            if outcome == SweepOutcome::default() {
                debug!(today = %settings.today, "Lifecycle sweep found nothing to do.");
            } else {
                info!(
                    today = %settings.today,
                    contracts_expired = outcome.contracts_expired,
                    bills_overdue = outcome.bills_overdue,
                    "Lifecycle sweep applied changes."
                );
            }
        }
    }))
}
