//! In-process cycle scheduler
//!
//! Optional alternative to an external cron hitting `POST /autopilot/run`.
//! The first run happens one interval after startup. A tick that finds a
//! cycle still in progress is skipped, never queued.

use std::time::Duration;

use mkat_common::{Error, Result};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::AppState;

/// Longest accepted interval between scheduled cycles
pub const MAX_SCHEDULE_INTERVAL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Run one scheduled cycle unless another is in progress
///
/// Returns `false` when the tick was skipped.
pub async fn run_scheduled_cycle(state: &AppState) -> bool {
    let Ok(_guard) = state.cycle_lock.try_lock() else {
        warn!("Scheduled autopilot cycle skipped: previous cycle still running");
        return false;
    };

    match state.cycle.run_all().await {
        Ok(report) => {
            let failed = report.results.iter().filter(|r| !r.success).count();
            info!(processed = report.processed, failed, "Scheduled autopilot cycle finished");
        }
        Err(e) => {
            error!(error = %e, "Scheduled autopilot cycle could not load configs");
        }
    }

    true
}

/// Spawn the scheduler loop on the current runtime
///
/// Fails for a zero interval or one longer than [`MAX_SCHEDULE_INTERVAL`].
pub fn spawn(state: AppState, every: Duration) -> Result<JoinHandle<()>> {
    if every.is_zero() || every > MAX_SCHEDULE_INTERVAL {
        return Err(Error::Config(format!(
            "Schedule interval of {}s is outside 1..={}s",
            every.as_secs(),
            MAX_SCHEDULE_INTERVAL.as_secs()
        )));
    }
    let first_tick = Instant::now()
        .checked_add(every)
        .ok_or_else(|| Error::Config("Schedule interval overflows the clock".to_string()))?;

    info!(interval_secs = every.as_secs(), "Autopilot scheduler started");

    Ok(tokio::spawn(async move {
        let mut ticker = interval_at(first_tick, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            run_scheduled_cycle(&state).await;
        }
    }))
}
