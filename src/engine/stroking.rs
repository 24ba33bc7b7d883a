//! Stroking loop.
//!
//! Demand driven: a new target is requested only once the driver has
//! finished the previous move. The loop ends on its own as soon as the
//! servo leaves `Running` or a newer loop has been started.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use crate::driver::StepperDriver;
use crate::state::ServoState;

use super::shared::SharedRef;

/// Run until the state or the run generation changes.
pub(crate) async fn run<D>(shared: SharedRef<D>, generation: u64)
where
    D: StepperDriver + Send + 'static,
{
    let period = Duration::from_millis(u64::from(shared.config.stroking.period_ms));
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!("Stroking loop {} started", generation);

    loop {
        ticker.tick().await;
        if !cycle(&shared, generation) {
            break;
        }
    }

    tracing::debug!("Stroking loop {} finished", generation);
}

/// One control cycle. Returns `false` when the loop must exit.
fn cycle<D: StepperDriver>(shared: &SharedRef<D>, generation: u64) -> bool {
    let mut inner = shared.lock();

    if inner.state != ServoState::Running || inner.run_generation != generation {
        return false;
    }

    if inner.driver.is_running() {
        return true;
    }

    inner.settings.index = inner.settings.index.wrapping_add(1);
    let index = inner.settings.index;
    inner.dispatch_target(index, &shared.limits);
    true
}
