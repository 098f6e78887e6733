use log::{debug, info};
use std::thread;
use std::time::{Duration, Instant};

use crate::client::IntuisClient;
use crate::error::ClientError;
use crate::models::home::Home;

/// Refresh status on a steady cadence, calling `on_tick` with the updated home.
///
/// Refreshes never overlap: each tick finishes before the next starts. Stops
/// on the first error, or after `max_ticks` ticks when given.
pub fn run_loop<F>(
    client: &mut IntuisClient,
    interval: Duration,
    max_ticks: Option<u64>,
    mut on_tick: F,
) -> Result<(), ClientError>
where
    F: FnMut(&Home),
{
    info!("Polling status every {}s", interval.as_secs());
    let mut ticks = 0u64;
    loop {
        let tick_start = Instant::now();

        client.refresh_status()?;
        if let Some(home) = client.home() {
            on_tick(home);
        }
        ticks += 1;
        if max_ticks.is_some_and(|max| ticks >= max) {
            debug!("Polling stopped after {} tick(s)", ticks);
            return Ok(());
        }

        // Maintain steady cadence
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}
