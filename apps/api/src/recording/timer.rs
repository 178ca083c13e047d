use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Spawns a periodic task that calls `on_tick` every `period` until it returns `false`.
///
/// The first call happens one full period after spawning.
pub fn spawn_ticker<F, Fut>(period: Duration, mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // completes immediately

        loop {
            interval.tick().await;
            if !on_tick().await {
                break;
            }
        }
    })
}
