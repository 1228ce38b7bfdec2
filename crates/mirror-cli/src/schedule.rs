//! Periodic tick runner

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

/// Call `tick` every `period` until `shutdown` resolves.
///
/// The first tick fires immediately. A tick is always awaited to completion
/// before the next one starts, and ticks missed while one was running are
/// skipped rather than bunched up. `shutdown` is checked between ticks.
/// Returns the number of ticks run.
pub async fn run_periodic<T, F, S>(period: Duration, mut tick: T, shutdown: S) -> u64
where
    T: FnMut(u64) -> F,
    F: Future<Output = ()>,
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut shutdown = pin!(shutdown);
    let mut ticks = 0;

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            _ = ticker.tick() => {}
        }
        ticks += 1;
        tick(ticks).await;
    }

    ticks
}
