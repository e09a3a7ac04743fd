//! Background loops keeping the board fresh: a periodic full reload to pick
//! up other clients' writes, and a slower check for the month boundary.
//!
//! Both loops log failures and keep going. There is no retry or backoff; the
//! next tick simply tries again and the last successful response wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use ciboard_store::RequestStore;

use crate::board::RequestBoard;

pub fn spawn_poller<S>(
    board: Arc<Mutex<RequestBoard<S>>>,
    poll_interval: Duration,
) -> JoinHandle<()>
where
    S: RequestStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let mut board = board.lock().await;
            if let Err(error) = board.refresh().await {
                warn!(error = %error, "periodic refresh failed, keeping last good state");
            }
        }
    })
}

pub fn spawn_rollover<S>(
    board: Arc<Mutex<RequestBoard<S>>>,
    check_interval: Duration,
) -> JoinHandle<()>
where
    S: RequestStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let mut board = board.lock().await;
            if let Some((closed, hours)) = board.check_month_rollover(Utc::now()) {
                info!(closed_month = %closed, closed_hours = %hours, "month boundary crossed");
            }
        }
    })
}
