use std::sync::Arc;

use chrono::Local;
use serde_json::Value;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::feed::client::{OrderFeedApi, StatusUpdate};
use crate::reports::service::{aggregate, quick_stats};
use crate::session::{DashboardSession, FeedOutcome};
use crate::shared::config::PollingConfig;
use crate::shared::error::FeedError;

/// How a poll was triggered. Silent polls (the timer) never surface an
/// error beyond the connectivity flag; visible polls (user refresh)
/// propagate it so the caller can show a full error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    Silent,
    Visible,
}

/// Drives the refresh cycle: a recurring silent poll, bounded retries,
/// and commit-then-reconcile for staged status transitions.
///
/// Overlapping polls are tolerated by design: applying a feed is an
/// idempotent wholesale replacement, so whichever response lands last
/// wins. There is no in-flight cancellation.
pub struct PollWorker {
    api: Arc<dyn OrderFeedApi>,
    session: DashboardSession,
    config: PollingConfig,
    auto_refresh: bool,
}

impl PollWorker {
    pub fn new(api: Arc<dyn OrderFeedApi>, session: DashboardSession, config: PollingConfig) -> Self {
        Self {
            api,
            session,
            config,
            auto_refresh: true,
        }
    }

    pub fn session(&self) -> &DashboardSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut DashboardSession {
        &mut self.session
    }

    /// Pause or resume the timer-driven refresh
    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
        info!(enabled, "auto refresh toggled");
    }

    /// Run the periodic silent poll until the task is dropped
    pub async fn run_loop(&mut self) {
        info!(
            interval_seconds = self.config.interval_seconds,
            "poll worker started"
        );
        let mut interval = time::interval(time::Duration::from_secs(self.config.interval_seconds));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if !self.auto_refresh {
                continue;
            }
            // silent: failures were already logged and counted
            let _ = self.poll(PollKind::Silent).await;
        }
    }

    /// User-triggered refresh; errors are the caller's to display
    pub async fn refresh(&mut self) -> Result<FeedOutcome, FeedError> {
        self.poll(PollKind::Visible).await
    }

    /// One complete poll: fetch, ingest, report.
    ///
    /// Transport and HTTP failures re-run the whole poll after a delay
    /// scaled by the cumulative failure count, up to the configured
    /// cap; after that nothing runs until the next tick or a manual
    /// refresh. A malformed body is not a connectivity problem: the
    /// feed degrades to an empty list and the poll completes.
    pub async fn poll(&mut self, kind: PollKind) -> Result<FeedOutcome, FeedError> {
        loop {
            match self.api.fetch_feed().await {
                Ok(raw) => return Ok(self.ingest(&raw)),
                Err(FeedError::Malformed(detail)) => {
                    warn!("feed body unusable ({detail}), degrading to empty list");
                    return Ok(self.ingest(&Value::Null));
                }
                Err(err) => {
                    let failures = self.session.record_failure();
                    if failures > self.config.max_retry_attempts {
                        match kind {
                            PollKind::Silent => warn!("silent poll gave up: {err}"),
                            PollKind::Visible => error!("refresh failed: {err}"),
                        }
                        return Err(err);
                    }
                    let delay = self.config.retry_delay_ms * failures as u64;
                    warn!("poll failed ({err}), retry {failures} in {delay} ms");
                    time::sleep(time::Duration::from_millis(delay)).await;
                }
            }
        }
    }

    /// Send the staged transition and reconcile against the server.
    ///
    /// No local mutation happens on success: the server is the single
    /// source of truth, so a silent re-fetch follows after a short
    /// delay. On failure the action is discarded; mutations are never
    /// retried automatically.
    pub async fn commit_pending(&mut self) -> Result<(), FeedError> {
        let Some(pending) = self.session.take_pending() else {
            return Ok(());
        };

        let update = StatusUpdate {
            order_id: pending.order_id.value().to_string(),
            new_status: pending.to.code().to_string(),
            updated_by: pending.actor.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        info!(
            request_id = %pending.request_id,
            order_id = %pending.order_id,
            from = %pending.from,
            to = %pending.to,
            "committing status update"
        );

        match self.api.send_status_update(&update).await {
            Ok(()) => {
                time::sleep(time::Duration::from_millis(self.config.refresh_after_update_ms))
                    .await;
                let _ = self.poll(PollKind::Silent).await;
                Ok(())
            }
            Err(err) => {
                error!(
                    request_id = %pending.request_id,
                    order_id = %pending.order_id,
                    "status update failed: {err}"
                );
                Err(err)
            }
        }
    }

    fn ingest(&mut self, raw: &Value) -> FeedOutcome {
        let outcome = self.session.apply_feed(raw);

        for order in &outcome.new_orders {
            info!(
                order_id = %order.id,
                customer = order.customer_name.as_deref().unwrap_or("unknown"),
                total = order.total_price,
                "new order received"
            );
        }

        let stats = quick_stats(self.session.orders(), outcome.stats.as_ref());
        let snapshot = aggregate(self.session.orders(), Local::now().naive_local());
        info!(
            active = stats.total_active,
            confirmed = stats.confirmed,
            preparing = stats.preparing,
            today_sales = snapshot.today_sales,
            today_orders = snapshot.today_orders,
            "feed refreshed"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use contracts::enums::ActiveFilter;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedApi {
        feeds: Mutex<VecDeque<Result<Value, FeedError>>>,
        fetch_calls: AtomicU32,
        update_results: Mutex<VecDeque<Result<(), FeedError>>>,
        updates: Mutex<Vec<StatusUpdate>>,
    }

    impl ScriptedApi {
        fn push_feed(&self, result: Result<Value, FeedError>) {
            self.feeds.lock().unwrap().push_back(result);
        }

        fn fetch_calls(&self) -> u32 {
            self.fetch_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OrderFeedApi for ScriptedApi {
        async fn fetch_feed(&self) -> Result<Value, FeedError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.feeds
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!([])))
        }

        async fn send_status_update(&self, update: &StatusUpdate) -> Result<(), FeedError> {
            self.updates.lock().unwrap().push(update.clone());
            self.update_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(()))
        }
    }

    fn fast_config() -> PollingConfig {
        PollingConfig {
            interval_seconds: 3600,
            max_retry_attempts: 2,
            retry_delay_ms: 1,
            refresh_after_update_ms: 1,
        }
    }

    fn worker(api: Arc<ScriptedApi>) -> PollWorker {
        PollWorker::new(
            api,
            DashboardSession::new(ActiveFilter::Terminal),
            fast_config(),
        )
    }

    fn feed_with_order(id: u32) -> Value {
        json!([{ "order_id": id, "status": "confirmed" }])
    }

    #[tokio::test]
    async fn test_poll_applies_feed() {
        let api = Arc::new(ScriptedApi::default());
        api.push_feed(Ok(feed_with_order(1)));
        let mut worker = worker(Arc::clone(&api));

        let outcome = worker.poll(PollKind::Silent).await.unwrap();
        assert!(outcome.new_orders.is_empty());
        assert_eq!(worker.session().orders().len(), 1);
        assert!(worker.session().is_connected());
    }

    #[tokio::test]
    async fn test_poll_retries_then_succeeds() {
        let api = Arc::new(ScriptedApi::default());
        api.push_feed(Err(FeedError::Status(StatusCode::BAD_GATEWAY)));
        api.push_feed(Ok(feed_with_order(1)));
        let mut worker = worker(Arc::clone(&api));

        worker.poll(PollKind::Silent).await.unwrap();
        assert_eq!(api.fetch_calls(), 2);
        assert!(worker.session().is_connected());
        assert_eq!(worker.session().failure_count(), 0);
    }

    #[tokio::test]
    async fn test_poll_gives_up_after_attempt_cap() {
        let api = Arc::new(ScriptedApi::default());
        for _ in 0..5 {
            api.push_feed(Err(FeedError::Status(StatusCode::SERVICE_UNAVAILABLE)));
        }
        let mut worker = worker(Arc::clone(&api));

        assert!(worker.poll(PollKind::Silent).await.is_err());
        // initial attempt plus max_retry_attempts re-invocations
        assert_eq!(api.fetch_calls(), 3);
        assert!(!worker.session().is_connected());

        // the failure count is cumulative: the next poll fails fast
        // and stays quiet until something succeeds
        assert!(worker.poll(PollKind::Silent).await.is_err());
        assert_eq!(api.fetch_calls(), 4);
    }

    #[tokio::test]
    async fn test_malformed_feed_degrades_without_disconnect() {
        let api = Arc::new(ScriptedApi::default());
        api.push_feed(Ok(feed_with_order(1)));
        api.push_feed(Err(FeedError::Malformed("not json".into())));
        let mut worker = worker(Arc::clone(&api));

        worker.poll(PollKind::Silent).await.unwrap();
        let outcome = worker.poll(PollKind::Silent).await.unwrap();
        assert!(outcome.new_orders.is_empty());
        assert!(worker.session().orders().is_empty());
        // malformed is a shape problem, not a connectivity problem
        assert!(worker.session().is_connected());
    }

    #[tokio::test]
    async fn test_commit_sends_contract_fields_and_refetches() {
        let api = Arc::new(ScriptedApi::default());
        api.push_feed(Ok(feed_with_order(7)));
        let mut worker = worker(Arc::clone(&api));
        worker.poll(PollKind::Silent).await.unwrap();

        worker
            .session_mut()
            .request_transition("7", "preparing", "ops")
            .unwrap();
        let calls_before = api.fetch_calls();
        worker.commit_pending().await.unwrap();

        let updates = api.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].order_id, "7");
        assert_eq!(updates[0].new_status, "preparing");
        assert_eq!(updates[0].updated_by, "ops");
        // the wire field names are the collaborator's contract
        let body = serde_json::to_value(&updates[0]).unwrap();
        for key in ["order_id", "new_status", "updated_by", "timestamp"] {
            assert!(body.get(key).is_some(), "missing {key}");
        }
        drop(updates);

        assert!(worker.session().pending().is_none());
        // the reconciling re-fetch ran instead of any local mutation
        assert_eq!(api.fetch_calls(), calls_before + 1);
    }

    #[tokio::test]
    async fn test_commit_failure_discards_pending_without_refetch() {
        let api = Arc::new(ScriptedApi::default());
        api.push_feed(Ok(feed_with_order(7)));
        api.update_results
            .lock()
            .unwrap()
            .push_back(Err(FeedError::Status(StatusCode::INTERNAL_SERVER_ERROR)));
        let mut worker = worker(Arc::clone(&api));
        worker.poll(PollKind::Silent).await.unwrap();

        worker
            .session_mut()
            .request_transition("7", "preparing", "ops")
            .unwrap();
        let calls_before = api.fetch_calls();

        assert!(worker.commit_pending().await.is_err());
        assert!(worker.session().pending().is_none());
        assert_eq!(api.fetch_calls(), calls_before);
    }

    #[tokio::test]
    async fn test_commit_without_pending_is_a_noop() {
        let api = Arc::new(ScriptedApi::default());
        let mut worker = worker(Arc::clone(&api));
        worker.commit_pending().await.unwrap();
        assert!(api.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_poll_completions_last_write_wins() {
        // Two polls can be in flight at once; nothing serializes them.
        // This is an accepted weak-consistency window: both completions
        // apply a wholesale replacement, so the one landing last wins
        // regardless of request-issue order.
        let api = Arc::new(ScriptedApi::default());
        api.push_feed(Ok(feed_with_order(1)));
        api.push_feed(Ok(feed_with_order(2)));
        let mut worker = worker(Arc::clone(&api));

        worker.poll(PollKind::Silent).await.unwrap();
        worker.poll(PollKind::Silent).await.unwrap();
        assert_eq!(worker.session().orders().len(), 1);
        assert_eq!(worker.session().orders()[0].id.value(), "2");
    }
}
