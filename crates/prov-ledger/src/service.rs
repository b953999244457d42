//! Single-writer request service.
//!
//! One task owns the ledger and drains a bounded queue, running each request
//! to completion before taking the next. Store locking and file I/O are
//! synchronous, so each request runs on the blocking pool while the queue
//! task waits for it. Callers hold a cheap [`LedgerHandle`] and await the
//! reply on a oneshot channel.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{self, JoinHandle};
use tracing::{debug, info_span, Span};

use prov_types::{Actor, RequestId};

use crate::commands::CommandRegistry;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;

/// One queued request.
struct Job {
    id: RequestId,
    actor: Option<Actor>,
    command: String,
    args: Vec<String>,
    reply: oneshot::Sender<LedgerResult<Value>>,
}

/// Cloneable submission side of a running [`LedgerService`].
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    queue: mpsc::Sender<Job>,
}

impl LedgerHandle {
    /// Queue `command` and wait for its result.
    pub async fn submit(
        &self,
        actor: Option<Actor>,
        command: impl Into<String>,
        args: Vec<String>,
    ) -> LedgerResult<Value> {
        let (reply, response) = oneshot::channel();
        let job = Job {
            id: RequestId::new(),
            actor,
            command: command.into(),
            args,
            reply,
        };
        self.queue
            .send(job)
            .await
            .map_err(|_| LedgerError::Store("ledger service stopped".into()))?;
        response
            .await
            .map_err(|_| LedgerError::Store("ledger service dropped the request".into()))?
    }
}

/// The worker task. Stops once every [`LedgerHandle`] has been dropped.
pub struct LedgerService {
    ledger: Arc<Ledger>,
    registry: Arc<CommandRegistry>,
    queue: mpsc::Receiver<Job>,
    span: Span,
}

impl LedgerService {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(
        ledger: Arc<Ledger>,
        registry: Arc<CommandRegistry>,
        span: Span,
    ) -> (LedgerHandle, JoinHandle<()>) {
        let capacity = ledger.config().channel_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let service = Self {
            ledger,
            registry,
            queue: rx,
            span,
        };
        let task = tokio::spawn(service.run());
        (LedgerHandle { queue: tx }, task)
    }

    async fn run(mut self) {
        while let Some(job) = self.queue.recv().await {
            let Job {
                id,
                actor,
                command,
                args,
                reply,
            } = job;
            let span = info_span!(
                parent: &self.span,
                "request",
                id = %id.short_id(),
                command = %command
            );

            let ledger = Arc::clone(&self.ledger);
            let registry = Arc::clone(&self.registry);
            let request_span = span.clone();
            let result = task::spawn_blocking(move || {
                request_span
                    .in_scope(|| registry.dispatch(&ledger, actor.as_ref(), &command, &args))
            })
            .await
            .unwrap_or_else(|err| Err(LedgerError::Store(format!("request worker failed: {err}"))));

            if let Err(err) = &result {
                debug!(parent: &span, kind = err.kind(), error = %err, "request failed");
            }
            // The caller may have given up waiting; nothing to do then.
            let _ = reply.send(result);
        }
        debug!(parent: &self.span, "ledger service stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use prov_types::RoleKind;

    use crate::commands::{BoundArgs, CommandSpec};

    fn start() -> (LedgerHandle, JoinHandle<()>) {
        let ledger = Arc::new(Ledger::in_memory());
        let registry = Arc::new(CommandRegistry::standard().unwrap());
        LedgerService::spawn(ledger, registry, Span::none())
    }

    fn animal_args(tag: &str) -> Vec<String> {
        [
            "bovine", "angus", "A1", tag, "2024-01-01", "300", "FarmerA", "alive", "1", "", "",
            "cert",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[tokio::test]
    async fn submit_round_trip() {
        let (handle, _task) = start();
        let farmer = Actor::new("FarmerA", RoleKind::Farmer);
        handle
            .submit(Some(farmer), "createAnimal", animal_args("T01"))
            .await
            .unwrap();
        let chain = handle
            .submit(None, "getChain", vec!["T01".into()])
            .await
            .unwrap();
        assert_eq!(chain.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn errors_come_back_to_the_caller() {
        let (handle, _task) = start();
        let err = handle
            .submit(None, "getChain", vec!["T404".into()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn concurrent_submissions_keep_every_member() {
        let (handle, _task) = start();
        let mut joins = Vec::new();
        for i in 0..20 {
            let handle = handle.clone();
            joins.push(tokio::spawn(async move {
                let farmer = Actor::new("FarmerA", RoleKind::Farmer);
                handle
                    .submit(Some(farmer), "createAnimal", animal_args(&format!("T{i:02}")))
                    .await
            }));
        }
        for join in joins {
            join.await.unwrap().unwrap();
        }
        let all = handle
            .submit(None, "getAllOfKind", vec!["animal".into()])
            .await
            .unwrap();
        assert_eq!(all.as_array().unwrap().len(), 20);
    }

    fn slow(_: &Ledger, _: Option<&Actor>, _: &BoundArgs<'_>) -> LedgerResult<Value> {
        std::thread::sleep(Duration::from_millis(100));
        Ok(Value::Null)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn slow_request_does_not_stall_the_runtime() {
        let registry = CommandRegistry::new([CommandSpec::query("slow", &[], slow)]).unwrap();
        let (handle, _task) =
            LedgerService::spawn(Arc::new(Ledger::in_memory()), Arc::new(registry), Span::none());

        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let ticker = tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(5)).await;
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });

        handle.submit(None, "slow", Vec::new()).await.unwrap();
        ticker.abort();
        assert!(ticks.load(Ordering::Relaxed) > 0);
    }

    #[tokio::test]
    async fn service_stops_when_handles_drop() {
        let (handle, task) = start();
        drop(handle);
        task.await.unwrap();
    }
}
