//! Runner: pulls events off a transport and feeds them to the dispatcher.
//!
//! Each conversation gets its own worker task with an unbounded queue, so
//! events from one conversation are handled strictly in arrival order while
//! different conversations proceed concurrently. A worker with nothing
//! queued or running for longer than the idle timeout is stopped; the next
//! event for that conversation starts a fresh one.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::channels::{EventStream, InboundEvent};
use crate::dispatcher::Dispatcher;
use crate::session::ConversationId;

/// Default time a worker may sit with an empty queue before it is stopped.
pub const WORKER_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

struct Worker {
    tx: mpsc::UnboundedSender<InboundEvent>,
    handle: JoinHandle<()>,
    /// Events queued or being handled.
    pending: Arc<AtomicUsize>,
    last_submit: Instant,
}

impl Worker {
    fn is_idle(&self, now: Instant, idle_timeout: Duration) -> bool {
        self.pending.load(Ordering::Acquire) == 0
            && now.duration_since(self.last_submit) >= idle_timeout
    }
}

pub struct Runner {
    dispatcher: Arc<Dispatcher>,
    workers: HashMap<ConversationId, Worker>,
    idle_timeout: Duration,
}

impl Runner {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            workers: HashMap::new(),
            idle_timeout: WORKER_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Consume `events` until the stream ends or Ctrl+C, then let every
    /// worker finish what it has queued.
    pub async fn run(mut self, mut events: EventStream) {
        tracing::info!("Coach ready and listening");

        loop {
            let event = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                event = events.next() => {
                    match event {
                        Some(e) => e,
                        None => {
                            tracing::info!("Event stream ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            self.submit(event);
        }

        self.shutdown().await;
    }

    /// Queue `event` on its conversation's worker, starting one if needed.
    fn submit(&mut self, event: InboundEvent) {
        let id = event.conversation_id.clone();
        let now = Instant::now();
        self.evict_idle(now, &id);

        let event = match self.workers.get_mut(&id) {
            Some(worker) => {
                worker.pending.fetch_add(1, Ordering::AcqRel);
                match worker.tx.send(event) {
                    Ok(()) => {
                        worker.last_submit = now;
                        return;
                    }
                    // Worker exited (panicked handler); start a fresh one.
                    Err(mpsc::error::SendError(event)) => {
                        tracing::warn!(conversation_id = %id, "Conversation worker gone, restarting");
                        event
                    }
                }
            }
            None => event,
        };

        let worker = self.spawn_worker(&id);
        worker.pending.fetch_add(1, Ordering::AcqRel);
        if worker.tx.send(event).is_err() {
            tracing::error!(conversation_id = %id, "Failed to queue event on new worker");
        }
        self.workers.insert(id, worker);
    }

    /// Stop workers that have nothing queued or running and have not been
    /// fed for `idle_timeout`. Dropping the sender ends the worker loop.
    fn evict_idle(&mut self, now: Instant, keep: &ConversationId) {
        let idle_timeout = self.idle_timeout;
        let before = self.workers.len();
        self.workers
            .retain(|id, worker| id == keep || !worker.is_idle(now, idle_timeout));
        let evicted = before - self.workers.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.workers.len(), "Stopped idle conversation workers");
        }
    }

    fn spawn_worker(&self, id: &ConversationId) -> Worker {
        let (tx, mut rx) = mpsc::unbounded_channel::<InboundEvent>();
        let dispatcher = Arc::clone(&self.dispatcher);
        let pending = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::clone(&pending);
        tracing::debug!(conversation_id = %id, "Starting conversation worker");

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                dispatcher.handle(event).await;
                in_flight.fetch_sub(1, Ordering::AcqRel);
            }
        });

        Worker {
            tx,
            handle,
            pending,
            last_submit: Instant::now(),
        }
    }

    async fn shutdown(self) {
        let count = self.workers.len();
        for (id, worker) in self.workers {
            drop(worker.tx);
            if let Err(e) = worker.handle.await {
                tracing::warn!(conversation_id = %id, error = %e, "Conversation worker failed");
            }
        }
        tracing::debug!(workers = count, "All conversation workers stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::Coach;
    use crate::config::CoachConfig;
    use crate::session::{ConversationStore, Mode};
    use crate::testing::{FakeExtractor, RecordingTransport, ScriptedGateway};

    fn setup() -> (Arc<Dispatcher>, Arc<ScriptedGateway>, Arc<RecordingTransport>) {
        let gateway = Arc::new(ScriptedGateway::new());
        let transport = Arc::new(RecordingTransport::new());
        let coach = Arc::new(Coach::new(
            gateway.clone(),
            Arc::new(FakeExtractor::returning("Resume")),
            CoachConfig::default(),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            ConversationStore::new(),
            coach,
            transport.clone(),
        ));
        (dispatcher, gateway, transport)
    }

    fn events(items: &[(&str, &str)]) -> EventStream {
        let events: Vec<InboundEvent> = items
            .iter()
            .map(|(id, text)| InboundEvent::from_text(ConversationId::from(*id), text))
            .collect();
        Box::pin(futures::stream::iter(events))
    }

    #[tokio::test]
    async fn keeps_per_conversation_order() {
        let (dispatcher, gateway, transport) = setup();

        let stream = events(&[
            ("a", "/start"),
            ("b", "/start"),
            ("a", "Dana"),
            ("b", "Lee"),
            ("a", "Backend Engineer"),
            ("b", "Data Scientist"),
            ("a", "3"),
            ("a", "Go, distributed systems"),
            ("a", "Testing"),
            ("b", "5"),
        ]);

        Runner::new(dispatcher.clone()).run(stream).await;

        let store = dispatcher.store();
        let a = store.snapshot(&ConversationId::from("a")).await.unwrap();
        assert_eq!(a.name.as_deref(), Some("Dana"));
        assert_eq!(a.role.as_deref(), Some("Backend Engineer"));
        assert_eq!(
            a.strengths,
            Some(vec!["Go".to_string(), "distributed systems".to_string()])
        );
        assert_eq!(a.mode, Mode::Idle);

        let b = store.snapshot(&ConversationId::from("b")).await.unwrap();
        assert_eq!(b.name.as_deref(), Some("Lee"));
        assert_eq!(b.role.as_deref(), Some("Data Scientist"));
        assert_eq!(b.experience.as_deref(), Some("5"));
        assert_eq!(b.mode, Mode::AwaitingStrengths);

        assert_eq!(gateway.calls(), 1, "only conversation a finished profiling");
        let a_replies = transport
            .sent()
            .into_iter()
            .filter(|s| s.conversation_id.as_str() == "a")
            .count();
        assert_eq!(a_replies, 6);
    }

    /// Wait until every worker has drained its queue.
    async fn settle(runner: &Runner) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while runner
                .workers
                .values()
                .any(|w| w.pending.load(Ordering::Acquire) > 0)
            {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("workers did not settle");
    }

    #[tokio::test]
    async fn idle_workers_are_stopped_and_restarted_on_demand() {
        let (dispatcher, _, transport) = setup();
        let mut runner = Runner::new(dispatcher.clone()).with_idle_timeout(Duration::ZERO);

        runner.submit(InboundEvent::from_text(ConversationId::from("a"), "/start"));
        settle(&runner).await;
        assert_eq!(runner.workers.len(), 1);

        runner.submit(InboundEvent::from_text(ConversationId::from("b"), "/start"));
        assert_eq!(runner.workers.len(), 1, "idle worker for a was stopped");
        assert!(runner.workers.contains_key(&ConversationId::from("b")));
        settle(&runner).await;

        runner.submit(InboundEvent::from_text(ConversationId::from("a"), "Dana"));
        assert!(runner.workers.contains_key(&ConversationId::from("a")));
        runner.shutdown().await;

        let a = dispatcher
            .store()
            .snapshot(&ConversationId::from("a"))
            .await
            .unwrap();
        assert_eq!(a.name.as_deref(), Some("Dana"));
        assert_eq!(a.mode, Mode::AwaitingRole);
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn busy_workers_are_kept() {
        let (dispatcher, _, _) = setup();
        let mut runner = Runner::new(dispatcher.clone()).with_idle_timeout(Duration::ZERO);

        let id = ConversationId::from("a");
        let slot = dispatcher.store().get_or_create(&id).await;
        let guard = slot.lock().await;

        runner.submit(InboundEvent::from_text(id.clone(), "/start"));
        runner.submit(InboundEvent::from_text(ConversationId::from("b"), "/start"));
        assert!(
            runner.workers.contains_key(&id),
            "worker with a queued event must survive"
        );

        drop(guard);
        runner.shutdown().await;
        let a = dispatcher.store().snapshot(&id).await.unwrap();
        assert_eq!(a.mode, Mode::AwaitingName);
    }

    #[tokio::test]
    async fn empty_stream_returns() {
        let (dispatcher, gateway, _) = setup();
        Runner::new(dispatcher.clone()).run(events(&[])).await;
        assert!(dispatcher.store().is_empty().await);
        assert_eq!(gateway.calls(), 0);
    }
}
