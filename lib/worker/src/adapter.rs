//! Request/response correlation over one worker stream.
//!
//! Every outbound trigger gets a ticket: a fresh id paired with a one-shot
//! channel. The read loop routes each inbound response to the ticket with
//! the same id, so many callers can share one stream and be answered in any
//! order.

use crate::error::AdapterError;
use crate::stream::{MessageSink, MessageSource};
use async_trait::async_trait;
use membrane_core::{Result, TicketId};
use membrane_trigger::{ClientContent, ServerMessage, Trigger, TriggerResponse};
use rootcause::prelude::Report;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, warn};

/// Something that can deliver a trigger to a worker process and return its
/// response.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Sends a trigger and waits for the matching response.
    async fn handle_trigger(&self, trigger: Trigger) -> Result<TriggerResponse, AdapterError>;
}

/// Outstanding calls, plus whether the read loop has exited.
#[derive(Default)]
struct Tickets {
    waiting: HashMap<TicketId, oneshot::Sender<TriggerResponse>>,
    closed: bool,
}

/// Multiplexes trigger calls over a single worker stream.
pub struct CorrelationAdapter {
    sink: Arc<dyn MessageSink>,
    tickets: Mutex<Tickets>,
}

impl CorrelationAdapter {
    /// Creates an adapter writing to the given sink.
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self {
            sink,
            tickets: Mutex::new(Tickets::default()),
        }
    }

    fn tickets(&self) -> MutexGuard<'_, Tickets> {
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new outstanding call.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::StreamClosed`] once the read loop has exited.
    pub fn new_ticket(
        &self,
    ) -> Result<(TicketId, oneshot::Receiver<TriggerResponse>), AdapterError> {
        let mut tickets = self.tickets();
        if tickets.closed {
            return Err(AdapterError::StreamClosed.into());
        }
        let (tx, rx) = oneshot::channel();
        let mut id = TicketId::new();
        while tickets.waiting.contains_key(&id) {
            id = TicketId::new();
        }
        tickets.waiting.insert(id, tx);
        Ok((id, rx))
    }

    /// Removes an outstanding call and returns the sender that completes it.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::UnknownTicket`] if no call with this id is
    /// outstanding.
    pub fn resolve_ticket(
        &self,
        id: &TicketId,
    ) -> Result<oneshot::Sender<TriggerResponse>, AdapterError> {
        self.tickets()
            .waiting
            .remove(id)
            .ok_or_else(|| AdapterError::unknown_ticket(id).into())
    }

    /// Number of calls still waiting for a response.
    pub fn pending(&self) -> usize {
        self.tickets().waiting.len()
    }

    /// Sends a handshake acknowledgement, or a rejection when `error` is set.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::SendFailed`] if the stream cannot be written.
    pub async fn acknowledge(&self, id: &str, error: Option<String>) -> Result<(), AdapterError> {
        self.sink
            .send(ServerMessage::init_response(id, error))
            .await
            .map_err(|e| AdapterError::SendFailed {
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Runs the read loop until the stream fails, closes, or violates the
    /// protocol.
    ///
    /// The terminating fault is sent on `faults`. Outstanding calls are
    /// released with [`AdapterError::StreamClosed`] before returning, and
    /// later calls fail the same way.
    pub async fn start<S: MessageSource>(
        &self,
        mut source: S,
        faults: mpsc::UnboundedSender<Report<AdapterError>>,
    ) {
        let fault: Report<AdapterError> = loop {
            let message = match source.recv().await {
                Ok(Some(message)) => message,
                Ok(None) => break AdapterError::StreamClosed.into(),
                Err(e) => {
                    break AdapterError::Stream {
                        message: e.to_string(),
                    }
                    .into();
                }
            };

            match message.content {
                ClientContent::InitRequest(_) => {
                    if let Err(report) = self.acknowledge(&message.id, None).await {
                        break report;
                    }
                }
                ClientContent::TriggerResponse(response) => {
                    if let Err(report) = self.deliver(&message.id, response) {
                        break report;
                    }
                }
            }
        };

        let abandoned = self.abandon_all();
        warn!(abandoned, error = %fault, "worker stream terminated");
        if faults.send(fault).is_err() {
            debug!("no listener for worker stream fault");
        }
    }

    fn deliver(&self, id: &str, response: TriggerResponse) -> Result<(), AdapterError> {
        let ticket: TicketId = id.parse().map_err(|_| AdapterError::UnknownTicket {
            id: id.to_string(),
        })?;
        let sender = self.resolve_ticket(&ticket)?;
        if sender.send(response).is_err() {
            debug!(%ticket, "caller stopped waiting for response");
        }
        Ok(())
    }

    fn withdraw(&self, id: &TicketId) {
        self.tickets().waiting.remove(id);
    }

    fn abandon_all(&self) -> usize {
        let mut tickets = self.tickets();
        tickets.closed = true;
        let count = tickets.waiting.len();
        tickets.waiting.clear();
        count
    }
}

#[async_trait]
impl Adapter for CorrelationAdapter {
    #[instrument(skip_all, fields(kind = %trigger.kind()))]
    async fn handle_trigger(&self, trigger: Trigger) -> Result<TriggerResponse, AdapterError> {
        let (id, response) = self.new_ticket()?;

        if let Err(e) = self
            .sink
            .send(ServerMessage::trigger_request(id.to_string(), trigger))
            .await
        {
            self.withdraw(&id);
            return Err(AdapterError::SendFailed {
                message: e.to_string(),
            }
            .into());
        }
        debug!(ticket = %id, "trigger sent");

        let response = response.await.map_err(|_| AdapterError::StreamClosed)?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{self, WorkerEnd};
    use membrane_trigger::{ClientMessage, ServerContent, WorkerRegistration};
    use std::collections::HashSet;

    fn connected() -> (
        Arc<CorrelationAdapter>,
        channel::ChannelSource,
        WorkerEnd,
    ) {
        let (sink, source, worker) = channel::pair();
        (
            Arc::new(CorrelationAdapter::new(Arc::new(sink))),
            source,
            worker,
        )
    }

    fn spawn_read_loop(
        adapter: &Arc<CorrelationAdapter>,
        source: channel::ChannelSource,
    ) -> mpsc::UnboundedReceiver<Report<AdapterError>> {
        let (faults_tx, faults_rx) = mpsc::unbounded_channel();
        let adapter = Arc::clone(adapter);
        tokio::spawn(async move { adapter.start(source, faults_tx).await });
        faults_rx
    }

    async fn next_request(worker: &mut WorkerEnd) -> (String, Trigger) {
        match worker.recv().await.expect("request") {
            ServerMessage {
                id,
                content: ServerContent::TriggerRequest(trigger),
            } => (id, trigger),
            other => panic!("expected trigger request, got {other:?}"),
        }
    }

    #[test]
    fn resolve_returns_the_paired_sender_and_removes_it() {
        let (adapter, _source, _worker) = connected();
        let (id, mut rx) = adapter.new_ticket().expect("ticket");
        assert_eq!(adapter.pending(), 1);

        let tx = adapter.resolve_ticket(&id).expect("resolve");
        tx.send(TriggerResponse::Topic { success: true })
            .expect("deliver");
        assert_eq!(
            rx.try_recv().expect("paired receiver"),
            TriggerResponse::Topic { success: true }
        );
        assert_eq!(adapter.pending(), 0);

        let err = adapter.resolve_ticket(&id).unwrap_err();
        assert!(err.to_string().contains("no outstanding ticket"));
    }

    #[test]
    fn concurrent_tickets_are_unique() {
        let (adapter, _source, _worker) = connected();
        let ids: Vec<TicketId> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        (0..50)
                            .map(|_| adapter.new_ticket().expect("ticket").0)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().expect("thread"))
                .collect()
        });

        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 400);
        assert_eq!(adapter.pending(), 400);
    }

    #[tokio::test]
    async fn out_of_order_responses_reach_their_callers() {
        let (adapter, source, mut worker) = connected();
        let _faults = spawn_read_loop(&adapter, source);

        let first = tokio::spawn({
            let adapter = Arc::clone(&adapter);
            async move { adapter.handle_trigger(Trigger::topic("first", Vec::new())).await }
        });
        let (first_id, _) = next_request(&mut worker).await;
        let second = tokio::spawn({
            let adapter = Arc::clone(&adapter);
            async move { adapter.handle_trigger(Trigger::http("GET", "/second")).await }
        });
        let (second_id, _) = next_request(&mut worker).await;

        worker
            .send(ClientMessage::response(
                second_id,
                TriggerResponse::outcome(membrane_trigger::TriggerKind::Http, true),
            ))
            .expect("answer second");
        worker
            .send(ClientMessage::response(
                first_id,
                TriggerResponse::Topic { success: false },
            ))
            .expect("answer first");

        let second = second.await.expect("join").expect("second response");
        let first = first.await.expect("join").expect("first response");
        assert_eq!(second.kind(), membrane_trigger::TriggerKind::Http);
        assert_eq!(first, TriggerResponse::Topic { success: false });
        assert_eq!(adapter.pending(), 0);
    }

    #[tokio::test]
    async fn init_requests_are_acknowledged() {
        let (adapter, source, mut worker) = connected();
        let _faults = spawn_read_loop(&adapter, source);

        worker
            .send(ClientMessage::init(WorkerRegistration::CatchAll))
            .expect("send init");
        assert_eq!(
            worker.recv().await,
            Some(ServerMessage::init_response("", None))
        );
    }

    #[tokio::test]
    async fn stream_close_releases_outstanding_callers() {
        let (adapter, source, mut worker) = connected();
        let mut faults = spawn_read_loop(&adapter, source);

        let call = tokio::spawn({
            let adapter = Arc::clone(&adapter);
            async move { adapter.handle_trigger(Trigger::topic("orders", Vec::new())).await }
        });
        next_request(&mut worker).await;
        drop(worker);

        let err = call.await.expect("join").unwrap_err();
        assert!(err.to_string().contains("worker stream closed"));
        let fault = faults.recv().await.expect("fault");
        assert!(fault.to_string().contains("worker stream closed"));
        assert_eq!(adapter.pending(), 0);
    }

    #[tokio::test]
    async fn unknown_ticket_is_fatal() {
        let (adapter, source, worker) = connected();
        let mut faults = spawn_read_loop(&adapter, source);
        let (_id, _rx) = adapter.new_ticket().expect("ticket");

        worker
            .send(ClientMessage::response(
                TicketId::new().to_string(),
                TriggerResponse::Topic { success: true },
            ))
            .expect("send stray response");

        let fault = faults.recv().await.expect("fault");
        assert!(fault.to_string().contains("no outstanding ticket"));
        assert_eq!(adapter.pending(), 0);
    }

    #[tokio::test]
    async fn calls_after_the_read_loop_exits_are_refused() {
        let (adapter, source, mut worker) = connected();
        let mut faults = spawn_read_loop(&adapter, source);

        worker
            .send(ClientMessage::response(
                TicketId::new().to_string(),
                TriggerResponse::Topic { success: true },
            ))
            .expect("send stray response");
        faults.recv().await.expect("fault");

        // The worker end is still writable, so only the closed state stops the call.
        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            adapter.handle_trigger(Trigger::topic("orders", Vec::new())),
        )
        .await
        .expect("call returns instead of waiting");
        let err = outcome.unwrap_err();
        assert!(err.to_string().contains("worker stream closed"));
        assert_eq!(adapter.pending(), 0);
        assert!(adapter.new_ticket().is_err());
    }

    #[tokio::test]
    async fn send_failure_withdraws_the_ticket() {
        let (adapter, source, worker) = connected();
        drop(source);
        drop(worker);

        let err = adapter
            .handle_trigger(Trigger::http("GET", "/"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to send to worker"));
        assert_eq!(adapter.pending(), 0);
    }
}
