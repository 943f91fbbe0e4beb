use crate::config::{ClientConfig, StreamMode};
use crate::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::core::timer::{FireFn, Scheduler, TimerId};
use crate::core::transport::{PostFn, SocketTransport, TransportEvent, TransportInput};
use crate::rpc::*;
use crate::traits::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Subscriber of one notification stream
pub type StreamHandler = Box<dyn FnMut(Value) + Send>;

/// Subscriber of latency samples
pub type JitterHandler = Box<dyn FnMut(Jitter) + Send>;

/// Connection lifecycle feed for hosts that poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Connected to the server
    Connected,
    /// Disconnected from the server
    Disconnected,
    /// Reconnect scheduled (attempt number)
    Reconnecting(usize),
    /// Error occurred
    Error(String),
}

/// Client metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_count: u64,
    pub connection_state: ConnectionState,
}

/// Snapshot of the driver's bookkeeping
#[derive(Debug, Clone)]
pub struct RpcStats {
    pub connection_state: ConnectionState,
    pub pending_requests: usize,
    pub live_timers: usize,
    pub buffered_events: usize,
    pub probe_state: ProbeState,
    pub clock_offset_ms: i64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_count: u64,
}

/// Requests from client handles to the driver
enum Command {
    Connect,
    Disconnect { manual: bool },
    Send {
        id: u64,
        method: String,
        payload: String,
        handler: Option<ReplyHandler>,
    },
    DeepPing,
    ResetContext,
    StopProbe,
    SetStreamHandler {
        event_name: String,
        handler: Option<StreamHandler>,
    },
    SetJitterHandler(Option<JitterHandler>),
    Stats(oneshot::Sender<RpcStats>),
    Shutdown(oneshot::Sender<()>),
}

/// Everything the driver reacts to, in arrival order
enum Input {
    Command(Command),
    Transport(TransportInput),
    Timer(TimerId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TimerKey {
    RequestTimeout(u64),
    Drain(String),
    ProbeTick,
    ProbeTimeout,
    Reconnect,
}

/// JSON-RPC client over one persistent WebSocket
///
/// Cheap to clone; every clone talks to the same driver task. The driver
/// owns the socket, the pending-request table, the notification buffers,
/// the latency probe and every timer, and processes one input at a time.
/// Callbacks run on the driver task, never concurrently with each other.
///
/// The driver stops on [`RpcClient::shutdown`] or once the last handle
/// is dropped.
#[derive(Clone)]
pub struct RpcClient {
    config: Arc<ClientConfig>,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    ids: RequestIds,
    offset: ClockOffset,
    listeners: Arc<Mutex<TransportListeners>>,
    inbox: mpsc::UnboundedSender<Input>,
    event_rx: Receiver<ClientEvent>,
}

impl RpcClient {
    /// Spawn the driver
    ///
    /// Called by the builder's `build()` method.
    pub(crate) fn start(
        config: ClientConfig,
        connector: Arc<dyn Connector>,
        strategy: Box<dyn ReconnectionStrategy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = Arc::new(config);
        let state = Arc::new(AtomicConnectionState::new(ConnectionState::Disconnected));
        let metrics = Arc::new(AtomicMetrics::new());
        let ids = RequestIds::new();
        let offset = ClockOffset::new();
        let listeners = Arc::new(Mutex::new(TransportListeners::default()));

        let (inbox, inbox_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = unbounded();

        // Tasks only hold weak senders so dropping the last handle stops the driver
        let weak = inbox.downgrade();
        let fire: FireFn = Arc::new(move |id| {
            if let Some(tx) = weak.upgrade() {
                let _ = tx.send(Input::Timer(id));
            }
        });
        let weak = inbox.downgrade();
        let post: PostFn = Arc::new(move |input| {
            if let Some(tx) = weak.upgrade() {
                let _ = tx.send(Input::Transport(input));
            }
        });

        let transport = SocketTransport::new(
            config.url.clone(),
            connector,
            strategy,
            Arc::clone(&state),
            Arc::clone(&metrics),
            post,
        );

        let streams = config
            .streams
            .iter()
            .map(|(name, mode)| (name.clone(), StreamSlot::new(*mode)))
            .collect();

        let driver = Driver {
            config: Arc::clone(&config),
            transport,
            timers: Scheduler::new(fire),
            correlator: Correlator::new(),
            streams,
            probe: LatencyProbe::new(config.probe.clone()),
            on_jitter: None,
            listeners: Arc::clone(&listeners),
            events: event_tx,
            ids: ids.clone(),
            offset: offset.clone(),
            clock,
            metrics: Arc::clone(&metrics),
            reconnect: None,
        };
        tokio::spawn(driver.run(inbox_rx));

        let client = Self {
            config,
            state,
            metrics,
            ids,
            offset,
            listeners,
            inbox,
            event_rx,
        };

        if client.config.auto_connect {
            client.connect();
        }
        client
    }

    fn post(&self, command: Command) -> bool {
        self.inbox.send(Input::Command(command)).is_ok()
    }

    /// Send a request and get the typed reply through `callback`
    ///
    /// Returns the id allocated to the request. `callback` runs exactly
    /// once:
    /// - synchronously, before `send` returns, with a 503 when the
    ///   transport is not open;
    /// - with the decoded reply, its `method` set to `method`;
    /// - with a 408 when no reply arrives within the request timeout;
    /// - with a 503 (id -1) when the write fails, the reply does not fit
    ///   `T`, or the connection drops first.
    ///
    /// A context reset abandons the callback without calling it.
    pub fn send<T, F>(&self, method: &str, params: Vec<Value>, callback: F) -> u64
    where
        T: DeserializeOwned + 'static,
        F: FnOnce(RpcResponse<T>) + Send + 'static,
    {
        let origin = method.to_string();
        let handler = ReplyHandler::User(Box::new(move |delivery| {
            let response = match delivery {
                Delivery::Reply(raw) => RpcResponse::<T>::decode(&raw, &origin),
                Delivery::Failure(error) => RpcResponse::failure(origin, error),
            };
            callback(response);
        }));
        self.dispatch(method, params, Some(handler))
    }

    /// Fire-and-forget request: no pending entry, no timeout
    pub fn send_detached(&self, method: &str, params: Vec<Value>) -> u64 {
        self.dispatch(method, params, None)
    }

    /// Future form of [`RpcClient::send`]
    pub async fn call<T>(&self, method: &str, params: Vec<Value>) -> RpcResponse<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.send::<T, _>(method, params, move |response| {
            let _ = tx.send(response);
        });
        rx.await
            .unwrap_or_else(|_| RpcResponse::failure(method, RpcError::abandoned()))
    }

    fn dispatch(&self, method: &str, params: Vec<Value>, handler: Option<ReplyHandler>) -> u64 {
        let id = self.ids.next();

        let payload = match RpcRequest::new(id, method, &params).to_text() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize request {} ({}): {}", id, method, e);
                fail_locally(handler, RpcError::send_failed(e));
                return id;
            }
        };
        log_outbound(&self.config, &payload);

        if !self.state.is_connected() {
            debug!("Request {} ({}) rejected, not connected", id, method);
            fail_locally(handler, RpcError::service_unavailable());
            return id;
        }

        let command = Command::Send {
            id,
            method: method.to_string(),
            payload,
            handler,
        };
        if let Err(mpsc::error::SendError(Input::Command(Command::Send { handler, .. }))) =
            self.inbox.send(Input::Command(command))
        {
            fail_locally(handler, RpcError::service_unavailable());
        }
        id
    }

    /// Get current connection state
    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Check if connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Open the connection; cancels any pending automatic reconnect
    pub fn connect(&self) {
        if !self.post(Command::Connect) {
            warn!("connect() called after the client shut down");
        }
    }

    /// Close the connection
    ///
    /// A manual disconnect also cancels and suppresses automatic
    /// reconnection until the next [`RpcClient::connect`].
    pub fn disconnect(&self, manual: bool) {
        self.post(Command::Disconnect { manual });
    }

    pub fn add_on_open(&self, listener: Arc<OpenListener>) -> ListenerId {
        self.listeners.lock().open.add(listener)
    }

    pub fn remove_on_open(&self, id: ListenerId) -> bool {
        self.listeners.lock().open.remove(id)
    }

    pub fn add_on_error(&self, listener: Arc<ErrorListener>) -> ListenerId {
        self.listeners.lock().error.add(listener)
    }

    pub fn remove_on_error(&self, id: ListenerId) -> bool {
        self.listeners.lock().error.remove(id)
    }

    pub fn add_on_close(&self, listener: Arc<CloseListener>) -> ListenerId {
        self.listeners.lock().close.add(listener)
    }

    pub fn remove_on_close(&self, id: ListenerId) -> bool {
        self.listeners.lock().close.remove(id)
    }

    /// Subscribe to notification stream `event_name`
    ///
    /// Replacing a subscriber discards the events held for it. Names not
    /// configured on the builder are delivered immediately.
    pub fn set_stream_handler<F>(&self, event_name: &str, handler: F)
    where
        F: FnMut(Value) + Send + 'static,
    {
        self.post(Command::SetStreamHandler {
            event_name: event_name.to_string(),
            handler: Some(Box::new(handler)),
        });
    }

    pub fn clear_stream_handler(&self, event_name: &str) {
        self.post(Command::SetStreamHandler {
            event_name: event_name.to_string(),
            handler: None,
        });
    }

    /// Subscribe to latency samples
    pub fn set_on_jitter<F>(&self, handler: F)
    where
        F: FnMut(Jitter) + Send + 'static,
    {
        self.post(Command::SetJitterHandler(Some(Box::new(handler))));
    }

    pub fn clear_on_jitter(&self) {
        self.post(Command::SetJitterHandler(None));
    }

    /// Drop all per-context state
    ///
    /// Pending requests are abandoned without their callbacks running,
    /// held notifications are discarded and the probe restarts at the fast
    /// interval if connected.
    pub fn reset_context(&self) {
        self.post(Command::ResetContext);
    }

    /// Cancel the probe timers without emitting a sample
    ///
    /// Probing resumes on the next open or context reset.
    pub fn stop_probe(&self) {
        self.post(Command::StopProbe);
    }

    /// Issue a deep ping that only refreshes the clock offset
    pub fn deep_ping(&self) {
        self.post(Command::DeepPing);
    }

    /// Server clock minus local clock, in milliseconds
    #[inline]
    pub fn clock_offset_ms(&self) -> i64 {
        self.offset.get()
    }

    pub fn clock_offset(&self) -> ClockOffset {
        self.offset.clone()
    }

    /// Id the next request will get
    pub fn next_request_id(&self) -> u64 {
        self.ids.peek()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get current metrics
    pub fn metrics(&self) -> Metrics {
        Metrics {
            messages_sent: self.metrics.messages_sent(),
            messages_received: self.metrics.messages_received(),
            reconnect_count: self.metrics.reconnect_count(),
            connection_state: self.state.get(),
        }
    }

    /// Ask the driver for a bookkeeping snapshot
    pub async fn stats(&self) -> Result<RpcStats> {
        let (tx, rx) = oneshot::channel();
        if !self.post(Command::Stats(tx)) {
            return Err(HyperRpcError::ChannelSend("client driver stopped".into()));
        }
        rx.await
            .map_err(|_| HyperRpcError::ChannelSend("client driver stopped".into()))
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event (blocking)
    pub fn recv_event(&self) -> std::result::Result<ClientEvent, crossbeam_channel::RecvError> {
        self.event_rx.recv()
    }

    /// Close the connection, fail pending requests and stop the driver
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down RPC client");
        let (tx, rx) = oneshot::channel();
        if !self.post(Command::Shutdown(tx)) {
            return Ok(());
        }
        let _ = rx.await;
        info!("RPC client shut down");
        Ok(())
    }
}

fn fail_locally(handler: Option<ReplyHandler>, error: RpcError) {
    if let Some(ReplyHandler::User(callback)) = handler {
        callback(Delivery::Failure(error));
    }
}

fn log_outbound(config: &ClientConfig, payload: &str) {
    if !is_suppressed(payload, &config.log_suppress) {
        debug!("[RPC] -> {}", payload);
    }
}

struct StreamSlot {
    mode: StreamMode,
    handler: Option<StreamHandler>,
    buffer: ReorderBuffer<BufferedEvent>,
    drain: Option<TimerId>,
}

impl StreamSlot {
    fn new(mode: StreamMode) -> Self {
        Self {
            mode,
            handler: None,
            buffer: ReorderBuffer::new(),
            drain: None,
        }
    }
}

/// Single owner of all mutable client state
struct Driver {
    config: Arc<ClientConfig>,
    transport: SocketTransport,
    timers: Scheduler<TimerKey>,
    correlator: Correlator,
    streams: HashMap<String, StreamSlot>,
    probe: LatencyProbe,
    on_jitter: Option<JitterHandler>,
    listeners: Arc<Mutex<TransportListeners>>,
    events: Sender<ClientEvent>,
    ids: RequestIds,
    offset: ClockOffset,
    clock: Arc<dyn Clock>,
    metrics: Arc<AtomicMetrics>,
    reconnect: Option<TimerId>,
}

impl Driver {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Input>) {
        let mut done = None;
        while let Some(input) = inbox.recv().await {
            match input {
                Input::Command(Command::Shutdown(reply)) => {
                    done = Some(reply);
                    break;
                }
                Input::Command(command) => self.handle_command(command).await,
                Input::Transport(input) => {
                    if let Some(event) = self.transport.handle(input) {
                        self.on_transport_event(event).await;
                    }
                }
                Input::Timer(id) => self.on_timer(id).await,
            }
        }

        self.close(true).await;
        self.timers.clear();
        info!("RPC client driver exiting");
        if let Some(reply) = done {
            let _ = reply.send(());
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect => {
                self.cancel_reconnect();
                self.transport.connect();
            }
            Command::Disconnect { manual } => self.close(manual).await,
            Command::Send {
                id,
                method,
                payload,
                handler,
            } => self.send_request(id, method, payload, handler).await,
            Command::DeepPing => {
                if self.transport.is_connected() {
                    let id = self.ids.next();
                    self.send_ping(id, PingKind::OneOff).await;
                } else {
                    debug!("Deep ping skipped, not connected");
                }
            }
            Command::ResetContext => self.reset_context(),
            Command::StopProbe => self.stop_probe(),
            Command::SetStreamHandler {
                event_name,
                handler,
            } => {
                let slot = self
                    .streams
                    .entry(event_name)
                    .or_insert_with(|| StreamSlot::new(StreamMode::Immediate));
                slot.handler = handler;
                slot.buffer.reset();
                if let Some(drain) = slot.drain.take() {
                    self.timers.cancel(drain);
                }
            }
            Command::SetJitterHandler(handler) => self.on_jitter = handler,
            Command::Stats(reply) => {
                let _ = reply.send(self.stats());
            }
            // Handled by the run loop
            Command::Shutdown(_) => {}
        }
    }

    fn stats(&self) -> RpcStats {
        RpcStats {
            connection_state: self.transport.state(),
            pending_requests: self.correlator.len(),
            live_timers: self.timers.len(),
            buffered_events: self.streams.values().map(|s| s.buffer.len()).sum(),
            probe_state: self.probe.state(),
            clock_offset_ms: self.offset.get(),
            messages_sent: self.metrics.messages_sent(),
            messages_received: self.metrics.messages_received(),
            reconnect_count: self.metrics.reconnect_count(),
        }
    }

    // =========================================================================
    // Requests
    // =========================================================================

    async fn send_request(
        &mut self,
        id: u64,
        method: String,
        payload: String,
        handler: Option<ReplyHandler>,
    ) {
        if !self.transport.is_connected() {
            debug!("Request {} ({}) arrived after the connection closed", id, method);
            if let Some(handler) = handler {
                self.deliver(id, handler, Delivery::Failure(RpcError::service_unavailable()));
            }
            return;
        }

        // Pending entry and timeout exist before the frame leaves
        if let Some(handler) = handler {
            let timeout = self
                .timers
                .once(self.config.request_timeout, TimerKey::RequestTimeout(id));
            self.correlator.register(PendingRequest {
                id,
                method: method.clone(),
                handler,
                created_at: Instant::now(),
                timeout,
            });
        }

        if let Err(e) = self.transport.send_text(payload).await {
            warn!("Failed to send request {} ({}): {}", id, method, e);
            if let Some(pending) = self.correlator.take(id) {
                self.timers.cancel(pending.timeout);
                self.deliver(id, pending.handler, Delivery::Failure(RpcError::send_failed(e)));
            }
        }
    }

    fn deliver(&mut self, id: u64, handler: ReplyHandler, delivery: Delivery) {
        match handler {
            ReplyHandler::User(callback) => callback(delivery),
            ReplyHandler::Ping(kind) => self.on_ping_reply(id, kind, delivery),
        }
    }

    fn on_message(&mut self, message: WsMessage) {
        let text = match message.into_text() {
            Some(text) => text,
            None => {
                debug!("[RPC] Dropping non UTF-8 frame");
                return;
            }
        };
        if !is_suppressed(&text, &self.config.log_suppress) {
            debug!("[RPC] <- {}", text);
        }

        match Incoming::classify(&text) {
            Ok(Incoming::Response { id }) => self.on_response(id, text),
            Ok(Incoming::Notification { event_name, event }) => {
                self.on_notification(event_name, event)
            }
            Ok(Incoming::Malformed(reason)) => {
                debug!("[RPC] Dropping malformed notification: {}", reason)
            }
            Err(e) => warn!("[RPC] Dropping unparseable frame: {}", e),
        }
    }

    fn on_response(&mut self, id: i64, raw: String) {
        let pending = u64::try_from(id).ok().and_then(|id| self.correlator.take(id));
        let Some(pending) = pending else {
            debug!("[RPC] No pending request for id {}, dropping reply", id);
            return;
        };
        self.timers.cancel(pending.timeout);
        debug!(
            "[RPC] {} ({}) answered in {:?}",
            pending.id,
            pending.method,
            pending.created_at.elapsed()
        );
        self.deliver(pending.id, pending.handler, Delivery::Reply(raw));
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    fn on_notification(&mut self, event_name: String, event: Value) {
        let Some(slot) = self.streams.get_mut(&event_name) else {
            debug!("[RPC] No stream registered for {}, dropping", event_name);
            return;
        };
        match slot.mode {
            StreamMode::Immediate => match slot.handler.as_mut() {
                Some(handler) => handler(event),
                None => debug!("[RPC] No subscriber for {}, dropping", event_name),
            },
            // Held even without a subscriber; the drain skips the call
            StreamMode::Buffered => {
                let Some(buffered) = BufferedEvent::from_payload(event, &self.config.serial_field)
                else {
                    debug!("[RPC] {} without {}, dropping", event_name, self.config.serial_field);
                    return;
                };
                if slot.buffer.push(buffered) {
                    let drain = self
                        .timers
                        .every(self.config.drain_delay, TimerKey::Drain(event_name));
                    slot.drain = Some(drain);
                }
            }
        }
    }

    /// One drain tick: release a single held event
    fn on_drain(&mut self, event_name: String) {
        let Some(slot) = self.streams.get_mut(&event_name) else {
            return;
        };

        if let Some(event) = slot.buffer.pop_next() {
            if let Some(handler) = slot.handler.as_mut() {
                handler(event.payload);
            }
        }

        if !slot.buffer.is_draining() {
            if let Some(drain) = slot.drain.take() {
                self.timers.cancel(drain);
            }
        }
    }

    fn reset_streams(&mut self) {
        for slot in self.streams.values_mut() {
            let dropped = slot.buffer.reset();
            if dropped > 0 {
                debug!("[RPC] Discarded {} held notifications", dropped);
            }
            if let Some(drain) = slot.drain.take() {
                self.timers.cancel(drain);
            }
        }
    }

    // =========================================================================
    // Latency probe
    // =========================================================================

    fn start_probe(&mut self, delay: Duration) {
        self.stop_probe();
        let tick = self.timers.once(delay, TimerKey::ProbeTick);
        self.probe.scheduled(tick);
    }

    fn stop_probe(&mut self) {
        for timer in self.probe.cancel() {
            self.timers.cancel(timer);
        }
    }

    async fn on_probe_tick(&mut self, timer: TimerId) {
        if !self.probe.is_tick(timer) {
            return;
        }
        if !self.transport.is_connected() {
            self.stop_probe();
            return;
        }

        let id = self.ids.next();
        let timeout = self
            .timers
            .once(self.probe.config().timeout, TimerKey::ProbeTimeout);
        self.probe.started(id, timeout);
        self.send_ping(id, PingKind::Cycle).await;
    }

    async fn send_ping(&mut self, id: u64, kind: PingKind) {
        let params = vec![Value::String(self.clock.now_millis().to_string())];
        let method = self.config.ping_method.clone();
        let payload = match RpcRequest::new(id, &method, &params).to_text() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize deep ping: {}", e);
                return;
            }
        };
        log_outbound(&self.config, &payload);
        self.send_request(id, method, payload, Some(ReplyHandler::Ping(kind)))
            .await;
    }

    async fn on_probe_timeout(&mut self, timer: TimerId) {
        if !self.probe.is_timeout(timer) {
            return;
        }
        let jitter = self.probe.timed_out();
        warn!("Deep ping timed out, forcing reconnect");
        self.emit_jitter(jitter);
        self.close(false).await;
    }

    fn on_ping_reply(&mut self, id: u64, kind: PingKind, delivery: Delivery) {
        let now = self.clock.now_millis();
        let outcome = match delivery {
            Delivery::Reply(raw) => {
                match RpcResponse::<DeepPingResult>::decode(&raw, &self.config.ping_method)
                    .into_result()
                {
                    Ok(Some(ping)) => measure(self.probe.config(), &ping, now).ok_or_else(|| {
                        format!(
                            "deep ping timestamps out of range ({}, {})",
                            ping.client_timestamp, ping.server_timestamp
                        )
                    }),
                    Ok(None) => Err("empty deep ping result".to_string()),
                    Err(error) => Err(error.to_string()),
                }
            }
            Delivery::Failure(error) => Err(error.to_string()),
        };

        match kind {
            PingKind::OneOff => match outcome {
                Ok(m) => {
                    self.offset.set(m.offset_ms);
                    debug!("Clock offset refreshed: {}ms", m.offset_ms);
                }
                Err(reason) => debug!("One-off deep ping failed: {}", reason),
            },
            PingKind::Cycle => {
                let Some(timeout) = self.probe.answered(id) else {
                    debug!("Ignoring deep ping reply {} for a finished probe", id);
                    return;
                };
                self.timers.cancel(timeout);

                match outcome {
                    Ok(m) => {
                        self.offset.set(m.offset_ms);
                        self.emit_jitter(m.jitter);
                        self.start_probe(m.next_interval);
                    }
                    Err(reason) => {
                        warn!("Deep ping failed: {}", reason);
                        if self.transport.is_connected() {
                            let fast = self.probe.config().fast_interval;
                            self.start_probe(fast);
                        } else {
                            self.stop_probe();
                        }
                    }
                }
            }
        }
    }

    fn emit_jitter(&mut self, jitter: Jitter) {
        debug!("Jitter {}ms ({:?})", jitter.delay_ms, jitter.rate);
        if let Some(handler) = self.on_jitter.as_mut() {
            handler(jitter);
        }
    }

    // =========================================================================
    // Connection lifecycle
    // =========================================================================

    async fn on_timer(&mut self, id: TimerId) {
        let Some(key) = self.timers.fire(id) else {
            return;
        };
        match key {
            TimerKey::RequestTimeout(request) => {
                if let Some(pending) = self.correlator.take(request) {
                    warn!("[RPC] {} ({}) timed out", request, pending.method);
                    self.deliver(
                        request,
                        pending.handler,
                        Delivery::Failure(RpcError::request_timeout()),
                    );
                }
            }
            TimerKey::Drain(event_name) => self.on_drain(event_name),
            TimerKey::ProbeTick => self.on_probe_tick(id).await,
            TimerKey::ProbeTimeout => self.on_probe_timeout(id).await,
            TimerKey::Reconnect => {
                self.reconnect = None;
                self.transport.connect();
            }
        }
    }

    async fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => {
                self.cancel_reconnect();
                let _ = self.events.send(ClientEvent::Connected);
                let fast = self.probe.config().fast_interval;
                self.start_probe(fast);
                let listeners = self.listeners.lock().open.snapshot();
                for listener in listeners {
                    listener();
                }
            }
            TransportEvent::Message(message) => self.on_message(message),
            TransportEvent::Error(reason) => {
                self.connection_lost();
                let _ = self.events.send(ClientEvent::Error(reason.clone()));
                let listeners = self.listeners.lock().error.snapshot();
                for listener in listeners {
                    listener(&reason);
                }
                self.schedule_reconnect();
            }
            TransportEvent::Close(code) => {
                self.connection_lost();
                let _ = self.events.send(ClientEvent::Disconnected);
                let listeners = self.listeners.lock().close.snapshot();
                for listener in listeners {
                    listener(code);
                }
                self.schedule_reconnect();
            }
        }
    }

    /// Stop everything tied to the lost connection and fail what is pending
    fn connection_lost(&mut self) {
        self.stop_probe();
        self.reset_streams();

        self.cancel_request_timeouts();
        let failed = self.correlator.drain();
        if !failed.is_empty() {
            warn!("[RPC] Failing {} pending requests", failed.len());
        }
        for pending in failed {
            self.deliver(
                pending.id,
                pending.handler,
                Delivery::Failure(RpcError::service_unavailable()),
            );
        }
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect.is_some() || self.transport.state() != ConnectionState::Disconnected {
            return;
        }
        match self.transport.reconnect_delay() {
            Some(delay) => {
                let attempt = self.transport.reconnect_attempt();
                info!("Reconnecting in {:?} (attempt {})", delay, attempt);
                self.reconnect = Some(self.timers.once(delay, TimerKey::Reconnect));
                let _ = self.events.send(ClientEvent::Reconnecting(attempt));
            }
            None if self.transport.is_manual() => debug!("Manual disconnect, not reconnecting"),
            None => warn!("Reconnection strategy exhausted, stopping"),
        }
    }

    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect.take() {
            self.timers.cancel(timer);
        }
    }

    async fn close(&mut self, manual: bool) {
        if manual {
            self.cancel_reconnect();
        }
        if let Some(event) = self.transport.disconnect(manual).await {
            self.on_transport_event(event).await;
        }
    }

    fn cancel_request_timeouts(&mut self) {
        self.timers
            .cancel_where(|key| matches!(key, TimerKey::RequestTimeout(_)));
    }

    fn reset_context(&mut self) {
        self.cancel_request_timeouts();
        let abandoned = self.correlator.drain();
        if !abandoned.is_empty() {
            info!("[RPC] Abandoned {} pending requests", abandoned.len());
        }
        drop(abandoned);

        self.reset_streams();
        self.stop_probe();
        if self.transport.is_connected() {
            let fast = self.probe.config().fast_interval;
            self.start_probe(fast);
        }
    }
}
