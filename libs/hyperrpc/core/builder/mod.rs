pub mod states;

use crate::client::RpcClient;
use crate::config::{ClientConfig, ProbeConfig, StreamMode};
use crate::traits::*;
use states::*;
use std::sync::Arc;
use std::time::Duration;

/// Type-state builder for RpcClient
///
/// The URL must be set before the client can be built; everything else
/// has a default. Notification streams are declared here with their
/// delivery mode and subscribed to later on the client.
pub struct RpcClientBuilder<U>
where
    U: UrlState,
{
    _state: TypeState<U>,
    url: Option<String>,
    config: ClientConfig,
    connector: Option<Arc<dyn Connector>>,
    headers: Vec<(String, String)>,
    clock: Option<Arc<dyn Clock>>,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
}

impl RpcClientBuilder<NoUrl> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            url: None,
            config: ClientConfig::new(String::new()),
            connector: None,
            headers: Vec::new(),
            clock: None,
            reconnect_strategy: None,
        }
    }

    pub fn url(self, url: impl Into<String>) -> RpcClientBuilder<HasUrl> {
        RpcClientBuilder {
            _state: TypeState::new(),
            url: Some(url.into()),
            config: self.config,
            connector: self.connector,
            headers: self.headers,
            clock: self.clock,
            reconnect_strategy: self.reconnect_strategy,
        }
    }
}

impl Default for RpcClientBuilder<NoUrl> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> RpcClientBuilder<U>
where
    U: UrlState,
{
    /// Replace the WebSocket connector (tests use an in-memory one)
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Extra handshake header for the default connector
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Set the reconnection strategy
    ///
    /// Defaults to a fixed 3 second delay with unlimited attempts.
    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn drain_delay(mut self, delay: Duration) -> Self {
        self.config.drain_delay = delay;
        self
    }

    pub fn probe(mut self, probe: ProbeConfig) -> Self {
        self.config.probe = probe;
        self
    }

    /// Declare a stream released in serial order
    pub fn buffered_stream(mut self, event_name: impl Into<String>) -> Self {
        self.config.streams.insert(event_name.into(), StreamMode::Buffered);
        self
    }

    /// Declare a stream delivered as it arrives
    pub fn immediate_stream(mut self, event_name: impl Into<String>) -> Self {
        self.config.streams.insert(event_name.into(), StreamMode::Immediate);
        self
    }

    pub fn serial_field(mut self, field: impl Into<String>) -> Self {
        self.config.serial_field = field.into();
        self
    }

    /// Replace the markers that keep payloads out of the debug log
    pub fn log_suppress(mut self, markers: Vec<String>) -> Self {
        self.config.log_suppress = markers;
        self
    }

    pub fn ping_method(mut self, method: impl Into<String>) -> Self {
        self.config.ping_method = method.into();
        self
    }

    /// Connect as part of `build()` (default `true`)
    pub fn auto_connect(mut self, enabled: bool) -> Self {
        self.config.auto_connect = enabled;
        self
    }
}

impl RpcClientBuilder<HasUrl> {
    /// Build the client and spawn its driver
    ///
    /// Must be called inside a tokio runtime.
    pub async fn build(self) -> Result<RpcClient> {
        let url = self.url.unwrap_or_default();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(HyperRpcError::Configuration(format!(
                "URL must start with ws:// or wss://, got '{}'",
                url
            )));
        }
        if self.config.request_timeout.is_zero() {
            return Err(HyperRpcError::Configuration(
                "request timeout must be greater than zero".into(),
            ));
        }
        if self.config.probe.timeout.is_zero() {
            return Err(HyperRpcError::Configuration(
                "probe timeout must be greater than zero".into(),
            ));
        }

        let mut config = self.config;
        config.url = url;

        let connector = match self.connector {
            Some(connector) => connector,
            None => {
                let connector = self
                    .headers
                    .into_iter()
                    .fold(TungsteniteConnector::new(), |c, (k, v)| c.with_header(k, v));
                Arc::new(connector) as Arc<dyn Connector>
            }
        };
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| Box::new(FixedDelay::default()));

        Ok(RpcClient::start(config, connector, strategy, clock))
    }
}
