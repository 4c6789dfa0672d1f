use std::{
    fmt::Debug,
    sync::{Arc, Weak},
    time::Duration,
};

use futures_util::{
    future::{self, BoxFuture},
    FutureExt,
};
use tokio::{sync::mpsc, time::Instant};
use url::Url;

use super::{
    backoff::Backoff, close_code, config::ListenerConfig, dispatcher::Dispatcher,
    watchdog::Watchdog,
};
use crate::ws::{
    event::decode_frame,
    subscription::{StreamSubscription, StreamingEndpoint},
    transport::{
        redacted, transport_error, ConnectError, Connector, Frame, Socket, TransportError,
    },
    ListenerDelegate,
};

static WATCHDOG_PING_PAYLOAD: &[u8] = b"ping";

/// used when a configured reconnect delay does not fit in an `Instant`
const RECONNECT_DELAY_FAR: Duration = Duration::from_secs(86400 * 365);

#[derive(Debug)]
pub(crate) enum Command {
    Subscribe(StreamSubscription),
    Reconnect,
    Disconnect,
    SetDelegate(Option<Weak<dyn ListenerDelegate>>),
}

/// Connection state, changed only by transport results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// no socket and no connect attempt
    Disconnected,
    /// connect attempt in progress
    Connecting,
    /// socket open
    Connected,
}

type Connecting<S> = BoxFuture<'static, Result<S, ConnectError>>;

/// Background task owning the socket and everything that watches it
pub(crate) struct ListenerTask<C: Connector> {
    connector: Arc<C>,
    config: ListenerConfig,
    endpoint: StreamingEndpoint,
    access_token: String,
    commands: mpsc::UnboundedReceiver<Command>,
    dispatcher: Dispatcher,
    state: ConnectionState,
    socket: Option<C::Socket>,
    connecting: Option<Connecting<C::Socket>>,
    last_resolved_url: Option<Url>,
    backoff: Backoff,
    watchdog: Watchdog,
    reconnect_at: Option<Instant>,
}

impl<C: Connector> Debug for ListenerTask<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerTask")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .field("backoff", &self.backoff)
            .field("watchdog", &self.watchdog)
            .field("reconnect_at", &self.reconnect_at)
            .finish()
    }
}

async fn poll_connecting<S>(connecting: &mut Option<Connecting<S>>) -> Result<S, ConnectError> {
    match connecting {
        Some(fut) => fut.await,
        None => future::pending().await,
    }
}

async fn recv_frame<S: Socket>(socket: &mut Option<S>) -> Option<Result<Frame, TransportError>> {
    match socket {
        Some(s) => s.recv().await,
        None => future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => future::pending().await,
    }
}

impl<C: Connector> ListenerTask<C> {
    pub fn new(
        connector: C,
        config: ListenerConfig,
        endpoint: StreamingEndpoint,
        access_token: String,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        Self {
            connector: Arc::new(connector),
            backoff: Backoff::new(config.reconnect_delay_start, config.reconnect_delay_max),
            watchdog: Watchdog::new(config.idle_timeout, config.probe_timeout),
            config,
            endpoint,
            access_token,
            commands,
            dispatcher: Dispatcher::default(),
            state: ConnectionState::Disconnected,
            socket: None,
            connecting: None,
            last_resolved_url: None,
            reconnect_at: None,
        }
    }

    pub async fn run(mut self) {
        log::debug!("Listener task start: {:?}", self);

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            log::debug!("Listener handle dropped, stop");
                            self.reconnect_at = None;
                            self.teardown(close_code::NORMAL);
                            break;
                        }
                    }
                }

                result = poll_connecting(&mut self.connecting) => {
                    self.connecting = None;
                    self.handle_connect_result(result);
                }

                frame = recv_frame(&mut self.socket) => {
                    self.handle_frame(frame);
                }

                _ = sleep_until(self.watchdog.probe_deadline()) => {
                    self.watchdog_barked();
                }

                _ = sleep_until(self.watchdog.idle_deadline()) => {
                    self.release_watchdog().await;
                }

                _ = sleep_until(self.reconnect_at) => {
                    self.perform_reconnect();
                }
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        log::trace!("Handle command {:?}", command);

        match command {
            Command::Subscribe(subscription) => {
                log::info!("Subscribe to {} stream", subscription);
                let url = self.endpoint.url(&self.access_token, &subscription);
                self.reconnect_at = None;
                self.open(url);
            }
            Command::Reconnect => self.reconnect(),
            Command::Disconnect => self.disconnect(),
            Command::SetDelegate(delegate) => self.dispatcher.set_delegate(delegate),
        }
    }

    /// Replace the current socket (if any) with a new connection attempt to `url`
    fn open(&mut self, url: Url) {
        if self.teardown(close_code::NO_STATUS) {
            log::debug!("Previous socket closed before opening a new one");
        }

        log::debug!("Move to connecting state: {}", redacted(&url));

        self.last_resolved_url = Some(url.clone());
        self.state = ConnectionState::Connecting;

        let connector = self.connector.clone();
        let timeout = self.config.connect_timeout;
        self.connecting = Some(
            async move {
                match tokio::time::timeout(timeout, connector.connect(&url)).await {
                    Ok(result) => result,
                    Err(_) => Err(ConnectError {
                        url: redacted(&url),
                        source: transport_error::Timeout.build(),
                    }),
                }
            }
            .boxed(),
        );
    }

    /// Drop the pending connect attempt and close the socket, returns true if a socket was open
    fn teardown(&mut self, code: u16) -> bool {
        self.connecting = None;
        if self.watchdog.is_armed() {
            log::trace!("Watchdog disarmed");
            self.watchdog.disarm();
        }
        self.state = ConnectionState::Disconnected;

        match self.socket.take() {
            Some(socket) => {
                self.close_in_background(socket, code);
                true
            }
            None => false,
        }
    }

    fn close_in_background(&self, mut socket: C::Socket, code: u16) {
        let timeout = self.config.close_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, socket.close(code)).await {
                Ok(Ok(())) => log::trace!("Socket closed with code {}", code),
                Ok(Err(err)) => log::debug!("Close socket with code {} failed: {}", code, err),
                Err(_) => log::debug!("Close socket with code {} timeout, drop it", code),
            }
        });
    }

    fn disconnect(&mut self) {
        log::info!("Disconnect requested in {:?} state", self.state);

        let was_connected = self.state == ConnectionState::Connected;

        self.teardown(close_code::NORMAL);
        self.reconnect_at = None;
        self.backoff.reset();

        if was_connected {
            self.dispatcher.disconnected(close_code::NORMAL);
        }
    }

    fn reconnect(&mut self) {
        if self.reconnect_at.is_some() {
            log::trace!("Reconnect already scheduled, ignored");
            return;
        }

        if self.last_resolved_url.is_none() {
            log::debug!("Never subscribed, nothing to reconnect");
            return;
        }

        let delay = self.backoff.delay();
        log::debug!("Reconnect in {:?}", delay);

        let now = Instant::now();
        self.reconnect_at = Some(now.checked_add(delay).unwrap_or(now + RECONNECT_DELAY_FAR));
    }

    fn perform_reconnect(&mut self) {
        self.reconnect_at = None;

        if let Some(url) = self.last_resolved_url.clone() {
            log::info!("Reconnecting");
            self.open(url);
        }
    }

    /// Socket is gone without the caller asking for it, report and schedule a reconnect
    fn connection_lost(&mut self, code: u16) {
        log::warn!("Connection lost, code {}", code);

        self.teardown(code);
        self.dispatcher.disconnected(code);

        self.reconnect();
        self.backoff.advance();
    }

    fn handle_connect_result(&mut self, result: Result<C::Socket, ConnectError>) {
        match result {
            Ok(socket) => {
                log::info!("Websocket connected");
                log::debug!("Move to connected state");

                self.socket = Some(socket);
                self.state = ConnectionState::Connected;
                self.backoff.reset();
                self.watchdog.reset(Instant::now());
                self.dispatcher.connected();
            }
            Err(err) => {
                log::warn!("{}", err);
                self.connection_lost(close_code::ABNORMAL);
            }
        }
    }

    fn handle_frame(&mut self, frame: Option<Result<Frame, TransportError>>) {
        let frame = match frame {
            Some(Ok(frame)) => frame,
            Some(Err(err)) => {
                log::warn!("Websocket broken when receive frame: {}", err);
                self.socket = None;
                self.connection_lost(close_code::ABNORMAL);
                return;
            }
            None => {
                log::warn!("Websocket stream ended without close frame");
                self.socket = None;
                self.connection_lost(close_code::ABNORMAL);
                return;
            }
        };

        log::trace!("Received {} frame", frame.type_name());

        match frame {
            Frame::Close(code) => {
                self.socket = None;
                self.connection_lost(code.unwrap_or(close_code::NO_STATUS));
            }
            Frame::Text(text) => {
                self.watchdog.reset(Instant::now());
                self.handle_payload(text.as_bytes());
            }
            Frame::Binary(data) => {
                self.watchdog.reset(Instant::now());
                self.handle_payload(&data);
            }
            Frame::Ping(_) | Frame::Pong(_) => {
                self.watchdog.reset(Instant::now());
            }
        }
    }

    fn handle_payload(&mut self, data: &[u8]) {
        match decode_frame(data) {
            Ok(Some(event)) => {
                log::debug!("Received {} event", event.type_name());
                self.backoff.reset();
                self.dispatcher.event(event);
            }
            Ok(None) => log::trace!("Received heartbeat"),
            Err(err) => {
                log::warn!("Decode frame failed: {}", err);
                self.dispatcher.decode_error(err);
            }
        }
    }

    /// Send the watchdog ping. The task loop waits on the write no longer than it would
    /// wait for the pong, a write that takes longer barks the watchdog.
    async fn release_watchdog(&mut self) {
        self.watchdog.release(Instant::now());

        let probe_timeout = self.config.probe_timeout;
        let socket = match self.socket.as_mut() {
            Some(s) => s,
            None => return,
        };

        log::debug!("Connection idle, send watchdog ping");

        let ping = Frame::Ping(WATCHDOG_PING_PAYLOAD.to_vec());
        match tokio::time::timeout(probe_timeout, socket.send(ping)).await {
            Ok(Ok(())) => log::trace!("Watchdog ping sent"),
            Ok(Err(err)) => {
                log::warn!("Send watchdog ping failed: {}", err);
                self.socket = None;
                self.connection_lost(close_code::ABNORMAL);
            }
            Err(_) => self.watchdog_barked(),
        }
    }

    fn watchdog_barked(&mut self) {
        log::warn!("Watchdog barked, probe not answered");
        self.connection_lost(close_code::WATCHDOG_TIMEOUT);
    }
}
