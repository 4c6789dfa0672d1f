//! Streaming listener: one websocket, kept alive and reconnected in the background

mod backoff;
mod config;
mod dispatcher;
mod task;
mod watchdog;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod test;

use std::sync::{Arc, Weak};

use tokio::sync::mpsc;
use url::Url;

pub use backoff::{RECONNECT_DELAY_MAX, RECONNECT_DELAY_START};
pub use config::{ListenerConfig, CLOSE_TIMEOUT, CONNECT_TIMEOUT};
pub use task::ConnectionState;
pub use watchdog::{IDLE_TIMEOUT, PROBE_TIMEOUT};

use self::task::{Command, ListenerTask};
use super::{
    subscription::{InvalidBaseUrl, StreamSubscription, StreamingEndpoint},
    transport::{Connector, TungsteniteConnector},
    ListenerDelegate,
};

/// Websocket close status codes used by the listener
pub mod close_code {
    /// caller asked to disconnect
    pub const NORMAL: u16 = 1000;
    /// socket replaced by a new subscription or reconnect, or closed without a status
    pub const NO_STATUS: u16 = 1005;
    /// connection dropped without a close frame
    pub const ABNORMAL: u16 = 1006;
    /// the watchdog probe was not answered
    pub const WATCHDOG_TIMEOUT: u16 = 4000;
}

/// Handle of a streaming connection.
///
/// All work happens on a background task spawned by the constructor, so it must be
/// created inside a tokio runtime. Methods only enqueue commands and never block.
/// Dropping the handle closes the connection and stops the task.
#[derive(Debug)]
pub struct Listener {
    commands: mpsc::UnboundedSender<Command>,
}

impl Listener {
    /// Create a listener of the instance at `base_url`, using the default transport and config
    pub fn new<S: Into<String>>(base_url: &Url, access_token: S) -> Result<Self, InvalidBaseUrl> {
        Self::with_connector(
            base_url,
            access_token,
            ListenerConfig::default(),
            TungsteniteConnector,
        )
    }

    /// Create a listener with custom config and transport
    pub fn with_connector<S, C>(
        base_url: &Url,
        access_token: S,
        config: ListenerConfig,
        connector: C,
    ) -> Result<Self, InvalidBaseUrl>
    where
        S: Into<String>,
        C: Connector,
    {
        let endpoint = StreamingEndpoint::with_path(base_url, &config.streaming_path)?;

        log::debug!("Create listener for endpoint {}", endpoint);

        let (tx, rx) = mpsc::unbounded_channel();
        let task = ListenerTask::new(connector, config, endpoint, access_token.into(), rx);
        tokio::spawn(task.run());

        Ok(Self { commands: tx })
    }

    /// Connect to a stream, replacing the current connection if there is one
    pub fn subscribe(&self, subscription: StreamSubscription) {
        self.send(Command::Subscribe(subscription))
    }

    /// Schedule a reconnect to the last subscribed stream after the current backoff delay.
    ///
    /// Does nothing if a reconnect is already scheduled or nothing was subscribed yet.
    pub fn reconnect(&self) {
        self.send(Command::Reconnect)
    }

    /// Close the connection with code 1000 and cancel any scheduled reconnect
    pub fn disconnect(&self) {
        self.send(Command::Disconnect)
    }

    /// Register the delegate receiving callbacks, replacing the previous one.
    ///
    /// Only a weak reference is kept, callbacks stop once the caller drops it.
    pub fn set_delegate<D: ListenerDelegate + 'static>(&self, delegate: &Arc<D>) {
        let weak: Weak<dyn ListenerDelegate> = Arc::downgrade(delegate) as _;
        self.send(Command::SetDelegate(Some(weak)))
    }

    /// Unregister the delegate
    pub fn remove_delegate(&self) {
        self.send(Command::SetDelegate(None))
    }

    fn send(&self, command: Command) {
        if let Err(err) = self.commands.send(command) {
            log::warn!("Listener task stopped, command {:?} dropped", err.0);
        }
    }
}
