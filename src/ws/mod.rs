//! Mastodon streaming api client

mod delegate;
mod event;
mod listener;
mod subscription;
mod transport;

pub use delegate::{ChannelDelegate, ListenerDelegate, ListenerEvent, ListenerEvents};
pub use event::{decode_frame, ClientEvent, DecodeError, StreamEnvelope};
pub use listener::{
    close_code, ConnectionState, Listener, ListenerConfig, CLOSE_TIMEOUT, CONNECT_TIMEOUT,
    IDLE_TIMEOUT, PROBE_TIMEOUT, RECONNECT_DELAY_MAX, RECONNECT_DELAY_START,
};
pub use subscription::{InvalidBaseUrl, StreamSubscription, StreamingEndpoint, STREAMING_PATH};
pub use transport::{
    ConnectError, Connector, Frame, Socket, TransportError, TungsteniteConnector,
    TungsteniteSocket,
};
