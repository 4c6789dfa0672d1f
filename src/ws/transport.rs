//! Websocket transport seam.
//!
//! The listener talks to the network only through [`Connector`] and [`Socket`], the default
//! implementation is backed by tokio-tungstenite.

use futures_util::{SinkExt, StreamExt};
use snafu::prelude::*;
use tokio_tungstenite as websocket;
use url::Url;
use websocket::tungstenite::{
    self,
    protocol::{frame::coding::CloseCode, CloseFrame},
};

/// A websocket frame as seen by the listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// utf-8 text frame
    Text(String),
    /// binary frame
    Binary(Vec<u8>),
    /// protocol level ping
    Ping(Vec<u8>),
    /// protocol level pong
    Pong(Vec<u8>),
    /// close frame with optional status code
    Close(Option<u16>),
}

impl Frame {
    /// frame type name for logging
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::Ping(_) => "ping",
            Self::Pong(_) => "pong",
            Self::Close(_) => "close",
        }
    }
}

/// Error of an established websocket
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(transport_error), context(suffix(false)))]
pub enum TransportError {
    /// underlying websocket stream broken
    #[snafu(display("underlying websocket stream broken: {source}"))]
    Websocket {
        /// source error
        source: tungstenite::Error,
    },

    /// the peer went away without a close handshake
    #[snafu(display("websocket peer gone"))]
    PeerGone,

    /// operation did not finish in time
    #[snafu(display("websocket operation timeout"))]
    Timeout,
}

/// Error when open a websocket connection
#[derive(Debug, Snafu)]
#[snafu(
    display("connect websocket {url} failed: {source}"),
    visibility(pub(crate)),
    module(connect_error),
    context(suffix(false))
)]
pub struct ConnectError {
    /// connected url, with the access token stripped
    pub url: String,
    /// source error
    pub source: TransportError,
}

/// An open websocket connection, exclusively owned by one listener
#[async_trait::async_trait]
pub trait Socket: Send + 'static {
    /// Receive the next frame, `None` when the stream ended.
    ///
    /// Must be cancel safe, the listener polls it inside `select!`.
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>>;

    /// Send a frame
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Start the close handshake with a status code
    async fn close(&mut self, code: u16) -> Result<(), TransportError>;
}

/// Opens websocket connections
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    /// socket type produced by this connector
    type Socket: Socket;

    /// Connect to the url
    async fn connect(&self, url: &Url) -> Result<Self::Socket, ConnectError>;
}

fn broken(source: tungstenite::Error) -> TransportError {
    match source {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            transport_error::PeerGone.build()
        }
        source => TransportError::Websocket { source },
    }
}

/// Strip the query (which carries the access token) from a url, for logs and errors
pub(crate) fn redacted(url: &Url) -> String {
    let mut u = url.clone();
    u.set_query(None);
    u.to_string()
}

pub(crate) type WebsocketClient =
    websocket::WebSocketStream<websocket::MaybeTlsStream<tokio::net::TcpStream>>;

/// Default connector using tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait::async_trait]
impl Connector for TungsteniteConnector {
    type Socket = TungsteniteSocket;

    async fn connect(&self, url: &Url) -> Result<Self::Socket, ConnectError> {
        log::debug!("Connecting websocket: {}", redacted(url));

        let (ws, resp) = websocket::connect_async(url)
            .await
            .context(transport_error::Websocket)
            .with_context(|_| connect_error::Connect { url: redacted(url) })?;

        log::debug!("Websocket handshake done, status {}", resp.status());

        Ok(TungsteniteSocket { ws })
    }
}

/// Websocket connection established by [`TungsteniteConnector`]
#[derive(Debug)]
pub struct TungsteniteSocket {
    ws: WebsocketClient,
}

#[async_trait::async_trait]
impl Socket for TungsteniteSocket {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            let message = match self.ws.next().await? {
                Ok(m) => m,
                Err(source) => return Some(Err(broken(source))),
            };

            let frame = match message {
                tungstenite::Message::Text(text) => Frame::Text(text),
                tungstenite::Message::Binary(data) => Frame::Binary(data),
                tungstenite::Message::Ping(data) => Frame::Ping(data),
                tungstenite::Message::Pong(data) => Frame::Pong(data),
                tungstenite::Message::Close(frame) => Frame::Close(frame.map(|f| f.code.into())),
                // raw frames are never produced when reading
                #[allow(unreachable_patterns)]
                _ => continue,
            };

            return Some(Ok(frame));
        }
    }

    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let message = match frame {
            Frame::Text(text) => tungstenite::Message::Text(text),
            Frame::Binary(data) => tungstenite::Message::Binary(data),
            Frame::Ping(data) => tungstenite::Message::Ping(data),
            Frame::Pong(data) => tungstenite::Message::Pong(data),
            Frame::Close(code) => tungstenite::Message::Close(code.map(|c| CloseFrame {
                code: CloseCode::from(c),
                reason: "".into(),
            })),
        };

        self.ws.send(message).await.map_err(broken)
    }

    async fn close(&mut self, code: u16) -> Result<(), TransportError> {
        self.ws
            .close(Some(CloseFrame {
                code: CloseCode::from(code),
                reason: "".into(),
            }))
            .await
            .map_err(broken)
    }
}
