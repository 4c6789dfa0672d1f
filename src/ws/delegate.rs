//! Listener observers.

use std::task::Poll;

use futures_util::Stream;
use tokio::sync::mpsc;

use super::{ClientEvent, DecodeError};

/// Receives everything a [`Listener`](super::Listener) observes.
///
/// Callbacks run on the listener task, one at a time and in the order things happened.
/// They must return quickly, implementors that touch their own state should hand the
/// data over to their own context.
pub trait ListenerDelegate: Send + Sync {
    /// the websocket connection is established
    fn did_connect(&self);
    /// the websocket connection is gone, with the close status code
    fn did_disconnect(&self, code: u16);
    /// a stream event was received
    fn did_receive_event(&self, event: ClientEvent);
    /// a frame could not be decoded, the connection stays open
    fn did_fail_to_decode(&self, error: DecodeError);
}

/// One observed listener callback
#[derive(Debug)]
pub enum ListenerEvent {
    /// see [`ListenerDelegate::did_connect`]
    Connected,
    /// see [`ListenerDelegate::did_disconnect`]
    Disconnected {
        /// close status code
        code: u16,
    },
    /// see [`ListenerDelegate::did_receive_event`]
    Event(ClientEvent),
    /// see [`ListenerDelegate::did_fail_to_decode`]
    DecodeError(DecodeError),
}

/// Delegate forwarding every callback into a [`ListenerEvents`] stream
#[derive(Debug)]
pub struct ChannelDelegate {
    tx: mpsc::UnboundedSender<ListenerEvent>,
}

impl ChannelDelegate {
    /// Create the delegate and the stream receiving its callbacks
    pub fn new() -> (Self, ListenerEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, ListenerEvents { rx })
    }

    fn forward(&self, event: ListenerEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("Listener event stream dropped, event discarded");
        }
    }
}

impl ListenerDelegate for ChannelDelegate {
    fn did_connect(&self) {
        self.forward(ListenerEvent::Connected)
    }

    fn did_disconnect(&self, code: u16) {
        self.forward(ListenerEvent::Disconnected { code })
    }

    fn did_receive_event(&self, event: ClientEvent) {
        self.forward(ListenerEvent::Event(event))
    }

    fn did_fail_to_decode(&self, error: DecodeError) {
        self.forward(ListenerEvent::DecodeError(error))
    }
}

/// Stream of listener callbacks, ends when its [`ChannelDelegate`] is dropped
#[derive(Debug)]
pub struct ListenerEvents {
    rx: mpsc::UnboundedReceiver<ListenerEvent>,
}

impl Stream for ListenerEvents {
    type Item = ListenerEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
