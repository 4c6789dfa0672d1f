use std::sync::Weak;

use crate::ws::{ClientEvent, DecodeError, ListenerDelegate};

/// Forwards listener callbacks to at most one delegate, without keeping it alive
#[derive(Default)]
pub(crate) struct Dispatcher {
    delegate: Option<Weak<dyn ListenerDelegate>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registered", &self.delegate.is_some())
            .finish()
    }
}

impl Dispatcher {
    pub fn set_delegate(&mut self, delegate: Option<Weak<dyn ListenerDelegate>>) {
        self.delegate = delegate;
    }

    fn with_delegate<F: FnOnce(&dyn ListenerDelegate)>(&mut self, f: F) {
        let delegate = match self.delegate.as_ref().map(Weak::upgrade) {
            Some(Some(d)) => d,
            Some(None) => {
                log::debug!("Delegate dropped, unregister it");
                self.delegate = None;
                return;
            }
            None => return,
        };

        f(delegate.as_ref())
    }

    pub fn connected(&mut self) {
        self.with_delegate(|d| d.did_connect())
    }

    pub fn disconnected(&mut self, code: u16) {
        self.with_delegate(|d| d.did_disconnect(code))
    }

    pub fn event(&mut self, event: ClientEvent) {
        self.with_delegate(|d| d.did_receive_event(event))
    }

    pub fn decode_error(&mut self, error: DecodeError) {
        self.with_delegate(|d| d.did_fail_to_decode(error))
    }
}
