//! Command handlers

use crate::config::Blink;
use crate::indicator::Indicator;
use crate::session::Session;
use log::*;
use microondas_proto::{Request, Response};

/// Maps each request to its reply
///
/// | Request | Side effect            | Reply       |
/// |---------|------------------------|-------------|
/// | `PING`  | one pulse on the LED   | `PONG`      |
/// | text `T`| none                   | `OK:T`      |
#[derive(Debug, Clone)]
pub struct Dispatcher {
    ping_pulse: Blink,
}

impl Dispatcher {
    pub fn new(ping_pulse: Blink) -> Self {
        Self { ping_pulse }
    }

    /// Handle one request. Never fails and never touches the session.
    pub fn dispatch<I: Indicator>(
        &self,
        request: Request,
        session: &Session,
        indicator: &mut I,
    ) -> Response {
        if !session.is_connected() {
            debug!("no peer connected, reply to {} will be dropped", request.verb());
        }

        match request {
            Request::Ping => {
                indicator.blink(&self.ping_pulse);
                Response::pong()
            }
            Request::Other(text) => {
                debug!("echoing {} bytes", text.len());
                Response::echo(&text)
            }
        }
    }
}
