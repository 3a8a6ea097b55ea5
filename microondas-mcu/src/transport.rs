//! Transport adapter: BLE stack events in, notifications out
//!
//! The adapter owns the session and runs the whole pipeline for each write:
//! bound the frame, parse, dispatch, encode, notify. Parse failures drop the
//! message; a missing peer drops the reply. Nothing here is fatal.

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::event::{Event, EventReceiver};
use crate::indicator::Indicator;
use crate::session::{PeerId, Session};
use log::*;
use microondas_proto::{RawMessage, Response, encode};

/// Trait for the notify side of a BLE GATT server
///
/// MCU-specific crates implement this trait using their BLE stack.
pub trait Notifier {
    /// Error type for BLE operations
    type Error: std::fmt::Debug;

    /// Push one notification on the TX characteristic to `peer`
    fn notify(&mut self, peer: PeerId, data: &[u8]) -> Result<(), Self::Error>;

    /// Make the device discoverable again
    fn start_advertising(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum SendError<E: std::fmt::Debug> {
    #[error("no peer connected")]
    NotConnected,
    #[error("payload of {len} bytes exceeds the {max} byte frame limit")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("transport error: {0:?}")]
    Transport(E),
}

pub struct TransportAdapter<N, I> {
    config: Config,
    session: Session,
    dispatcher: Dispatcher,
    notifier: N,
    indicator: I,
}

impl<N: Notifier, I: Indicator> TransportAdapter<N, I> {
    pub fn new(config: Config, notifier: N, indicator: I) -> Self {
        let dispatcher = Dispatcher::new(config.ping_pulse);
        Self {
            config,
            session: Session::new(),
            dispatcher,
            notifier,
            indicator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// A peer connected: record it, then greet it
    pub fn on_connect(&mut self, peer: PeerId) {
        info!("Client CONNECTED (conn {})", peer);
        self.session.mark_connected(peer);
        self.greet();
    }

    /// The peer went away: clear the session and advertise again
    pub fn on_disconnect(&mut self) {
        match self.session.current_peer() {
            Some(peer) => info!("Client DISCONNECTED (conn {})", peer),
            None => info!("Client DISCONNECTED"),
        }
        self.session.mark_disconnected();

        match self.notifier.start_advertising() {
            Ok(()) => info!("Advertising restarted"),
            Err(e) => error!("Failed to restart advertising: {:?}", e),
        }
    }

    /// A write arrived on the RX characteristic
    pub fn on_message(&mut self, data: &[u8]) {
        let raw = RawMessage::bounded(data, self.config.max_frame_len);
        if raw.truncated {
            warn!(
                "Write of {} bytes cut to {} byte frame",
                data.len(),
                self.config.max_frame_len
            );
        }

        let request = match raw.parse() {
            Ok(request) => request,
            Err(e) => {
                warn!("Dropping message: {}", e);
                return;
            }
        };

        match request.payload() {
            Some(text) => info!("Received: {}", text),
            None => info!("Received: {}", request.verb()),
        }

        let response = self
            .dispatcher
            .dispatch(request, &self.session, &mut self.indicator);
        self.reply(&response);
    }

    /// Notify the current peer with `data`
    ///
    /// Does not fragment: anything over the frame limit is refused.
    pub fn send(&mut self, data: &[u8]) -> Result<(), SendError<N::Error>> {
        let peer = self.session.current_peer().ok_or(SendError::NotConnected)?;
        if data.len() > self.config.max_frame_len {
            return Err(SendError::PayloadTooLarge {
                len: data.len(),
                max: self.config.max_frame_len,
            });
        }
        self.notifier.notify(peer, data).map_err(SendError::Transport)
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Connected(peer) => self.on_connect(peer),
            Event::Disconnected => self.on_disconnect(),
            Event::Write(data) => self.on_message(&data),
        }
    }

    /// Handle queued events until every sender is dropped
    pub fn run(&mut self, events: EventReceiver) {
        while let Some(event) = events.recv() {
            self.handle_event(event);
        }
        info!("Event queue closed");
    }

    fn greet(&mut self) {
        self.indicator.blink(&self.config.connect_pattern);
        self.indicator.delay(self.config.connect_settle);

        if let Some(greeting) = self.config.greeting.clone() {
            self.reply(&Response::new(greeting));
        }
    }

    fn reply(&mut self, response: &Response) {
        let bytes = match encode(response, self.config.max_frame_len) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Reply truncated: {}", e);
                e.into_truncated()
            }
        };

        match self.send(&bytes) {
            Ok(()) => info!("Sent: {}", String::from_utf8_lossy(&bytes)),
            Err(SendError::NotConnected) => {
                info!("No client connected, reply dropped");
            }
            Err(e) => error!("Failed to send notification: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Blink;
    use crate::event::event_queue;
    use crate::indicator::tests::RecordingIndicator;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Notify(PeerId, Vec<u8>),
        Advertise,
    }

    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub calls: Vec<Call>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        fn notified(&self) -> Vec<String> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Notify(_, data) => Some(String::from_utf8_lossy(data).into_owned()),
                    Call::Advertise => None,
                })
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        type Error = &'static str;

        fn notify(&mut self, peer: PeerId, data: &[u8]) -> Result<(), Self::Error> {
            if self.fail {
                return Err("stack busy");
            }
            self.calls.push(Call::Notify(peer, data.to_vec()));
            Ok(())
        }

        fn start_advertising(&mut self) -> Result<(), Self::Error> {
            if self.fail {
                return Err("stack busy");
            }
            self.calls.push(Call::Advertise);
            Ok(())
        }
    }

    type Adapter = TransportAdapter<RecordingNotifier, RecordingIndicator>;

    fn adapter(config: Config) -> Adapter {
        TransportAdapter::new(config, RecordingNotifier::default(), RecordingIndicator::default())
    }

    fn quiet() -> Config {
        Config::default().with_greeting(None).with_connect_pattern(
            Blink::new(0, Duration::ZERO, Duration::ZERO),
            Duration::ZERO,
        )
    }

    #[test]
    fn scenario_connect_ping_echo_disconnect() {
        let mut adapter = adapter(Config::default());

        adapter.on_connect(1);
        assert!(adapter.session().is_connected());
        assert_eq!(adapter.notifier().calls, vec![Call::Notify(1, b"CONNECTED".to_vec())]);
        assert_eq!(adapter.indicator().pulses(), 3);

        adapter.on_message(b"PING");
        assert_eq!(adapter.indicator().pulses(), 4);

        adapter.on_message(b"hello");
        assert_eq!(adapter.notifier().notified(), vec!["CONNECTED", "PONG", "OK:hello"]);

        adapter.on_disconnect();
        assert_eq!(adapter.session().current_peer(), None);
        assert_eq!(adapter.notifier().calls.last(), Some(&Call::Advertise));
        assert!(matches!(adapter.send(b"CONNECTED"), Err(SendError::NotConnected)));
    }

    #[test]
    fn greeting_waits_for_the_connect_pattern() {
        let mut adapter = adapter(Config::default());
        adapter.on_connect(2);
        let steps = &adapter.indicator().steps;
        assert_eq!(
            steps.last(),
            Some(&crate::indicator::tests::Step::Delay(Duration::from_millis(500)))
        );
    }

    #[test]
    fn send_without_peer_never_reaches_the_stack() {
        let mut adapter = adapter(quiet());
        assert!(matches!(adapter.send(b"x"), Err(SendError::NotConnected)));
        adapter.on_message(b"hello");
        assert!(adapter.notifier().calls.is_empty());
    }

    #[test]
    fn send_refuses_oversized_payloads() {
        let mut adapter = adapter(quiet().with_max_frame_len(8));
        adapter.on_connect(3);
        assert!(matches!(
            adapter.send(b"123456789"),
            Err(SendError::PayloadTooLarge { len: 9, max: 8 })
        ));
        assert!(adapter.send(b"12345678").is_ok());
    }

    #[test]
    fn truncated_writes_are_dropped() {
        let mut adapter = adapter(quiet().with_max_frame_len(4));
        adapter.on_connect(1);
        adapter.on_message(b"PINGPING");
        adapter.on_message(b"");
        adapter.on_message(&[0xc3, 0x28]);
        assert!(adapter.notifier().calls.is_empty());
        assert_eq!(adapter.indicator().pulses(), 0);
    }

    #[test]
    fn long_echo_is_sent_truncated() {
        let mut adapter = adapter(quiet().with_max_frame_len(6));
        adapter.on_connect(1);
        adapter.on_message(b"abcdef");
        assert_eq!(adapter.notifier().notified(), vec!["OK:abc"]);
    }

    #[test]
    fn transport_failures_are_not_fatal() {
        let mut adapter = adapter(Config::default());
        adapter.notifier.fail = true;
        adapter.on_connect(1);
        adapter.on_message(b"PING");
        adapter.on_disconnect();
        assert!(matches!(adapter.send(b"x"), Err(SendError::NotConnected)));

        adapter.on_connect(5);
        assert!(matches!(adapter.send(b"x"), Err(SendError::Transport("stack busy"))));
    }

    #[test]
    fn reconnect_targets_the_new_peer() {
        let mut adapter = adapter(quiet());
        adapter.on_connect(1);
        adapter.on_disconnect();
        adapter.on_connect(9);
        adapter.on_message(b"hi");
        assert_eq!(
            adapter.notifier().calls,
            vec![Call::Advertise, Call::Notify(9, b"OK:hi".to_vec())]
        );
    }

    #[test]
    fn run_drains_the_queue_in_order() {
        let (tx, rx) = event_queue();
        tx.connected(1);
        tx.write(b"PING");
        tx.write(b"hello");
        tx.disconnected();
        tx.write(b"late");
        drop(tx);

        let mut adapter = adapter(Config::default());
        adapter.run(rx);
        assert_eq!(adapter.notifier().notified(), vec!["CONNECTED", "PONG", "OK:hello"]);
        assert!(!adapter.session().is_connected());
    }
}
