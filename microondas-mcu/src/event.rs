//! Event queue between BLE stack callbacks and the command worker
//!
//! Callbacks only push events; one worker drains them in arrival order, so
//! at most one command is ever being handled.

use crate::session::PeerId;
use log::*;
use std::sync::mpsc::{self, Receiver, Sender};

/// Something the BLE stack reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connected(PeerId),
    Disconnected,
    /// Raw bytes written to the RX characteristic
    Write(Vec<u8>),
}

/// Create a connected sender/receiver pair
pub fn event_queue() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Cloneable handle given to stack callbacks
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<Event>,
}

impl EventSender {
    /// Queue an event without blocking. Returns false once the worker is gone.
    pub fn send(&self, event: Event) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(mpsc::SendError(event)) => {
                warn!("event worker stopped, dropping {:?}", event);
                false
            }
        }
    }

    pub fn connected(&self, peer: PeerId) -> bool {
        self.send(Event::Connected(peer))
    }

    pub fn disconnected(&self) -> bool {
        self.send(Event::Disconnected)
    }

    pub fn write(&self, data: &[u8]) -> bool {
        self.send(Event::Write(data.to_vec()))
    }
}

/// Worker side of the queue
#[derive(Debug)]
pub struct EventReceiver {
    rx: Receiver<Event>,
}

impl EventReceiver {
    /// Block for the next event; `None` once every sender is dropped
    pub fn recv(&self) -> Option<Event> {
        self.rx.recv().ok()
    }

    /// Next event if one is already queued
    pub fn try_recv(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}
