//! Connection state for the single BLE peer

/// Connection handle assigned by the BLE stack
pub type PeerId = u16;

/// The one peer the service talks to
///
/// Only the transport adapter mutates it. `connected` and the peer id are
/// one field, so a peer id exists exactly when a peer is connected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    peer: Option<PeerId>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_connected(&mut self, peer: PeerId) {
        self.peer = Some(peer);
    }

    pub fn mark_disconnected(&mut self) {
        self.peer = None;
    }

    pub fn is_connected(&self) -> bool {
        self.peer.is_some()
    }

    pub fn current_peer(&self) -> Option<PeerId> {
        self.peer
    }
}
