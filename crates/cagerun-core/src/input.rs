use serde::{Deserialize, Serialize};

/// Logical actions the simulation understands. Device mapping lives in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameAction {
    Jump,
    Slide,
    Restart,
    Shoot,
}

/// Where an action came from. Only used for presentation hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    #[default]
    Keyboard,
    Gamepad,
}

/// A resolved action edge delivered to the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    pub action: GameAction,
    #[serde(default)]
    pub source: InputSource,
    pub pressed: bool,
}

impl InputEvent {
    /// A keyboard press of `action`.
    pub fn press(action: GameAction) -> Self {
        Self {
            action,
            source: InputSource::Keyboard,
            pressed: true,
        }
    }

    pub fn release(action: GameAction) -> Self {
        Self {
            pressed: false,
            ..Self::press(action)
        }
    }

    pub fn with_source(mut self, source: InputSource) -> Self {
        self.source = source;
        self
    }

    /// Decode a msgpack-encoded event. Malformed bytes yield `None`.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        match rmp_serde::from_slice::<InputEvent>(bytes) {
            Ok(ev) => Some(ev),
            Err(e) => {
                tracing::debug!("Dropping undecodable input ({} bytes): {e}", bytes.len());
                None
            },
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        // A fixed-shape struct of enums and a bool always encodes.
        rmp_serde::to_vec(self).unwrap_or_default()
    }
}
