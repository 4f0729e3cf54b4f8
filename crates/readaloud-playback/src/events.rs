//! Events emitted by the read-along player.

use serde::{Deserialize, Serialize};

use crate::scheduler::PlaybackState;

/// Events sent on the player's unbounded channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// The playback state machine moved.
    StateChanged { state: PlaybackState },

    /// Read-along position, snapped to the end of the current word.
    Position { chars: usize, total: usize },

    /// Generation or output failed. Playback of received audio continues.
    Error { message: String },
}
