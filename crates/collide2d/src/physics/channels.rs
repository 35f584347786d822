//! Collision channel registry
//!
//! A channel is a small integer category a shape belongs to; response
//! tables are indexed by channel. Channel 0 is reserved for the default
//! channel, channels 1..31 are assigned to user-defined names on first
//! use and are immutable once assigned.
//!
//! The registry is an explicit object constructed once at startup and
//! passed by reference to the data-loading layer, rather than hidden
//! global state.

use crate::physics::CollisionError;
use std::collections::HashMap;

/// Maximum number of collision channels, including the reserved default
pub const MAX_CHANNELS: usize = 32;

/// Name that unconditionally maps to the reserved channel 0
pub const DEFAULT_CHANNEL_NAME: &str = "default";

/// A collision channel slot in `[0, 32)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel(u8);

impl Channel {
    /// The reserved default channel
    pub const DEFAULT: Channel = Channel(0);

    /// Index of this channel into a response table
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Maps user-defined channel names to fixed channel slots
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    names: HashMap<String, Channel>,
    next: u8,
}

impl ChannelRegistry {
    /// Create a registry holding only the reserved default channel
    pub fn new() -> Self {
        let mut names = HashMap::new();
        names.insert(DEFAULT_CHANNEL_NAME.to_owned(), Channel::DEFAULT);
        Self { names, next: 1 }
    }

    /// Return the channel for `name`, assigning the next free slot on
    /// first use
    ///
    /// The reserved name always maps to channel 0 and bypasses the
    /// assignment counter. Fails once all 32 slots are taken; a
    /// previously assigned name never fails.
    pub fn get_or_assign(&mut self, name: &str) -> Result<Channel, CollisionError> {
        if name == DEFAULT_CHANNEL_NAME {
            return Ok(Channel::DEFAULT);
        }
        if let Some(&channel) = self.names.get(name) {
            return Ok(channel);
        }
        if usize::from(self.next) >= MAX_CHANNELS {
            log::error!("collision channel limit exceeded while registering '{name}'");
            return Err(CollisionError::ChannelLimitExceeded {
                name: name.to_owned(),
            });
        }
        let channel = Channel(self.next);
        self.next += 1;
        self.names.insert(name.to_owned(), channel);
        Ok(channel)
    }

    /// Look up a channel without assigning a new slot
    pub fn get(&self, name: &str) -> Option<Channel> {
        self.names.get(name).copied()
    }

    /// Number of channels defined so far, including the default
    pub fn count(&self) -> usize {
        usize::from(self.next)
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
