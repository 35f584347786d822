//! Channel response flags and per-collider response profiles
//!
//! Every collider declares a response toward each of the 32 channels.
//! When two shapes are tested, both directional responses are combined
//! with a bitwise OR; the combined value decides whether the pair is
//! ignored, produces overlap events, or is physically blocked.

use crate::physics::channels::{Channel, ChannelRegistry, MAX_CHANNELS};
use crate::physics::CollisionError;
use bitflags::bitflags;
use serde::Deserialize;

bitflags! {
    /// Response a shape declares toward a channel
    ///
    /// The flags are not mutually exclusive, although producers
    /// typically set exactly one per channel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Response: u8 {
        /// Skip the pair entirely; suppresses every event
        const IGNORE = 1 << 0;
        /// Track the pair through the overlap lifecycle events
        const OVERLAP = 1 << 1;
        /// Physically separate the pair and fire hit events
        const BLOCK = 1 << 2;
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::BLOCK
    }
}

/// Single-flag response value as it appears in shape data records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Maps to [`Response::IGNORE`]
    Ignore,
    /// Maps to [`Response::OVERLAP`]
    Overlap,
    /// Maps to [`Response::BLOCK`]
    Block,
}

impl From<ResponseKind> for Response {
    fn from(kind: ResponseKind) -> Self {
        match kind {
            ResponseKind::Ignore => Response::IGNORE,
            ResponseKind::Overlap => Response::OVERLAP,
            ResponseKind::Block => Response::BLOCK,
        }
    }
}

/// Per-collider channel membership and response table
///
/// Defaults to [`Response::BLOCK`] toward every channel.
#[derive(Debug, Clone)]
pub struct CollisionProfile {
    channel: Channel,
    responses: [Response; MAX_CHANNELS],
}

impl CollisionProfile {
    /// Create a profile on the given channel, blocking everything
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            responses: [Response::BLOCK; MAX_CHANNELS],
        }
    }

    /// The channel this collider belongs to
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Move this collider to another channel
    pub fn set_channel(&mut self, channel: Channel) {
        self.channel = channel;
    }

    /// Move this collider to a named channel, registering the name on
    /// first use
    pub fn set_channel_by_name(
        &mut self,
        registry: &mut ChannelRegistry,
        name: &str,
    ) -> Result<(), CollisionError> {
        self.channel = registry.get_or_assign(name)?;
        Ok(())
    }

    /// Set the declared response toward a channel
    pub fn set_response(&mut self, channel: Channel, response: Response) {
        self.responses[channel.index()] = response;
    }

    /// Set the declared response toward a named channel, registering the
    /// name on first use
    pub fn set_response_by_name(
        &mut self,
        registry: &mut ChannelRegistry,
        name: &str,
        response: Response,
    ) -> Result<(), CollisionError> {
        let channel = registry.get_or_assign(name)?;
        self.responses[channel.index()] = response;
        Ok(())
    }

    /// The declared response toward a channel
    pub fn response_to(&self, channel: Channel) -> Response {
        self.responses[channel.index()]
    }

    /// Combine both directional responses for a pair of profiles
    ///
    /// The result is the bitwise OR of what `a` declares toward `b`'s
    /// channel and what `b` declares toward `a`'s channel.
    pub fn combined(a: &CollisionProfile, b: &CollisionProfile) -> Response {
        a.response_to(b.channel) | b.response_to(a.channel)
    }
}

impl Default for CollisionProfile {
    fn default() -> Self {
        Self::new(Channel::DEFAULT)
    }
}
