//! Shared cross-platform state types.

/// Health of the live insert feed behind the hotspot layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeedState {
    /// No activation is running.
    #[default]
    Inactive,
    /// Subscribed and receiving inserts.
    Live,
    /// Subscription failed or dropped; only the sweep keeps running.
    Disconnected,
}

impl FeedState {
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }
}
