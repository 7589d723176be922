//! Hardware capability descriptors.
//!
//! One descriptor per advertised format range: resolution/interval bounds and
//! step granularity for video, channel/rate bounds and granularity for audio.
//! Descriptors are ephemeral — produced per enumeration call, discarded after
//! selection.

use crate::config::{AudioFormat, VideoFormat};

/// Snap `value` to the nearest lower multiple of `granularity` above
/// `min`. Idempotent on already-aligned input.
pub fn clamp_to_granularity(value: i64, min: i64, granularity: i64) -> i64 {
    let step = granularity.max(1);
    value - ((value - min) % step)
}

/// One advertised video format range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCaps {
    pub format: VideoFormat,
    pub min_width: i32,
    pub max_width: i32,
    pub min_height: i32,
    pub max_height: i32,
    /// Frame interval bounds in 100ns units.
    pub min_interval: i64,
    pub max_interval: i64,
    pub granularity_x: i32,
    pub granularity_y: i32,
    /// The descriptor's own declared resolution and interval, used when the
    /// range is degenerate and carried through for unmatched dimensions.
    pub native_width: i32,
    pub native_height: i32,
    pub native_interval: i64,
}

impl VideoCaps {
    /// Enforce descriptor invariants: granularity is at least 1, and a
    /// zero-size resolution range collapses to the declared resolution on
    /// both bounds (some devices advertise 0 bounds for fixed-size pins).
    pub fn normalized(mut self) -> Self {
        if self.min_width == 0
            || self.min_height == 0
            || self.max_width == 0
            || self.max_height == 0
        {
            self.min_width = self.native_width;
            self.max_width = self.native_width;
            self.min_height = self.native_height;
            self.max_height = self.native_height;
        }

        self.granularity_x = self.granularity_x.max(1);
        self.granularity_y = self.granularity_y.max(1);
        self
    }
}

/// One advertised audio format range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioCaps {
    pub format: AudioFormat,
    pub min_channels: u32,
    pub max_channels: u32,
    pub channels_granularity: u32,
    pub min_sample_rate: u32,
    pub max_sample_rate: u32,
    pub sample_rate_granularity: u32,
    /// Declared defaults carried through for unmatched dimensions.
    pub native_channels: u32,
    pub native_rate: u32,
}

impl AudioCaps {
    /// Enforce the granularity invariant (zero is invalid, clamp upward).
    pub fn normalized(mut self) -> Self {
        self.channels_granularity = self.channels_granularity.max(1);
        self.sample_rate_granularity = self.sample_rate_granularity.max(1);
        self
    }
}
