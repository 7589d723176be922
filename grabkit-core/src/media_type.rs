//! Negotiated media formats.
//!
//! A `MediaType` is the concrete format handle the selector produces and the
//! graph engine consumes. The session owns it exclusively once assigned and
//! replaces it wholesale on reconfiguration — never mutates it in place.

use serde::{Deserialize, Serialize};

use crate::config::{AudioFormat, VideoFormat};

/// Concrete negotiated video format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMediaType {
    pub format: VideoFormat,
    pub width: i32,
    pub height: i32,
    /// Frame interval in 100ns units.
    pub frame_interval: i64,
}

/// Concrete negotiated audio format, including the derived wave-format
/// fields downstream negotiation reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMediaType {
    pub format: AudioFormat,
    pub sample_rate: u32,
    pub channels: u32,
    pub bits_per_sample: u16,
    pub block_align: u32,
    pub avg_bytes_per_sec: u32,
}

impl AudioMediaType {
    /// Recompute the derived fields after channels or rate change.
    ///
    /// Order matters: block alignment first, then average bytes per second,
    /// since the latter is derived from the former.
    pub fn recompute_derived(&mut self) {
        self.block_align = u32::from(self.bits_per_sample) * self.channels / 8;
        self.avg_bytes_per_sec = self.sample_rate * self.block_align;
    }
}

/// The negotiated format for one attached stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Video(VideoMediaType),
    Audio(AudioMediaType),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_wave_fields_follow_channels_then_rate() {
        let mut mt = AudioMediaType {
            format: AudioFormat::Wave16Bit,
            sample_rate: 48000,
            channels: 2,
            bits_per_sample: 16,
            block_align: 0,
            avg_bytes_per_sec: 0,
        };
        mt.recompute_derived();
        assert_eq!(mt.block_align, 16 * 2 / 8);
        assert_eq!(mt.avg_bytes_per_sec, 48000 * 4);

        mt.channels = 1;
        mt.sample_rate = 44100;
        mt.recompute_derived();
        assert_eq!(mt.block_align, 2);
        assert_eq!(mt.avg_bytes_per_sec, 88200);
    }
}
