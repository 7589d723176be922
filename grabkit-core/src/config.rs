//! Caller-facing capture configuration.
//!
//! Configs are plain value objects. The session mutates them in place during
//! `set_video_config`/`set_audio_config` so the caller can inspect the same
//! object afterwards to learn what was actually negotiated.

use serde::{Deserialize, Serialize};

// ============================================================================
// Formats
// ============================================================================

/// Video pixel/bitstream formats a capture pin can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoFormat {
    /// Wildcard: accept whatever the device offers.
    Any,
    Xrgb,
    Argb,
    Yuy2,
    Yvyu,
    Uyvy,
    Nv12,
    I420,
    MJpeg,
    H264,
    Unknown,
}

/// Audio sample formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioFormat {
    /// Wildcard: accept whatever the device offers.
    Any,
    Wave16Bit,
    WaveFloat,
    Unknown,
}

impl AudioFormat {
    /// Sample width in bits; zero for `Any`/`Unknown`.
    pub fn bits_per_sample(self) -> u16 {
        match self {
            AudioFormat::Wave16Bit => 16,
            AudioFormat::WaveFloat => 32,
            AudioFormat::Any | AudioFormat::Unknown => 0,
        }
    }
}

/// How audio should be routed out of the device.
///
/// Only `Capture` is implemented; the reserved modes are accepted at the type
/// level and rejected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioMode {
    Capture,
    DirectSound,
    WaveOut,
}

// ============================================================================
// Device identity
// ============================================================================

/// Device selection by friendly name and/or system path.
///
/// When both are set and ambiguous, name takes precedence (enumerator
/// contract).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceId {
    pub name: Option<String>,
    pub path: Option<String>,
}

impl DeviceId {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            path: None,
        }
    }

    pub fn by_path(path: impl Into<String>) -> Self {
        Self {
            name: None,
            path: Some(path.into()),
        }
    }

    /// True when neither name nor path selects anything.
    pub fn is_empty(&self) -> bool {
        self.name.as_deref().map_or(true, str::is_empty)
            && self.path.as_deref().map_or(true, str::is_empty)
    }
}

// ============================================================================
// Stream configs
// ============================================================================

/// Requested (and, after negotiation, actual) video stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Requested width in pixels.
    pub width: i32,
    /// Requested height in pixels.
    pub height: i32,
    /// Requested frame interval in 100ns units (e.g. 333333 for ~30fps).
    pub frame_interval: i64,
    /// Format delivered to the caller.
    pub format: VideoFormat,
    /// Format negotiated on the device pin; `Any` means no constraint.
    pub internal_format: VideoFormat,
    /// Device selection.
    pub device: DeviceId,
    /// Use the pin's current default format verbatim, skipping negotiation.
    pub use_default_config: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            frame_interval: 0,
            format: VideoFormat::Any,
            internal_format: VideoFormat::Any,
            device: DeviceId::default(),
            use_default_config: false,
        }
    }
}

/// Requested (and, after negotiation, actual) audio stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Requested channel count.
    pub channels: u32,
    pub format: AudioFormat,
    /// Device selection; ignored when `use_video_device` is set.
    pub device: DeviceId,
    /// Capture audio from the video device's built-in audio pin.
    pub use_video_device: bool,
    pub mode: AudioMode,
    /// Use the pin's current default format verbatim, skipping negotiation.
    pub use_default_config: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 0,
            channels: 0,
            format: AudioFormat::Any,
            device: DeviceId::default(),
            use_video_device: false,
            mode: AudioMode::Capture,
            use_default_config: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_device_id() {
        assert!(DeviceId::default().is_empty());
        assert!(DeviceId {
            name: Some(String::new()),
            path: Some(String::new()),
        }
        .is_empty());
        assert!(!DeviceId::by_name("Webcam").is_empty());
        assert!(!DeviceId::by_path(r"\\?\usb#vid_046d").is_empty());
    }

    #[test]
    fn audio_format_sample_widths() {
        assert_eq!(AudioFormat::Wave16Bit.bits_per_sample(), 16);
        assert_eq!(AudioFormat::WaveFloat.bits_per_sample(), 32);
        assert_eq!(AudioFormat::Any.bits_per_sample(), 0);
    }
}
