//! Device and capability enumeration interface.
//!
//! The session consumes an externally supplied enumerator that walks the
//! system-registered capture devices and yields capability descriptors for a
//! device's capture pin. Platform backends (DirectShow, V4L2, ...) live
//! behind this trait; [`crate::loopback`] provides an in-process one.

use crate::caps::{AudioCaps, VideoCaps};
use crate::config::DeviceId;
use crate::error::CaptureError;
use crate::media_type::{AudioMediaType, VideoMediaType};

/// Which system device class to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    VideoInput,
    AudioInput,
}

impl DeviceClass {
    pub fn label(self) -> &'static str {
        match self {
            DeviceClass::VideoInput => "video",
            DeviceClass::AudioInput => "audio",
        }
    }
}

/// Opaque handle to a resolved device filter.
///
/// Minted by the enumerator, interpreted by the graph engine; the session
/// only stores and forwards it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterHandle {
    pub id: u64,
    pub name: String,
}

/// One discovered device.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub handle: FilterHandle,
    pub name: String,
    pub path: String,
}

pub trait DeviceEnumerator {
    /// Invoke `visit` once per discovered device of `class`; `visit`
    /// returning `false` stops enumeration early.
    fn enumerate_devices(
        &self,
        class: DeviceClass,
        visit: &mut dyn FnMut(&DeviceDescriptor) -> bool,
    ) -> Result<(), CaptureError>;

    /// Resolve a device filter by name or path. Name takes precedence when
    /// both are given and ambiguous.
    fn resolve_device_filter(
        &self,
        class: DeviceClass,
        id: &DeviceId,
    ) -> Result<FilterHandle, CaptureError>;

    /// Capability descriptors of the filter's video capture pin.
    fn video_caps(&self, filter: &FilterHandle) -> Result<Vec<VideoCaps>, CaptureError>;

    /// Capability descriptors of the filter's audio capture pin.
    fn audio_caps(&self, filter: &FilterHandle) -> Result<Vec<AudioCaps>, CaptureError>;

    /// The video pin's current default format (used when the caller asks for
    /// the device default verbatim).
    fn default_video_media_type(
        &self,
        filter: &FilterHandle,
    ) -> Result<VideoMediaType, CaptureError>;

    /// The audio pin's current default format.
    fn default_audio_media_type(
        &self,
        filter: &FilterHandle,
    ) -> Result<AudioMediaType, CaptureError>;
}
