//! Graph-construction engine interface and connection strategies.
//!
//! The engine that actually builds and links the processing pipeline is an
//! external collaborator; the session drives it through this trait. Stream
//! connection is an ordered walk over [`CONNECT_STRATEGIES`]: the engine's
//! automatic best-path routing first, then a direct pin-to-pin connect as
//! fallback, so adding further strategies is a list edit rather than another
//! nested conditional.

use std::sync::Arc;

use thiserror::Error;

use crate::enumerate::FilterHandle;
use crate::error::CaptureError;
use crate::media_type::MediaType;
use crate::sink::CaptureSink;

/// Which stream a pin/connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCategory {
    Video,
    Audio,
}

impl StreamCategory {
    pub fn label(self) -> &'static str {
        match self {
            StreamCategory::Video => "video",
            StreamCategory::Audio => "audio",
        }
    }
}

/// Handle for a sink attached to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkId(pub u64);

/// Failure from the engine's run primitive.
///
/// Exclusive-access conflicts are distinguished from everything else so the
/// session can surface them as their own start outcome.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("device already in use")]
    DeviceInUse,
    #[error("engine run failed (code {0})")]
    Engine(i32),
}

/// One way to wire a source filter to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStrategy {
    /// Engine picks the best route, inserting intermediary filters as needed.
    AutoRender,
    /// Connect the exact output pin to the exact sink pin.
    ExactPin,
}

/// Strategies in the order the session tries them.
pub const CONNECT_STRATEGIES: &[ConnectStrategy] =
    &[ConnectStrategy::AutoRender, ConnectStrategy::ExactPin];

pub trait GraphEngine {
    fn add_filter(&mut self, filter: &FilterHandle) -> Result<(), CaptureError>;

    /// Detach a filter. Unknown handles are ignored.
    fn remove_filter(&mut self, filter: &FilterHandle);

    /// Attach a sample sink; the engine delivers samples to it on its own
    /// delivery thread(s) once the stream runs.
    fn add_sink(&mut self, sink: Arc<CaptureSink>) -> SinkId;

    /// Detach a sink. Unknown ids are ignored.
    fn remove_sink(&mut self, sink: SinkId);

    /// Automatic best-path connection from `source` to `sink`.
    fn auto_render(
        &mut self,
        category: StreamCategory,
        media_type: &MediaType,
        source: &FilterHandle,
        sink: SinkId,
    ) -> Result<(), CaptureError>;

    /// Direct connection between the exact capture pin and the sink pin.
    fn connect_exact_pin(
        &mut self,
        category: StreamCategory,
        media_type: &MediaType,
        source: &FilterHandle,
        sink: SinkId,
    ) -> Result<(), CaptureError>;

    /// Start the capture run loop.
    fn run(&mut self) -> Result<(), RunError>;

    /// Halt the run loop; blocks until delivery has stopped.
    fn stop(&mut self);

    /// Names of the filters currently in the graph (diagnostic only).
    fn filter_names(&self) -> Vec<String>;
}
