//! Capture sink: the callback adapter between the graph engine's sample
//! delivery and the caller's frame callbacks.
//!
//! The adapter performs no buffering or queueing. Each sample is forwarded
//! synchronously on the engine's delivery thread; the registered callback
//! must not block indefinitely or it will stall capture.

use parking_lot::Mutex;

use crate::graph::StreamCategory;

/// One delivered media sample. Data and timestamp retrieval are fallible,
/// mirroring engines whose samples can hand back neither.
pub trait MediaSample {
    fn data(&self) -> Option<&[u8]>;
    /// `(start, stop)` timestamps in 100ns units.
    fn timestamps(&self) -> Option<(i64, i64)>;
}

/// Caller-registered per-stream frame callback:
/// `(buffer, start_time, stop_time)`.
pub type SampleCallback = Box<dyn FnMut(&[u8], i64, i64) + Send>;

/// Receives raw samples for one stream and forwards them to the registered
/// callback, if any.
pub struct CaptureSink {
    stream: StreamCategory,
    callback: Mutex<Option<SampleCallback>>,
}

impl CaptureSink {
    pub fn new(stream: StreamCategory) -> Self {
        Self {
            stream,
            callback: Mutex::new(None),
        }
    }

    pub fn stream(&self) -> StreamCategory {
        self.stream
    }

    /// Register or replace the callback; `None` unregisters.
    pub fn set_callback(&self, callback: Option<SampleCallback>) {
        *self.callback.lock() = callback;
    }

    /// Forward one sample. Zero-length buffers, failed data/timestamp
    /// retrieval, and samples arriving with no registered callback are
    /// dropped silently.
    pub fn deliver(&self, sample: &dyn MediaSample) {
        let mut slot = self.callback.lock();
        let Some(callback) = slot.as_mut() else {
            return;
        };

        let Some(data) = sample.data() else {
            return;
        };
        if data.is_empty() {
            return;
        }

        let Some((start, stop)) = sample.timestamps() else {
            return;
        };

        callback(data, start, stop);
    }
}

impl std::fmt::Debug for CaptureSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSink")
            .field("stream", &self.stream)
            .field("has_callback", &self.callback.lock().is_some())
            .finish()
    }
}
