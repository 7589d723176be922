//! In-process loopback backend.
//!
//! A synthetic enumerator and graph engine implementing the consumed
//! interfaces without any platform capture stack: the enumerator advertises
//! a fixed camera and microphone, and the engine delivers test-pattern
//! samples from its own thread once run. Used by end-to-end tests and the
//! probe tool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::caps::{AudioCaps, VideoCaps};
use crate::config::{AudioFormat, DeviceId, VideoFormat};
use crate::enumerate::{DeviceClass, DeviceDescriptor, DeviceEnumerator, FilterHandle};
use crate::error::CaptureError;
use crate::graph::{GraphEngine, RunError, SinkId, StreamCategory};
use crate::media_type::{AudioMediaType, MediaType, VideoMediaType};
use crate::sink::{CaptureSink, MediaSample};

pub const LOOPBACK_CAMERA: &str = "Loopback Camera";
pub const LOOPBACK_MICROPHONE: &str = "Loopback Microphone";

// ============================================================================
// Enumerator
// ============================================================================

/// Enumerator over the two built-in loopback devices.
pub struct LoopbackEnumerator;

impl LoopbackEnumerator {
    fn devices(class: DeviceClass) -> Vec<DeviceDescriptor> {
        match class {
            DeviceClass::VideoInput => vec![DeviceDescriptor {
                handle: FilterHandle {
                    id: 1,
                    name: LOOPBACK_CAMERA.into(),
                },
                name: LOOPBACK_CAMERA.into(),
                path: "loopback://video0".into(),
            }],
            DeviceClass::AudioInput => vec![DeviceDescriptor {
                handle: FilterHandle {
                    id: 2,
                    name: LOOPBACK_MICROPHONE.into(),
                },
                name: LOOPBACK_MICROPHONE.into(),
                path: "loopback://audio0".into(),
            }],
        }
    }
}

impl DeviceEnumerator for LoopbackEnumerator {
    fn enumerate_devices(
        &self,
        class: DeviceClass,
        visit: &mut dyn FnMut(&DeviceDescriptor) -> bool,
    ) -> Result<(), CaptureError> {
        for descriptor in Self::devices(class) {
            if !visit(&descriptor) {
                break;
            }
        }
        Ok(())
    }

    fn resolve_device_filter(
        &self,
        class: DeviceClass,
        id: &DeviceId,
    ) -> Result<FilterHandle, CaptureError> {
        let mut found = None;
        // Name takes precedence over path when both are given.
        for descriptor in Self::devices(class) {
            let by_name = id.name.as_deref() == Some(descriptor.name.as_str());
            let by_path = id.path.as_deref() == Some(descriptor.path.as_str());
            if by_name || (found.is_none() && by_path) {
                found = Some(descriptor.handle);
                if by_name {
                    break;
                }
            }
        }

        found.ok_or_else(|| CaptureError::DeviceNotFound {
            class: class.label(),
            name: id.name.clone().unwrap_or_default(),
            path: id.path.clone().unwrap_or_default(),
        })
    }

    fn video_caps(&self, filter: &FilterHandle) -> Result<Vec<VideoCaps>, CaptureError> {
        if filter.name != LOOPBACK_CAMERA {
            return Err(CaptureError::PinNotFound("video"));
        }
        Ok(vec![
            VideoCaps {
                format: VideoFormat::Yuy2,
                min_width: 320,
                max_width: 1920,
                min_height: 240,
                max_height: 1080,
                min_interval: 166666,  // 60 fps
                max_interval: 1000000, // 10 fps
                granularity_x: 2,
                granularity_y: 2,
                native_width: 1280,
                native_height: 720,
                native_interval: 333333,
            }
            .normalized(),
            VideoCaps {
                format: VideoFormat::Nv12,
                min_width: 0,
                max_width: 0,
                min_height: 0,
                max_height: 0,
                min_interval: 333333,
                max_interval: 333333,
                granularity_x: 0,
                granularity_y: 0,
                native_width: 1920,
                native_height: 1080,
                native_interval: 333333,
            }
            .normalized(),
        ])
    }

    fn audio_caps(&self, filter: &FilterHandle) -> Result<Vec<AudioCaps>, CaptureError> {
        if filter.name != LOOPBACK_MICROPHONE && filter.name != LOOPBACK_CAMERA {
            return Err(CaptureError::PinNotFound("audio"));
        }
        Ok(vec![AudioCaps {
            format: AudioFormat::Wave16Bit,
            min_channels: 1,
            max_channels: 2,
            channels_granularity: 1,
            min_sample_rate: 8000,
            max_sample_rate: 48000,
            sample_rate_granularity: 1,
            native_channels: 2,
            native_rate: 48000,
        }
        .normalized()])
    }

    fn default_video_media_type(
        &self,
        filter: &FilterHandle,
    ) -> Result<VideoMediaType, CaptureError> {
        if filter.name != LOOPBACK_CAMERA {
            return Err(CaptureError::PinNotFound("video"));
        }
        Ok(VideoMediaType {
            format: VideoFormat::Yuy2,
            width: 1280,
            height: 720,
            frame_interval: 333333,
        })
    }

    fn default_audio_media_type(
        &self,
        filter: &FilterHandle,
    ) -> Result<AudioMediaType, CaptureError> {
        if filter.name != LOOPBACK_MICROPHONE && filter.name != LOOPBACK_CAMERA {
            return Err(CaptureError::PinNotFound("audio"));
        }
        let mut mt = AudioMediaType {
            format: AudioFormat::Wave16Bit,
            sample_rate: 48000,
            channels: 2,
            bits_per_sample: 16,
            block_align: 0,
            avg_bytes_per_sec: 0,
        };
        mt.recompute_derived();
        Ok(mt)
    }
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Clone)]
struct Connection {
    media_type: MediaType,
    sink: Arc<CaptureSink>,
}

struct EngineState {
    filters: Vec<FilterHandle>,
    sinks: Vec<(SinkId, Arc<CaptureSink>)>,
    connections: Vec<Connection>,
    next_sink_id: u64,
    worker: Option<thread::JoinHandle<()>>,
    /// Armed by tests to simulate an exclusive-access conflict.
    fail_run_in_use: bool,
}

struct EngineShared {
    state: Mutex<EngineState>,
    running: AtomicBool,
}

/// Graph engine that "captures" by synthesizing samples on its own delivery
/// thread. Clones share the same underlying engine.
#[derive(Clone)]
pub struct LoopbackEngine {
    shared: Arc<EngineShared>,
}

impl Default for LoopbackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackEngine {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(EngineShared {
                state: Mutex::new(EngineState {
                    filters: Vec::new(),
                    sinks: Vec::new(),
                    connections: Vec::new(),
                    next_sink_id: 0,
                    worker: None,
                    fail_run_in_use: false,
                }),
                running: AtomicBool::new(false),
            }),
        }
    }

    /// Make the next `run()` fail as if the device were claimed elsewhere.
    pub fn fail_next_run_in_use(&self) {
        self.shared.state.lock().fail_run_in_use = true;
    }

    fn delivery_loop(shared: Arc<EngineShared>, connections: Vec<Connection>) {
        let tick = connections
            .iter()
            .filter_map(|c| match &c.media_type {
                MediaType::Video(v) => Some(v.frame_interval),
                MediaType::Audio(_) => None,
            })
            .min()
            .unwrap_or(333333);

        let mut now_100ns: i64 = 0;
        while shared.running.load(Ordering::SeqCst) {
            for connection in &connections {
                let data = synthesize(&connection.media_type, tick);
                let sample = LoopbackSample {
                    data,
                    start: now_100ns,
                    stop: now_100ns + tick,
                };
                connection.sink.deliver(&sample);
            }

            now_100ns += tick;
            thread::sleep(Duration::from_nanos(tick as u64 * 100));
        }
    }
}

/// Bytes of one synthetic sample for the negotiated format.
fn synthesize(media_type: &MediaType, tick_100ns: i64) -> Vec<u8> {
    match media_type {
        MediaType::Video(v) => {
            let pixels = v.width as usize * v.height as usize;
            let len = match v.format {
                VideoFormat::Xrgb | VideoFormat::Argb => pixels * 4,
                VideoFormat::Nv12 | VideoFormat::I420 => pixels * 3 / 2,
                _ => pixels * 2,
            };
            // Mid-grey test pattern.
            vec![0x80; len]
        }
        MediaType::Audio(a) => {
            let samples = (i64::from(a.sample_rate) * tick_100ns / 10_000_000) as usize;
            vec![0; samples.max(1) * a.block_align as usize]
        }
    }
}

struct LoopbackSample {
    data: Vec<u8>,
    start: i64,
    stop: i64,
}

impl MediaSample for LoopbackSample {
    fn data(&self) -> Option<&[u8]> {
        Some(&self.data)
    }

    fn timestamps(&self) -> Option<(i64, i64)> {
        Some((self.start, self.stop))
    }
}

impl GraphEngine for LoopbackEngine {
    fn add_filter(&mut self, filter: &FilterHandle) -> Result<(), CaptureError> {
        let mut state = self.shared.state.lock();
        if !state.filters.contains(filter) {
            state.filters.push(filter.clone());
        }
        Ok(())
    }

    fn remove_filter(&mut self, filter: &FilterHandle) {
        let mut state = self.shared.state.lock();
        state.filters.retain(|f| f != filter);
        // Connections sourced from the filter die with it.
        state.connections.clear();
    }

    fn add_sink(&mut self, sink: Arc<CaptureSink>) -> SinkId {
        let mut state = self.shared.state.lock();
        state.next_sink_id += 1;
        let id = SinkId(state.next_sink_id);
        state.sinks.push((id, sink));
        id
    }

    fn remove_sink(&mut self, sink: SinkId) {
        let mut state = self.shared.state.lock();
        state.sinks.retain(|(id, _)| *id != sink);
    }

    fn auto_render(
        &mut self,
        category: StreamCategory,
        media_type: &MediaType,
        source: &FilterHandle,
        sink: SinkId,
    ) -> Result<(), CaptureError> {
        // The loopback path has a single route, so auto-render and
        // exact-pin connect are the same wiring.
        self.connect_exact_pin(category, media_type, source, sink)
    }

    fn connect_exact_pin(
        &mut self,
        category: StreamCategory,
        media_type: &MediaType,
        source: &FilterHandle,
        sink: SinkId,
    ) -> Result<(), CaptureError> {
        let mut state = self.shared.state.lock();

        if !state.filters.contains(source) {
            return Err(CaptureError::Engine {
                code: -1,
                context: format!("source filter '{}' not in graph", source.name),
            });
        }
        let Some((_, sink)) = state.sinks.iter().find(|(id, _)| *id == sink) else {
            return Err(CaptureError::PinNotFound(category.label()));
        };

        let connection = Connection {
            media_type: media_type.clone(),
            sink: Arc::clone(sink),
        };
        state.connections.push(connection);
        Ok(())
    }

    fn run(&mut self) -> Result<(), RunError> {
        let connections = {
            let mut state = self.shared.state.lock();
            if state.fail_run_in_use {
                state.fail_run_in_use = false;
                return Err(RunError::DeviceInUse);
            }
            state.connections.clone()
        };

        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Err(RunError::Engine(-2));
        }

        let shared = Arc::clone(&self.shared);
        let worker = thread::spawn(move || LoopbackEngine::delivery_loop(shared, connections));
        self.shared.state.lock().worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        let worker = self.shared.state.lock().worker.take();
        if let Some(worker) = worker {
            let _ = worker.join();
        }
    }

    fn filter_names(&self) -> Vec<String> {
        self.shared
            .state
            .lock()
            .filters
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }
}
