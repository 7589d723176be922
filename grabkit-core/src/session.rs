//! Capture session state machine.
//!
//! A session owns the source filters and sink adapters for at most one video
//! and one audio stream, resolves requested configurations to concrete
//! formats through the enumerator and the closest-match selector, and drives
//! the graph engine through configure → connect → start/stop.
//!
//! Session control is single-threaded: operations are synchronous and carry
//! no internal locking; callers serialize access externally. Sample delivery
//! runs on the engine's own threads through the owned [`CaptureSink`]s.

use std::sync::Arc;

use crate::config::{AudioConfig, AudioMode, VideoConfig};
use crate::enumerate::{DeviceClass, DeviceEnumerator, FilterHandle};
use crate::error::{CaptureError, StartResult};
use crate::graph::{
    ConnectStrategy, GraphEngine, RunError, SinkId, StreamCategory, CONNECT_STRATEGIES,
};
use crate::media_type::MediaType;
use crate::select::{closest_audio, closest_video};
use crate::sink::{CaptureSink, SampleCallback};

/// One attached stream: the source filter, the engine-side sink attachment,
/// and the negotiated format. Exclusively owned by the session; torn down
/// before any replacement is attached.
struct StreamAttachment {
    filter: FilterHandle,
    /// False when the filter is borrowed from the video attachment
    /// (built-in audio); the video teardown owns its removal then.
    owns_filter: bool,
    sink_id: SinkId,
    media_type: MediaType,
}

pub struct CaptureSession {
    engine: Box<dyn GraphEngine>,
    enumerator: Box<dyn DeviceEnumerator>,
    initialized: bool,
    active: bool,
    video: Option<StreamAttachment>,
    audio: Option<StreamAttachment>,
    video_sink: Arc<CaptureSink>,
    audio_sink: Arc<CaptureSink>,
}

impl CaptureSession {
    pub fn new(engine: Box<dyn GraphEngine>, enumerator: Box<dyn DeviceEnumerator>) -> Self {
        Self {
            engine,
            enumerator,
            initialized: false,
            active: false,
            video: None,
            audio: None,
            video_sink: Arc::new(CaptureSink::new(StreamCategory::Video)),
            audio_sink: Arc::new(CaptureSink::new(StreamCategory::Audio)),
        }
    }

    // ------------------------------------------------------------------
    // Guards
    // ------------------------------------------------------------------

    fn ensure_initialized(&self, op: &'static str) -> Result<(), CaptureError> {
        if !self.initialized {
            tracing::error!("{op}: context not initialized");
            return Err(CaptureError::NotInitialized { op });
        }
        Ok(())
    }

    fn ensure_inactive(&self, op: &'static str) -> Result<(), CaptureError> {
        if self.active {
            tracing::error!("{op}: cannot be used while active");
            return Err(CaptureError::WrongState {
                op,
                actual: "active",
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Allocate graph resources: Uninitialized → Initialized.
    ///
    /// Calling this on an already-initialized session is a reported no-op
    /// failure, not fatal.
    pub fn create_graph(&mut self) -> Result<(), CaptureError> {
        if self.initialized {
            tracing::warn!("graph already created");
            return Err(CaptureError::AlreadyInitialized);
        }

        self.initialized = true;
        tracing::debug!("capture graph created");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    // ------------------------------------------------------------------
    // Callbacks
    // ------------------------------------------------------------------

    /// Register or replace the video-frame callback.
    pub fn set_video_callback(&self, callback: Option<SampleCallback>) {
        self.video_sink.set_callback(callback);
    }

    /// Register or replace the audio-frame callback.
    pub fn set_audio_callback(&self, callback: Option<SampleCallback>) {
        self.audio_sink.set_callback(callback);
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    fn teardown_video(&mut self) {
        if let Some(att) = self.video.take() {
            tracing::debug!(filter = %att.filter.name, "detaching video filter");
            self.engine.remove_filter(&att.filter);
            self.engine.remove_sink(att.sink_id);
        }
    }

    fn teardown_audio(&mut self) {
        if let Some(att) = self.audio.take() {
            tracing::debug!(filter = %att.filter.name, "detaching audio filter");
            if att.owns_filter {
                self.engine.remove_filter(&att.filter);
            }
            self.engine.remove_sink(att.sink_id);
        }
    }

    /// Configure (or, with `None`, clear) the video stream.
    ///
    /// Always tears down any existing video attachment first. On success the
    /// caller's config is updated in place with the negotiated result.
    pub fn set_video_config(
        &mut self,
        config: Option<&mut VideoConfig>,
    ) -> Result<(), CaptureError> {
        self.ensure_initialized("set_video_config")?;
        self.ensure_inactive("set_video_config")?;

        self.teardown_video();

        let Some(config) = config else {
            return Ok(());
        };

        if config.device.is_empty() {
            tracing::error!("no video device name or path specified");
            return Err(CaptureError::InvalidConfig(
                "no video device name or path specified".into(),
            ));
        }

        let filter = self
            .enumerator
            .resolve_device_filter(DeviceClass::VideoInput, &config.device)?;

        let mt = if config.use_default_config {
            self.enumerator.default_video_media_type(&filter)?
        } else {
            let caps = self.enumerator.video_caps(&filter)?;
            closest_video(config, caps).ok_or(CaptureError::NoCompatibleFormat {
                stream: StreamCategory::Video,
            })?
        };

        // Round-trip the negotiated result into the caller's config. When
        // the delivered format was tracking the internal one, keep them in
        // sync.
        let same = config.format == config.internal_format;
        config.width = mt.width;
        config.height = mt.height;
        config.frame_interval = mt.frame_interval;
        config.internal_format = mt.format;
        if same {
            config.format = mt.format;
        }

        tracing::info!(
            device = %filter.name,
            width = mt.width,
            height = mt.height,
            interval = mt.frame_interval,
            format = ?mt.format,
            "video stream configured"
        );

        self.engine.add_filter(&filter)?;
        let sink_id = self.engine.add_sink(Arc::clone(&self.video_sink));

        self.video = Some(StreamAttachment {
            filter,
            owns_filter: true,
            sink_id,
            media_type: MediaType::Video(mt),
        });
        Ok(())
    }

    /// Configure (or, with `None`, clear) the audio stream.
    ///
    /// `use_video_device` captures from the video device's built-in audio
    /// pin and requires a video stream to be configured first.
    pub fn set_audio_config(
        &mut self,
        config: Option<&mut AudioConfig>,
    ) -> Result<(), CaptureError> {
        self.ensure_initialized("set_audio_config")?;
        self.ensure_inactive("set_audio_config")?;

        self.teardown_audio();

        let Some(config) = config else {
            return Ok(());
        };

        if !config.use_video_device && config.device.is_empty() {
            tracing::error!("no audio device name or path specified");
            return Err(CaptureError::InvalidConfig(
                "no audio device name or path specified".into(),
            ));
        }

        let (filter, owns_filter) = if config.use_video_device {
            let Some(video) = &self.video else {
                tracing::error!(
                    "tried to use video device's built-in audio, \
                     but no video device is present"
                );
                return Err(CaptureError::VideoDeviceMissing);
            };
            (video.filter.clone(), false)
        } else {
            (
                self.enumerator
                    .resolve_device_filter(DeviceClass::AudioInput, &config.device)?,
                true,
            )
        };

        if config.mode != AudioMode::Capture {
            tracing::error!(mode = ?config.mode, "audio mode not implemented");
            return Err(CaptureError::Unsupported { what: "audio mode" });
        }

        let mt = if config.use_default_config {
            self.enumerator.default_audio_media_type(&filter)?
        } else {
            let caps = self.enumerator.audio_caps(&filter)?;
            closest_audio(config, caps).ok_or(CaptureError::NoCompatibleFormat {
                stream: StreamCategory::Audio,
            })?
        };

        config.sample_rate = mt.sample_rate;
        config.channels = mt.channels;
        config.format = mt.format;

        tracing::info!(
            device = %filter.name,
            sample_rate = mt.sample_rate,
            channels = mt.channels,
            format = ?mt.format,
            "audio stream configured"
        );

        if owns_filter {
            self.engine.add_filter(&filter)?;
        }
        let sink_id = self.engine.add_sink(Arc::clone(&self.audio_sink));

        self.audio = Some(StreamAttachment {
            filter,
            owns_filter,
            sink_id,
            media_type: MediaType::Audio(mt),
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Connection
    // ------------------------------------------------------------------

    /// Wire each configured stream to its sink, video then audio.
    ///
    /// Per stream, the connect strategies are tried in order until one
    /// succeeds. A failed video connection short-circuits audio.
    pub fn connect_filters(&mut self) -> Result<(), CaptureError> {
        self.ensure_initialized("connect_filters")?;
        self.ensure_inactive("connect_filters")?;

        if let Some(att) = &self.video {
            connect_stream(
                self.engine.as_mut(),
                StreamCategory::Video,
                &att.media_type,
                &att.filter,
                att.sink_id,
            )?;
        }

        if let Some(att) = &self.audio {
            connect_stream(
                self.engine.as_mut(),
                StreamCategory::Audio,
                &att.media_type,
                &att.filter,
                att.sink_id,
            )?;
        }

        for name in self.engine.filter_names() {
            tracing::debug!("loaded filter: {name}");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Run control
    // ------------------------------------------------------------------

    /// Start the capture run loop: Inactive → Active.
    ///
    /// An exclusive-access conflict is reported as its own outcome; on any
    /// failure the session stays inactive.
    pub fn start(&mut self) -> StartResult {
        if self.ensure_initialized("start").is_err() || self.ensure_inactive("start").is_err() {
            return StartResult::Error;
        }

        match self.engine.run() {
            Ok(()) => {
                self.active = true;
                tracing::info!("capture started");
                StartResult::Success
            }
            Err(RunError::DeviceInUse) => {
                tracing::warn!("run failed, device already in use");
                StartResult::DeviceInUse
            }
            Err(RunError::Engine(code)) => {
                tracing::warn!(code, "run failed");
                StartResult::Error
            }
        }
    }

    /// Halt the run loop: Active → Inactive. No-op when already inactive.
    pub fn stop(&mut self) {
        if self.active {
            self.engine.stop();
            self.active = false;
            tracing::info!("capture stopped");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.active {
            self.stop();
        }
    }
}

fn connect_stream(
    engine: &mut dyn GraphEngine,
    category: StreamCategory,
    media_type: &MediaType,
    filter: &FilterHandle,
    sink: SinkId,
) -> Result<(), CaptureError> {
    let mut last_err = CaptureError::PinNotFound(category.label());

    for strategy in CONNECT_STRATEGIES {
        let result = match strategy {
            ConnectStrategy::AutoRender => {
                engine.auto_render(category, media_type, filter, sink)
            }
            ConnectStrategy::ExactPin => {
                engine.connect_exact_pin(category, media_type, filter, sink)
            }
        };

        match result {
            Ok(()) => return Ok(()),
            Err(err) => {
                tracing::warn!(
                    stream = category.label(),
                    ?strategy,
                    %err,
                    "connect attempt failed, trying next strategy"
                );
                last_err = err;
            }
        }
    }

    Err(last_err)
}
