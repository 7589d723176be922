//! # Grabkit Probe
//!
//! Smoke tool for the capture stack: lists devices, negotiates a format,
//! and runs a short capture against the loopback backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;

use grabkit_core::config::{AudioConfig, DeviceId, VideoConfig};
use grabkit_core::enumerate::{DeviceClass, DeviceEnumerator};
use grabkit_core::error::StartResult;
use grabkit_core::loopback::{LoopbackEngine, LoopbackEnumerator, LOOPBACK_CAMERA, LOOPBACK_MICROPHONE};
use grabkit_core::session::CaptureSession;
use grabkit_core::subsystem;

#[derive(Clone, Copy)]
struct ProbeOptions {
    list_only: bool,
    json: bool,
}

impl ProbeOptions {
    fn from_args(args: &[String]) -> Self {
        Self {
            list_only: args.iter().any(|arg| arg == "--list"),
            json: args.iter().any(|arg| arg == "--json"),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grabkit=debug".into()),
        )
        .init();

    tracing::info!("Grabkit Probe v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().collect();
    let options = ProbeOptions::from_args(&args);

    subsystem::init_capture_subsystem();

    let enumerator = LoopbackEnumerator;
    list_devices(&enumerator, options)?;

    if !options.list_only {
        run_capture()?;
    }

    subsystem::shutdown_capture_subsystem();
    Ok(())
}

fn list_devices(enumerator: &dyn DeviceEnumerator, options: ProbeOptions) -> Result<()> {
    for class in [DeviceClass::VideoInput, DeviceClass::AudioInput] {
        println!("{} devices:", class.label());
        let mut result = Ok(());
        enumerator.enumerate_devices(class, &mut |descriptor| {
            if options.json {
                match serde_json::to_string(&serde_json::json!({
                    "name": descriptor.name,
                    "path": descriptor.path,
                })) {
                    Ok(line) => println!("  {line}"),
                    Err(err) => result = Err(err),
                }
            } else {
                println!("  {} ({})", descriptor.name, descriptor.path);
            }
            true
        })?;
        result?;
    }
    Ok(())
}

fn run_capture() -> Result<()> {
    let engine = LoopbackEngine::new();
    let mut session = CaptureSession::new(Box::new(engine), Box::new(LoopbackEnumerator));
    session.create_graph()?;

    let mut video = VideoConfig {
        width: 640,
        height: 480,
        frame_interval: 333333,
        device: DeviceId::by_name(LOOPBACK_CAMERA),
        ..Default::default()
    };
    session.set_video_config(Some(&mut video))?;
    tracing::info!(
        "negotiated video: {}x{} @ {} (format {:?})",
        video.width,
        video.height,
        video.frame_interval,
        video.format
    );

    let mut audio = AudioConfig {
        sample_rate: 48000,
        channels: 2,
        device: DeviceId::by_name(LOOPBACK_MICROPHONE),
        ..Default::default()
    };
    session.set_audio_config(Some(&mut audio))?;
    tracing::info!(
        "negotiated audio: {} Hz / {} ch (format {:?})",
        audio.sample_rate,
        audio.channels,
        audio.format
    );

    let video_frames = Arc::new(AtomicU64::new(0));
    let audio_packets = Arc::new(AtomicU64::new(0));
    {
        let frames = Arc::clone(&video_frames);
        session.set_video_callback(Some(Box::new(move |_, _, _| {
            frames.fetch_add(1, Ordering::Relaxed);
        })));
        let packets = Arc::clone(&audio_packets);
        session.set_audio_callback(Some(Box::new(move |_, _, _| {
            packets.fetch_add(1, Ordering::Relaxed);
        })));
    }

    session.connect_filters()?;

    match session.start() {
        StartResult::Success => {}
        StartResult::DeviceInUse => anyhow::bail!("device already in use"),
        StartResult::Error => anyhow::bail!("failed to start capture"),
    }

    thread::sleep(Duration::from_millis(500));
    session.stop();

    println!(
        "captured {} video frames, {} audio packets in 500ms",
        video_frames.load(Ordering::Relaxed),
        audio_packets.load(Ordering::Relaxed)
    );
    Ok(())
}
