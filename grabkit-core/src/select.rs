//! Closest-capability matching.
//!
//! Given a requested configuration and the capability descriptors a device
//! advertises, pick the descriptor minimizing a summed per-dimension deficit
//! and synthesize a concrete media type from it.
//!
//! A deficit is the non-negative distance of a requested value outside a
//! descriptor's range on one dimension; zero when the request lies inside.
//! The first descriptor seen wins ties (strict improvement required to
//! replace), preserving enumeration-order determinism, and a total deficit of
//! zero stops the walk early since a perfect match cannot be improved.

use crate::caps::{clamp_to_granularity, AudioCaps, VideoCaps};
use crate::config::{AudioConfig, AudioFormat, VideoConfig, VideoFormat};
use crate::media_type::{AudioMediaType, VideoMediaType};

fn deficit_i64(requested: i64, min: i64, max: i64) -> i64 {
    if requested < min {
        min - requested
    } else if requested > max {
        requested - max
    } else {
        0
    }
}

/// Find the closest advertised video format to the request.
///
/// Returns `None` when no descriptor is compatible with the requested
/// internal format.
pub fn closest_video<I>(config: &VideoConfig, caps: I) -> Option<VideoMediaType>
where
    I: IntoIterator<Item = VideoCaps>,
{
    let mut best: Option<(i64, VideoMediaType)> = None;

    for info in caps {
        let info = info.normalized();

        if config.internal_format != VideoFormat::Any
            && config.internal_format != info.format
        {
            continue;
        }

        let x_val = deficit_i64(
            config.width.into(),
            info.min_width.into(),
            info.max_width.into(),
        );
        let y_val = deficit_i64(
            config.height.into(),
            info.min_height.into(),
            info.max_height.into(),
        );
        let frame_val =
            deficit_i64(config.frame_interval, info.min_interval, info.max_interval);

        let total_val = x_val + y_val + frame_val;

        if best.as_ref().is_some_and(|(b, _)| *b <= total_val) {
            continue;
        }

        let width = if x_val == 0 {
            clamp_to_granularity(
                config.width.into(),
                info.min_width.into(),
                info.granularity_x.into(),
            ) as i32
        } else if i64::from(config.width) < i64::from(info.min_width) {
            info.min_width
        } else {
            info.max_width
        };

        let height = if y_val == 0 {
            clamp_to_granularity(
                config.height.into(),
                info.min_height.into(),
                info.granularity_y.into(),
            ) as i32
        } else if i64::from(config.height) < i64::from(info.min_height) {
            info.min_height
        } else {
            info.max_height
        };

        let frame_interval = if frame_val == 0 {
            config.frame_interval
        } else if config.frame_interval < info.min_interval {
            info.min_interval
        } else {
            info.max_interval
        };

        tracing::trace!(
            format = ?info.format,
            total_val,
            width,
            height,
            frame_interval,
            "video candidate"
        );

        best = Some((
            total_val,
            VideoMediaType {
                format: info.format,
                width,
                height,
                frame_interval,
            },
        ));

        if total_val == 0 {
            break;
        }
    }

    best.map(|(_, mt)| mt)
}

/// Find the closest advertised audio format to the request.
///
/// Same deficit/tie-break/early-exit discipline as video, over sample rate
/// and channel count. The derived wave fields are recomputed after
/// resolution, block alignment first.
pub fn closest_audio<I>(config: &AudioConfig, caps: I) -> Option<AudioMediaType>
where
    I: IntoIterator<Item = AudioCaps>,
{
    let mut best: Option<(i64, AudioMediaType)> = None;

    for info in caps {
        let info = info.normalized();

        if config.format != AudioFormat::Any && config.format != info.format {
            continue;
        }

        let rate_val = deficit_i64(
            config.sample_rate.into(),
            info.min_sample_rate.into(),
            info.max_sample_rate.into(),
        );
        let channels_val = deficit_i64(
            config.channels.into(),
            info.min_channels.into(),
            info.max_channels.into(),
        );

        let total_val = rate_val + channels_val;

        if best.as_ref().is_some_and(|(b, _)| *b <= total_val) {
            continue;
        }

        let channels = if channels_val == 0 {
            clamp_to_granularity(
                config.channels.into(),
                info.min_channels.into(),
                info.channels_granularity.into(),
            ) as u32
        } else if config.channels < info.min_channels {
            info.min_channels
        } else {
            info.max_channels
        };

        let sample_rate = if rate_val == 0 {
            clamp_to_granularity(
                config.sample_rate.into(),
                info.min_sample_rate.into(),
                info.sample_rate_granularity.into(),
            ) as u32
        } else if config.sample_rate < info.min_sample_rate {
            info.min_sample_rate
        } else {
            info.max_sample_rate
        };

        let mut mt = AudioMediaType {
            format: info.format,
            sample_rate,
            channels,
            bits_per_sample: info.format.bits_per_sample(),
            block_align: 0,
            avg_bytes_per_sec: 0,
        };
        mt.recompute_derived();

        tracing::trace!(format = ?info.format, total_val, sample_rate, channels, "audio candidate");

        best = Some((total_val, mt));

        if total_val == 0 {
            break;
        }
    }

    best.map(|(_, mt)| mt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceId;

    fn video_caps(
        format: VideoFormat,
        width: (i32, i32),
        height: (i32, i32),
        interval: (i64, i64),
        granularity: (i32, i32),
    ) -> VideoCaps {
        VideoCaps {
            format,
            min_width: width.0,
            max_width: width.1,
            min_height: height.0,
            max_height: height.1,
            min_interval: interval.0,
            max_interval: interval.1,
            granularity_x: granularity.0,
            granularity_y: granularity.1,
            native_width: width.1,
            native_height: height.1,
            native_interval: interval.0,
        }
    }

    fn audio_caps(
        format: AudioFormat,
        channels: (u32, u32),
        rate: (u32, u32),
        rate_granularity: u32,
    ) -> AudioCaps {
        AudioCaps {
            format,
            min_channels: channels.0,
            max_channels: channels.1,
            channels_granularity: 1,
            min_sample_rate: rate.0,
            max_sample_rate: rate.1,
            sample_rate_granularity: rate_granularity,
            native_channels: channels.1,
            native_rate: rate.1,
        }
    }

    fn video_request(width: i32, height: i32, interval: i64) -> VideoConfig {
        VideoConfig {
            width,
            height,
            frame_interval: interval,
            device: DeviceId::by_name("cam"),
            ..Default::default()
        }
    }

    #[test]
    fn in_range_request_matches_exactly() {
        // 1920x1080 @ 30fps against 640-1920 x 480-1080 @ 15-60fps, step 8x8.
        let caps = video_caps(
            VideoFormat::Yuy2,
            (640, 1920),
            (480, 1080),
            (166666, 666666),
            (8, 8),
        );
        let mt = closest_video(&video_request(1920, 1080, 333333), [caps]).unwrap();
        assert_eq!(mt.width, 1920);
        assert_eq!(mt.height, 1080);
        assert_eq!(mt.frame_interval, 333333);
        assert_eq!(mt.format, VideoFormat::Yuy2);
    }

    #[test]
    fn zero_deficit_dimensions_snap_to_granularity() {
        let caps = video_caps(
            VideoFormat::Nv12,
            (640, 1920),
            (480, 1080),
            (166666, 666666),
            (16, 16),
        );
        // 1003 is inside the range but off the 16-step grid from 640.
        let mt = closest_video(&video_request(1003, 723, 333333), [caps]).unwrap();
        assert_eq!(mt.width, 992);
        assert_eq!(mt.height, 720);
    }

    #[test]
    fn out_of_range_clamps_to_nearest_boundary() {
        let caps = video_caps(
            VideoFormat::Yuy2,
            (640, 1280),
            (480, 720),
            (333333, 666666),
            (1, 1),
        );
        let mt = closest_video(&video_request(3840, 100, 333333), [caps]).unwrap();
        assert_eq!(mt.width, 1280);
        assert_eq!(mt.height, 480);
    }

    #[test]
    fn minimum_total_deficit_wins() {
        let far = video_caps(VideoFormat::Yuy2, (160, 320), (120, 240), (0, i64::MAX), (1, 1));
        let near = video_caps(VideoFormat::Yuy2, (640, 1280), (480, 720), (0, i64::MAX), (1, 1));
        let mt = closest_video(&video_request(1920, 1080, 0), [far, near]).unwrap();
        assert_eq!(mt.width, 1280);
        assert_eq!(mt.height, 720);
    }

    #[test]
    fn ties_keep_first_descriptor() {
        let first = video_caps(VideoFormat::Yuy2, (100, 200), (100, 200), (0, i64::MAX), (1, 1));
        let second = video_caps(VideoFormat::Nv12, (100, 200), (100, 200), (0, i64::MAX), (1, 1));
        let mt = closest_video(&video_request(300, 300, 0), [first, second]).unwrap();
        assert_eq!(mt.format, VideoFormat::Yuy2);
    }

    #[test]
    fn perfect_match_stops_enumeration() {
        let exact = video_caps(VideoFormat::Yuy2, (640, 1920), (480, 1080), (0, i64::MAX), (1, 1));
        // Consume through an iterator that counts how far the walk got.
        let mut seen = 0usize;
        let caps = vec![exact.clone(), exact.clone(), exact];
        let mt = closest_video(
            &video_request(1280, 720, 0),
            caps.into_iter().inspect(|_| seen += 1),
        )
        .unwrap();
        assert_eq!(mt.width, 1280);
        assert_eq!(seen, 1);
    }

    #[test]
    fn incompatible_format_yields_none() {
        let caps = video_caps(VideoFormat::Nv12, (640, 1920), (480, 1080), (0, i64::MAX), (1, 1));
        let mut request = video_request(1280, 720, 0);
        request.internal_format = VideoFormat::MJpeg;
        assert!(closest_video(&request, [caps]).is_none());
    }

    #[test]
    fn empty_capability_list_yields_none() {
        assert!(closest_video(&video_request(1280, 720, 0), []).is_none());
    }

    fn audio_request(rate: u32, channels: u32) -> AudioConfig {
        AudioConfig {
            sample_rate: rate,
            channels,
            format: AudioFormat::Any,
            device: DeviceId::by_name("mic"),
            ..Default::default()
        }
    }

    #[test]
    fn audio_request_above_range_clamps_down() {
        // 96kHz / 8ch against 8k-48kHz, 1-2ch, rate step 100.
        let caps = audio_caps(AudioFormat::Wave16Bit, (1, 2), (8000, 48000), 100);
        let mt = closest_audio(&audio_request(96000, 8), [caps]).unwrap();
        assert_eq!(mt.sample_rate, 48000);
        assert_eq!(mt.channels, 2);
    }

    #[test]
    fn channels_above_max_counts_as_deficit() {
        // Regression for the request-above-range channel case: the closer
        // 4-channel descriptor must beat the 2-channel one when 6 channels
        // are requested.
        let narrow = audio_caps(AudioFormat::Wave16Bit, (1, 2), (48000, 48000), 1);
        let wide = audio_caps(AudioFormat::Wave16Bit, (1, 4), (48000, 48000), 1);
        let mt = closest_audio(&audio_request(48000, 6), [narrow, wide]).unwrap();
        assert_eq!(mt.channels, 4);
    }

    #[test]
    fn audio_in_range_snaps_rate_to_granularity() {
        let caps = audio_caps(AudioFormat::WaveFloat, (1, 2), (8000, 48000), 100);
        let mt = closest_audio(&audio_request(44150, 2), [caps]).unwrap();
        assert_eq!(mt.sample_rate, 44100);
        assert_eq!(mt.channels, 2);
    }

    #[test]
    fn audio_derived_fields_recomputed() {
        let caps = audio_caps(AudioFormat::Wave16Bit, (1, 2), (8000, 48000), 1);
        let mt = closest_audio(&audio_request(48000, 2), [caps]).unwrap();
        assert_eq!(mt.bits_per_sample, 16);
        assert_eq!(mt.block_align, 4);
        assert_eq!(mt.avg_bytes_per_sec, 192000);
    }

    #[test]
    fn audio_format_mismatch_yields_none() {
        let caps = audio_caps(AudioFormat::WaveFloat, (1, 2), (8000, 48000), 1);
        let mut request = audio_request(48000, 2);
        request.format = AudioFormat::Wave16Bit;
        assert!(closest_audio(&request, [caps]).is_none());
    }
}
