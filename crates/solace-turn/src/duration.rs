//! Format-aware audio duration probing.
//!
//! WAV durations come straight from the container (frame count / sample
//! rate). Everything else goes through symphonia's demuxer. Probing is
//! allowed to fail: `None` means "duration unknown" and the caller skips
//! the duration bound rather than rejecting the turn.

use std::path::Path;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Measures the duration of an audio file in seconds, if it can be
/// determined.
pub fn probe_duration(path: &Path) -> Option<f64> {
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    let duration = if is_wav {
        probe_wav(path)
    } else {
        probe_demuxed(path)
    };

    if duration.is_none() {
        tracing::warn!(path = %path.display(), "failed to determine audio duration");
    }
    duration
}

/// Container-level WAV probe: frames / sample rate, no decode.
fn probe_wav(path: &Path) -> Option<f64> {
    let reader = hound::WavReader::open(path).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return None;
    }
    Some(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}

/// Demuxer-based probe for every other format.
fn probe_demuxed(path: &Path) -> Option<f64> {
    let file = std::fs::File::open(path).ok()?;
    let stream = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;

    let mut format = probed.format;
    let track = format.default_track()?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    if let (Some(frames), Some(rate)) = (params.n_frames, params.sample_rate) {
        return Some(frames as f64 / f64::from(rate));
    }

    // The container does not declare a frame count (common for MP3):
    // walk the packets and take the final timestamp.
    let time_base = params.time_base?;
    let mut end_ts = 0u64;
    while let Ok(packet) = format.next_packet() {
        if packet.track_id() == track_id {
            end_ts = packet.ts() + packet.dur();
        }
    }
    if end_ts == 0 {
        return None;
    }
    let time = time_base.calc_time(end_ts);
    Some(time.seconds as f64 + time.frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, seconds: u32, sample_rate: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..seconds * sample_rate {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn wav_duration_from_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_wav(&path, 5, 16_000);

        let duration = probe_duration(&path).unwrap();
        assert!((duration - 5.0).abs() < 0.01, "got {duration}");
    }

    #[test]
    fn unreadable_file_yields_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"this is not audio").unwrap();

        assert_eq!(probe_duration(&path), None);
    }

    #[test]
    fn missing_file_yields_unknown() {
        assert_eq!(probe_duration(Path::new("/nonexistent/clip.wav")), None);
    }
}
