//! WAV decoding and encoding using hound
//!
//! Playback decodes whole files into mono f32 samples. Recording streams f32
//! samples into a writer that is finalized when capture stops.

use crate::media::CaptureFormat;
use chrono::{DateTime, Utc};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::{BufWriter, Cursor, Read};
use std::path::{Path, PathBuf};

/// Extension of every recording written by the capture backend
pub const RECORDING_EXTENSION: &str = "wav";

/// Decoded mono audio
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration(&self) -> f64 {
        duration_seconds(self.samples.len(), self.sample_rate)
    }
}

/// Decode a WAV file from disk
pub fn decode_file(path: impl AsRef<Path>) -> Result<DecodedAudio, String> {
    let reader = WavReader::open(path.as_ref())
        .map_err(|e| format!("Failed to open WAV file: {}", e))?;
    decode(reader)
}

/// Decode a WAV file held in memory
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedAudio, String> {
    let reader =
        WavReader::new(Cursor::new(bytes)).map_err(|e| format!("Failed to parse WAV data: {}", e))?;
    decode(reader)
}

fn decode<R: Read>(reader: WavReader<R>) -> Result<DecodedAudio, String> {
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(format!(
            "Unsupported WAV layout: {} channels at {}Hz",
            spec.channels, spec.sample_rate
        ));
    }

    let interleaved: Result<Vec<f32>, _> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect(),
        SampleFormat::Int => {
            // Convert integer samples to float
            let max_value = (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_value))
                .collect()
        }
    };
    let interleaved = interleaved.map_err(|e| format!("Failed to read samples: {}", e))?;

    Ok(DecodedAudio {
        samples: mix_to_mono(&interleaved, spec.channels as usize),
        sample_rate: spec.sample_rate,
    })
}

/// Average interleaved frames down to one channel
fn mix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Get duration of samples in seconds
pub fn duration_seconds(sample_count: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    sample_count as f64 / sample_rate as f64
}

/// Pick the file a new recording is written to
///
/// Named by ISO-8601 timestamp; an 8 character uuid suffix is added if a
/// recording with that name already exists.
pub fn recording_destination(dir: impl AsRef<Path>, now: DateTime<Utc>) -> PathBuf {
    let dir = dir.as_ref();
    let timestamp = now.format("%Y-%m-%dT%H:%M:%S%.3fZ");
    let path = dir.join(format!("{}.{}", timestamp, RECORDING_EXTENSION));
    if !path.exists() {
        return path;
    }

    let uuid = uuid::Uuid::new_v4().to_string()[..8].to_string();
    dir.join(format!("{}-{}.{}", timestamp, uuid, RECORDING_EXTENSION))
}

/// List all recordings in a directory, newest first
pub fn list_recordings(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, String> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut recordings: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| format!("Failed to read recordings directory: {}", e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.to_string_lossy().to_lowercase() == RECORDING_EXTENSION)
                .unwrap_or(false)
        })
        .collect();

    // Sort by modification time, newest first
    recordings.sort_by(|a, b| {
        let a_time = a.metadata().and_then(|m| m.modified()).ok();
        let b_time = b.metadata().and_then(|m| m.modified()).ok();
        b_time.cmp(&a_time).then_with(|| b.cmp(a))
    });

    Ok(recordings)
}

/// Streaming WAV writer for one recording
pub struct WavFileWriter {
    writer: WavWriter<BufWriter<File>>,
    samples_written: usize,
}

impl WavFileWriter {
    /// Create the destination file, including missing parent directories
    pub fn create(path: impl AsRef<Path>, format: CaptureFormat) -> Result<Self, String> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create recordings directory: {}", e))?;
        }

        let spec = WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let file = File::create(path).map_err(|e| format!("Failed to create file: {}", e))?;
        let writer = WavWriter::new(BufWriter::new(file), spec)
            .map_err(|e| format!("Failed to create WAV writer: {}", e))?;

        Ok(Self {
            writer,
            samples_written: 0,
        })
    }

    pub fn write(&mut self, samples: &[f32]) -> Result<(), String> {
        for &sample in samples {
            self.writer
                .write_sample(sample)
                .map_err(|e| format!("Failed to write sample: {}", e))?;
        }
        self.samples_written += samples.len();
        Ok(())
    }

    pub fn samples_written(&self) -> usize {
        self.samples_written
    }

    /// Flush the header and data
    pub fn finalize(self) -> Result<(), String> {
        self.writer
            .finalize()
            .map_err(|e| format!("Failed to finalize WAV file: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn write_test_file(path: &Path, spec: WavSpec, samples: &[i16]) {
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_duration_calculation() {
        assert_eq!(duration_seconds(16000, 16000), 1.0);
        assert_eq!(duration_seconds(32000, 16000), 2.0);
        assert_eq!(duration_seconds(8000, 16000), 0.5);
        assert_eq!(duration_seconds(8000, 0), 0.0);
    }

    #[test]
    fn test_decode_stereo_int_mixes_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        write_test_file(&path, spec, &[16384, 0, -16384, -16384]);

        let audio = decode_file(&path).unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.samples, vec![0.25, -0.5]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_bytes(b"definitely not a wav file").is_err());
    }

    #[test]
    fn test_writer_output_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("take.wav");
        let mut writer = WavFileWriter::create(&path, CaptureFormat::default()).unwrap();
        writer.write(&[0.5; 441]).unwrap();
        assert_eq!(writer.samples_written(), 441);
        writer.finalize().unwrap();

        let audio = decode_file(&path).unwrap();
        assert_eq!(audio.sample_rate, 44_100);
        assert_eq!(audio.samples.len(), 441);
        assert!((audio.duration() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_recording_destination_is_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 5).unwrap();

        let first = recording_destination(dir.path(), now);
        assert_eq!(
            first.file_name().unwrap().to_string_lossy(),
            "2026-10-18T09:30:05.000Z.wav"
        );

        std::fs::write(&first, b"taken").unwrap();
        let second = recording_destination(dir.path(), now);
        assert_ne!(first, second);
        assert!(second
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("2026-10-18T09:30:05.000Z-"));
    }

    #[test]
    fn test_list_recordings_filters_wav() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.wav"), b"").unwrap();
        std::fs::write(dir.path().join("b.WAV"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let recordings = list_recordings(dir.path()).unwrap();
        assert_eq!(recordings.len(), 2);
        assert!(list_recordings(dir.path().join("missing")).unwrap().is_empty());
    }
}
