//! Mono 16-bit container encoding and decoding.

use crate::tts::TtsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

/// A mono waveform with samples nominally in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Silent waveform of the given duration.
    pub fn silence(duration_secs: f32, sample_rate: u32) -> Self {
        let len = (duration_secs.max(0.0) * sample_rate as f32).round() as usize;
        Self::new(vec![0.0; len], sample_rate)
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Wav,
    /// Headerless little-endian 16-bit samples.
    Pcm,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Pcm => "pcm",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wav" => Ok(OutputFormat::Wav),
            "pcm" | "raw" => Ok(OutputFormat::Pcm),
            other => Err(TtsError::UnsupportedFormat(other.to_string())),
        }
    }
}

fn to_i16(sample: f32) -> i16 {
    let s = if sample.is_finite() { sample } else { 0.0 };
    (s * 32767.0).clamp(-32767.0, 32767.0) as i16
}

pub fn encode(waveform: &Waveform, format: OutputFormat) -> Result<Vec<u8>, TtsError> {
    match format {
        OutputFormat::Wav => encode_wav(waveform),
        OutputFormat::Pcm => Ok(waveform
            .samples
            .iter()
            .flat_map(|&s| to_i16(s).to_le_bytes())
            .collect()),
    }
}

pub fn encode_wav(waveform: &Waveform) -> Result<Vec<u8>, TtsError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + waveform.samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| TtsError::SynthesisFailed(format!("WAV header: {}", e)))?;
        for &sample in &waveform.samples {
            writer
                .write_sample(to_i16(sample))
                .map_err(|e| TtsError::SynthesisFailed(format!("WAV write: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| TtsError::SynthesisFailed(format!("WAV finalize: {}", e)))?;
    }
    Ok(cursor.into_inner())
}

/// Decode a WAV container, downmixing to mono.
pub fn decode_wav(bytes: &[u8]) -> Result<Waveform, TtsError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| TtsError::SynthesisFailed(format!("Invalid WAV: {}", e)))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| TtsError::SynthesisFailed(format!("WAV read: {}", e)))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| TtsError::SynthesisFailed(format!("WAV read: {}", e)))?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(Waveform::new(samples, spec.sample_rate))
}
