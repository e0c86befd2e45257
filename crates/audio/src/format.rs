//! Audio-Format
//!
//! Abtastrate, Kanalzahl und Anwendungsprofil. Ein `AudioFormat` ist nach der
//! Konstruktion unveraenderlich und immer gueltig.

use serde::{Deserialize, Serialize};
use voxwire_core::{VoxError, VoxResult};
use voxwire_native::{Application, Signal};

/// Von Opus unterstuetzte Abtastraten
pub const ALLOWED_SAMPLE_RATES: [u32; 5] = [8000, 12000, 16000, 24000, 48000];

/// Laengste Opus-Paketdauer in Millisekunden
pub const MAX_PACKET_DURATION_MS: usize = 120;

/// Maximale Kanalzahl
pub const MAX_CHANNELS: usize = 2;

/// Bytes pro Sample (16-Bit PCM)
const BYTES_PER_SAMPLE: usize = 2;

/// Anwendungsprofil des Audio-Signals
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceApplication {
    /// Sprache (VoIP)
    Voice,
    /// Musik und allgemeines Audio
    #[default]
    Music,
    /// Minimale Verzoegerung
    LowLatency,
}

impl VoiceApplication {
    pub fn opus_application(self) -> Application {
        match self {
            Self::Voice => Application::Voip,
            Self::Music => Application::Audio,
            Self::LowLatency => Application::RestrictedLowDelay,
        }
    }

    pub fn opus_signal(self) -> Signal {
        match self {
            Self::Voice => Signal::Voice,
            Self::Music => Signal::Music,
            Self::LowLatency => Signal::Auto,
        }
    }
}

/// Format eines PCM-Stroms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    sample_rate: u32,
    channel_count: usize,
    application: VoiceApplication,
}

impl Default for AudioFormat {
    /// 48 kHz, Stereo, Musik
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channel_count: 2,
            application: VoiceApplication::Music,
        }
    }
}

impl AudioFormat {
    /// Erstellt ein validiertes Format
    ///
    /// # Fehler
    /// - `Argument` bei nicht unterstuetzter Abtastrate oder Kanalzahl
    pub fn new(
        sample_rate: u32,
        channel_count: usize,
        application: VoiceApplication,
    ) -> VoxResult<Self> {
        let format = Self {
            sample_rate,
            channel_count,
            application,
        };
        format.validieren()?;
        Ok(format)
    }

    /// Prueft Abtastrate und Kanalzahl
    pub fn validieren(&self) -> VoxResult<()> {
        if !ALLOWED_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(VoxError::Argument(format!(
                "Abtastrate {} Hz nicht unterstuetzt (erlaubt: {:?})",
                self.sample_rate, ALLOWED_SAMPLE_RATES
            )));
        }
        if self.channel_count == 0 || self.channel_count > MAX_CHANNELS {
            return Err(VoxError::Argument(format!(
                "Kanalzahl muss 1 oder 2 sein (war: {})",
                self.channel_count
            )));
        }
        Ok(())
    }

    /// Gleiches Format mit anderer Kanalzahl
    pub fn with_channels(&self, channel_count: usize) -> VoxResult<Self> {
        Self::new(self.sample_rate, channel_count, self.application)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn application(&self) -> VoiceApplication {
        self.application
    }

    fn samples_per_ms(&self) -> usize {
        self.sample_rate as usize / 1000
    }

    /// Dauer in ganzen Millisekunden, die `size_bytes` PCM-Bytes entsprechen
    pub fn calculate_sample_duration(&self, size_bytes: usize) -> usize {
        size_bytes * 1000 / (self.sample_rate as usize * self.channel_count * BYTES_PER_SAMPLE)
    }

    /// Samples pro Kanal fuer eine Dauer in Millisekunden
    pub fn calculate_frame_size(&self, duration_ms: usize) -> usize {
        duration_ms * self.samples_per_ms()
    }

    /// PCM-Bytes fuer eine Dauer in Millisekunden
    pub fn calculate_sample_size(&self, duration_ms: usize) -> usize {
        duration_ms * self.channel_count * self.samples_per_ms() * BYTES_PER_SAMPLE
    }

    /// Samples pro Kanal des laengsten Opus-Pakets (120 ms)
    pub fn calculate_maximum_frame_size(&self) -> usize {
        self.calculate_frame_size(MAX_PACKET_DURATION_MS)
    }

    /// PCM-Bytes fuer `sample_count` Samples pro Kanal
    pub fn sample_count_to_sample_size(&self, sample_count: usize) -> usize {
        sample_count * self.channel_count * BYTES_PER_SAMPLE
    }

    /// Zielpuffer-Groesse fuer das Dekodieren eines beliebigen Pakets.
    ///
    /// Rechnet mit zwei Kanaelen, da ein Sender die Kanalzahl wechseln kann.
    pub fn maximum_decode_buffer_size(&self) -> usize {
        self.calculate_maximum_frame_size() * MAX_CHANNELS * BYTES_PER_SAMPLE
    }
}
