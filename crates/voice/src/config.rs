//! Transport-Konfiguration
//!
//! Wird aus einer TOML-Datei geladen. Alle Felder haben Standardwerte,
//! sodass ein Transport auch ohne Konfigurationsdatei lauffaehig ist.

use serde::{Deserialize, Serialize};
use voxwire_audio::{AudioFormat, VoiceApplication};
use voxwire_core::VoxResult;
use voxwire_crypto::negotiation::table_from_names;
use voxwire_crypto::SUPPORTED_MODES;
use voxwire_protocol::EncryptionMode;

/// Vollstaendige Transport-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Lokales Audioformat
    pub audio: AudioEinstellungen,
    /// Unterstuetzte und angebotene Verschluesselungsmodi
    pub verschluesselung: VerschluesselungsEinstellungen,
    /// Verhalten bei Paketverlust
    pub empfang: EmpfangsEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Audio-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioEinstellungen {
    /// Abtastrate in Hz (8000, 12000, 16000, 24000 oder 48000)
    pub sample_rate: u32,
    /// Kanalzahl (1 oder 2)
    pub kanaele: usize,
    /// Anwendungsprofil: "voice", "music" oder "low_latency"
    pub anwendung: VoiceApplication,
}

impl Default for AudioEinstellungen {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            kanaele: 2,
            anwendung: VoiceApplication::Music,
        }
    }
}

/// Verschluesselungs-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerschluesselungsEinstellungen {
    /// Lokal unterstuetzte Modi, hoechste Prioritaet zuerst
    pub unterstuetzte_modi: Vec<String>,
    /// Angebot der Gegenseite (fuer Loopback und Tests)
    pub angebot: Vec<String>,
}

impl Default for VerschluesselungsEinstellungen {
    fn default() -> Self {
        let alle: Vec<String> = SUPPORTED_MODES.iter().map(|(n, _)| n.to_string()).collect();
        Self {
            unterstuetzte_modi: alle.clone(),
            angebot: alle,
        }
    }
}

/// Empfangs-Einstellungen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmpfangsEinstellungen {
    /// Einzelnes verlorenes Paket per In-Band-FEC des Nachfolgers rekonstruieren
    pub fec_aktiviert: bool,
    /// Verlorene Pakete durch Opus-Verlustverdeckung ersetzen
    pub verlust_verdecken: bool,
}

impl Default for EmpfangsEinstellungen {
    fn default() -> Self {
        Self {
            fec_aktiviert: true,
            verlust_verdecken: true,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Ausgabeformat: "text" oder "json"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl TransportConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei
    ///
    /// Fehlt die Datei, werden Standardwerte verwendet.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Validiertes Audioformat aus dem Abschnitt `[audio]`
    pub fn audio_format(&self) -> VoxResult<AudioFormat> {
        AudioFormat::new(
            self.audio.sample_rate,
            self.audio.kanaele,
            self.audio.anwendung,
        )
    }

    /// Prioritaetstabelle aus `unterstuetzte_modi`
    pub fn modus_tabelle(&self) -> VoxResult<Vec<(&'static str, EncryptionMode)>> {
        table_from_names(&self.verschluesselung.unterstuetzte_modi)
    }
}
