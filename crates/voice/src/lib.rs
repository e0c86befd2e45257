//! voxwire-voice – Voice-Transport
//!
//! Setzt Codec, Verschluesselung und RTP-Framing zu einem Sende- und
//! Empfangspfad zusammen.
//!
//! ## Module
//! - [`transport`] – `VoiceTransport`: PCM rein, Paket raus und umgekehrt
//! - [`empfang`] – Empfangszustand und Lueckenerkennung pro Sender
//! - [`statistik`] – Zaehler fuer gesendete, empfangene und verlorene Pakete
//! - [`config`] – TOML-Konfiguration

pub mod config;
pub mod empfang;
pub mod statistik;
pub mod transport;

pub use config::{EmpfangsEinstellungen, TransportConfig};
pub use statistik::TransportStatistik;
pub use transport::{EmpfangenesAudio, Ersatzart, VerdecktesAudio, VoiceTransport};
