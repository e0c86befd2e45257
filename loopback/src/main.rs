//! Voxwire Loopback – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und schickt einen
//! Sinuston von einem Transport zum anderen:
//! PCM -> Opus -> Verschluesselung -> RTP -> Entschluesselung -> Opus -> PCM
//!
//! Umgebungsvariablen:
//! - `VOXWIRE_CONFIG`: Pfad zur TOML-Konfiguration (Standard: `config.toml`)
//! - `VOXWIRE_FRAMES`: Anzahl 20-ms-Frames (Standard: 50)
//! - `VOXWIRE_VERLUST`: jedes n-te Paket verwerfen, 0 = kein Verlust (Standard: 0)

use anyhow::{Context, Result};
use voxwire_audio::AudioFormat;
use voxwire_crypto::{random_bytes, KEY_SIZE};
use voxwire_observability::logging_initialisieren;
use voxwire_voice::{TransportConfig, VoiceTransport};

const FRAME_MS: usize = 20;
const TON_HZ: f32 = 440.0;
const SENDER_SSRC: u32 = 0x5658_0001;
const EMPFAENGER_SSRC: u32 = 0x5658_0002;

fn main() -> Result<()> {
    let config_pfad = std::env::var("VOXWIRE_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = TransportConfig::laden(&config_pfad)?;

    logging_initialisieren(&config.logging.level, &config.logging.format)?;

    let frames = zahl_aus_env("VOXWIRE_FRAMES", 50)?;
    let verlust = zahl_aus_env("VOXWIRE_VERLUST", 0)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        frames,
        verlust,
        "Voxwire Loopback wird gestartet"
    );

    let mut key = [0u8; KEY_SIZE];
    random_bytes(&mut key);

    let mut sender = VoiceTransport::aus_config(&config, &key, SENDER_SSRC)
        .context("Sender konnte nicht erstellt werden")?;
    let mut empfaenger = VoiceTransport::aus_config(&config, &key, EMPFAENGER_SSRC)
        .context("Empfaenger konnte nicht erstellt werden")?;

    let format = *sender.format();
    let mut pcm_bytes = 0usize;

    for n in 0..frames {
        let pcm = sinus(&format, n * format.calculate_frame_size(FRAME_MS));
        let paket = sender
            .encode_frame(&pcm)
            .with_context(|| format!("Frame {n} konnte nicht gesendet werden"))?;

        if verlust > 0 && n % verlust == verlust - 1 {
            tracing::debug!(frame = n, "Paket absichtlich verworfen");
            continue;
        }

        let audio = empfaenger
            .decode_packet(&paket)
            .with_context(|| format!("Frame {n} konnte nicht empfangen werden"))?;
        pcm_bytes += audio.pcm.len() + audio.verdeckt.map_or(0, |v| v.pcm.len());
    }

    let gesendet = sender.statistik();
    let empfangen = empfaenger.statistik();
    tracing::info!(
        modus = %sender.mode(),
        pcm_bytes,
        sender = %gesendet.zusammenfassung(),
        empfaenger = %empfangen.zusammenfassung(),
        "Loopback abgeschlossen"
    );

    sender.shutdown();
    empfaenger.shutdown();
    Ok(())
}

fn zahl_aus_env(name: &str, standard: usize) -> Result<usize> {
    match std::env::var(name) {
        Ok(wert) => wert
            .parse()
            .with_context(|| format!("{name} ist keine gueltige Zahl: '{wert}'")),
        Err(_) => Ok(standard),
    }
}

/// Ein Frame Sinuston ab Sample `offset`, interleaved 16-Bit little-endian
fn sinus(format: &AudioFormat, offset: usize) -> Vec<u8> {
    let samples = format.calculate_frame_size(FRAME_MS);
    let mut pcm = Vec::with_capacity(format.calculate_sample_size(FRAME_MS));
    for i in 0..samples {
        let t = (offset + i) as f32 / format.sample_rate() as f32;
        let wert = ((t * TON_HZ * std::f32::consts::TAU).sin() * 10_000.0) as i16;
        for _ in 0..format.channel_count() {
            pcm.extend_from_slice(&wert.to_le_bytes());
        }
    }
    pcm
}
