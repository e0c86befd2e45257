//! Opus Codec-Verwaltung
//!
//! Ein `CodecManager` pro Session besitzt den Encoder fuer das lokale
//! `AudioFormat` und eine Registry aller Decoder entfernter Sender. Die
//! Registry ist durch einen Mutex geschuetzt; Anlegen, Entfernen und das
//! Freigeben aller Decoder laufen unter diesem Lock.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};
use voxwire_core::{VoxError, VoxResult};
use voxwire_native::{EncoderCtl, PacketInfo, RawEncoder};

use crate::decoder::{OpusDecoder, SharedDecoder};
use crate::format::AudioFormat;

/// Erwarteter Paketverlust, an den Encoder gemeldet (Prozent)
pub const ENCODER_PACKET_LOSS_PERCENT: u8 = 15;

/// Ziel-Bitrate des Encoders in Bit/s
pub const ENCODER_BITRATE: i32 = 131_072;

/// Encoder und Decoder-Registry einer Session
#[derive(Debug)]
pub struct CodecManager {
    format: AudioFormat,
    encoder: Option<RawEncoder>,
    decoders: Mutex<Vec<SharedDecoder>>,
}

impl CodecManager {
    /// Erstellt den Encoder und setzt Signal-Hinweis, Verlustrate, FEC und Bitrate
    pub fn new(format: AudioFormat) -> VoxResult<Self> {
        format.validieren()?;

        let application = format.application();
        let mut encoder = RawEncoder::create(
            format.sample_rate(),
            format.channel_count(),
            application.opus_application(),
        )?;
        encoder.set(EncoderCtl::Signal(application.opus_signal()))?;
        encoder.set(EncoderCtl::PacketLossPercent(ENCODER_PACKET_LOSS_PERCENT))?;
        encoder.set(EncoderCtl::InbandFec(true))?;
        encoder.set(EncoderCtl::Bitrate(ENCODER_BITRATE))?;

        debug!(
            sample_rate = format.sample_rate(),
            kanaele = format.channel_count(),
            anwendung = ?application,
            "Opus-Encoder erstellt"
        );

        Ok(Self {
            format,
            encoder: Some(encoder),
            decoders: Mutex::new(Vec::new()),
        })
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    /// Kodiert einen PCM-Frame.
    ///
    /// `pcm.len()` muss exakt der PCM-Groesse der implizierten Dauer entsprechen
    /// und `target.len()` muss gleich `pcm.len()` sein. `target` wird auf die
    /// Anzahl kodierter Bytes gekuerzt, die auch zurueckgegeben wird.
    pub fn encode(&mut self, pcm: &[u8], target: &mut Vec<u8>) -> VoxResult<usize> {
        let dauer = self.format.calculate_sample_duration(pcm.len());
        let frame_size = self.format.calculate_frame_size(dauer);
        let sample_size = self.format.calculate_sample_size(dauer);

        if dauer == 0 {
            return Err(VoxError::Argument(format!(
                "PCM-Frame zu kurz: {} Bytes",
                pcm.len()
            )));
        }
        if pcm.len() != sample_size {
            return Err(VoxError::puffer("PCM-Frame", sample_size, pcm.len()));
        }
        if target.len() != pcm.len() {
            return Err(VoxError::puffer("Opus-Ziel", pcm.len(), target.len()));
        }

        let encoder = self.encoder.as_mut().ok_or_else(|| {
            VoxError::Argument("Encoder wurde bereits freigegeben".into())
        })?;
        let samples = pcm_to_samples(pcm);
        let geschrieben = encoder.encode(&samples, frame_size, target)?;
        target.truncate(geschrieben);

        trace!(dauer_ms = dauer, bytes = geschrieben, "PCM-Frame kodiert");
        Ok(geschrieben)
    }

    /// Dekodiert ein Opus-Paket und gibt das Ausgabeformat zurueck.
    ///
    /// Meldet das Paket eine andere Kanalzahl als der Decoder, wird dieser
    /// transparent neu initialisiert. `target` wird auf die dekodierten
    /// PCM-Bytes gekuerzt.
    pub fn decode(
        &self,
        decoder: &mut OpusDecoder,
        opus: &[u8],
        target: &mut Vec<u8>,
        use_fec: bool,
    ) -> VoxResult<AudioFormat> {
        if decoder.ist_freigegeben() {
            return Err(VoxError::DecoderFreigegeben);
        }
        let info = PacketInfo::read(opus, self.format.sample_rate())?;

        let output_format = if info.channels != self.format.channel_count() {
            self.format.with_channels(info.channels)?
        } else {
            self.format
        };
        if decoder.format().channel_count() != info.channels {
            debug!(
                von = decoder.format().channel_count(),
                nach = info.channels,
                "Kanalzahl des Senders geaendert, Decoder wird neu initialisiert"
            );
            decoder.initialize(output_format)?;
        }

        let frame_size = info.frame_size();
        let benoetigt = output_format.sample_count_to_sample_size(frame_size);
        if target.len() < benoetigt {
            return Err(VoxError::puffer("PCM-Ziel", benoetigt, target.len()));
        }

        let mut samples = vec![0i16; frame_size * output_format.channel_count()];
        let dekodiert = decoder
            .native()?
            .decode(Some(opus), &mut samples, frame_size, use_fec)?;
        let sample_size = output_format.sample_count_to_sample_size(dekodiert);
        samples_to_pcm(&samples[..dekodiert * output_format.channel_count()], target);
        target.truncate(sample_size);

        trace!(samples = dekodiert, fec = use_fec, "Opus-Paket dekodiert");
        Ok(output_format)
    }

    /// Synthetisiert `frame_size` Samples pro Kanal fuer ein verlorenes Paket
    pub fn process_packet_loss(
        &self,
        decoder: &mut OpusDecoder,
        frame_size: usize,
        target: &mut Vec<u8>,
    ) -> VoxResult<usize> {
        if decoder.ist_freigegeben() {
            return Err(VoxError::DecoderFreigegeben);
        }
        let format = *decoder.format();
        let benoetigt = format.sample_count_to_sample_size(frame_size);
        if target.len() < benoetigt {
            return Err(VoxError::puffer("PCM-Ziel (Verdeckung)", benoetigt, target.len()));
        }

        let mut samples = vec![0i16; frame_size * format.channel_count()];
        let erzeugt = decoder.native()?.decode(None, &mut samples, frame_size, false)?;
        let sample_size = format.sample_count_to_sample_size(erzeugt);
        samples_to_pcm(&samples[..erzeugt * format.channel_count()], target);
        target.truncate(sample_size);

        trace!(samples = erzeugt, "Verlorenes Paket verdeckt");
        Ok(sample_size)
    }

    /// Dauer des zuletzt dekodierten oder verdeckten Pakets in Samples pro Kanal
    pub fn last_packet_sample_count(&self, decoder: &mut OpusDecoder) -> VoxResult<usize> {
        decoder.native()?.last_packet_duration()
    }

    /// Liest die TOC-Metadaten eines Opus-Pakets, ohne zu dekodieren
    pub fn packet_info(&self, opus: &[u8]) -> VoxResult<PacketInfo> {
        PacketInfo::read(opus, self.format.sample_rate())
    }

    /// Legt einen Decoder an und nimmt ihn in die Registry auf.
    ///
    /// Der native Handle entsteht erst beim ersten Dekodieren.
    pub fn create_decoder(&self) -> SharedDecoder {
        let decoder = Arc::new(Mutex::new(OpusDecoder::new(self.format)));
        let mut registry = self.decoders.lock();
        registry.push(Arc::clone(&decoder));
        trace!(anzahl = registry.len(), "Decoder registriert");
        decoder
    }

    /// Entfernt den Decoder aus der Registry und gibt ihn frei.
    ///
    /// Gibt `false` zurueck, wenn er nicht (mehr) registriert war.
    pub fn destroy_decoder(&self, decoder: &SharedDecoder) -> bool {
        let mut registry = self.decoders.lock();
        let Some(pos) = registry.iter().position(|d| Arc::ptr_eq(d, decoder)) else {
            return false;
        };
        let entfernt = registry.swap_remove(pos);
        entfernt.lock().dispose();
        trace!(anzahl = registry.len(), "Decoder entfernt");
        true
    }

    /// Anzahl registrierter Decoder
    pub fn decoder_count(&self) -> usize {
        self.decoders.lock().len()
    }

    /// Gibt den Encoder und alle registrierten Decoder frei. Idempotent.
    pub fn dispose(&mut self) {
        if self.encoder.take().is_some() {
            debug!("Opus-Encoder freigegeben");
        }
        let mut registry = self.decoders.lock();
        for decoder in registry.drain(..) {
            decoder.lock().dispose();
        }
    }

    pub fn ist_freigegeben(&self) -> bool {
        self.encoder.is_none()
    }
}

impl Drop for CodecManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ---------------------------------------------------------------------------
// PCM-Konvertierung (16-Bit little-endian)
// ---------------------------------------------------------------------------

fn pcm_to_samples(pcm: &[u8]) -> Vec<i16> {
    pcm.chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

fn samples_to_pcm(samples: &[i16], target: &mut [u8]) {
    for (ziel, sample) in target.chunks_exact_mut(2).zip(samples) {
        ziel.copy_from_slice(&sample.to_le_bytes());
    }
}
