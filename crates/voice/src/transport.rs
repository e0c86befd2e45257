//! Voice-Transport einer Session
//!
//! Ein `VoiceTransport` verbindet Codec, Verschluesselung und RTP-Framing:
//!
//! ```text
//! Senden:    PCM -> Opus -> RTP-Header -> Nonce -> Secretbox -> Nonce-Suffix
//! Empfangen: Header -> Nonce -> Secretbox oeffnen -> Extension -> Luecke -> Opus -> PCM
//! ```
//!
//! Der Sendepfad braucht `&mut self` (Sequenz, Zeitstempel, Lite-Zaehler),
//! der Empfangspfad kommt mit `&self` aus. Der Zustand pro Sender liegt in
//! einer `DashMap`, geschluesselt nach SSRC.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, trace, warn};
use voxwire_audio::{AudioFormat, CodecManager, OpusDecoder, SharedDecoder};
use voxwire_core::{VoxError, VoxResult};
use voxwire_crypto::negotiation::select_mode_from;
use voxwire_crypto::{append_nonce, get_nonce, select_mode, VoiceCrypto, MAC_SIZE, NONCE_SIZE};
use voxwire_protocol::rtp::{
    calculate_packet_size, decode_header, encode_header, get_data_from_packet,
    skip_header_extension, HEADER_SIZE,
};
use voxwire_protocol::EncryptionMode;

use crate::config::{EmpfangsEinstellungen, TransportConfig};
use crate::empfang::{Luecke, RemoteStream};
use crate::statistik::{TransportStatistik, Zaehler};

/// Ergebnis eines dekodierten Pakets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmpfangenesAudio {
    pub ssrc: u32,
    pub sequence: u16,
    pub timestamp: u32,
    /// Format von `pcm` (kann bei Kanalwechsel des Senders vom lokalen abweichen)
    pub format: AudioFormat,
    /// Dekodierte PCM-Bytes des Pakets
    pub pcm: Vec<u8>,
    /// Per FEC rekonstruierter oder verdeckter Frame, abzuspielen vor `pcm`
    pub verdeckt: Option<VerdecktesAudio>,
}

/// Herkunft eines Ersatz-Frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ersatzart {
    /// In-Band-FEC aus dem Nachfolgepaket
    Fec,
    /// Opus-Verlustverdeckung
    Verdeckung,
}

/// Ersatz-Frame fuer verlorene Pakete
///
/// Das Format kann von `EmpfangenesAudio::format` abweichen, wenn der Sender
/// in der Luecke die Kanalzahl gewechselt hat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdecktesAudio {
    pub format: AudioFormat,
    pub pcm: Vec<u8>,
    pub art: Ersatzart,
}

/// Sende- und Empfangspfad einer Voice-Session
#[derive(Debug)]
pub struct VoiceTransport {
    codec: CodecManager,
    crypto: VoiceCrypto,
    ssrc: u32,
    sequence: u16,
    timestamp: u32,
    streams: DashMap<u32, RemoteStream>,
    empfang: EmpfangsEinstellungen,
    zaehler: Zaehler,
}

impl VoiceTransport {
    /// Erstellt einen Transport mit festem Verschluesselungsmodus
    ///
    /// # Fehler
    /// - `Argument` bei ungueltigem Format
    /// - `Puffergroesse` bei falscher Schluessellaenge
    /// - `Codec` wenn der Encoder nicht erstellt werden kann
    pub fn new(
        format: AudioFormat,
        key: &[u8],
        mode: EncryptionMode,
        ssrc: u32,
        empfang: EmpfangsEinstellungen,
    ) -> VoxResult<Self> {
        let crypto = VoiceCrypto::new(key, mode)?;
        let codec = CodecManager::new(format)?;

        info!(
            ssrc,
            modus = %mode,
            sample_rate = format.sample_rate(),
            kanaele = format.channel_count(),
            "Voice-Transport gestartet"
        );

        Ok(Self {
            codec,
            crypto,
            ssrc,
            sequence: 0,
            timestamp: 0,
            streams: DashMap::new(),
            empfang,
            zaehler: Zaehler::default(),
        })
    }

    /// Waehlt den Modus aus dem Angebot der Gegenseite und erstellt den Transport
    ///
    /// # Fehler
    /// - `KeinGemeinsamerModus` wenn kein angebotener Modus unterstuetzt wird
    pub fn aushandeln<S: AsRef<str>>(
        format: AudioFormat,
        key: &[u8],
        offered: &[S],
        ssrc: u32,
        empfang: EmpfangsEinstellungen,
    ) -> VoxResult<Self> {
        let mode = select_mode(offered)?;
        Self::new(format, key, mode, ssrc, empfang)
    }

    /// Erstellt den Transport aus einer geladenen Konfiguration
    ///
    /// Ausgehandelt wird `verschluesselung.angebot` gegen `unterstuetzte_modi`.
    pub fn aus_config(config: &TransportConfig, key: &[u8], ssrc: u32) -> VoxResult<Self> {
        let format = config.audio_format()?;
        let tabelle = config.modus_tabelle()?;
        let mode = select_mode_from(&tabelle, &config.verschluesselung.angebot)?;
        Self::new(format, key, mode, ssrc, config.empfang)
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub fn mode(&self) -> EncryptionMode {
        self.crypto.mode()
    }

    pub fn format(&self) -> &AudioFormat {
        self.codec.format()
    }

    /// Sequenznummer des naechsten ausgehenden Pakets
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Zeitstempel des naechsten ausgehenden Pakets
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn ist_heruntergefahren(&self) -> bool {
        self.codec.ist_freigegeben()
    }

    fn pruefe_aktiv(&self) -> VoxResult<()> {
        if self.ist_heruntergefahren() {
            return Err(VoxError::Argument(
                "Voice-Transport wurde bereits heruntergefahren".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Senden
    // -----------------------------------------------------------------------

    /// Kodiert, verschluesselt und rahmt einen PCM-Frame
    ///
    /// Die Paketlaenge ist immer
    /// `calculate_packet_size(opus_len + MAC_SIZE, mode)`. Sequenz und
    /// Zeitstempel werden erst nach erfolgreichem Rahmen weitergezaehlt.
    pub fn encode_frame(&mut self, pcm: &[u8]) -> VoxResult<Vec<u8>> {
        self.pruefe_aktiv()?;

        let mut opus = vec![0u8; pcm.len()];
        let opus_len = self.codec.encode(pcm, &mut opus)?;

        let mode = self.crypto.mode();
        let ct_len = VoiceCrypto::encrypted_len(opus_len);
        let mut paket = vec![0u8; calculate_packet_size(ct_len, mode)];

        encode_header(self.sequence, self.timestamp, self.ssrc, &mut paket)?;
        let nonce = self.crypto.next_nonce(&paket[..HEADER_SIZE])?;
        self.crypto
            .encrypt(&opus, &mut paket[HEADER_SIZE..HEADER_SIZE + ct_len], &nonce)?;
        append_nonce(&nonce, &mut paket, mode)?;

        let format = self.codec.format();
        let frame_size = format.calculate_frame_size(format.calculate_sample_duration(pcm.len()));

        trace!(
            sequence = self.sequence,
            timestamp = self.timestamp,
            bytes = paket.len(),
            "Voice-Paket gerahmt"
        );

        self.sequence = self.sequence.wrapping_add(1);
        self.timestamp = self.timestamp.wrapping_add(frame_size as u32);
        self.zaehler.gesendet();
        Ok(paket)
    }

    // -----------------------------------------------------------------------
    // Empfangen
    // -----------------------------------------------------------------------

    /// Prueft, entschluesselt und dekodiert ein empfangenes Paket
    ///
    /// Abgewiesene Pakete werden gezaehlt und mit `warn!` protokolliert; der
    /// Empfangszustand des Senders bleibt dabei unveraendert.
    pub fn decode_packet(&self, paket: &[u8]) -> VoxResult<EmpfangenesAudio> {
        match self.empfangen(paket) {
            Ok(audio) => {
                self.zaehler.empfangen();
                Ok(audio)
            }
            Err(e) => {
                self.zaehler.verworfen();
                warn!(bytes = paket.len(), fehler = %e, "Voice-Paket verworfen");
                Err(e)
            }
        }
    }

    fn empfangen(&self, paket: &[u8]) -> VoxResult<EmpfangenesAudio> {
        self.pruefe_aktiv()?;

        let header = decode_header(paket)?;
        let mode = self.crypto.mode();
        let daten = get_data_from_packet(paket, mode)?;
        let klartext_len = VoiceCrypto::decrypted_len(daten.len())
            .ok_or_else(|| VoxError::puffer("Verschluesselte Nutzdaten", MAC_SIZE, daten.len()))?;

        let mut nonce = [0u8; NONCE_SIZE];
        get_nonce(paket, &mut nonce, mode)?;
        let mut klartext = vec![0u8; klartext_len];
        self.crypto.decrypt(daten, &mut klartext, &nonce)?;

        let opus = if header.has_extension {
            skip_header_extension(&klartext)?
        } else {
            &klartext[..]
        };
        // Ungueltige Opus-Pakete werden abgewiesen, bevor Empfangszustand entsteht
        self.codec.packet_info(opus)?;

        // Der Shard-Lock der Map wird nur kurz gehalten, nie waehrend des Dekodierens
        let bekannt = self
            .streams
            .get(&header.ssrc)
            .map(|s| (Arc::clone(s.decoder()), s.luecke(header.sequence)));
        let (geteilt, luecke, neu) = match bekannt {
            Some((decoder, luecke)) => (decoder, luecke, false),
            None => (self.codec.create_decoder(), Luecke::Keine, true),
        };

        let (format, pcm, verdeckt) = match self.dekodieren(&geteilt, opus, luecke) {
            Ok(ergebnis) => ergebnis,
            Err(e) => {
                if neu {
                    self.codec.destroy_decoder(&geteilt);
                }
                return Err(e);
            }
        };
        self.fortschreiben(header.ssrc, header.sequence, luecke, geteilt, neu);

        let verloren = luecke.verloren();
        if verloren > 0 {
            warn!(
                ssrc = header.ssrc,
                erhalten = header.sequence,
                verloren,
                "Paketverlust erkannt"
            );
            self.zaehler.verloren(verloren);
        }
        match verdeckt.as_ref().map(|v| v.art) {
            Some(Ersatzart::Fec) => self.zaehler.fec_rekonstruiert(),
            Some(Ersatzart::Verdeckung) => self.zaehler.verdeckt(),
            None => {}
        }

        trace!(
            ssrc = header.ssrc,
            sequence = header.sequence,
            bytes = pcm.len(),
            "Voice-Paket dekodiert"
        );

        Ok(EmpfangenesAudio {
            ssrc: header.ssrc,
            sequence: header.sequence,
            timestamp: header.timestamp,
            format,
            pcm,
            verdeckt,
        })
    }

    /// Ersatz-Frame (falls noetig) und das Paket selbst unter dem Decoder-Lock
    fn dekodieren(
        &self,
        geteilt: &SharedDecoder,
        opus: &[u8],
        luecke: Luecke,
    ) -> VoxResult<(AudioFormat, Vec<u8>, Option<VerdecktesAudio>)> {
        let puffer = self.codec.format().maximum_decode_buffer_size();
        let mut decoder = geteilt.lock();

        let verdeckt = match luecke {
            Luecke::Einzeln if self.empfang.fec_aktiviert => {
                let mut pcm = vec![0u8; puffer];
                let format = self.codec.decode(&mut decoder, opus, &mut pcm, true)?;
                Some(VerdecktesAudio {
                    format,
                    pcm,
                    art: Ersatzart::Fec,
                })
            }
            Luecke::Einzeln | Luecke::Mehrere(_) if self.empfang.verlust_verdecken => {
                self.verdecken(&mut decoder)?
            }
            _ => None,
        };

        let mut pcm = vec![0u8; puffer];
        let format = self.codec.decode(&mut decoder, opus, &mut pcm, false)?;
        Ok((format, pcm, verdeckt))
    }

    /// Ein Verdeckungs-Frame mit der Dauer des zuletzt dekodierten Pakets,
    /// im Format, in dem der Decoder es erzeugt
    fn verdecken(&self, decoder: &mut OpusDecoder) -> VoxResult<Option<VerdecktesAudio>> {
        let frame_size = self.codec.last_packet_sample_count(decoder)?;
        if frame_size == 0 {
            return Ok(None);
        }
        let format = *decoder.format();
        let mut pcm = vec![0u8; self.codec.format().maximum_decode_buffer_size()];
        self.codec.process_packet_loss(decoder, frame_size, &mut pcm)?;
        Ok(Some(VerdecktesAudio {
            format,
            pcm,
            art: Ersatzart::Verdeckung,
        }))
    }

    /// Merkt sich die Sequenz nach erfolgreichem Dekodieren
    ///
    /// Ein neuer Sender wird erst hier eingetragen. Wurde ein bekannter Sender
    /// waehrend des Dekodierens entfernt, bleibt er entfernt.
    fn fortschreiben(
        &self,
        ssrc: u32,
        sequenz: u16,
        luecke: Luecke,
        decoder: SharedDecoder,
        neu: bool,
    ) {
        match self.streams.entry(ssrc) {
            Entry::Occupied(mut eintrag) => {
                if neu && !Arc::ptr_eq(eintrag.get().decoder(), &decoder) {
                    self.codec.destroy_decoder(&decoder);
                }
                eintrag.get_mut().fortschreiben(sequenz, luecke);
            }
            Entry::Vacant(eintrag) if neu => {
                debug!(ssrc, "Neuer Sender, Decoder angelegt");
                let mut stream = RemoteStream::new(decoder);
                stream.fortschreiben(sequenz, luecke);
                eintrag.insert(stream);
            }
            Entry::Vacant(_) => {}
        }
    }

    // -----------------------------------------------------------------------
    // Lebenszyklus
    // -----------------------------------------------------------------------

    /// Entfernt den Empfangszustand eines Senders und gibt seinen Decoder frei
    ///
    /// Gibt `false` zurueck, wenn der Sender unbekannt war.
    pub fn remove_sender(&self, ssrc: u32) -> bool {
        let Some((_, stream)) = self.streams.remove(&ssrc) else {
            return false;
        };
        self.codec.destroy_decoder(stream.decoder());
        info!(ssrc, "Sender entfernt");
        true
    }

    /// Anzahl bekannter Sender
    pub fn aktive_sender(&self) -> usize {
        self.streams.len()
    }

    /// Anzahl registrierter Decoder
    pub fn decoder_anzahl(&self) -> usize {
        self.codec.decoder_count()
    }

    /// Verwirft allen Empfangszustand und gibt Encoder und Decoder frei. Idempotent.
    pub fn shutdown(&mut self) {
        if self.ist_heruntergefahren() {
            return;
        }
        self.streams.clear();
        self.codec.dispose();
        info!(
            ssrc = self.ssrc,
            statistik = %self.zaehler.snapshot().zusammenfassung(),
            "Voice-Transport heruntergefahren"
        );
    }

    pub fn statistik(&self) -> TransportStatistik {
        self.zaehler.snapshot()
    }
}
