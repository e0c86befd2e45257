//! RTP-Framing
//!
//! Minimaler 12-Byte-Header nach RTP-Vorbild (keine volle RFC-3550-Konformitaet).
//!
//! ## Paketformat
//!
//! ```text
//! Offset  Len  Beschreibung
//! ------  ---  -----------
//!  0       1   Marker (0x80 = ohne Extension, 0x90 = mit Extension)
//!  1       1   Version (0x78)
//!  2       2   Sequenznummer (big-endian)
//!  4       4   Zeitstempel (big-endian)
//!  8       4   SSRC – Senderkennung (big-endian)
//! 12       N   Ciphertext (MAC + verschluesselte Opus-Bytes)
//! 12+N     T   Nonce-Bytes, abhaengig vom Modus (0, 24 oder 4)
//! ```

use voxwire_core::{VoxError, VoxResult};

use crate::mode::EncryptionMode;

/// Header-Groesse in Bytes
pub const HEADER_SIZE: usize = 12;

/// Marker-Byte ohne Header-Extension
pub const RTP_NO_EXTENSION: u8 = 0x80;
/// Marker-Byte mit Header-Extension
pub const RTP_EXTENSION: u8 = 0x90;
/// Festes Versions-Byte
pub const RTP_VERSION: u8 = 0x78;

/// Profil-Kennung einer One-Byte-Header-Extension (RFC 5285)
const EXTENSION_PROFIL: [u8; 2] = [0xBE, 0xDE];

/// Dekodierter RTP-Header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub has_extension: bool,
}

impl RtpHeader {
    /// Serialisiert den Header (immer ohne Extension-Marker)
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        write_header(self.sequence, self.timestamp, self.ssrc, &mut buf);
        buf
    }
}

fn write_header(sequence: u16, timestamp: u32, ssrc: u32, target: &mut [u8]) {
    target[0] = RTP_NO_EXTENSION;
    target[1] = RTP_VERSION;
    target[2..4].copy_from_slice(&sequence.to_be_bytes());
    target[4..8].copy_from_slice(&timestamp.to_be_bytes());
    target[8..12].copy_from_slice(&ssrc.to_be_bytes());
}

/// Schreibt den Header in die ersten 12 Bytes von `target`
///
/// # Fehler
/// - `Puffergroesse` wenn `target` kuerzer als 12 Bytes ist
pub fn encode_header(
    sequence: u16,
    timestamp: u32,
    ssrc: u32,
    target: &mut [u8],
) -> VoxResult<()> {
    if target.len() < HEADER_SIZE {
        return Err(VoxError::puffer("RTP-Header-Ziel", HEADER_SIZE, target.len()));
    }
    write_header(sequence, timestamp, ssrc, target);
    Ok(())
}

/// Prueft ob `source` mit einem gueltigen Header beginnt
pub fn is_rtp_header(source: &[u8]) -> bool {
    source.len() >= HEADER_SIZE
        && (source[0] == RTP_NO_EXTENSION || source[0] == RTP_EXTENSION)
        && source[1] == RTP_VERSION
}

/// Dekodiert den Header am Anfang von `source`
///
/// # Fehler
/// - `Puffergroesse` wenn `source` kuerzer als 12 Bytes ist
/// - `Protokoll` bei unbekanntem Marker- oder Versions-Byte
pub fn decode_header(source: &[u8]) -> VoxResult<RtpHeader> {
    if source.len() < HEADER_SIZE {
        return Err(VoxError::puffer("RTP-Header", HEADER_SIZE, source.len()));
    }
    if source[0] != RTP_NO_EXTENSION && source[0] != RTP_EXTENSION {
        return Err(VoxError::Protokoll(format!(
            "Ungueltiges RTP-Marker-Byte: {:#04x}",
            source[0]
        )));
    }
    if source[1] != RTP_VERSION {
        return Err(VoxError::Protokoll(format!(
            "Ungueltige RTP-Version: {:#04x} (erwartet {:#04x})",
            source[1], RTP_VERSION
        )));
    }

    Ok(RtpHeader {
        sequence: u16::from_be_bytes([source[2], source[3]]),
        timestamp: u32::from_be_bytes([source[4], source[5], source[6], source[7]]),
        ssrc: u32::from_be_bytes([source[8], source[9], source[10], source[11]]),
        has_extension: source[0] == RTP_EXTENSION,
    })
}

/// Gesamtgroesse eines Pakets: Header + verschluesselte Nutzdaten + Nonce-Bytes
pub fn calculate_packet_size(encrypted_len: usize, mode: EncryptionMode) -> usize {
    HEADER_SIZE + encrypted_len + mode.trailing_bytes()
}

/// Liefert den verschluesselten Bereich zwischen Header und Nonce-Bytes
///
/// # Fehler
/// - `Puffergroesse` wenn das Paket kleiner als Header + Nonce-Bytes ist
pub fn get_data_from_packet(packet: &[u8], mode: EncryptionMode) -> VoxResult<&[u8]> {
    let minimum = calculate_packet_size(0, mode);
    if packet.len() < minimum {
        return Err(VoxError::puffer("RTP-Paket", minimum, packet.len()));
    }
    Ok(&packet[HEADER_SIZE..packet.len() - mode.trailing_bytes()])
}

/// Ueberspringt eine One-Byte-Header-Extension am Anfang der entschluesselten Nutzdaten
///
/// Beginnen die Nutzdaten nicht mit `0xBE 0xDE`, werden sie unveraendert zurueckgegeben.
///
/// # Fehler
/// - `Protokoll` wenn die angegebene Extension-Laenge ueber das Ende hinausreicht
pub fn skip_header_extension(payload: &[u8]) -> VoxResult<&[u8]> {
    if payload.len() < 4 || payload[..2] != EXTENSION_PROFIL {
        return Ok(payload);
    }
    let woerter = u16::from_be_bytes([payload[2], payload[3]]) as usize;
    let ende = 4 + woerter * 4;
    payload.get(ende..).ok_or_else(|| {
        VoxError::Protokoll(format!(
            "Header-Extension zu lang: {} Bytes angegeben, {} vorhanden",
            ende,
            payload.len()
        ))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
