//! Nonce-Erzeugung und -Platzierung
//!
//! | Modus  | Erzeugung                       | Im Paket                      |
//! |--------|---------------------------------|-------------------------------|
//! | Normal | RTP-Header + Nullen             | nichts (Header ist die Nonce) |
//! | Suffix | Zufall (24 Bytes)               | volle Nonce am Ende           |
//! | Lite   | Zaehler big-endian + Nullen     | erste 4 Bytes am Ende         |

use voxwire_core::buffer::{zero_fill, zero_fill_from};
use voxwire_core::{VoxError, VoxResult};
use voxwire_native::{random_bytes, NONCE_SIZE};
use voxwire_protocol::mode::LITE_NONCE_SIZE;
use voxwire_protocol::rtp::HEADER_SIZE;
use voxwire_protocol::{EncryptionMode, NoncePlacement};

fn pruefe_nonce(nonce: &[u8], kontext: &'static str) -> VoxResult<()> {
    if nonce.len() != NONCE_SIZE {
        return Err(VoxError::puffer(kontext, NONCE_SIZE, nonce.len()));
    }
    Ok(())
}

/// Nonce aus einem 12-Byte-RTP-Header, Rest genullt
pub fn generate_nonce_from_header(header: &[u8], target: &mut [u8]) -> VoxResult<()> {
    if header.len() != HEADER_SIZE {
        return Err(VoxError::puffer("RTP-Header fuer Nonce", HEADER_SIZE, header.len()));
    }
    pruefe_nonce(target, "Nonce-Ziel")?;
    target[..HEADER_SIZE].copy_from_slice(header);
    zero_fill_from(target, HEADER_SIZE);
    Ok(())
}

/// Nonce aus kryptografisch sicherem Zufall
pub fn generate_nonce_random(target: &mut [u8]) -> VoxResult<()> {
    pruefe_nonce(target, "Nonce-Ziel")?;
    random_bytes(target);
    Ok(())
}

/// Nonce aus einem 32-Bit-Zaehler (big-endian), Rest genullt
pub fn generate_nonce_from_counter(counter: u32, target: &mut [u8]) -> VoxResult<()> {
    pruefe_nonce(target, "Nonce-Ziel")?;
    target[..LITE_NONCE_SIZE].copy_from_slice(&counter.to_be_bytes());
    zero_fill_from(target, LITE_NONCE_SIZE);
    Ok(())
}

/// Schreibt die Nonce modusabhaengig an das Ende von `target`
///
/// - Normal: keine Aenderung
/// - Suffix: volle Nonce in die letzten 24 Bytes
/// - Lite: die ersten 4 Nonce-Bytes in die letzten 4 Bytes
pub fn append_nonce(nonce: &[u8], target: &mut [u8], mode: EncryptionMode) -> VoxResult<()> {
    pruefe_nonce(nonce, "Nonce")?;
    let layout = mode.layout();
    if target.len() < layout.trailing_bytes {
        return Err(VoxError::puffer(
            "Paket fuer Nonce-Suffix",
            layout.trailing_bytes,
            target.len(),
        ));
    }
    let start = target.len() - layout.trailing_bytes;
    match layout.placement {
        NoncePlacement::Header => {}
        NoncePlacement::Suffix => target[start..].copy_from_slice(nonce),
        NoncePlacement::Lite => target[start..].copy_from_slice(&nonce[..LITE_NONCE_SIZE]),
    }
    Ok(())
}

/// Stellt die Nonce aus einem empfangenen Paket wieder her
///
/// - Normal: die ersten 12 Bytes von `source`
/// - Suffix: die letzten 24 Bytes von `source`
/// - Lite: die letzten 4 Bytes von `source`
///
/// Nicht belegte Bytes von `target` werden genullt.
pub fn get_nonce(source: &[u8], target: &mut [u8], mode: EncryptionMode) -> VoxResult<()> {
    pruefe_nonce(target, "Nonce-Ziel")?;
    let layout = mode.layout();
    let (benoetigt, bereich) = match layout.placement {
        NoncePlacement::Header => (HEADER_SIZE, 0..HEADER_SIZE),
        NoncePlacement::Suffix | NoncePlacement::Lite => {
            let n = layout.trailing_bytes;
            (n, source.len().saturating_sub(n)..source.len())
        }
    };
    if source.len() < benoetigt {
        return Err(VoxError::puffer("Paket fuer Nonce", benoetigt, source.len()));
    }

    zero_fill(target);
    let quelle = &source[bereich];
    target[..quelle.len()].copy_from_slice(quelle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxwire_core::buffer::ist_genullt;
    use voxwire_protocol::rtp::{calculate_packet_size, encode_header};

    fn header() -> [u8; HEADER_SIZE] {
        let mut h = [0u8; HEADER_SIZE];
        encode_header(0x0102, 0x0304_0506, 0x0708_090A, &mut h).unwrap();
        h
    }

    #[test]
    fn nonce_aus_header() {
        let mut nonce = [0xFFu8; NONCE_SIZE];
        generate_nonce_from_header(&header(), &mut nonce).unwrap();
        assert_eq!(&nonce[..HEADER_SIZE], &header()[..]);
        assert!(ist_genullt(&nonce[HEADER_SIZE..]));
    }

    #[test]
    fn nonce_aus_header_falsche_laenge() {
        let mut nonce = [0u8; NONCE_SIZE];
        assert!(generate_nonce_from_header(&[0u8; 11], &mut nonce).is_err());
        let mut kurz = [0u8; 12];
        assert!(generate_nonce_from_header(&header(), &mut kurz).is_err());
    }

    #[test]
    fn nonce_aus_zaehler() {
        let mut nonce = [0xFFu8; NONCE_SIZE];
        generate_nonce_from_counter(0x0A0B_0C0D, &mut nonce).unwrap();
        assert_eq!(&nonce[..4], &[0x0A, 0x0B, 0x0C, 0x0D]);
        assert!(ist_genullt(&nonce[4..]));
    }

    #[test]
    fn nonce_aus_zufall() {
        let mut a = [0u8; NONCE_SIZE];
        let mut b = [0u8; NONCE_SIZE];
        generate_nonce_random(&mut a).unwrap();
        generate_nonce_random(&mut b).unwrap();
        assert_ne!(a, b);
        assert!(generate_nonce_random(&mut [0u8; 4]).is_err());
    }

    #[test]
    fn normal_modus_round_trip() {
        let mut nonce = [0u8; NONCE_SIZE];
        generate_nonce_from_header(&header(), &mut nonce).unwrap();

        let mut paket = vec![0u8; calculate_packet_size(20, EncryptionMode::Normal)];
        paket[..HEADER_SIZE].copy_from_slice(&header());
        let vorher = paket.clone();
        append_nonce(&nonce, &mut paket, EncryptionMode::Normal).unwrap();
        assert_eq!(paket, vorher);

        let mut wieder = [0xFFu8; NONCE_SIZE];
        get_nonce(&paket, &mut wieder, EncryptionMode::Normal).unwrap();
        assert_eq!(wieder, nonce);
    }

    #[test]
    fn suffix_modus_round_trip() {
        let mut nonce = [0u8; NONCE_SIZE];
        generate_nonce_random(&mut nonce).unwrap();

        let mut paket = vec![0u8; calculate_packet_size(20, EncryptionMode::Suffix)];
        append_nonce(&nonce, &mut paket, EncryptionMode::Suffix).unwrap();
        let n = paket.len();
        assert_eq!(&paket[n - NONCE_SIZE..], &nonce[..]);

        let mut wieder = [0u8; NONCE_SIZE];
        get_nonce(&paket, &mut wieder, EncryptionMode::Suffix).unwrap();
        assert_eq!(wieder, nonce);
    }

    #[test]
    fn lite_modus_stellt_nur_vier_bytes_wieder_her() {
        let mut nonce = [0u8; NONCE_SIZE];
        generate_nonce_random(&mut nonce).unwrap();

        let mut paket = vec![0u8; calculate_packet_size(20, EncryptionMode::Lite)];
        append_nonce(&nonce, &mut paket, EncryptionMode::Lite).unwrap();
        let n = paket.len();
        assert_eq!(&paket[n - 4..], &nonce[..4]);

        let mut wieder = [0xEEu8; NONCE_SIZE];
        get_nonce(&paket, &mut wieder, EncryptionMode::Lite).unwrap();
        assert_eq!(&wieder[..4], &nonce[..4]);
        assert!(ist_genullt(&wieder[4..]));
    }

    #[test]
    fn lite_zaehler_nonce_vollstaendig_wiederhergestellt() {
        let mut nonce = [0u8; NONCE_SIZE];
        generate_nonce_from_counter(77, &mut nonce).unwrap();
        let mut paket = vec![0u8; calculate_packet_size(3, EncryptionMode::Lite)];
        append_nonce(&nonce, &mut paket, EncryptionMode::Lite).unwrap();
        let mut wieder = [0u8; NONCE_SIZE];
        get_nonce(&paket, &mut wieder, EncryptionMode::Lite).unwrap();
        assert_eq!(wieder, nonce);
    }

    #[test]
    fn zu_kurze_puffer() {
        let nonce = [0u8; NONCE_SIZE];
        assert!(append_nonce(&nonce, &mut [0u8; 10], EncryptionMode::Suffix).is_err());
        assert!(append_nonce(&nonce[..8], &mut [0u8; 40], EncryptionMode::Suffix).is_err());
        let mut ziel = [0u8; NONCE_SIZE];
        assert!(get_nonce(&[0u8; 3], &mut ziel, EncryptionMode::Lite).is_err());
        assert!(get_nonce(&[0u8; 11], &mut ziel, EncryptionMode::Normal).is_err());
    }
}
