//! XSalsa20-Poly1305 Secretbox
//!
//! Kombiniertes Format wie bei `crypto_secretbox_easy`:
//!
//! ```text
//! [mac(16)] [ciphertext(n)]
//! ```
//!
//! Jeder Fehler der Primitive wird als Statuscode `-1` gemeldet; ein
//! fehlgeschlagener Authentifizierungs-Check ist davon nicht unterscheidbar.

use crypto_secretbox::aead::generic_array::GenericArray;
use crypto_secretbox::aead::{AeadInPlace, KeyInit};
use crypto_secretbox::XSalsa20Poly1305;
use rand::rngs::OsRng;
use rand::RngCore;
use voxwire_core::buffer::zero_fill;
use voxwire_core::{VoxError, VoxResult};

/// Schluessel-Laenge in Bytes
pub const KEY_SIZE: usize = 32;
/// Nonce-Laenge in Bytes
pub const NONCE_SIZE: usize = 24;
/// MAC-Laenge in Bytes
pub const MAC_SIZE: usize = 16;

/// Statuscode der Primitive bei Fehlschlag
const KRYPTO_FEHLER: i32 = -1;

/// Fuellt `target` mit kryptografisch sicheren Zufallsbytes
pub fn random_bytes(target: &mut [u8]) {
    OsRng.fill_bytes(target);
}

/// Symmetrische Secretbox mit festem Schluessel
pub struct Secretbox {
    cipher: XSalsa20Poly1305,
}

impl std::fmt::Debug for Secretbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secretbox([REDACTED])")
    }
}

impl Secretbox {
    /// Erstellt die Secretbox. Der Schluessel muss exakt `KEY_SIZE` Bytes lang sein.
    pub fn new(key: &[u8]) -> VoxResult<Self> {
        if key.len() != KEY_SIZE {
            return Err(VoxError::puffer("Schluessel", KEY_SIZE, key.len()));
        }
        let cipher = XSalsa20Poly1305::new_from_slice(key)
            .map_err(|_| VoxError::puffer("Schluessel", KEY_SIZE, key.len()))?;
        Ok(Self { cipher })
    }

    /// Verschluesselt `plaintext` nach `target` (`plaintext.len() + MAC_SIZE` Bytes)
    pub fn seal(&self, plaintext: &[u8], target: &mut [u8], nonce: &[u8]) -> VoxResult<()> {
        pruefe_nonce(nonce)?;
        let erwartet = plaintext.len() + MAC_SIZE;
        if target.len() != erwartet {
            return Err(VoxError::puffer("Ciphertext-Ziel", erwartet, target.len()));
        }

        let (mac, body) = target.split_at_mut(MAC_SIZE);
        body.copy_from_slice(plaintext);
        match self
            .cipher
            .encrypt_in_place_detached(GenericArray::from_slice(nonce), b"", body)
        {
            Ok(tag) => {
                mac.copy_from_slice(&tag);
                Ok(())
            }
            Err(_) => {
                zero_fill(target);
                Err(VoxError::Krypto {
                    operation: "seal",
                    code: KRYPTO_FEHLER,
                })
            }
        }
    }

    /// Entschluesselt `ciphertext` nach `target` (`ciphertext.len() - MAC_SIZE` Bytes).
    ///
    /// Bei fehlgeschlagener Authentifizierung wird `target` genullt.
    pub fn open(&self, ciphertext: &[u8], target: &mut [u8], nonce: &[u8]) -> VoxResult<()> {
        pruefe_nonce(nonce)?;
        let erwartet = ciphertext.len().checked_sub(MAC_SIZE).ok_or_else(|| {
            VoxError::puffer("Ciphertext (mindestens MAC)", MAC_SIZE, ciphertext.len())
        })?;
        if target.len() != erwartet {
            return Err(VoxError::puffer("Klartext-Ziel", erwartet, target.len()));
        }

        let (mac, body) = ciphertext.split_at(MAC_SIZE);
        target.copy_from_slice(body);
        self.cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(nonce),
                b"",
                target,
                GenericArray::from_slice(mac),
            )
            .map_err(|_| {
                zero_fill(target);
                VoxError::Krypto {
                    operation: "open",
                    code: KRYPTO_FEHLER,
                }
            })
    }
}

fn pruefe_nonce(nonce: &[u8]) -> VoxResult<()> {
    if nonce.len() != NONCE_SIZE {
        return Err(VoxError::puffer("Nonce", NONCE_SIZE, nonce.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxwire_core::buffer::ist_genullt;

    fn schluessel() -> [u8; KEY_SIZE] {
        let mut key = [0u8; KEY_SIZE];
        for (i, b) in key.iter_mut().enumerate() {
            *b = i as u8;
        }
        key
    }

    #[test]
    fn konstanten_passen_zur_primitive() {
        assert_eq!(NONCE_SIZE, XSalsa20Poly1305::NONCE_SIZE);
        assert_eq!(MAC_SIZE, XSalsa20Poly1305::TAG_SIZE);
    }

    #[test]
    fn seal_open_round_trip() {
        let sb = Secretbox::new(&schluessel()).unwrap();
        let nonce = [7u8; NONCE_SIZE];
        let klartext = b"opus payload bytes";

        let mut ct = vec![0u8; klartext.len() + MAC_SIZE];
        sb.seal(klartext, &mut ct, &nonce).unwrap();
        assert_ne!(&ct[MAC_SIZE..], &klartext[..]);

        let mut pt = vec![0u8; klartext.len()];
        sb.open(&ct, &mut pt, &nonce).unwrap();
        assert_eq!(&pt, klartext);
    }

    #[test]
    fn leerer_klartext() {
        let sb = Secretbox::new(&schluessel()).unwrap();
        let nonce = [0u8; NONCE_SIZE];
        let mut ct = [0u8; MAC_SIZE];
        sb.seal(&[], &mut ct, &nonce).unwrap();
        let mut pt: [u8; 0] = [];
        sb.open(&ct, &mut pt, &nonce).unwrap();
    }

    #[test]
    fn falsche_schluessel_laenge() {
        let err = Secretbox::new(&[0u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            VoxError::Puffergroesse {
                erwartet: 32,
                erhalten: 31,
                ..
            }
        ));
    }

    #[test]
    fn falsche_nonce_laenge() {
        let sb = Secretbox::new(&schluessel()).unwrap();
        let mut ct = [0u8; MAC_SIZE + 1];
        assert!(sb.seal(&[1], &mut ct, &[0u8; 12]).is_err());
    }

    #[test]
    fn ziel_laenge_muss_exakt_passen() {
        let sb = Secretbox::new(&schluessel()).unwrap();
        let nonce = [0u8; NONCE_SIZE];
        let mut zu_gross = [0u8; 4 + MAC_SIZE + 1];
        assert!(sb.seal(&[1, 2, 3, 4], &mut zu_gross, &nonce).is_err());

        let ct = [0u8; MAC_SIZE + 4];
        let mut zu_klein = [0u8; 3];
        assert!(sb.open(&ct, &mut zu_klein, &nonce).is_err());
    }

    #[test]
    fn ciphertext_kuerzer_als_mac() {
        let sb = Secretbox::new(&schluessel()).unwrap();
        let mut pt: [u8; 0] = [];
        let err = sb.open(&[0u8; 5], &mut pt, &[0u8; NONCE_SIZE]).unwrap_err();
        assert!(matches!(err, VoxError::Puffergroesse { .. }));
    }

    #[test]
    fn manipulierter_ciphertext_schlaegt_fehl() {
        let sb = Secretbox::new(&schluessel()).unwrap();
        let nonce = [3u8; NONCE_SIZE];
        let mut ct = vec![0u8; 10 + MAC_SIZE];
        sb.seal(&[9u8; 10], &mut ct, &nonce).unwrap();
        ct[MAC_SIZE + 2] ^= 0x01;

        let mut pt = vec![0xFFu8; 10];
        let err = sb.open(&ct, &mut pt, &nonce).unwrap_err();
        assert!(matches!(err, VoxError::Krypto { code: -1, .. }));
        assert!(ist_genullt(&pt));
    }

    #[test]
    fn zufallsbytes_nicht_konstant() {
        let mut a = [0u8; NONCE_SIZE];
        let mut b = [0u8; NONCE_SIZE];
        random_bytes(&mut a);
        random_bytes(&mut b);
        assert_ne!(a, b);
    }
}
