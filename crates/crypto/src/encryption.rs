//! Voice-Verschluesselung einer Session
//!
//! `VoiceCrypto` besitzt den symmetrischen Schluessel fuer die gesamte
//! Session, den gewaehlten Modus, eine Scratch-Nonce und den Lite-Zaehler.

use tracing::trace;
use voxwire_core::VoxResult;
use voxwire_native::{Secretbox, MAC_SIZE, NONCE_SIZE};
use voxwire_protocol::rtp::HEADER_SIZE;
use voxwire_protocol::{EncryptionMode, NoncePlacement};

use crate::nonce::{
    generate_nonce_from_counter, generate_nonce_from_header, generate_nonce_random,
};

/// Verschluesselungszustand einer Voice-Session
#[derive(Debug)]
pub struct VoiceCrypto {
    secretbox: Secretbox,
    mode: EncryptionMode,
    nonce: [u8; NONCE_SIZE],
    lite_counter: u32,
}

impl VoiceCrypto {
    /// Erstellt den Zustand aus dem ausgehandelten Schluessel und Modus
    ///
    /// # Fehler
    /// - `Puffergroesse` wenn der Schluessel nicht `KEY_SIZE` Bytes lang ist
    pub fn new(key: &[u8], mode: EncryptionMode) -> VoxResult<Self> {
        Ok(Self {
            secretbox: Secretbox::new(key)?,
            mode,
            nonce: [0u8; NONCE_SIZE],
            lite_counter: 0,
        })
    }

    pub fn mode(&self) -> EncryptionMode {
        self.mode
    }

    /// Aktueller Stand des Lite-Zaehlers (naechster zu verwendender Wert)
    pub fn lite_counter(&self) -> u32 {
        self.lite_counter
    }

    /// Verschluesselt `plaintext` nach `target` (exakt `plaintext.len() + MAC_SIZE` Bytes)
    pub fn encrypt(&self, plaintext: &[u8], target: &mut [u8], nonce: &[u8]) -> VoxResult<()> {
        self.secretbox.seal(plaintext, target, nonce)
    }

    /// Entschluesselt `ciphertext` nach `target` (exakt `ciphertext.len() - MAC_SIZE` Bytes)
    pub fn decrypt(&self, ciphertext: &[u8], target: &mut [u8], nonce: &[u8]) -> VoxResult<()> {
        self.secretbox.open(ciphertext, target, nonce)
    }

    /// Erzeugt die Nonce fuer das naechste ausgehende Paket im Scratch-Puffer
    ///
    /// Im Lite-Modus wird der Zaehler danach erhoeht (mit Ueberlauf).
    pub fn next_nonce(&mut self, header: &[u8]) -> VoxResult<[u8; NONCE_SIZE]> {
        match self.mode.layout().placement {
            NoncePlacement::Header => generate_nonce_from_header(header, &mut self.nonce)?,
            NoncePlacement::Suffix => generate_nonce_random(&mut self.nonce)?,
            NoncePlacement::Lite => {
                generate_nonce_from_counter(self.lite_counter, &mut self.nonce)?;
                self.lite_counter = self.lite_counter.wrapping_add(1);
            }
        }
        trace!(modus = %self.mode, "Nonce erzeugt");
        Ok(self.nonce)
    }

    /// Ciphertext-Laenge fuer eine Klartext-Laenge
    pub const fn encrypted_len(plaintext_len: usize) -> usize {
        plaintext_len + MAC_SIZE
    }

    /// Klartext-Laenge fuer eine Ciphertext-Laenge (`None` wenn kuerzer als der MAC)
    pub const fn decrypted_len(ciphertext_len: usize) -> Option<usize> {
        ciphertext_len.checked_sub(MAC_SIZE)
    }
}

/// Kleinste Laenge eines gueltigen verschluesselten Pakets im Modus
pub const fn minimum_packet_len(mode: EncryptionMode) -> usize {
    HEADER_SIZE + MAC_SIZE + mode.trailing_bytes()
}
