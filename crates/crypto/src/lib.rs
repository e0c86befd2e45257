//! # voxwire-crypto
//!
//! Verschluesselung der Voice-Nutzdaten.
//!
//! ## Module
//! - `negotiation` - Prioritaetstabelle und Auswahl des Verschluesselungsmodus
//! - `nonce` - Erzeugen, Anhaengen und Wiederherstellen der Nonce pro Modus
//! - `encryption` - `VoiceCrypto`: Schluessel, Scratch-Nonce, Encrypt/Decrypt

pub mod encryption;
pub mod negotiation;
pub mod nonce;

// Bequeme Re-Exports
pub use encryption::VoiceCrypto;
pub use negotiation::{select_mode, SUPPORTED_MODES};
pub use nonce::{
    append_nonce, generate_nonce_from_counter, generate_nonce_from_header, generate_nonce_random,
    get_nonce,
};
pub use voxwire_native::{random_bytes, KEY_SIZE, MAC_SIZE, NONCE_SIZE};
