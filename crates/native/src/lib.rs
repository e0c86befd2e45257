//! voxwire-native – Bindings an die nativen Codec- und Krypto-Primitiven
//!
//! Einzige Stelle im Workspace mit `unsafe`-Code. Alle Einstiegspunkte sind
//! typisiert und pruefen Puffergroessen, bevor eine native Funktion
//! aufgerufen wird.
//!
//! ## Module
//! - [`opus`] – Encoder/Decoder-Handles und Paket-Metadaten (libopus)
//! - [`secretbox`] – XSalsa20-Poly1305 (MAC vor Ciphertext) und Zufallsbytes

pub mod opus;
pub mod secretbox;

pub use opus::{Application, EncoderCtl, PacketInfo, RawDecoder, RawEncoder, Signal};
pub use secretbox::{random_bytes, Secretbox, KEY_SIZE, MAC_SIZE, NONCE_SIZE};
