//! voxwire-protocol – Wire-Format der Voice-Pakete
//!
//! - [`rtp`] – 12-Byte RTP-Header, Paketgroessen, Nutzdaten-Extraktion
//! - [`mode`] – Verschluesselungsmodi und ihre Nonce-Platzierung

pub mod mode;
pub mod rtp;

pub use mode::{EncryptionMode, ModeLayout, NoncePlacement};
pub use rtp::RtpHeader;
