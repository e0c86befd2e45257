//! voxwire-audio – Opus Codec-Verwaltung
//!
//! - [`format`] – `AudioFormat` und Groessenberechnungen fuer 16-Bit-PCM
//! - [`decoder`] – Decoder pro entferntem Sender (Zustandsautomat)
//! - [`codec`] – `CodecManager`: Encoder, Decoder-Registry, Verlustverdeckung
//!
//! PCM wird durchgehend als interleaved 16-Bit little-endian in Byte-Puffern
//! gefuehrt. Alle Groessenvertraege sind daher in Bytes angegeben.

pub mod codec;
pub mod decoder;
pub mod format;

// Bequeme Re-Exporte der wichtigsten Typen
pub use codec::{CodecManager, ENCODER_BITRATE, ENCODER_PACKET_LOSS_PERCENT};
pub use decoder::{DecoderZustand, OpusDecoder, SharedDecoder};
pub use format::{AudioFormat, VoiceApplication};
pub use voxwire_native::PacketInfo;
