//! voxwire-core – Gemeinsame Typen fuer die Voice-Transport-Pipeline
//!
//! - [`error`] – Fehler-Taxonomie (`VoxError`, `FehlerKategorie`)
//! - [`buffer`] – Nullen von Byte-Bereichen

pub mod buffer;
pub mod error;

pub use error::{FehlerKategorie, VoxError, VoxResult};
