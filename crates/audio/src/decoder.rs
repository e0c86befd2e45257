//! Opus-Decoder pro entferntem Sender
//!
//! ```text
//! Uninitialisiert --(erstes Dekodieren / Kanalwechsel)--> Initialisiert
//!        |                                                   |
//!        +------------------(dispose)----------------------> Freigegeben
//! ```
//!
//! Der native Handle wird erst beim ersten Gebrauch angelegt. Nach `dispose`
//! wird er nie wieder an eine native Funktion uebergeben; jeder weitere
//! Gebrauch liefert `VoxError::DecoderFreigegeben`.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};
use voxwire_core::{VoxError, VoxResult};
use voxwire_native::RawDecoder;

use crate::format::AudioFormat;

/// Decoder, geteilt zwischen Registry und Aufrufer
pub type SharedDecoder = Arc<Mutex<OpusDecoder>>;

/// Lebenszyklus eines Decoders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderZustand {
    Uninitialisiert,
    Initialisiert,
    Freigegeben,
}

/// Decoder fuer genau einen entfernten Sender
#[derive(Debug)]
pub struct OpusDecoder {
    handle: Option<RawDecoder>,
    format: AudioFormat,
    freigegeben: bool,
}

impl OpusDecoder {
    /// Erstellt einen Decoder ohne nativen Handle
    pub(crate) fn new(format: AudioFormat) -> Self {
        Self {
            handle: None,
            format,
            freigegeben: false,
        }
    }

    /// Aktuelles Ausgabeformat
    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn zustand(&self) -> DecoderZustand {
        if self.freigegeben {
            DecoderZustand::Freigegeben
        } else if self.handle.is_some() {
            DecoderZustand::Initialisiert
        } else {
            DecoderZustand::Uninitialisiert
        }
    }

    pub fn ist_freigegeben(&self) -> bool {
        self.freigegeben
    }

    /// Bindet einen neuen nativen Handle an `format`.
    ///
    /// Ein vorhandener Handle wird vorher freigegeben.
    pub(crate) fn initialize(&mut self, format: AudioFormat) -> VoxResult<()> {
        if self.freigegeben {
            return Err(VoxError::DecoderFreigegeben);
        }
        let alt = self.handle.take().map(|h| h.channels());
        let handle = RawDecoder::create(format.sample_rate(), format.channel_count())?;
        debug!(
            alte_kanaele = ?alt,
            kanaele = format.channel_count(),
            sample_rate = format.sample_rate(),
            "Opus-Decoder initialisiert"
        );
        self.handle = Some(handle);
        self.format = format;
        Ok(())
    }

    /// Nativer Handle, bei Bedarf mit dem aktuellen Format angelegt
    pub(crate) fn native(&mut self) -> VoxResult<&mut RawDecoder> {
        if self.freigegeben {
            return Err(VoxError::DecoderFreigegeben);
        }
        if self.handle.is_none() {
            self.initialize(self.format)?;
        }
        self.handle.as_mut().ok_or(VoxError::DecoderFreigegeben)
    }

    /// Gibt den nativen Handle frei. Mehrfacher Aufruf ist ein No-op.
    pub fn dispose(&mut self) {
        if self.freigegeben {
            return;
        }
        self.freigegeben = true;
        if let Some(handle) = self.handle.take() {
            drop(handle);
            trace!("Opus-Decoder freigegeben");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_ohne_nativen_handle() {
        let dec = OpusDecoder::new(AudioFormat::default());
        assert_eq!(dec.zustand(), DecoderZustand::Uninitialisiert);
        assert!(!dec.ist_freigegeben());
    }

    #[test]
    fn native_initialisiert_lazy() {
        let mut dec = OpusDecoder::new(AudioFormat::default());
        dec.native().unwrap();
        assert_eq!(dec.zustand(), DecoderZustand::Initialisiert);
    }

    #[test]
    fn initialize_wechselt_format() {
        let mut dec = OpusDecoder::new(AudioFormat::default());
        let mono = AudioFormat::default().with_channels(1).unwrap();
        dec.initialize(mono).unwrap();
        assert_eq!(dec.format().channel_count(), 1);
        assert_eq!(dec.native().unwrap().channels(), 1);
    }

    #[test]
    fn dispose_doppelt_ist_noop() {
        let mut dec = OpusDecoder::new(AudioFormat::default());
        dec.native().unwrap();
        dec.dispose();
        assert_eq!(dec.zustand(), DecoderZustand::Freigegeben);
        assert!(dec.handle.is_none());
        dec.dispose();
        assert_eq!(dec.zustand(), DecoderZustand::Freigegeben);
    }

    #[test]
    fn gebrauch_nach_dispose_ist_fehler() {
        let mut dec = OpusDecoder::new(AudioFormat::default());
        dec.dispose();
        assert!(matches!(dec.native(), Err(VoxError::DecoderFreigegeben)));
        assert!(matches!(
            dec.initialize(AudioFormat::default()),
            Err(VoxError::DecoderFreigegeben)
        ));
        assert!(dec.handle.is_none());
    }
}
