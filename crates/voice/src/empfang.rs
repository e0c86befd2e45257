//! Empfangszustand pro entferntem Sender
//!
//! Jeder Sender (SSRC) bekommt beim ersten Paket einen eigenen Decoder aus
//! der Registry des `CodecManager` und merkt sich die zuletzt dekodierte
//! Sequenznummer. Daraus wird fuer jedes neue Paket die Luecke bestimmt.

use voxwire_audio::SharedDecoder;

/// Halber Sequenzraum: Abstaende ab hier gelten als verspaetet
const SEQUENZ_HALBRAUM: u16 = 0x8000;

/// Verhaeltnis eines neuen Pakets zur zuletzt dekodierten Sequenznummer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Luecke {
    /// Direkter Nachfolger (oder erstes Paket des Senders)
    Keine,
    /// Genau ein Paket fehlt
    Einzeln,
    /// Mehrere Pakete fehlen
    Mehrere(u16),
    /// Duplikat oder verspaetetes Paket
    Verspaetet,
}

impl Luecke {
    /// Anzahl fehlender Pakete
    pub fn verloren(self) -> u16 {
        match self {
            Self::Keine | Self::Verspaetet => 0,
            Self::Einzeln => 1,
            Self::Mehrere(n) => n,
        }
    }
}

/// Zustand eines entfernten Senders
#[derive(Debug)]
pub struct RemoteStream {
    decoder: SharedDecoder,
    letzte_sequenz: Option<u16>,
}

impl RemoteStream {
    pub fn new(decoder: SharedDecoder) -> Self {
        Self {
            decoder,
            letzte_sequenz: None,
        }
    }

    pub fn decoder(&self) -> &SharedDecoder {
        &self.decoder
    }

    pub fn letzte_sequenz(&self) -> Option<u16> {
        self.letzte_sequenz
    }

    /// Bestimmt die Luecke zwischen der letzten und `sequenz` (mit 16-Bit-Ueberlauf)
    pub fn luecke(&self, sequenz: u16) -> Luecke {
        let Some(letzte) = self.letzte_sequenz else {
            return Luecke::Keine;
        };
        match sequenz.wrapping_sub(letzte) {
            1 => Luecke::Keine,
            2 => Luecke::Einzeln,
            d if d == 0 || d >= SEQUENZ_HALBRAUM => Luecke::Verspaetet,
            d => Luecke::Mehrere(d - 1),
        }
    }

    /// Merkt sich `sequenz` als zuletzt dekodiert, ausser das Paket war verspaetet
    pub fn fortschreiben(&mut self, sequenz: u16, luecke: Luecke) {
        if luecke != Luecke::Verspaetet {
            self.letzte_sequenz = Some(sequenz);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxwire_audio::{AudioFormat, CodecManager};

    fn stream() -> (CodecManager, RemoteStream) {
        let codec = CodecManager::new(AudioFormat::default()).unwrap();
        let decoder = codec.create_decoder();
        (codec, RemoteStream::new(decoder))
    }

    fn mit_sequenz(seq: u16) -> (CodecManager, RemoteStream) {
        let (codec, mut s) = stream();
        s.fortschreiben(seq, Luecke::Keine);
        (codec, s)
    }

    #[test]
    fn erstes_paket_hat_keine_luecke() {
        let (_codec, s) = stream();
        assert_eq!(s.luecke(4711), Luecke::Keine);
        assert_eq!(s.letzte_sequenz(), None);
    }

    #[test]
    fn luecken_werden_erkannt() {
        let (_codec, s) = mit_sequenz(10);
        assert_eq!(s.luecke(11), Luecke::Keine);
        assert_eq!(s.luecke(12), Luecke::Einzeln);
        assert_eq!(s.luecke(15), Luecke::Mehrere(4));
        assert_eq!(s.luecke(10), Luecke::Verspaetet);
        assert_eq!(s.luecke(9), Luecke::Verspaetet);
    }

    #[test]
    fn luecke_ueber_sequenz_ueberlauf() {
        let (_codec, s) = mit_sequenz(u16::MAX);
        assert_eq!(s.luecke(0), Luecke::Keine);
        assert_eq!(s.luecke(1), Luecke::Einzeln);
        assert_eq!(s.luecke(u16::MAX - 3), Luecke::Verspaetet);
    }

    #[test]
    fn verspaetetes_paket_verschiebt_sequenz_nicht() {
        let (_codec, mut s) = mit_sequenz(100);
        let luecke = s.luecke(98);
        s.fortschreiben(98, luecke);
        assert_eq!(s.letzte_sequenz(), Some(100));

        let luecke = s.luecke(103);
        assert_eq!(luecke.verloren(), 2);
        s.fortschreiben(103, luecke);
        assert_eq!(s.letzte_sequenz(), Some(103));
    }
}
