//! Zaehler eines Voice-Transports
//!
//! Die Zaehler sind atomar, damit `decode_packet` mit `&self` auskommt.
//! `snapshot()` liefert eine Kopie fuer Logging und Tests.

use std::sync::atomic::{AtomicU64, Ordering};

/// Momentaufnahme der Transport-Zaehler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStatistik {
    /// Verschickte Pakete
    pub gesendet: u64,
    /// Erfolgreich dekodierte Pakete
    pub empfangen: u64,
    /// Abgewiesene Pakete (Header, Authentifizierung, Opus)
    pub verworfen: u64,
    /// Per FEC rekonstruierte Frames
    pub fec_rekonstruiert: u64,
    /// Per Verlustverdeckung synthetisierte Frames
    pub verdeckt: u64,
    /// Als verloren erkannte Pakete
    pub verloren: u64,
}

impl TransportStatistik {
    /// Gibt eine lesbare Zusammenfassung zurueck
    pub fn zusammenfassung(&self) -> String {
        format!(
            "Gesendet={} Empfangen={} Verworfen={} Verloren={} FEC={} Verdeckt={}",
            self.gesendet,
            self.empfangen,
            self.verworfen,
            self.verloren,
            self.fec_rekonstruiert,
            self.verdeckt,
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct Zaehler {
    gesendet: AtomicU64,
    empfangen: AtomicU64,
    verworfen: AtomicU64,
    fec_rekonstruiert: AtomicU64,
    verdeckt: AtomicU64,
    verloren: AtomicU64,
}

impl Zaehler {
    pub(crate) fn gesendet(&self) {
        self.gesendet.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn empfangen(&self) {
        self.empfangen.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn verworfen(&self) {
        self.verworfen.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fec_rekonstruiert(&self) {
        self.fec_rekonstruiert.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn verdeckt(&self) {
        self.verdeckt.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn verloren(&self, anzahl: u16) {
        self.verloren.fetch_add(u64::from(anzahl), Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TransportStatistik {
        TransportStatistik {
            gesendet: self.gesendet.load(Ordering::Relaxed),
            empfangen: self.empfangen.load(Ordering::Relaxed),
            verworfen: self.verworfen.load(Ordering::Relaxed),
            fec_rekonstruiert: self.fec_rekonstruiert.load(Ordering::Relaxed),
            verdeckt: self.verdeckt.load(Ordering::Relaxed),
            verloren: self.verloren.load(Ordering::Relaxed),
        }
    }
}
