//! Fehlertypen fuer Voxwire
//!
//! Zentraler Fehler-Enum fuer die gesamte Voice-Transport-Pipeline.
//! Jeder Fehler wird sofort an den Aufrufer zurueckgegeben, es gibt keine
//! internen Wiederholungen und keine Teil-Ergebnisse.

use thiserror::Error;

/// Globaler Result-Alias fuer Voxwire
pub type VoxResult<T> = std::result::Result<T, VoxError>;

/// Alle moeglichen Fehler der Voice-Transport-Pipeline
#[derive(Debug, Error)]
pub enum VoxError {
    // --- Argumente & Puffer-Vertraege ---
    #[error("Ungueltiges Argument: {0}")]
    Argument(String),

    #[error("Falsche Puffergroesse fuer {kontext}: erwartet {erwartet}, erhalten {erhalten}")]
    Puffergroesse {
        kontext: &'static str,
        erwartet: usize,
        erhalten: usize,
    },

    // --- Protokoll ---
    #[error("Protokollfehler: {0}")]
    Protokoll(String),

    // --- Kryptografie ---
    #[error("Kryptografie-Fehler in {operation}: Rueckgabecode {code}")]
    Krypto { operation: &'static str, code: i32 },

    #[error("Kein gemeinsamer Verschluesselungsmodus (angeboten: {angeboten:?})")]
    KeinGemeinsamerModus { angeboten: Vec<String> },

    // --- Codec ---
    #[error("Opus-Fehler in {operation} (Code {code}): {nachricht}")]
    Codec {
        operation: &'static str,
        code: i32,
        nachricht: String,
    },

    #[error("Decoder wurde bereits freigegeben")]
    DecoderFreigegeben,

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),
}

/// Fehlerkategorie, unabhaengig von der konkreten Variante
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FehlerKategorie {
    /// Vertragsverletzung durch den Aufrufer (Puffergroessen, Parameter)
    Argument,
    /// Fehlerhafter oder unbekannter Header
    Protokoll,
    /// Verschluesselungs-Primitive meldet Fehler (inkl. Authentifizierung)
    Krypto,
    /// Opus meldet einen negativen Statuscode
    Codec,
    /// Keine Schnittmenge bei der Modus-Aushandlung
    NichtUnterstuetzt,
}

impl VoxError {
    /// Ordnet den Fehler seiner Kategorie zu
    pub fn kategorie(&self) -> FehlerKategorie {
        match self {
            Self::Argument(_)
            | Self::Puffergroesse { .. }
            | Self::DecoderFreigegeben
            | Self::Konfiguration(_) => FehlerKategorie::Argument,
            Self::Protokoll(_) => FehlerKategorie::Protokoll,
            Self::Krypto { .. } => FehlerKategorie::Krypto,
            Self::Codec { .. } => FehlerKategorie::Codec,
            Self::KeinGemeinsamerModus { .. } => FehlerKategorie::NichtUnterstuetzt,
        }
    }

    /// Kurzform fuer einen Puffergroessen-Fehler
    pub fn puffer(kontext: &'static str, erwartet: usize, erhalten: usize) -> Self {
        Self::Puffergroesse {
            kontext,
            erwartet,
            erhalten,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kategorien_zuordnung() {
        assert_eq!(
            VoxError::Argument("x".into()).kategorie(),
            FehlerKategorie::Argument
        );
        assert_eq!(
            VoxError::puffer("test", 1, 2).kategorie(),
            FehlerKategorie::Argument
        );
        assert_eq!(
            VoxError::Protokoll("x".into()).kategorie(),
            FehlerKategorie::Protokoll
        );
        assert_eq!(
            VoxError::Krypto {
                operation: "open",
                code: -1
            }
            .kategorie(),
            FehlerKategorie::Krypto
        );
        assert_eq!(
            VoxError::KeinGemeinsamerModus { angeboten: vec![] }.kategorie(),
            FehlerKategorie::NichtUnterstuetzt
        );
    }

    #[test]
    fn fehlermeldung_enthaelt_groessen() {
        let msg = VoxError::puffer("PCM-Ziel", 3840, 100).to_string();
        assert!(msg.contains("3840"));
        assert!(msg.contains("100"));
        assert!(msg.contains("PCM-Ziel"));
    }

    #[test]
    fn codec_fehler_traegt_code() {
        let err = VoxError::Codec {
            operation: "opus_encode",
            code: -1,
            nachricht: "invalid argument".into(),
        };
        assert!(err.to_string().contains("-1"));
        assert_eq!(err.kategorie(), FehlerKategorie::Codec);
    }
}
