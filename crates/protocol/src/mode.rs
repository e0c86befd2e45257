//! Verschluesselungsmodi
//!
//! Alle drei Modi nutzen XSalsa20-Poly1305 und unterscheiden sich nur darin,
//! woher die Nonce stammt und wie viele Bytes sie am Paketende belegt.
//! Die Eigenschaften eines Modus stehen ausschliesslich in [`EncryptionMode::layout`].

/// Laenge einer XSalsa20-Nonce, im Suffix-Modus vollstaendig angehaengt
pub const NONCE_SIZE: usize = 24;

/// Anzahl der Nonce-Bytes, die im Lite-Modus uebertragen werden
pub const LITE_NONCE_SIZE: usize = 4;

/// Verschluesselungsmodus einer Voice-Session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionMode {
    /// Nonce = RTP-Header, mit Nullen aufgefuellt (keine Zusatzbytes)
    Normal,
    /// Zufaellige Nonce, vollstaendig angehaengt
    Suffix,
    /// 4-Byte-Zaehler (big-endian), angehaengt
    Lite,
}

/// Herkunft der Nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoncePlacement {
    /// Aus den ersten 12 Bytes des Pakets
    Header,
    /// Volle Nonce am Paketende
    Suffix,
    /// Die ersten 4 Nonce-Bytes am Paketende
    Lite,
}

/// Wire-Eigenschaften eines Modus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeLayout {
    /// Bytes nach dem Ciphertext
    pub trailing_bytes: usize,
    pub placement: NoncePlacement,
}

impl EncryptionMode {
    /// Lookup Modus -> Wire-Layout
    pub const fn layout(self) -> ModeLayout {
        match self {
            Self::Normal => ModeLayout {
                trailing_bytes: 0,
                placement: NoncePlacement::Header,
            },
            Self::Suffix => ModeLayout {
                trailing_bytes: NONCE_SIZE,
                placement: NoncePlacement::Suffix,
            },
            Self::Lite => ModeLayout {
                trailing_bytes: LITE_NONCE_SIZE,
                placement: NoncePlacement::Lite,
            },
        }
    }

    /// Anzahl der Bytes nach dem Ciphertext
    pub const fn trailing_bytes(self) -> usize {
        self.layout().trailing_bytes
    }

    /// Name des Modus bei der Aushandlung
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "xsalsa20_poly1305",
            Self::Suffix => "xsalsa20_poly1305_suffix",
            Self::Lite => "xsalsa20_poly1305_lite",
        }
    }
}

impl std::fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for EncryptionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xsalsa20_poly1305" => Ok(Self::Normal),
            "xsalsa20_poly1305_suffix" => Ok(Self::Suffix),
            "xsalsa20_poly1305_lite" => Ok(Self::Lite),
            other => Err(format!("Unbekannter Verschluesselungsmodus: '{}'", other)),
        }
    }
}
