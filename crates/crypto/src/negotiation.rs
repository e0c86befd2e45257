//! Aushandlung des Verschluesselungsmodus
//!
//! Die Gegenseite bietet eine Liste von Modus-Namen an. Gewaehlt wird der
//! erste Eintrag aus [`SUPPORTED_MODES`], der im Angebot vorkommt. Die
//! Reihenfolge des Angebots spielt keine Rolle.

use tracing::{debug, info};
use voxwire_core::{VoxError, VoxResult};
use voxwire_protocol::EncryptionMode;

/// Lokal unterstuetzte Modi, hoechste Prioritaet zuerst
pub const SUPPORTED_MODES: [(&str, EncryptionMode); 3] = [
    ("xsalsa20_poly1305_lite", EncryptionMode::Lite),
    ("xsalsa20_poly1305_suffix", EncryptionMode::Suffix),
    ("xsalsa20_poly1305", EncryptionMode::Normal),
];

/// Waehlt den Modus mit der hoechsten lokalen Prioritaet aus dem Angebot
///
/// # Fehler
/// - `KeinGemeinsamerModus` wenn kein angebotener Name unterstuetzt wird
pub fn select_mode<S: AsRef<str>>(offered: &[S]) -> VoxResult<EncryptionMode> {
    select_mode_from(&SUPPORTED_MODES, offered)
}

/// Wie [`select_mode`], aber mit eigener Prioritaetstabelle
pub fn select_mode_from<S: AsRef<str>>(
    table: &[(&str, EncryptionMode)],
    offered: &[S],
) -> VoxResult<EncryptionMode> {
    let gewaehlt = table
        .iter()
        .find(|(name, _)| offered.iter().any(|o| o.as_ref() == *name))
        .map(|&(_, mode)| mode);

    match gewaehlt {
        Some(mode) => {
            info!(modus = %mode, "Verschluesselungsmodus ausgehandelt");
            Ok(mode)
        }
        None => {
            let angeboten: Vec<String> = offered.iter().map(|o| o.as_ref().to_string()).collect();
            debug!(?angeboten, "Keine Schnittmenge bei der Modus-Aushandlung");
            Err(VoxError::KeinGemeinsamerModus { angeboten })
        }
    }
}

/// Baut eine Prioritaetstabelle aus Modus-Namen (z.B. aus der Konfiguration)
///
/// # Fehler
/// - `Konfiguration` bei unbekanntem Namen
pub fn table_from_names<S: AsRef<str>>(
    names: &[S],
) -> VoxResult<Vec<(&'static str, EncryptionMode)>> {
    names
        .iter()
        .map(|n| {
            let mode: EncryptionMode = n.as_ref().parse().map_err(VoxError::Konfiguration)?;
            Ok((mode.name(), mode))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxwire_core::FehlerKategorie;

    #[test]
    fn tabelle_namen_passen_zu_modi() {
        for (name, mode) in SUPPORTED_MODES {
            assert_eq!(mode.name(), name);
        }
    }

    #[test]
    fn hoechste_prioritaet_gewinnt() {
        let angebot = ["xsalsa20_poly1305", "xsalsa20_poly1305_suffix", "xsalsa20_poly1305_lite"];
        assert_eq!(select_mode(&angebot).unwrap(), EncryptionMode::Lite);
    }

    #[test]
    fn reihenfolge_des_angebots_egal() {
        let a = ["xsalsa20_poly1305_suffix", "xsalsa20_poly1305"];
        let b = ["xsalsa20_poly1305", "xsalsa20_poly1305_suffix"];
        assert_eq!(select_mode(&a).unwrap(), EncryptionMode::Suffix);
        assert_eq!(select_mode(&b).unwrap(), EncryptionMode::Suffix);
    }

    #[test]
    fn unbekannte_namen_werden_ignoriert() {
        let angebot = vec![
            "aead_aes256_gcm_rtpsize".to_string(),
            "xsalsa20_poly1305".to_string(),
        ];
        assert_eq!(select_mode(&angebot).unwrap(), EncryptionMode::Normal);
    }

    #[test]
    fn keine_schnittmenge() {
        let err = select_mode(&["aead_aes256_gcm_rtpsize"]).unwrap_err();
        assert_eq!(err.kategorie(), FehlerKategorie::NichtUnterstuetzt);
        match err {
            VoxError::KeinGemeinsamerModus { angeboten } => {
                assert_eq!(angeboten, vec!["aead_aes256_gcm_rtpsize".to_string()]);
            }
            other => panic!("Falscher Fehler: {other:?}"),
        }
    }

    #[test]
    fn leeres_angebot() {
        let leer: [&str; 0] = [];
        assert!(select_mode(&leer).is_err());
    }

    #[test]
    fn eigene_tabelle_aus_namen() {
        let tabelle = table_from_names(&["xsalsa20_poly1305", "xsalsa20_poly1305_lite"]).unwrap();
        let angebot = ["xsalsa20_poly1305_lite", "xsalsa20_poly1305"];
        assert_eq!(
            select_mode_from(&tabelle, &angebot).unwrap(),
            EncryptionMode::Normal
        );
        assert!(table_from_names(&["rot13"]).is_err());
    }
}
