//! Puffer-Hilfsfunktionen
//!
//! Nullen fester Byte-Bereiche ohne Seiteneffekte auf den Rest des Puffers.

/// Setzt alle Bytes des Puffers auf 0
#[inline]
pub fn zero_fill(target: &mut [u8]) {
    target.fill(0);
}

/// Setzt alle Bytes ab `offset` auf 0. Ein Offset hinter dem Pufferende ist ein No-op.
#[inline]
pub fn zero_fill_from(target: &mut [u8], offset: usize) {
    if let Some(rest) = target.get_mut(offset..) {
        rest.fill(0);
    }
}

/// Prueft ob alle Bytes 0 sind
pub fn ist_genullt(source: &[u8]) -> bool {
    source.iter().all(|&b| b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_fill_ganzer_puffer() {
        let mut buf = [0xAAu8; 24];
        zero_fill(&mut buf);
        assert!(ist_genullt(&buf));
    }

    #[test]
    fn zero_fill_from_laesst_anfang_stehen() {
        let mut buf = [0xFFu8; 8];
        zero_fill_from(&mut buf, 4);
        assert_eq!(buf, [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]);
    }

    #[test]
    fn zero_fill_from_hinter_ende() {
        let mut buf = [1u8; 4];
        zero_fill_from(&mut buf, 4);
        zero_fill_from(&mut buf, 100);
        assert_eq!(buf, [1u8; 4]);
    }

    #[test]
    fn leerer_puffer() {
        let mut buf: [u8; 0] = [];
        zero_fill(&mut buf);
        assert!(ist_genullt(&buf));
    }
}
