//! Mint detection - pulls base58 mint candidates out of free-form chat
//! text and scores them by surrounding context.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Solana addresses are base58, 32 to 44 characters.
static MINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[1-9A-HJ-NP-Za-km-z]{32,44}").expect("mint regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedMint {
    pub mint: String,
    pub confidence: u8,
}

fn is_base58_char(c: char) -> bool {
    c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
}

/// Whole-string mint check, used to validate /buy and /sell arguments.
pub fn is_plausible_mint(s: &str) -> bool {
    (32..=44).contains(&s.len()) && s.chars().all(is_base58_char)
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Extract candidate mints with a context-scored confidence.
///
/// A candidate must sit on base58 boundaries (the run is exactly 32-44
/// characters, not a slice of something longer). Confidence starts at 50
/// and goes up when the 40 characters around the match mention contract
/// or pump.fun wording. Duplicates keep their first occurrence.
pub fn detect_mints(text: &str) -> Vec<DetectedMint> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<DetectedMint> = Vec::new();
    for m in MINT_RE.find_iter(text) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        if before.is_some_and(is_base58_char) || after.is_some_and(is_base58_char) {
            continue;
        }

        let lo = floor_char_boundary(text, m.start().saturating_sub(40));
        let hi = ceil_char_boundary(text, (m.end() + 40).min(text.len()));
        let window = text[lo..hi].to_lowercase();

        let mut score: i32 = 50;
        if ["ca", "contract", "mint", "address"].iter().any(|kw| window.contains(kw)) {
            score += 25;
        }
        if ["pump", "bonding"].iter().any(|kw| window.contains(kw)) {
            score += 10;
        }

        hits.push(DetectedMint {
            mint: m.as_str().to_string(),
            confidence: score.clamp(0, 100) as u8,
        });
    }

    // de-dupe, preserving order
    let mut out: Vec<DetectedMint> = Vec::new();
    for hit in hits {
        if !out.iter().any(|h| h.mint == hit.mint) {
            out.push(hit);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINT: &str = "6t3pCmYLzLbhUDg4uSWnBsVbHaRCHKhvjjENzBQJpump";

    #[test]
    fn detects_a_bare_mint() {
        let hits = detect_mints(MINT);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].mint, MINT);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(detect_mints("").is_empty());
    }

    #[test]
    fn contract_wording_raises_confidence() {
        // The window covers the match itself, so a mint ending in
        // "pump" already scores the pump bonus.
        let bare = detect_mints(&format!("xx {} xx", MINT));
        assert_eq!(bare[0].confidence, 60);
        let tagged = detect_mints(&format!("contract: {}", MINT));
        assert_eq!(tagged[0].confidence, 85);
    }

    #[test]
    fn pump_wording_stacks_on_top() {
        let hits = detect_mints(&format!("CA {} fresh on pump.fun", MINT));
        assert_eq!(hits[0].confidence, 85);
    }

    #[test]
    fn runs_longer_than_a_mint_are_rejected() {
        // 50 base58 chars: too long to be an address
        let long_run = "1".repeat(50);
        assert!(detect_mints(&long_run).is_empty());
    }

    #[test]
    fn duplicates_are_collapsed_in_order() {
        let text = format!("{} and again {}", MINT, MINT);
        assert_eq!(detect_mints(&text).len(), 1);
    }

    #[test]
    fn plausible_mint_rejects_wrong_alphabet_and_length() {
        assert!(is_plausible_mint(MINT));
        assert!(!is_plausible_mint("0xdeadbeef"));
        assert!(!is_plausible_mint(&"1".repeat(31)));
        assert!(!is_plausible_mint(&"1".repeat(45)));
        assert!(!is_plausible_mint("O0O0O0O0O0O0O0O0O0O0O0O0O0O0O0O0"));
    }

    #[test]
    fn detector_handles_multibyte_context() {
        let text = format!("🚀🚀 ca {} 🚀🚀", MINT);
        let hits = detect_mints(&text);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].confidence, 85);
    }
}
