//! Diacritic folding for IAST-transliterated text

use unicode_normalization::UnicodeNormalization;

/// Fold `text` to plain lowercase ASCII-ish form so "Kṛṣṇa" and "krsna"
/// compare equal.
///
/// Steps, in order: lowercase, canonical decomposition with combining marks
/// (U+0300..=U+036F) removed, then the IAST substitution table. Decomposition
/// runs first, so precomposed letters such as `ś` already reduce to their
/// base letter before the table is consulted.
pub fn normalize_iast(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for ch in lowered.nfd().filter(|c| !is_combining_mark(*c)) {
        match fold_iast(ch) {
            Some(folded) => out.push_str(folded),
            None => out.push(ch),
        }
    }
    out
}

fn is_combining_mark(ch: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&ch)
}

/// Every letter here decomposes under NFD, so after mark stripping these arms
/// are unreachable from [`normalize_iast`]; `ś` and `ṣ` fold to `s`, not `sh`.
fn fold_iast(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'ā' => "a",
        'ī' => "i",
        'ū' => "u",
        'ṛ' | 'ṝ' => "r",
        'ḷ' | 'ḹ' => "l",
        'ē' => "e",
        'ō' => "o",
        'ṃ' => "m",
        'ḥ' => "h",
        'ś' | 'ṣ' => "sh",
        'ñ' | 'ṇ' | 'ṅ' => "n",
        'ṭ' => "t",
        'ḍ' => "d",
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_iast_diacritics() {
        assert_eq!(normalize_iast("Kṛṣṇa"), "krsna");
        assert_eq!(normalize_iast("Rāmāyaṇa"), "ramayana");
        assert_eq!(normalize_iast("Bhagavad Gītā"), "bhagavad gita");
        assert_eq!(normalize_iast("Ṛgveda"), "rgveda");
    }

    #[test]
    fn test_sibilants_fold_to_plain_s() {
        assert_eq!(normalize_iast("Śiva"), "siva");
        assert_eq!(normalize_iast("Viṣṇu"), "visnu");
        assert_eq!(normalize_iast("Kṛṣṇa"), normalize_iast("krsna"));
        assert_ne!(normalize_iast("Śiva"), "shiva");
    }

    #[test]
    fn test_table_letters_all_decompose() {
        for ch in "āīūṛṝḷḹēōṃḥśṣñṇṅṭḍ".chars() {
            let folded = normalize_iast(&ch.to_string());
            assert_eq!(folded.chars().count(), 1, "{ch} -> {folded}");
            assert!(folded.is_ascii(), "{ch} -> {folded}");
        }
    }

    #[test]
    fn test_plain_ascii_is_lowercased_only() {
        assert_eq!(normalize_iast("Mahabharata"), "mahabharata");
    }

    #[test]
    fn test_devanagari_passes_through() {
        let text = "रामायण";
        assert_eq!(normalize_iast(text), text.nfd().collect::<String>());
    }

    #[test]
    fn test_combining_marks_only_normalizes_to_empty() {
        assert_eq!(normalize_iast("\u{0301}\u{0304}"), "");
    }
}
