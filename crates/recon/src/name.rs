//! Bilingual owner-name matching.
//!
//! Names arrive in Devanagari (Hindi) and/or Latin (English) script, often
//! inconsistently transliterated. Matching is heuristic: normalized exact
//! comparison first, then edit-distance similarity, then phonetic folding,
//! keeping the best score seen. This is not a transliteration model.

use serde::Serialize;
use similar::TextDiff;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

// Honorifics and titles stripped before comparison.
const HINDI_TITLES: &[&str] = &[
    "श्री", "श्रीमती", "कुमारी", "डॉ", "डॉ.", "स्व.", "स्वर्गीय",
    "बाबू", "चौधरी", "ठाकुर", "राजा", "पंडित", "मौलवी",
];

const ENGLISH_TITLES: &[&str] = &[
    "shri", "smt", "kumari", "dr", "dr.", "late", "mr", "mrs", "ms",
    "babu", "chaudhary", "thakur", "raja", "pandit", "maulvi",
];

// Digraph folds applied in order when building a phonetic key.
const PHONETIC_FOLDS: &[(&str, &str)] = &[
    ("ph", "f"),
    ("gh", "g"),
    ("kh", "k"),
    ("th", "t"),
    ("dh", "d"),
    ("bh", "b"),
    ("chh", "ch"),
    ("sh", "s"),
    ("ee", "i"),
    ("oo", "u"),
    ("aa", "a"),
    ("ai", "e"),
    ("au", "o"),
    ("y", "i"),
    ("w", "v"),
];

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactHindi,
    ExactEnglish,
    HindiFuzzy,
    EnglishFuzzy,
    Phonetic,
    CrossScript,
    None,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactHindi => write!(f, "exact_hindi"),
            Self::ExactEnglish => write!(f, "exact_english"),
            Self::HindiFuzzy => write!(f, "hindi_fuzzy"),
            Self::EnglishFuzzy => write!(f, "english_fuzzy"),
            Self::Phonetic => write!(f, "phonetic"),
            Self::CrossScript => write!(f, "cross_script"),
            Self::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize)]
pub struct NameMatch {
    /// 0-100.
    pub score: f64,
    pub match_type: MatchType,
    pub confidence: Confidence,
    pub explanation: String,
    pub explanation_hindi: String,
    /// The two normalized or folded forms the winning strategy compared.
    pub compared: Option<(String, String)>,
}

/// Owner score after folding in the father-name comparison.
#[derive(Debug, Clone, Serialize)]
pub struct FatherAdjustment {
    pub score: f64,
    pub explanation: String,
    pub explanation_hindi: String,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Strip honorifics, NFC-normalize, drop punctuation, collapse whitespace.
pub fn normalize_hindi(name: &str) -> String {
    let without_titles: Vec<&str> = name
        .split_whitespace()
        .filter(|w| !HINDI_TITLES.contains(w))
        .collect();

    let nfc: String = without_titles.join(" ").nfc().collect();

    let cleaned: String = nfc
        .chars()
        .map(|c| match c {
            '।' | '॥' | ',' | '.' | '-' | '/' => ' ',
            other => other,
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase, strip honorifics, keep `[a-z ]` only, collapse whitespace.
pub fn normalize_english(name: &str) -> String {
    let lower = name.to_lowercase();
    let without_titles: Vec<&str> = lower
        .split_whitespace()
        .filter(|w| !ENGLISH_TITLES.contains(w))
        .collect();

    let cleaned: String = without_titles
        .join(" ")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || *c == ' ')
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold digraphs, drop repeated letters, drop vowels except the first
/// character. Similar-sounding transliterations collapse to the same key.
pub fn phonetic_key(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let mut key = name.to_lowercase();
    for (pattern, replacement) in PHONETIC_FOLDS {
        key = key.replace(pattern, replacement);
    }

    let mut deduped = String::with_capacity(key.len());
    let mut prev = None;
    for c in key.chars() {
        if Some(c) != prev {
            deduped.push(c);
        }
        prev = Some(c);
    }

    let mut chars = deduped.chars();
    match chars.next() {
        Some(first) => {
            let rest: String = chars.filter(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')).collect();
            let mut out = String::with_capacity(rest.len() + 4);
            out.push(first);
            out.push_str(&rest);
            out
        }
        None => String::new(),
    }
}

/// Character-level similarity ratio, scaled to 0-100.
fn similarity(a: &str, b: &str) -> f64 {
    f64::from(TextDiff::from_chars(a, b).ratio()) * 100.0
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Compare two owners that may each be named in Hindi and/or English.
/// Keeps the best score across strategies; exact normalized matches
/// short-circuit at 100.
pub fn compare_names(
    name1_hindi: Option<&str>,
    name1_english: Option<&str>,
    name2_hindi: Option<&str>,
    name2_english: Option<&str>,
) -> NameMatch {
    let h1 = normalize_hindi(name1_hindi.unwrap_or(""));
    let e1 = normalize_english(name1_english.unwrap_or(""));
    let h2 = normalize_hindi(name2_hindi.unwrap_or(""));
    let e2 = normalize_english(name2_english.unwrap_or(""));

    if !h1.is_empty() && h1 == h2 {
        return NameMatch {
            score: 100.0,
            match_type: MatchType::ExactHindi,
            confidence: Confidence::High,
            explanation: "Hindi names match exactly".into(),
            explanation_hindi: "हिंदी नाम पूर्णतः मेल खाता है".into(),
            compared: Some((h1.clone(), h1)),
        };
    }

    if !e1.is_empty() && e1 == e2 {
        return NameMatch {
            score: 100.0,
            match_type: MatchType::ExactEnglish,
            confidence: Confidence::High,
            explanation: "English names match exactly".into(),
            explanation_hindi: "अंग्रेजी नाम पूर्णतः मेल खाता है".into(),
            compared: Some((e1.clone(), e1)),
        };
    }

    let mut best_score = 0.0_f64;
    let mut match_type = MatchType::None;
    let mut compared = None;

    let mut consider = |score: f64, kind: MatchType, left: &str, right: &str| {
        if score > best_score {
            best_score = score;
            match_type = kind;
            compared = Some((left.to_string(), right.to_string()));
        }
    };

    if !h1.is_empty() && !h2.is_empty() {
        consider(similarity(&h1, &h2), MatchType::HindiFuzzy, &h1, &h2);
    }

    if !e1.is_empty() && !e2.is_empty() {
        consider(similarity(&e1, &e2), MatchType::EnglishFuzzy, &e1, &e2);

        let p1 = phonetic_key(&e1);
        let p2 = phonetic_key(&e2);
        consider(similarity(&p1, &p2), MatchType::Phonetic, &p1, &p2);
    }

    // Cross-script: fold both sides and compare phonetic keys. Crude, but
    // catches records where only one script was transcribed on each side.
    if !h1.is_empty() && !e2.is_empty() {
        let kh = phonetic_key(&h1);
        let ke = phonetic_key(&e2);
        consider(similarity(&kh, &ke), MatchType::CrossScript, &kh, &ke);
    }
    if !h2.is_empty() && !e1.is_empty() {
        let kh = phonetic_key(&h2);
        let ke = phonetic_key(&e1);
        consider(similarity(&kh, &ke), MatchType::CrossScript, &kh, &ke);
    }

    let confidence = if best_score >= 90.0 {
        Confidence::High
    } else if best_score >= 75.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    let (explanation, explanation_hindi) = if best_score >= 85.0 {
        (
            format!("Names are {best_score:.0}% similar (likely spelling variation)"),
            format!("नाम {best_score:.0}% समान है (संभवतः वर्तनी भिन्नता)"),
        )
    } else if best_score >= 70.0 {
        (
            format!("Names are {best_score:.0}% similar (possible match)"),
            format!("नाम {best_score:.0}% समान है (संभावित मिलान)"),
        )
    } else {
        (
            format!("Names differ by {:.0}%", 100.0 - best_score),
            format!("नाम में {:.0}% अंतर है", 100.0 - best_score),
        )
    };

    NameMatch {
        score: best_score,
        match_type,
        confidence,
        explanation,
        explanation_hindi,
        compared,
    }
}

/// Adjust an owner match by how well the father names correlate: a strong
/// father match lifts the score, a poor one pulls it down.
pub fn correlate_father_name(
    owner_match: &NameMatch,
    father1_hindi: Option<&str>,
    father1_english: Option<&str>,
    father2_hindi: Option<&str>,
    father2_english: Option<&str>,
) -> FatherAdjustment {
    let father = compare_names(father1_hindi, father1_english, father2_hindi, father2_english);
    let base = owner_match.score;

    if father.score >= 85.0 {
        FatherAdjustment {
            score: (base + 10.0).min(100.0),
            explanation: "Both owner and father names match".into(),
            explanation_hindi: "मालिक और पिता के नाम दोनों मेल खाते हैं".into(),
        }
    } else if father.score >= 60.0 {
        FatherAdjustment {
            score: base,
            explanation: "Owner name matches, father name partially differs".into(),
            explanation_hindi: "मालिक का नाम मिलता है, पिता के नाम में कुछ अंतर".into(),
        }
    } else {
        FatherAdjustment {
            score: (base - 15.0).max(0.0),
            explanation: "Owner name matches but father name differs".into(),
            explanation_hindi: "मालिक का नाम मिलता है लेकिन पिता का नाम अलग है".into(),
        }
    }
}

/// Tiebreak order when two candidates score the same: an exact match
/// outranks a fuzzy one, which outranks a phonetic collision.
fn strategy_rank(match_type: MatchType) -> u8 {
    match match_type {
        MatchType::ExactHindi | MatchType::ExactEnglish => 0,
        MatchType::HindiFuzzy | MatchType::EnglishFuzzy => 1,
        MatchType::Phonetic => 2,
        MatchType::CrossScript => 3,
        MatchType::None => 4,
    }
}

/// Rank candidates by similarity to a target in either script. The target's
/// script is detected by Devanagari code points.
pub fn find_similar_names(
    target: &str,
    candidates: &[(Option<String>, Option<String>, Uuid)],
    threshold: f64,
    max_results: usize,
) -> Vec<(Uuid, NameMatch)> {
    let is_hindi = target.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c));

    let mut results: Vec<(Uuid, NameMatch)> = candidates
        .iter()
        .map(|(hindi, english, id)| {
            let m = if is_hindi {
                compare_names(Some(target), None, hindi.as_deref(), english.as_deref())
            } else {
                compare_names(None, Some(target), hindi.as_deref(), english.as_deref())
            };
            (*id, m)
        })
        .filter(|(_, m)| m.score >= threshold)
        .collect();

    results.sort_by(|a, b| {
        b.1.score
            .total_cmp(&a.1.score)
            .then(strategy_rank(a.1.match_type).cmp(&strategy_rank(b.1.match_type)))
    });
    results.truncate(max_results);
    results
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_hindi_match_short_circuits() {
        let m = compare_names(Some("राम शर्मा"), None, Some("राम शर्मा"), None);
        assert_eq!(m.score, 100.0);
        assert_eq!(m.match_type, MatchType::ExactHindi);
        assert_eq!(m.confidence, Confidence::High);
    }

    #[test]
    fn honorific_stripped_before_exact_match() {
        let m = compare_names(Some("श्री राम शर्मा"), None, Some("राम शर्मा"), None);
        assert_eq!(m.score, 100.0);
        assert_eq!(m.match_type, MatchType::ExactHindi);
    }

    #[test]
    fn exact_english_after_case_and_title_folding() {
        let m = compare_names(None, Some("Shri Ram Sharma"), None, Some("ram sharma"));
        assert_eq!(m.score, 100.0);
        assert_eq!(m.match_type, MatchType::ExactEnglish);
    }

    #[test]
    fn phonetic_key_folds_transliteration_variants() {
        assert_eq!(phonetic_key("sharma"), phonetic_key("sarma"));
        assert_eq!(phonetic_key("tiwari"), phonetic_key("tivari"));
        assert_eq!(phonetic_key("deepak"), phonetic_key("dipak"));
    }

    #[test]
    fn phonetic_key_drops_vowels_except_first() {
        assert_eq!(phonetic_key("anita"), "ant");
    }

    #[test]
    fn spelling_variant_scores_high_not_exact() {
        let m = compare_names(None, Some("Ram Sharma"), None, Some("Ram Sarma"));
        assert!(m.score >= 85.0, "got {}", m.score);
        assert!(m.score < 100.0 || m.match_type == MatchType::Phonetic);
        assert_ne!(m.match_type, MatchType::ExactEnglish);
    }

    #[test]
    fn unrelated_names_score_low() {
        let m = compare_names(None, Some("Ram Sharma"), None, Some("Krishna Verma"));
        assert_eq!(m.confidence, Confidence::Low);
        assert!(m.score < 75.0, "got {}", m.score);
    }

    #[test]
    fn empty_inputs_give_no_match() {
        let m = compare_names(None, None, None, None);
        assert_eq!(m.score, 0.0);
        assert_eq!(m.match_type, MatchType::None);
        assert!(m.compared.is_none());
    }

    #[test]
    fn father_match_boosts_capped_at_100() {
        let owner = compare_names(None, Some("ram kumar"), None, Some("shyam kumar"));
        assert!(owner.score < 90.0, "fixture should be a partial match");
        let adjusted = correlate_father_name(
            &owner,
            None,
            Some("mohan sharma"),
            None,
            Some("mohan sharma"),
        );
        assert_eq!(adjusted.score, (owner.score + 10.0).min(100.0));

        let exact = compare_names(None, Some("ram sharma"), None, Some("ram sharma"));
        let capped = correlate_father_name(
            &exact,
            None,
            Some("mohan sharma"),
            None,
            Some("mohan sharma"),
        );
        assert_eq!(capped.score, 100.0);
    }

    #[test]
    fn father_mismatch_reduces_floored_at_zero() {
        let owner = compare_names(None, Some("ram"), None, Some("shyam"));
        let adjusted =
            correlate_father_name(&owner, None, Some("mohan"), None, Some("gopal das"));
        assert!(adjusted.score <= owner.score);
        assert!(adjusted.score >= 0.0);
    }

    #[test]
    fn father_partial_match_leaves_score_unchanged() {
        let owner = compare_names(None, Some("ram sharma"), None, Some("ram sharma"));
        // "mohan lal" vs "mohan das" is similar but below the boost band.
        let adjusted =
            correlate_father_name(&owner, None, Some("mohan lal"), None, Some("mohan das"));
        assert_eq!(adjusted.score, owner.score);
    }

    #[test]
    fn find_similar_ranks_descending_and_truncates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let candidates = vec![
            (None, Some("ram sarma".to_string()), a),
            (None, Some("ram sharma".to_string()), b),
            (None, Some("krishna verma".to_string()), c),
        ];
        let results = find_similar_names("ram sharma", &candidates, 70.0, 10);
        // "ram sarma" also reaches 100 through its phonetic key; the exact
        // match must still rank first.
        assert_eq!(results[0].0, b);
        assert_eq!(results[0].1.score, 100.0);
        assert_eq!(results[0].1.match_type, MatchType::ExactEnglish);
        assert!(results.iter().all(|(id, _)| *id != c));
        for pair in results.windows(2) {
            assert!(pair[0].1.score >= pair[1].1.score);
        }
    }

    #[test]
    fn find_similar_detects_devanagari_target() {
        let a = Uuid::new_v4();
        let candidates = vec![(Some("राम शर्मा".to_string()), None, a)];
        let results = find_similar_names("राम शर्मा", &candidates, 70.0, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.match_type, MatchType::ExactHindi);
    }

    #[test]
    fn normalize_hindi_strips_punctuation() {
        assert_eq!(normalize_hindi("राम। शर्मा॥"), "राम शर्मा");
    }

    #[test]
    fn normalize_english_keeps_letters_only() {
        assert_eq!(normalize_english("Dr. Ram-Sharma 2nd"), "ramsharma nd");
    }
}
