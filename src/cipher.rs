//! TLS cipher-suite classification against a fixed security taxonomy.
//!
//! Codes are 2-byte cipher-suite identifiers in canonical form: 4 hex digits,
//! lowercase, zero-left-padded. Classification data follows the IANA TLS
//! parameters registry, TLS 1.2/1.3 suites mainly:
//! <https://www.iana.org/assignments/tls-parameters/tls-parameters.xhtml#tls-parameters-4>

use crate::packet::{CipherSuiteField, TlsHandshakeView};
use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Security category of a cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Secure,
    Recommended,
    Weak,
    Insecure,
    Unknown,
}

impl Classification {
    /// All categories, in classification priority order (`Unknown` last).
    /// Downstream consumers rely on this ordering for rendered summaries.
    pub const ALL: [Classification; 5] = [
        Classification::Secure,
        Classification::Recommended,
        Classification::Weak,
        Classification::Insecure,
        Classification::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Secure => "Secure",
            Classification::Recommended => "Recommended",
            Classification::Weak => "Weak",
            Classification::Insecure => "Insecure",
            Classification::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Brings a cipher-suite identifier into canonical form: surrounding
/// whitespace stripped, lowercase, `0x` prefix dropped, zero-left-padded to
/// 4 characters.
///
/// Applied before every set lookup and when building the taxonomy itself, so
/// differently-formatted spellings of one code always compare equal.
pub fn normalize_code(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    let code = lowered.strip_prefix("0x").unwrap_or(&lowered);
    format!("{code:0>4}")
}

/// Read-only cipher-suite security taxonomy.
///
/// The category sets legitimately overlap (several DHE+AES-GCM codes appear
/// under both Secure and Recommended in different revisions of the source
/// data); [`Taxonomy::classify`] resolves overlaps with a fixed priority
/// order, so the result never depends on set iteration order.
#[derive(Debug)]
pub struct Taxonomy {
    secure: HashSet<String>,
    recommended: HashSet<String>,
    weak: HashSet<String>,
    insecure: HashSet<String>,
}

const SECURE: &[&str] = &[
    // TLS 1.3
    "1301", "1302", "1303",
    "c02f", "c02b", "c030", "c02c", "cca9", "cca8", "ccaa", "009f", "009e",
    "c0af", "c0ad", "c0ae", "c0ac",
];

const RECOMMENDED: &[&str] = &[
    "009f", "009e",
    "c023", "c027", "c00a", "c014", "c009", "c013",
];

const WEAK: &[&str] = &[
    "002f", "0033", "0035", "0039", "003c", "003d", "009c", "009d", "00a3",
    "0041", "0084", "0x00BA", "00c0", "c09c", "c0a0", "c09d", "c0a1", "0044",
    "0045", "0032", "0087", "0088", "c0a3", "c09f", "00a2", "c0a2", "c09e",
    "006a", "c073", "c077", "00c4", "00c3", "0040", "c072", "c076", "00be",
    "00bd", "0038",
];

const INSECURE: &[&str] = &["0000", "00ff"];

impl Taxonomy {
    fn normalized_set(codes: &[&str]) -> HashSet<String> {
        codes.iter().map(|c| normalize_code(c)).collect()
    }

    /// Builds the canonical taxonomy. Entries are normalized on the way in,
    /// so raw `0x`-prefixed spellings in the source data are reachable.
    pub fn new() -> Self {
        Taxonomy {
            secure: Self::normalized_set(SECURE),
            recommended: Self::normalized_set(RECOMMENDED),
            weak: Self::normalized_set(WEAK),
            insecure: Self::normalized_set(INSECURE),
        }
    }

    /// Classifies one cipher-suite identifier (any accepted spelling).
    ///
    /// Membership is checked in the fixed order Secure, Recommended, Weak,
    /// Insecure; the first match wins, and an unlisted code is `Unknown`.
    pub fn classify(&self, code: &str) -> Classification {
        let code = normalize_code(code);
        if self.secure.contains(&code) {
            Classification::Secure
        } else if self.recommended.contains(&code) {
            Classification::Recommended
        } else if self.weak.contains(&code) {
            Classification::Weak
        } else if self.insecure.contains(&code) {
            Classification::Insecure
        } else {
            Classification::Unknown
        }
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Taxonomy::new()
    }
}

lazy_static! {
    static ref DEFAULT_TAXONOMY: Taxonomy = Taxonomy::new();
}

/// Classifies one cipher-suite identifier against the process-wide taxonomy.
pub fn classify(code: &str) -> Classification {
    DEFAULT_TAXONOMY.classify(code)
}

fn split_tokens(text: &str) -> Vec<String> {
    // A comma-joined field wins over whitespace splitting; tokens keep their
    // raw spelling here and are normalized at tally time.
    if text.contains(',') {
        text.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// Extracts individual cipher-suite tokens from the heterogeneous field
/// shapes decoders produce. An empty field yields no tokens, not an error.
pub fn extract_codes(field: &CipherSuiteField) -> Vec<String> {
    match field {
        CipherSuiteField::Text(text) => split_tokens(text),
        // List elements may themselves be comma-joined; split each in turn.
        CipherSuiteField::List(tokens) => {
            tokens.iter().flat_map(|t| split_tokens(t)).collect()
        }
    }
}

/// Exact occurrence counts per category and per unique canonical code.
///
/// Accumulation is commutative: processing order never affects the final
/// counts, and two tallies built from disjoint shards merge by addition.
#[derive(Debug, Default)]
pub struct CipherTally {
    pub category_counts: HashMap<Classification, u64>,
    pub code_counts: HashMap<String, u64>,
}

impl CipherTally {
    pub fn new() -> Self {
        CipherTally::default()
    }

    /// Counts one observed code (any accepted spelling) under its canonical
    /// form and its category.
    pub fn observe(&mut self, taxonomy: &Taxonomy, raw: &str) {
        let code = normalize_code(raw);
        let category = taxonomy.classify(&code);
        *self.category_counts.entry(category).or_insert(0) += 1;
        *self.code_counts.entry(code).or_insert(0) += 1;
    }

    /// Adds another tally's counts into this one.
    pub fn merge(&mut self, other: CipherTally) {
        for (category, count) in other.category_counts {
            *self.category_counts.entry(category).or_insert(0) += count;
        }
        for (code, count) in other.code_counts {
            *self.code_counts.entry(code).or_insert(0) += count;
        }
    }

    /// Total number of code observations.
    pub fn total(&self) -> u64 {
        self.code_counts.values().sum()
    }

    pub fn count_for(&self, category: Classification) -> u64 {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }
}

/// Folds a batch of handshake views into per-category and per-code counts.
///
/// Records without a cipher-suite field contribute nothing; no record aborts
/// the batch.
pub fn tally<'a, I>(taxonomy: &Taxonomy, records: I) -> CipherTally
where
    I: IntoIterator<Item = &'a TlsHandshakeView>,
{
    let mut tally = CipherTally::new();
    for record in records {
        if let Some(field) = &record.cipher_suites {
            for code in extract_codes(field) {
                tally.observe(taxonomy, &code);
            }
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello(field: CipherSuiteField) -> TlsHandshakeView {
        TlsHandshakeView {
            handshake_type: crate::packet::HANDSHAKE_CLIENT_HELLO,
            cipher_suites: Some(field),
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("0x1301"), "1301");
        assert_eq!(normalize_code("  0X1301  "), "1301");
        assert_eq!(normalize_code("C02F"), "c02f");
        assert_eq!(normalize_code("ff"), "00ff");
        assert_eq!(normalize_code("0x2f"), "002f");
    }

    #[test]
    fn test_classify_accepts_any_spelling() {
        assert_eq!(classify("0x1301"), Classification::Secure);
        assert_eq!(classify("1301"), Classification::Secure);
        assert_eq!(classify("1302"), Classification::Secure);
        assert_eq!(classify("c023"), Classification::Recommended);
        assert_eq!(classify("002f"), Classification::Weak);
        assert_eq!(classify("00ff"), Classification::Insecure);
        assert_eq!(classify("ffff"), Classification::Unknown);
    }

    #[test]
    fn test_overlapping_membership_resolves_by_priority() {
        // 009e/009f are listed under both Secure and Recommended; Secure
        // wins, deterministically.
        assert_eq!(classify("009e"), Classification::Secure);
        assert_eq!(classify("009f"), Classification::Secure);
    }

    #[test]
    fn test_raw_prefixed_taxonomy_entry_is_reachable() {
        // The source data lists this entry as "0x00BA"; normalization at
        // table construction makes the canonical spelling match.
        assert_eq!(classify("00ba"), Classification::Weak);
        assert_eq!(classify("0x00BA"), Classification::Weak);
    }

    #[test]
    fn test_extract_codes_comma_joined_text() {
        let field = CipherSuiteField::Text("1301, 1302 ,1303".to_string());
        assert_eq!(extract_codes(&field), vec!["1301", "1302", "1303"]);
    }

    #[test]
    fn test_extract_codes_whitespace_text() {
        let field = CipherSuiteField::Text("0x1301 0xc02f".to_string());
        assert_eq!(extract_codes(&field), vec!["0x1301", "0xc02f"]);
    }

    #[test]
    fn test_extract_codes_list_with_comma_bearing_element() {
        let field = CipherSuiteField::List(vec![
            "1301".to_string(),
            "c02f,c02b".to_string(),
        ]);
        assert_eq!(extract_codes(&field), vec!["1301", "c02f", "c02b"]);
    }

    #[test]
    fn test_extract_codes_empty_field() {
        assert!(extract_codes(&CipherSuiteField::Text(String::new())).is_empty());
        assert!(extract_codes(&CipherSuiteField::List(Vec::new())).is_empty());
    }

    #[test]
    fn test_tally_counts_codes_and_categories() {
        let taxonomy = Taxonomy::new();
        let records = [
            hello(CipherSuiteField::Text("1301,1302".to_string())),
            hello(CipherSuiteField::Text("00ff".to_string())),
        ];
        let tally = tally(&taxonomy, &records);

        assert_eq!(tally.code_counts.get("1301"), Some(&1));
        assert_eq!(tally.code_counts.get("1302"), Some(&1));
        assert_eq!(tally.code_counts.get("00ff"), Some(&1));
        assert_eq!(tally.count_for(Classification::Secure), 2);
        assert_eq!(tally.count_for(Classification::Insecure), 1);
        assert_eq!(tally.count_for(Classification::Weak), 0);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_tally_skips_absent_fields() {
        let taxonomy = Taxonomy::new();
        let records = [TlsHandshakeView {
            handshake_type: crate::packet::HANDSHAKE_CLIENT_HELLO,
            cipher_suites: None,
        }];
        assert_eq!(tally(&taxonomy, &records).total(), 0);
    }

    #[test]
    fn test_tally_merge_adds_counts() {
        let taxonomy = Taxonomy::new();
        let mut a = CipherTally::new();
        a.observe(&taxonomy, "1301");
        a.observe(&taxonomy, "ffff");
        let mut b = CipherTally::new();
        b.observe(&taxonomy, "1301");

        a.merge(b);
        assert_eq!(a.code_counts.get("1301"), Some(&2));
        assert_eq!(a.count_for(Classification::Secure), 2);
        assert_eq!(a.count_for(Classification::Unknown), 1);
    }
}
