//! Human-readable labels from identifiers.

use regex::Regex;
use std::sync::OnceLock;

/// Substring after the last `/`, then after the last `#`.
pub fn local_name(iri: &str) -> &str {
    let after_slash = iri.rsplit('/').next().unwrap_or(iri);
    after_slash.rsplit('#').next().unwrap_or(after_slash)
}

/// Derive a label from an identifier's local name.
///
/// `http://x/geneSymbol` → `gene symbol`, `http://x#GeneID` → `Gene ID`,
/// `http://x/has_name` → `has name`.
pub fn derive_label(iri: &str) -> String {
    uncamel(&local_name(iri).replace('_', " "))
}

fn camel_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([^A-Z ])([A-Z])").expect("literal regex"))
}

/// Insert word boundaries into a camel-cased string.
///
/// Lower-cases the result only when its first character was already lowercase.
pub fn uncamel(s: &str) -> String {
    let spaced = camel_boundary().replace_all(s, "$1 $2");
    let spaced = split_acronym_runs(&spaced);
    match spaced.chars().next() {
        Some(first) if first.is_lowercase() => spaced.to_lowercase(),
        _ => spaced,
    }
}

/// Split an uppercase run off the capitalized word that follows it
/// (`HTMLParser` → `HTML Parser`).
///
/// Only runs starting at a word boundary are considered, and the run plus the
/// next capital must be at least two letters long.
fn split_acronym_runs(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    let mut i = 0;
    while i < chars.len() {
        let at_boundary = i == 0 || !is_word_char(chars[i - 1]);
        if at_boundary && chars[i].is_ascii_uppercase() {
            let mut end = i;
            while end < chars.len() && chars[end].is_ascii_uppercase() {
                end += 1;
            }
            let run = end - i;
            let split = run >= 2 && end < chars.len() && chars[end].is_ascii_lowercase();
            for (offset, c) in chars[i..end].iter().enumerate() {
                if split && offset == run - 1 {
                    out.push(' ');
                }
                out.push(*c);
            }
            i = end;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_name_takes_last_segment() {
        assert_eq!(local_name("http://x/a/geneSymbol"), "geneSymbol");
        assert_eq!(local_name("http://x/onto#GeneID"), "GeneID");
        assert_eq!(local_name("http://x/onto/"), "");
        assert_eq!(local_name("plain"), "plain");
    }

    #[test]
    fn camel_case_is_split_and_lowered() {
        assert_eq!(derive_label("http://x/geneSymbol"), "gene symbol");
        assert_eq!(derive_label("http://x/hasGeneSymbol"), "has gene symbol");
    }

    #[test]
    fn capitalized_identifiers_keep_their_case() {
        assert_eq!(derive_label("http://x#GeneID"), "Gene ID");
        assert_eq!(derive_label("http://x/Gene"), "Gene");
    }

    #[test]
    fn underscores_become_spaces() {
        assert_eq!(derive_label("http://x/has_name"), "has name");
    }

    #[test]
    fn acronym_run_is_split_from_following_word() {
        assert_eq!(derive_label("http://x/HTMLParser"), "HTML Parser");
        assert_eq!(derive_label("http://x/parseHTMLDocument"), "parse html document");
        assert_eq!(derive_label("http://x/ABc"), "A Bc");
    }

    #[test]
    fn digits_are_boundaries() {
        assert_eq!(derive_label("http://x/go2Term"), "go2 term");
    }

    #[test]
    fn empty_local_name_yields_empty_label() {
        assert_eq!(derive_label("http://x/"), "");
        assert_eq!(derive_label(""), "");
    }
}
