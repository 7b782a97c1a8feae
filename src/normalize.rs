//! Rendered-markup to canonical-sentence normalization.
//!
//! Turns the rendered HTML of a page's lead section into the single
//! plain-text sentence the timeline compares across revisions:
//!
//! 1. Drop embedded noise blocks (`<script>`, `<style>`, citation
//!    `<sup class="reference">` markers, HTML comments).
//! 2. Replace block-level tags with a space and remove all other tags.
//! 3. Decode a fixed set of character entities.
//! 4. Collapse whitespace runs and trim.
//! 5. Optionally re-anchor at the first configured lead-in phrase.
//! 6. Take the text up to the first `.`, `!` or `?` followed by whitespace
//!    or end of text, falling back to a bounded prefix.
//!
//! Everything here is pure and deterministic.

use anyhow::{Context, Result};
use regex::Regex;
use std::sync::OnceLock;

use crate::config::NormalizeConfig;

/// Prefix length used when no sentence terminator is found.
pub const DEFAULT_FALLBACK_CHARS: usize = 500;

/// Entities decoded after tag stripping. `&amp;` must stay last so that
/// `&amp;lt;` decodes to the literal text `&lt;`.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&#160;", " "),
    ("&lt;", "<"),
    ("&#60;", "<"),
    ("&gt;", ">"),
    ("&#62;", ">"),
    ("&quot;", "\""),
    ("&#34;", "\""),
    ("&#39;", "'"),
    ("&#91;", "["),
    ("&#93;", "]"),
    ("&amp;", "&"),
];

fn noise_blocks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?is)<script\b[^>]*>.*?</script\s*>",
            r"|<style\b[^>]*>.*?</style\s*>",
            r#"|<sup\b[^>]*class="[^"]*\breference\b[^"]*"[^>]*>.*?</sup\s*>"#,
            r"|<!--.*?-->",
        ))
        .expect("noise block pattern is valid")
    })
}

fn block_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)</?(?:p|div|br|li|ul|ol|dl|dd|dt|tr|td|th|table|tbody|thead|h[1-6]|blockquote|figure|figcaption)\b[^>]*>",
        )
        .expect("block tag pattern is valid")
    })
}

fn any_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Strip markup from rendered content and return whitespace-collapsed text.
pub fn clean_markup(raw: &str) -> String {
    let text = noise_blocks().replace_all(raw, " ");
    let text = block_tags().replace_all(&text, " ");
    let text = any_tag().replace_all(&text, "");
    let decoded = decode_entities(&text);
    collapse_whitespace(&decoded)
}

fn decode_entities(text: &str) -> String {
    let mut out = text.to_string();
    for (entity, replacement) in ENTITIES {
        if out.contains(entity) {
            out = out.replace(entity, replacement);
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Leading sentence of already-clean text.
///
/// A sentence ends at the first `.`, `!` or `?` that is followed by
/// whitespace or the end of the text. Without one, the first
/// `fallback_chars` characters are returned. Empty input yields `None`.
pub fn first_sentence(text: &str, fallback_chars: usize) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = match chars.peek() {
                None => true,
                Some((_, next)) => next.is_whitespace(),
            };
            if at_boundary {
                return Some(text[..idx + c.len_utf8()].to_string());
            }
        }
    }

    let prefix: String = text.chars().take(fallback_chars.max(1)).collect();
    Some(prefix.trim_end().to_string())
}

/// Markup normalizer with an optional set of lead-in anchors.
///
/// Lead-in patterns are regular expressions (use `(?i)` for case-insensitive
/// matching). When any of them matches the cleaned text, extraction starts
/// at the earliest match, discarding captions or hatnotes that precede the
/// real opening sentence.
#[derive(Debug, Clone)]
pub struct Normalizer {
    lead_ins: Vec<Regex>,
    fallback_chars: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            lead_ins: Vec::new(),
            fallback_chars: DEFAULT_FALLBACK_CHARS,
        }
    }
}

impl Normalizer {
    pub fn new(patterns: &[String], fallback_chars: usize) -> Result<Self> {
        let lead_ins = patterns
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("Invalid lead-in pattern: {}", p)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            lead_ins,
            fallback_chars,
        })
    }

    pub fn from_config(config: &NormalizeConfig) -> Result<Self> {
        Self::new(&config.lead_in_patterns, config.fallback_chars)
    }

    /// Canonical leading sentence of rendered content, if any.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let cleaned = clean_markup(raw);
        if cleaned.is_empty() {
            return None;
        }
        first_sentence(self.anchor(&cleaned), self.fallback_chars)
    }

    fn anchor<'t>(&self, text: &'t str) -> &'t str {
        self.lead_ins
            .iter()
            .filter_map(|re| re.find(text).map(|m| m.start()))
            .min()
            .map(|start| &text[start..])
            .unwrap_or(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_takes_first_sentence() {
        let html = r#"<div class="mw-parser-output"><p>The <b>27 Club</b> is a list of <a href="/wiki/Musician">musicians</a> who died at 27. It is popular culture.</p></div>"#;
        let n = Normalizer::default();
        assert_eq!(
            n.normalize(html).as_deref(),
            Some("The 27 Club is a list of musicians who died at 27.")
        );
    }

    #[test]
    fn drops_script_style_comments_and_citations() {
        let html = concat!(
            "<style>.x{color:red}</style>",
            "<script>var a = 'Hello. World.';</script>",
            "<!-- hidden. note -->",
            "<p>Alpha beta<sup id=\"cite_ref-1\" class=\"reference\"><a href=\"#cite_note-1\">&#91;1&#93;</a></sup> gamma.</p>",
        );
        assert_eq!(
            Normalizer::default().normalize(html).as_deref(),
            Some("Alpha beta gamma.")
        );
    }

    #[test]
    fn decodes_entities() {
        let cleaned = clean_markup("<p>Tom&nbsp;&amp;&nbsp;Jerry &lt;3 &quot;cats&quot; &#91;a&#93;</p>");
        assert_eq!(cleaned, "Tom & Jerry <3 \"cats\" [a]");
    }

    #[test]
    fn ampersand_is_decoded_once() {
        assert_eq!(clean_markup("a &amp;lt; b"), "a &lt; b");
    }

    #[test]
    fn block_tags_separate_words() {
        assert_eq!(clean_markup("<p>one</p><p>two</p>"), "one two");
        assert_eq!(clean_markup("line<br/>break"), "line break");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean_markup("  a \n\n b\t c  "), "a b c");
    }

    #[test]
    fn terminator_must_be_followed_by_space_or_end() {
        assert_eq!(
            first_sentence("Version 2.5 shipped in 2005! Then more.", 500).as_deref(),
            Some("Version 2.5 shipped in 2005!")
        );
        assert_eq!(first_sentence("Is it?", 500).as_deref(), Some("Is it?"));
    }

    #[test]
    fn falls_back_to_bounded_prefix() {
        let text = "word ".repeat(200);
        let sentence = first_sentence(&text, 20).unwrap();
        assert_eq!(sentence, "word word word word");
        assert!(sentence.chars().count() <= 20);
    }

    #[test]
    fn fallback_counts_characters_not_bytes() {
        let sentence = first_sentence("ééééé", 3).unwrap();
        assert_eq!(sentence, "ééé");
    }

    #[test]
    fn empty_content_is_none() {
        let n = Normalizer::default();
        assert_eq!(n.normalize(""), None);
        assert_eq!(n.normalize("<div>  </div><script>x.</script>"), None);
    }

    #[test]
    fn idempotent_on_clean_sentence() {
        let n = Normalizer::default();
        let s = "The 27 Club is a list of musicians.";
        assert_eq!(n.normalize(s).as_deref(), Some(s));
        let once = n.normalize("<p>Hello   <i>there</i>.</p>").unwrap();
        assert_eq!(n.normalize(&once), Some(once));
    }

    #[test]
    fn lead_in_reanchors_past_boilerplate() {
        let n = Normalizer::new(&["(?i)the 27 club is".to_string()], 500).unwrap();
        let html = "<div>Not to be confused with 27 (number). Jimi Hendrix in 1967</div>\
                    <p>The 27 Club is an informal list of popular musicians. More text.</p>";
        assert_eq!(
            n.normalize(html).as_deref(),
            Some("The 27 Club is an informal list of popular musicians.")
        );
    }

    #[test]
    fn earliest_lead_in_wins() {
        let patterns = vec!["Forever 27".to_string(), "(?i)the 27 club".to_string()];
        let n = Normalizer::new(&patterns, 500).unwrap();
        let text = "Caption. The 27 Club, also Forever 27, is a list.";
        assert_eq!(
            n.normalize(text).as_deref(),
            Some("The 27 Club, also Forever 27, is a list.")
        );
    }

    #[test]
    fn missing_lead_in_leaves_sentence_alone() {
        let n = Normalizer::new(&["The 27 Club is".to_string()], 500).unwrap();
        assert_eq!(
            n.normalize("<p>Something else entirely. Yes.</p>").as_deref(),
            Some("Something else entirely.")
        );
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = Normalizer::new(&["(unclosed".to_string()], 500).unwrap_err();
        assert!(err.to_string().contains("Invalid lead-in pattern"));
    }
}
