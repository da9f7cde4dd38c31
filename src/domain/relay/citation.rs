//! Provider citation marker removal.
//!
//! File-search assistants annotate text inline with footnotes such as
//! `【12:3†source.pdf】`. The widget has nowhere to show the referenced
//! source, so markers are removed before text leaves the gateway.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<lead>[ \t]*)【\d+(?::\d+)?†[^】]*】(?P<trail>[ \t]*)")
        .expect("citation pattern is valid")
});

static LEADING_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*【\d+(?::\d+)?†[^】]*】").expect("citation pattern is valid")
});

static TRAILING_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"【\d+(?::\d+)?†[^】]*】[ \t]*$").expect("citation pattern is valid")
});

/// Removes every citation marker from `text`.
///
/// The marker and the blanks around it collapse to a single space when it
/// sat between two words, and to nothing when it touched punctuation or a
/// fragment edge without surrounding blanks.
pub fn strip_citations(text: &str) -> String {
    if !text.contains('【') {
        return text.to_string();
    }

    CITATION
        .replace_all(text, |caps: &Captures<'_>| {
            let (start, end) = caps.get(0).map_or((0, 0), |m| (m.start(), m.end()));
            let padded = !caps["lead"].is_empty() || !caps["trail"].is_empty();
            let before = text[..start].chars().next_back();
            let after = text[end..].chars().next();

            let space = match (before, after) {
                (_, Some(c)) if is_closing_punctuation(c) => false,
                (None, _) | (_, None) => padded,
                _ => true,
            };
            if space { " " } else { "" }
        })
        .into_owned()
}

fn is_closing_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')' | ']' | '\n')
}

/// Scrubs the fragments of one streamed reply.
///
/// Markers often arrive as deltas of their own, or at the edge of one.
/// `strip_citations` sees only one fragment at a time, so the scrubber
/// carries the word gap a marker stood for over to the next fragment.
#[derive(Debug, Default)]
pub struct CitationScrubber {
    /// A dropped marker or blank sat right after the last emitted text.
    gap: bool,
    /// The last emitted text ended in a non-blank.
    after_word: bool,
}

impl CitationScrubber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text to relay, or `None` when nothing visible is left.
    pub fn scrub(&mut self, fragment: &str) -> Option<String> {
        let cleaned = strip_citations(fragment);
        if cleaned.trim().is_empty() {
            self.gap |= !fragment.is_empty();
            return None;
        }

        let gap = self.gap || LEADING_CITATION.is_match(fragment);
        let mut out = String::with_capacity(cleaned.len() + 1);
        if gap
            && self.after_word
            && cleaned.starts_with(|c: char| !c.is_whitespace() && !is_closing_punctuation(c))
        {
            out.push(' ');
        }
        out.push_str(&cleaned);

        self.gap = TRAILING_CITATION.is_match(fragment);
        self.after_word = !out.ends_with(char::is_whitespace);
        Some(out)
    }
}
