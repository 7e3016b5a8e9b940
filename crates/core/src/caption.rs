//! Caption parsing: turns the free-text caption of a slide into a person's
//! name, birth year and height.
//!
//! Two caption styles are recognised:
//!
//! - `지민 (97) 175cm`: two-digit year in parentheses, `cm` optional.
//! - `VINCENT 1997's 179cm 프랑스`: four-digit year with an optional `'s`.
//!
//! When neither matches, the bottom-most caption text is used verbatim as the
//! name (with filesystem-unsafe characters replaced).

use crate::types::{Shape, Slide};
use regex::Regex;
use std::cmp::Reverse;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// `<name> (<yy>) <height>[cm]`
static PAREN_YEAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.+?)\s*\(([0-9]{2})\)\s*([0-9]{2,3})\s*(?:cm)?").unwrap());

/// `<name> <yyyy>['s] <height>cm`
static QUOTED_DECADE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(.+?)\s+([0-9]{4})(?:['\u{2019}]s)?\s+([0-9]{2,3})\s*cm").unwrap()
});

/// Characters that cannot appear in a filename on common filesystems.
const UNSAFE_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Caption matchers, tried in order on each candidate text.
const MATCHERS: &[fn(&str) -> Option<Identity>] = &[match_paren_year, match_quoted_decade];

/// How an identity was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionSource {
    /// A caption pattern matched.
    Matched,
    /// No pattern matched; the name is the raw caption text.
    Fallback,
    /// The slide has no text at all; the name is synthetic.
    Missing,
}

/// Person identity parsed from a caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    /// Two-digit birth year, empty if unknown.
    pub year: String,
    /// Height in cm (2-3 digits), empty if unknown.
    pub height: String,
    pub source: CaptionSource,
}

impl Identity {
    fn matched(name: &str, year: &str, height: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            year: year.to_string(),
            height: height.to_string(),
            source: CaptionSource::Matched,
        }
    }

    fn name_only(name: String, source: CaptionSource) -> Self {
        Self {
            name,
            year: String::new(),
            height: String::new(),
            source,
        }
    }

    /// Common filename prefix for every slot file of the slide:
    /// `name(yy)HHHcm`, or the name alone when the caption did not parse.
    pub fn base_name(&self) -> String {
        let name = sanitize_filename(&self.name);
        match self.source {
            CaptionSource::Matched => format!("{}({}){}cm", name, self.year, self.height),
            CaptionSource::Fallback | CaptionSource::Missing => name,
        }
    }
}

/// Parse the identity of a slide from its text shapes.
///
/// Candidates are read bottom-up, leftmost first within the same row; the
/// first candidate on which any pattern matches wins.
pub fn parse_caption(slide: &Slide) -> Identity {
    let mut candidates: Vec<&Shape> = slide.text_shapes().collect();

    if candidates.is_empty() {
        log::warn!(
            "slide {}: no caption text found, using default file name",
            slide.index
        );
        return Identity::name_only(format!("slide_{}", slide.index), CaptionSource::Missing);
    }

    candidates.sort_by_key(|s| (Reverse(s.top), s.left));
    let texts: Vec<String> = candidates
        .iter()
        .filter_map(|s| s.text())
        .map(|t| t.trim().nfc().collect())
        .collect();

    if let Some(identity) = texts.iter().find_map(|text| parse_caption_text(text)) {
        log::debug!(
            "slide {}: caption parsed as {:?}",
            slide.index,
            identity.base_name()
        );
        return identity;
    }

    let fallback = sanitize_filename(&texts[0]);
    log::warn!(
        "slide {}: caption did not match any known format, using '{}'",
        slide.index,
        fallback
    );
    Identity::name_only(fallback, CaptionSource::Fallback)
}

/// Try every caption pattern on a single text.
pub fn parse_caption_text(text: &str) -> Option<Identity> {
    MATCHERS.iter().find_map(|matcher| matcher(text))
}

fn match_paren_year(text: &str) -> Option<Identity> {
    let caps = PAREN_YEAR_REGEX.captures(text)?;
    Some(Identity::matched(&caps[1], &caps[2], &caps[3]))
}

fn match_quoted_decade(text: &str) -> Option<Identity> {
    let caps = QUOTED_DECADE_REGEX.captures(text)?;
    let year = &caps[2];
    Some(Identity::matched(&caps[1], &year[year.len() - 2..], &caps[3]))
}

/// Replace filesystem-unsafe characters with `_`.
pub fn sanitize_filename(text: &str) -> String {
    text.chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
