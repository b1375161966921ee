//! Interactive markup parsing
//!
//! Catalog messages may carry inline tags for hover text and click actions:
//!
//! - `[hover:Tooltip text]displayed text[/hover]`
//! - `[command:/spawn]click to run[/command]`
//! - `[suggest:/msg ]click to prefill[/suggest]`
//!
//! Bare `http(s)://` URLs become clickable links when the owning catalog
//! enables them. [`parse`] tokenizes one line into an ordered list of
//! [`Segment`]s; anything unmatched stays plain text.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HOVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[hover:([^\]]+)\]([^\[]+)\[/hover\]").unwrap());

static COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[command:([^\]]+)\]([^\[]+)\[/command\]").unwrap());

static SUGGEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[suggest:([^\]]+)\]([^\[]+)\[/suggest\]").unwrap());

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());

// ============================================================================
// Segment model
// ============================================================================

/// Text colors a segment can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

/// Character-level styling flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub color: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underlined: bool,
    pub strikethrough: bool,
    pub obfuscated: bool,
}

/// Click actions a segment can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickAction {
    OpenUrl,
    RunCommand,
    SuggestCommand,
    Copy,
}

/// A click action paired with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub action: ClickAction,
    pub value: String,
}

/// The atomic unit of rendered output: a run of text with optional style,
/// hover text, and click behavior. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    #[serde(default)]
    pub style: Style,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click: Option<ClickEvent>,
}

impl Segment {
    /// Plain unstyled text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::default(),
            hover_text: None,
            click: None,
        }
    }

    /// Text with a hover tooltip.
    pub fn hover(text: impl Into<String>, hover_text: impl Into<String>) -> Self {
        Self {
            hover_text: Some(hover_text.into()),
            ..Self::plain(text)
        }
    }

    /// Text with a click action.
    pub fn clickable(text: impl Into<String>, action: ClickAction, value: impl Into<String>) -> Self {
        Self {
            click: Some(ClickEvent {
                action,
                value: value.into(),
            }),
            ..Self::plain(text)
        }
    }

    /// An auto-detected URL: underlined, aqua, opens the URL on click.
    pub fn link(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            style: Style {
                color: Some(Color::Aqua),
                underlined: true,
                ..Style::default()
            },
            click: Some(ClickEvent {
                action: ClickAction::OpenUrl,
                value: url.clone(),
            }),
            ..Self::plain(url)
        }
    }

    /// Whether the segment carries no styling, hover, or click behavior.
    pub fn is_plain(&self) -> bool {
        self.style == Style::default() && self.hover_text.is_none() && self.click.is_none()
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Tokenize one line into rendered segments.
///
/// Passes run in fixed order (hover, run-command, suggest-command, then
/// URLs when `clickable_links` is set); each pass consumes only the text
/// left unmatched by earlier passes, so tags do not nest within a line.
/// Unmatched text is preserved as plain segments in source order, and the
/// remainder after all passes becomes a final plain segment. Never fails:
/// a line without markup comes back as a single plain segment.
pub fn parse(line: &str, clickable_links: bool) -> Vec<Segment> {
    let mut segments = Vec::new();
    if line.is_empty() {
        return segments;
    }

    let mut rest = line.to_string();
    rest = run_pass(&rest, &HOVER_RE, &mut segments, |caps| {
        Segment::hover(&caps[2], &caps[1])
    });
    rest = run_pass(&rest, &COMMAND_RE, &mut segments, |caps| {
        Segment::clickable(&caps[2], ClickAction::RunCommand, &caps[1])
    });
    rest = run_pass(&rest, &SUGGEST_RE, &mut segments, |caps| {
        Segment::clickable(&caps[2], ClickAction::SuggestCommand, &caps[1])
    });
    if clickable_links {
        rest = run_pass(&rest, &URL_RE, &mut segments, |caps| Segment::link(&caps[0]));
    }

    if !rest.is_empty() {
        segments.push(Segment::plain(rest));
    }

    segments
}

/// Scan `text` with `re`, flushing unmatched prefixes as plain segments and
/// mapping each match through `make`. Returns the unmatched tail.
fn run_pass(
    text: &str,
    re: &Regex,
    out: &mut Vec<Segment>,
    make: impl Fn(&Captures) -> Segment,
) -> String {
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let whole = caps.get(0).expect("match has a group 0");
        if whole.start() > last {
            out.push(Segment::plain(&text[last..whole.start()]));
        }
        out.push(make(&caps));
        last = whole.end();
    }
    text[last..].to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_round_trip() {
        let segments = parse("plain text", false);
        assert_eq!(segments, vec![Segment::plain("plain text")]);
    }

    #[test]
    fn test_empty_line() {
        assert!(parse("", true).is_empty());
    }

    #[test]
    fn test_hover_tag() {
        let segments = parse("[hover:Hi]Click[/hover]", true);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Click");
        assert_eq!(segments[0].hover_text.as_deref(), Some("Hi"));
        assert!(segments[0].click.is_none());
    }

    #[test]
    fn test_hover_with_surrounding_text() {
        let segments = parse("before [hover:tip]mid[/hover] after", true);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Segment::plain("before "));
        assert_eq!(segments[1].hover_text.as_deref(), Some("tip"));
        assert_eq!(segments[2], Segment::plain(" after"));
    }

    #[test]
    fn test_command_tag() {
        let segments = parse("[command:/spawn]Go home[/command]", true);
        assert_eq!(segments.len(), 1);
        let click = segments[0].click.as_ref().unwrap();
        assert_eq!(click.action, ClickAction::RunCommand);
        assert_eq!(click.value, "/spawn");
        assert_eq!(segments[0].text, "Go home");
    }

    #[test]
    fn test_suggest_tag() {
        let segments = parse("[suggest:/msg admin ]Message staff[/suggest]", true);
        let click = segments[0].click.as_ref().unwrap();
        assert_eq!(click.action, ClickAction::SuggestCommand);
        assert_eq!(click.value, "/msg admin ");
    }

    #[test]
    fn test_url_detection() {
        let segments = parse("visit https://example.com now", true);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Segment::plain("visit "));
        assert_eq!(segments[1].text, "https://example.com");
        assert_eq!(segments[1].style.color, Some(Color::Aqua));
        assert!(segments[1].style.underlined);
        let click = segments[1].click.as_ref().unwrap();
        assert_eq!(click.action, ClickAction::OpenUrl);
        assert_eq!(click.value, "https://example.com");
        assert_eq!(segments[2], Segment::plain(" now"));
    }

    #[test]
    fn test_url_disabled() {
        let segments = parse("visit https://example.com now", false);
        assert_eq!(segments, vec![Segment::plain("visit https://example.com now")]);
    }

    #[test]
    fn test_url_is_greedy_to_whitespace() {
        let segments = parse("http://a.example/path?q=1 tail", true);
        assert_eq!(segments[0].text, "http://a.example/path?q=1");
        assert_eq!(segments[1], Segment::plain(" tail"));
    }

    #[test]
    fn test_multiple_tags_of_one_family() {
        let segments = parse("[hover:a]x[/hover]-[hover:b]y[/hover]", true);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].hover_text.as_deref(), Some("a"));
        assert_eq!(segments[1], Segment::plain("-"));
        assert_eq!(segments[2].hover_text.as_deref(), Some("b"));
    }

    #[test]
    fn test_mixed_families_in_pass_order() {
        let segments = parse("[hover:h]peek[/hover] [command:/c]run[/command]", true);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].hover_text.as_deref(), Some("h"));
        assert_eq!(segments[1], Segment::plain(" "));
        assert_eq!(segments[2].click.as_ref().unwrap().value, "/c");
    }

    #[test]
    fn test_later_family_before_earlier_family_stays_plain() {
        // The hover pass runs first and flushes everything before its match
        // as plain text, so a command tag written before a hover tag is not
        // recognized. Known single-pass limitation.
        let segments = parse("[command:/c]run[/command] [hover:h]peek[/hover]", true);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], Segment::plain("[command:/c]run[/command] "));
        assert_eq!(segments[1].hover_text.as_deref(), Some("h"));
    }

    #[test]
    fn test_unterminated_tag_stays_plain() {
        let segments = parse("[hover:oops]no end tag", true);
        assert_eq!(segments, vec![Segment::plain("[hover:oops]no end tag")]);
    }

    #[test]
    fn test_empty_payload_not_matched() {
        let segments = parse("[hover:]text[/hover]", true);
        assert_eq!(segments, vec![Segment::plain("[hover:]text[/hover]")]);
    }

    #[test]
    fn test_segment_serializes_for_host_transport() {
        let segment = Segment::link("https://example.com");
        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["text"], "https://example.com");
        assert_eq!(json["style"]["color"], "aqua");
        assert_eq!(json["click"]["action"], "open_url");
    }
}
