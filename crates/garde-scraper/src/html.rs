//! Tag-level element selection over raw HTML.
//!
//! Covers the selector subset the extraction strategies use: `tag`,
//! `.class`, `tag.class`, and comma-separated groups of those. An element
//! spans from its open tag to the matching close tag. Elements whose close
//! tag HTML allows to be omitted (`p`, `li`, `dt`, `dd`, `tr`, `td`, `th`,
//! `option`) end where the next sibling that implies their end starts, and
//! any element still open ends at its parent's close tag.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Tag attributes; `>` inside a quoted value does not end the tag.
const ATTRS: &str = r#"(?:"[^"]*"|'[^']*'|[^'">])*"#;

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid script regex")
});
static STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid style regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"<(/?)([a-zA-Z][a-zA-Z0-9-]*)({ATTRS})>")).expect("valid tag regex")
});
static ANY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"</?[a-zA-Z!]{ATTRS}>")).expect("valid markup regex")
});
static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)</?(?:address|article|aside|blockquote|br|dd|div|dl|dt|footer|h[1-6]|header|hr|li|main|nav|ol|p|pre|section|table|td|th|tr|ul)\b{ATTRS}>"
    ))
    .expect("valid block tag regex")
});
static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)class\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid class attribute regex")
});
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid entity regex")
});

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Start tags that end an open `p`.
const P_CLOSERS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "details",
    "div",
    "dl",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "main",
    "menu",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

const LI_ENDS: &[&str] = &["li", "p"];
const LI_SCOPE: &[&str] = &["ul", "ol", "menu", "table", "td", "th", "button"];
const DEF_ENDS: &[&str] = &["dt", "dd", "p"];
const DEF_SCOPE: &[&str] = &["dl", "table", "td", "th", "button"];
const ROW_ENDS: &[&str] = &["tr", "td", "th"];
const ROW_SCOPE: &[&str] = &["table", "tbody", "thead", "tfoot"];
const CELL_ENDS: &[&str] = &["td", "th"];
const CELL_SCOPE: &[&str] = &["tr", "table"];
const OPTION_ENDS: &[&str] = &["option"];
const OPTION_SCOPE: &[&str] = &["select", "optgroup", "datalist"];
const OPTGROUP_ENDS: &[&str] = &["option", "optgroup"];
const OPTGROUP_SCOPE: &[&str] = &["select"];
const P_ENDS: &[&str] = &["p"];
const P_SCOPE: &[&str] = &["button", "table", "td", "th", "caption"];

/// Elements ended, then the elements that stop the search.
type ImpliedEnd = (&'static [&'static str], &'static [&'static str]);

/// Open elements a start tag ends, and the elements that bound the search.
fn implied_ends(start: &str) -> Option<ImpliedEnd> {
    match start {
        "li" => Some((LI_ENDS, LI_SCOPE)),
        "dt" | "dd" => Some((DEF_ENDS, DEF_SCOPE)),
        "tr" => Some((ROW_ENDS, ROW_SCOPE)),
        "td" | "th" => Some((CELL_ENDS, CELL_SCOPE)),
        "option" => Some((OPTION_ENDS, OPTION_SCOPE)),
        "optgroup" => Some((OPTGROUP_ENDS, OPTGROUP_SCOPE)),
        name if P_CLOSERS.contains(&name) => Some((P_ENDS, P_SCOPE)),
        _ => None,
    }
}

/// One simple selector: a tag name, a class, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    class: Option<String>,
}

impl Selector {
    /// Parse `tag`, `.class` or `tag.class`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (tag, class) = match raw.split_once('.') {
            Some((tag, class)) => (tag, Some(class)),
            None => (raw, None),
        };
        Self {
            tag: (!tag.is_empty()).then(|| tag.to_ascii_lowercase()),
            class: class.filter(|c| !c.is_empty()).map(str::to_string),
        }
    }

    /// Parse a comma-separated selector group such as `"h2, h3, .name"`.
    #[must_use]
    pub fn group(raw: &str) -> Vec<Self> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .collect()
    }

    fn matches(&self, tag: &Tag<'_>) -> bool {
        if self.tag.is_none() && self.class.is_none() {
            return false;
        }
        if self.tag.as_deref().is_some_and(|t| t != tag.name) {
            return false;
        }
        match &self.class {
            Some(class) => class_list(tag.attrs).any(|c| c == class.as_str()),
            None => true,
        }
    }
}

struct Tag<'a> {
    start: usize,
    end: usize,
    closing: bool,
    name: String,
    attrs: &'a str,
}

impl Tag<'_> {
    fn is_self_closing(&self) -> bool {
        self.attrs.trim_end().ends_with('/') || VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

fn scan_tags(fragment: &str) -> Vec<Tag<'_>> {
    TAG_RE
        .captures_iter(fragment)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            Some(Tag {
                start: whole.start(),
                end: whole.end(),
                closing: cap.get(1).is_some_and(|m| !m.as_str().is_empty()),
                name: cap.get(2)?.as_str().to_ascii_lowercase(),
                attrs: cap.get(3).map_or("", |m| m.as_str()),
            })
        })
        .collect()
}

fn class_list(attrs: &str) -> impl Iterator<Item = &str> {
    CLASS_ATTR_RE
        .captures(attrs)
        .and_then(|cap| cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)))
        .map_or("", |m| m.as_str())
        .split_whitespace()
}

/// Close every open element from the lowest one named in `ends` upward,
/// searching down from the innermost until a `scope` element.
fn close_implied(
    open: &mut Vec<usize>,
    content_ends: &mut [usize],
    tags: &[Tag<'_>],
    at: usize,
    (ends, scope): (&[&str], &[&str]),
) {
    let mut cut = None;
    for (pos, &index) in open.iter().enumerate().rev() {
        let name = tags[index].name.as_str();
        if scope.contains(&name) {
            break;
        }
        if ends.contains(&name) {
            cut = Some(pos);
        }
    }
    if let Some(pos) = cut {
        for index in open.drain(pos..) {
            content_ends[index] = at;
        }
    }
}

/// Offset where each open tag's content ends. Elements never closed inside
/// `fragment` run to its end; stray close tags are ignored.
fn content_ends(fragment_len: usize, tags: &[Tag<'_>]) -> Vec<usize> {
    let mut ends = vec![fragment_len; tags.len()];
    let mut open: Vec<usize> = Vec::new();

    for (index, tag) in tags.iter().enumerate() {
        if tag.closing {
            if let Some(pos) = open.iter().rposition(|&i| tags[i].name == tag.name) {
                for i in open.drain(pos..) {
                    ends[i] = tag.start;
                }
            }
            continue;
        }
        if let Some(rule) = implied_ends(&tag.name) {
            close_implied(&mut open, &mut ends, tags, tag.start, rule);
        }
        if tag.is_self_closing() {
            ends[index] = tag.end;
        } else {
            open.push(index);
        }
    }
    ends
}

fn matching_indices<'t>(
    tags: &'t [Tag<'t>],
    group: &'t [Selector],
) -> impl Iterator<Item = usize> + 't {
    tags.iter()
        .enumerate()
        .filter(|(_, tag)| !tag.closing && group.iter().any(|s| s.matches(tag)))
        .map(|(i, _)| i)
}

/// Every element in `fragment` matching any selector of `group`, in document
/// order. Nested matches are all returned.
fn select_all<'a>(fragment: &'a str, group: &[Selector]) -> Vec<Element<'a>> {
    let tags = scan_tags(fragment);
    let ends = content_ends(fragment.len(), &tags);
    matching_indices(&tags, group)
        .map(|i| Element {
            inner_html: &fragment[tags[i].end..ends[i]],
        })
        .collect()
}

/// The first element in document order matching any selector of `group`.
fn select_first<'a>(fragment: &'a str, group: &[Selector]) -> Option<Element<'a>> {
    let tags = scan_tags(fragment);
    let index = matching_indices(&tags, group).next()?;
    let ends = content_ends(fragment.len(), &tags);
    Some(Element {
        inner_html: &fragment[tags[index].end..ends[index]],
    })
}

/// A matched element, held as its inner markup.
#[derive(Debug, Clone)]
pub struct Element<'a> {
    inner_html: &'a str,
}

impl<'a> Element<'a> {
    #[must_use]
    pub fn inner_html(&self) -> &'a str {
        self.inner_html
    }

    /// Text content with tags removed, entities decoded and whitespace
    /// collapsed.
    #[must_use]
    pub fn text(&self) -> String {
        text_content(self.inner_html)
    }

    fn select_first(&self, group: &[Selector]) -> Option<Element<'a>> {
        select_first(self.inner_html, group)
    }

    /// Text of the first descendant matching `group`, or an empty string.
    #[must_use]
    pub fn first_text(&self, group: &[Selector]) -> String {
        self.select_first(group)
            .map(|el| el.text())
            .unwrap_or_default()
    }
}

/// A page with comments, scripts and styles removed.
#[derive(Debug, Clone)]
pub struct Document {
    html: String,
}

impl Document {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let html = COMMENT_RE.replace_all(raw, "");
        let html = SCRIPT_RE.replace_all(&html, "");
        let html = STYLE_RE.replace_all(&html, "");
        Self {
            html: html.into_owned(),
        }
    }

    #[must_use]
    pub fn select_all(&self, group: &[Selector]) -> Vec<Element<'_>> {
        select_all(&self.html, group)
    }

    /// Non-blank, trimmed text lines of the body. Block-level tags break
    /// lines; inline tags do not.
    #[must_use]
    pub fn text_lines(&self) -> Vec<String> {
        let body = select_first(&self.html, &[Selector::parse("body")])
            .map_or(self.html.as_str(), |b| b.inner_html());
        let with_breaks = BLOCK_TAG_RE.replace_all(body, "\n");
        let stripped = ANY_TAG_RE.replace_all(&with_breaks, " ");
        decode_entities(&stripped)
            .lines()
            .map(collapse_whitespace)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Strip tags, decode entities and collapse whitespace.
#[must_use]
pub fn text_content(html: &str) -> String {
    let stripped = ANY_TAG_RE.replace_all(html, " ");
    collapse_whitespace(&decode_entities(&stripped))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |cap: &Captures<'_>| {
            decode_entity(&cap[1]).map_or_else(|| cap[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = body.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    let c = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "eacute" => 'é',
        "egrave" => 'è',
        "ecirc" => 'ê',
        "agrave" => 'à',
        "acirc" => 'â',
        "ccedil" => 'ç',
        "icirc" => 'î',
        "ocirc" => 'ô',
        "ucirc" => 'û',
        "ugrave" => 'ù',
        "Eacute" => 'É',
        _ => return None,
    };
    Some(c)
}
