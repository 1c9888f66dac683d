//! Size and complexity measurements of emitted CSS.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::syntax::{self, Item, SyntaxError};

/// Errors raised while measuring a stylesheet.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Failed to compress stylesheet output")]
    Compress(#[from] std::io::Error),

    #[error("Stylesheet output is malformed")]
    Malformed(#[from] SyntaxError),
}

/// A `{ "total": n }` counter. Unknown keys are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Total {
    #[serde(default)]
    pub total: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Total {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            extra: Map::new(),
        }
    }
}

/// Specificity summary over all selectors, scored as `a*100 + b*10 + c`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specificity {
    #[serde(default, serialize_with = "serialize_number")]
    pub average: f64,
    #[serde(default)]
    pub max: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub specificity: Specificity,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-file measurement payload, in the shape `cssstats` produces.
///
/// Only the fields below are interpreted. Anything else found in a loaded
/// report is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleStats {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub gzip_size: u64,
    #[serde(default)]
    pub humanized_size: String,
    #[serde(default)]
    pub humanized_gzip_size: String,
    #[serde(default)]
    pub rules: Total,
    #[serde(default)]
    pub selectors: SelectorStats,
    #[serde(default)]
    pub declarations: Total,
    #[serde(default)]
    pub media_queries: Total,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StyleStats {
    /// True when the file emits no rules, selectors, declarations or media
    /// queries, as with partials holding only variables and mixins.
    pub fn is_structurally_empty(&self) -> bool {
        self.rules.total == 0
            && self.selectors.total == 0
            && self.declarations.total == 0
            && self.media_queries.total == 0
    }
}

/// Measures compiled stylesheet text.
pub trait StylesheetStats {
    fn measure(&self, css: &str) -> Result<StyleStats, StatsError>;
}

/// Built-in measurement of CSS text.
///
/// # Example
///
/// ```
/// use stylegraph::stats::{CssStats, StylesheetStats};
///
/// let stats = CssStats::new().measure(".a, #b p { color: red; margin: 0; }").unwrap();
/// assert_eq!(stats.rules.total, 1);
/// assert_eq!(stats.selectors.total, 2);
/// assert_eq!(stats.declarations.total, 2);
/// assert_eq!(stats.selectors.specificity.max, 101);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CssStats;

impl CssStats {
    pub fn new() -> Self {
        Self
    }
}

impl StylesheetStats for CssStats {
    fn measure(&self, css: &str) -> Result<StyleStats, StatsError> {
        let size = css.len() as u64;
        let gzip_size = gzip_len(css)?;

        let mut counts = Counts::default();
        counts.visit(&syntax::parse(css)?, Context::TopLevel);

        let average = if counts.specificities.is_empty() {
            0.0
        } else {
            counts.specificities.iter().map(|&s| f64::from(s)).sum::<f64>()
                / counts.specificities.len() as f64
        };

        Ok(StyleStats {
            size,
            gzip_size,
            humanized_size: format_size(size),
            humanized_gzip_size: format_size(gzip_size),
            rules: Total::new(counts.rules),
            selectors: SelectorStats {
                total: counts.specificities.len() as u64,
                specificity: Specificity {
                    average,
                    max: counts.specificities.iter().copied().max().unwrap_or(0),
                    extra: Map::new(),
                },
                extra: Map::new(),
            },
            declarations: Total::new(counts.declarations),
            media_queries: Total::new(counts.media_queries),
            extra: Map::new(),
        })
    }
}

fn gzip_len(css: &str) -> Result<u64, std::io::Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(css.as_bytes())?;
    Ok(encoder.finish()?.len() as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    TopLevel,
    Block,
    Keyframes,
}

#[derive(Debug, Default)]
struct Counts {
    rules: u64,
    declarations: u64,
    media_queries: u64,
    specificities: Vec<u32>,
}

impl Counts {
    fn visit(&mut self, items: &[Item], context: Context) {
        for item in items {
            match item {
                Item::Statement { text, .. } => {
                    if context != Context::TopLevel && !text.starts_with('@') && text.contains(':') {
                        self.declarations += 1;
                    }
                }
                Item::Block { prelude, body, .. } => {
                    if let Some(at_rule) = prelude.strip_prefix('@') {
                        let name = at_rule
                            .split(|c: char| c.is_whitespace() || c == '(')
                            .next()
                            .unwrap_or_default()
                            .to_ascii_lowercase();
                        if name == "media" {
                            self.media_queries += 1;
                        }
                        let inner = if name.ends_with("keyframes") {
                            Context::Keyframes
                        } else {
                            Context::Block
                        };
                        self.visit(body, inner);
                    } else if context == Context::Keyframes {
                        self.visit(body, Context::Block);
                    } else {
                        self.rules += 1;
                        self.specificities
                            .extend(split_top_level(prelude, ',').into_iter().map(specificity));
                        self.visit(body, Context::Block);
                    }
                }
            }
        }
    }
}

/// Splits on `separator` outside parentheses, brackets and strings.
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, _) if c == separator && depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());

    parts.into_iter().filter(|part| !part.is_empty()).collect()
}

/// Scores a single selector as `ids*100 + classes*10 + elements`.
///
/// Attribute selectors and pseudo-classes count as classes, pseudo-elements
/// as elements. `:not()`, `:is()` and `:has()` take the score of their most
/// specific argument; `:where()` scores zero.
///
/// # Example
///
/// ```
/// use stylegraph::stats::specificity;
///
/// assert_eq!(specificity("#nav .item > a:hover"), 121);
/// assert_eq!(specificity("li::before"), 2);
/// assert_eq!(specificity(":where(#a) p"), 1);
/// ```
pub fn specificity(selector: &str) -> u32 {
    let (ids, classes, elements) = specificity_parts(selector);
    ids * 100 + classes * 10 + elements
}

fn specificity_parts(selector: &str) -> (u32, u32, u32) {
    let chars: Vec<char> = selector.chars().collect();
    let (mut ids, mut classes, mut elements) = (0, 0, 0);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '#' if chars.get(i + 1) == Some(&'{') => {
                i = group(&chars, i + 1).1;
            }
            '#' => {
                ids += 1;
                i = skip_ident(&chars, i + 1);
            }
            '.' => {
                classes += 1;
                i = skip_ident(&chars, i + 1);
            }
            '[' => {
                classes += 1;
                i = group(&chars, i).1;
            }
            ':' => {
                let pseudo_element = chars.get(i + 1) == Some(&':');
                let start = if pseudo_element { i + 2 } else { i + 1 };
                let end = skip_ident(&chars, start);
                let name: String = chars[start..end].iter().collect::<String>().to_ascii_lowercase();

                let (argument, next) = if chars.get(end) == Some(&'(') {
                    let (inner_end, next) = group(&chars, end);
                    (Some(chars[end + 1..inner_end].iter().collect::<String>()), next)
                } else {
                    (None, end)
                };
                i = next;

                if pseudo_element || LEGACY_PSEUDO_ELEMENTS.contains(&name.as_str()) {
                    elements += 1;
                    continue;
                }
                match argument {
                    Some(argument) if MATCHES_ARGUMENT.contains(&name.as_str()) => {
                        let (a, b, c) = split_top_level(&argument, ',')
                            .into_iter()
                            .map(specificity_parts)
                            .max()
                            .unwrap_or((0, 0, 0));
                        ids += a;
                        classes += b;
                        elements += c;
                    }
                    _ if name == "where" => {}
                    _ => classes += 1,
                }
            }
            c if c.is_alphabetic() || c == '-' || c == '_' => {
                elements += 1;
                i = skip_ident(&chars, i);
            }
            _ => i += 1,
        }
    }

    (ids, classes, elements)
}

const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

const MATCHES_ARGUMENT: &[&str] = &["not", "is", "has", "matches", "-moz-any", "-webkit-any"];

fn skip_ident(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 2;
        } else if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            i += 1;
        } else if c == '#' && chars.get(i + 1) == Some(&'{') {
            i = group(chars, i + 1).1;
        } else {
            break;
        }
    }
    i.min(chars.len())
}

/// Given the index of an opening `(`, `[` or `{`, returns the index of the
/// matching close (or the end of input) and the index just past it.
fn group(chars: &[char], open: usize) -> (usize, usize) {
    let opener = chars[open];
    let closer = match opener {
        '(' => ')',
        '[' => ']',
        _ => '}',
    };
    let mut depth = 0usize;
    let mut i = open;

    while i < chars.len() {
        if chars[i] == opener {
            depth += 1;
        } else if chars[i] == closer {
            depth -= 1;
            if depth == 0 {
                return (i, i + 1);
            }
        }
        i += 1;
    }

    (chars.len(), chars.len())
}

/// Writes whole numbers without a fractional part, the way JavaScript
/// serializes them, so reports keep their existing shape.
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Formats a byte count as a human-readable size.
///
/// # Example
///
/// ```
/// use stylegraph::stats::format_size;
///
/// assert_eq!(format_size(1024), "1.00 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
