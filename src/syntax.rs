//! Lightweight statement and block scanner for stylesheet sources.
//!
//! This is not a full SCSS parser. It understands just enough structure
//! (comments, strings, interpolation, parentheses and braces) to split a
//! source into top-level statements and nested blocks, which is what the
//! built-in module introspector and the CSS statistics collector need.
//!
//! # Example
//!
//! ```
//! use stylegraph::syntax::{parse, Item};
//!
//! let items = parse("$gap: 4px;\n.card { padding: $gap; }").unwrap();
//! assert_eq!(items.len(), 2);
//! assert!(matches!(&items[0], Item::Statement { text, .. } if text == "$gap: 4px"));
//! assert!(matches!(&items[1], Item::Block { prelude, .. } if prelude == ".card"));
//! ```

use thiserror::Error;

/// Errors raised when a source is structurally malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unclosed block comment starting on line {line}")]
    UnclosedComment { line: usize },

    #[error("unterminated string on line {line}")]
    UnterminatedString { line: usize },

    #[error("unexpected '}}' on line {line}")]
    UnexpectedClose { line: usize },

    #[error("block opened on line {line} is never closed")]
    UnclosedBlock { line: usize },
}

impl SyntaxError {
    /// Line (1-indexed) the error was detected on.
    pub fn line(&self) -> usize {
        match self {
            SyntaxError::UnclosedComment { line }
            | SyntaxError::UnterminatedString { line }
            | SyntaxError::UnexpectedClose { line }
            | SyntaxError::UnclosedBlock { line } => *line,
        }
    }
}

/// A top-level or nested element of a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A `;`-terminated statement (terminator not included), trimmed.
    Statement { text: String, line: usize },
    /// A `prelude { ... }` block with its parsed body.
    Block {
        prelude: String,
        line: usize,
        body: Vec<Item>,
    },
}

impl Item {
    /// Line (1-indexed) the item starts on.
    pub fn line(&self) -> usize {
        match self {
            Item::Statement { line, .. } | Item::Block { line, .. } => *line,
        }
    }
}

/// Replaces `/* */` and `//` comments with whitespace.
///
/// Newlines are preserved so that line numbers reported by [`parse`] still
/// match the original source. A `//` only starts a comment when it follows
/// whitespace, a statement boundary or the start of input, so protocol
/// separators such as `url(http://...)` survive.
pub fn strip_comments(source: &str) -> Result<String, SyntaxError> {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                let start_line = line;
                out.push(c);
                i += 1;
                loop {
                    let Some(&s) = chars.get(i) else {
                        return Err(SyntaxError::UnterminatedString { line: start_line });
                    };
                    if s == '\n' {
                        return Err(SyntaxError::UnterminatedString { line: start_line });
                    }
                    out.push(s);
                    i += 1;
                    if s == '\\' {
                        if let Some(&escaped) = chars.get(i) {
                            if escaped == '\n' {
                                line += 1;
                            }
                            out.push(escaped);
                            i += 1;
                        }
                        continue;
                    }
                    if s == c {
                        break;
                    }
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let start_line = line;
                i += 2;
                loop {
                    match chars.get(i) {
                        None => return Err(SyntaxError::UnclosedComment { line: start_line }),
                        Some('*') if chars.get(i + 1) == Some(&'/') => {
                            out.push_str("  ");
                            i += 2;
                            break;
                        }
                        Some('\n') => {
                            line += 1;
                            out.push('\n');
                            i += 1;
                        }
                        Some(_) => {
                            out.push(' ');
                            i += 1;
                        }
                    }
                }
            }
            '/' if chars.get(i + 1) == Some(&'/') && starts_line_comment(&chars, i) => {
                while i < chars.len() && chars[i] != '\n' {
                    out.push(' ');
                    i += 1;
                }
            }
            _ => {
                if c == '\n' {
                    line += 1;
                }
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(out)
}

fn starts_line_comment(chars: &[char], index: usize) -> bool {
    match index.checked_sub(1).map(|prev| chars[prev]) {
        None => true,
        Some(prev) => prev.is_whitespace() || matches!(prev, ';' | '{' | '}' | ','),
    }
}

/// Open block while scanning.
struct Frame {
    prelude: String,
    line: usize,
    items: Vec<Item>,
}

/// Splits a source into statements and blocks.
///
/// Comments are stripped first. Semicolons and braces inside strings,
/// parentheses and `#{...}` interpolation do not split statements.
///
/// # Errors
///
/// Returns a [`SyntaxError`] for unbalanced braces, unterminated strings
/// and unclosed block comments.
pub fn parse(source: &str) -> Result<Vec<Item>, SyntaxError> {
    let stripped = strip_comments(source)?;
    let chars: Vec<char> = stripped.chars().collect();

    let mut stack = vec![Frame {
        prelude: String::new(),
        line: 1,
        items: Vec::new(),
    }];
    let mut buffer = String::new();
    let mut buffer_line = 1;
    let mut line = 1;
    let mut parens = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if buffer.trim().is_empty() && !c.is_whitespace() {
            buffer_line = line;
        }

        match c {
            '"' | '\'' => {
                // strip_comments already validated that strings terminate
                buffer.push(c);
                i += 1;
                while let Some(&s) = chars.get(i) {
                    buffer.push(s);
                    i += 1;
                    if s == '\\' {
                        if let Some(&escaped) = chars.get(i) {
                            buffer.push(escaped);
                            i += 1;
                        }
                        continue;
                    }
                    if s == c {
                        break;
                    }
                }
                continue;
            }
            '#' if chars.get(i + 1) == Some(&'{') => {
                let mut depth = 0usize;
                while let Some(&s) = chars.get(i) {
                    buffer.push(s);
                    i += 1;
                    match s {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        '\n' => line += 1,
                        _ => {}
                    }
                }
                continue;
            }
            '(' => {
                parens += 1;
                buffer.push(c);
            }
            ')' => {
                parens = parens.saturating_sub(1);
                buffer.push(c);
            }
            ';' if parens == 0 => {
                flush_statement(&mut stack, &mut buffer, buffer_line);
            }
            '{' if parens == 0 => {
                let prelude = buffer.trim().to_string();
                buffer.clear();
                stack.push(Frame {
                    prelude,
                    line: buffer_line,
                    items: Vec::new(),
                });
            }
            '}' if parens == 0 => {
                flush_statement(&mut stack, &mut buffer, buffer_line);
                if stack.len() == 1 {
                    return Err(SyntaxError::UnexpectedClose { line });
                }
                if let Some(frame) = stack.pop() {
                    let block = Item::Block {
                        prelude: frame.prelude,
                        line: frame.line,
                        body: frame.items,
                    };
                    if let Some(parent) = stack.last_mut() {
                        parent.items.push(block);
                    }
                }
            }
            '\n' => {
                line += 1;
                buffer.push(c);
            }
            _ => buffer.push(c),
        }
        i += 1;
    }

    flush_statement(&mut stack, &mut buffer, buffer_line);

    if stack.len() > 1 {
        let line = stack.last().map_or(line, |frame| frame.line);
        return Err(SyntaxError::UnclosedBlock { line });
    }

    Ok(stack.pop().map(|frame| frame.items).unwrap_or_default())
}

fn flush_statement(stack: &mut [Frame], buffer: &mut String, line: usize) {
    let text = buffer.trim();
    if !text.is_empty() {
        if let Some(frame) = stack.last_mut() {
            frame.items.push(Item::Statement {
                text: text.to_string(),
                line,
            });
        }
    }
    buffer.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn statement(text: &str, line: usize) -> Item {
        Item::Statement {
            text: text.to_string(),
            line,
        }
    }

    #[test]
    fn test_strip_comments_preserves_lines() {
        let stripped = strip_comments("a /* one\ntwo */ b // tail\nc").unwrap();
        assert_eq!(stripped.lines().count(), 3);
        assert!(!stripped.contains("one"));
        assert!(!stripped.contains("tail"));
        assert!(stripped.contains('c'));
    }

    #[test]
    fn test_strip_comments_keeps_urls() {
        let stripped = strip_comments("a { background: url(http://x.test/a.png); }").unwrap();
        assert!(stripped.contains("http://x.test/a.png"));
    }

    #[test]
    fn test_strip_comments_ignores_markers_in_strings() {
        let stripped = strip_comments("$a: '/* not a comment */';").unwrap();
        assert!(stripped.contains("/* not a comment */"));
    }

    #[test]
    fn test_parse_statements_and_blocks() {
        let items = parse("$a: 1;\n.b {\n  color: red;\n  .c { margin: 0 }\n}\n").unwrap();
        assert_eq!(
            items,
            vec![
                statement("$a: 1", 1),
                Item::Block {
                    prelude: ".b".to_string(),
                    line: 2,
                    body: vec![
                        statement("color: red", 3),
                        Item::Block {
                            prelude: ".c".to_string(),
                            line: 4,
                            body: vec![statement("margin: 0", 4)],
                        },
                    ],
                },
            ]
        );
    }

    #[test]
    fn test_parse_interpolation_does_not_open_block() {
        let items = parse(".icon-#{$name} { width: 1px; }").unwrap();
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Item::Block { prelude, .. } if prelude == ".icon-#{$name}"));
    }

    #[test]
    fn test_parse_semicolon_inside_parens() {
        let items = parse("a { background: url(data:image/png;base64,AAA); }").unwrap();
        let Item::Block { body, .. } = &items[0] else {
            panic!("expected block");
        };
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_parse_unclosed_block() {
        let err = parse("a {\n  color: red;\n").unwrap_err();
        assert_eq!(err, SyntaxError::UnclosedBlock { line: 1 });
    }

    #[test]
    fn test_parse_unexpected_close() {
        let err = parse("a { }\n}").unwrap_err();
        assert_eq!(err, SyntaxError::UnexpectedClose { line: 2 });
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_parse_unterminated_string() {
        let err = parse("$a: 'oops;\n").unwrap_err();
        assert_eq!(err, SyntaxError::UnterminatedString { line: 1 });
    }

    #[test]
    fn test_parse_unclosed_comment() {
        let err = parse("a {}\n/* never ends").unwrap_err();
        assert_eq!(err, SyntaxError::UnclosedComment { line: 2 });
    }
}
