//! Module introspection: the symbols a stylesheet declares and the CSS it emits.
//!
//! The [`ModuleIntrospector`] trait is the seam to a real stylesheet
//! compiler. [`SourceIntrospector`] is the built-in implementation; it reads
//! the source, reports its public module-level variables and functions, and
//! approximates the compiled output by dropping constructs that never reach
//! CSS.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::syntax::{self, Item, SyntaxError};

/// Errors raised while introspecting a module. All of them are fatal to a run.
#[derive(Error, Debug)]
pub enum IntrospectError {
    #[error("Failed to read module {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed module {}:{line}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: SyntaxError,
    },
}

/// Symbols and output of one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSymbols {
    /// Public module-level variable names, without `$`, in declaration order
    pub variables: Vec<String>,
    /// Public function names, in declaration order
    pub functions: Vec<String>,
    /// CSS the module emits when compiled on its own
    pub output: String,
}

/// Evaluates a stylesheet module in isolation.
pub trait ModuleIntrospector {
    /// Reports the symbols declared by the module at `path`.
    fn introspect(&self, path: &Path) -> Result<ModuleSymbols, IntrospectError>;
}

/// Built-in introspector working directly on the source text.
///
/// # Example
///
/// ```
/// use stylegraph::analysis::SourceIntrospector;
///
/// let symbols = SourceIntrospector::new()
///     .introspect_source("$gap: 4px;\n@function half($x) { @return $x / 2; }\n.a { margin: $gap; }")
///     .unwrap();
///
/// assert_eq!(symbols.variables, vec!["gap"]);
/// assert_eq!(symbols.functions, vec!["half"]);
/// assert_eq!(symbols.output, ".a {\n  margin: $gap;\n}\n");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceIntrospector;

impl SourceIntrospector {
    pub fn new() -> Self {
        Self
    }

    /// Introspects source text that is already in memory.
    pub fn introspect_source(&self, source: &str) -> Result<ModuleSymbols, SyntaxError> {
        let items = syntax::parse(source)?;
        let mut symbols = ModuleSymbols::default();

        for item in &items {
            match item {
                Item::Statement { text, .. } => {
                    if let Some(name) = variable_name(text) {
                        push_public(&mut symbols.variables, name);
                    }
                }
                Item::Block { prelude, .. } => {
                    if let Some(name) = function_name(prelude) {
                        push_public(&mut symbols.functions, name);
                    }
                }
            }
        }

        render(&items, 0, &mut symbols.output);
        Ok(symbols)
    }
}

impl ModuleIntrospector for SourceIntrospector {
    fn introspect(&self, path: &Path) -> Result<ModuleSymbols, IntrospectError> {
        let source = fs::read_to_string(path).map_err(|source| IntrospectError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        self.introspect_source(&source)
            .map_err(|source| IntrospectError::Malformed {
                path: path.to_path_buf(),
                line: source.line(),
                source,
            })
    }
}

fn variable_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\$([a-zA-Z0-9_-]+)\s*:").expect("valid variable pattern"))
}

fn function_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^@function\s+([a-zA-Z0-9_-]+)\s*\(").expect("valid function pattern")
    })
}

fn variable_name(statement: &str) -> Option<&str> {
    variable_pattern()
        .captures(statement)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

fn function_name(prelude: &str) -> Option<&str> {
    function_pattern()
        .captures(prelude)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

/// Names starting with `-` or `_` are private to the module.
fn push_public(names: &mut Vec<String>, name: &str) {
    if name.starts_with(&['-', '_'][..]) || names.iter().any(|existing| existing == name) {
        return;
    }
    names.push(name.to_string());
}

/// At-rules that are consumed by the compiler and never emitted.
const SASS_STATEMENTS: &[&str] = &[
    "@import", "@use", "@forward", "@include", "@extend", "@debug", "@warn", "@error", "@return",
];

/// Definitions whose bodies only run when called from elsewhere.
const SASS_DEFINITIONS: &[&str] = &["@mixin", "@function"];

/// Blocks the compiler replaces with their body.
const SASS_WRAPPERS: &[&str] = &["@include", "@if", "@else", "@each", "@for", "@while"];

/// What reaches the output for a block with a given prelude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockOutput {
    /// The block is emitted as is.
    Block,
    /// Only the body is emitted, in place of the block.
    Body,
    /// Nothing is emitted.
    Nothing,
}

fn starts_with_keyword(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| {
        text.strip_prefix(keyword).is_some_and(|rest| {
            !rest.starts_with(|c: char| c.is_alphanumeric() || c == '-' || c == '_')
        })
    })
}

fn emits_statement(text: &str, depth: usize) -> bool {
    if text.starts_with('$') || starts_with_keyword(text, SASS_STATEMENTS) {
        return false;
    }
    // Outside any rule only CSS at-rules such as @charset survive.
    depth > 0 || text.starts_with('@')
}

fn block_output(prelude: &str) -> BlockOutput {
    if prelude.starts_with('%') || starts_with_keyword(prelude, SASS_DEFINITIONS) {
        BlockOutput::Nothing
    } else if starts_with_keyword(prelude, SASS_WRAPPERS) {
        BlockOutput::Body
    } else {
        BlockOutput::Block
    }
}

fn render(items: &[Item], depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);

    for item in items {
        match item {
            Item::Statement { text, .. } => {
                if emits_statement(text, depth) {
                    out.push_str(&indent);
                    out.push_str(text);
                    out.push_str(";\n");
                }
            }
            Item::Block { prelude, body, .. } => match block_output(prelude) {
                BlockOutput::Nothing => {}
                // Every branch of a control directive is kept once.
                BlockOutput::Body => render(body, depth, out),
                BlockOutput::Block => {
                    let mut inner = String::new();
                    render(body, depth + 1, &mut inner);
                    if inner.is_empty() {
                        continue;
                    }
                    out.push_str(&indent);
                    out.push_str(prelude);
                    out.push_str(" {\n");
                    out.push_str(&inner);
                    out.push_str(&indent);
                    out.push_str("}\n");
                }
            },
        }
    }
}
