//! Log trigger expression constructor.
//!
//! Turns the ordered pattern parts entered on the trigger form into a single
//! trigger expression bound to one host/item key, and decomposes a stored
//! expression back into those parts for editing.
//!
//! Composed grammar:
//!
//! ```text
//! term    := {host:key.func(pattern)}            func is regexp | iregexp
//! clause  := (({term})CMP)                       single term
//!          | (({term})CMP op ({term})CMP ...)    several terms, op = and | or
//! CMP     := <>0 (match) | =0 (no match)
//! expr    := clause joined by " or " (before a match clause)
//!                        or " and " (before a no-match clause)
//! ```
//!
//! A run of two or more consecutive match clauses is wrapped in one extra
//! pair of parentheses; [`decompose`] flattens such runs back into parts.

use std::sync::LazyLock;

use regex::Regex;

use crate::trigger::{ExpressionPart, ExpressionType};

/// Pattern functions a log trigger may use.
pub const PATTERN_FUNCTIONS: &[&str] = &["regexp", "iregexp"];

/// Function applied to a bare pattern.
const DEFAULT_FUNCTION: &str = "regexp";

static CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_]*)\((.*)\)$").expect("valid regex")
});

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("Expression cannot be empty")]
    Empty,

    #[error("Incorrect function is used. [{0}]")]
    UnsupportedFunction(String),

    #[error("Incorrect trigger expression. [{0}]")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// Connective between two pattern terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

impl Connective {
    fn as_str(self) -> &'static str {
        match self {
            Connective::And => " and ",
            Connective::Or => " or ",
        }
    }
}

/// Comparison closing a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    NotZero,
    Zero,
}

impl Comparison {
    fn for_type(kind: ExpressionType) -> Self {
        match kind {
            ExpressionType::Match => Comparison::NotZero,
            ExpressionType::NoMatch => Comparison::Zero,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Comparison::NotZero => "<>0",
            Comparison::Zero => "=0",
        }
    }

    fn expression_type(self) -> ExpressionType {
        match self {
            Comparison::NotZero => ExpressionType::Match,
            Comparison::Zero => ExpressionType::NoMatch,
        }
    }
}

/// A pattern function call such as `iregexp(error)`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PatternCall {
    function: String,
    pattern: String,
}

impl PatternCall {
    fn render(&self) -> String {
        format!("{}({})", self.function, self.pattern)
    }
}

/// A `(host, key)` pair referenced by an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub host: String,
    pub key: String,
}

// ---------------------------------------------------------------------------
// Compose
// ---------------------------------------------------------------------------

/// Build the trigger expression for `parts` on the item `host:key`.
pub fn compose(
    host: &str,
    key: &str,
    parts: &[ExpressionPart],
) -> Result<String, ExpressionError> {
    if parts.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let mut result = String::new();
    let mut run_len = 0usize;
    let mut run_start = 0usize;

    for part in parts {
        let terms = parse_terms(&part.value)?;

        match part.kind {
            ExpressionType::Match => {
                if !result.is_empty() {
                    result.push_str(Connective::Or.as_str());
                }
                if run_len == 0 {
                    run_start = result.len();
                }
                run_len += 1;
            }
            ExpressionType::NoMatch => {
                close_run(&mut result, run_len, run_start);
                run_len = 0;
                if !result.is_empty() {
                    result.push_str(Connective::And.as_str());
                }
            }
        }

        result.push_str(&render_clause(host, key, &terms, part.kind));
    }

    close_run(&mut result, run_len, run_start);
    Ok(result)
}

fn close_run(result: &mut String, run_len: usize, run_start: usize) {
    if run_len > 1 {
        result.insert(run_start, '(');
        result.push(')');
    }
}

fn render_clause(
    host: &str,
    key: &str,
    terms: &[(Option<Connective>, PatternCall)],
    kind: ExpressionType,
) -> String {
    let cmp = Comparison::for_type(kind).as_str();
    let mut clause = String::from("(");
    for (connective, call) in terms {
        if let Some(c) = connective {
            clause.push_str(c.as_str());
        }
        clause.push_str(&format!("({{{host}:{key}.{}}}){cmp}", call.render()));
    }
    clause.push(')');
    clause
}

/// Split a part value into pattern calls and the connectives between them.
fn parse_terms(value: &str) -> Result<Vec<(Option<Connective>, PatternCall)>, ExpressionError> {
    let pieces = split_value(value)
        .map_err(|_| ExpressionError::Malformed(value.to_string()))?;

    let mut terms = Vec::with_capacity(pieces.len());
    for (connective, raw) in pieces {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ExpressionError::Malformed(value.to_string()));
        }

        let call = match CALL_RE.captures(raw) {
            Some(caps) => {
                let function = caps[1].to_lowercase();
                if !PATTERN_FUNCTIONS.contains(&function.as_str()) {
                    return Err(ExpressionError::UnsupportedFunction(value.to_string()));
                }
                PatternCall {
                    function,
                    pattern: caps[2].to_string(),
                }
            }
            None => PatternCall {
                function: DEFAULT_FUNCTION.to_string(),
                pattern: raw.to_string(),
            },
        };

        if call.pattern.contains(")}") {
            return Err(ExpressionError::Malformed(value.to_string()));
        }
        terms.push((connective, call));
    }
    Ok(terms)
}

/// Split on `and` / `or` / `&` / `|` outside parentheses and quotes.
fn split_value(value: &str) -> Result<Vec<(Option<Connective>, &str)>, ()> {
    let bytes = value.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut start = 0usize;
    let mut pending: Option<Connective> = None;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == b'"' {
                in_quote = false;
            }
            i += 1;
            continue;
        }

        match b {
            b'"' => in_quote = true,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(());
                }
            }
            b'&' | b'|' if depth == 0 => {
                pieces.push((pending, &value[start..i]));
                pending = Some(if b == b'&' {
                    Connective::And
                } else {
                    Connective::Or
                });
                start = i + 1;
            }
            b if b.is_ascii_whitespace() && depth == 0 => {
                if let Some((connective, word_end)) = word_connective(bytes, i) {
                    pieces.push((pending, &value[start..i]));
                    pending = Some(connective);
                    start = word_end;
                    i = word_end;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }

    if depth != 0 || in_quote {
        return Err(());
    }
    pieces.push((pending, &value[start..]));
    Ok(pieces)
}

/// Detect `<ws>and<ws>` / `<ws>or<ws>` starting at whitespace position `i`.
/// Returns the connective and the index just past the word.
fn word_connective(bytes: &[u8], i: usize) -> Option<(Connective, usize)> {
    let mut j = i;
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    for (word, connective) in [("and", Connective::And), ("or", Connective::Or)] {
        let end = j + word.len();
        if end < bytes.len()
            && bytes[j..end].eq_ignore_ascii_case(word.as_bytes())
            && bytes[end].is_ascii_whitespace()
        {
            return Some((connective, end));
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Macro {
        item: ItemRef,
        call: PatternCall,
    },
    Op(Connective),
    Cmp(Comparison),
}

fn tokenize(expression: &str) -> Result<Vec<Token>, ExpressionError> {
    let malformed = || ExpressionError::Malformed(expression.to_string());
    let mut tokens = Vec::new();
    let mut rest = expression;

    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }

        let (token, consumed) = match c {
            '(' => (Token::Open, 1),
            ')' => (Token::Close, 1),
            '&' => (Token::Op(Connective::And), 1),
            '|' => (Token::Op(Connective::Or), 1),
            '{' => {
                let end = rest.find(")}").ok_or_else(malformed)?;
                let inner = &rest[1..end + 1];
                (parse_macro(inner).ok_or_else(malformed)?, end + 2)
            }
            _ if rest.starts_with("<>0") => (Token::Cmp(Comparison::NotZero), 3),
            _ if rest.starts_with("#0") => (Token::Cmp(Comparison::NotZero), 2),
            _ if rest.starts_with("=0") => (Token::Cmp(Comparison::Zero), 2),
            _ if starts_with_word(rest, "and") => (Token::Op(Connective::And), 3),
            _ if starts_with_word(rest, "or") => (Token::Op(Connective::Or), 2),
            _ => return Err(malformed()),
        };

        tokens.push(token);
        rest = &rest[consumed..];
    }

    Ok(tokens)
}

fn starts_with_word(s: &str, word: &str) -> bool {
    s.len() >= word.len()
        && s.as_bytes()[..word.len()].eq_ignore_ascii_case(word.as_bytes())
        && s[word.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_')
}

/// Parse `host:key.func(pattern)` (the text between the braces).
fn parse_macro(inner: &str) -> Option<Token> {
    let (host, rest) = inner.split_once(':')?;
    if host.is_empty() {
        return None;
    }

    // Key names may contain dots but never `[` or `(`. A bracketed key ends
    // at its closing `]`; a plain key ends at the last dot before the
    // function's `(`.
    let delimiter = rest.find(['[', '('])?;
    let dot = if rest[delimiter..].starts_with('[') {
        let after = closing_bracket(rest, delimiter)? + 1;
        rest[after..].starts_with('.').then_some(after)?
    } else {
        rest[..delimiter].rfind('.')?
    };
    let open = dot + rest[dot..].find('(')?;
    let key = &rest[..dot];
    let function = &rest[dot + 1..open];
    let pattern = rest[open + 1..].strip_suffix(')')?;

    if key.is_empty()
        || function.is_empty()
        || !function.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }

    Some(Token::Macro {
        item: ItemRef {
            host: host.to_string(),
            key: key.to_string(),
        },
        call: PatternCall {
            function: function.to_lowercase(),
            pattern: pattern.to_string(),
        },
    })
}

/// Index of the `]` closing the `[` at `open`, skipping quoted parameters.
fn closing_bracket(s: &str, open: usize) -> Option<usize> {
    let mut in_quote = false;
    let mut escaped = false;
    for (i, c) in s[open + 1..].char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quote => escaped = true,
            '"' => in_quote = !in_quote,
            ']' if !in_quote => return Some(open + 1 + i),
            _ => {}
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Decompose
// ---------------------------------------------------------------------------

/// Break a composed expression back into its ordered pattern parts.
pub fn decompose(expression: &str) -> Result<Vec<ExpressionPart>, ExpressionError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let malformed = || ExpressionError::Malformed(expression.to_string());
    let (segments, _) = split_top_level(&tokens).ok_or_else(malformed)?;

    let mut parts = Vec::new();
    for segment in segments {
        collect_parts(segment, &mut parts).ok_or_else(malformed)?;
    }
    Ok(parts)
}

/// Every distinct item referenced by `expression`, in order of appearance.
pub fn referenced_items(expression: &str) -> Result<Vec<ItemRef>, ExpressionError> {
    let mut items: Vec<ItemRef> = Vec::new();
    for token in tokenize(expression)? {
        if let Token::Macro { item, .. } = token {
            if !items.contains(&item) {
                items.push(item);
            }
        }
    }
    Ok(items)
}

fn collect_parts(segment: &[Token], parts: &mut Vec<ExpressionPart>) -> Option<()> {
    let inner = strip_enclosing(segment)?;
    let (pieces, ops) = split_top_level(inner)?;

    // A run of match clauses: every piece is itself a parenthesized clause.
    if pieces.len() > 1 && pieces.iter().all(|p| strip_enclosing(p).is_some()) {
        for piece in pieces {
            collect_parts(piece, parts)?;
        }
        return Some(());
    }

    parts.push(parse_clause(&pieces, &ops)?);
    Some(())
}

fn parse_clause(pieces: &[&[Token]], ops: &[Connective]) -> Option<ExpressionPart> {
    let mut value = String::new();
    let mut comparison: Option<Comparison> = None;

    for (i, piece) in pieces.iter().enumerate() {
        let [Token::Open, Token::Macro { call, .. }, Token::Close, Token::Cmp(cmp)] = *piece else {
            return None;
        };
        if comparison.is_some_and(|c| c != *cmp) {
            return None;
        }
        comparison = Some(*cmp);

        if i > 0 {
            value.push_str(ops[i - 1].as_str());
        }
        value.push_str(&call.render());
    }

    Some(ExpressionPart::new(value, comparison?.expression_type()))
}

/// Split at depth-0 connectives. `None` on unbalanced parentheses or an
/// empty operand.
fn split_top_level(tokens: &[Token]) -> Option<(Vec<&[Token]>, Vec<Connective>)> {
    let mut segments = Vec::new();
    let mut ops = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Open => depth += 1,
            Token::Close => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            Token::Op(op) if depth == 0 => {
                if i == start {
                    return None;
                }
                segments.push(&tokens[start..i]);
                ops.push(*op);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 || start == tokens.len() {
        return None;
    }
    segments.push(&tokens[start..]);
    Some((segments, ops))
}

/// Remove one pair of parentheses when it encloses the whole slice.
fn strip_enclosing(tokens: &[Token]) -> Option<&[Token]> {
    if tokens.len() < 2 || tokens[0] != Token::Open || tokens[tokens.len() - 1] != Token::Close {
        return None;
    }

    let mut depth = 0i32;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Open => depth += 1,
            Token::Close => {
                depth -= 1;
                if depth == 0 && i != tokens.len() - 1 {
                    return None;
                }
            }
            _ => {}
        }
    }
    Some(&tokens[1..tokens.len() - 1])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
