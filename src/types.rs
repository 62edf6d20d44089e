//! Type grammar: the type expressions embedded in `---@param`, `---@return`
//! and `---@field` annotations.
//!
//! Hand-written recursive descent. Every rule is a plain function over
//! `(input, pos)` that returns the parsed value together with the position
//! just past it, so an alternative backtracks by retrying from the same
//! position. Alternatives are ordered: the first one that succeeds wins.
//!
//! ```text
//! union      := non_union ( "|" non_union )*
//! non_union  := list | map | table_lit | function | primitive
//! list       := ("string"|"integer"|"number"|"any"|"boolean"|"table") "[]"
//! map        := "table" "<" union "," union ">"
//! table_lit  := "{" name "?"? ":" union ( "," name "?"? ":" union )* "}"
//! function   := "fun" "(" ( param ( "," param )* )? ")" ( ":" union )?
//! param      := ( "..." | name ) "?"? ":" union
//! primitive  := keyword | quoted | digits | dotted.name ( "[]" )?
//! ```

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bare primitive type keywords.
const KEYWORDS: &[&str] = &["nil", "string", "integer", "boolean", "number", "table", "any"];

/// Element types allowed in the `T[]` list form. This is a closed set; user
/// types spell their arrays as dotted names (`a.B[]`).
const LIST_ELEMENTS: &[&str] = &["string", "integer", "number", "any", "boolean", "table"];

/// How deeply `table<..>`, `{..}` and `fun(..)` may nest.
pub const MAX_DEPTH: usize = 64;

const TOO_DEEP: &str = "a shallower type";

/// A parsed type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// Keyword, quoted literal, integer literal or dotted user type name.
    Primitive(String),
    /// `string[]`, `integer[]`, ... (element keyword only)
    List(String),
    /// `table<K, V>`
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// `fun(a: T, b?: U): R`
    Function {
        params: Vec<NamedType>,
        returns: Option<Box<TypeExpr>>,
    },
    /// `{a: T, b?: U}`
    TableLiteral(Vec<NamedType>),
    /// `A|B|C`. Members are never unions themselves.
    Union(Vec<TypeExpr>),
}

/// A named slot inside a function signature or table literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    pub name: String,
    pub optional: bool,
    pub ty: TypeExpr,
}

/// The input did not match the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected} at offset {position}, found {found}")]
pub struct SyntaxError {
    /// Byte offset into the parsed text.
    pub position: usize,
    pub expected: String,
    pub found: String,
}

impl SyntaxError {
    pub(crate) fn new(input: &str, position: usize, expected: impl Into<String>) -> Self {
        let rest = &input[position.min(input.len())..];
        let found = if rest.trim().is_empty() {
            "end of line".to_string()
        } else {
            let snippet: String = rest.chars().take(16).collect();
            format!("{:?}", snippet)
        };
        SyntaxError {
            position,
            expected: expected.into(),
            found,
        }
    }
}

/// A parsed value and the byte offset just past it.
pub type Parsed<T> = Result<(T, usize), SyntaxError>;

impl TypeExpr {
    pub fn nil() -> Self {
        TypeExpr::Primitive("nil".to_string())
    }

    /// The type of an optional (`name?`) slot: `nil` followed by the members
    /// of `self`, flattened.
    pub fn optional(self) -> Self {
        let mut members = vec![TypeExpr::nil()];
        match self {
            TypeExpr::Union(rest) => members.extend(rest),
            other => members.push(other),
        }
        TypeExpr::Union(members)
    }

    /// Union members, or `self` alone for a non-union type.
    pub fn members(&self) -> &[TypeExpr] {
        match self {
            TypeExpr::Union(members) => members,
            other => std::slice::from_ref(other),
        }
    }

    /// True when `nil` is one of the union members.
    pub fn is_nullable(&self) -> bool {
        self.members()
            .iter()
            .any(|m| matches!(m, TypeExpr::Primitive(p) if p == "nil"))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Primitive(name) => f.write_str(name),
            TypeExpr::List(elem) => write!(f, "{}[]", elem),
            TypeExpr::Map(key, value) => write!(f, "table<{}, {}>", key, value),
            TypeExpr::Function { params, returns } => {
                f.write_str("fun(")?;
                write_named(f, params)?;
                f.write_str(")")?;
                if let Some(ret) = returns {
                    write!(f, ": {}", ret)?;
                }
                Ok(())
            }
            TypeExpr::TableLiteral(fields) => {
                f.write_str("{")?;
                write_named(f, fields)?;
                f.write_str("}")
            }
            TypeExpr::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
        }
    }
}

fn write_named(f: &mut fmt::Formatter<'_>, slots: &[NamedType]) -> fmt::Result {
    for (i, slot) in slots.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        let mark = if slot.optional { "?" } else { "" };
        write!(f, "{}{}: {}", slot.name, mark, slot.ty)?;
    }
    Ok(())
}

// Serialized as the canonical text form.
impl Serialize for TypeExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parses a complete type expression; only trailing blanks may follow it.
impl FromStr for TypeExpr {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ty, end) = parse_type(s)?;
        let end = skip_blank(s, end);
        if end != s.len() {
            return Err(SyntaxError::new(s, end, "end of type"));
        }
        Ok(ty)
    }
}

// -- Public API ---------------------------------------------------------------

/// Parse a type expression at the start of `input`.
///
/// Returns the type and the number of bytes consumed. Text after the type
/// (usually a description) is left alone.
pub fn parse_type(input: &str) -> Parsed<TypeExpr> {
    parse_type_at(input, 0)
}

/// Parse a type expression starting at byte offset `pos`.
pub fn parse_type_at(input: &str, pos: usize) -> Parsed<TypeExpr> {
    union(input, skip_blank(input, pos), 0)
}

// -- Grammar rules ------------------------------------------------------------

fn union(input: &str, pos: usize, depth: usize) -> Parsed<TypeExpr> {
    if depth >= MAX_DEPTH {
        return Err(SyntaxError::new(input, pos, TOO_DEEP));
    }
    let (first, mut pos) = non_union(input, pos, depth)?;
    let mut members = vec![first];
    while let Some(after_bar) = literal(input, skip_blank(input, pos), "|") {
        let (member, end) = non_union(input, skip_blank(input, after_bar), depth)?;
        members.push(member);
        pos = end;
    }
    if members.len() == 1 {
        Ok((members.remove(0), pos))
    } else {
        Ok((TypeExpr::Union(members), pos))
    }
}

fn non_union(input: &str, pos: usize, depth: usize) -> Parsed<TypeExpr> {
    let rules: [fn(&str, usize, usize) -> Parsed<TypeExpr>; 5] = [
        |input, pos, _| list(input, pos),
        map,
        table_literal,
        function,
        |input, pos, _| primitive(input, pos),
    ];
    let mut furthest: Option<SyntaxError> = None;
    for rule in rules {
        match rule(input, pos, depth) {
            Ok(parsed) => return Ok(parsed),
            // No shorter alternative may stand in for a nest that is too deep
            Err(err) if err.expected == TOO_DEEP => return Err(err),
            Err(err) => {
                if furthest.as_ref().map_or(true, |f| err.position > f.position) {
                    furthest = Some(err);
                }
            }
        }
    }
    // Report the alternative that got furthest; otherwise a generic message.
    match furthest {
        Some(err) if err.position > pos => Err(err),
        _ => Err(SyntaxError::new(input, pos, "a type")),
    }
}

fn list(input: &str, pos: usize) -> Parsed<TypeExpr> {
    for elem in LIST_ELEMENTS {
        if let Some(end) = literal(input, pos, elem).and_then(|p| literal(input, p, "[]")) {
            if !continues_ident(input, end) {
                return Ok((TypeExpr::List(elem.to_string()), end));
            }
        }
    }
    Err(SyntaxError::new(input, pos, "a list type"))
}

fn map(input: &str, pos: usize, depth: usize) -> Parsed<TypeExpr> {
    let pos = keyword(input, pos, "table").ok_or_else(|| SyntaxError::new(input, pos, "`table`"))?;
    let pos = expect(input, pos, "<")?;
    let (key, pos) = union(input, skip_blank(input, pos), depth + 1)?;
    let pos = expect(input, pos, ",")?;
    let (value, pos) = union(input, skip_blank(input, pos), depth + 1)?;
    let pos = expect(input, pos, ">")?;
    Ok((TypeExpr::Map(Box::new(key), Box::new(value)), pos))
}

fn table_literal(input: &str, pos: usize, depth: usize) -> Parsed<TypeExpr> {
    let mut pos = literal(input, pos, "{").ok_or_else(|| SyntaxError::new(input, pos, "`{`"))?;
    let mut fields = Vec::new();
    loop {
        let (field, end) = named_slot(input, pos, false, depth)?;
        fields.push(field);
        pos = skip_blank(input, end);
        match literal(input, pos, ",") {
            Some(next) => pos = next,
            None => break,
        }
    }
    let pos = expect(input, pos, "}")?;
    Ok((TypeExpr::TableLiteral(fields), pos))
}

fn function(input: &str, pos: usize, depth: usize) -> Parsed<TypeExpr> {
    let pos = keyword(input, pos, "fun").ok_or_else(|| SyntaxError::new(input, pos, "`fun`"))?;
    let mut pos = expect(input, pos, "(")?;
    let mut params = Vec::new();
    if literal(input, skip_blank(input, pos), ")").is_none() {
        loop {
            let (param, end) = named_slot(input, pos, true, depth)?;
            params.push(param);
            pos = skip_blank(input, end);
            match literal(input, pos, ",") {
                Some(next) => pos = next,
                None => break,
            }
        }
    }
    let pos = expect(input, pos, ")")?;
    let (returns, pos) = match literal(input, skip_blank(input, pos), ":") {
        Some(after_colon) => {
            let (ret, end) = union(input, skip_blank(input, after_colon), depth + 1)?;
            (Some(Box::new(ret)), end)
        }
        None => (None, pos),
    };
    Ok((TypeExpr::Function { params, returns }, pos))
}

/// `name?: type` inside a table literal or function signature. Function
/// parameters may also be named `...`.
fn named_slot(
    input: &str,
    pos: usize,
    allow_varargs: bool,
    depth: usize,
) -> Parsed<NamedType> {
    let pos = skip_blank(input, pos);
    let (name, pos) = match literal(input, pos, "...") {
        Some(end) if allow_varargs => ("...".to_string(), end),
        _ => {
            let (name, end) = varname(input, pos)?;
            (name.to_string(), end)
        }
    };
    let (optional, pos) = optional_mark(input, pos);
    let pos = expect(input, pos, ":")?;
    let (ty, pos) = union(input, skip_blank(input, pos), depth + 1)?;
    Ok((NamedType { name, optional, ty }, pos))
}

fn primitive(input: &str, pos: usize) -> Parsed<TypeExpr> {
    let rest = &input[pos..];
    if let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') {
        return match rest[1..].find(quote) {
            Some(close) => {
                let end = pos + close + 2;
                Ok((TypeExpr::Primitive(input[pos..end].to_string()), end))
            }
            None => Err(SyntaxError::new(input, pos, "a closing quote")),
        };
    }

    let mut end = ident_end(input, pos);
    if end == pos {
        return Err(SyntaxError::new(input, pos, "a type"));
    }
    let mut dotted = false;
    while literal(input, end, ".").is_some() && ident_end(input, end + 1) > end + 1 {
        end = ident_end(input, end + 1);
        dotted = true;
    }
    let word = &input[pos..end];

    if dotted {
        let end = literal(input, end, "[]").unwrap_or(end);
        return Ok((TypeExpr::Primitive(input[pos..end].to_string()), end));
    }
    if KEYWORDS.contains(&word) || word.bytes().all(|b| b.is_ascii_digit()) {
        return Ok((TypeExpr::Primitive(word.to_string()), end));
    }
    Err(SyntaxError::new(input, pos, "a type"))
}

// -- Lexical helpers ----------------------------------------------------------

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn ident_end(input: &str, pos: usize) -> usize {
    pos + input.as_bytes()[pos..]
        .iter()
        .take_while(|b| is_ident_byte(**b))
        .count()
}

fn continues_ident(input: &str, pos: usize) -> bool {
    input.as_bytes().get(pos).is_some_and(|b| is_ident_byte(*b))
}

pub(crate) fn skip_blank(input: &str, pos: usize) -> usize {
    pos + input.as_bytes()[pos..]
        .iter()
        .take_while(|b| **b == b' ' || **b == b'\t')
        .count()
}

pub(crate) fn literal(input: &str, pos: usize, lit: &str) -> Option<usize> {
    input[pos..].starts_with(lit).then(|| pos + lit.len())
}

/// Match `word` only at an identifier boundary.
pub(crate) fn keyword(input: &str, pos: usize, word: &str) -> Option<usize> {
    literal(input, pos, word).filter(|end| !continues_ident(input, *end))
}

/// Skip blanks, then require `lit`.
pub(crate) fn expect(input: &str, pos: usize, lit: &str) -> Result<usize, SyntaxError> {
    let pos = skip_blank(input, pos);
    literal(input, pos, lit).ok_or_else(|| SyntaxError::new(input, pos, format!("`{}`", lit)))
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn varname(input: &str, pos: usize) -> Parsed<&str> {
    let starts_ok = input
        .as_bytes()
        .get(pos)
        .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_');
    if !starts_ok {
        return Err(SyntaxError::new(input, pos, "a name"));
    }
    let end = ident_end(input, pos);
    Ok((&input[pos..end], end))
}

/// An optional `?` marker, possibly preceded by blanks.
pub(crate) fn optional_mark(input: &str, pos: usize) -> (bool, usize) {
    match literal(input, skip_blank(input, pos), "?") {
        Some(end) => (true, end),
        None => (false, pos),
    }
}
