//! Data model for parsed annotations: format-agnostic.

use crate::types::TypeExpr;
use serde::Serialize;

/// Everything extracted from a single source file.
#[derive(Debug, Default, Clone, Serialize)]
pub struct LuaFile {
    pub functions: Vec<Func>,
    pub classes: Vec<Class>,
    pub aliases: Vec<Alias>,
    /// Blocks that failed to parse. Never fatal for the rest of the file.
    pub errors: Vec<ParseError>,
}

impl LuaFile {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
            && self.classes.is_empty()
            && self.aliases.is_empty()
            && self.errors.is_empty()
    }
}

/// A documented function.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Func {
    pub name: String,
    pub summary: String,
    pub params: Vec<Param>,
    pub returns: Vec<Return>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub private: bool,
    pub deprecated: bool,
    /// The comment lines exactly as they appear in the source
    #[serde(skip)]
    pub raw_annotation: Vec<String>,
    /// 1-based line of the first comment line
    pub line: usize,
}

/// `@param` entry, or a sub-parameter nested under one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    /// Parameter name, or `...` for varargs
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    pub desc: String,
    /// Explicit indented sub-lines. Empty when none were written.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subparams: Vec<Param>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeExpr, desc: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            ty,
            desc: desc.into(),
            subparams: Vec::new(),
        }
    }
}

/// `@return` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Return {
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    pub desc: String,
}

/// Field visibility. A field without a scope keyword is public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Private,
    Protected,
    Package,
    Public,
}

impl Scope {
    pub fn from_keyword(word: &str) -> Option<Scope> {
        match word {
            "private" => Some(Scope::Private),
            "protected" => Some(Scope::Protected),
            "package" => Some(Scope::Package),
            "public" => Some(Scope::Public),
            _ => None,
        }
    }
}

/// `@field` entry of a class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// None for map-style fields (`[KeyType] Type`)
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_type: Option<TypeExpr>,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    pub desc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl Field {
    pub fn is_public(&self) -> bool {
        matches!(self.scope, None | Some(Scope::Public))
    }
}

/// `@class` declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Never expanded into sub-parameters
    pub opaque: bool,
    /// Declared with `(exact)`
    pub exact: bool,
    pub desc: String,
    pub fields: Vec<Field>,
}

/// `@alias` declaration enumerating string values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alias {
    pub name: String,
    pub values: Vec<AliasValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasValue {
    pub value: String,
    pub desc: String,
}

/// A comment block that could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    pub message: String,
    /// 1-based line of the first offending line
    pub line: usize,
    /// The chunk plus the declaration line that followed it
    pub lines: Vec<String>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.message)?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
