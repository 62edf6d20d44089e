//! Declaration classifier: decides what a chunk documents.
//!
//! Rules are tried in a fixed order and the first match wins:
//!
//! 1. the peek line declares a function and the chunk carries no tags, or
//!    carries `@param`/`@return`
//! 2. the chunk contains `@class`
//! 3. the chunk contains `@alias`
//! 4. anything else is ignored (`@type` variable annotations, plain prose)

use super::chunk_tags;
use regex::Regex;
use std::sync::LazyLock;

// `M.name = ...` assignment into the module table
static RE_MODULE_ASSIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^M\.(\w+)\s*=").unwrap());

// `function Qualified.Name(` statement, capitalized
static RE_FUNCTION_STMT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^function ([A-Z][A-Za-z0-9_:.]*)\s*\(").unwrap());

/// What a chunk documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Function { name: String },
    Class,
    Alias,
    Ignored,
}

/// Classify a chunk given the line that follows it (None at end of file).
pub fn classify(chunk: &[String], peek: Option<&str>) -> Declaration {
    let tags: Vec<&str> = chunk_tags(chunk).collect();
    let has = |tag: &str| tags.iter().any(|t| *t == tag);

    if let Some(name) = peek.and_then(function_name) {
        if tags.is_empty() || has("@param") || has("@return") {
            return Declaration::Function { name };
        }
    }
    if has("@class") {
        return Declaration::Class;
    }
    if has("@alias") {
        return Declaration::Alias;
    }
    Declaration::Ignored
}

/// Name declared by a function line, if it is one.
pub fn function_name(line: &str) -> Option<String> {
    if let Some(caps) = RE_MODULE_ASSIGN.captures(line) {
        return Some(caps[1].to_string());
    }
    RE_FUNCTION_STMT
        .captures(line)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn function_forms() {
        assert_eq!(function_name("M.setup = function(opts)").as_deref(), Some("setup"));
        assert_eq!(function_name("M.run=function()").as_deref(), Some("run"));
        assert_eq!(function_name("function M.myfunc()").as_deref(), Some("M.myfunc"));
        assert_eq!(function_name("function Foo:bar (x)").as_deref(), Some("Foo:bar"));
        assert_eq!(function_name("function lower.case()"), None);
        assert_eq!(function_name("local function helper()"), None);
        assert_eq!(function_name("  M.indented = 1"), None);
    }

    #[test]
    fn untagged_chunk_before_function_is_a_function() {
        let decl = classify(&chunk(&["---Just a summary"]), Some("function M.f()"));
        assert_eq!(decl, Declaration::Function { name: "M.f".into() });
    }

    #[test]
    fn param_or_return_makes_a_function() {
        let c = chunk(&["---@private", "---@return string"]);
        assert_eq!(
            classify(&c, Some("M.get = function()")),
            Declaration::Function { name: "get".into() }
        );
    }

    #[test]
    fn type_annotation_is_ignored() {
        let c = chunk(&["---@type integer"]);
        assert_eq!(classify(&c, Some("M.count = 0")), Declaration::Ignored);
    }

    #[test]
    fn class_and_alias() {
        let class = chunk(&["---@class a.B", "---@field x string"]);
        assert_eq!(classify(&class, Some("local B = {}")), Declaration::Class);
        assert_eq!(classify(&class, None), Declaration::Class);

        let alias = chunk(&["---@alias a.Kind", "---| 'x'"]);
        assert_eq!(classify(&alias, None), Declaration::Alias);
    }

    #[test]
    fn class_chunk_before_function_with_no_params_is_a_class() {
        let c = chunk(&["---@class a.B", "---@field x string"]);
        assert_eq!(classify(&c, Some("function M.new()")), Declaration::Class);
    }

    #[test]
    fn prose_before_plain_code_is_ignored() {
        let c = chunk(&["---Some notes"]);
        assert_eq!(classify(&c, Some("local x = 1")), Declaration::Ignored);
        assert_eq!(classify(&c, None), Declaration::Ignored);
    }
}
