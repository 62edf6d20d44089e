//! Block segmenter: groups `---` comment lines into chunks and hands each
//! chunk, with the line that follows it, to the classifier.

pub mod alias;
pub mod class;
pub mod classify;
pub mod tags;

use crate::model::{LuaFile, ParseError};
use crate::types::SyntaxError;
use classify::Declaration;
use thiserror::Error;
use tracing::trace;

/// Marker that starts every annotation line.
pub const DOC_MARKER: &str = "---";

/// A grammar failure inside one comment block.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{source} (block line {})", .line + 1)]
pub struct BlockError {
    /// 0-based index of the offending line within the block
    pub line: usize,
    #[source]
    pub source: SyntaxError,
}

impl BlockError {
    pub(crate) fn at(line: usize) -> impl FnOnce(SyntaxError) -> BlockError {
        move |source| BlockError { line, source }
    }
}

/// Parse the contents of one source file.
pub fn parse_source(content: &str) -> LuaFile {
    parse_lines(content.lines())
}

/// Parse a sequence of source lines. Malformed blocks are recorded in
/// [`LuaFile::errors`] and never stop the scan.
pub fn parse_lines<I, S>(lines: I) -> LuaFile
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut file = LuaFile::default();
    let mut chunk: Vec<String> = Vec::new();
    let mut chunk_start = 0;

    for (idx, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if line.starts_with(DOC_MARKER) {
            if chunk.is_empty() {
                chunk_start = idx + 1;
            }
            chunk.push(line.to_string());
        } else if !chunk.is_empty() {
            process_chunk(&mut file, std::mem::take(&mut chunk), chunk_start, Some(line));
        }
    }

    if !chunk.is_empty() {
        process_chunk(&mut file, chunk, chunk_start, None);
    }

    file
}

/// Classify one chunk and store whatever it produces.
fn process_chunk(file: &mut LuaFile, chunk: Vec<String>, start: usize, peek: Option<&str>) {
    match classify::classify(&chunk, peek) {
        Declaration::Function { name } => match tags::parse_function(&name, &chunk) {
            Ok(mut func) => {
                func.line = start;
                func.raw_annotation = chunk;
                file.functions.push(func);
            }
            Err(err) => {
                let message = format!("function `{}`: {}", name, err.source);
                file.errors.push(block_error(message, err.line, chunk, start, peek));
            }
        },
        Declaration::Class => match class::parse_class(&chunk) {
            Ok(class) => file.classes.push(class),
            Err(err) => {
                let message = format!("class: {}", err.source);
                file.errors.push(block_error(message, err.line, chunk, start, peek));
            }
        },
        Declaration::Alias => {
            if let Some(alias) = alias::parse_alias(&chunk) {
                file.aliases.push(alias);
            } else {
                trace!(line = start, "alias block has no enumerated values");
            }
        }
        Declaration::Ignored => match peek.and_then(classify::function_name) {
            Some(name) => trace!(
                line = start,
                function = %name,
                "function block has no `@param` or `@return`, skipping"
            ),
            None => trace!(line = start, "ignoring annotation block"),
        },
    }
}

fn block_error(
    message: String,
    offset: usize,
    mut lines: Vec<String>,
    start: usize,
    peek: Option<&str>,
) -> ParseError {
    if let Some(peek) = peek {
        lines.push(peek.to_string());
    }
    ParseError {
        message,
        line: start + offset,
        lines,
    }
}

/// Remove the `---` marker from a chunk line.
pub(crate) fn strip_marker(line: &str) -> &str {
    line.strip_prefix(DOC_MARKER).unwrap_or(line)
}

/// The `@tag` word a stripped line starts with, if any.
pub(crate) fn tag_word(body: &str) -> Option<&str> {
    let text = body.trim_start();
    if !text.starts_with('@') {
        return None;
    }
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    Some(&text[..end])
}

/// Byte offset just past the tag word of a stripped line.
pub(crate) fn tag_end(body: &str) -> usize {
    let indent = body.len() - body.trim_start().len();
    indent + tag_word(body).map_or(0, str::len)
}

/// Every tag used anywhere in the chunk.
pub(crate) fn chunk_tags(chunk: &[String]) -> impl Iterator<Item = &str> {
    chunk.iter().filter_map(|line| tag_word(strip_marker(line)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeExpr;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn parse_function_and_class_in_one_file() {
        let input = r#"local M = {}

---@class test.Opts
---@field name string The name
---@field count? integer

---Do the thing
---@param opts test.Opts
---@return boolean
M.run = function(opts)
end

return M
"#;
        let file = parse_source(input);
        assert!(file.errors.is_empty(), "{:?}", file.errors);
        assert_eq!(file.classes.len(), 1);
        assert_eq!(file.classes[0].name, "test.Opts");
        assert_eq!(file.functions.len(), 1);
        let func = &file.functions[0];
        assert_eq!(func.name, "run");
        assert_eq!(func.summary, "Do the thing");
        assert_eq!(func.line, 7);
        assert_eq!(func.raw_annotation.len(), 3);
        assert_eq!(func.raw_annotation[0], "---Do the thing");
    }

    #[test]
    fn trailing_chunk_without_declaration() {
        let input = "local x = 1\n---@alias test.Kind\n---| 'a' # first\n---| 'b' # second";
        let file = parse_source(input);
        assert_eq!(file.aliases.len(), 1);
        assert_eq!(file.aliases[0].name, "test.Kind");
        assert_eq!(file.aliases[0].values.len(), 2);
    }

    #[test]
    fn one_bad_block_does_not_abort_the_file() {
        let input = r#"---@param a nil|
function M.broken(a)
end

---Works fine
---@param name string The name
---@return integer count
function M.works(name)
end
"#;
        let file = parse_source(input);
        assert_eq!(file.functions.len(), 1);
        assert_eq!(file.errors.len(), 1);

        let func = &file.functions[0];
        assert_eq!(func.name, "M.works");
        assert_eq!(func.summary, "Works fine");
        assert_eq!(func.params.len(), 1);
        assert_eq!(func.params[0].name, "name");
        assert_eq!(func.params[0].desc, "The name");
        assert_eq!(func.returns[0].ty, TypeExpr::Primitive("integer".into()));
        assert_eq!(func.returns[0].desc, "count");

        let err = &file.errors[0];
        assert_eq!(err.line, 1);
        assert!(err.message.contains("M.broken"), "{}", err.message);
        assert_eq!(err.lines, vec!["---@param a nil|", "function M.broken(a)"]);
    }

    #[test]
    fn error_line_points_at_offending_line() {
        let input = "\n---Summary\n---@param ok string\n---@param bad Unknown\nfunction M.f() end\n";
        let file = parse_source(input);
        assert_eq!(file.errors.len(), 1);
        assert_eq!(file.errors[0].line, 4);
    }

    #[test]
    fn deeply_nested_type_is_a_block_error() {
        let deep = format!("{}string{}", "table<string, ".repeat(20_000), ">".repeat(20_000));
        let input = format!(
            "---@param a {}\nfunction M.f(a) end\n\n---@param b string\nfunction M.g(b) end\n",
            deep
        );
        let file = parse_source(&input);
        assert_eq!(file.errors.len(), 1);
        assert_eq!(file.errors[0].line, 1);
        assert!(file.errors[0].message.contains("a shallower type"));
        assert_eq!(file.functions.len(), 1);
        assert_eq!(file.functions[0].name, "M.g");
    }

    /// Shared buffer the test subscriber writes into.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn skipped_function_block_is_traced() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();

        let file = tracing::subscriber::with_default(subscriber, || {
            parse_source("---Old thing\n---@deprecated\nfunction M.old() end\n")
        });
        assert!(file.is_empty());

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("function=M.old"), "{}", logs);
        assert!(logs.contains("has no `@param` or `@return`"), "{}", logs);
    }

    #[test]
    fn type_annotations_are_ignored() {
        let input = "---@type table<string, integer>\nM.cache = {}\n";
        let file = parse_source(input);
        assert!(file.is_empty());
    }

    #[test]
    fn undocumented_code_produces_nothing() {
        let file = parse_source("local function f()\nend\n-- plain comment\n");
        assert!(file.is_empty());
    }

    #[test]
    fn chunk_resets_after_peek_line() {
        let input = "---First\nlocal a = 1\n---Second\nfunction M.second() end\n";
        let file = parse_source(input);
        assert_eq!(file.functions.len(), 1);
        assert_eq!(file.functions[0].summary, "Second");
    }

    #[test]
    fn tag_word_extraction() {
        assert_eq!(tag_word("@param x string"), Some("@param"));
        assert_eq!(tag_word("  @private"), Some("@private"));
        assert_eq!(tag_word("summary"), None);
        assert_eq!(tag_end("  @param x"), 8);
    }
}
