//! Tag grammar for function blocks: summary line, `@param` (with indented
//! sub-params), `@return`, `@private`, `@deprecated`, `@example` and `@note`.
//!
//! Parsing is all-or-nothing: the first line that does not fit the grammar
//! rejects the whole block.

use super::{strip_marker, tag_end, tag_word, BlockError};
use crate::model::{Func, Param, Return};
use crate::types::{literal, optional_mark, parse_type_at, skip_blank, varname, SyntaxError};

/// Parse the comment lines (still carrying their `---` marker) documenting
/// the function `name`.
pub fn parse_function(name: &str, lines: &[String]) -> Result<Func, BlockError> {
    let body: Vec<&str> = lines.iter().map(|l| strip_marker(l)).collect();
    let mut func = Func {
        name: name.to_string(),
        ..Default::default()
    };

    let mut i = skip_blank_lines(&body, 0);
    if let Some(first) = body.get(i) {
        if tag_word(first).is_none() {
            func.summary = first.trim().to_string();
            i += 1;
        }
    }

    while i < body.len() {
        let line = body[i];
        if line.trim().is_empty() {
            i += 1;
            continue;
        }
        let Some(tag) = tag_word(line) else {
            return Err(BlockError::at(i)(SyntaxError::new(line, 0, "a tag")));
        };
        let rest = tag_end(line);

        match tag {
            "@param" => {
                let mut param = param_line(line, rest, true).map_err(BlockError::at(i))?;
                i += 1;
                while let Some(sub) = body.get(i).filter(|l| is_indented_text(l)) {
                    param
                        .subparams
                        .push(param_line(sub, 0, false).map_err(BlockError::at(i))?);
                    i += 1;
                }
                func.params.push(param);
            }
            "@return" => {
                let (ty, end) = parse_type_at(line, rest).map_err(BlockError::at(i))?;
                func.returns.push(Return {
                    ty,
                    desc: line[end..].trim().to_string(),
                });
                i += 1;
            }
            "@private" | "@deprecated" => {
                end_of_line(line, rest).map_err(BlockError::at(i))?;
                if tag == "@private" {
                    func.private = true;
                } else {
                    func.deprecated = true;
                }
                i += 1;
            }
            "@example" | "@note" => {
                end_of_line(line, rest).map_err(BlockError::at(i))?;
                let (text, next) = indented_body(&body, i + 1)
                    .ok_or_else(|| BlockError::at(i + 1)(missing_body(&body, i + 1)))?;
                if tag == "@example" {
                    func.example = Some(text);
                } else {
                    func.note = Some(text);
                }
                i = next;
            }
            _ => {
                let indent = line.len() - line.trim_start().len();
                return Err(BlockError::at(i)(SyntaxError::new(
                    line,
                    indent,
                    "`@param`, `@return`, `@private`, `@deprecated`, `@example` or `@note`",
                )));
            }
        }
    }

    Ok(func)
}

/// `(... | name) "?"? type description?` starting at `pos`. Sub-param lines
/// use the same shape without varargs.
fn param_line(line: &str, pos: usize, allow_varargs: bool) -> Result<Param, SyntaxError> {
    let pos = skip_blank(line, pos);
    let (name, pos) = match literal(line, pos, "...") {
        Some(end) if allow_varargs => ("...", end),
        _ => varname(line, pos)?,
    };
    let (optional, pos) = optional_mark(line, pos);
    let (ty, end) = parse_type_at(line, pos)?;
    let ty = if optional { ty.optional() } else { ty };
    Ok(Param::new(name, ty, line[end..].trim()))
}

/// Flags and block openers carry no payload.
fn end_of_line(line: &str, pos: usize) -> Result<(), SyntaxError> {
    if line[pos..].trim().is_empty() {
        Ok(())
    } else {
        Err(SyntaxError::new(line, skip_blank(line, pos), "end of line"))
    }
}

/// A line that starts with whitespace and has something after it.
fn is_indented_text(line: &str) -> bool {
    line.starts_with([' ', '\t']) && !line.trim().is_empty() && tag_word(line).is_none()
}

/// Collect the indented lines starting at `start`, dropping one leading
/// whitespace character from each. None if there is not at least one.
fn indented_body(body: &[&str], start: usize) -> Option<(String, usize)> {
    let mut end = start;
    while body.get(end).is_some_and(|l| is_indented_text(l)) {
        end += 1;
    }
    if end == start {
        return None;
    }
    let text = body[start..end]
        .iter()
        .map(|l| &l[1..])
        .collect::<Vec<_>>()
        .join("\n");
    Some((text, end))
}

fn missing_body(body: &[&str], at: usize) -> SyntaxError {
    SyntaxError::new(body.get(at).copied().unwrap_or(""), 0, "an indented line")
}

fn skip_blank_lines(body: &[&str], mut i: usize) -> usize {
    while body.get(i).is_some_and(|l| l.trim().is_empty()) {
        i += 1;
    }
    i
}
