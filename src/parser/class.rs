//! `@class` blocks: description lines, the class header, an optional
//! `@opaque` marker, then one or more `@field` lines.

use super::{strip_marker, tag_end, tag_word, BlockError};
use crate::model::{Class, Field, Scope};
use crate::types::{
    expect, literal, optional_mark, parse_type_at, skip_blank, varname, Parsed,
    SyntaxError,
};

/// Parse a chunk containing an `@class` tag.
pub fn parse_class(lines: &[String]) -> Result<Class, BlockError> {
    let body: Vec<&str> = lines.iter().map(|l| strip_marker(l)).collect();

    let mut i = 0;
    let mut desc_lines = Vec::new();
    while let Some(line) = body.get(i).filter(|l| tag_word(l).is_none()) {
        desc_lines.push(line.trim());
        i += 1;
    }

    let header_idx = i;
    let header = body.get(i).copied().unwrap_or("");
    if tag_word(header) != Some("@class") {
        return Err(BlockError::at(i)(SyntaxError::new(header, 0, "`@class`")));
    }
    let (name, parent, exact) = class_header(header, tag_end(header)).map_err(BlockError::at(i))?;
    i += 1;

    let mut class = Class {
        name,
        parent,
        opaque: false,
        exact,
        desc: desc_lines.join("\n").trim().to_string(),
        fields: Vec::new(),
    };

    while i < body.len() {
        let line = body[i];
        match tag_word(line) {
            None if line.trim().is_empty() => {}
            Some("@opaque") if class.fields.is_empty() && !class.opaque => {
                if !line[tag_end(line)..].trim().is_empty() {
                    let err = SyntaxError::new(line, skip_blank(line, tag_end(line)), "end of line");
                    return Err(BlockError::at(i)(err));
                }
                class.opaque = true;
            }
            Some("@field") => {
                let field = field_line(line, tag_end(line)).map_err(BlockError::at(i))?;
                class.fields.push(field);
            }
            _ => {
                let indent = line.len() - line.trim_start().len();
                return Err(BlockError::at(i)(SyntaxError::new(line, indent, "`@field`")));
            }
        }
        i += 1;
    }

    if class.fields.is_empty() {
        let err = SyntaxError::new("", 0, "at least one `@field`");
        return Err(BlockError::at(header_idx)(err));
    }
    Ok(class)
}

/// `(exact)? Name (: Parent)?`
fn class_header(line: &str, pos: usize) -> Result<(String, Option<String>, bool), SyntaxError> {
    let pos = skip_blank(line, pos);
    let (exact, pos) = match literal(line, pos, "(exact)") {
        Some(end) => (true, skip_blank(line, end)),
        None => (false, pos),
    };

    let name_len = line[pos..]
        .find(|c: char| c.is_whitespace() || c == ':')
        .unwrap_or(line.len() - pos);
    if name_len == 0 {
        return Err(SyntaxError::new(line, pos, "a class name"));
    }
    let name = line[pos..pos + name_len].to_string();
    let pos = skip_blank(line, pos + name_len);

    let (parent, pos) = match literal(line, pos, ":") {
        Some(after) => {
            let start = skip_blank(line, after);
            let len = line[start..]
                .find(char::is_whitespace)
                .unwrap_or(line.len() - start);
            if len == 0 {
                return Err(SyntaxError::new(line, start, "a parent class name"));
            }
            (Some(line[start..start + len].to_string()), start + len)
        }
        None => (None, pos),
    };

    if !line[pos..].trim().is_empty() {
        return Err(SyntaxError::new(line, skip_blank(line, pos), "end of line"));
    }
    Ok((name, parent, exact))
}

/// The three `@field` shapes, tried in order:
///
/// - `[KeyType] Type desc`
/// - `scope name?? Type desc`
/// - `name?? Type desc`
fn field_line(line: &str, pos: usize) -> Result<Field, SyntaxError> {
    let pos = skip_blank(line, pos);
    let shapes: [fn(&str, usize) -> Parsed<Field>; 3] = [map_field, scoped_field, plain_field];
    let mut furthest: Option<SyntaxError> = None;
    for shape in shapes {
        match shape(line, pos) {
            Ok((mut field, end)) => {
                field.desc = line[end..].trim().to_string();
                return Ok(field);
            }
            Err(err) => {
                if furthest.as_ref().map_or(true, |f| err.position > f.position) {
                    furthest = Some(err);
                }
            }
        }
    }
    Err(furthest.unwrap_or_else(|| SyntaxError::new(line, pos, "a field")))
}

fn map_field(line: &str, pos: usize) -> Parsed<Field> {
    let pos = literal(line, pos, "[").ok_or_else(|| SyntaxError::new(line, pos, "`[`"))?;
    let (key, pos) = parse_type_at(line, pos)?;
    let pos = expect(line, pos, "]")?;
    let (ty, pos) = parse_type_at(line, pos)?;
    Ok((
        Field {
            name: None,
            key_type: Some(key),
            ty,
            desc: String::new(),
            scope: None,
        },
        pos,
    ))
}

fn scoped_field(line: &str, pos: usize) -> Parsed<Field> {
    let (word, end) = varname(line, pos)?;
    let scope = Scope::from_keyword(word).ok_or_else(|| SyntaxError::new(line, pos, "a scope"))?;
    let (mut field, end) = plain_field(line, skip_blank(line, end))?;
    field.scope = Some(scope);
    Ok((field, end))
}

fn plain_field(line: &str, pos: usize) -> Parsed<Field> {
    let (name, pos) = varname(line, pos)?;
    let (optional, pos) = optional_mark(line, pos);
    let (ty, pos) = parse_type_at(line, pos)?;
    let ty = if optional { ty.optional() } else { ty };
    Ok((
        Field {
            name: Some(name.to_string()),
            key_type: None,
            ty,
            desc: String::new(),
            scope: None,
        },
        pos,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeExpr;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.to_string()).collect()
    }

    fn field(text: &str) -> Field {
        field_line(text, tag_end(text)).unwrap()
    }

    #[test]
    fn simple_field() {
        let f = field("@field fld_simple integer");
        assert_eq!(f.name.as_deref(), Some("fld_simple"));
        assert_eq!(f.ty, TypeExpr::Primitive("integer".into()));
        assert_eq!(f.scope, None);
        assert_eq!(f.desc, "");
        assert!(f.is_public());
    }

    #[test]
    fn scoped_field_with_desc() {
        let f = field("@field private fld_scoped integer my desc");
        assert_eq!(f.name.as_deref(), Some("fld_scoped"));
        assert_eq!(f.scope, Some(Scope::Private));
        assert_eq!(f.desc, "my desc");
        assert!(!f.is_public());
    }

    #[test]
    fn field_named_like_a_scope() {
        let f = field("@field private string");
        assert_eq!(f.name.as_deref(), Some("private"));
        assert_eq!(f.scope, None);
        assert_eq!(f.ty.to_string(), "string");
    }

    #[test]
    fn map_field() {
        let f = field("@field [string] integer my desc");
        assert_eq!(f.name, None);
        assert_eq!(f.key_type.as_ref().map(|t| t.to_string()).as_deref(), Some("string"));
        assert_eq!(f.ty.to_string(), "integer");
        assert_eq!(f.desc, "my desc");
    }

    #[test]
    fn public_scope_counts_as_public() {
        assert!(field("@field public name string").is_public());
        assert!(!field("@field protected name string").is_public());
        assert!(!field("@field package name string").is_public());
    }

    #[test]
    fn class_with_fields() {
        let class = parse_class(&lines(
            "---@class test.Class\n---@field fld_simple string\n---@field private _fld_scoped integer\n---@field fld_opt? integer",
        ))
        .unwrap();
        assert_eq!(class.name, "test.Class");
        assert_eq!(class.parent, None);
        assert!(!class.exact);
        assert_eq!(class.fields.len(), 3);
        assert_eq!(class.fields[1].scope, Some(Scope::Private));
        assert_eq!(class.fields[2].ty.to_string(), "nil|integer");
    }

    #[test]
    fn exact_and_parent() {
        let class =
            parse_class(&lines("---@class (exact) test.Class\n---@field a string")).unwrap();
        assert!(class.exact);
        assert_eq!(class.name, "test.Class");

        let class =
            parse_class(&lines("---@class test.Class: test.Parent\n---@field a string")).unwrap();
        assert_eq!(class.parent.as_deref(), Some("test.Parent"));
    }

    #[test]
    fn description_and_opaque() {
        let class = parse_class(&lines(
            "---Options for the thing\n---with two lines\n---@class test.Opts\n---@opaque\n---@field a string",
        ))
        .unwrap();
        assert_eq!(class.desc, "Options for the thing\nwith two lines");
        assert!(class.opaque);
    }

    #[test]
    fn class_without_fields_fails() {
        assert!(parse_class(&lines("---@class test.Empty")).is_err());
    }

    #[test]
    fn stray_tag_fails() {
        let err = parse_class(&lines("---@class a.B\n---@field a string\n---@private")).unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn bad_field_type_fails() {
        let err = parse_class(&lines("---@class a.B\n---@field a Unknown")).unwrap_err();
        assert_eq!(err.line, 1);
    }
}
