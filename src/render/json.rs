//! JSON renderer: structured output for tooling integration.
//!
//! Serializes every file of the symbol table. Parameters are emitted with
//! their sub-params already resolved (explicit lines or the fields of the
//! named class) and with the values of any string alias they are typed as,
//! so consumers never need to do cross-file lookups themselves.

use crate::model::*;
use crate::render::Renderer;
use crate::symbols::SymbolTable;
use anyhow::{Context, Result};
use serde::Serialize;

pub struct JsonRenderer {
    pub show_private: bool,
}

#[derive(Serialize)]
struct ProjectView<'a> {
    files: Vec<FileView<'a>>,
    error_count: usize,
}

#[derive(Serialize)]
struct FileView<'a> {
    path: &'a str,
    functions: Vec<FuncView<'a>>,
    classes: &'a [Class],
    aliases: &'a [Alias],
    errors: &'a [ParseError],
}

#[derive(Serialize)]
struct FuncView<'a> {
    name: &'a str,
    line: usize,
    summary: &'a str,
    params: Vec<ParamView>,
    returns: &'a [Return],
    #[serde(skip_serializing_if = "Option::is_none")]
    example: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
    private: bool,
    deprecated: bool,
}

#[derive(Serialize)]
struct ParamView {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    desc: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    subparams: Vec<ParamView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<AliasValue>,
}

impl Renderer for JsonRenderer {
    fn render(&self, symbols: &SymbolTable) -> Result<String> {
        let files = symbols
            .files()
            .map(|(path, file)| FileView {
                path,
                functions: file
                    .functions
                    .iter()
                    .filter(|f| self.show_private || !f.private)
                    .map(|f| func_view(f, symbols))
                    .collect(),
                classes: &file.classes,
                aliases: &file.aliases,
                errors: &file.errors,
            })
            .collect();
        let project = ProjectView {
            files,
            error_count: symbols.error_count(),
        };
        let mut out = serde_json::to_string_pretty(&project).context("failed to serialize JSON")?;
        out.push('\n');
        Ok(out)
    }
}

fn func_view<'a>(func: &'a Func, symbols: &'a SymbolTable) -> FuncView<'a> {
    let mut expanding = Vec::new();
    FuncView {
        name: &func.name,
        line: func.line,
        summary: &func.summary,
        params: func
            .params
            .iter()
            .map(|p| param_view(p, symbols, &mut expanding))
            .collect(),
        returns: &func.returns,
        example: func.example.as_deref(),
        note: func.note.as_deref(),
        private: func.private,
        deprecated: func.deprecated,
    }
}

/// `expanding` holds the classes currently being expanded so a class that
/// refers to itself is not expanded again.
fn param_view<'a>(
    param: &Param,
    symbols: &'a SymbolTable,
    expanding: &mut Vec<&'a str>,
) -> ParamView {
    let type_name = param.ty.to_string();
    let class = if param.subparams.is_empty() {
        symbols.class(&type_name).map(|c| c.name.as_str())
    } else {
        None
    };

    let subparams = match class {
        Some(name) if expanding.contains(&name) => Vec::new(),
        _ => {
            expanding.extend(class);
            let views: Vec<ParamView> = param
                .resolved_subparams(symbols)
                .iter()
                .map(|sub| param_view(sub, symbols, expanding))
                .collect();
            if class.is_some() {
                expanding.pop();
            }
            views
        }
    };

    ParamView {
        name: param.name.clone(),
        values: symbols.expand_alias_values(&type_name).to_vec(),
        ty: type_name,
        desc: param.desc.clone(),
        subparams,
    }
}
