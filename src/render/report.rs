//! Plain-text report: one summary per file plus every parse error in
//! `path:line: message` form.

use crate::model::Func;
use crate::render::Renderer;
use crate::symbols::SymbolTable;
use anyhow::Result;

pub struct ReportRenderer {
    pub show_private: bool,
}

impl Renderer for ReportRenderer {
    fn render(&self, symbols: &SymbolTable) -> Result<String> {
        let mut output = String::new();
        let mut totals = [0usize; 3];

        for (path, file) in symbols.files() {
            let functions: Vec<&Func> = file
                .functions
                .iter()
                .filter(|f| self.show_private || !f.private)
                .collect();

            output.push_str(&format!(
                "{}: {} functions, {} classes, {} aliases\n",
                path,
                functions.len(),
                file.classes.len(),
                file.aliases.len()
            ));
            for func in &functions {
                output.push_str(&format!("  {}\n", signature(func)));
            }
            for class in &file.classes {
                let mut line = format!("  class {}", class.name);
                if let Some(parent) = &class.parent {
                    line.push_str(&format!(" : {}", parent));
                }
                line.push_str(&format!(" ({} fields)", class.fields.len()));
                if class.opaque {
                    line.push_str(" [opaque]");
                }
                output.push_str(&line);
                output.push('\n');
            }
            for alias in &file.aliases {
                let values: Vec<String> =
                    alias.values.iter().map(|v| format!("'{}'", v.value)).collect();
                output.push_str(&format!("  alias {} = {}\n", alias.name, values.join(" | ")));
            }

            totals[0] += functions.len();
            totals[1] += file.classes.len();
            totals[2] += file.aliases.len();
        }

        let errors: Vec<_> = symbols.errors().collect();
        if !errors.is_empty() {
            output.push('\n');
            for (path, err) in &errors {
                output.push_str(&format!("{}:{}: {}\n", path, err.line, err.message));
            }
        }

        output.push_str(&format!(
            "\n{} files, {} functions, {} classes, {} aliases, {} errors\n",
            symbols.files().count(),
            totals[0],
            totals[1],
            totals[2],
            errors.len()
        ));
        Ok(output)
    }
}

/// `name(a: T, b?: U) -> R` with `[private]`/`[deprecated]` marks.
fn signature(func: &Func) -> String {
    let params: Vec<String> = func
        .params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty))
        .collect();
    let mut sig = format!("{}({})", func.name, params.join(", "));
    if !func.returns.is_empty() {
        let returns: Vec<String> = func.returns.iter().map(|r| r.ty.to_string()).collect();
        sig.push_str(&format!(" -> {}", returns.join(", ")));
    }
    if func.private {
        sig.push_str(" [private]");
    }
    if func.deprecated {
        sig.push_str(" [deprecated]");
    }
    sig
}
