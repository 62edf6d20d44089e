//! Renderer module: trait-based format dispatch.

pub mod json;
pub mod report;

use crate::symbols::SymbolTable;
use anyhow::{anyhow, Result};

/// Trait for rendering a scanned project into a specific output format.
pub trait Renderer {
    fn render(&self, symbols: &SymbolTable) -> Result<String>;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str, show_private: bool) -> Result<Box<dyn Renderer>> {
    match format {
        "report" | "text" => Ok(Box::new(report::ReportRenderer { show_private })),
        "json" => Ok(Box::new(json::JsonRenderer { show_private })),
        _ => Err(anyhow!("unknown format: {}. Use report or json", format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_formats() {
        assert!(create_renderer("report", false).is_ok());
        assert!(create_renderer("text", false).is_ok());
        assert!(create_renderer("json", true).is_ok());
    }

    #[test]
    fn unknown_format() {
        let err = create_renderer("markdown", false).err().unwrap();
        assert!(err.to_string().contains("unknown format: markdown"));
    }
}
