//! luadoc: parse `---` doc annotations in Lua sources into a typed
//! document model with cross-file class and alias resolution.

pub mod model;
pub mod parser;
pub mod render;
pub mod scan;
pub mod symbols;
pub mod types;

pub use model::{Alias, AliasValue, Class, Field, Func, LuaFile, Param, ParseError, Return, Scope};
pub use parser::{parse_lines, parse_source};
pub use scan::{scan_paths, ScanOptions};
pub use symbols::SymbolTable;
pub use types::{parse_type, SyntaxError, TypeExpr};
