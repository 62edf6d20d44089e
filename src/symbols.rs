//! Cross-file symbol table: classes and aliases looked up by name.
//!
//! Resolution is lazy: nothing is dereferenced while files are parsed, so
//! the order in which files declare their classes does not matter.

use crate::model::{Alias, AliasValue, Class, LuaFile, Param, ParseError};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// Every parsed file plus the class and alias indexes built from them.
#[derive(Debug, Default)]
pub struct SymbolTable {
    files: BTreeMap<String, LuaFile>,
    classes: HashMap<String, Class>,
    aliases: HashMap<String, Alias>,
}

/// Optional class-typed parameters are spelled `nil|a.B`; look up `a.B`.
fn lookup_key(type_name: &str) -> &str {
    type_name.strip_prefix("nil|").unwrap_or(type_name)
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and index its classes and aliases. A name declared
    /// twice resolves to the last declaration added.
    pub fn add_file(&mut self, path: impl Into<String>, file: LuaFile) {
        for class in &file.classes {
            self.classes.insert(class.name.clone(), class.clone());
        }
        for alias in &file.aliases {
            self.aliases.insert(alias.name.clone(), alias.clone());
        }
        self.files.insert(path.into(), file);
    }

    /// Files in path order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &LuaFile)> {
        self.files.iter().map(|(path, file)| (path.as_str(), file))
    }

    pub fn file(&self, path: &str) -> Option<&LuaFile> {
        self.files.get(path)
    }

    pub fn class(&self, type_name: &str) -> Option<&Class> {
        self.classes.get(lookup_key(type_name))
    }

    pub fn alias(&self, type_name: &str) -> Option<&Alias> {
        self.aliases.get(lookup_key(type_name))
    }

    /// The public, named fields of a class as parameters. Empty when the
    /// class is unknown or opaque.
    pub fn expand_class(&self, type_name: &str) -> Vec<Param> {
        let Some(class) = self.class(type_name) else {
            return Vec::new();
        };
        if class.opaque {
            return Vec::new();
        }
        class
            .fields
            .iter()
            .filter(|field| field.is_public())
            .filter_map(|field| {
                let name = field.name.as_ref()?;
                Some(Param::new(name.clone(), field.ty.clone(), field.desc.clone()))
            })
            .collect()
    }

    /// Enumerated values of a string alias. Empty when the name is unknown.
    pub fn expand_alias_values(&self, type_name: &str) -> &[AliasValue] {
        self.alias(type_name)
            .map(|alias| alias.values.as_slice())
            .unwrap_or(&[])
    }

    /// Every recorded parse error with the path of its file.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &ParseError)> {
        self.files()
            .flat_map(|(path, file)| file.errors.iter().map(move |err| (path, err)))
    }

    pub fn error_count(&self) -> usize {
        self.files.values().map(|file| file.errors.len()).sum()
    }
}

impl<P: Into<String>> FromIterator<(P, LuaFile)> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = (P, LuaFile)>>(iter: I) -> Self {
        let mut table = SymbolTable::new();
        for (path, file) in iter {
            table.add_file(path, file);
        }
        table
    }
}

impl Param {
    /// Explicit sub-params if any were written, otherwise the fields of the
    /// class named by this parameter's type.
    pub fn resolved_subparams(&self, symbols: &SymbolTable) -> Cow<'_, [Param]> {
        if !self.subparams.is_empty() {
            return Cow::Borrowed(&self.subparams);
        }
        Cow::Owned(symbols.expand_class(&self.ty.to_string()))
    }
}
