// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Function registry
//!
//! Dialect-aware dispatch from canonical function keys to renderers.
//!
//! ## Design
//!
//! Every [`FunctionCall`] in the AST names a function by *canonical key*
//! (`"GROUP_CONCAT"`, `"LOG_BASE"`, ...). At compile time the key is looked
//! up here and resolved for the active dialect:
//!
//! 1. If the key is unregistered, the call falls through to identifier-based
//!    rendering (`key(arg, arg)`), so user-defined and vendor functions work
//!    without registration.
//! 2. If the dialect's variant is marked unavailable, compilation fails with
//!    `UnsupportedFunction`.
//! 3. Otherwise the variant renderer, then the definition-level renderer, is
//!    used; with no renderer the resolved name is emitted with parenthesized
//!    arguments.
//!
//! Renderers receive a [`FunctionContext`] that re-enters the compiler, so a
//! rewrite controls the *compilation order* of its arguments: the SQLite
//! `LOG_BASE` rewrite emits `(LN(x) / LN(b))` and compiles `x` before `b`,
//! which keeps the positional parameter vector aligned with the emitted
//! placeholders.
//!
//! Registries are built once at dialect construction; duplicate keys fail
//! with `AlreadyRegistered`, and lookups never mutate.

pub mod builtin;

use std::collections::HashMap;
use std::sync::Arc;

use sqlmason_ast::{DialectName, FunctionCall, FunctionTable, Literal, Operand, OrderBy};

use crate::context::CompilerContext;
use crate::dialect::{Dialect, shared};
use crate::error::{CompileError, CompileResult};

/// Compiler re-entry point handed to function renderers.
pub struct FunctionContext<'a> {
    pub dialect: &'a dyn Dialect,
    pub ctx: &'a mut CompilerContext,
}

impl FunctionContext<'_> {
    pub fn dialect_name(&self) -> DialectName {
        self.dialect.name()
    }

    /// Compile an operand, extracting literals into the parameter vector.
    pub fn operand(&mut self, operand: &Operand) -> CompileResult<String> {
        shared::render_operand(self.dialect, self.ctx, operand)
    }

    /// Compile an `ORDER BY` item list (without the keyword).
    pub fn order_by_list(&mut self, items: &[OrderBy]) -> CompileResult<String> {
        shared::render_order_by_terms(self.dialect, self.ctx, items)
    }

    /// Inline an operand as literal SQL text instead of parameterizing it.
    /// Required where the grammar demands a literal, e.g. `SEPARATOR ', '`.
    pub fn literal_text(&self, operand: &Operand) -> CompileResult<String> {
        match operand {
            Operand::Literal(lit) => Ok(self.dialect.format_literal(lit)),
            Operand::Raw(text) => Ok(text.clone()),
            other => Err(CompileError::InvalidArgument(format!(
                "expected a literal operand, got {other:?}"
            ))),
        }
    }

    /// The string content of a literal argument, for renderers that branch
    /// on it (`DATE_TRUNC` units).
    pub fn literal_str(&self, operand: &Operand) -> CompileResult<String> {
        match operand {
            Operand::Literal(Literal::String(s)) => Ok(s.clone()),
            other => Err(CompileError::InvalidArgument(format!(
                "expected a string literal, got {other:?}"
            ))),
        }
    }

    pub fn quote(&self, ident: &str) -> CompileResult<String> {
        self.dialect.quote_identifier(ident)
    }
}

/// Renderer for a scalar or aggregate call. Receives the node, the compiler
/// re-entry context, and the resolved SQL name.
pub type RenderFn =
    Arc<dyn Fn(&mut FunctionContext<'_>, &FunctionCall, &str) -> CompileResult<String> + Send + Sync>;

/// Renderer for a table-valued function source.
pub type TableRenderFn =
    Arc<dyn Fn(&mut FunctionContext<'_>, &FunctionTable) -> CompileResult<String> + Send + Sync>;

/// Per-dialect override for one function key.
#[derive(Clone, Default)]
pub struct FunctionVariant {
    /// SQL identifier override for this dialect
    pub name: Option<String>,
    /// Complete rewrite for this dialect
    pub render: Option<RenderFn>,
    /// When false, compilation fails with `UnsupportedFunction`
    pub unavailable: bool,
}

impl FunctionVariant {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn rendered(render: RenderFn) -> Self {
        Self {
            render: Some(render),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

/// One registered function: canonical key, fallback name, optional generic
/// renderer, per-dialect variants.
#[derive(Clone, Default)]
pub struct FunctionDef {
    pub key: String,
    pub default_name: Option<String>,
    pub render: Option<RenderFn>,
    pub variants: HashMap<DialectName, FunctionVariant>,
}

impl FunctionDef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into().to_ascii_uppercase(),
            ..Self::default()
        }
    }

    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    pub fn with_render(mut self, render: RenderFn) -> Self {
        self.render = Some(render);
        self
    }

    pub fn variant(mut self, dialect: DialectName, variant: FunctionVariant) -> Self {
        self.variants.insert(dialect, variant);
        self
    }

    /// Resolved SQL name for a dialect: variant name, then default name,
    /// then the key itself.
    pub fn resolved_name(&self, dialect: DialectName) -> &str {
        self.variants
            .get(&dialect)
            .and_then(|v| v.name.as_deref())
            .or(self.default_name.as_deref())
            .unwrap_or(&self.key)
    }
}

/// Per-dialect entry for a table-valued function key.
#[derive(Clone, Default)]
pub struct TableFunctionVariant {
    pub render: Option<TableRenderFn>,
    pub unavailable: bool,
}

/// One registered table function.
#[derive(Clone, Default)]
pub struct TableFunctionDef {
    pub key: String,
    pub variants: HashMap<DialectName, TableFunctionVariant>,
}

impl TableFunctionDef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into().to_ascii_uppercase(),
            variants: HashMap::new(),
        }
    }

    pub fn available(mut self, dialect: DialectName) -> Self {
        self.variants.insert(dialect, TableFunctionVariant::default());
        self
    }

    pub fn rendered(mut self, dialect: DialectName, render: TableRenderFn) -> Self {
        self.variants.insert(
            dialect,
            TableFunctionVariant {
                render: Some(render),
                unavailable: false,
            },
        );
        self
    }

    pub fn unavailable(mut self, dialect: DialectName) -> Self {
        self.variants.insert(
            dialect,
            TableFunctionVariant {
                render: None,
                unavailable: true,
            },
        );
        self
    }
}

/// Lookup from canonical key to function definitions.
///
/// Read-mostly: built at dialect construction, then only queried.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    scalars: HashMap<String, FunctionDef>,
    tables: HashMap<String, TableFunctionDef>,
}

impl FunctionRegistry {
    /// Empty registry, for callers that want full control.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the builtin definitions.
    pub fn with_builtins() -> Self {
        builtin::registry()
    }

    pub fn register(&mut self, def: FunctionDef) -> CompileResult<()> {
        if self.scalars.contains_key(&def.key) {
            return Err(CompileError::AlreadyRegistered {
                key: def.key.clone(),
            });
        }
        self.scalars.insert(def.key.clone(), def);
        Ok(())
    }

    pub fn register_table(&mut self, def: TableFunctionDef) -> CompileResult<()> {
        if self.tables.contains_key(&def.key) {
            return Err(CompileError::AlreadyRegistered {
                key: def.key.clone(),
            });
        }
        self.tables.insert(def.key.clone(), def);
        Ok(())
    }

    /// Case-insensitive scalar lookup.
    pub fn get(&self, key: &str) -> Option<&FunctionDef> {
        self.scalars.get(&key.to_ascii_uppercase())
    }

    /// Case-insensitive table-function lookup.
    pub fn get_table(&self, key: &str) -> Option<&TableFunctionDef> {
        self.tables.get(&key.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.scalars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("scalars", &self.scalars.len())
            .field("tables", &self.tables.len())
            .finish()
    }
}
