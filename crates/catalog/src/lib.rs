// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlmason-catalog
//!
//! The database-facing half of the toolkit: the injected [`Executor`]
//! capability, per-dialect catalog introspectors, and schema
//! synchronization.
//!
//! Everything here is async only because the executor is; the core holds no
//! connections, stores no executor beyond a call, and keeps no state between
//! calls. Catalog queries are built through the query AST and compiled by
//! the same dialect compiler as user statements, so quoting and
//! parameterization are uniform and the introspectors can be tested against
//! a mock executor.

pub mod error;
pub mod executor;
pub mod introspect;
pub mod sync;

pub use error::{CatalogError, CatalogResult};
pub use executor::{Executor, ExecutorCapabilities, QueryResult, Row};
pub use introspect::{IntrospectOptions, introspect};
pub use sync::{SyncOptions, synchronize_schema};
