// src/build/mod.rs

//! Per-file rebuild logic.
//!
//! - `router`: extension → [`SourceKind`](crate::types::SourceKind).
//! - `naming`: source path → derived path (including the publish transform).
//! - `freshness`: skip work when the derived file is newer.
//! - `convert`: the converters themselves.
//! - `pipeline`: read, convert, write.
//! - `registry`: the aggregated store registry.
//! - `deletion`: cleanup when a source is removed.
//!
//! None of this knows about watching or scanning; see `engine` for that.

pub mod convert;
pub mod deletion;
pub mod freshness;
pub mod naming;
pub mod pipeline;
pub mod registry;
pub mod router;

pub use convert::{CommandConverter, ConvertFuture, Converter, ConverterSet, TamlPackager};
pub use deletion::{deletion_targets, handle_deletion, DeletionReport};
pub use freshness::{decide, is_fresh};
pub use naming::{derived_path, publish_stem, stub_of};
pub use pipeline::{Brewer, RunOutcome};
pub use registry::{RegistryReport, StoreRegistry, StoreRegistryEntry};
pub use router::{route, Route};
