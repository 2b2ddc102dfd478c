//! A mustache-style template scaffolding library.
//!
//! Templates are plain text with `{{ }}` tags: variables (`{{title}}`),
//! show/hide blocks (`{{address}} ... {{/address}}`), and partial includes
//! (`{{button "ui/button"}}`) which are expanded at parse time with their tag
//! names re-scoped under a `button-` prefix. Parse results are immutable and
//! cacheable per `(path, section)`; rendering binds a string-keyed data store
//! against a deep copy of the parsed token sequence.

mod cache;
mod data;
mod element;
mod engine;
mod error;
mod loader;
mod parser;
mod render;
mod template;

// Public exports.
pub use cache::TemplateCache;
pub use data::{BindValue, Bindable, DataStore};
pub use element::{Element, FieldIndex, ParsedTemplate, Partial};
pub use engine::TrellisEngine;
pub use error::{TrellisError, TrellisResult};
pub use loader::{FsLoader, MemoryLoader, TemplateLoader};
pub use parser::ParseOptions;
pub use template::{ChildView, Template};
