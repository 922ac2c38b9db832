//! # playground - sandboxed plugin compiler and import resolver
//!
//! Plugins are ES modules (TypeScript annotations allowed) that are compiled
//! into the body of an async function and run in a sandbox:
//! - PEG parser with an ESTree-like AST
//! - Transpiler lowering `import`/`export` to `require` calls and an
//!   `exports` object
//! - Async tree-walking interpreter
//! - Import resolver backed by tokens, host modules, local files and a
//!   consent-gated CDN
//!
//! ## Quick Start
//!
//! ### Transpiling a plugin
//!
//! ```
//! use playground::compiler::PluginTranspiler;
//!
//! let mut transpiler = PluginTranspiler::new();
//! let body = transpiler
//!     .transpile("import { x } from \"lib\"; export default x;", true)
//!     .unwrap();
//! assert!(body.contains("await require(\"lib\")"));
//! assert_eq!(transpiler.default_export(), Some("x"));
//! ```
//!
//! ### Loading a plugin
//!
//! ```
//! use futures::executor::block_on;
//! use playground::runner::ds::object::object_from_entries;
//! use playground::runner::ds::value::JsValue;
//! use playground::runner::plugin::{PluginLoader, ResolverOptions};
//!
//! let lib = object_from_entries(vec![("x", JsValue::from(5))]);
//! let resolver = ResolverOptions::new().known_module("lib", lib).build();
//! let loader = PluginLoader::new(resolver);
//!
//! let plugin = block_on(loader.load("import { x } from \"lib\"; export default x + 1;")).unwrap();
//! assert_eq!(plugin.default_export, JsValue::from(6));
//! ```
//!
//! ## Import resolution
//!
//! Each `require` is answered by the first strategy that can provide the
//! module:
//!
//! 1. **Tokens**: values registered as `"<module>:<attribute>"` shadow the
//!    attribute of that module.
//! 2. **Known modules**: values the host registered by identifier.
//! 3. **Local files**: `./x` and `../x`, read through the document service
//!    relative to the plugin's path. Scripts are compiled and run in a
//!    nested sandbox.
//! 4. **CDN**: fetched through the remote loader once the user agreed. The
//!    decision is persisted as the `allowCDN` setting.
//!
//! Failures are shown through the error reporter once and returned to the
//! plugin, where they can be caught.
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG parser and AST types
//! - **[`compiler`]** - Module lowering and code generation
//! - **[`runner`]** - Sandbox and interpreter
//!   - **[`runner::plugin`]** - Import resolver, consent and plugin loader
//!   - **[`runner::ds`]** - Data structures (values, objects, environments)
//!   - **[`runner::eval`]** - Tree-walking interpreter
//!   - **[`runner::std_lib`]** - Built-in objects

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod compiler;
pub mod parser;
pub mod runner;

pub use compiler::{PluginTranspiler, TranspileError};
pub use runner::plugin::{ImportResolver, ImportStatement, PluginLoader, ResolveError, ResolverOptions};
pub use runner::Sandbox;
