//! Tree-walking evaluation of the lowered plugin AST.
//!
//! Evaluation is asynchronous so that host functions (the resolver behind
//! `require`, consent prompts) can suspend a running plugin.

pub mod expression;
pub mod function;
pub mod pattern;
pub mod statement;
pub mod types;

pub use types::{Completion, CompletionType, EvalResult, ExecutionContext, ValueResult};
