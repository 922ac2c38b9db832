//! Core types for the evaluation engine.

use std::rc::Rc;

use crate::runner::ds::env_record::Environment;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;

/// Completion record type.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionType {
    Normal,
    Return,
    Break,
    Continue,
}

/// Result of executing a statement. Exceptions travel as `Err(JErrorType)`
/// instead of a throw completion.
#[derive(Debug)]
pub struct Completion {
    pub completion_type: CompletionType,
    pub value: Option<JsValue>,
}

impl Completion {
    pub fn normal() -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: None,
        }
    }

    pub fn return_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Return,
            value: Some(value),
        }
    }

    pub fn break_completion() -> Self {
        Completion {
            completion_type: CompletionType::Break,
            value: None,
        }
    }

    pub fn continue_completion() -> Self {
        Completion {
            completion_type: CompletionType::Continue,
            value: None,
        }
    }

    pub fn is_normal(&self) -> bool {
        self.completion_type == CompletionType::Normal
    }

    pub fn is_abrupt(&self) -> bool {
        !self.is_normal()
    }

    /// Get the value, or undefined if none.
    pub fn get_value(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }
}

/// Everything a piece of code needs while it runs: the realm it belongs to,
/// the innermost scope and the `this` binding.
#[derive(Clone)]
pub struct ExecutionContext {
    pub realm: Rc<Realm>,
    pub environment: Environment,
    pub this: JsValue,
}

impl ExecutionContext {
    pub fn new(realm: Rc<Realm>, environment: Environment, this: JsValue) -> Self {
        ExecutionContext {
            realm,
            environment,
            this,
        }
    }

    /// Same context with a fresh block scope.
    pub fn new_block(&self) -> Self {
        self.with_environment(self.environment.new_child())
    }

    pub fn with_environment(&self, environment: Environment) -> Self {
        ExecutionContext {
            realm: self.realm.clone(),
            environment,
            this: self.this.clone(),
        }
    }
}

/// Result type for statement execution.
pub type EvalResult = Result<Completion, JErrorType>;

/// Result type for value-returning operations.
pub type ValueResult = Result<JsValue, JErrorType>;
