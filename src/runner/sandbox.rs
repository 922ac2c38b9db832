//! Runs transpiled plugin bodies.

use std::rc::Rc;

use async_trait::async_trait;
use futures::future::FutureExt;
use thiserror::Error;

use crate::parser::{JsParser, Rule};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::async_host_function;
use crate::runner::ds::operations::type_conversion::get_type;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::statement::execute_function_body;
use crate::runner::eval::{CompletionType, ExecutionContext};
use crate::runner::plugin::ResolveError;
use crate::runner::std_lib::core::arg;

/// Provides modules to `require` calls of sandboxed code.
#[async_trait(?Send)]
pub trait RequireHandler {
    async fn require(&self, module: &str) -> Result<JsValue, ResolveError>;
}

/// Resolves every module to `undefined`.
pub struct NoopRequire;

#[async_trait(?Send)]
impl RequireHandler for NoopRequire {
    async fn require(&self, _module: &str) -> Result<JsValue, ResolveError> {
        Ok(JsValue::Undefined)
    }
}

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("{0}")]
    Syntax(Box<pest::error::Error<Rule>>),
    #[error("{0}")]
    Runtime(JErrorType),
}

/// An isolated global scope with the standard library installed.
///
/// Each `execute` call gets its own function scope on top of the shared
/// globals, with `require` bound to the given handler.
pub struct Sandbox {
    realm: Rc<Realm>,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    pub fn new() -> Self {
        Sandbox {
            realm: Rc::new(Realm::with_core()),
        }
    }

    pub fn realm(&self) -> &Rc<Realm> {
        &self.realm
    }

    /// Runs `body` as the body of an async function and returns what it
    /// returns.
    pub async fn execute(
        &self,
        body: &str,
        require: Rc<dyn RequireHandler>,
    ) -> Result<JsValue, SandboxError> {
        let statements = JsParser::parse_function_body(body)
            .map_err(|e| SandboxError::Syntax(Box::new(e)))?;

        let environment = self.realm.global_env.new_child();
        environment.initialize_binding("require", require_function(require), false);
        let ctx = ExecutionContext::new(self.realm.clone(), environment, JsValue::Undefined);

        let completion = execute_function_body(&statements, &ctx)
            .await
            .map_err(SandboxError::Runtime)?;
        Ok(match completion.completion_type {
            CompletionType::Return => completion.get_value(),
            _ => JsValue::Undefined,
        })
    }
}

fn require_function(handler: Rc<dyn RequireHandler>) -> JsValue {
    async_host_function("require", move |_this, args| {
        let handler = handler.clone();
        async move {
            let module = match arg(&args, 0) {
                JsValue::String(module) => module,
                other => {
                    return Err(JErrorType::TypeError(format!(
                        "require expects a module name, got {}",
                        get_type(&other)
                    )))
                }
            };
            handler
                .require(&module)
                .await
                .map_err(|e| JErrorType::Import(Rc::new(e)))
        }
        .boxed_local()
    })
}
