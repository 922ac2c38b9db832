pub mod ds;
pub mod eval;
pub mod plugin;
pub mod sandbox;
pub mod std_lib;

pub use sandbox::{NoopRequire, RequireHandler, Sandbox, SandboxError};
