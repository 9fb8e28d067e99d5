//! Scripting sandbox abstraction and its backends.
//!
//! A [`Sandbox`] is one isolated script execution context. Backends:
//!
//! - [`boa::BoaSandbox`]: in-process `boa_engine` context (feature `boa`, default)
//! - [`process::ProcessSandbox`]: a Boa context living in a `d2latex --worker`
//!   child process, killed when the sandbox is dropped
//! - [`host::HostSandbox`]: the host JavaScript engine on wasm32 (feature `host-js`)

use crate::{BootstrapStage, Error, LatexConfig, Result};

#[cfg(feature = "boa")]
pub mod boa;

#[cfg(all(feature = "boa", not(target_arch = "wasm32")))]
pub mod process;

#[cfg(all(feature = "host-js", target_arch = "wasm32"))]
pub mod host;

/// Which interpreter implementation backs a sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpreter {
    /// The embedded `boa_engine` interpreter
    Boa,
    /// The JavaScript engine of the host environment (browser, wasm runtime)
    Host,
}

/// An isolated script execution context.
pub trait Sandbox {
    /// Interpreter implementation behind this sandbox.
    fn interpreter(&self) -> Interpreter;

    /// Whether the typesetting bundle's known harmless load-time exception
    /// may be ignored on this backend.
    fn tolerates_known_bundle_fault(&self) -> bool;

    /// Execute script source text for its side effects.
    fn run(&mut self, source: &str) -> Result<()>;

    /// Evaluate an expression and convert the result to a string.
    fn eval_string(&mut self, expr: &str) -> Result<String>;
}

impl<S: Sandbox + ?Sized> Sandbox for Box<S> {
    fn interpreter(&self) -> Interpreter {
        (**self).interpreter()
    }

    fn tolerates_known_bundle_fault(&self) -> bool {
        (**self).tolerates_known_bundle_fault()
    }

    fn run(&mut self, source: &str) -> Result<()> {
        (**self).run(source)
    }

    fn eval_string(&mut self, expr: &str) -> Result<String> {
        (**self).eval_string(expr)
    }
}

/// Runtime limits applied to Boa contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLimits {
    /// Maximum loop iterations before Boa throws (0 => disabled)
    pub loop_iteration_limit: u64,
    /// Maximum recursion depth before Boa throws (usize::MAX => Boa's default)
    pub recursion_limit: usize,
}

impl ScriptLimits {
    pub fn from_config(config: &LatexConfig) -> Self {
        Self {
            loop_iteration_limit: config.script_loop_iteration_limit,
            recursion_limit: config.script_recursion_limit,
        }
    }
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self::from_config(&LatexConfig::default())
    }
}

/// Create a fresh sandbox with the backend selected by `config`.
///
/// Creation failures are reported as bootstrap failures at the `Create` stage.
// Process worker when requested, otherwise in-process Boa.
#[cfg(all(feature = "boa", not(target_arch = "wasm32")))]
pub fn new_sandbox(config: &LatexConfig) -> Result<Box<dyn Sandbox>> {
    let limits = ScriptLimits::from_config(config);
    let create_failed = |e: Error| Error::bootstrap(BootstrapStage::Create, e);
    let sandbox: Box<dyn Sandbox> = if config.use_process_worker {
        let program = match &config.worker_program {
            Some(p) => p.clone(),
            None => std::env::current_exe()
                .map_err(|e| Error::bootstrap(BootstrapStage::Create, e))?,
        };
        Box::new(process::ProcessSandbox::spawn(&program, limits).map_err(create_failed)?)
    } else {
        Box::new(boa::BoaSandbox::new(limits).map_err(create_failed)?)
    };
    Ok(sandbox)
}

// wasm32 with Boa compiled in: no child processes, always in-process.
#[cfg(all(feature = "boa", target_arch = "wasm32"))]
pub fn new_sandbox(config: &LatexConfig) -> Result<Box<dyn Sandbox>> {
    if config.use_process_worker {
        return Err(Error::bootstrap(
            BootstrapStage::Create,
            "process workers are unavailable on wasm32",
        ));
    }
    let sandbox = boa::BoaSandbox::new(ScriptLimits::from_config(config))
        .map_err(|e| Error::bootstrap(BootstrapStage::Create, e))?;
    Ok(Box::new(sandbox))
}

// Last resort: the host engine.
#[cfg(all(not(feature = "boa"), feature = "host-js", target_arch = "wasm32"))]
pub fn new_sandbox(_config: &LatexConfig) -> Result<Box<dyn Sandbox>> {
    Ok(Box::new(host::HostSandbox::new()))
}

#[cfg(all(not(feature = "boa"), not(all(feature = "host-js", target_arch = "wasm32"))))]
pub fn new_sandbox(_config: &LatexConfig) -> Result<Box<dyn Sandbox>> {
    Err(Error::bootstrap(BootstrapStage::Create, "no sandbox backend compiled in (enable `boa`)"))
}
