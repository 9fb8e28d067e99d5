//! In-process sandbox backed by a `boa_engine` context.

use boa_engine::native_function::{NativeFunction, NativeFunctionPointer};
use boa_engine::{js_string, Context, JsResult, JsValue, Source};

use super::{Interpreter, Sandbox, ScriptLimits};
use crate::{Error, Result};

/// One Boa context. Not `Send`: create it on the thread that uses it.
pub struct BoaSandbox {
    ctx: Context,
}

// Forwards `__d2latex_log(level, text)` calls from the polyfilled console to `log`.
fn console_native(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let level = match args.first() {
        Some(v) => v.to_string(ctx)?.to_std_string_escaped(),
        None => String::new(),
    };
    let text = match args.get(1) {
        Some(v) => v.to_string(ctx)?.to_std_string_escaped(),
        None => String::new(),
    };
    match level.as_str() {
        "error" => log::error!(target: "d2latex::script", "{}", text),
        "warn" => log::warn!(target: "d2latex::script", "{}", text),
        "info" => log::info!(target: "d2latex::script", "{}", text),
        _ => log::debug!(target: "d2latex::script", "{}", text),
    }
    Ok(JsValue::undefined())
}

impl BoaSandbox {
    pub fn new(limits: ScriptLimits) -> Result<Self> {
        let mut ctx = Context::default();
        let nf = NativeFunction::from_fn_ptr(console_native as NativeFunctionPointer);
        ctx.register_global_builtin_callable(js_string!("__d2latex_log"), 2, nf)
            .map_err(|e| Error::Script(format!("failed to register console sink: {}", e)))?;
        let mut sandbox = Self { ctx };
        sandbox.apply_limits(limits);
        Ok(sandbox)
    }

    pub fn apply_limits(&mut self, limits: ScriptLimits) {
        if limits.loop_iteration_limit > 0 {
            self.ctx.runtime_limits_mut().set_loop_iteration_limit(limits.loop_iteration_limit);
        }
        if limits.recursion_limit < usize::MAX {
            self.ctx.runtime_limits_mut().set_recursion_limit(limits.recursion_limit);
        }
    }

    fn eval(&mut self, source: &str) -> Result<JsValue> {
        self.ctx
            .eval(Source::from_bytes(source.as_bytes()))
            .map_err(|e| Error::Script(format!("Script thrown: {}", e)))
    }
}

impl Sandbox for BoaSandbox {
    fn interpreter(&self) -> Interpreter {
        Interpreter::Boa
    }

    fn tolerates_known_bundle_fault(&self) -> bool {
        false
    }

    fn run(&mut self, source: &str) -> Result<()> {
        self.eval(source).map(|_| ())
    }

    fn eval_string(&mut self, expr: &str) -> Result<String> {
        let value = self.eval(expr)?;
        let s = value
            .to_string(&mut self.ctx)
            .map_err(|e| Error::Script(format!("result is not convertible to a string: {}", e)))?;
        Ok(s.to_std_string_escaped())
    }
}
