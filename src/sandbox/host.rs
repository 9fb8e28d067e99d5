//! Sandbox that evaluates in the host JavaScript engine (wasm32 only).
//!
//! There is one host global scope per page/worker; every bootstrap re-runs the
//! payloads on top of it.

use wasm_bindgen::JsValue;

use super::{Interpreter, Sandbox};
use crate::{Error, Result};

#[derive(Debug, Default)]
pub struct HostSandbox;

impl HostSandbox {
    pub fn new() -> Self {
        HostSandbox
    }
}

fn describe(value: JsValue) -> Error {
    let msg = value.as_string().unwrap_or_else(|| {
        let err = js_sys::Error::from(value);
        String::from(err.to_string())
    });
    Error::Script(msg)
}

impl Sandbox for HostSandbox {
    fn interpreter(&self) -> Interpreter {
        Interpreter::Host
    }

    // MathJax throws a harmless exception while loading in browser hosts
    // (mathjax/MathJax#3289); the bundle is usable afterwards.
    fn tolerates_known_bundle_fault(&self) -> bool {
        true
    }

    fn run(&mut self, source: &str) -> Result<()> {
        js_sys::eval(source).map(|_| ()).map_err(describe)
    }

    fn eval_string(&mut self, expr: &str) -> Result<String> {
        let value = js_sys::eval(expr).map_err(describe)?;
        value
            .as_string()
            .or_else(|| js_sys::JSON::stringify(&value).ok().map(String::from))
            .ok_or_else(|| Error::Script("result is not convertible to a string".into()))
    }
}
