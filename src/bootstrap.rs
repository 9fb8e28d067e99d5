//! Loads the script bundle into a fresh sandbox.

use crate::sandbox::Sandbox;
use crate::{BootstrapStage, Error, Result, ScriptBundle};

/// Run the polyfills, the typesetting bundle and the setup script, in that
/// order, in `sandbox`.
///
/// A failure in the polyfills or the setup script is always fatal. A failure
/// while loading the typesetting bundle is ignored only when the sandbox
/// declares [`Sandbox::tolerates_known_bundle_fault`].
pub fn bootstrap<S: Sandbox + ?Sized>(sandbox: &mut S, bundle: &ScriptBundle) -> Result<()> {
    sandbox
        .run(bundle.polyfills())
        .map_err(|e| Error::bootstrap(BootstrapStage::Polyfills, e))?;

    if let Err(e) = sandbox.run(bundle.typesetter()) {
        if !sandbox.tolerates_known_bundle_fault() {
            return Err(Error::bootstrap(BootstrapStage::Typesetter, e));
        }
        log::warn!(
            "ignoring known typesetting bundle fault on {:?} interpreter: {}",
            sandbox.interpreter(),
            e
        );
    }

    sandbox
        .run(bundle.setup())
        .map_err(|e| Error::bootstrap(BootstrapStage::Setup, e))?;

    Ok(())
}

#[cfg(all(test, feature = "boa"))]
mod tests {
    use super::*;
    use crate::sandbox::boa::BoaSandbox;
    use crate::sandbox::{Interpreter, ScriptLimits};

    // Boa with the host's tolerance, to exercise the lenient path.
    struct Lenient(BoaSandbox);

    impl Sandbox for Lenient {
        fn interpreter(&self) -> Interpreter {
            Interpreter::Host
        }
        fn tolerates_known_bundle_fault(&self) -> bool {
            true
        }
        fn run(&mut self, source: &str) -> Result<()> {
            self.0.run(source)
        }
        fn eval_string(&mut self, expr: &str) -> Result<String> {
            self.0.eval_string(expr)
        }
    }

    fn strict() -> BoaSandbox {
        BoaSandbox::new(ScriptLimits::default()).unwrap()
    }

    fn lenient() -> Lenient {
        Lenient(strict())
    }

    const OK: &str = "var loaded = (typeof loaded === 'number' ? loaded : 0) + 1;";
    const FAIL: &str = "throw new Error('boom');";

    fn stage_of(r: Result<()>) -> BootstrapStage {
        match r {
            Err(Error::EngineBootstrap { stage, .. }) => stage,
            Err(e) => panic!("unexpected error: {}", e),
            Ok(()) => panic!("bootstrap should fail"),
        }
    }

    #[test]
    fn runs_all_three_in_order() {
        let bundle =
            ScriptBundle::new("var order = ['p'];", "order.push('t');", "order.push('s');");
        let mut sb = strict();
        bootstrap(&mut sb, &bundle).unwrap();
        assert_eq!(sb.eval_string("order.join(',')").unwrap(), "p,t,s");
    }

    #[test]
    fn polyfill_failure_is_always_fatal() {
        let bundle = ScriptBundle::new(FAIL, OK, OK);
        assert_eq!(stage_of(bootstrap(&mut strict(), &bundle)), BootstrapStage::Polyfills);
        assert_eq!(stage_of(bootstrap(&mut lenient(), &bundle)), BootstrapStage::Polyfills);
    }

    #[test]
    fn setup_failure_is_always_fatal() {
        let bundle = ScriptBundle::new(OK, OK, FAIL);
        assert_eq!(stage_of(bootstrap(&mut strict(), &bundle)), BootstrapStage::Setup);
        assert_eq!(stage_of(bootstrap(&mut lenient(), &bundle)), BootstrapStage::Setup);
    }

    #[test]
    fn typesetter_failure_is_fatal_on_strict_interpreter() {
        let bundle = ScriptBundle::new(OK, FAIL, OK);
        assert_eq!(stage_of(bootstrap(&mut strict(), &bundle)), BootstrapStage::Typesetter);
    }

    #[test]
    fn typesetter_failure_is_tolerated_when_declared() {
        let bundle = ScriptBundle::new(OK, "var partial = 1; throw new Error('mathjax#3289');", OK);
        let mut sb = lenient();
        bootstrap(&mut sb, &bundle).expect("tolerated");
        // Setup still ran after the tolerated fault.
        assert_eq!(sb.eval_string("loaded").unwrap(), "2");
        assert_eq!(sb.eval_string("partial").unwrap(), "1");
    }
}
