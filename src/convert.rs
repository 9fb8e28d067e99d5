//! LaTeX to SVG conversion.

use std::sync::Arc;

use crate::bootstrap::bootstrap;
use crate::escape::escape_backslashes;
use crate::sandbox::{self, Sandbox};
use crate::{Error, LatexConfig, Result, ScriptBundle};

/// Build the script expression that converts already-escaped LaTeX and
/// serializes the result through the adaptor.
pub fn conversion_expression(escaped: &str, px_per_ex: u32) -> String {
    format!(
        "adaptor.innerHTML(html.convert(`{}`, {{\n      em: {},\n      ex: {},\n    }}))",
        escaped,
        px_per_ex * 2,
        px_per_ex
    )
}

/// Renders and measures LaTeX with a fixed configuration and script bundle.
///
/// Every call creates, bootstraps and drops its own sandbox; nothing is
/// carried between calls. A renderer is cheap to clone and safe to share
/// between threads.
#[derive(Debug, Clone)]
pub struct LatexRenderer {
    config: LatexConfig,
    bundle: Arc<ScriptBundle>,
}

impl LatexRenderer {
    pub fn new(config: LatexConfig, bundle: Arc<ScriptBundle>) -> Self {
        Self { config, bundle }
    }

    /// Renderer configured from the environment (see [`LatexConfig::from_env`]).
    pub fn from_env() -> Result<Self> {
        let config = LatexConfig::from_env();
        let bundle = if config.typesetter_path.is_some() {
            Arc::new(ScriptBundle::resolve(&config)?)
        } else {
            ScriptBundle::default_bundle()?
        };
        Ok(Self::new(config, bundle))
    }

    pub fn config(&self) -> &LatexConfig {
        &self.config
    }

    pub fn bundle(&self) -> &Arc<ScriptBundle> {
        &self.bundle
    }

    pub fn px_per_ex(&self) -> u32 {
        self.config.px_per_ex
    }

    /// Render `latex` to an SVG document in a fresh sandbox.
    pub fn render(&self, latex: &str) -> Result<String> {
        let sandbox = sandbox::new_sandbox(&self.config)?;
        self.render_in(sandbox, latex)
    }

    /// Render `latex` in the given, not yet bootstrapped, sandbox. The sandbox
    /// is consumed.
    pub fn render_in<S: Sandbox>(&self, mut sandbox: S, latex: &str) -> Result<String> {
        log::debug!("rendering latex: {}", latex);
        let escaped = escape_backslashes(latex);
        log::trace!("escaped latex: {}", escaped);

        bootstrap(&mut sandbox, &self.bundle)?;
        let svg = self.convert_escaped(&mut sandbox, &escaped)?;
        log::trace!("rendered svg: {}", svg);
        Ok(svg)
    }

    /// Run the conversion call in an already bootstrapped sandbox.
    pub(crate) fn convert_escaped<S: Sandbox + ?Sized>(
        &self,
        sandbox: &mut S,
        escaped: &str,
    ) -> Result<String> {
        let expr = conversion_expression(escaped, self.config.px_per_ex);
        sandbox.eval_string(&expr).map_err(|e| match e {
            Error::Script(msg) => Error::Conversion(msg),
            other => Error::Conversion(other.to_string()),
        })
    }
}
