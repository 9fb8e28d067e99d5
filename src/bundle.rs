//! Script payloads loaded into every fresh sandbox.

use std::borrow::Cow;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::{Error, LatexConfig, Result};

/// Browser-ish globals the typesetting bundle needs (console, timers, window).
pub const POLYFILLS_JS: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/polyfills.js"));

/// Creates the global `adaptor` and `html` objects used by the conversion call.
pub const SETUP_JS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/setup.js"));

#[cfg(feature = "bundled-mathjax")]
const MATHJAX_JS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/mathjax.js"));

/// The three payloads run, in order, by the engine bootstrap.
///
/// Contents never change after construction; share one bundle between
/// renderers and threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ScriptBundle {
    polyfills: Cow<'static, str>,
    typesetter: Cow<'static, str>,
    setup: Cow<'static, str>,
}

impl ScriptBundle {
    pub fn new(
        polyfills: impl Into<Cow<'static, str>>,
        typesetter: impl Into<Cow<'static, str>>,
        setup: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            polyfills: polyfills.into(),
            typesetter: typesetter.into(),
            setup: setup.into(),
        }
    }

    /// Embedded polyfills and setup around a caller-supplied typesetting bundle.
    pub fn with_typesetter(typesetter: impl Into<Cow<'static, str>>) -> Self {
        Self::new(POLYFILLS_JS, typesetter, SETUP_JS)
    }

    /// Read the typesetting bundle from `path`.
    pub fn from_typesetter_file(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read typesetting bundle {}: {}", path.display(), e))
        })?;
        Ok(Self::with_typesetter(src))
    }

    /// The bundle compiled into the binary.
    #[cfg(feature = "bundled-mathjax")]
    pub fn bundled() -> Self {
        Self::with_typesetter(MATHJAX_JS)
    }

    /// Resolve the bundle for `config`: the compiled-in one when available,
    /// otherwise the file at `config.typesetter_path`.
    pub fn resolve(config: &LatexConfig) -> Result<Self> {
        #[cfg(feature = "bundled-mathjax")]
        {
            if config.typesetter_path.is_none() {
                return Ok(Self::bundled());
            }
        }
        match &config.typesetter_path {
            Some(path) => Self::from_typesetter_file(path),
            None => Err(Error::Config(
                "no typesetting bundle: build with `bundled-mathjax` or set D2LATEX_MATHJAX_JS".into(),
            )),
        }
    }

    /// Process-wide bundle resolved once from [`LatexConfig::from_env`].
    pub fn default_bundle() -> Result<Arc<ScriptBundle>> {
        static DEFAULT: OnceLock<std::result::Result<Arc<ScriptBundle>, String>> = OnceLock::new();
        DEFAULT
            .get_or_init(|| {
                Self::resolve(&LatexConfig::from_env())
                    .map(Arc::new)
                    .map_err(|e| e.to_string())
            })
            .clone()
            .map_err(Error::Config)
    }

    pub fn polyfills(&self) -> &str {
        &self.polyfills
    }

    pub fn typesetter(&self) -> &str {
        &self.typesetter
    }

    pub fn setup(&self) -> &str {
        &self.setup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn embedded_payloads_present() {
        assert!(POLYFILLS_JS.contains("console"));
        assert!(SETUP_JS.contains("adaptor"));
        assert!(SETUP_JS.contains("html"));
    }

    #[test]
    fn with_typesetter_wraps_embedded_payloads() {
        let b = ScriptBundle::with_typesetter("var MathJax = {};");
        assert_eq!(b.polyfills(), POLYFILLS_JS);
        assert_eq!(b.typesetter(), "var MathJax = {};");
        assert_eq!(b.setup(), SETUP_JS);
    }

    #[test]
    fn missing_typesetter_file_is_config_error() {
        let err =
            ScriptBundle::from_typesetter_file(Path::new("/nonexistent/mathjax.js")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[cfg(not(feature = "bundled-mathjax"))]
    #[test]
    fn resolve_without_path_fails() {
        let cfg = LatexConfig {
            typesetter_path: None,
            ..Default::default()
        };
        assert!(matches!(ScriptBundle::resolve(&cfg), Err(Error::Config(_))));
    }

    #[test]
    fn resolve_reads_configured_file() {
        let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", "stub_mathjax.js"]
            .iter()
            .collect();
        let cfg = LatexConfig {
            typesetter_path: Some(path),
            ..Default::default()
        };
        let b = ScriptBundle::resolve(&cfg).expect("fixture bundle");
        assert!(b.typesetter().contains("MathJax"));
    }
}
