//! d2latex
//!
//! Renders LaTeX math to SVG and measures how many pixels the result takes up,
//! so a diagram layout engine can reserve space for math labels.
//!
//! Typesetting is done by MathJax running inside a sandboxed JavaScript
//! interpreter. Each call:
//!
//! 1. doubles the backslashes in the input so it survives a template literal,
//! 2. creates a fresh sandbox and loads the polyfills, the MathJax bundle and
//!    a setup script into it,
//! 3. calls `html.convert(...)` and serializes the result with the adaptor,
//! 4. for [`measure`], reads the root `<svg>` width/height (in ex) and
//!    converts them to pixels.
//!
//! # Features
//!
//! - **boa** (default): in-process sandboxes on `boa_engine`, plus a
//!   `d2latex --worker` child-process backend
//! - **bundled-mathjax**: compile `assets/mathjax.js` into the binary
//! - **host-js**: on wasm32, evaluate in the host JavaScript engine
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use d2latex::{LatexConfig, LatexRenderer, ScriptBundle};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bundle = ScriptBundle::from_typesetter_file("mathjax.js".as_ref())?;
//! let renderer = LatexRenderer::new(LatexConfig::default(), Arc::new(bundle));
//! let svg = renderer.render(r"e^{i\pi}+1=0")?;
//! let dims = renderer.measure(r"e^{i\pi}+1=0")?;
//! println!("{}x{} px, {} bytes of svg", dims.width, dims.height, svg.len());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::OnceLock;

pub mod error;
pub use error::{BootstrapStage, Error, Result, LATEX_FAILURE};

pub mod escape;
pub use escape::escape_backslashes;

pub mod bundle;
pub use bundle::ScriptBundle;

pub mod sandbox;
pub use sandbox::{new_sandbox, Interpreter, Sandbox, ScriptLimits};

pub mod bootstrap;
pub mod convert;
pub use convert::LatexRenderer;

pub mod measure;
pub use measure::{extract_dimensions, Dimensions};

pub mod pool;
pub use pool::{PooledSandbox, SandboxPool};

// Async facade over the blocking API
pub mod async_api;

/// Pixels per ex unit used unless a config overrides it.
pub const PX_PER_EX: u32 = 8;

/// Configuration injected into a [`LatexRenderer`]
///
/// Values are fixed for the renderer's lifetime. The defaults match what the
/// diagram renderer expects: 8px per ex (em = 16px), in-process Boa
/// sandboxes, no script limits.
///
/// # Examples
///
/// ```
/// let cfg = d2latex::LatexConfig::default();
/// assert_eq!(cfg.px_per_ex, 8);
/// assert!(!cfg.use_process_worker);
/// ```
#[derive(Debug, Clone)]
pub struct LatexConfig {
    /// Pixels per ex; the em size handed to MathJax is twice this
    pub px_per_ex: u32,
    /// Run each sandbox in a `--worker` child process instead of in-process
    pub use_process_worker: bool,
    /// Program spawned for process workers (defaults to the current executable)
    pub worker_program: Option<PathBuf>,
    /// Maximum loop iterations before Boa throws an error (0 => disabled)
    pub script_loop_iteration_limit: u64,
    /// Maximum recursion depth before Boa throws (usize::MAX => Boa's default)
    pub script_recursion_limit: usize,
    /// MathJax bundle to load when it is not compiled in
    pub typesetter_path: Option<PathBuf>,
    /// Idle sandboxes kept by [`LatexRenderer::pool`]
    pub pool_size: usize,
}

impl Default for LatexConfig {
    fn default() -> Self {
        Self {
            px_per_ex: PX_PER_EX,
            use_process_worker: false,
            worker_program: None,
            script_loop_iteration_limit: 0,
            script_recursion_limit: usize::MAX,
            typesetter_path: None,
            pool_size: num_cpus::get(),
        }
    }
}

impl LatexConfig {
    /// Defaults, with `D2LATEX_MATHJAX_JS` (bundle path) and
    /// `D2LATEX_PROCESS_WORKER` (`1`/`true`) applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(path) = std::env::var_os("D2LATEX_MATHJAX_JS").filter(|p| !p.is_empty()) {
            cfg.typesetter_path = Some(PathBuf::from(path));
        }
        if let Ok(v) = std::env::var("D2LATEX_PROCESS_WORKER") {
            cfg.use_process_worker =
                matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        cfg
    }
}

fn default_renderer() -> Result<&'static LatexRenderer> {
    static RENDERER: OnceLock<std::result::Result<LatexRenderer, String>> = OnceLock::new();
    RENDERER
        .get_or_init(|| LatexRenderer::from_env().map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| Error::Config(e.clone()))
}

/// Render `latex` to an SVG document with the process-wide default renderer.
pub fn render(latex: &str) -> Result<String> {
    default_renderer()?.render(latex)
}

/// Pixel size of `latex` once rendered, with the process-wide default renderer.
pub fn measure(latex: &str) -> Result<Dimensions> {
    default_renderer()?.measure(latex)
}
