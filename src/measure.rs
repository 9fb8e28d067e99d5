//! Pixel size of rendered LaTeX.

use std::sync::OnceLock;

use regex::Regex;

use crate::sandbox::{self, Sandbox};
use crate::{Error, LatexRenderer, Result};

/// Space a rendered expression occupies, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<Dimensions> for (u32, u32) {
    fn from(d: Dimensions) -> Self {
        (d.width, d.height)
    }
}

// Root element of MathJax SVG output, sizes in ex:
// <svg style="vertical-align: -0.05ex;" xmlns="http://www.w3.org/2000/svg" width="8.174ex" height="2.072ex" role="img" ...>
fn svg_size_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<svg[^>]+width="([0-9.]+)ex" height="([0-9.]+)ex"[^>]+>"#)
            .expect("svg size pattern is valid")
    })
}

fn ex_to_px(value: &str, px_per_ex: u32, svg: &str) -> Result<u32> {
    let ex: f64 = value
        .parse()
        .map_err(|_| Error::SvgParse(svg.to_string()))?;
    let px = (ex * f64::from(px_per_ex)).ceil();
    // A size that does not fit in u32 would saturate on the cast.
    if !px.is_finite() || px > f64::from(u32::MAX) {
        return Err(Error::SvgParse(svg.to_string()));
    }
    Ok(px as u32)
}

/// Read the root `<svg>` width/height (in ex) from `svg` and convert them to
/// pixels, rounding up.
///
/// Exactly one matching declaration must be present.
pub fn extract_dimensions(svg: &str, px_per_ex: u32) -> Result<Dimensions> {
    let caps: Vec<_> = svg_size_re().captures_iter(svg).collect();
    if caps.len() != 1 {
        return Err(Error::SvgParse(svg.to_string()));
    }
    let (w, h) = match (caps[0].get(1), caps[0].get(2)) {
        (Some(w), Some(h)) => (w.as_str(), h.as_str()),
        _ => return Err(Error::SvgParse(svg.to_string())),
    };

    Ok(Dimensions {
        width: ex_to_px(w, px_per_ex, svg)?,
        height: ex_to_px(h, px_per_ex, svg)?,
    })
}

impl LatexRenderer {
    /// Render `latex` in a fresh sandbox and measure the result.
    pub fn measure(&self, latex: &str) -> Result<Dimensions> {
        let sandbox = sandbox::new_sandbox(self.config())?;
        self.measure_in(sandbox, latex)
    }

    pub fn measure_in<S: Sandbox>(&self, sandbox: S, latex: &str) -> Result<Dimensions> {
        let svg = self.render_in(sandbox, latex)?;
        let dims = extract_dimensions(&svg, self.px_per_ex())?;
        log::debug!("measured latex {:?}: {}x{}", latex, dims.width, dims.height);
        Ok(dims)
    }
}
