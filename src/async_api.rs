//! Async-friendly wrappers around the blocking render/measure calls.
//!
//! Each call runs on its own thread (the sandbox is created on, and never
//! leaves, that thread) and reports back over a oneshot channel, so async
//! callers never block their executor. Script evaluation has no cancellation
//! hook: [`measure_with_deadline`] stops waiting when the deadline passes but
//! the thread runs to completion in the background.

use std::thread;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::oneshot;

use crate::{Dimensions, Error, LatexRenderer, Result};

fn spawn_job<T, F>(job: F) -> oneshot::Receiver<Result<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    thread::spawn(move || {
        // Receiver may be gone after a deadline; nothing to report then.
        let _ = tx.send(job());
    });
    rx
}

// A job thread that dies without answering (it panicked) is a failed conversion.
async fn wait<T>(rx: oneshot::Receiver<Result<T>>) -> Result<T> {
    rx.await
        .map_err(|e| Error::Conversion(format!("render thread exited without a result: {}", e)))?
}

/// Render `latex` off the async executor.
pub async fn render(renderer: &LatexRenderer, latex: &str) -> Result<String> {
    let r = renderer.clone();
    let latex = latex.to_string();
    wait(spawn_job(move || r.render(&latex))).await
}

/// Measure `latex` off the async executor.
pub async fn measure(renderer: &LatexRenderer, latex: &str) -> Result<Dimensions> {
    let r = renderer.clone();
    let latex = latex.to_string();
    wait(spawn_job(move || r.measure(&latex))).await
}

/// Measure many labels concurrently, one thread each. Results keep the input
/// order; one failure does not affect the others.
pub async fn measure_all<I, S>(renderer: &LatexRenderer, labels: I) -> Vec<Result<Dimensions>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let jobs = labels.into_iter().map(|label| {
        let r = renderer.clone();
        let latex: String = label.into();
        wait(spawn_job(move || r.measure(&latex)))
    });
    join_all(jobs).await
}

/// Measure `latex`, giving up with [`Error::Timeout`] after `deadline`.
///
/// The timeout is the caller's limit, not a LaTeX failure, so it does not
/// carry the [`crate::LATEX_FAILURE`] marker. Every other error does.
pub async fn measure_with_deadline(
    renderer: &LatexRenderer,
    latex: &str,
    deadline: Duration,
) -> Result<Dimensions> {
    match tokio::time::timeout(deadline, measure(renderer, latex)).await {
        Ok(res) => res,
        Err(_) => {
            log::warn!("latex measurement exceeded {}ms: {}", deadline.as_millis(), latex);
            Err(Error::Timeout(deadline.as_millis() as u64))
        }
    }
}
