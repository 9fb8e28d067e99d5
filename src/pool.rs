//! Opt-in pool of pre-bootstrapped sandboxes.
//!
//! The default render path pays the full bootstrap cost on every call. When
//! throughput matters, a [`SandboxPool`] keeps bootstrapped sandboxes around
//! and hands them out through a scoped [`PooledSandbox`] guard that returns
//! the sandbox when dropped. Returned sandboxes are reset by re-running the
//! setup script, so no typesetting state crosses from one label to the next.
//! A sandbox whose conversion or reset failed is discarded instead.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

use crate::bootstrap::bootstrap;
use crate::escape::escape_backslashes;
use crate::measure::{extract_dimensions, Dimensions};
use crate::sandbox::{self, Sandbox};
use crate::{LatexRenderer, Result, ScriptBundle};

type Factory<S> = Box<dyn Fn() -> Result<S> + Send + Sync>;

pub struct SandboxPool<S: Sandbox> {
    bundle: Arc<ScriptBundle>,
    factory: Factory<S>,
    idle: Mutex<Vec<S>>,
    capacity: usize,
}

impl<S: Sandbox> SandboxPool<S> {
    /// `factory` creates raw sandboxes; the pool bootstraps them with `bundle`.
    /// At most `capacity` idle sandboxes are kept.
    pub fn new<F>(bundle: Arc<ScriptBundle>, capacity: usize, factory: F) -> Self
    where
        F: Fn() -> Result<S> + Send + Sync + 'static,
    {
        Self {
            bundle,
            factory: Box::new(factory),
            idle: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Take an idle sandbox or bootstrap a new one.
    pub fn checkout(&self) -> Result<PooledSandbox<'_, S>> {
        let reused = self.idle.lock().ok().and_then(|mut idle| idle.pop());
        let sandbox = match reused {
            Some(sb) => sb,
            None => {
                let mut sb = (self.factory)()?;
                bootstrap(&mut sb, &self.bundle)?;
                sb
            }
        };
        Ok(PooledSandbox {
            pool: self,
            sandbox: Some(sandbox),
            discard: false,
        })
    }

    /// Number of bootstrapped sandboxes currently waiting to be reused.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // Re-run the setup script so the next user gets a fresh typesetting
    // document; TeX macro definitions live on the document's input jax.
    fn give_back(&self, mut sandbox: S) {
        if self.idle_count() >= self.capacity {
            return;
        }
        if let Err(e) = sandbox.run(self.bundle.setup()) {
            log::debug!("dropping pooled sandbox that failed to reset: {}", e);
            return;
        }
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.capacity {
                idle.push(sandbox);
            }
        }
    }
}

/// Exclusive use of one pooled sandbox for the guard's lifetime.
pub struct PooledSandbox<'a, S: Sandbox> {
    pool: &'a SandboxPool<S>,
    sandbox: Option<S>,
    discard: bool,
}

impl<S: Sandbox> PooledSandbox<'_, S> {
    /// Drop the sandbox instead of returning it to the pool.
    pub fn discard(&mut self) {
        self.discard = true;
    }
}

impl<S: Sandbox> Deref for PooledSandbox<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.sandbox.as_ref().expect("pooled sandbox present until drop")
    }
}

impl<S: Sandbox> DerefMut for PooledSandbox<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.sandbox.as_mut().expect("pooled sandbox present until drop")
    }
}

impl<S: Sandbox> Drop for PooledSandbox<'_, S> {
    fn drop(&mut self) {
        if let Some(sb) = self.sandbox.take() {
            if !self.discard {
                self.pool.give_back(sb);
            }
        }
    }
}

impl LatexRenderer {
    /// Pool of sandboxes built with this renderer's config and bundle, sized
    /// by `pool_size`.
    pub fn pool(&self) -> SandboxPool<Box<dyn Sandbox>> {
        let config = self.config().clone();
        SandboxPool::new(self.bundle().clone(), config.pool_size, move || {
            sandbox::new_sandbox(&config)
        })
    }

    /// Like [`LatexRenderer::render`] but on a pooled sandbox.
    pub fn render_pooled<S: Sandbox>(&self, pool: &SandboxPool<S>, latex: &str) -> Result<String> {
        log::debug!("rendering latex (pooled): {}", latex);
        let escaped = escape_backslashes(latex);
        let mut guard = pool.checkout()?;
        let res = self.convert_escaped(&mut *guard, &escaped);
        if res.is_err() {
            guard.discard();
        }
        res
    }

    pub fn measure_pooled<S: Sandbox>(
        &self,
        pool: &SandboxPool<S>,
        latex: &str,
    ) -> Result<Dimensions> {
        let svg = self.render_pooled(pool, latex)?;
        extract_dimensions(&svg, self.px_per_ex())
    }
}
