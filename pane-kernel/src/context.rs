//! Rendering-context boundary.
//!
//! Each thread-owning window gets one context, created on its actor
//! thread and used only there. Child windows render through their team
//! leader's context, addressed by surface id.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pane_api::{Geometry, InstanceId};

/// A per-actor rendering context. Not `Send`: it never leaves the thread
/// that created it.
pub trait RenderContext {
    /// Bind `surface` for the callbacks that follow.
    fn make_current(&mut self, surface: InstanceId) -> anyhow::Result<()>;

    fn resize(&mut self, surface: InstanceId, width: i32, height: i32) -> anyhow::Result<()>;

    /// Present the frame drawn into `surface`.
    fn swap_buffers(&mut self, surface: InstanceId) -> anyhow::Result<()>;

    /// Called once during actor teardown.
    fn release(&mut self) {}
}

/// Creates rendering contexts for new thread-owning windows.
pub trait ContextFactory: Send + Sync {
    /// Runs on the new actor thread before it reports ready. An error
    /// fails the window creation.
    fn create(
        &self,
        window: InstanceId,
        name: &str,
        geometry: Geometry,
    ) -> anyhow::Result<Box<dyn RenderContext>>;
}

#[derive(Debug, Default)]
struct HeadlessCounters {
    created: AtomicU64,
    released: AtomicU64,
    presented: AtomicU64,
    resized: AtomicU64,
}

/// Context factory that renders nowhere and counts what it was asked to do.
#[derive(Debug, Clone, Default)]
pub struct HeadlessContextFactory {
    counters: Arc<HeadlessCounters>,
}

impl HeadlessContextFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contexts_created(&self) -> u64 {
        self.counters.created.load(Ordering::Relaxed)
    }

    pub fn contexts_released(&self) -> u64 {
        self.counters.released.load(Ordering::Relaxed)
    }

    /// Total `swap_buffers` calls across every context.
    pub fn frames_presented(&self) -> u64 {
        self.counters.presented.load(Ordering::Relaxed)
    }

    pub fn resizes(&self) -> u64 {
        self.counters.resized.load(Ordering::Relaxed)
    }
}

impl ContextFactory for HeadlessContextFactory {
    fn create(
        &self,
        window: InstanceId,
        name: &str,
        _geometry: Geometry,
    ) -> anyhow::Result<Box<dyn RenderContext>> {
        tracing::trace!(%window, name, "creating headless context");
        self.counters.created.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(HeadlessContext {
            counters: self.counters.clone(),
            current: None,
        }))
    }
}

/// Context produced by [`HeadlessContextFactory`].
#[derive(Debug)]
pub struct HeadlessContext {
    counters: Arc<HeadlessCounters>,
    current: Option<InstanceId>,
}

impl HeadlessContext {
    pub fn current_surface(&self) -> Option<InstanceId> {
        self.current
    }
}

impl RenderContext for HeadlessContext {
    fn make_current(&mut self, surface: InstanceId) -> anyhow::Result<()> {
        self.current = Some(surface);
        Ok(())
    }

    fn resize(&mut self, _surface: InstanceId, width: i32, height: i32) -> anyhow::Result<()> {
        anyhow::ensure!(width >= 0 && height >= 0, "negative size {width}x{height}");
        self.counters.resized.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn swap_buffers(&mut self, surface: InstanceId) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.current == Some(surface),
            "surface {surface} is not current"
        );
        self.counters.presented.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn release(&mut self) {
        self.current = None;
        self.counters.released.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_counts() {
        let factory = HeadlessContextFactory::new();
        let surface = InstanceId(7);
        let mut context = factory
            .create(surface, "test", Geometry::new(0, 0, 10, 10))
            .unwrap();

        context.make_current(surface).unwrap();
        context.resize(surface, 20, 20).unwrap();
        context.swap_buffers(surface).unwrap();
        context.swap_buffers(surface).unwrap();
        context.release();

        assert_eq!(factory.contexts_created(), 1);
        assert_eq!(factory.frames_presented(), 2);
        assert_eq!(factory.resizes(), 1);
        assert_eq!(factory.contexts_released(), 1);
    }

    #[test]
    fn test_swap_requires_current_surface() {
        let factory = HeadlessContextFactory::new();
        let mut context = factory
            .create(InstanceId(1), "test", Geometry::default())
            .unwrap();

        assert!(context.swap_buffers(InstanceId(1)).is_err());
        context.make_current(InstanceId(2)).unwrap();
        assert!(context.swap_buffers(InstanceId(1)).is_err());
        assert_eq!(factory.frames_presented(), 0);
    }
}
