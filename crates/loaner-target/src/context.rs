//! Owning context lifecycle.
//!
//! A [`TargetContext`] attaches its components once at startup, in
//! registration order, and destroys them once at shutdown, in reverse.
//! A component that fails to attach aborts startup: everything attached
//! before it is destroyed again and the error is returned.

use crate::{PooledInvocationTarget, TargetError};
use loaner_core::TargetPool;
use parking_lot::Mutex;
use std::sync::Arc;

/// A component driven by the owning context.
pub trait Lifecycle: Send + Sync {
    /// Called once when the context starts.
    fn attach(&self) -> Result<(), TargetError>;

    /// Called once when the context shuts down.
    fn destroy(&self) -> loaner_core::Result<()>;
}

impl<P> Lifecycle for PooledInvocationTarget<P>
where
    P: TargetPool + 'static,
{
    fn attach(&self) -> Result<(), TargetError> {
        PooledInvocationTarget::attach(self)
    }

    fn destroy(&self) -> loaner_core::Result<()> {
        PooledInvocationTarget::destroy(self)
    }
}

impl<L: Lifecycle + ?Sized> Lifecycle for Arc<L> {
    fn attach(&self) -> Result<(), TargetError> {
        (**self).attach()
    }

    fn destroy(&self) -> loaner_core::Result<()> {
        (**self).destroy()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Running,
    Closed,
}

/// Owns lifecycle components and drives their startup and shutdown.
pub struct TargetContext {
    name: String,
    components: Vec<(String, Arc<dyn Lifecycle>)>,
    phase: Mutex<Phase>,
}

impl TargetContext {
    /// Creates an empty context.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
            phase: Mutex::new(Phase::Created),
        }
    }

    /// Returns the context name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a component under a unique name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        component: Arc<dyn Lifecycle>,
    ) -> Result<(), TargetError> {
        let name = name.into();
        if self.components.iter().any(|(existing, _)| *existing == name) {
            return Err(TargetError::DuplicateComponent { name });
        }
        self.components.push((name, component));
        Ok(())
    }

    /// Returns the number of registered components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if no component is registered.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns true between a successful `start` and `shutdown`.
    pub fn is_running(&self) -> bool {
        *self.phase.lock() == Phase::Running
    }

    /// Attaches every component in registration order.
    pub fn start(&self) -> Result<(), TargetError> {
        let mut phase = self.phase.lock();
        if *phase != Phase::Created {
            return Err(TargetError::AlreadyStarted {
                name: self.name.clone(),
            });
        }

        for (index, (name, component)) in self.components.iter().enumerate() {
            if let Err(e) = component.attach() {
                tracing::error!(context = %self.name, component = %name, error = %e, "context startup aborted");
                self.destroy_in_reverse(&self.components[..index]);
                *phase = Phase::Closed;
                return Err(e);
            }
        }

        *phase = Phase::Running;
        tracing::info!(context = %self.name, components = self.components.len(), "context started");
        Ok(())
    }

    /// Destroys every component in reverse registration order.
    ///
    /// Only the first call after a successful start does anything. Every
    /// component is destroyed even if an earlier one fails; the first
    /// failure is returned.
    pub fn shutdown(&self) -> Result<(), TargetError> {
        let mut phase = self.phase.lock();
        if *phase != Phase::Running {
            *phase = Phase::Closed;
            return Ok(());
        }
        *phase = Phase::Closed;
        drop(phase);

        let result = match self.destroy_in_reverse(&self.components) {
            Some((name, source)) => Err(TargetError::Shutdown { name, source }),
            None => Ok(()),
        };
        tracing::info!(context = %self.name, "context shut down");
        result
    }

    fn destroy_in_reverse(
        &self,
        components: &[(String, Arc<dyn Lifecycle>)],
    ) -> Option<(String, loaner_core::Error)> {
        let mut first_failure = None;
        for (name, component) in components.iter().rev() {
            if let Err(e) = component.destroy() {
                tracing::warn!(context = %self.name, component = %name, error = %e, "component failed to shut down");
                first_failure.get_or_insert((name.clone(), e));
            }
        }
        first_failure
    }
}

impl Drop for TargetContext {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.shutdown() {
                tracing::warn!(context = %self.name, error = %e, "shutdown on drop failed");
            }
        }
    }
}

impl std::fmt::Debug for TargetContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetContext")
            .field("name", &self.name)
            .field(
                "components",
                &self.components.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("phase", &*self.phase.lock())
            .finish()
    }
}
