//! Proxies with attachable capabilities.
//!
//! A [`Proxy`] pairs a primary dispatch target with any number of extra
//! capability values, looked up by type. This is how callers holding only
//! the proxy can reach the pool statistics of a pooled target without
//! being handed the pool.

use crate::{InvokeError, PooledInvocationTarget, PoolingConfigMixin};
use loaner_core::TargetPool;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// A dispatch target plus type-keyed capabilities.
pub struct Proxy<S> {
    target: S,
    capabilities: HashMap<TypeId, (&'static str, Box<dyn Any + Send + Sync>)>,
}

impl<S> Proxy<S> {
    /// Creates a proxy with no capabilities.
    pub fn new(target: S) -> Self {
        Self {
            target,
            capabilities: HashMap::new(),
        }
    }

    /// Attaches a capability, replacing any earlier one of the same type.
    #[must_use]
    pub fn with_capability<C: Any + Send + Sync>(mut self, capability: C) -> Self {
        self.capabilities.insert(
            TypeId::of::<C>(),
            (std::any::type_name::<C>(), Box::new(capability)),
        );
        self
    }

    /// Looks up a capability by type.
    pub fn capability<C: Any>(&self) -> Option<&C> {
        self.capabilities
            .get(&TypeId::of::<C>())
            .and_then(|(_, capability)| capability.downcast_ref::<C>())
    }

    /// Returns true if a capability of type `C` is attached.
    pub fn has_capability<C: Any>(&self) -> bool {
        self.capabilities.contains_key(&TypeId::of::<C>())
    }

    /// Returns the type names of the attached capabilities.
    pub fn capability_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.capabilities.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names
    }

    /// Returns the primary dispatch target.
    pub fn target(&self) -> &S {
        &self.target
    }
}

impl<P: TargetPool + 'static> Proxy<Arc<PooledInvocationTarget<P>>> {
    /// Creates a proxy over a pooled target with its statistics attached.
    pub fn pooled(target: Arc<PooledInvocationTarget<P>>) -> Self {
        let mixin = target.pooling_config_mixin();
        Self::new(target).with_capability(mixin)
    }

    /// Dispatches one invocation through the pooled target.
    pub fn invoke<R, E, F>(&self, op: F) -> Result<R, InvokeError<E>>
    where
        F: FnOnce(&mut P::Target) -> Result<R, E>,
    {
        self.target.invoke(op)
    }

    /// Returns the attached statistics capability.
    pub fn pooling_config(&self) -> Option<&PoolingConfigMixin> {
        self.capability::<PoolingConfigMixin>()
    }
}
