//! Target source and context error types.

use thiserror::Error;

/// Errors raised while wiring target sources into their owning context.
#[derive(Debug, Error)]
pub enum TargetError {
    /// The pool could not be created while attaching. Fatal for startup.
    #[error("could not create instance pool for target source '{name}'")]
    Initialization {
        /// The target source being attached.
        name: String,
        /// What the pool reported.
        #[source]
        source: loaner_core::Error,
    },

    /// The target source was attached before.
    #[error("target source '{name}' is already attached")]
    AlreadyAttached {
        /// The target source.
        name: String,
    },

    /// A component with the same name is already registered.
    #[error("component '{name}' is already registered")]
    DuplicateComponent {
        /// The duplicated name.
        name: String,
    },

    /// `start` was called on a context that already started.
    #[error("context '{name}' has already been started")]
    AlreadyStarted {
        /// The context.
        name: String,
    },

    /// A component failed while the context shut down.
    #[error("component '{name}' failed to shut down")]
    Shutdown {
        /// The component.
        name: String,
        /// What the component reported.
        #[source]
        source: loaner_core::Error,
    },

    /// A pooling error surfaced outside attach or shutdown.
    #[error(transparent)]
    Pool(#[from] loaner_core::Error),
}

/// Errors returned by a pooled invocation.
#[derive(Debug, Error)]
pub enum InvokeError<E> {
    /// Borrowing or returning the target failed.
    #[error("pooling failed: {0}")]
    Pool(#[source] loaner_core::Error),

    /// The invoked operation failed. Its target was returned first.
    #[error("invocation failed: {0}")]
    Operation(#[source] E),
}

impl<E> InvokeError<E> {
    /// Returns the operation's own error, if that is what failed.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            Self::Pool(_) => None,
        }
    }

    /// Returns the pooling error, if that is what failed.
    pub fn pool_error(&self) -> Option<&loaner_core::Error> {
        match self {
            Self::Pool(e) => Some(e),
            Self::Operation(_) => None,
        }
    }
}
