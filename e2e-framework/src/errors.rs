pub use anyhow::{
    anyhow,
    bail,
    ensure,
};
pub use paste::paste;
pub use thiserror::Error;

pub type EmptyResult = anyhow::Result<()>;

// This macro creates a public enum which derives from thiserror::Error, and also creates
// crate-private constructor functions in snake case for each of the enum variants, so that call
// sites can write `FrameworkError::not_found("ns/name")` and get back an anyhow::Error
#[macro_export]
macro_rules! err_impl {
    (@hidden $errtype:ident, $item:ident, String) => {
        paste! {
            pub(crate) fn [<$item:snake>](in_: &str) -> anyhow::Error {
                anyhow!{$errtype::$item(in_.into())}
            }
        }
    };

    (@hidden $errtype:ident, $item:ident, $($dtype:tt)::+) => {
        paste! {
            pub(crate) fn [<$item:snake>](in_: &$($dtype)::+) -> anyhow::Error {
                anyhow!{$errtype::$item(in_.clone())}
            }
        }
    };

    ($errtype:ident,
        $(#[$errinfo:meta] $item:ident($($dtype:tt)::+),)+
    ) => {
        #[derive(Debug, Error)]
        pub enum $errtype {
            $(#[$errinfo] $item($($dtype)::+)),+
        }

        impl $errtype {
            $(err_impl! {@hidden $errtype, $item, $($dtype)::+})+
        }
    };
}

pub use err_impl;

err_impl! {FrameworkError,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("pod {0} not found")]
    NotFound(String),

    #[error("pod {0} already exists")]
    AlreadyExists(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("pod {0} was deleted while waiting for it")]
    PodDeleted(String),

    #[error("watch closed before pod {0} started")]
    WatchClosed(String),
}

// Helpers for callers that only hold an anyhow::Error and want to know which bucket it falls into
// without writing the downcast themselves
impl FrameworkError {
    pub fn is_invalid_argument(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<FrameworkError>(), Some(FrameworkError::InvalidArgument(_)))
    }

    pub fn is_not_found(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<FrameworkError>(), Some(FrameworkError::NotFound(_)))
    }

    pub fn is_already_exists(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<FrameworkError>(), Some(FrameworkError::AlreadyExists(_)))
    }

    pub fn is_timeout(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<FrameworkError>(), Some(FrameworkError::Timeout(_)))
    }
}

pub(crate) fn validate_pod_key(name: &str, namespace: &str) -> EmptyResult {
    if name.is_empty() {
        bail!(FrameworkError::invalid_argument("pod name must not be empty"));
    }
    if namespace.is_empty() {
        bail!(FrameworkError::invalid_argument("pod namespace must not be empty"));
    }
    Ok(())
}
