//! Error taxonomy and the status codes that cross the C boundary.

use std::fmt;

use thiserror::Error;

use crate::reflect::{InvokeError, LoadError, ResolveError};

/// Stable status codes returned by every mutating entry point
#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    Ok = 0,
    /// The task type or a component library could not be bound
    TypeUnresolved = 1,
    /// No task instance: create was never called or construction yielded nothing
    NoInstance = 2,
    /// The resolved type lacks the requested method
    MethodMissing = 3,
    /// Anything else; the error slot carries the diagnostic
    Internal = 99,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// The boundary operations, named after their exported entry points
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Operation {
    CreateTask,
    LoadModel,
    Train,
    PredictImage,
    LoadComponent,
}

impl Operation {
    pub fn entry_point(self) -> &'static str {
        match self {
            Operation::CreateTask => "yt_create_task",
            Operation::LoadModel => "yt_load_model",
            Operation::Train => "yt_train",
            Operation::PredictImage => "yt_predict_image",
            Operation::LoadComponent => "yt_load_component",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry_point())
    }
}

/// Canonical error type for the bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("could not locate the task type ({0}); check that the provider component is loaded")]
    TypeUnresolved(#[source] ResolveError),

    #[error("{op} could not load component library: {source}")]
    ComponentLoad {
        op: Operation,
        #[source]
        source: LoadError,
    },

    #[error("failed to create an instance of {type_name}: the constructor returned nothing")]
    NoInstance { type_name: String },

    #[error("{op} called before yt_create_task")]
    NotCreated { op: Operation },

    #[error("method {method} not found on {type_name}")]
    MethodMissing { method: String, type_name: String },

    #[error("exception in {op}: {source:?}")]
    Fault {
        op: Operation,
        source: anyhow::Error,
    },
}

/// Result alias used throughout the crate
pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    pub fn status(&self) -> Status {
        match self {
            BridgeError::TypeUnresolved(_) | BridgeError::ComponentLoad { .. } => {
                Status::TypeUnresolved
            }
            BridgeError::NoInstance { .. } | BridgeError::NotCreated { .. } => Status::NoInstance,
            BridgeError::MethodMissing { .. } => Status::MethodMissing,
            BridgeError::Fault { .. } => Status::Internal,
        }
    }

    pub fn fault(op: Operation, source: impl Into<anyhow::Error>) -> Self {
        BridgeError::Fault {
            op,
            source: source.into(),
        }
    }

    /// Map an invocation failure raised while running `op`
    pub fn from_invoke(op: Operation, err: InvokeError) -> Self {
        match err {
            InvokeError::MethodNotFound { method, type_name } => {
                BridgeError::MethodMissing { method, type_name }
            }
            InvokeError::Fault(source) => BridgeError::Fault { op, source },
        }
    }
}
