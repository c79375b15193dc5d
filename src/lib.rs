//! yolo-task-bridge - C boundary for a runtime-resolved YOLO task
//!
//! Native callers create a detection task, load weights, train and predict
//! through a handful of `extern "C"` functions. The task type itself is never
//! linked in: it is found by name among the components loaded at runtime and
//! driven through a small reflection layer, so renamed namespaces or new
//! overloads in the provider do not break the boundary.
//!
//! # Features
//!
//! - **Late binding**: candidate type names with a short-name fallback scan
//! - **Provider libraries**: loaded with `libloading` from configured search paths
//! - **Single-slot reporting**: status codes plus one last-error string
//! - **No unwinding across the boundary**: panics become status 99
//!
//! # Example
//!
//! ```ignore
//! use yolo_task_bridge::reflect::{register_component, Component};
//!
//! register_component(Component::new("IntptrMax.YoloSharp").with_type(yolo_task_type()));
//!
//! assert_eq!(yolo_task_bridge::yt_create_task(0, 80, 0, 0, 0, 0, 0), 0);
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Native caller  │  C ABI, status codes
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │  api::exports   │  marshaling, catch_unwind
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ TaskController  │  task / result / error slots
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │    reflect      │  resolve type, construct, invoke
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │    Provider     │  in-process or dynamic library
//! └─────────────────┘
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod error;
pub mod marshal;
pub mod reflect;
pub mod task;

// Re-export commonly used types
pub use api::{
    yt_create_task, yt_free_string, yt_get_last_error, yt_get_last_result_count,
    yt_init_logging, yt_load_component, yt_load_model, yt_predict_image, yt_train, yt_version,
};
pub use config::{BridgeConfig, ConfigError, MethodConfig, PluginConfig, ResolverConfig};
pub use error::{BridgeError, BridgeResult, Operation, Status};
pub use reflect::{
    Component, ComponentRegistry, Instance, MethodSignature, TypeInfo, TypeResolver, Value,
    ValueType,
};
pub use task::{CreateParams, TaskController, TrainParams};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
