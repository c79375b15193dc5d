//! Runtime reflection over provider components
//!
//! Lets the boundary construct and drive a task type it is never compiled
//! or linked against.
//!
//! # Architecture
//!
//! ```text
//! C caller
//!       │
//!       ▼
//! yt_* entry point (api::exports)
//!       │
//!       ▼
//! TypeResolver ──► ComponentRegistry ◄── ComponentLoader (libloading)
//!       │                                      ▲
//!       ▼                                      │
//! Instance::construct / invoker::invoke    provider library
//!       │                                  (declare_component!)
//!       ▼
//! provider closures (adapt Value args via FromValue)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let ty = TypeInfo::new("YoloSharp.YoloTask")
//!     .constructor(vec![ValueType::I32], |args| Ok(Some(MyTask::new(args.get(0)?))))
//!     .method(
//!         MethodSignature::new("LoadModel", vec![ValueType::Str, ValueType::Bool]),
//!         |task: &mut MyTask, args| task.load(&args.get::<String>(0)?, args.get(1)?),
//!     );
//! registry::register_component(Component::new("IntptrMax.YoloSharp").with_type(ty));
//! ```

pub mod component;
pub mod invoker;
pub mod loader;
pub mod registry;
pub mod resolver;
pub mod types;

pub use component::{Component, ConstructorInfo, Instance, MethodInfo, TypeInfo};
pub use invoker::{find_method, invoke, InvokeError};
pub use loader::{ComponentLibrary, ComponentLoader, LoadError, COMPONENT_ENTRY_SYMBOL};
pub use registry::{register_component, unregister_component, ComponentRegistry};
pub use resolver::{QualifiedName, ResolveError, TypeResolver, DEFAULT_CANDIDATES};
pub use types::{
    enum_from_value, Args, ConversionError, FromValue, MethodSignature, Opaque, Value, ValueType,
};
