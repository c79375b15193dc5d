//! Task Lifecycle Controller
//!
//! Owns the single task instance, the last prediction result and the last
//! error message, and sequences create → load/train/predict against them.
//!
//! ```text
//! Uninitialized ──create ok──► Created ──load/train/predict──► Created
//!       ▲                         │
//!       └──────create failed──────┘
//! ```

use std::panic::{self, AssertUnwindSafe};

use crate::config::{BridgeConfig, MethodConfig};
use crate::error::{BridgeError, BridgeResult, Operation, Status};
use crate::reflect::component::panic_error;
use crate::reflect::{invoke, ComponentRegistry, Instance, TypeResolver, Value};

use super::results::count_result;

/// The seven constructor arguments of the task type.
///
/// Every kind is an integer enum whose meaning belongs to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateParams {
    pub task_kind: i32,
    pub class_count: i32,
    pub model_kind: i32,
    pub device_kind: i32,
    pub size_kind: i32,
    pub dtype: i32,
    /// Keypoint count; `<= 0` means the task has no keypoints
    pub keypoint_shape: i32,
}

impl CreateParams {
    /// Positional constructor arguments
    pub fn constructor_args(&self) -> Vec<Value> {
        let keypoints = if self.keypoint_shape > 0 {
            Value::I32Array(vec![self.keypoint_shape])
        } else {
            Value::Null
        };
        vec![
            Value::I32(self.task_kind),
            Value::I32(self.class_count),
            Value::I32(self.model_kind),
            Value::I32(self.device_kind),
            Value::I32(self.size_kind),
            Value::I32(self.dtype),
            keypoints,
        ]
    }
}

/// Arguments of a training run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainParams {
    pub root_path: String,
    pub train_data_path: String,
    pub val_data_path: String,
    pub output_path: String,
    pub image_size: i32,
    pub batch_size: i32,
    pub epochs: i32,
    pub image_process_kind: i32,
}

impl TrainParams {
    fn args(&self) -> Vec<Value> {
        vec![
            Value::Str(self.root_path.clone()),
            Value::Str(self.train_data_path.clone()),
            Value::Str(self.val_data_path.clone()),
            Value::Str(self.output_path.clone()),
            Value::I32(self.image_size),
            Value::I32(self.batch_size),
            Value::I32(self.epochs),
            Value::I32(self.image_process_kind),
        ]
    }
}

/// Single-task lifecycle state
pub struct TaskController {
    resolver: TypeResolver,
    methods: MethodConfig,
    task: Option<Instance>,
    last_result: Option<Value>,
    last_error: String,
}

impl TaskController {
    pub fn new(resolver: TypeResolver, methods: MethodConfig) -> Self {
        Self {
            resolver,
            methods,
            task: None,
            last_result: None,
            last_error: String::new(),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            TypeResolver::new(&config.resolver.candidates),
            config.methods.clone(),
        )
    }

    pub fn is_created(&self) -> bool {
        self.task.is_some()
    }

    pub fn task(&self) -> Option<&Instance> {
        self.task.as_ref()
    }

    pub fn last_result(&self) -> Option<&Value> {
        self.last_result.as_ref()
    }

    /// Message of the last failed operation; empty after a success
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    /// Item count of the last prediction, 0 if there is none
    pub fn result_count(&self) -> usize {
        count_result(self.last_result.as_ref())
    }

    /// Resolve the task type and construct a fresh instance, discarding the
    /// previous task and result.
    pub fn create(&mut self, registry: &ComponentRegistry, params: &CreateParams) -> BridgeResult<()> {
        self.task = None;
        self.last_result = None;

        let ty = self
            .resolver
            .resolve(registry)
            .map_err(BridgeError::TypeUnresolved)?;

        let instance = Instance::construct(&ty, &params.constructor_args())
            .map_err(|e| BridgeError::fault(Operation::CreateTask, e))?
            .ok_or_else(|| BridgeError::NoInstance {
                type_name: ty.full_name(),
            })?;

        log::info!(
            "created {} (task={}, classes={}, model={}, device={}, size={}, dtype={}, keypoints={})",
            ty.full_name(),
            params.task_kind,
            params.class_count,
            params.model_kind,
            params.device_kind,
            params.size_kind,
            params.dtype,
            params.keypoint_shape
        );
        self.task = Some(instance);
        Ok(())
    }

    /// Load pre-trained weights into the task
    pub fn load_model(&mut self, path: &str, skip_mismatched_layers: bool) -> BridgeResult<()> {
        let method = self.methods.load_model.clone();
        self.call(
            Operation::LoadModel,
            &method,
            &[Value::from(path), Value::Bool(skip_mismatched_layers)],
        )?;
        Ok(())
    }

    /// Run a training session; blocks until the provider returns
    pub fn train(&mut self, params: &TrainParams) -> BridgeResult<()> {
        let method = self.methods.train.clone();
        self.call(Operation::Train, &method, &params.args())?;
        Ok(())
    }

    /// Predict on one image and keep the result for counting
    pub fn predict_image(
        &mut self,
        path: &str,
        predict_threshold: f32,
        iou_threshold: f32,
    ) -> BridgeResult<()> {
        self.last_result = None;
        let method = self.methods.predict.clone();
        let result = self.call(
            Operation::PredictImage,
            &method,
            &[
                Value::from(path),
                Value::F32(predict_threshold),
                Value::F32(iou_threshold),
            ],
        )?;
        self.last_result = Some(result);
        Ok(())
    }

    fn call(&mut self, op: Operation, method: &str, args: &[Value]) -> BridgeResult<Value> {
        let task = self.task.as_mut().ok_or(BridgeError::NotCreated { op })?;
        invoke(task, method, args).map_err(|e| BridgeError::from_invoke(op, e))
    }

    /// Run `body` for `op`, converting any error or panic into a status and
    /// the stored error message.
    pub fn execute<F>(&mut self, op: Operation, body: F) -> Status
    where
        F: FnOnce(&mut Self) -> BridgeResult<()>,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&mut *self)))
            .unwrap_or_else(|payload| {
                Err(BridgeError::fault(op, panic_error(op.entry_point(), payload)))
            });
        self.record(op, outcome)
    }

    /// Overwrite the error slot from an outcome and apply the failure
    /// policy of `op`.
    pub fn record(&mut self, op: Operation, outcome: BridgeResult<()>) -> Status {
        match outcome {
            Ok(()) => {
                self.last_error.clear();
                Status::Ok
            }
            Err(err) => {
                match op {
                    Operation::CreateTask => {
                        self.task = None;
                        self.last_result = None;
                    }
                    Operation::PredictImage => self.last_result = None,
                    _ => {}
                }

                let status = err.status();
                if status == Status::Internal {
                    log::error!("{} failed: {}", op, err);
                } else {
                    log::warn!("{} failed with status {}: {}", op, status.code(), err);
                }
                self.last_error = err.to_string();
                status
            }
        }
    }
}

impl Default for TaskController {
    fn default() -> Self {
        Self::new(TypeResolver::default(), MethodConfig::default())
    }
}
