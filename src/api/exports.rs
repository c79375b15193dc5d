//! C-ABI entry points.
//!
//! Every mutating entry returns a status code (see [`Status`]) and leaves a
//! message in the error slot, readable with `yt_get_last_error`. Nothing
//! unwinds across the boundary: each body runs under `catch_unwind` inside
//! [`TaskController::execute`].
//!
//! Lock order is controller, then registry.

use std::os::raw::{c_char, c_float, c_int};

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::config;
use crate::error::{BridgeError, Operation, Status};
use crate::marshal;
use crate::reflect::registry;
use crate::task::{CreateParams, TaskController, TrainParams};

/// Environment variable holding the `env_logger` filter
pub const LOG_ENV: &str = "YT_LOG";

lazy_static! {
    /// The process-wide task, result and error slots
    static ref CONTROLLER: Mutex<TaskController> =
        Mutex::new(TaskController::from_config(config::get()));
}

fn run<F>(op: Operation, body: F) -> c_int
where
    F: FnOnce(&mut TaskController) -> crate::error::BridgeResult<()>,
{
    CONTROLLER.lock().execute(op, body).code()
}

/// Create the task, discarding any previous task, result and error.
///
/// Returns 0, 1 (type unresolved), 2 (constructor yielded nothing) or 99.
#[no_mangle]
pub extern "C" fn yt_create_task(
    task_kind: c_int,
    class_count: c_int,
    model_kind: c_int,
    device_kind: c_int,
    size_kind: c_int,
    dtype: c_int,
    keypoint_shape: c_int,
) -> c_int {
    let params = CreateParams {
        task_kind,
        class_count,
        model_kind,
        device_kind,
        size_kind,
        dtype,
        keypoint_shape,
    };
    run(Operation::CreateTask, |controller| {
        let registry = registry::global().read();
        controller.create(&registry, &params)
    })
}

/// Load weights into the task.
///
/// `skip_mismatched_layers` is a C `bool` byte; any non-zero value is true.
///
/// # Safety
///
/// `model_path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn yt_load_model(
    model_path: *const c_char,
    skip_mismatched_layers: u8,
) -> c_int {
    run(Operation::LoadModel, |controller| {
        let path = marshal::string_from_ptr(model_path);
        controller.load_model(&path, skip_mismatched_layers != 0)
    })
}

/// Train the task; blocks until training finishes.
///
/// # Safety
///
/// Each path must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn yt_train(
    root_path: *const c_char,
    train_data_path: *const c_char,
    val_data_path: *const c_char,
    output_path: *const c_char,
    image_size: c_int,
    batch_size: c_int,
    epochs: c_int,
    image_process_kind: c_int,
) -> c_int {
    run(Operation::Train, |controller| {
        let params = TrainParams {
            root_path: marshal::string_from_ptr(root_path),
            train_data_path: marshal::string_from_ptr(train_data_path),
            val_data_path: marshal::string_from_ptr(val_data_path),
            output_path: marshal::string_from_ptr(output_path),
            image_size,
            batch_size,
            epochs,
            image_process_kind,
        };
        controller.train(&params)
    })
}

/// Predict on one image; the result replaces the stored result set.
///
/// # Safety
///
/// `image_path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn yt_predict_image(
    image_path: *const c_char,
    predict_threshold: c_float,
    iou_threshold: c_float,
) -> c_int {
    run(Operation::PredictImage, |controller| {
        let path = marshal::string_from_ptr(image_path);
        controller.predict_image(&path, predict_threshold, iou_threshold)
    })
}

/// Copy of the last error message; empty if the last operation succeeded.
///
/// The caller owns the buffer and must release it with [`yt_free_string`].
#[no_mangle]
pub extern "C" fn yt_get_last_error() -> *mut c_char {
    let controller = CONTROLLER.lock();
    marshal::string_into_raw(controller.last_error())
}

/// Number of items in the last prediction, 0 if there is none
#[no_mangle]
pub extern "C" fn yt_get_last_result_count() -> c_int {
    let count = CONTROLLER.lock().result_count();
    c_int::try_from(count).unwrap_or(c_int::MAX)
}

/// Release a buffer returned by `yt_get_last_error`. Null is a no-op.
///
/// # Safety
///
/// `ptr` must come from this library and not have been freed already.
#[no_mangle]
pub unsafe extern "C" fn yt_free_string(ptr: *mut c_char) {
    marshal::free_string(ptr);
}

/// Load a provider library by name or path and register its component.
///
/// Returns 0, 1 if the library or its entry symbol cannot be loaded, or 99.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn yt_load_component(name: *const c_char) -> c_int {
    run(Operation::LoadComponent, |_| {
        let name = marshal::string_from_ptr(name);
        let component = registry::global()
            .write()
            .load_library(&name)
            .map_err(|source| BridgeError::ComponentLoad {
                op: Operation::LoadComponent,
                source,
            })?;
        log::info!(
            "component '{}' available with {} type(s)",
            component.name(),
            component.types().len()
        );
        Ok(())
    })
}

/// Install `env_logger`, filtered by `YT_LOG` (default `warn`).
///
/// Returns 0, or 1 if a logger was already installed.
#[no_mangle]
pub extern "C" fn yt_init_logging() -> c_int {
    let env = env_logger::Env::new().filter_or(LOG_ENV, "warn");
    match env_logger::Builder::from_env(env).try_init() {
        Ok(()) => Status::Ok.code(),
        Err(_) => 1,
    }
}

/// Static version string; must not be freed
#[no_mangle]
pub extern "C" fn yt_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
