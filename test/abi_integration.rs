//! Integration Tests for the C Surface
//!
//! Drives the exported `yt_*` functions against the process-wide registry
//! and controller, with the mock provider registered in-process:
//! - ordering and binding status codes
//! - error slot lifecycle
//! - result counting
//! - string marshaling in both directions
//! - loading a provider shared library

mod support;

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::ffi::{CStr, CString};
use std::path::PathBuf;
use std::ptr;

use lazy_static::lazy_static;
use parking_lot::{Mutex, MutexGuard};
use yolo_task_bridge::reflect::{register_component, registry, unregister_component};
use yolo_task_bridge::*;

use support::{Journal, MockOptions, COMPONENT};

lazy_static! {
    /// Boundary state is process-global; tests take turns
    static ref SERIAL: Mutex<()> = Mutex::new(());
}

fn serial() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock();
    // pin the defaults so a stray yolo_bridge.toml cannot change the tests
    let _ = config::install(BridgeConfig::default());
    guard
}

fn install(options: MockOptions) -> Journal {
    let journal = support::journal();
    register_component(support::mock_component(options, journal.clone()));
    journal
}

fn last_error() -> String {
    let raw = yt_get_last_error();
    assert!(!raw.is_null());
    let message = unsafe { CStr::from_ptr(raw) }.to_str().unwrap().to_owned();
    unsafe { yt_free_string(raw) };
    message
}

fn c(s: &str) -> CString {
    CString::new(s).unwrap()
}

fn create_detector() -> i32 {
    yt_create_task(0, 3, 1, 0, 0, 0, 0)
}

fn load(path: &str) -> i32 {
    let path = c(path);
    unsafe { yt_load_model(path.as_ptr(), 0) }
}

fn predict(path: &str) -> i32 {
    let path = c(path);
    unsafe { yt_predict_image(path.as_ptr(), 0.25, 0.7) }
}

fn train(root: &str) -> i32 {
    let root = c(root);
    let train = c("images/train");
    let val = c("images/val");
    let output = c("runs/exp");
    unsafe { yt_train(root.as_ptr(), train.as_ptr(), val.as_ptr(), output.as_ptr(), 640, 16, 3, 0) }
}

/// Fail a create so the controller is back to having no task
fn reset_to_uninitialized() {
    unregister_component(COMPONENT);
    assert_eq!(create_detector(), 1);
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_operations_before_create_return_two() {
    let _guard = serial();
    reset_to_uninitialized();

    assert_eq!(load("weights/yolov8n.pt"), 2);
    assert_eq!(last_error(), "yt_load_model called before yt_create_task");

    assert_eq!(train("datasets/coco8"), 2);
    assert_eq!(last_error(), "yt_train called before yt_create_task");

    assert_eq!(predict("bus.jpg"), 2);
    assert_eq!(last_error(), "yt_predict_image called before yt_create_task");

    assert_eq!(yt_get_last_result_count(), 0);
}

#[test]
fn test_unresolved_type_returns_one() {
    let _guard = serial();
    unregister_component(COMPONENT);

    assert_eq!(create_detector(), 1);
    let message = last_error();
    assert!(message.contains("YoloSharp.YoloTask"), "{}", message);
    assert!(message.contains("IntptrMax.YoloSharp"), "{}", message);
}

#[test]
fn test_constructor_yielding_nothing_returns_two() {
    let _guard = serial();
    install(MockOptions::default());

    assert_eq!(yt_create_task(0, 0, 0, 0, 0, 0, 0), 2);
    assert!(last_error().contains("constructor returned nothing"));
    assert_eq!(load("weights/yolov8n.pt"), 2);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_create_load_train_predict() {
    let _guard = serial();
    let journal = install(MockOptions::default());

    assert_eq!(create_detector(), 0);
    assert_eq!(last_error(), "");
    assert_eq!(load("weights/yolov8n.pt"), 0);
    assert_eq!(train("datasets/coco8"), 0);
    assert_eq!(predict("bus.jpg"), 0);
    assert_eq!(last_error(), "");
    assert_eq!(yt_get_last_result_count(), 3);

    let calls = journal.lock().clone();
    assert_eq!(calls.len(), 4);
    assert!(calls[0].starts_with("new Detection classes=3 V8 Cpu"));
    assert_eq!(calls[1], "load weights/yolov8n.pt skip=false");
    assert_eq!(
        calls[2],
        "train datasets/coco8 images/train images/val runs/exp size=640 batch=16 epochs=3 process=0"
    );
    assert_eq!(calls[3], "predict bus.jpg conf=0.25 iou=0.7");
}

#[test]
fn test_second_create_discards_result_set() {
    let _guard = serial();
    install(MockOptions::default());

    assert_eq!(create_detector(), 0);
    assert_eq!(predict("bus.jpg"), 0);
    assert_eq!(yt_get_last_result_count(), 3);

    assert_eq!(create_detector(), 0);
    assert_eq!(yt_get_last_result_count(), 0);
}

#[test]
fn test_keypoint_shape_reaches_constructor() {
    let _guard = serial();
    let journal = install(MockOptions::default());

    assert_eq!(yt_create_task(3, 1, 1, 0, 0, 0, 17), 0);
    assert_eq!(yt_create_task(0, 1, 1, 0, 0, 0, 0), 0);

    let calls = journal.lock().clone();
    assert!(calls[0].starts_with("new Pose"));
    assert!(calls[0].ends_with("keypoints=Some([17])"));
    assert!(calls[1].ends_with("keypoints=None"));
}

#[test]
fn test_missing_load_method_scenario() {
    let _guard = serial();
    install(MockOptions {
        with_load_model: false,
        ..MockOptions::default()
    });

    assert_eq!(yt_create_task(0, 3, 0, 0, 0, 0, 0), 0);
    assert_eq!(load("missing.pt"), 3);
    assert_eq!(last_error(), "method LoadModel not found on YoloSharp.YoloTask");

    // the task survives a binding failure
    assert_eq!(predict("bus.jpg"), 0);
    assert_eq!(last_error(), "");
}

// ============================================================================
// Faults
// ============================================================================

#[test]
fn test_provider_error_returns_ninety_nine() {
    let _guard = serial();
    install(MockOptions::default());

    assert_eq!(create_detector(), 0);
    assert_eq!(predict("bus.jpg"), 0);
    assert_eq!(load("weights/best.corrupt"), 99);

    let message = last_error();
    assert!(message.starts_with("exception in yt_load_model: "), "{}", message);
    assert!(message.contains("invalid weight file"), "{}", message);
    // a failed load leaves the last prediction alone
    assert_eq!(yt_get_last_result_count(), 3);
}

#[test]
fn test_provider_panic_returns_ninety_nine() {
    let _guard = serial();
    install(MockOptions {
        panic_in_train: true,
        ..MockOptions::default()
    });

    assert_eq!(create_detector(), 0);
    assert_eq!(train("datasets/coco8"), 99);
    let message = last_error();
    assert!(message.starts_with("exception in yt_train: "), "{}", message);
    assert!(message.contains("CUDA error: out of memory"), "{}", message);

    // still usable afterwards
    assert_eq!(predict("bus.jpg"), 0);
}

#[test]
fn test_invalid_enum_is_internal_failure() {
    let _guard = serial();
    install(MockOptions::default());

    assert_eq!(yt_create_task(0, 3, 0, 7, 0, 0, 0), 99);
    let message = last_error();
    assert!(message.contains("7 is not a valid DeviceKind"), "{}", message);
    assert_eq!(load("weights/yolov8n.pt"), 2);
}

#[test]
fn test_failed_predict_clears_result_set() {
    let _guard = serial();
    install(MockOptions::default());
    assert_eq!(create_detector(), 0);
    assert_eq!(predict("bus.jpg"), 0);
    assert_eq!(yt_get_last_result_count(), 3);

    assert_eq!(unsafe { yt_predict_image(ptr::null(), 0.25, 0.7) }, 99);
    assert!(last_error().contains("image path is empty"));
    assert_eq!(yt_get_last_result_count(), 0);
}

// ============================================================================
// Marshaling
// ============================================================================

#[test]
fn test_non_ascii_paths_round_trip() {
    let _guard = serial();
    let journal = install(MockOptions::default());
    assert_eq!(create_detector(), 0);

    let path = "D:/données/画像/ñandú 🚗.jpg";
    let root = "/srv/datasets/道路標識/señales";
    assert_eq!(predict(path), 0);
    assert_eq!(load("/opt/модели/лучший.pt"), 0);
    assert_eq!(train(root), 0);

    let calls = journal.lock().clone();
    assert_eq!(calls[1], format!("predict {} conf=0.25 iou=0.7", path));
    assert_eq!(calls[2], "load /opt/модели/лучший.pt skip=false");
    assert_eq!(
        calls[3],
        format!(
            "train {} images/train images/val runs/exp size=640 batch=16 epochs=3 process=0",
            root
        )
    );
}

#[test]
fn test_null_path_is_empty_string() {
    let _guard = serial();
    let journal = install(MockOptions::default());
    assert_eq!(create_detector(), 0);

    assert_eq!(unsafe { yt_load_model(ptr::null(), 1) }, 0);
    assert_eq!(journal.lock()[1], "load  skip=true");
}

#[test]
fn test_any_nonzero_skip_flag_is_true() {
    let _guard = serial();
    let journal = install(MockOptions::default());
    assert_eq!(create_detector(), 0);

    let path = c("weights/yolov8s.pt");
    assert_eq!(unsafe { yt_load_model(path.as_ptr(), 0xFF) }, 0);
    assert_eq!(unsafe { yt_load_model(path.as_ptr(), 2) }, 0);
    assert_eq!(unsafe { yt_load_model(path.as_ptr(), 0) }, 0);

    let calls = journal.lock().clone();
    assert_eq!(calls[1], "load weights/yolov8s.pt skip=true");
    assert_eq!(calls[2], "load weights/yolov8s.pt skip=true");
    assert_eq!(calls[3], "load weights/yolov8s.pt skip=false");
}

#[test]
fn test_error_buffer_is_fresh_each_call() {
    let _guard = serial();
    reset_to_uninitialized();
    assert_eq!(predict("bus.jpg"), 2);

    let first = yt_get_last_error();
    let second = yt_get_last_error();
    assert_ne!(first, second);
    unsafe {
        assert_eq!(CStr::from_ptr(first), CStr::from_ptr(second));
        yt_free_string(first);
        yt_free_string(second);
        yt_free_string(ptr::null_mut());
    }
}

// ============================================================================
// Components, logging, version
// ============================================================================

#[test]
fn test_load_unknown_component_returns_one() {
    let _guard = serial();
    let name = c("definitely-not-a-yolo-provider");

    assert_eq!(unsafe { yt_load_component(name.as_ptr()) }, 1);
    let message = last_error();
    assert!(message.starts_with("yt_load_component could not load component library"), "{}", message);
    assert!(message.contains("definitely-not-a-yolo-provider"), "{}", message);
}

/// The provider cdylib built next to this test binary as a dev-dependency
fn fixture_library() -> PathBuf {
    let exe = std::env::current_exe().unwrap();
    let deps = exe.parent().unwrap();
    let prefix = format!("{}yt_fixture_provider", DLL_PREFIX);
    std::fs::read_dir(deps)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| name.starts_with(&prefix) && name.ends_with(DLL_SUFFIX))
        })
        .unwrap_or_else(|| panic!("no {}*{} in {}", prefix, DLL_SUFFIX, deps.display()))
}

#[test]
fn test_load_provider_library_and_drive_task() {
    let _guard = serial();
    unregister_component(COMPONENT);
    let library = fixture_library();
    let name = c(library.to_str().unwrap());

    assert_eq!(unsafe { yt_load_component(name.as_ptr()) }, 0);
    assert_eq!(last_error(), "");
    {
        let registry = registry::global().read();
        let component = registry.component(COMPONENT).unwrap();
        assert_eq!(component.version(), Some(yt_fixture_provider::VERSION));
    }

    assert_eq!(create_detector(), 0);
    assert_eq!(predict("bus.jpg"), 0);
    assert_eq!(
        yt_get_last_result_count(),
        yt_fixture_provider::DETECTIONS as i32
    );

    // the dynamically loaded type has no LoadModel
    assert_eq!(load("weights/yolov8n.pt"), 3);
    assert_eq!(last_error(), "method LoadModel not found on YoloSharp.YoloTask");

    // provider faults still surface through the loaded closure
    assert_eq!(unsafe { yt_predict_image(ptr::null(), 0.25, 0.7) }, 99);
    assert!(last_error().contains("image path is empty"));

    // a second load reuses the resident library
    assert_eq!(unsafe { yt_load_component(name.as_ptr()) }, 0);
    assert_eq!(create_detector(), 0);
}

#[test]
fn test_init_logging_once() {
    let first = yt_init_logging();
    assert!(first == 0 || first == 1);
    assert_eq!(yt_init_logging(), 1);
}

#[test]
fn test_version_is_static() {
    let a = yt_version();
    let b = yt_version();
    assert_eq!(a, b);
    let text = unsafe { CStr::from_ptr(a) };
    assert_eq!(text.to_str().unwrap(), VERSION);
}
