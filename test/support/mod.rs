//! Mock YOLO provider shared by the integration tests.
//!
//! Mirrors the shape of the real provider: a `YoloSharp.YoloTask` type with a
//! seven-argument constructor taking provider enums, plus `LoadModel`,
//! `Train` and `ImagePredict`. Every call is written to a journal so tests
//! can check exactly what crossed the boundary.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use yolo_task_bridge::reflect::{
    enum_from_value, Args, Component, ConversionError, FromValue, MethodSignature, Opaque,
    TypeInfo, Value, ValueType,
};

pub const COMPONENT: &str = "IntptrMax.YoloSharp";
pub const TASK_TYPE: &str = "YoloSharp.YoloTask";

/// Calls seen by the mock, in order
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

macro_rules! provider_enum {
    ($name:ident { $($variant:ident = $value:expr),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl TryFrom<i32> for $name {
            type Error = ();

            fn try_from(v: i32) -> Result<Self, ()> {
                match v {
                    $($value => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl FromValue for $name {
            fn from_value(value: &Value) -> Result<Self, ConversionError> {
                enum_from_value(value, stringify!($name))
            }
        }
    };
}

provider_enum!(TaskKind { Detection = 0, Segmentation = 1, Obb = 2, Pose = 3, Classification = 4 });
provider_enum!(ModelKind { V5 = 0, V8 = 1, V11 = 2 });
provider_enum!(DeviceKind { Cpu = 0, Cuda = 1 });
provider_enum!(SizeKind { Nano = 0, Small = 1, Medium = 2, Large = 3, Extra = 4 });
provider_enum!(ScalarKind { Float32 = 0, Float16 = 1 });

/// What the mock exposes
#[derive(Debug, Clone)]
pub struct MockOptions {
    pub with_load_model: bool,
    /// Detections returned per prediction
    pub detections: usize,
    pub panic_in_train: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            with_load_model: true,
            detections: 3,
            panic_in_train: false,
        }
    }
}

#[derive(Debug)]
pub struct YoloTask {
    pub task: TaskKind,
    pub classes: i32,
    pub device: DeviceKind,
    pub keypoints: Option<Vec<i32>>,
    detections: usize,
    panic_in_train: bool,
    journal: Journal,
}

/// Prediction result that can only be enumerated
#[derive(Debug)]
pub struct Detections {
    boxes: Vec<(f32, f32, f32, f32)>,
}

impl Opaque for Detections {
    fn items(&self) -> Option<Box<dyn Iterator<Item = Value> + '_>> {
        Some(Box::new(self.boxes.iter().map(|(x, y, w, h)| {
            Value::List(vec![
                Value::F32(*x),
                Value::F32(*y),
                Value::F32(*w),
                Value::F32(*h),
            ])
        })))
    }
}

fn construct(options: &MockOptions, journal: &Journal, args: &Args<'_>) -> anyhow::Result<Option<YoloTask>> {
    let task: TaskKind = args.get(0)?;
    let classes: i32 = args.get(1)?;
    let model: ModelKind = args.get(2)?;
    let device: DeviceKind = args.get(3)?;
    let size: SizeKind = args.get(4)?;
    let dtype: ScalarKind = args.get(5)?;
    let keypoints: Option<Vec<i32>> = args.get(6)?;

    journal.lock().push(format!(
        "new {:?} classes={} {:?} {:?} {:?} {:?} keypoints={:?}",
        task, classes, model, device, size, dtype, keypoints
    ));

    if classes <= 0 {
        return Ok(None);
    }
    Ok(Some(YoloTask {
        task,
        classes,
        device,
        keypoints,
        detections: options.detections,
        panic_in_train: options.panic_in_train,
        journal: Arc::clone(journal),
    }))
}

/// The `YoloSharp.YoloTask` descriptor
pub fn yolo_task_type(options: MockOptions, journal: Journal) -> TypeInfo {
    yolo_task_type_named(TASK_TYPE, options, journal)
}

pub fn yolo_task_type_named(full_name: &str, options: MockOptions, journal: Journal) -> TypeInfo {
    let ctor_options = options.clone();
    let ctor_journal = Arc::clone(&journal);

    let ty = TypeInfo::new(full_name)
        .constructor(
            vec![
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32Array,
            ],
            move |args| construct(&ctor_options, &ctor_journal, args),
        )
        .method(
            MethodSignature::new(
                "Train",
                vec![
                    ValueType::Str,
                    ValueType::Str,
                    ValueType::Str,
                    ValueType::Str,
                    ValueType::I32,
                    ValueType::I32,
                    ValueType::I32,
                    ValueType::I32,
                ],
            ),
            |task: &mut YoloTask, args| {
                if task.panic_in_train {
                    panic!("CUDA error: out of memory");
                }
                let root: String = args.get(0)?;
                let train: String = args.get(1)?;
                let val: String = args.get(2)?;
                let output: String = args.get(3)?;
                let image_size: i32 = args.get(4)?;
                let batch_size: i32 = args.get(5)?;
                let epochs: i32 = args.get(6)?;
                let process: i32 = args.get(7)?;
                task.journal.lock().push(format!(
                    "train {} {} {} {} size={} batch={} epochs={} process={}",
                    root, train, val, output, image_size, batch_size, epochs, process
                ));
                Ok(Value::Null)
            },
        )
        .method(
            MethodSignature::new(
                "ImagePredict",
                vec![ValueType::Str, ValueType::F32, ValueType::F32],
            ),
            |task: &mut YoloTask, args| {
                let path: String = args.get(0)?;
                let threshold: f32 = args.get(1)?;
                let iou: f32 = args.get(2)?;
                if path.is_empty() {
                    anyhow::bail!("image path is empty");
                }
                task.journal
                    .lock()
                    .push(format!("predict {} conf={} iou={}", path, threshold, iou));
                let boxes = (0..task.detections)
                    .map(|i| (i as f32 * 10.0, 0.0, 32.0, 32.0))
                    .collect();
                Ok(Value::object(Detections { boxes }))
            },
        );

    if !options.with_load_model {
        return ty;
    }
    ty.method(
        MethodSignature::new("LoadModel", vec![ValueType::Str, ValueType::Bool]),
        |task: &mut YoloTask, args| {
            let path: String = args.get(0)?;
            let skip: bool = args.get(1)?;
            if path.ends_with(".corrupt") {
                anyhow::bail!("invalid weight file: {}", path);
            }
            task.journal
                .lock()
                .push(format!("load {} skip={}", path, skip));
            Ok(Value::Null)
        },
    )
}

/// The mock provider component
pub fn mock_component(options: MockOptions, journal: Journal) -> Component {
    Component::new(COMPONENT)
        .with_version("1.0.0-mock")
        .with_type(yolo_task_type(options, journal))
}
