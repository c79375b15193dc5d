//! Provider library exercised through `yt_load_component`.
//!
//! Exports `YoloSharp.YoloTask` from a component named `IntptrMax.YoloSharp`
//! with a constructor and `ImagePredict` only, so the tests can see both a
//! successful call and a missing method through a dynamically loaded type.

use yolo_task_bridge::reflect::{Component, MethodSignature, TypeInfo, Value, ValueType};

/// Version reported by the exported component
pub const VERSION: &str = "fixture-1";

/// Detections returned by every prediction
pub const DETECTIONS: usize = 5;

struct FixtureTask {
    classes: i32,
}

fn yolo_task() -> TypeInfo {
    TypeInfo::new("YoloSharp.YoloTask")
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
            |args| {
                Ok(Some(FixtureTask {
                    classes: args.get(1)?,
                }))
            },
        )
        .method(
            MethodSignature::new(
                "ImagePredict",
                vec![ValueType::Str, ValueType::F32, ValueType::F32],
            ),
            |task: &mut FixtureTask, args| {
                let path: String = args.get(0)?;
                if path.is_empty() {
                    anyhow::bail!("image path is empty");
                }
                Ok(Value::List(vec![Value::I32(task.classes); DETECTIONS]))
            },
        )
}

fn build() -> Component {
    Component::new("IntptrMax.YoloSharp")
        .with_version(VERSION)
        .with_type(yolo_task())
}

yolo_task_bridge::declare_component!(build);
