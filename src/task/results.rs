//! Counting adapter for prediction results.
//!
//! The provider's prediction type is unknown here, so the count is taken
//! from whatever shape the value has: a list length, an object's own count,
//! or a single enumeration.

use std::panic::{self, AssertUnwindSafe};

use crate::reflect::Value;

/// Number of items in a prediction value; 0 for anything uncountable
pub fn count_items(value: &Value) -> usize {
    match value {
        Value::List(items) => items.len(),
        Value::I32Array(items) => items.len(),
        Value::Object(obj) => obj
            .count()
            .or_else(|| obj.items().map(|items| items.count()))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Count the stored result, degrading to 0 if there is none or counting panics
pub fn count_result(result: Option<&Value>) -> usize {
    let Some(value) = result else {
        return 0;
    };
    panic::catch_unwind(AssertUnwindSafe(|| count_items(value))).unwrap_or_else(|_| {
        log::warn!("prediction result panicked while being counted");
        0
    })
}
