//! Task lifecycle: the single live task, its last prediction and the last
//! error message.

pub mod controller;
pub mod results;

pub use controller::{CreateParams, TaskController, TrainParams};
pub use results::{count_items, count_result};
