//! The exported C surface

pub mod exports;

pub use exports::{
    yt_create_task, yt_free_string, yt_get_last_error, yt_get_last_result_count,
    yt_init_logging, yt_load_component, yt_load_model, yt_predict_image, yt_train, yt_version,
    LOG_ENV,
};
