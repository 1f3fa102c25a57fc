//! Application orchestration: state, store jobs and input handling.

pub mod event;
pub mod form;
pub mod handler;
pub mod settings;
pub mod state;
pub mod store_runtime;
