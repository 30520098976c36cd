// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod evaluator;
pub mod history;
pub mod medal;
pub mod puzzle;
pub mod round;
pub mod runtime;
pub mod shuffle;
pub mod store;
pub mod timer;
pub mod util;
