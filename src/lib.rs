// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds argument parsing and terminal setup.
pub mod actor;
pub mod app_dirs;
pub mod assets;
pub mod config;
pub mod game;
pub mod matcher;
pub mod runtime;
pub mod scheduler;
pub mod speech;
pub mod ui;
pub mod words;
