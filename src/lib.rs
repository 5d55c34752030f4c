pub mod animation;
pub mod app;
pub mod canvas;
pub mod config;
pub mod error;
pub mod frame;
pub mod logging;
pub mod onboard;
pub mod render;
pub mod scene;
