//! Database repositories for the tracker service

pub mod screenshot;

pub use screenshot::ScreenshotRepository;
