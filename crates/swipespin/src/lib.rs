pub mod carousel;
pub mod config;
pub mod embed;
pub mod events;
#[cfg(feature = "gui")]
pub mod gui;
pub mod sys;
pub mod typewriter;
