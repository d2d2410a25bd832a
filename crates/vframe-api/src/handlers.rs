//! Request handlers.

pub mod files;
pub mod health;
pub mod videos;

pub use files::*;
pub use health::*;
pub use videos::*;
