//! A level in play and the playthrough around it.

pub mod event;
pub mod level;
pub mod progress;
pub mod save;
pub mod session;
pub mod step;
pub mod world;
