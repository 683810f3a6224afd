//! Game rules that do not depend on a running level.

pub mod geometry;
pub mod rules;
pub mod tile;
