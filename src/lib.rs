//! Pushbox: box-pushing puzzle core.
//!
//! - [`sim::level`] parses level text into a [`sim::world::Board`]
//! - [`sim::step::PuzzleEngine`] resolves moves, pushes and wins
//! - [`sim::progress::ProgressionLedger`] keeps the best result per level
//! - [`sim::session::Session`] ties them together for a front end
//! - [`net`] submits results and fetches the leaderboard
//!
//! The terminal front end lives in the `pushbox` binary.

pub mod config;
pub mod domain;
pub mod net;
pub mod sim;
