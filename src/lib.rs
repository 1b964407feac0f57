//! Exam seating: conflict-free grouping of examinees, room allocation under
//! capacity and categorical limits, and seat placement within each room.

pub mod allocation;
pub mod config;
pub mod data;
pub mod error;
pub mod grouping;
pub mod placement;
pub mod server;
pub mod solver;

pub use error::{Result, SeatingError};
pub use solver::solve;
