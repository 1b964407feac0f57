//! Error types for the seating pipeline.

use crate::data::{GroupId, RoomId};
use thiserror::Error;

/// Result type for seating operations.
pub type Result<T> = std::result::Result<T, SeatingError>;

/// Errors that end a seating run. Grid overflow is not among them; see
/// [`crate::data::GridOverflow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatingError {
    /// Roster rows are malformed or ambiguous
    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    /// Room configuration list is malformed or ambiguous
    #[error("Invalid room configuration: {0}")]
    InvalidRoomConfig(String),

    /// More students than seats across all rooms
    #[error("Not enough room capacity: need {students} seats, have {capacity}")]
    CapacityExceeded { students: usize, capacity: usize },

    /// Neither allocation phase could place every group
    #[error(
        "No valid room assignment possible: group {group} ({size} students) could not be placed by {}",
        phases_tried(.backtracking_attempted)
    )]
    InfeasibleAssignment {
        group: GroupId,
        size: usize,
        backtracking_attempted: bool,
    },

    /// Backtracking stopped before proving or disproving feasibility
    #[error("Backtracking search gave up after exploring {budget} nodes")]
    SearchBudgetExceeded { budget: u64 },

    /// Seat grid has a zero dimension
    #[error("Room {room} has an invalid seat grid of {columns}x{rows}")]
    InvalidLayout { room: RoomId, columns: u32, rows: u32 },

    /// Assignment names a room missing from the configuration list
    #[error("Unknown room: {0}")]
    UnknownRoom(RoomId),
}

fn phases_tried(backtracking_attempted: &bool) -> &'static str {
    if *backtracking_attempted {
        "first-fit decreasing or backtracking search"
    } else {
        "first-fit decreasing"
    }
}

impl SeatingError {
    /// Errors caused by the shape of the request rather than by the search.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SeatingError::InvalidRoster(_)
                | SeatingError::InvalidRoomConfig(_)
                | SeatingError::InvalidLayout { .. }
                | SeatingError::UnknownRoom(_)
        )
    }
}
