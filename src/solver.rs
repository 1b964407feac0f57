use crate::allocation::assign;
use crate::config::SolverConfig;
use crate::data::{
    RoomConfig, RosterRow, SeatRecord, SeatingInput, SeatingLayout, SeatingOutput, Student,
};
use crate::error::{Result, SeatingError};
use crate::grouping::group;
use crate::placement::place;
use itertools::Itertools;
use log::{info, warn};
use std::collections::HashMap;
use std::time::Instant;

/// Runs the full pipeline: conflict grouping, room allocation, seat placement.
/// All-or-nothing; no partial plan is returned on error.
pub fn solve(input: &SeatingInput, config: &SolverConfig) -> Result<SeatingOutput> {
    let start_time = Instant::now();
    validate_roster(&input.roster)?;
    validate_rooms(&input.rooms)?;

    info!(
        "Seating {} students across {} rooms...",
        input.roster.len(),
        input.rooms.len()
    );
    let students: Vec<Student> = input.roster.iter().map(Student::from).collect();

    let groups = group(&input.roster);
    let allocation = assign(&groups, &students, &input.rooms, config)?;
    for (room, ids) in &allocation.assignment {
        info!("  {}: {} students assigned", room, ids.len());
    }

    let placement = place(&allocation.assignment, &input.rooms, &students)?;
    if !placement.warnings.is_empty() {
        warn!(
            "{} rooms overflowed their seat grid; check layout_columns/layout_rows",
            placement.warnings.len()
        );
    }

    let records = seat_records(&placement.layout, &input.roster);
    info!(
        "Seating plan found in {:.2?} using {}",
        start_time.elapsed(),
        allocation.phase
    );

    Ok(SeatingOutput {
        layout: placement.layout,
        records,
        warnings: placement.warnings,
        group_count: groups.len(),
        phase: allocation.phase,
    })
}

fn validate_roster(roster: &[RosterRow]) -> Result<()> {
    let duplicates: Vec<&str> = roster
        .iter()
        .map(|r| r.student_id.as_str())
        .duplicates()
        .collect();
    if !duplicates.is_empty() {
        return Err(SeatingError::InvalidRoster(format!(
            "duplicate StudentID: {}",
            duplicates.join(", ")
        )));
    }
    Ok(())
}

fn validate_rooms(rooms: &[RoomConfig]) -> Result<()> {
    let duplicates: Vec<&str> = rooms
        .iter()
        .map(|r| r.room_id.as_str())
        .duplicates()
        .collect();
    if !duplicates.is_empty() {
        return Err(SeatingError::InvalidRoomConfig(format!(
            "duplicate room: {}",
            duplicates.join(", ")
        )));
    }
    Ok(())
}

/// Joins placed seats back with roster details in export column order.
pub fn seat_records(layout: &SeatingLayout, roster: &[RosterRow]) -> Vec<SeatRecord> {
    let rows: HashMap<&str, &RosterRow> =
        roster.iter().map(|r| (r.student_id.as_str(), r)).collect();

    layout
        .iter()
        .flat_map(|(room, seats)| seats.iter().map(move |seat| (room, seat)))
        .filter_map(|(room, seat)| {
            let row = rows.get(seat.student_id.as_str())?;
            Some(SeatRecord {
                student_id: seat.student_id.clone(),
                name: row.display_name(),
                department: row.department.clone(),
                branch: row.branch.clone(),
                year: row.year,
                subject: row.subject.clone(),
                exam_date: row.exam_date.clone(),
                exam_time: row.exam_time.clone(),
                room: room.clone(),
                seat_x: seat.x,
                seat_y: seat.y,
                seat_no: seat.seat_no,
            })
        })
        .collect()
}
