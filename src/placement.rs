use crate::data::{
    GridOverflow, RoomAssignment, RoomConfig, Seat, SeatingLayout, Student, StudentId, Year,
};
use crate::error::{Result, SeatingError};
use log::{debug, info, warn};
use std::collections::{HashMap, VecDeque};

/// Seats per room plus any rooms whose grid was too small.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    pub layout: SeatingLayout,
    pub warnings: Vec<GridOverflow>,
}

/// Round-robin merge of per-year queues. Queues are visited in order of
/// each year's first appearance in `ids`.
pub fn interleave_by_year<'s>(
    ids: &'s [StudentId],
    year_of: impl Fn(&str) -> Option<Year>,
) -> Result<Vec<&'s StudentId>> {
    let mut queues: Vec<(Year, VecDeque<&StudentId>)> = Vec::new();
    for id in ids {
        let year = year_of(id.as_str())
            .ok_or_else(|| SeatingError::InvalidRoster(format!("no roster entry for {}", id)))?;
        match queues.iter_mut().find(|(y, _)| *y == year) {
            Some((_, queue)) => queue.push_back(id),
            None => queues.push((year, VecDeque::from([id]))),
        }
    }

    let mut order = Vec::with_capacity(ids.len());
    while order.len() < ids.len() {
        for (_, queue) in queues.iter_mut() {
            if let Some(id) = queue.pop_front() {
                order.push(id);
            }
        }
    }
    Ok(order)
}

/// Lays out every non-empty room row by row on its seat grid.
pub fn place(
    assignment: &RoomAssignment,
    rooms: &[RoomConfig],
    students: &[Student],
) -> Result<Placement> {
    let years: HashMap<&str, Year> = students.iter().map(|s| (s.id.as_str(), s.year)).collect();
    let configs: HashMap<&str, &RoomConfig> =
        rooms.iter().map(|r| (r.room_id.as_str(), r)).collect();

    let mut placement = Placement::default();
    for (room_id, ids) in assignment {
        if ids.is_empty() {
            continue;
        }
        let room = configs
            .get(room_id.as_str())
            .ok_or_else(|| SeatingError::UnknownRoom(room_id.clone()))?;
        if room.layout_columns == 0 || room.layout_rows == 0 {
            return Err(SeatingError::InvalidLayout {
                room: room_id.clone(),
                columns: room.layout_columns,
                rows: room.layout_rows,
            });
        }

        let order = interleave_by_year(ids, |id| years.get(id).copied())?;
        let grid = room.grid_size();
        if order.len() > grid {
            let overflow = GridOverflow {
                room_id: room_id.clone(),
                assigned: order.len(),
                seats: grid,
            };
            warn!("{}", overflow);
            placement.warnings.push(overflow);
        }

        let columns = room.layout_columns;
        let seats: Vec<Seat> = order
            .into_iter()
            .take(grid)
            .zip(0u32..)
            .map(|(id, idx)| Seat {
                student_id: id.clone(),
                x: idx % columns,
                y: idx / columns,
                seat_no: idx + 1,
            })
            .collect();
        debug!(
            "{}: {} seats on a {}x{} grid",
            room_id,
            seats.len(),
            room.layout_columns,
            room.layout_rows
        );
        placement.layout.insert(room_id.clone(), seats);
    }

    info!("Placed seats in {} rooms", placement.layout.len());
    Ok(placement)
}
