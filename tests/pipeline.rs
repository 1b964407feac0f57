use exam_seating::config::SolverConfig;
use exam_seating::data::{AllocationPhase, SeatingInput};
use exam_seating::grouping::group;
use exam_seating::{SeatingError, solve};
use serde_json::json;
use std::collections::{HashMap, HashSet};

fn input(value: serde_json::Value) -> SeatingInput {
    serde_json::from_value(value).unwrap()
}

fn roster_row(id: &str, year: u32, subject: &str, branch: &str, date: &str, time: &str) -> serde_json::Value {
    json!({
        "StudentID": id,
        "Name": format!("Name {}", id),
        "Year": year,
        "Subject": subject,
        "Department": "ENG",
        "Branch": branch,
        "ExamDate": date,
        "ExamTime": time
    })
}

#[test]
fn seating_plan_respects_room_limits() {
    let subjects = ["Maths", "Physics", "Chemistry"];
    let branches = ["CS", "EC", "ME"];
    let times = ["Morning", "Afternoon"];
    let roster: Vec<_> = (0..40)
        .map(|i| {
            roster_row(
                &format!("S{:03}", i),
                2 + (i % 2) as u32,
                subjects[i % subjects.len()],
                branches[(i / 3) % branches.len()],
                "2024-05-01",
                times[i % times.len()],
            )
        })
        .collect();
    let input = input(json!({
        "roster": roster,
        "rooms": [
            { "room_name": "Room-A", "capacity": 30, "max_subjects": 15, "max_branches": 5,
              "allowed_years": "2,3", "layout_columns": 6, "layout_rows": 5 },
            { "room_name": "Room-B", "capacity": 40, "max_subjects": 15, "max_branches": 5,
              "allowed_years": [2, 3], "layout_columns": 8, "layout_rows": 5 }
        ]
    }));

    let output = solve(&input, &SolverConfig::default()).unwrap();
    assert!(output.warnings.is_empty());
    assert_eq!(output.records.len(), 40);

    for room in &input.rooms {
        let Some(seats) = output.layout.get(&room.room_id) else {
            continue;
        };
        assert!(seats.len() <= room.capacity as usize);
        let records: Vec<_> = output.records.iter().filter(|r| r.room == room.room_id).collect();
        assert!(records.iter().all(|r| room.allowed_years.contains(&r.year)));
        let subjects: HashSet<&str> = records.iter().map(|r| r.subject.as_str()).collect();
        let branches: HashSet<&str> = records.iter().map(|r| r.branch.as_str()).collect();
        assert!(subjects.len() <= room.max_subjects as usize);
        assert!(branches.len() <= room.max_branches as usize);

        for (i, seat) in seats.iter().enumerate() {
            let i = i as u32;
            assert_eq!(seat.seat_no, i + 1);
            assert_eq!(seat.x, i % room.layout_columns);
            assert_eq!(seat.y, i / room.layout_columns);
        }
    }
}

#[test]
fn groups_never_share_an_exam_slot() {
    let roster: Vec<_> = (0..30)
        .map(|i| {
            roster_row(
                &format!("S{}", i),
                1,
                "Maths",
                "CS",
                ["d1", "d2"][i % 2],
                ["Morning", "Afternoon", "Evening"][i % 3],
            )
        })
        .collect();
    let input = input(json!({ "roster": roster, "rooms": [] }));
    let slots: HashMap<&str, (&str, &str)> = input
        .roster
        .iter()
        .map(|r| (r.student_id.as_str(), r.slot()))
        .collect();

    let groups = group(&input.roster);
    for members in groups.values() {
        let distinct: HashSet<(&str, &str)> = members.iter().map(|id| slots[id.as_str()]).collect();
        assert_eq!(distinct.len(), members.len());
    }
}

#[test]
fn greedy_dead_end_falls_back_to_backtracking() {
    let input = input(json!({
        "roster": [
            roster_row("a1", 1, "Maths", "CS", "d", "Morning"),
            roster_row("a2", 1, "Maths", "CS", "d", "Afternoon"),
            roster_row("a3", 1, "Maths", "CS", "d", "Evening"),
            roster_row("b1", 2, "Maths", "CS", "d", "Morning"),
            roster_row("b2", 2, "Maths", "CS", "d", "Afternoon"),
            roster_row("b3", 2, "Maths", "CS", "d", "Evening")
        ],
        "rooms": [
            { "room_id": "A", "capacity": 4, "allowed_years": "1,2", "layout_columns": 2, "layout_rows": 2 },
            { "room_id": "B", "capacity": 3, "allowed_years": "1", "layout_columns": 3, "layout_rows": 1 }
        ]
    }));

    let output = solve(&input, &SolverConfig::default()).unwrap();
    assert_eq!(output.phase, AllocationPhase::Backtracking);
    let in_b: Vec<&str> = output.layout["B"].iter().map(|s| s.student_id.as_str()).collect();
    assert_eq!(in_b, vec!["a1", "a2", "a3"]);
}

#[test]
fn infeasible_plan_names_the_failing_group() {
    let input = input(json!({
        "roster": [roster_row("x", 4, "Maths", "CS", "d", "t")],
        "rooms": [{ "room_id": "A", "capacity": 10, "allowed_years": "1,2,3" }]
    }));
    let err = solve(&input, &SolverConfig::default()).unwrap_err();
    assert_eq!(
        err,
        SeatingError::InfeasibleAssignment {
            group: 0,
            size: 1,
            backtracking_attempted: true
        }
    );
}
