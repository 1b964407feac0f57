use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// Type aliases for clarity
pub type StudentId = String;
pub type RoomId = String;
pub type GroupId = usize;
pub type Year = u32;

/// Color classes produced by the conflict grouper, keyed by color index.
pub type Groups = BTreeMap<GroupId, Vec<StudentId>>;
/// Students assigned to each room, in commit order.
pub type RoomAssignment = BTreeMap<RoomId, Vec<StudentId>>;
/// Placed seats for each non-empty room.
pub type SeatingLayout = BTreeMap<RoomId, Vec<Seat>>;

/// One roster row as handed over by the upload/import collaborator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RosterRow {
    #[serde(rename = "StudentID")]
    pub student_id: StudentId,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Year", deserialize_with = "deserialize_year")]
    pub year: Year,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Branch", alias = "Batch", default = "unknown")]
    pub branch: String,
    #[serde(rename = "ExamDate")]
    pub exam_date: String,
    #[serde(rename = "ExamTime")]
    pub exam_time: String,
}

impl RosterRow {
    /// Display name, falling back to a placeholder derived from the id.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Student-{}", self.student_id))
    }

    /// Exam slot used for conflict detection; compared for equality only.
    pub fn slot(&self) -> (&str, &str) {
        (self.exam_date.as_str(), self.exam_time.as_str())
    }
}

fn unknown() -> String {
    "Unknown".to_string()
}

/// The categorical view of a student the allocator and placer work with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Student {
    pub id: StudentId,
    pub year: Year,
    pub subject: String,
    pub department: String,
    pub branch: String,
}

impl From<&RosterRow> for Student {
    fn from(row: &RosterRow) -> Self {
        Self {
            id: row.student_id.clone(),
            year: row.year,
            subject: row.subject.clone(),
            department: row.department.clone(),
            branch: row.branch.clone(),
        }
    }
}

/// Years a room accepts. Accepts `"2,3"` or `[2, "3"]` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllowedYears(pub BTreeSet<Year>);

impl AllowedYears {
    pub fn contains(&self, year: &Year) -> bool {
        self.0.contains(year)
    }

    pub fn is_superset(&self, years: &BTreeSet<Year>) -> bool {
        self.0.is_superset(years)
    }
}

impl FromIterator<Year> for AllowedYears {
    fn from_iter<I: IntoIterator<Item = Year>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearValue {
    Int(Year),
    Text(String),
}

impl YearValue {
    fn into_year<E: serde::de::Error>(self) -> Result<Year, E> {
        match self {
            YearValue::Int(y) => Ok(y),
            YearValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid year `{}`", s))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AllowedYearsRepr {
    Csv(String),
    List(Vec<YearValue>),
}

impl<'de> Deserialize<'de> for AllowedYears {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match AllowedYearsRepr::deserialize(deserializer)? {
            AllowedYearsRepr::Csv(s) => s
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| YearValue::Text(item.to_string()).into_year())
                .collect(),
            AllowedYearsRepr::List(items) => {
                items.into_iter().map(YearValue::into_year).collect()
            }
        }
    }
}

fn deserialize_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Year, D::Error> {
    YearValue::deserialize(deserializer)?.into_year()
}

fn default_columns() -> u32 {
    6
}

fn default_rows() -> u32 {
    5
}

/// Per-room capacity, categorical limits and seat grid.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoomConfig {
    #[serde(alias = "room_name")]
    pub room_id: RoomId,
    pub capacity: u32,
    /// 0 means unlimited.
    #[serde(default)]
    pub max_subjects: u32,
    /// 0 means unlimited.
    #[serde(default)]
    pub max_branches: u32,
    #[serde(default)]
    pub allowed_years: AllowedYears,
    #[serde(default = "default_columns")]
    pub layout_columns: u32,
    #[serde(default = "default_rows")]
    pub layout_rows: u32,
}

impl RoomConfig {
    pub fn grid_size(&self) -> usize {
        self.layout_columns as usize * self.layout_rows as usize
    }
}

/// A single placed seat. `x`/`y` are zero-based grid coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Seat {
    pub student_id: StudentId,
    pub x: u32,
    pub y: u32,
    pub seat_no: u32,
}

/// Flattened seat row in the column shape the CSV/HTML exporters expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatRecord {
    #[serde(rename = "StudentID")]
    pub student_id: StudentId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Branch")]
    pub branch: String,
    #[serde(rename = "Year")]
    pub year: Year,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "ExamDate")]
    pub exam_date: String,
    #[serde(rename = "ExamTime")]
    pub exam_time: String,
    #[serde(rename = "Room")]
    pub room: RoomId,
    #[serde(rename = "Seat_X")]
    pub seat_x: u32,
    #[serde(rename = "Seat_Y")]
    pub seat_y: u32,
    #[serde(rename = "Seat_No")]
    pub seat_no: u32,
}

/// Non-fatal: a room received more students than its grid holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridOverflow {
    pub room_id: RoomId,
    pub assigned: usize,
    pub seats: usize,
}

impl fmt::Display for GridOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Grid Overflow] room {} has {} students but only {} seats; {} left unseated",
            self.room_id,
            self.assigned,
            self.seats,
            self.assigned.saturating_sub(self.seats)
        )
    }
}

/// Which allocation phase produced the room assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AllocationPhase {
    FirstFitDecreasing,
    Backtracking,
}

impl fmt::Display for AllocationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationPhase::FirstFitDecreasing => write!(f, "first-fit decreasing"),
            AllocationPhase::Backtracking => write!(f, "backtracking"),
        }
    }
}

/// The complete input for one seating-plan request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingInput {
    pub roster: Vec<RosterRow>,
    pub rooms: Vec<RoomConfig>,
}

/// The final output of the solver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingOutput {
    pub layout: SeatingLayout,
    pub records: Vec<SeatRecord>,
    pub warnings: Vec<GridOverflow>,
    pub group_count: usize,
    pub phase: AllocationPhase,
}
