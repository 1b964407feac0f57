use crate::config::SolverConfig;
use crate::data::{
    AllocationPhase, GroupId, Groups, RoomAssignment, RoomConfig, Student, StudentId, Year,
};
use crate::error::{Result, SeatingError};
use itertools::Itertools;
use log::{debug, info, trace, warn};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

/// Room assignment plus the phase that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub assignment: RoomAssignment,
    pub phase: AllocationPhase,
}

/// Categorical footprint of one color class.
#[derive(Debug, Clone)]
struct GroupProfile<'a> {
    id: GroupId,
    members: &'a [StudentId],
    years: BTreeSet<Year>,
    subjects: BTreeSet<&'a str>,
    branches: BTreeSet<&'a str>,
}

impl GroupProfile<'_> {
    fn size(&self) -> usize {
        self.members.len()
    }
}

/// Running state of one room. Snapshots are never mutated once shared;
/// committing a group produces a new snapshot.
#[derive(Debug, Clone)]
struct RoomState<'a> {
    remaining: usize,
    subjects: BTreeSet<&'a str>,
    branches: BTreeSet<&'a str>,
    years: BTreeSet<Year>,
    /// Indices into the sorted group list, in commit order.
    committed: Vec<usize>,
}

impl<'a> RoomState<'a> {
    fn empty(room: &RoomConfig) -> Self {
        Self {
            remaining: room.capacity as usize,
            subjects: BTreeSet::new(),
            branches: BTreeSet::new(),
            years: BTreeSet::new(),
            committed: Vec::new(),
        }
    }

    fn admits(&self, room: &RoomConfig, group: &GroupProfile<'a>) -> bool {
        if group.size() > self.remaining {
            return false;
        }
        if !room.allowed_years.is_superset(&group.years) {
            return false;
        }
        if room.max_subjects > 0
            && self.subjects.union(&group.subjects).count() > room.max_subjects as usize
        {
            return false;
        }
        if room.max_branches > 0
            && self.branches.union(&group.branches).count() > room.max_branches as usize
        {
            return false;
        }
        true
    }

    fn with(&self, index: usize, group: &GroupProfile<'a>) -> Self {
        let mut next = self.clone();
        next.remaining -= group.size();
        next.subjects.extend(group.subjects.iter().copied());
        next.branches.extend(group.branches.iter().copied());
        next.years.extend(group.years.iter().copied());
        next.committed.push(index);
        next
    }
}

struct Allocator<'a> {
    rooms: &'a [RoomConfig],
    /// Largest first, ties by group id.
    groups: Vec<GroupProfile<'a>>,
}

impl<'a> Allocator<'a> {
    fn new(groups: &'a Groups, students: &'a [Student], rooms: &'a [RoomConfig]) -> Result<Self> {
        let lookup: HashMap<&str, &Student> =
            students.iter().map(|s| (s.id.as_str(), s)).collect();

        let mut profiles = Vec::with_capacity(groups.len());
        for (&id, members) in groups {
            let mut profile = GroupProfile {
                id,
                members,
                years: BTreeSet::new(),
                subjects: BTreeSet::new(),
                branches: BTreeSet::new(),
            };
            for sid in members {
                let student: &'a Student = lookup.get(sid.as_str()).copied().ok_or_else(|| {
                    SeatingError::InvalidRoster(format!("group {} names unknown student {}", id, sid))
                })?;
                profile.years.insert(student.year);
                profile.subjects.insert(student.subject.as_str());
                profile.branches.insert(student.branch.as_str());
            }
            debug!(
                "Group {}: {} students | Years: {:?} | Subjects: {} | Branches: {}",
                id,
                profile.size(),
                profile.years,
                profile.subjects.len(),
                profile.branches.len()
            );
            profiles.push(profile);
        }

        let groups = profiles
            .into_iter()
            .sorted_by_key(|g| (Reverse(g.size()), g.id))
            .collect();
        Ok(Self { rooms, groups })
    }

    fn student_count(&self) -> usize {
        self.groups.iter().map(GroupProfile::size).sum()
    }

    fn initial_states(&self) -> Vec<RoomState<'a>> {
        self.rooms.iter().map(RoomState::empty).collect()
    }

    /// Phase 1. On failure returns the index of the first group that found
    /// no room; nothing is kept from the partial run.
    fn first_fit_decreasing(&self) -> std::result::Result<Vec<RoomState<'a>>, usize> {
        let mut states = self.initial_states();

        for (index, group) in self.groups.iter().enumerate() {
            let candidate = (0..self.rooms.len())
                .sorted_by_key(|&r| (Reverse(states[r].remaining), &self.rooms[r].room_id))
                .find(|&r| states[r].admits(&self.rooms[r], group));

            match candidate {
                Some(r) => {
                    states[r] = states[r].with(index, group);
                    trace!(
                        "Placed group {} in {}. Remaining capacity: {}",
                        group.id,
                        self.rooms[r].room_id,
                        states[r].remaining
                    );
                }
                None => return Err(index),
            }
        }
        Ok(states)
    }

    /// Phase 2. Depth-first over rooms in configuration order, at most
    /// `budget` tentative placements.
    fn backtrack(&self, budget: u64) -> Result<Vec<RoomState<'a>>> {
        let mut search = Search {
            allocator: self,
            budget,
            explored: 0,
            deepest: 0,
        };
        let found = search.descend(0, &self.initial_states())?;
        debug!("Backtracking explored {} nodes", search.explored);

        found.ok_or_else(|| {
            let group = &self.groups[search.deepest];
            SeatingError::InfeasibleAssignment {
                group: group.id,
                size: group.size(),
                backtracking_attempted: true,
            }
        })
    }

    fn assignment(&self, states: &[RoomState<'a>]) -> RoomAssignment {
        self.rooms
            .iter()
            .zip(states)
            .filter(|(_, state)| !state.committed.is_empty())
            .map(|(room, state)| {
                let students = state
                    .committed
                    .iter()
                    .flat_map(|&g| self.groups[g].members.iter().cloned())
                    .collect();
                (room.room_id.clone(), students)
            })
            .collect()
    }
}

struct Search<'s, 'a> {
    allocator: &'s Allocator<'a>,
    budget: u64,
    explored: u64,
    /// Deepest group index entered; reported when the search fails.
    deepest: usize,
}

impl<'a> Search<'_, 'a> {
    fn descend(
        &mut self,
        depth: usize,
        states: &[RoomState<'a>],
    ) -> Result<Option<Vec<RoomState<'a>>>> {
        let allocator = self.allocator;
        let Some(group) = allocator.groups.get(depth) else {
            return Ok(Some(states.to_vec()));
        };
        self.deepest = self.deepest.max(depth);

        for (r, room) in allocator.rooms.iter().enumerate() {
            if !states[r].admits(room, group) {
                continue;
            }
            if self.explored >= self.budget {
                return Err(SeatingError::SearchBudgetExceeded {
                    budget: self.budget,
                });
            }
            self.explored += 1;

            let mut next = states.to_vec();
            next[r] = states[r].with(depth, group);
            if let Some(found) = self.descend(depth + 1, &next)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

/// Assigns whole groups to rooms: first-fit decreasing, then exhaustive
/// backtracking if the greedy pass leaves a group unplaced.
pub fn assign(
    groups: &Groups,
    students: &[Student],
    rooms: &[RoomConfig],
    config: &SolverConfig,
) -> Result<Allocation> {
    let allocator = Allocator::new(groups, students, rooms)?;

    let needed = allocator.student_count();
    let capacity: usize = rooms.iter().map(|r| r.capacity as usize).sum();
    info!(
        "Assigning {} groups ({} students) to {} rooms with {} seats",
        allocator.groups.len(),
        needed,
        rooms.len(),
        capacity
    );
    if needed > capacity {
        return Err(SeatingError::CapacityExceeded {
            students: needed,
            capacity,
        });
    }

    info!("Trying first-fit decreasing...");
    let failed = match allocator.first_fit_decreasing() {
        Ok(states) => {
            info!("First-fit decreasing placed every group");
            return Ok(Allocation {
                assignment: allocator.assignment(&states),
                phase: AllocationPhase::FirstFitDecreasing,
            });
        }
        Err(index) => &allocator.groups[index],
    };

    if config.search_budget == 0 {
        warn!(
            "First-fit decreasing could not place group {} ({} students); backtracking is disabled",
            failed.id,
            failed.size()
        );
        return Err(SeatingError::InfeasibleAssignment {
            group: failed.id,
            size: failed.size(),
            backtracking_attempted: false,
        });
    }

    warn!(
        "First-fit decreasing could not place group {} ({} students); trying backtracking",
        failed.id,
        failed.size()
    );
    let states = allocator.backtrack(config.search_budget)?;
    info!("Backtracking placed every group");
    Ok(Allocation {
        assignment: allocator.assignment(&states),
        phase: AllocationPhase::Backtracking,
    })
}
