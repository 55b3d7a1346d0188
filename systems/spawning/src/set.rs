//! Set coordinator: decides which groups of a set can start and when the set
//! is done spawning.

use std::time::Duration;

use wave_defence_core::SpawnSet;

use crate::registry::{SpawnPointError, SpawnPointRegistry};

/// Launch plan for every group of one set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SetPlan {
    /// Groups whose first unit is released immediately.
    pub(crate) startable: Vec<usize>,
    /// Groups skipped because their spawn point does not resolve.
    pub(crate) unresolved: Vec<(usize, SpawnPointError)>,
    /// Time after which the set counts as done spawning.
    pub(crate) spawn_duration: Duration,
}

/// Splits the set's groups into startable and unresolved ones.
///
/// Groups with a zero count are neither started nor skipped. The spawning
/// duration covers every configured group, matching the slowest burst.
pub(crate) fn plan_set(set: &SpawnSet, registry: &SpawnPointRegistry) -> SetPlan {
    let mut startable = Vec::with_capacity(set.groups().len());
    let mut unresolved = Vec::new();

    for (index, group) in set.groups().iter().enumerate() {
        match registry.resolve(group.spawn_point()) {
            Ok(_) if group.count() == 0 => {}
            Ok(_) => startable.push(index),
            Err(error) => unresolved.push((index, error)),
        }
    }

    SetPlan {
        startable,
        unresolved,
        spawn_duration: set.spawn_duration(),
    }
}
