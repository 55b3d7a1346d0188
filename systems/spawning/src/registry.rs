//! Index-addressed lookup of configured spawn points.

use wave_defence_core::{SpawnPoint, SpawnPointIndex};

/// Errors raised when a group addresses a spawn point that does not exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpawnPointError {
    /// The index lies outside the registered spawn points.
    #[error("spawn point {index} is not registered ({registered} spawn points available)")]
    Unregistered {
        /// Index requested by the group.
        index: SpawnPointIndex,
        /// Number of spawn points that are registered.
        registered: usize,
    },
}

/// Immutable table of spawn points loaded with the campaign.
#[derive(Clone, Debug, Default)]
pub struct SpawnPointRegistry {
    points: Vec<SpawnPoint>,
}

impl SpawnPointRegistry {
    /// Creates a registry over the provided spawn points.
    #[must_use]
    pub fn new(points: Vec<SpawnPoint>) -> Self {
        Self { points }
    }

    /// Looks up the spawn point registered at `index`.
    pub fn resolve(&self, index: SpawnPointIndex) -> Result<&SpawnPoint, SpawnPointError> {
        self.points
            .get(index.get())
            .ok_or(SpawnPointError::Unregistered {
                index,
                registered: self.points.len(),
            })
    }

    /// Number of registered spawn points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Reports whether no spawn points are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
