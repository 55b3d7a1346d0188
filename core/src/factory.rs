//! Boundary between the scheduler and whatever instantiates units.

use std::time::Duration;

use glam::{Quat, Vec3};

use crate::{CompletionToken, SpawnPointIndex, UnitId, UnitTemplateId, WaveNumber};

/// Everything a unit factory needs to place one unit into the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRequest<'a> {
    /// Template to instantiate.
    pub template: &'a UnitTemplateId,
    /// Spawn point the unit is released from.
    pub spawn_point: SpawnPointIndex,
    /// World-space position of the new unit.
    pub position: Vec3,
    /// World-space rotation of the new unit.
    pub rotation: Quat,
    /// Waypoints the unit must walk, in order.
    pub path: &'a [Vec3],
    /// Wave the unit belongs to.
    pub wave: WaveNumber,
    /// Scheduler time at which the unit is created.
    pub at: Duration,
}

/// Reasons a unit factory may refuse to instantiate a unit.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    /// The requested template is unknown to the factory.
    #[error("unit template `{0}` is not registered")]
    UnknownTemplate(UnitTemplateId),
}

/// Rejected spawn that hands the unused completion token back to the caller.
#[derive(Debug)]
pub struct SpawnFailure {
    error: SpawnError,
    token: CompletionToken,
}

impl SpawnFailure {
    /// Pairs the rejection reason with the token that was not handed to a unit.
    #[must_use]
    pub fn new(error: SpawnError, token: CompletionToken) -> Self {
        Self { error, token }
    }

    /// Reason the spawn was refused.
    #[must_use]
    pub fn error(&self) -> &SpawnError {
        &self.error
    }

    /// Splits the failure into its reason and the returned token.
    #[must_use]
    pub fn into_parts(self) -> (SpawnError, CompletionToken) {
        (self.error, self.token)
    }
}

/// Collaborator that instantiates units on behalf of the scheduler.
pub trait UnitFactory {
    /// Instantiates one unit and hands it the completion token it must consume.
    ///
    /// On failure the token is returned inside [`SpawnFailure`] so the caller
    /// can account for the unit that never entered the world.
    fn spawn(
        &mut self,
        request: SpawnRequest<'_>,
        token: CompletionToken,
    ) -> Result<UnitId, SpawnFailure>;
}
