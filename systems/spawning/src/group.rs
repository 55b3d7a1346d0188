//! Group spawner: releases one unit of a group through the unit factory.

use std::time::Duration;

use wave_defence_core::{
    SkipReason, SpawnGroup, SpawnPoint, SpawnRequest, UnitFactory, UnitId, WaveNumber,
};

use crate::gate::LivenessGate;

/// Result of a single creation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SpawnOutcome {
    Spawned(UnitId),
    Skipped(SkipReason),
}

/// Attempts to create one unit of `group` at `point`.
///
/// Every attempt claims exactly one slot of the wave's liveness gate: a
/// successful spawn hands the slot's token to the new unit, any failure
/// completes the slot as cancelled.
pub(crate) fn spawn_one<F>(
    group: &SpawnGroup,
    point: &SpawnPoint,
    gate: &LivenessGate,
    wave: WaveNumber,
    at: Duration,
    factory: &mut F,
) -> SpawnOutcome
where
    F: UnitFactory + ?Sized,
{
    let Some(template) = group.unit() else {
        let _ = gate.skip(1);
        return SpawnOutcome::Skipped(SkipReason::MissingTemplate);
    };

    let Some(token) = gate.issue_token() else {
        return SpawnOutcome::Skipped(SkipReason::ExpectedCountExceeded);
    };

    let origin = point.origin();
    let request = SpawnRequest {
        template,
        spawn_point: group.spawn_point(),
        position: origin.position(),
        rotation: origin.rotation(),
        path: point.waypoints(),
        wave,
        at,
    };

    match factory.spawn(request, token) {
        Ok(unit) => SpawnOutcome::Spawned(unit),
        Err(failure) => {
            let (error, token) = failure.into_parts();
            token.cancel();
            SpawnOutcome::Skipped(SkipReason::FactoryRejected(error))
        }
    }
}
