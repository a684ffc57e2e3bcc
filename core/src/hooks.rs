//! Collaborator seam for the buff engine
//!
//! Everything the engine causes outside its own state goes through this
//! trait: stat recomputation, broadcast of add/update/remove, mounting,
//! conditional sub-skill firing, and session bookkeeping. All calls are
//! synchronous, in-process, and expected to return quickly; the engine
//! never blocks on I/O through this seam.
//!
//! Every method has a no-op default so collaborators only implement what
//! they care about; `NullHooks` is the all-default impl.

use aegis_types::{ActorId, DismountReason, EffectId, SkillId};

use crate::effects::{BuffInstance, EffectDefinition};

/// Side-effect sink for engine operations.
pub trait EffectHooks {
    /// Recompute the owner's derived stat totals after the buff set changed.
    fn refresh_stats(&mut self, _owner: ActorId) {}

    /// Broadcast that a buff was added to the owner.
    fn notify_added(&mut self, _instance: &BuffInstance) {}

    /// Broadcast that a live buff's timing or stacks changed.
    fn notify_updated(&mut self, _instance: &BuffInstance) {}

    /// Broadcast that a buff was removed from the owner.
    fn notify_removed(&mut self, _instance: &BuffInstance) {}

    /// Mount the owner on the ride granted by `definition`.
    ///
    /// Returning false makes the engine roll back the just-created
    /// instance so effect state stays consistent with the ride subsystem.
    fn mount(&mut self, _owner: ActorId, _definition: &EffectDefinition) -> bool {
        true
    }

    /// Dismount the owner.
    fn dismount(&mut self, _owner: ActorId, _reason: DismountReason) {}

    /// Effect definition id backing the owner's active ride, if mounted.
    fn active_ride_source(&self, _owner: ActorId) -> Option<EffectId> {
        None
    }

    /// Fire a conditional sub-skill attached to an active buff.
    fn fire_sub_skill(
        &mut self,
        _caster: ActorId,
        _owner: ActorId,
        _target: ActorId,
        _skill_id: SkillId,
        _level: u16,
    ) {
    }

    /// Grant experience to the owner (fire-and-forget).
    fn grant_experience(&mut self, _owner: ActorId, _amount: i64) {}

    /// Advance quest/condition counters for an applied effect.
    fn record_effect_progress(&mut self, _owner: ActorId, _effect_id: EffectId, _level: u16) {}

    /// Invalidate the owner's cached dungeon eligibility.
    fn invalidate_dungeon_eligibility(&mut self, _owner: ActorId) {}

    /// Reset a skill's cooldown (from a definition's update rules).
    fn reset_skill_cooldown(&mut self, _owner: ActorId, _skill_id: SkillId) {}
}

/// Hooks impl that ignores every side effect.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHooks;

impl EffectHooks for NullHooks {}
