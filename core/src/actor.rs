//! Actor-side context the engine reads but does not own
//!
//! The engine is the sole writer of an actor's effect state, but it needs a
//! read-only view of the actor (max health for shield sizing, dead flag for
//! activation conditions) and of the field the actor is moving through
//! (entrance buffs, PvP rules). Both are supplied by the session layer per
//! call rather than owned by the engine, so actor teardown never has to
//! worry about ownership cycles between actors and their buff collections.

use aegis_types::{ActorId, EffectId};

/// Read-only view of the owning actor at the time of a call.
#[derive(Debug, Clone, Copy)]
pub struct ActorContext {
    /// Stable object id of the actor.
    pub id: ActorId,

    /// Current maximum health (for shields sized as a fraction of max HP).
    pub max_health: i64,

    /// Whether the actor is currently dead.
    pub dead: bool,

    /// Field the actor currently occupies.
    pub field_id: u32,
}

impl ActorContext {
    pub fn new(id: ActorId, max_health: i64) -> Self {
        Self {
            id,
            max_health,
            dead: false,
            field_id: 0,
        }
    }
}

/// Reference to an effect definition at a specific level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectRef {
    pub id: EffectId,
    pub level: u16,
}

impl EffectRef {
    pub fn new(id: EffectId, level: u16) -> Self {
        Self { id, level }
    }
}

/// Field metadata relevant to effect lifecycle transitions.
///
/// Built by the field/session layer from map content; the engine only
/// consumes it on enter/leave.
#[derive(Debug, Clone, Default)]
pub struct FieldMetadata {
    pub field_id: u32,

    /// Buffs granted on entering this field and removed on leaving it.
    pub entrance_buffs: Vec<EffectRef>,

    /// PvP zone: entering purges every active effect not flagged to persist.
    pub is_pvp: bool,

    /// Region-specific bonus buffs granted unconditionally on entry.
    pub region_buffs: Vec<EffectRef>,
}
