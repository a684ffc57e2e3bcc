//! Live buff instances (runtime state)
//!
//! A `BuffInstance` is one live application of an `EffectDefinition` to an
//! owner. It is created only through the engine's add path and destroyed
//! only through removal (explicit, natural expiry on tick, death cleanup,
//! field-leave cleanup, or replacement by a refreshed/higher-level
//! instance of the same definition).

use std::sync::Arc;

use aegis_types::{ActorId, Tick};

use super::EffectDefinition;

/// One live, timed application of a definition to an owner.
#[derive(Debug, Clone)]
pub struct BuffInstance {
    /// Unique within the owning engine, monotonically assigned.
    pub local_id: i32,

    /// Backing content definition.
    pub definition: Arc<EffectDefinition>,

    // ─── Entities ───────────────────────────────────────────────────────────
    /// Who applied this effect.
    pub caster: ActorId,

    /// Who has this effect.
    pub owner: ActorId,

    // ─── Timing ─────────────────────────────────────────────────────────────
    /// When the effect was applied.
    pub start_tick: Tick,

    /// When the effect expires. Invariant: `end_tick >= start_tick`.
    pub end_tick: Tick,

    // ─── State ──────────────────────────────────────────────────────────────
    /// Current stack count. `0 <= stacks <= max_stacks` when stacking is
    /// tracked.
    pub stacks: i32,

    /// False while the activation condition fails: the instance stays
    /// tracked but contributes no stat effect and fires no triggers.
    pub enabled: bool,

    /// Tick-loop coverage markers for periodic sub-effects (dot pulses).
    pub loop_window: (f32, f32),

    /// Remaining absorb shield health (0 when the definition has no shield).
    pub shield_health: i64,
}

impl BuffInstance {
    pub fn new(
        local_id: i32,
        definition: Arc<EffectDefinition>,
        caster: ActorId,
        owner: ActorId,
        start_tick: Tick,
        end_tick: Tick,
        stacks: i32,
    ) -> Self {
        Self {
            local_id,
            definition,
            caster,
            owner,
            start_tick,
            end_tick,
            stacks,
            enabled: true,
            loop_window: (0.0, 0.0),
            shield_health: 0,
        }
    }

    /// Reset the timing window (re-application with a fresh timer).
    pub fn refresh(&mut self, start_tick: Tick, end_tick: Tick) {
        self.start_tick = start_tick;
        self.end_tick = end_tick.max(start_tick);
    }

    /// Add stacks, clamping into the definition's limit when tracked.
    /// Returns true if the count changed.
    pub fn add_stacks(&mut self, delta: i32) -> bool {
        let max = self.definition.max_stacks;
        if max == 0 {
            return false;
        }
        let next = (self.stacks + delta).clamp(0, max);
        let changed = next != self.stacks;
        self.stacks = next;
        changed
    }

    /// Whether the instance's window has elapsed at the given tick.
    pub fn is_expired(&self, tick: Tick) -> bool {
        tick >= self.end_tick
    }

    /// Remaining duration at the given tick.
    pub fn remaining_ms(&self, tick: Tick) -> i64 {
        (self.end_tick - tick).max(0)
    }

    /// Absorb incoming damage into the shield.
    /// Returns the damage left over after absorption.
    pub fn absorb(&mut self, damage: i64) -> i64 {
        let absorbed = damage.min(self.shield_health);
        self.shield_health -= absorbed;
        damage - absorbed
    }

    /// Mark the tick-loop window covered by the last periodic pulse.
    pub fn set_loop_window(&mut self, start: f32, end: f32) {
        self.loop_window = (start, end);
    }
}
