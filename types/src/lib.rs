//! Shared identifier and attribute types for AEGIS
//!
//! This crate contains the serializable identifiers and enums that are shared
//! between the effect engine core and anything that talks to it (combat
//! resolution, broadcast encoding, content tooling).

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Stable object id of an actor (player or NPC) within a session.
pub type ActorId = u64;

/// Content id of an effect definition.
pub type EffectId = u32;

/// Content id of a skill.
pub type SkillId = u32;

/// Server time in milliseconds.
pub type Tick = i64;

// ─────────────────────────────────────────────────────────────────────────────
// Attribute / stat types
// ─────────────────────────────────────────────────────────────────────────────

/// Damage/attribute element a buff can grant resistance against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Physical,
    Fire,
    Ice,
    Lightning,
    Poison,
    Holy,
    Dark,
}

/// Direct stat a buff can contribute a flat value or rate to.
///
/// The engine does not compute stat totals itself; it only needs to know
/// whether a definition touches any of these to request a stat refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasicStat {
    Health,
    Spirit,
    Stamina,
    PhysicalAttack,
    MagicAttack,
    PhysicalDefense,
    MagicDefense,
    AttackSpeed,
    MoveSpeed,
    CritChance,
    CritDamage,
    Evasion,
}

// ─────────────────────────────────────────────────────────────────────────────
// Cross-cutting effect kinds
// ─────────────────────────────────────────────────────────────────────────────

/// Category of secondary modifier one active buff contributes to the
/// evaluation of another skill or effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokeKind {
    /// Bonus duration for a matching effect (flat ms + rate).
    IncreaseEffectDuration,
    /// Bonus proc/application rate for a matching effect.
    IncreaseEffectRate,
    /// Bonus damage for a matching skill.
    IncreaseSkillDamage,
    /// Cooldown reduction for a matching skill.
    ReduceSkillCooldown,
    /// Bonus tick damage for a matching damage-over-time effect.
    IncreaseDotDamage,
    /// Bonus healing for a matching heal effect.
    IncreaseHealRate,
}

/// Category of forced-proc probability an active buff contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompulsionKind {
    /// Forces critical hits at the aggregate rate.
    CriticalChance,
    /// Forces perfect evasion at the aggregate rate.
    PerfectEvasion,
    /// Forces blocking at the aggregate rate.
    BlockChance,
}

/// Lifecycle/combat events that conditional sub-skills can hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    EffectApplied,
    EffectRemoved,
    DamageTaken,
    DamageDealt,
    SkillCast,
    HealReceived,
}

/// What kind of trigger is asking for an effect to be applied.
///
/// Only direct skill activation bypasses the per-definition re-application
/// cooldown; everything else (procs, item equips, map rules, periodic
/// ticks) is gated by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Direct skill activation by the caster.
    #[default]
    Activate,
    /// Fired as a side effect of another effect or event.
    Proc,
    /// Granted by an equipped item.
    ItemEquip,
    /// Granted by a map-entrance rule.
    MapEntrance,
    /// Applied by a periodic tick (regen pulses, auras).
    Tick,
}

impl TriggerKind {
    /// Returns true if this trigger bypasses the re-application cooldown.
    pub fn bypasses_cooldown(&self) -> bool {
        matches!(self, TriggerKind::Activate)
    }
}

/// Why an actor was dismounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismountReason {
    /// The buff granting the ride ended or was removed.
    EffectRemoved,
    /// The rider died.
    Death,
    /// The rider left the field.
    LeaveField,
}
