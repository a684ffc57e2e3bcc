//! Effect definition types
//!
//! Definitions are immutable, content-authored templates loaded from TOML
//! files. They describe one buff's rules: base duration, stacking, conflict
//! group, re-application cooldown, and an optional tagged set of sub-effect
//! value types (invoke modifiers, compulsion event, shield, reflect, update
//! rules, conditional triggers). A definition may carry any combination of
//! sub-effects; none of them require subclassing the definition itself.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use aegis_types::{
    AttributeType, BasicStat, CompulsionKind, EffectId, EventKind, InvokeKind, SkillId,
};

// ═══════════════════════════════════════════════════════════════════════════
// Categories & Policies
// ═══════════════════════════════════════════════════════════════════════════

/// How an effect is categorized (used by cancel/immunity rules).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    /// Beneficial buff
    #[default]
    Buff,
    /// Harmful debuff
    Debuff,
    /// Damage over time
    Dot,
    /// Heal over time
    Hot,
    /// Absorb shield/barrier
    Shield,
    /// Persistent stance/aura
    Stance,
}

/// How re-applying an already-active definition affects its timing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Fresh timer: the candidate end tick is used as-is.
    #[default]
    ResetTimer,
    /// Fresh timer, but never shortens the existing window
    /// (end = max(existing end, candidate end)).
    ResetTimerExtend,
    /// Existing end tick is kept; only stacks/metadata refresh.
    KeepTimer,
    /// Existing instance is removed outright and recreated.
    Replace,
}

// ═══════════════════════════════════════════════════════════════════════════
// Sub-effect specs
// ═══════════════════════════════════════════════════════════════════════════

/// A secondary modifier this buff contributes to other skills/effects.
///
/// Matches by exact target skill id or by skill group; aggregation over all
/// active contributors happens in the engine's invoke index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeEffectSpec {
    pub kind: InvokeKind,

    /// Flat component (milliseconds for duration kinds, flat value otherwise).
    #[serde(default)]
    pub value: f32,

    /// Rate component (0.25 = +25%).
    #[serde(default)]
    pub rate: f32,

    /// Exact skill/effect id this modifier applies to (0 = none).
    #[serde(default)]
    pub target_skill_id: SkillId,

    /// Skill group this modifier applies to (0 = none).
    #[serde(default)]
    pub target_skill_group: u32,
}

impl InvokeEffectSpec {
    /// Whether this modifier applies to the given skill id / group set.
    pub fn matches(&self, skill_id: SkillId, skill_groups: &[u32]) -> bool {
        (self.target_skill_id != 0 && self.target_skill_id == skill_id)
            || (self.target_skill_group != 0 && skill_groups.contains(&self.target_skill_group))
    }
}

/// A forced-proc probability this buff contributes while active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompulsionEventSpec {
    pub kind: CompulsionKind,

    /// Proc rate contributed (0.1 = +10%).
    pub rate: f32,

    /// Skills this proc is limited to (empty = all skills).
    #[serde(default)]
    pub skill_ids: Vec<SkillId>,
}

impl CompulsionEventSpec {
    /// Whether this proc applies when resolving the given skill.
    pub fn applies_to(&self, skill_id: SkillId) -> bool {
        self.skill_ids.is_empty() || self.skill_ids.contains(&skill_id)
    }
}

/// Temporary absorb shield granted on apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldSpec {
    /// Flat shield health (takes precedence when > 0).
    #[serde(default)]
    pub health: i64,

    /// Shield health as a fraction of the owner's max health.
    #[serde(default)]
    pub max_health_rate: f32,
}

/// Damage reflection installed while this buff is active.
///
/// At most one reflect definition is active per actor; last writer wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReflectSpec {
    /// Fraction of incoming damage reflected.
    pub rate: f32,

    /// Cap on damage reflected per hit (0 = uncapped).
    #[serde(default)]
    pub per_hit_cap: i64,
}

/// Stack adjustment applied to another active effect when this one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOffset {
    pub effect_id: EffectId,

    /// Signed stack delta; driving stacks to zero removes the instance.
    pub delta: i32,
}

/// Cascading rules evaluated when this definition is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRules {
    /// Active effects with these ids are removed on apply.
    #[serde(default)]
    pub cancel_effect_ids: Vec<EffectId>,

    /// Active effects in these categories are removed on apply.
    #[serde(default)]
    pub cancel_categories: Vec<EffectCategory>,

    /// While this buff is active, these effect ids cannot be applied.
    #[serde(default)]
    pub immune_effect_ids: Vec<EffectId>,

    /// While this buff is active, these categories cannot be applied.
    #[serde(default)]
    pub immune_categories: Vec<EffectCategory>,

    /// Skill cooldowns reset when this buff is applied.
    #[serde(default)]
    pub reset_skill_cooldowns: Vec<SkillId>,

    /// Stack adjustments applied to other active effects.
    #[serde(default)]
    pub stack_offsets: Vec<StackOffset>,
}

impl UpdateRules {
    pub fn is_empty(&self) -> bool {
        self.cancel_effect_ids.is_empty()
            && self.cancel_categories.is_empty()
            && self.immune_effect_ids.is_empty()
            && self.immune_categories.is_empty()
            && self.reset_skill_cooldowns.is_empty()
            && self.stack_offsets.is_empty()
    }
}

/// Conditional sub-skill fired when a lifecycle/combat event reaches the
/// owner while this buff is active and enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectTriggerSpec {
    /// Event that fires this sub-skill.
    pub event: EventKind,

    /// Skill to fire.
    pub skill_id: SkillId,

    #[serde(default = "default_level")]
    pub level: u16,

    /// Skills this trigger is limited to for skill-scoped events
    /// (empty = any skill).
    #[serde(default)]
    pub skill_filter: Vec<SkillId>,

    /// Source buffs this trigger is limited to for effect-scoped events
    /// (empty = any buff).
    #[serde(default)]
    pub effect_filter: Vec<EffectId>,
}

fn default_level() -> u16 {
    1
}

/// Activation condition: when it fails the instance stays tracked but
/// contributes no stat effect until re-evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectCondition {
    /// Owner must be alive.
    #[serde(default)]
    pub require_alive: bool,

    /// Caster and owner must be the same actor.
    #[serde(default)]
    pub require_caster_owner: bool,

    /// Owner must have this effect active.
    #[serde(default)]
    pub require_effect_id: Option<EffectId>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Effect Definition
// ═══════════════════════════════════════════════════════════════════════════

/// Immutable content metadata describing one buff, keyed by (id, level).
///
/// Multiple `BuffInstance`s may be live from one definition (one per
/// distinct caster when `caster_individual` is set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectDefinition {
    pub id: EffectId,

    #[serde(default = "default_level")]
    pub level: u16,

    /// Display name (for logs and tooling).
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub category: EffectCategory,

    // ─── Timing & stacking ──────────────────────────────────────────────────
    /// Base duration in milliseconds.
    pub duration_ms: i64,

    /// Maximum stack count (0 = stacks are not tracked).
    #[serde(default)]
    pub max_stacks: i32,

    /// Re-application cooldown for non-activation triggers.
    #[serde(default)]
    pub cooldown_ms: i64,

    /// Track one instance per distinct caster instead of one per owner.
    #[serde(default)]
    pub caster_individual: bool,

    #[serde(default)]
    pub reset_policy: ResetPolicy,

    /// Conflict group: at most one member of a group is active at a time
    /// (0 = no group).
    #[serde(default)]
    pub conflict_group: u32,

    /// Skill groups this effect belongs to, for invoke-record matching.
    #[serde(default)]
    pub skill_groups: Vec<u32>,

    // ─── Contributions ──────────────────────────────────────────────────────
    /// Resistance contributed per attribute while active.
    #[serde(default)]
    pub resistances: HashMap<AttributeType, f32>,

    /// Direct flat stat contributions (consumed by the stat engine).
    #[serde(default)]
    pub stat_values: HashMap<BasicStat, f32>,

    /// Direct rate stat contributions (consumed by the stat engine).
    #[serde(default)]
    pub stat_rates: HashMap<BasicStat, f32>,

    // ─── Sub-effects ────────────────────────────────────────────────────────
    #[serde(default)]
    pub invoke_effects: Vec<InvokeEffectSpec>,

    #[serde(default)]
    pub compulsion_event: Option<CompulsionEventSpec>,

    #[serde(default)]
    pub shield: Option<ShieldSpec>,

    #[serde(default)]
    pub reflect: Option<ReflectSpec>,

    #[serde(default)]
    pub update_rules: Option<UpdateRules>,

    #[serde(default)]
    pub triggers: Vec<EffectTriggerSpec>,

    #[serde(default)]
    pub condition: Option<EffectCondition>,

    /// Ride granted while this buff is active.
    #[serde(default)]
    pub mount_id: Option<u32>,

    // ─── Lifecycle flags ────────────────────────────────────────────────────
    /// Survive the owner's death (suppressed via condition instead of removed).
    #[serde(default)]
    pub keep_on_death: bool,

    /// Removed when the owner leaves the field.
    #[serde(default)]
    pub remove_on_leave_field: bool,

    /// Survives entering a PvP zone.
    #[serde(default)]
    pub keep_in_pvp: bool,

    // ─── Rewards ────────────────────────────────────────────────────────────
    /// Experience granted to the owner on apply.
    #[serde(default)]
    pub exp_reward: i64,
}

impl EffectDefinition {
    /// Whether this definition contributes any direct stat values/rates
    /// (and therefore requires a stat refresh on apply/remove).
    pub fn has_stat_contribution(&self) -> bool {
        !self.stat_values.is_empty() || !self.stat_rates.is_empty()
    }

    /// Whether any conditional sub-skill hooks the given event.
    pub fn has_trigger_for(&self, event: EventKind) -> bool {
        self.triggers.iter().any(|t| t.event == event)
    }

    /// Update rules, or a static empty set.
    pub fn update_rules(&self) -> &UpdateRules {
        static EMPTY: UpdateRules = UpdateRules {
            cancel_effect_ids: Vec::new(),
            cancel_categories: Vec::new(),
            immune_effect_ids: Vec::new(),
            immune_categories: Vec::new(),
            reset_skill_cooldowns: Vec::new(),
            stack_offsets: Vec::new(),
        };
        self.update_rules.as_ref().unwrap_or(&EMPTY)
    }

    /// Whether applying `other_id`/`other_category` is blocked while this
    /// definition is active.
    pub fn grants_immunity_against(
        &self,
        other_id: EffectId,
        other_category: EffectCategory,
    ) -> bool {
        let rules = self.update_rules();
        rules.immune_effect_ids.contains(&other_id)
            || rules.immune_categories.contains(&other_category)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Config File Structure
// ═══════════════════════════════════════════════════════════════════════════

/// Root structure for effect config files (TOML).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionConfig {
    /// Effect definitions in this file
    #[serde(default, rename = "effect")]
    pub effects: Vec<EffectDefinition>,
}
