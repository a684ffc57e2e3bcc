//! Per-actor buff engine (the orchestrator)
//!
//! One `BuffEngine` exists per actor and is the sole mutator of that
//! actor's effect state: the active-instance map plus every derived index
//! over it (invoke records, compulsion records, resistances, the reflect
//! slot, re-application cooldowns). The derived indices are caches over the
//! active-instance set; they are mutated exclusively as a side effect of
//! instance creation and removal, never independently.
//!
//! Compound operations span several indices, so callers that share an
//! engine across threads must wrap whole calls in the per-actor critical
//! section provided by [`super::SharedBuffEngine`].

use std::collections::HashMap;
use std::sync::Arc;

use aegis_types::{
    ActorId, AttributeType, CompulsionKind, DismountReason, EffectId, EventKind, InvokeKind,
    SkillId, Tick, TriggerKind,
};

use crate::actor::{ActorContext, FieldMetadata};
use crate::hooks::EffectHooks;

use super::{
    BuffInstance, CompulsionEventSpec, DefinitionStore, EffectCategory, EffectDefinition,
    InvokeEffectSpec, ReflectSpec, ResetPolicy,
};

// ═══════════════════════════════════════════════════════════════════════════
// Requests & Outcomes
// ═══════════════════════════════════════════════════════════════════════════

/// Parameters for applying an effect to the engine's owner.
#[derive(Debug, Clone)]
pub struct AddRequest {
    pub caster: ActorId,
    pub effect_id: EffectId,
    pub level: u16,
    pub start_tick: Tick,

    /// Requested stack count (clamped into the definition's limit).
    pub stacks: i32,

    /// Explicit duration override; `None` uses the definition's base.
    pub duration_ms: Option<i64>,

    /// Broadcast "buff added" on success.
    pub notify: bool,

    pub trigger: TriggerKind,
}

impl AddRequest {
    pub fn new(caster: ActorId, effect_id: EffectId, level: u16, start_tick: Tick) -> Self {
        Self {
            caster,
            effect_id,
            level,
            start_tick,
            stacks: 0,
            duration_ms: None,
            notify: true,
            trigger: TriggerKind::Activate,
        }
    }

    pub fn with_stacks(mut self, stacks: i32) -> Self {
        self.stacks = stacks;
        self
    }

    pub fn with_duration(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerKind) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn silent(mut self) -> Self {
        self.notify = false;
        self
    }
}

/// Result of an add call. Blocked outcomes are expected gameplay results,
/// not errors; nothing was mutated for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new instance was created with this local id.
    Added(i32),
    /// An existing instance absorbed the application (timing/stacks merge).
    Refreshed(i32),
    /// No definition exists for (id, level); logged, no state change.
    UnknownDefinition,
    /// Rejected by the re-application cooldown.
    CooldownBlocked,
    /// Rejected by an active instance's immunity rules.
    ImmunityBlocked,
    /// Insertion raced into an occupied per-caster slot; logged, aborted.
    Duplicate,
    /// The ride collaborator refused to mount; the instance was rolled back.
    MountFailed,
}

impl AddOutcome {
    /// True when the application took effect (created or merged).
    pub fn is_applied(&self) -> bool {
        matches!(self, AddOutcome::Added(_) | AddOutcome::Refreshed(_))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Derived index records
// ═══════════════════════════════════════════════════════════════════════════

/// The actor's single damage-reflect slot (last writer wins).
#[derive(Debug, Clone, Copy)]
pub struct ReflectRecord {
    pub source_effect_id: EffectId,
    pub spec: ReflectSpec,
}

// ═══════════════════════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════════════════════

/// Per-actor status-effect state and its orchestration.
#[derive(Debug)]
pub struct BuffEngine {
    owner: ActorId,

    /// Content lookup shared across engines.
    store: Arc<DefinitionStore>,

    /// Next instance local id (monotonic within this engine).
    next_local_id: i32,

    /// Live instances by definition id. One entry per definition; one
    /// instance per distinct caster when the definition is
    /// caster-individual, otherwise at most one instance.
    active: HashMap<EffectId, Vec<BuffInstance>>,

    /// Invoke contributions by kind, keyed by contributing definition id so
    /// a re-application at a different level replaces the prior record
    /// instead of double-counting.
    invoke_index: HashMap<InvokeKind, HashMap<EffectId, InvokeEffectSpec>>,

    /// Forced-proc contributions by kind, keyed by contributing definition id.
    compulsion_index: HashMap<CompulsionKind, HashMap<EffectId, CompulsionEventSpec>>,

    /// Summed resistance per attribute over all active buffs.
    resistances: HashMap<AttributeType, f32>,

    /// At most one active damage-reflect definition.
    reflect: Option<ReflectRecord>,

    /// Per-definition tick after which a non-activation re-application is
    /// allowed again.
    cooldowns: HashMap<EffectId, Tick>,
}

impl BuffEngine {
    pub fn new(owner: ActorId, store: Arc<DefinitionStore>) -> Self {
        Self {
            owner,
            store,
            next_local_id: 1,
            active: HashMap::new(),
            invoke_index: HashMap::new(),
            compulsion_index: HashMap::new(),
            resistances: HashMap::new(),
            reflect: None,
            cooldowns: HashMap::new(),
        }
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Add
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply an effect to the owner.
    ///
    /// Fixed pipeline order: cooldown gate → duration resolution (invoke
    /// bonus) → stack clamp → immunity check → cooldown arm → existing
    /// lookup → reset policy → level upgrade/merge → conflict-group
    /// eviction → instantiate → side-effect wiring → resistance
    /// accumulation → conditional disable → stat refresh → notifications.
    pub fn add<H: EffectHooks>(
        &mut self,
        req: AddRequest,
        ctx: &ActorContext,
        hooks: &mut H,
    ) -> AddOutcome {
        let Some(definition) = self.store.get(req.effect_id, req.level) else {
            tracing::warn!(
                owner = self.owner,
                effect_id = req.effect_id,
                level = req.level,
                "unknown effect definition"
            );
            return AddOutcome::UnknownDefinition;
        };

        // 1. Cooldown gate (non-activation triggers only).
        if !req.trigger.bypasses_cooldown()
            && self
                .cooldowns
                .get(&req.effect_id)
                .is_some_and(|ready| *ready > req.start_tick)
        {
            return AddOutcome::CooldownBlocked;
        }

        // 2. Duration resolution, with bonus from active invoke records.
        let base_ms = req.duration_ms.unwrap_or(definition.duration_ms);
        let (flat_bonus, rate_bonus) = self.invoke_values(
            InvokeKind::IncreaseEffectDuration,
            definition.id,
            &definition.skill_groups,
        );
        let duration_ms = (flat_bonus.round() as i64
            + ((1.0 + rate_bonus as f64) * base_ms as f64).round() as i64)
            .max(0);

        // 3. Stack clamp (max_stacks == 0 means stacks are not tracked).
        let stacks = if definition.max_stacks == 0 {
            0
        } else {
            req.stacks.clamp(0, definition.max_stacks)
        };

        // 4. Immunity check against every active instance's rules.
        if self.is_immune(definition.id, definition.category) {
            return AddOutcome::ImmunityBlocked;
        }

        // 5. Cooldown arm. Zero-length cooldowns can never gate.
        if !req.trigger.bypasses_cooldown() && definition.cooldown_ms > 0 {
            self.cooldowns
                .insert(req.effect_id, req.start_tick + definition.cooldown_ms);
        }

        let end_tick = req.start_tick + duration_ms;

        // 6-7. Replace policy removes the existing instance outright and
        // forces full recreation.
        if definition.reset_policy == ResetPolicy::Replace
            && let Some(local_id) = self.find_existing(&definition, req.caster)
        {
            self.remove_instance(definition.id, local_id, hooks);
        }

        // 8. Level-upgrade short-circuit / merge into the surviving instance.
        if let Some(local_id) = self.find_existing(&definition, req.caster)
            && let Some((existing_level, existing_end)) = self
                .instance(definition.id, local_id)
                .map(|i| (i.definition.level, i.end_tick))
        {
            if existing_level < definition.level {
                // Incoming level is higher: full replace.
                self.remove_instance(definition.id, local_id, hooks);
            } else {
                let new_end = match definition.reset_policy {
                    ResetPolicy::ResetTimer | ResetPolicy::Replace => end_tick,
                    ResetPolicy::ResetTimerExtend => end_tick.max(existing_end),
                    ResetPolicy::KeepTimer => existing_end,
                };

                let Some(inst) = self.instance_mut(definition.id, local_id) else {
                    return AddOutcome::Refreshed(local_id);
                };
                let mut changed = false;
                if new_end != inst.end_tick {
                    inst.refresh(req.start_tick, new_end);
                    changed = true;
                }
                changed |= inst.add_stacks(stacks);
                let snapshot = inst.clone();

                if changed {
                    hooks.notify_updated(&snapshot);
                    self.trigger_event(
                        req.caster,
                        self.owner,
                        EventKind::EffectApplied,
                        0,
                        definition.id,
                        hooks,
                    );
                }
                return AddOutcome::Refreshed(local_id);
            }
        }

        // 9. Conflict-group eviction: only one member of a group at a time.
        if definition.conflict_group > 0 {
            let group = definition.conflict_group;
            let victims: Vec<(EffectId, i32)> = self
                .active
                .values()
                .flatten()
                .filter(|i| i.definition.conflict_group == group)
                .map(|i| (i.definition.id, i.local_id))
                .collect();
            for (id, local_id) in victims {
                self.remove_instance(id, local_id, hooks);
            }
        }

        // 10. Instantiate.
        let occupied = self.active.get(&definition.id).is_some_and(|list| {
            if definition.caster_individual {
                list.iter().any(|i| i.caster == req.caster)
            } else {
                !list.is_empty()
            }
        });
        if occupied {
            tracing::warn!(
                owner = self.owner,
                effect_id = definition.id,
                caster = req.caster,
                "instance slot already occupied, aborting add"
            );
            return AddOutcome::Duplicate;
        }

        let local_id = self.next_local_id;
        self.next_local_id += 1;
        let mut instance = BuffInstance::new(
            local_id,
            Arc::clone(&definition),
            req.caster,
            self.owner,
            req.start_tick,
            end_tick,
            stacks,
        );

        // 11d. Shield sizing: flat value, or a fraction of owner max health.
        if let Some(shield) = &definition.shield {
            instance.shield_health = if shield.health > 0 {
                shield.health
            } else {
                (shield.max_health_rate as f64 * ctx.max_health as f64) as i64
            };
        }

        self.active.entry(definition.id).or_default().push(instance);

        // 11a. Reflect slot: last writer wins, no merge policy.
        if let Some(spec) = &definition.reflect {
            self.reflect = Some(ReflectRecord {
                source_effect_id: definition.id,
                spec: *spec,
            });
        }

        // 11b. Invoke upserts keyed by (kind, definition id) so a
        // re-application at a different level replaces the prior record.
        for spec in &definition.invoke_effects {
            self.invoke_index
                .entry(spec.kind)
                .or_default()
                .insert(definition.id, spec.clone());
        }

        // 11c. Compulsion upsert, same keying.
        if let Some(spec) = &definition.compulsion_event {
            self.compulsion_index
                .entry(spec.kind)
                .or_default()
                .insert(definition.id, spec.clone());
        }

        // 11e. Cascading update rules (cancellations, cooldown resets,
        // stack offsets on other active buffs).
        self.apply_update_rules(&definition, hooks);

        // 12. Resistance accumulation.
        for (attr, value) in &definition.resistances {
            *self.resistances.entry(*attr).or_insert(0.0) += value;
        }

        // 13. Conditional disable: tracked but inert until re-evaluated.
        if !self.condition_met(&definition, req.caster, ctx)
            && let Some(inst) = self.instance_mut(definition.id, local_id)
        {
            inst.enabled = false;
        }

        // 14. Stat refresh for direct contributions.
        if definition.has_stat_contribution() {
            hooks.refresh_stats(self.owner);
        }

        // 15. Collaborator notifications.
        if definition.exp_reward > 0 {
            hooks.grant_experience(self.owner, definition.exp_reward);
        }
        hooks.record_effect_progress(self.owner, definition.id, definition.level);
        hooks.invalidate_dungeon_eligibility(self.owner);
        if req.notify
            && let Some(inst) = self.instance(definition.id, local_id)
        {
            hooks.notify_added(inst);
        }
        self.trigger_event(
            req.caster,
            self.owner,
            EventKind::EffectApplied,
            0,
            definition.id,
            hooks,
        );

        if definition.mount_id.is_some() && !hooks.mount(self.owner, &definition) {
            tracing::warn!(
                owner = self.owner,
                effect_id = definition.id,
                "mount failed, rolling back effect"
            );
            self.remove_instance(definition.id, local_id, hooks);
            return AddOutcome::MountFailed;
        }

        tracing::debug!(
            owner = self.owner,
            effect_id = definition.id,
            local_id,
            stacks,
            end_tick,
            "effect applied"
        );
        AddOutcome::Added(local_id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Remove
    // ─────────────────────────────────────────────────────────────────────────

    /// Remove every live instance matching `effect_id` (scoped to `caster`
    /// when the definition is caster-individual).
    ///
    /// Removing a non-existent instance is a no-op. Returns whether the
    /// removal set was processed; the engine does not distinguish "found
    /// nothing" from "found and removed" — callers that need the
    /// distinction should check [`Self::has_effect`] first.
    pub fn remove<H: EffectHooks>(
        &mut self,
        effect_id: EffectId,
        caster: ActorId,
        hooks: &mut H,
    ) -> bool {
        let victims: Vec<i32> = self
            .active
            .get(&effect_id)
            .map(|list| {
                list.iter()
                    .filter(|i| !i.definition.caster_individual || i.caster == caster)
                    .map(|i| i.local_id)
                    .collect()
            })
            .unwrap_or_default();
        for local_id in victims {
            self.remove_instance(effect_id, local_id, hooks);
        }
        true
    }

    /// Remove a batch of (effect id, caster) pairs.
    pub fn remove_many<H: EffectHooks>(
        &mut self,
        targets: &[(EffectId, ActorId)],
        hooks: &mut H,
    ) -> bool {
        for (effect_id, caster) in targets {
            self.remove(*effect_id, *caster, hooks);
        }
        true
    }

    /// Remove one specific instance and retract its derived contributions.
    fn remove_instance<H: EffectHooks>(
        &mut self,
        effect_id: EffectId,
        local_id: i32,
        hooks: &mut H,
    ) -> bool {
        let Some(list) = self.active.get_mut(&effect_id) else {
            return false;
        };
        let Some(pos) = list.iter().position(|i| i.local_id == local_id) else {
            return false;
        };
        let instance = list.remove(pos);
        let others_remain = !list.is_empty();
        if !others_remain {
            self.active.remove(&effect_id);
        }
        self.retract(instance, others_remain, hooks);
        true
    }

    /// Undo one instance's derived-index contributions and notify
    /// collaborators. `others_remain` is true when sibling instances of the
    /// same definition are still live; per-definition index entries
    /// (invoke, compulsion, reflect) are only cleared with the last one.
    fn retract<H: EffectHooks>(
        &mut self,
        instance: BuffInstance,
        others_remain: bool,
        hooks: &mut H,
    ) {
        let definition = Arc::clone(&instance.definition);

        // Resistances accumulate per instance; never go below zero.
        for (attr, value) in &definition.resistances {
            if let Some(total) = self.resistances.get_mut(attr) {
                *total = (*total - value).max(0.0);
            }
        }

        if !others_remain {
            if self
                .reflect
                .as_ref()
                .is_some_and(|r| r.source_effect_id == definition.id)
            {
                self.reflect = None;
            }
            for spec in &definition.invoke_effects {
                if let Some(records) = self.invoke_index.get_mut(&spec.kind) {
                    records.remove(&definition.id);
                    if records.is_empty() {
                        self.invoke_index.remove(&spec.kind);
                    }
                }
            }
            if let Some(spec) = &definition.compulsion_event {
                if let Some(records) = self.compulsion_index.get_mut(&spec.kind) {
                    records.remove(&definition.id);
                    if records.is_empty() {
                        self.compulsion_index.remove(&spec.kind);
                    }
                }
            }
        }

        hooks.notify_removed(&instance);
        if definition.has_stat_contribution() {
            hooks.refresh_stats(self.owner);
        }
        if definition.mount_id.is_some()
            && hooks.active_ride_source(self.owner) == Some(definition.id)
        {
            hooks.dismount(self.owner, DismountReason::EffectRemoved);
        }

        tracing::debug!(
            owner = self.owner,
            effect_id = definition.id,
            local_id = instance.local_id,
            "effect removed"
        );
        self.trigger_event(
            instance.caster,
            self.owner,
            EventKind::EffectRemoved,
            0,
            definition.id,
            hooks,
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tick & lifecycle hooks
    // ─────────────────────────────────────────────────────────────────────────

    /// Expire every instance whose window has elapsed at `tick`. Expiry
    /// goes through the same removal path as explicit removal.
    pub fn update<H: EffectHooks>(&mut self, tick: Tick, hooks: &mut H) {
        let expired: Vec<(EffectId, i32)> = self
            .active
            .values()
            .flatten()
            .filter(|i| i.is_expired(tick))
            .map(|i| (i.definition.id, i.local_id))
            .collect();
        for (effect_id, local_id) in expired {
            tracing::debug!(owner = self.owner, effect_id, local_id, "effect expired");
            self.remove_instance(effect_id, local_id, hooks);
        }

        // Elapsed cooldowns can never gate again.
        self.cooldowns.retain(|_, ready| *ready > tick);
    }

    /// Dispatch an event to the conditional sub-skills of every enabled
    /// active instance. Disabled instances do not participate.
    pub fn trigger_event<H: EffectHooks>(
        &mut self,
        caster: ActorId,
        target: ActorId,
        event: EventKind,
        skill_id: SkillId,
        effect_id: EffectId,
        hooks: &mut H,
    ) {
        let sub_skills: Vec<(SkillId, u16)> = self
            .active
            .values()
            .flatten()
            .filter(|i| i.enabled)
            .flat_map(|i| i.definition.triggers.iter())
            .filter(|t| t.event == event)
            .filter(|t| {
                t.skill_filter.is_empty()
                    || (skill_id != 0 && t.skill_filter.contains(&skill_id))
            })
            .filter(|t| {
                t.effect_filter.is_empty()
                    || (effect_id != 0 && t.effect_filter.contains(&effect_id))
            })
            .map(|t| (t.skill_id, t.level))
            .collect();

        for (sub_skill, level) in sub_skills {
            hooks.fire_sub_skill(caster, self.owner, target, sub_skill, level);
        }
    }

    /// Death cleanup: remove everything not flagged to survive death, then
    /// re-evaluate the enabled flag of what remains (some effects are
    /// suppressed while dead rather than removed).
    pub fn on_death<H: EffectHooks>(&mut self, ctx: &ActorContext, hooks: &mut H) {
        let victims: Vec<(EffectId, i32)> = self
            .active
            .values()
            .flatten()
            .filter(|i| !i.definition.keep_on_death)
            .map(|i| (i.definition.id, i.local_id))
            .collect();
        for (effect_id, local_id) in victims {
            self.remove_instance(effect_id, local_id, hooks);
        }
        self.update_enabled(ctx, hooks);
    }

    /// Field-entry: purge for PvP zones first (so unflagged entrance buffs
    /// from the previous zone can't leak through), then apply the field's
    /// entrance buffs and region bonus buffs.
    pub fn enter_field<H: EffectHooks>(
        &mut self,
        field: &FieldMetadata,
        tick: Tick,
        ctx: &ActorContext,
        hooks: &mut H,
    ) {
        if field.is_pvp {
            let victims: Vec<(EffectId, i32)> = self
                .active
                .values()
                .flatten()
                .filter(|i| !i.definition.keep_in_pvp)
                .map(|i| (i.definition.id, i.local_id))
                .collect();
            for (effect_id, local_id) in victims {
                self.remove_instance(effect_id, local_id, hooks);
            }
        }

        for buff in field.entrance_buffs.iter().chain(field.region_buffs.iter()) {
            let req = AddRequest::new(self.owner, buff.id, buff.level, tick)
                .with_trigger(TriggerKind::MapEntrance);
            self.add(req, ctx, hooks);
        }
    }

    /// Field-leave: remove the field's entrance buffs plus anything flagged
    /// to be removed on leaving.
    pub fn leave_field<H: EffectHooks>(&mut self, field: &FieldMetadata, hooks: &mut H) {
        for buff in &field.entrance_buffs {
            self.remove(buff.id, self.owner, hooks);
        }
        let victims: Vec<(EffectId, i32)> = self
            .active
            .values()
            .flatten()
            .filter(|i| i.definition.remove_on_leave_field)
            .map(|i| (i.definition.id, i.local_id))
            .collect();
        for (effect_id, local_id) in victims {
            self.remove_instance(effect_id, local_id, hooks);
        }
    }

    /// Re-evaluate every instance's activation condition, broadcasting and
    /// refreshing stats for the ones that flipped.
    pub fn update_enabled<H: EffectHooks>(&mut self, ctx: &ActorContext, hooks: &mut H) {
        let checks: Vec<(EffectId, i32, ActorId)> = self
            .active
            .values()
            .flatten()
            .map(|i| (i.definition.id, i.local_id, i.caster))
            .collect();

        let mut stats_dirty = false;
        for (effect_id, local_id, caster) in checks {
            let Some(definition) = self
                .instance(effect_id, local_id)
                .map(|i| Arc::clone(&i.definition))
            else {
                continue;
            };
            let enabled = self.condition_met(&definition, caster, ctx);
            let snapshot = {
                let Some(inst) = self.instance_mut(effect_id, local_id) else {
                    continue;
                };
                if inst.enabled == enabled {
                    continue;
                }
                inst.enabled = enabled;
                inst.clone()
            };
            stats_dirty |= definition.has_stat_contribution();
            hooks.notify_updated(&snapshot);
        }
        if stats_dirty {
            hooks.refresh_stats(self.owner);
        }
    }

    /// Feed incoming damage through active shields, oldest first. Exhausted
    /// shield instances are removed; partially consumed ones broadcast an
    /// update. Returns the damage left after absorption.
    pub fn absorb_damage<H: EffectHooks>(&mut self, damage: i64, hooks: &mut H) -> i64 {
        if damage <= 0 {
            return damage;
        }
        let mut shields: Vec<(EffectId, i32)> = self
            .active
            .values()
            .flatten()
            .filter(|i| i.enabled && i.shield_health > 0)
            .map(|i| (i.definition.id, i.local_id))
            .collect();
        shields.sort_by_key(|(_, local_id)| *local_id);

        let mut remaining = damage;
        for (effect_id, local_id) in shields {
            if remaining == 0 {
                break;
            }
            let depleted = {
                let Some(inst) = self.instance_mut(effect_id, local_id) else {
                    continue;
                };
                remaining = inst.absorb(remaining);
                inst.shield_health == 0
            };
            if depleted {
                self.remove_instance(effect_id, local_id, hooks);
            } else if let Some(inst) = self.instance(effect_id, local_id) {
                let snapshot = inst.clone();
                hooks.notify_updated(&snapshot);
            }
        }
        remaining
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Aggregation
    // ─────────────────────────────────────────────────────────────────────────

    /// Sum the (flat, rate) contributions of every invoke record under
    /// `kind` whose target matches `skill_id` or intersects `skill_groups`.
    pub fn invoke_values(
        &self,
        kind: InvokeKind,
        skill_id: SkillId,
        skill_groups: &[u32],
    ) -> (f32, f32) {
        let Some(records) = self.invoke_index.get(&kind) else {
            return (0.0, 0.0);
        };
        let mut flat = 0.0;
        let mut rate = 0.0;
        for spec in records.values() {
            if spec.matches(skill_id, skill_groups) {
                flat += spec.value;
                rate += spec.rate;
            }
        }
        (flat, rate)
    }

    /// Aggregate forced-proc rate under `kind`, counting records whose
    /// skill allow-list is empty or contains `skill_id`.
    pub fn compulsion_rate(&self, kind: CompulsionKind, skill_id: SkillId) -> f32 {
        self.compulsion_index
            .get(&kind)
            .map(|records| {
                records
                    .values()
                    .filter(|spec| spec.applies_to(skill_id))
                    .map(|spec| spec.rate)
                    .sum()
            })
            .unwrap_or(0.0)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether an instance of `effect_id` is active at `min_level`+ with at
    /// least `min_stacks` stacks.
    pub fn has_effect(&self, effect_id: EffectId, min_level: u16, min_stacks: i32) -> bool {
        self.active.get(&effect_id).is_some_and(|list| {
            list.iter()
                .any(|i| i.definition.level >= min_level && i.stacks >= min_stacks)
        })
    }

    /// Whether any active instance's definition hooks the given event.
    pub fn has_effect_event(&self, event: EventKind) -> bool {
        self.active
            .values()
            .flatten()
            .any(|i| i.definition.has_trigger_for(event))
    }

    /// All live instances.
    pub fn effects(&self) -> impl Iterator<Item = &BuffInstance> {
        self.active.values().flatten()
    }

    /// Mutable access to live instances (for the periodic pulse code that
    /// maintains loop windows).
    pub fn effects_mut(&mut self) -> impl Iterator<Item = &mut BuffInstance> {
        self.active.values_mut().flatten()
    }

    /// Live instances of one definition.
    pub fn effects_of(&self, effect_id: EffectId) -> impl Iterator<Item = &BuffInstance> {
        self.active.get(&effect_id).into_iter().flatten()
    }

    /// Accumulated resistance for an attribute (never negative).
    pub fn resistance(&self, attribute: AttributeType) -> f32 {
        self.resistances
            .get(&attribute)
            .copied()
            .unwrap_or(0.0)
            .max(0.0)
    }

    /// The actor's active reflect record, if any.
    pub fn reflect(&self) -> Option<&ReflectRecord> {
        self.reflect.as_ref()
    }

    /// Summed remaining shield health over all active shields.
    pub fn total_shield(&self) -> i64 {
        self.active
            .values()
            .flatten()
            .filter(|i| i.enabled)
            .map(|i| i.shield_health)
            .sum()
    }

    /// Tick until which `effect_id` is cooldown-gated, if armed.
    pub fn cooldown_until(&self, effect_id: EffectId) -> Option<Tick> {
        self.cooldowns.get(&effect_id).copied()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn find_existing(&self, definition: &EffectDefinition, caster: ActorId) -> Option<i32> {
        let list = self.active.get(&definition.id)?;
        if definition.caster_individual {
            list.iter().find(|i| i.caster == caster).map(|i| i.local_id)
        } else {
            list.first().map(|i| i.local_id)
        }
    }

    fn instance(&self, effect_id: EffectId, local_id: i32) -> Option<&BuffInstance> {
        self.active
            .get(&effect_id)?
            .iter()
            .find(|i| i.local_id == local_id)
    }

    fn instance_mut(&mut self, effect_id: EffectId, local_id: i32) -> Option<&mut BuffInstance> {
        self.active
            .get_mut(&effect_id)?
            .iter_mut()
            .find(|i| i.local_id == local_id)
    }

    fn is_immune(&self, effect_id: EffectId, category: EffectCategory) -> bool {
        self.active
            .values()
            .flatten()
            .any(|i| i.definition.grants_immunity_against(effect_id, category))
    }

    fn condition_met(
        &self,
        definition: &EffectDefinition,
        caster: ActorId,
        ctx: &ActorContext,
    ) -> bool {
        let Some(condition) = &definition.condition else {
            return true;
        };
        if condition.require_alive && ctx.dead {
            return false;
        }
        if condition.require_caster_owner && caster != self.owner {
            return false;
        }
        if let Some(required) = condition.require_effect_id
            && !self.active.get(&required).is_some_and(|l| !l.is_empty())
        {
            return false;
        }
        true
    }

    /// Cascading rules evaluated when a definition is applied: cancel other
    /// effects by id/category, reset skill cooldowns, and shift stack
    /// counts on other active buffs (removal when driven to zero).
    fn apply_update_rules<H: EffectHooks>(
        &mut self,
        definition: &EffectDefinition,
        hooks: &mut H,
    ) {
        let rules = definition.update_rules();
        if rules.is_empty() {
            return;
        }

        let victims: Vec<(EffectId, i32)> = self
            .active
            .values()
            .flatten()
            .filter(|i| i.definition.id != definition.id)
            .filter(|i| {
                rules.cancel_effect_ids.contains(&i.definition.id)
                    || rules.cancel_categories.contains(&i.definition.category)
            })
            .map(|i| (i.definition.id, i.local_id))
            .collect();
        for (effect_id, local_id) in victims {
            self.remove_instance(effect_id, local_id, hooks);
        }

        for skill_id in &rules.reset_skill_cooldowns {
            hooks.reset_skill_cooldown(self.owner, *skill_id);
        }

        for offset in &rules.stack_offsets {
            let targets: Vec<i32> = self
                .active
                .get(&offset.effect_id)
                .map(|list| list.iter().map(|i| i.local_id).collect())
                .unwrap_or_default();
            for local_id in targets {
                let depleted = {
                    let Some(inst) = self.instance_mut(offset.effect_id, local_id) else {
                        continue;
                    };
                    inst.stacks += offset.delta;
                    if inst.definition.max_stacks > 0 {
                        inst.stacks = inst.stacks.min(inst.definition.max_stacks);
                    }
                    inst.stacks <= 0
                };
                if depleted {
                    self.remove_instance(offset.effect_id, local_id, hooks);
                } else if let Some(inst) = self.instance(offset.effect_id, local_id) {
                    let snapshot = inst.clone();
                    hooks.notify_updated(&snapshot);
                }
            }
        }
    }
}
