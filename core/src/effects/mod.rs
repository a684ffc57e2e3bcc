//! Status-effect (buff) system
//!
//! This module provides:
//! - **Definitions**: Immutable content templates describing each buff's
//!   rules (loaded from TOML)
//! - **Instances**: Runtime state of currently active buffs
//! - **Engine**: Per-actor orchestrator that applies, stacks, times out,
//!   and removes buffs while keeping every derived index consistent
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 EffectDefinition (TOML content)                  │
//! │   "Effect 10500 'Ember Ward': 10s, 3 stacks, +10% fire resist"  │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                     BuffEngine::add(...)
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  BuffInstance (runtime state)                    │
//! │   "Actor 42 has Ember Ward from caster 7, 2 stacks, ends @ t"   │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!          derived indices: invoke / compulsion / resistance /
//!          reflect / cooldowns  +  collaborator notifications
//! ```
//!
//! The derived indices are caches over the active-instance set and are
//! mutated only as a side effect of instance creation/removal.

mod definition;
mod engine;
mod instance;
mod shared;
mod store;


pub use definition::{
    CompulsionEventSpec, DefinitionConfig, EffectCategory, EffectCondition, EffectDefinition,
    EffectTriggerSpec, InvokeEffectSpec, ReflectSpec, ResetPolicy, ShieldSpec, StackOffset,
    UpdateRules,
};
pub use engine::{AddOutcome, AddRequest, BuffEngine, ReflectRecord};
pub use instance::BuffInstance;
pub use shared::SharedBuffEngine;
pub use store::{DefinitionStore, load_definitions_from_dir, load_definitions_from_file};
