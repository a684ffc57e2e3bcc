pub mod actor;
pub mod effects;
pub mod error;
pub mod hooks;

// Re-exports for convenience
pub use actor::{ActorContext, EffectRef, FieldMetadata};
pub use effects::{
    AddOutcome, AddRequest, BuffEngine, BuffInstance, CompulsionEventSpec, DefinitionConfig,
    DefinitionStore, EffectCategory, EffectCondition, EffectDefinition, EffectTriggerSpec,
    InvokeEffectSpec, ReflectRecord, ReflectSpec, ResetPolicy, SharedBuffEngine,
    ShieldSpec, StackOffset, UpdateRules, load_definitions_from_dir, load_definitions_from_file,
};
pub use error::DefinitionError;
pub use hooks::{EffectHooks, NullHooks};
