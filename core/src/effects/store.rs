//! Effect definition store and TOML loading
//!
//! The store is the engine's read-only view of effect content: definitions
//! keyed by `(id, level)`, handed out as `Arc`s so live instances share one
//! copy of their metadata. Loading walks a directory of TOML files, each a
//! `DefinitionConfig` with `[[effect]]` tables.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use hashbrown::HashMap;

use aegis_types::EffectId;

use crate::error::DefinitionError;

use super::{DefinitionConfig, EffectDefinition};

/// Immutable lookup of effect definitions keyed by (id, level).
#[derive(Debug, Clone, Default)]
pub struct DefinitionStore {
    definitions: HashMap<(EffectId, u16), Arc<EffectDefinition>>,
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add definitions. If `overwrite` is true, replaces existing entries
    /// with the same (id, level). Returns the keys of duplicates that were
    /// encountered (skipped if `!overwrite`, replaced if `overwrite`).
    pub fn add_definitions(
        &mut self,
        definitions: Vec<EffectDefinition>,
        overwrite: bool,
    ) -> Vec<(EffectId, u16)> {
        let mut duplicates = Vec::new();
        for def in definitions {
            let key = (def.id, def.level);
            if self.definitions.contains_key(&key) {
                duplicates.push(key);
                if !overwrite {
                    continue; // Keep the first definition
                }
            }
            self.definitions.insert(key, Arc::new(def));
        }
        duplicates
    }

    /// Look up a definition by id and level.
    pub fn get(&self, id: EffectId, level: u16) -> Option<Arc<EffectDefinition>> {
        self.definitions.get(&(id, level)).cloned()
    }

    /// Whether any level of the given id exists.
    pub fn contains_id(&self, id: EffectId) -> bool {
        self.definitions.keys().any(|(def_id, _)| *def_id == id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<EffectDefinition>> {
        self.definitions.values()
    }

    /// Cross-reference check: report rules pointing at effect ids that no
    /// definition in the store declares. Content tooling surfaces these;
    /// the engine itself treats dangling references as no-ops at runtime.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for def in self.definitions.values() {
            let rules = def.update_rules();
            for id in rules
                .cancel_effect_ids
                .iter()
                .chain(rules.immune_effect_ids.iter())
                .chain(rules.stack_offsets.iter().map(|o| &o.effect_id))
            {
                if !self.contains_id(*id) {
                    warnings.push(format!(
                        "effect {} lv{} references unknown effect id {}",
                        def.id, def.level, id
                    ));
                }
            }
            if let Some(c) = &def.condition
                && let Some(required) = c.require_effect_id
                && !self.contains_id(required)
            {
                warnings.push(format!(
                    "effect {} lv{} condition requires unknown effect id {}",
                    def.id, def.level, required
                ));
            }
            if def.duration_ms < 0 {
                warnings.push(format!(
                    "effect {} lv{} has negative duration_ms",
                    def.id, def.level
                ));
            }
        }
        warnings.sort();
        warnings
    }
}

/// Load effect definitions from a single TOML file.
pub fn load_definitions_from_file(path: &Path) -> Result<Vec<EffectDefinition>, DefinitionError> {
    let content = fs::read_to_string(path).map_err(|source| DefinitionError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let config: DefinitionConfig =
        toml::from_str(&content).map_err(|source| DefinitionError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;

    for def in &config.effects {
        if def.level == 0 {
            return Err(DefinitionError::InvalidDefinition {
                path: path.to_path_buf(),
                reason: format!("effect {} has level 0 (levels start at 1)", def.id),
            });
        }
    }

    Ok(config.effects)
}

/// Load all effect definitions from a directory tree of TOML files.
pub fn load_definitions_from_dir(dir: &Path) -> Result<Vec<EffectDefinition>, DefinitionError> {
    let mut definitions = Vec::new();
    if !dir.exists() {
        return Ok(definitions);
    }
    load_dir_recursive(dir, &mut definitions)?;
    Ok(definitions)
}

fn load_dir_recursive(
    dir: &Path,
    out: &mut Vec<EffectDefinition>,
) -> Result<(), DefinitionError> {
    let entries = fs::read_dir(dir).map_err(|source| DefinitionError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            load_dir_recursive(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            out.extend(load_definitions_from_file(&path)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::ResetPolicy;

    fn parse(toml_src: &str) -> Vec<EffectDefinition> {
        let config: DefinitionConfig = toml::from_str(toml_src).expect("valid TOML");
        config.effects
    }

    #[test]
    fn test_parse_minimal_definition() {
        let effects = parse(
            r#"
            [[effect]]
            id = 100
            name = "Iron Skin"
            duration_ms = 10000
            "#,
        );
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].id, 100);
        assert_eq!(effects[0].level, 1, "level defaults to 1");
        assert_eq!(effects[0].duration_ms, 10_000);
        assert!(!effects[0].caster_individual);
    }

    #[test]
    fn test_parse_sub_effects() {
        let effects = parse(
            r#"
            [[effect]]
            id = 200
            level = 2
            duration_ms = 5000
            max_stacks = 3
            reset_policy = "keep_timer"
            conflict_group = 5
            resistances = { fire = 0.1, poison = 0.05 }

            [[effect.invoke_effects]]
            kind = "increase_effect_duration"
            value = 500.0
            rate = 0.2
            target_skill_group = 9

            [effect.compulsion_event]
            kind = "critical_chance"
            rate = 0.15
            skill_ids = [11, 12]

            [effect.shield]
            max_health_rate = 0.3

            [effect.update_rules]
            cancel_effect_ids = [300]
            stack_offsets = [{ effect_id = 400, delta = -1 }]
            "#,
        );
        let def = &effects[0];
        assert_eq!(def.reset_policy, ResetPolicy::KeepTimer);
        assert_eq!(def.invoke_effects.len(), 1);
        assert_eq!(def.invoke_effects[0].target_skill_group, 9);
        let comp = def.compulsion_event.as_ref().expect("compulsion parsed");
        assert!(comp.applies_to(11));
        assert!(!comp.applies_to(13));
        assert!(def.shield.is_some());
        assert_eq!(def.update_rules().stack_offsets[0].delta, -1);
        assert!((def.resistances[&aegis_types::AttributeType::Fire] - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_duplicate_definitions_keep_first_without_overwrite() {
        let mut store = DefinitionStore::new();
        let mut a = parse("[[effect]]\nid = 1\nname = \"first\"\nduration_ms = 1000\n");
        a.extend(parse("[[effect]]\nid = 1\nname = \"second\"\nduration_ms = 2000\n"));

        let duplicates = store.add_definitions(a, false);
        assert_eq!(duplicates, vec![(1, 1)]);
        assert_eq!(store.get(1, 1).unwrap().name, "first");
    }

    #[test]
    fn test_validate_reports_dangling_references() {
        let mut store = DefinitionStore::new();
        store.add_definitions(
            parse(
                r#"
                [[effect]]
                id = 1
                duration_ms = 1000
                [effect.update_rules]
                cancel_effect_ids = [999]
                "#,
            ),
            false,
        );
        let warnings = store.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("999"), "warning names the dangling id");
    }
}
