//! Spell catalog, item catalog and run configuration loading

use elesim::combat::{run_trial, SpellBook, SpellId};
use elesim::config::SimConfig;
use elesim::equipment::{ActivationKind, ItemActivation, SlotCategory};
use elesim::{ConfigError, Stat};

// =============================================================================
// Spell catalog
// =============================================================================

#[test]
fn test_embedded_spells_load() {
    let spells = SpellBook::embedded().unwrap();
    let bolt = spells.get(SpellId::LightningBolt);
    assert_eq!(bolt.name, "Lightning Bolt");
    assert!(bolt.talented);
    assert_eq!(spells.get(SpellId::ChainLightning).cooldown, 6.0);
    assert_eq!(spells.iter().count(), 3);
}

#[test]
fn test_catalog_missing_a_spell_is_rejected() {
    let ron = r#"(
        spells: {
            LightningBolt: (name: "Lightning Bolt", cast_time: 2.5, damage_min: 1.0, damage_max: 2.0),
        },
    )"#;
    match SpellBook::from_ron_str(ron) {
        Err(ConfigError::MissingSpells(missing)) => {
            assert!(missing.contains("ChainLightning"));
            assert!(missing.contains("LightningCapacitor"));
        }
        other => panic!("expected missing spells, got {:?}", other),
    }
}

#[test]
fn test_malformed_catalog_is_a_ron_error() {
    assert!(matches!(
        SpellBook::from_ron_str("(spells: {"),
        Err(ConfigError::Ron(_))
    ));
}

// =============================================================================
// Item catalog
// =============================================================================

#[test]
fn test_item_names_resolve_case_insensitively() {
    let items = ItemActivation::resolve_all(&[
        "icon of the silver crescent".to_string(),
        "The Lightning Capacitor".to_string(),
    ])
    .unwrap();

    assert_eq!(items[0].slot, SlotCategory::Trinket);
    assert!(matches!(items[0].kind, ActivationKind::OnUse { .. }));
    assert!(matches!(items[1].kind, ActivationKind::Passive(_)));
}

#[test]
fn test_unknown_item_is_rejected() {
    assert!(matches!(
        ItemActivation::resolve_all(&["Staff of Infinite Mana".to_string()]),
        Err(ConfigError::UnknownItem(name)) if name == "Staff of Infinite Mana"
    ));
}

#[test]
fn test_every_catalog_item_survives_a_trial() {
    for item in ItemActivation::catalog() {
        let mut config = SimConfig::builtin();
        config.equipment = vec![item.name.to_string()];
        config.options.encounter.duration_secs = 120.0;
        let setup = config.trial_setup(SpellBook::embedded().unwrap()).unwrap();
        let metrics = run_trial(&setup, 8).unwrap();
        assert!(metrics.total_damage > 0.0, "{}", item.name);
    }
}

#[test]
fn test_capacitor_fires_bolts_on_crits() {
    let mut config = SimConfig::builtin();
    config.equipment = vec!["The Lightning Capacitor".to_string()];
    config.stats[Stat::SpellCrit] = 1500.0;
    let setup = config.trial_setup(SpellBook::embedded().unwrap()).unwrap();

    let metrics = run_trial(&setup, 21).unwrap();
    let bolts = metrics.spell(SpellId::LightningCapacitor);
    assert!(bolts.count > 0);
    assert_eq!(bolts.mana_spent, 0.0);
}

// =============================================================================
// Run configuration
// =============================================================================

#[test]
fn test_full_json_config() {
    let json = r#"{
        "stats": {"mana": 11000, "spell_power": 950, "spell_crit": 400, "mp5": 120},
        "equipment": ["Skycall Totem", "Chaotic Skyfire Diamond"],
        "iterations": 50,
        "seed": 77,
        "options": {
            "agent": "4LB1CL",
            "encounter": {"duration_secs": 180},
            "num_bloodlust": 1,
            "buffs": {"race": "Troll30", "misery": true},
            "consumes": {"super_mana_potion": true},
            "talents": {"lightning_overload": 5, "elemental_focus": true}
        }
    }"#;
    let config = SimConfig::from_json_str(json).unwrap();
    assert_eq!(config.iterations, 50);
    assert_eq!(config.batch_options().seed, 77);
    assert_eq!(config.stats[Stat::SpellPower], 950.0);

    let setup = config.trial_setup(SpellBook::embedded().unwrap()).unwrap();
    assert_eq!(setup.agent.to_string(), "4LB1CL");
    assert_eq!(setup.equipment.len(), 2);
    assert_eq!(setup.duration_ticks(), 180 * 30);
    assert!(run_trial(&setup, 77).unwrap().total_damage > 0.0);
}

#[test]
fn test_invalid_configs_fail_before_any_trial() {
    assert!(matches!(
        SimConfig::from_json_str(r#"{"options": {"agent": "ChainLightningSpam"}}"#),
        Err(ConfigError::UnknownAgent(_))
    ));
    assert!(matches!(
        SimConfig::from_json_str(r#"{"equipment": ["Nonexistent Trinket"]}"#),
        Err(ConfigError::UnknownItem(_))
    ));
    assert!(matches!(
        SimConfig::from_json_str(r#"{"iterations": 0}"#),
        Err(ConfigError::ZeroIterations)
    ));
    assert!(matches!(
        SimConfig::from_json_str(r#"{"options": {"encounter": {"duration_secs": -5}}}"#),
        Err(ConfigError::InvalidDuration(_))
    ));
    assert!(matches!(
        SimConfig::from_json_str("{not json"),
        Err(ConfigError::Json(_))
    ));
}
