//! Rotation agents driving full trials

use regex::Regex;

use elesim::combat::{Simulation, SpellBook, SpellId, TrialSetup};
use elesim::config::{Options, Talents};
use elesim::{CombatLog, CombatLogEventType, Stat, Stats};

fn setup(agent: &str, stats: Stats, talents: Talents) -> TrialSetup {
    let options = Options {
        agent: agent.to_string(),
        talents,
        ..Options::default()
    };
    TrialSetup::new(stats, Vec::new(), options, SpellBook::embedded().unwrap()).unwrap()
}

fn caster_stats(mana: f64, crit: f64) -> Stats {
    Stats::new()
        .with(Stat::Mana, mana)
        .with(Stat::SpellPower, 900.0)
        .with(Stat::SpellCrit, crit)
        .with(Stat::Mp5, 150.0)
}

fn cast_sequence(setup: &TrialSetup, seed: u64) -> Vec<String> {
    let mut simulation = Simulation::new(setup, seed).with_log(CombatLog::new());
    simulation.run().unwrap();
    let log = simulation.into_log().unwrap();

    let started = Regex::new(r"Start casting (.+?) \(cost").unwrap();
    log.filter_by_type(CombatLogEventType::CastStarted)
        .iter()
        .filter_map(|entry| started.captures(&entry.message))
        .map(|caps| caps[1].to_string())
        .collect()
}

#[test]
fn test_fixed_ratio_bounds_fillers_between_expensive_casts() {
    for ratio in [3u8, 4, 7] {
        let setup = setup(
            &format!("{}LB1CL", ratio),
            caster_stats(1_000_000.0, 400.0),
            Talents::elemental(),
        );
        for seed in 0..5 {
            let sequence = cast_sequence(&setup, seed);
            let mut fillers = 0u8;
            let mut seen_expensive = false;
            for name in &sequence {
                if name == "Chain Lightning" {
                    if seen_expensive {
                        assert!(fillers <= ratio, "{} fillers with ratio {}", fillers, ratio);
                    }
                    seen_expensive = true;
                    fillers = 0;
                } else {
                    fillers += 1;
                }
            }
            assert!(seen_expensive);
        }
    }
}

#[test]
fn test_filler_only_never_casts_chain_lightning() {
    let setup = setup("LB", caster_stats(1_000_000.0, 400.0), Talents::elemental());
    let sequence = cast_sequence(&setup, 9);
    assert!(!sequence.is_empty());
    assert!(sequence.iter().all(|name| name == "Lightning Bolt"));
}

#[test]
fn test_adaptive_spends_less_on_expensive_when_mana_is_tight() {
    let talents = Talents::default();
    let mut tight_stats = caster_stats(8_000.0, 400.0);
    tight_stats[Stat::Mp5] = 0.0;
    let tight = setup("Adaptive", tight_stats, talents);
    let ample = setup("Adaptive", caster_stats(1_000_000.0, 400.0), talents);

    let chains = |setup: &TrialSetup| {
        let mut simulation = Simulation::new(setup, 4);
        simulation.run().unwrap().spell(SpellId::ChainLightning).count
    };
    assert!(chains(&tight) < chains(&ample));
}

#[test]
fn test_clearcast_agent_needs_crits_to_spend() {
    let focus = Talents {
        elemental_focus: true,
        ..Talents::default()
    };

    // Without crits the opener is the only Chain Lightning
    let no_crits = setup("CLOnClearcast", caster_stats(1_000_000.0, 0.0), focus);
    let sequence = cast_sequence(&no_crits, 1);
    assert_eq!(sequence.iter().filter(|n| *n == "Chain Lightning").count(), 1);

    // Every cast crits, so Clearcasting is always up
    let stats = caster_stats(1_000_000.0, 2300.0).with(Stat::SpellHit, 300.0);
    let all_crits = setup("CLOnClearcast", stats, focus);
    let sequence = cast_sequence(&all_crits, 1);
    assert!(sequence.iter().filter(|n| *n == "Chain Lightning").count() > 10);
}
