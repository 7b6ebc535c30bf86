//! End-to-end behavior of impact reactors driven through the public API.

use impact_core::config::{ReactorBlockConfig, RegistryBuilder, Rules};
use impact_core::effect::{EffectCommand, EffectKind, SoundKind};
use impact_core::geom::{TILE_SIZE, Vec2};
use impact_core::id::BlockTypeId;
use impact_core::persist::{Reads, Writes};
use impact_core::reactor::{Detonation, FizzleReason, REACTOR_REVISION, ReactorState};
use impact_core::stats::net_power_output_per_second;
use impact_core::test_utils::*;
use impact_core::world::ReactorWorld;

fn single_block_world(rules: Rules) -> (ReactorWorld, BlockTypeId) {
    let mut builder = RegistryBuilder::new();
    let block = builder.register(ReactorBlockConfig::default()).unwrap();
    (ReactorWorld::new(builder.build(), rules, 1234), block)
}

// ===========================================================================
// Warmup
// ===========================================================================

#[test]
fn warmup_reaches_exactly_one_then_exactly_zero() {
    let config = ReactorBlockConfig::default();
    let mut harness = Harness::active();
    harness.fuel.items = u32::MAX;
    let mut r = reactor();

    let mut ticks = 0;
    while r.warmup() < 1.0 {
        harness.tick(&mut r, &config);
        ticks += 1;
        assert!(ticks < 10_000, "warmup never settled");
    }
    assert_eq!(r.warmup(), 1.0);
    assert_eq!(r.current_efficiency(), 1.0);

    let mut idle = Harness::idle();
    let mut ticks = 0;
    while r.warmup() > 0.0 {
        assert_eq!(idle.tick(&mut r, &config).state, ReactorState::Idle);
        ticks += 1;
        assert!(ticks < 2_000, "cooldown never settled");
    }
    assert_eq!(r.warmup(), 0.0);
    assert_eq!(r.current_efficiency(), 0.0);
    assert_eq!(idle.fuel.consumed, 0);
}

#[test]
fn warmup_is_monotonic_while_active() {
    let config = ReactorBlockConfig::default();
    let mut harness = Harness::active();
    let mut r = reactor();
    let mut last = r.warmup();
    for _ in 0..500 {
        harness.tick(&mut r, &config);
        assert!(r.warmup() >= last);
        last = r.warmup();
    }
}

// ===========================================================================
// Power trigger
// ===========================================================================

#[test]
fn power_trigger_once_per_surplus_interval() {
    let config = ReactorBlockConfig::default();
    let mut harness = Harness::active();
    harness.power.demand = 1.0;
    let mut r = reactor();

    let supplies = [0.5, 2.0, 2.0, 2.0, 0.5, 0.5, 2.0, 2.0];
    for supply in supplies {
        harness.power.supply = supply;
        harness.tick(&mut r, &config);
    }
    assert_eq!(harness.events.triggers.len(), 2);
}

// ===========================================================================
// Detonation
// ===========================================================================

#[test]
fn full_warmup_detonation_choreography() {
    let (mut world, block) = single_block_world(Rules::default());
    let at = Vec2::from_tile(32, 32);
    let id = world.place(block, at).unwrap();
    world.reactor_mut(id).unwrap().set_warmup(1.0);

    let mut damage = RecordingDamage::default();
    assert_eq!(
        world.destroy(id, &mut damage).unwrap(),
        Detonation::Exploded { scheduled: 96 }
    );
    assert_eq!(damage.hits, vec![(at, 50.0 * TILE_SIZE, 8000)]);

    let immediate = world.drain_effects();
    assert_eq!(
        immediate,
        vec![
            EffectCommand::Sound {
                sound: SoundKind::ExplosionBig,
                at
            },
            EffectCommand::Shake {
                intensity: 6.0,
                duration: 16.0,
                at
            },
            EffectCommand::Play {
                effect: EffectKind::ImpactShockwave,
                at
            },
        ]
    );

    let mut played = Vec::new();
    for _ in 0..100 {
        world.step();
        played.extend(world.drain_effects());
    }
    let count = |kind: EffectKind| {
        played
            .iter()
            .filter(|c| matches!(c, EffectCommand::Play { effect, .. } if *effect == kind))
            .count()
    };
    assert_eq!(count(EffectKind::ImpactCloud), 6);
    assert_eq!(count(EffectKind::Explosion), 20);
    assert_eq!(count(EffectKind::ImpactSmoke), 70);
    assert_eq!(world.reactor_count(), 0);
}

#[test]
fn disabled_explosions_are_silent() {
    let rules = Rules {
        explosions_enabled: false,
        ..Rules::default()
    };
    let (mut world, block) = single_block_world(rules);
    let id = world.place(block, Vec2::ZERO).unwrap();
    world.reactor_mut(id).unwrap().set_warmup(1.0);

    let mut damage = RecordingDamage::default();
    assert_eq!(
        world.destroy(id, &mut damage).unwrap(),
        Detonation::Fizzled(FizzleReason::ExplosionsDisabled)
    );
    assert!(damage.hits.is_empty());
    assert!(world.drain_effects().is_empty());
    assert!(world.effects().scheduler().is_empty());
}

#[test]
fn detonation_is_reproducible_from_seed() {
    let config = ReactorBlockConfig::default();
    let mut r = reactor();
    r.set_warmup(0.9);
    let run = || {
        let mut fx = RecordingEffects::default();
        let mut dmg = RecordingDamage::default();
        destroy(&r, &config, &Rules::default(), &mut fx, &mut dmg);
        fx
    };
    assert_eq!(run(), run());
}

// ===========================================================================
// Persistence
// ===========================================================================

#[test]
fn field_stream_round_trip_keeps_warmup() {
    let mut r = reactor();
    r.set_warmup(0.73);
    let mut w = Writes::new();
    w.u8(REACTOR_REVISION);
    r.write(&mut w);
    let bytes = w.into_bytes();

    let mut reads = Reads::new(&bytes);
    let revision = reads.u8().unwrap();
    let mut restored = reactor();
    restored.read(&mut reads, revision).unwrap();
    assert_eq!(restored.warmup(), 0.73);
    assert_eq!(reads.remaining(), 0);
}

// ===========================================================================
// Output
// ===========================================================================

#[test]
fn warm_world_reactor_reports_net_output() {
    let (mut world, block) = single_block_world(Rules::default());
    let id = world.place(block, Vec2::ZERO).unwrap();
    world.add_fuel(id, 10).unwrap();
    world.set_satisfaction(id, 1.0).unwrap();
    world.reactor_mut(id).unwrap().set_warmup(1.0);
    world.step();

    let config = world.registry().get(block).unwrap();
    let efficiency = world.efficiency(id).unwrap();
    assert_eq!(efficiency, 1.0);
    assert_eq!(world.power_output(id), Some(config.power_production));
    let net = net_power_output_per_second(config, efficiency, 1.0);
    assert!((net - 105.0).abs() < 1e-3);
}
