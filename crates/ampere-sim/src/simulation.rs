//! The per-tick production and heat simulator
//!
//! `Simulation` is the explicit context handle for one session. It owns the
//! generators, the aggregate state and its own tick clock. Collaborators read
//! through accessors, observe through drained events and commands, and write
//! through the mutation methods below. Each call runs to completion before the
//! next, so a tick is always applied as one batch.

use crate::catalog::TypeCatalog;
use crate::cmd::{Cmd, OverloadReport};
use crate::config::SimConfig;
use crate::error::{Error, Result};
use crate::event::SimEvent;
use crate::generator::{GeneratorEntity, GeneratorState, UpgradeLevels};
use crate::patch::{AggregatePatch, EntityPatch, PatchOutcome};
use crate::user::{AggregateMultiplier, UserAggregateState};
use ampere_core::{BigValue, GeneratorId, Tick, TickClock, TypeRef};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::mem;
use tracing::{debug, info, warn};

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: Tick,
    /// Clamped elapsed seconds used for this tick
    pub delta: f64,
    /// Summed generator output before the aggregate multiplier
    pub produced: BigValue,
    /// Energy added to the user after the aggregate multiplier
    pub gained: BigValue,
    pub completed: Vec<GeneratorId>,
    pub overloaded: Vec<GeneratorId>,
    /// Generators skipped because their type is unknown
    pub degraded: Vec<GeneratorId>,
    /// Commands emitted this tick (also queued for `drain_commands`)
    pub cmd: Cmd,
}

impl TickReport {
    fn new(tick: Tick, delta: f64) -> Self {
        Self {
            tick,
            delta,
            produced: BigValue::ZERO,
            gained: BigValue::ZERO,
            completed: Vec::new(),
            overloaded: Vec::new(),
            degraded: Vec::new(),
            cmd: Cmd::None,
        }
    }
}

/// Simulation context for one session
pub struct Simulation {
    config: SimConfig,
    catalog: Box<dyn TypeCatalog + Send + Sync>,
    generators: IndexMap<GeneratorId, GeneratorEntity>,
    user: UserAggregateState,
    clock: TickClock,
    next_id: u64,
    /// Bumped whenever the simulator writes energy
    aggregate_revision: u64,
    /// Revision of the newest aggregate patch merged so far
    last_aggregate_patch: u64,
    events: Vec<SimEvent>,
    commands: Vec<Cmd>,
    dirty: bool,
}

impl Simulation {
    /// Create an empty simulation
    pub fn new(config: SimConfig, catalog: impl TypeCatalog + Send + Sync + 'static) -> Self {
        let clock = TickClock::new(config.tick_interval_ms)
            .with_delta_bounds(config.min_delta_secs, config.max_delta_secs);
        Self {
            config,
            catalog: Box::new(catalog),
            generators: IndexMap::new(),
            user: UserAggregateState::default(),
            clock,
            next_id: 1,
            aggregate_revision: 0,
            last_aggregate_patch: 0,
            events: Vec::new(),
            commands: Vec::new(),
            dirty: false,
        }
    }

    /// Start from an existing aggregate state
    pub fn with_user(mut self, user: UserAggregateState) -> Self {
        self.user = user;
        self
    }

    /// Swap the type catalog (e.g. after reloading definitions)
    pub fn set_catalog(&mut self, catalog: impl TypeCatalog + Send + Sync + 'static) {
        self.catalog = Box::new(catalog);
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn user(&self) -> &UserAggregateState {
        &self.user
    }

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    pub fn current_tick(&self) -> Tick {
        self.clock.tick
    }

    pub fn aggregate_revision(&self) -> u64 {
        self.aggregate_revision
    }

    /// All generators in placement order
    pub fn generators(&self) -> impl Iterator<Item = &GeneratorEntity> {
        self.generators.values()
    }

    pub fn generator(&self, id: GeneratorId) -> Option<&GeneratorEntity> {
        self.generators.get(&id)
    }

    pub fn generator_count(&self) -> usize {
        self.generators.len()
    }

    /// Capacity including the user's bonus
    pub fn max_generators(&self) -> usize {
        self.config
            .base_max_generators
            .saturating_add(self.user.max_generators_bonus as usize)
    }

    // ------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------

    /// Whether the tick timer is due at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.clock.is_due(now)
    }

    /// Run one tick, measuring the delta from the previous tick
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let delta = self.clock.advance(now);
        self.step(now, delta)
    }

    /// Run one tick with an externally measured delta (still clamped)
    pub fn tick_with_delta(&mut self, now: DateTime<Utc>, delta_secs: f64) -> TickReport {
        let delta = self.clock.advance_with(now, delta_secs);
        self.step(now, delta)
    }

    fn step(&mut self, now: DateTime<Utc>, delta: f64) -> TickReport {
        let mut report = TickReport::new(self.clock.tick, delta);
        let mut cmds = Vec::new();
        let mut produced = BigValue::ZERO;
        let config = &self.config;
        let tolerance_bonus = f64::from(self.user.tolerance_bonus);
        let heat_reduction_percent = self.user.heat_reduction_percent;

        for generator in self.generators.values_mut() {
            let id = generator.id;

            if generator.build_finished(now) {
                generator.complete_build();
                debug!(generator = %id, "build completed");
                report.completed.push(id);
                self.events.push(SimEvent::BuildCompleted { id });
                cmds.push(Cmd::RefreshProgress { id });
            }

            if matches!(
                generator.state,
                GeneratorState::Paused | GeneratorState::Building
            ) {
                generator.cool(config.cooling_rate, delta);
            }

            if self.catalog.generator_meta(&generator.type_ref).is_none() {
                if !generator.degraded {
                    warn!(generator = %id, type_ref = %generator.type_ref, "unknown generator type, cooling only");
                    generator.degraded = true;
                    self.events.push(SimEvent::Degraded {
                        id,
                        type_ref: generator.type_ref.clone(),
                    });
                }
                report.degraded.push(id);
                continue;
            }
            generator.degraded = false;

            if !generator.is_running() {
                continue;
            }

            let output = production_per_sec(generator, config).multiply_by_scalar(delta);
            produced = produced.add(output);
            generator.accrue_heat(heat_rate_per_sec(generator, config, heat_reduction_percent) * delta);

            let tolerance = tolerance_of(generator, config, tolerance_bonus);
            if tolerance > 0.0 && generator.heat > tolerance {
                let heat = generator.heat;
                generator.reset_for_rebuild(now);
                info!(generator = %id, heat, tolerance, "generator overloaded");
                report.overloaded.push(id);
                self.events.push(SimEvent::Overloaded { id, heat, tolerance });
                cmds.push(Cmd::ReportOverload(OverloadReport {
                    id,
                    revision: generator.revision,
                    heat,
                    tolerance,
                    build_complete_at: generator.build_complete_at,
                    at: now,
                }));
            }
        }

        let gained = self.aggregate_multiplier().apply(produced);
        if !gained.is_zero() {
            self.user.energy = self.user.energy.add(gained);
            self.aggregate_revision += 1;
        }
        if !gained.is_zero() || !self.generators.is_empty() {
            self.dirty = true;
        }

        debug!(tick = report.tick, delta, produced = %produced, gained = %gained, "tick complete");

        report.produced = produced;
        report.gained = gained;
        report.cmd = Cmd::batch(cmds.clone());
        self.commands.extend(cmds);
        report
    }

    // ------------------------------------------------------------------
    // Read-only accessors
    // ------------------------------------------------------------------

    /// The aggregate multiplier for the current bonus levels
    pub fn aggregate_multiplier(&self) -> AggregateMultiplier {
        AggregateMultiplier::for_user(&self.user, &self.config)
    }

    /// Energy per second from all running generators, after the multiplier
    pub fn production_rate(&self) -> BigValue {
        let base: BigValue = self
            .generators
            .values()
            .filter(|g| g.is_running() && self.catalog.generator_meta(&g.type_ref).is_some())
            .map(|g| production_per_sec(g, &self.config))
            .sum();
        self.aggregate_multiplier().apply(base)
    }

    pub fn heat(&self, id: GeneratorId) -> Result<f64> {
        Ok(self.get(id)?.heat)
    }

    /// Heat threshold including per-generator and global tolerance levels
    pub fn effective_tolerance(&self, id: GeneratorId) -> Result<f64> {
        let generator = self.get(id)?;
        Ok(tolerance_of(
            generator,
            &self.config,
            f64::from(self.user.tolerance_bonus),
        ))
    }

    /// Heat per second while running
    pub fn effective_heat_rate(&self, id: GeneratorId) -> Result<f64> {
        let generator = self.get(id)?;
        Ok(heat_rate_per_sec(
            generator,
            &self.config,
            self.user.heat_reduction_percent,
        ))
    }

    /// Seconds until the generator finishes building (0 when not building)
    pub fn remaining_build_time(&self, id: GeneratorId, now: DateTime<Utc>) -> Result<f64> {
        Ok(self.get(id)?.remaining_build_secs(now))
    }

    /// Build progress in `[0, 1]`
    pub fn build_progress(&self, id: GeneratorId, now: DateTime<Utc>) -> Result<f64> {
        Ok(self.get(id)?.build_progress(now))
    }

    fn get(&self, id: GeneratorId) -> Result<&GeneratorEntity> {
        self.generators.get(&id).ok_or(Error::GeneratorNotFound(id))
    }

    fn get_mut(&mut self, id: GeneratorId) -> Result<&mut GeneratorEntity> {
        self.generators
            .get_mut(&id)
            .ok_or(Error::GeneratorNotFound(id))
    }

    // ------------------------------------------------------------------
    // External mutations
    // ------------------------------------------------------------------

    /// Place a new generator of `type_ref`, building from `now`
    ///
    /// Cost bookkeeping belongs to the caller.
    pub fn place(&mut self, type_ref: impl Into<TypeRef>, now: DateTime<Utc>) -> Result<GeneratorId> {
        let type_ref = type_ref.into();
        let meta = self
            .catalog
            .generator_meta(&type_ref)
            .ok_or_else(|| Error::UnknownType(type_ref.clone()))?;

        let limit = self.max_generators();
        if self.generators.len() >= limit {
            return Err(Error::CapacityReached { limit });
        }

        let id = GeneratorId(self.next_id);
        self.next_id += 1;
        let duration = self.config.build_duration_secs(meta.build_secs);
        let generator = GeneratorEntity::from_meta(id, type_ref.clone(), &meta, duration, now);

        debug!(generator = %id, type_ref = %type_ref, "generator placed");
        self.generators.insert(id, generator);
        self.events.push(SimEvent::Placed { id, type_ref });
        self.dirty = true;
        Ok(id)
    }

    /// Restore a persisted generator
    pub fn insert(&mut self, generator: GeneratorEntity) -> Result<()> {
        let id = generator.id;
        if self.generators.contains_key(&id) {
            return Err(Error::DuplicateGenerator(id));
        }
        self.next_id = self.next_id.max(id.raw().saturating_add(1));
        self.generators.insert(id, generator);
        self.dirty = true;
        Ok(())
    }

    /// Remove a generator
    pub fn demolish(&mut self, id: GeneratorId) -> Result<GeneratorEntity> {
        let generator = self
            .generators
            .shift_remove(&id)
            .ok_or(Error::GeneratorNotFound(id))?;
        debug!(generator = %id, "generator demolished");
        self.events.push(SimEvent::Demolished { id });
        self.dirty = true;
        Ok(generator)
    }

    /// Running → Paused
    pub fn pause(&mut self, id: GeneratorId) -> Result<()> {
        self.transition(id, GeneratorState::Running, GeneratorState::Paused, "pause")?;
        self.events.push(SimEvent::Paused { id });
        Ok(())
    }

    /// Paused → Running
    pub fn resume(&mut self, id: GeneratorId) -> Result<()> {
        self.transition(id, GeneratorState::Paused, GeneratorState::Running, "resume")?;
        self.events.push(SimEvent::Resumed { id });
        Ok(())
    }

    fn transition(
        &mut self,
        id: GeneratorId,
        from: GeneratorState,
        to: GeneratorState,
        action: &'static str,
    ) -> Result<()> {
        let generator = self.get_mut(id)?;
        if generator.state != from {
            return Err(Error::InvalidTransition {
                id,
                from: generator.state,
                action,
            });
        }
        generator.state = to;
        generator.revision += 1;
        self.dirty = true;
        Ok(())
    }

    /// Finish a build immediately
    pub fn skip_build(&mut self, id: GeneratorId) -> Result<()> {
        let generator = self.get_mut(id)?;
        if !generator.is_developing() {
            return Err(Error::InvalidTransition {
                id,
                from: generator.state,
                action: "skip build of",
            });
        }
        generator.complete_build();
        self.events.push(SimEvent::BuildCompleted { id });
        self.commands.push(Cmd::RefreshProgress { id });
        self.dirty = true;
        Ok(())
    }

    /// Replace a generator's upgrade levels
    pub fn set_upgrade_levels(&mut self, id: GeneratorId, levels: UpgradeLevels) -> Result<()> {
        let generator = self.get_mut(id)?;
        generator.upgrades = levels;
        generator.revision += 1;
        self.dirty = true;
        Ok(())
    }

    /// Apply an economy-layer change to the aggregate state
    pub fn update_user<F: FnOnce(&mut UserAggregateState)>(&mut self, f: F) {
        f(&mut self.user);
        self.aggregate_revision += 1;
        self.dirty = true;
    }

    /// Add energy from an exchange action
    pub fn grant_energy(&mut self, amount: BigValue) -> BigValue {
        self.update_user(|user| user.energy = user.energy.add(amount));
        self.user.energy
    }

    /// Remove energy, clamping at zero
    pub fn spend_energy(&mut self, amount: BigValue) -> BigValue {
        self.update_user(|user| user.energy = user.energy.subtract(amount));
        self.user.energy
    }

    // ------------------------------------------------------------------
    // Patches
    // ------------------------------------------------------------------

    /// Merge authoritative generator state if it is not older than ours
    pub fn apply_entity_patch(&mut self, patch: &EntityPatch) -> PatchOutcome {
        let Some(generator) = self.generators.get_mut(&patch.id) else {
            debug!(generator = %patch.id, "patch for removed generator dropped");
            return PatchOutcome::Dropped;
        };
        if patch.revision < generator.revision {
            debug!(
                generator = %patch.id,
                patch_revision = patch.revision,
                revision = generator.revision,
                "stale generator patch ignored"
            );
            return PatchOutcome::Stale;
        }
        generator.state = patch.state;
        generator.heat = patch.heat.max(0.0);
        generator.build_complete_at = patch.build_complete_at;
        generator.revision = patch.revision;
        self.dirty = true;
        PatchOutcome::Applied
    }

    /// Merge authoritative aggregate fields
    ///
    /// Energy only applies when no local energy write happened since the
    /// patch's revision. Money and bonuses apply from any patch that is not
    /// older than the last merged one.
    pub fn apply_aggregate_patch(&mut self, patch: &AggregatePatch) -> PatchOutcome {
        if patch.revision < self.last_aggregate_patch {
            debug!(
                patch_revision = patch.revision,
                last = self.last_aggregate_patch,
                "stale aggregate patch ignored"
            );
            return PatchOutcome::Stale;
        }
        self.last_aggregate_patch = patch.revision;

        let mut applied = false;
        if let Some(money) = patch.money {
            self.user.money = money;
            applied = true;
        }
        if let Some(bonuses) = patch.bonuses {
            self.user.set_bonuses(bonuses);
            applied = true;
        }
        if let Some(energy) = patch.energy {
            if patch.revision >= self.aggregate_revision {
                self.user.energy = energy;
                self.aggregate_revision = patch.revision;
                applied = true;
            } else {
                debug!(
                    patch_revision = patch.revision,
                    revision = self.aggregate_revision,
                    "local energy is newer, keeping it"
                );
            }
        }

        if applied {
            self.dirty = true;
            PatchOutcome::Applied
        } else {
            PatchOutcome::Stale
        }
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        mem::take(&mut self.events)
    }

    pub fn drain_commands(&mut self) -> Vec<Cmd> {
        mem::take(&mut self.commands)
    }

    /// Whether state changed since the last `take_dirty`
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        mem::replace(&mut self.dirty, false)
    }
}

fn production_per_sec(generator: &GeneratorEntity, config: &SimConfig) -> BigValue {
    let factor = 1.0 + config.production_step * f64::from(generator.upgrades.production);
    generator.base_production.multiply_by_scalar(factor)
}

fn heat_rate_per_sec(generator: &GeneratorEntity, config: &SimConfig, reduction_percent: f64) -> f64 {
    let upgrades = &generator.upgrades;
    let level_factor = (1.0 - config.heat_reduction_step * f64::from(upgrades.heat_reduction))
        .max(config.min_heat_factor);
    let global_factor = (1.0 - reduction_percent).max(config.min_heat_factor);
    generator.heat_rate * level_factor * global_factor
        + config.heat_per_production_level * f64::from(upgrades.production)
}

fn tolerance_of(generator: &GeneratorEntity, config: &SimConfig, tolerance_bonus: f64) -> f64 {
    generator.base_tolerance
        + config.tolerance_per_level * f64::from(generator.upgrades.tolerance)
        + config.tolerance_per_level * tolerance_bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GeneratorMeta, MemoryCatalog};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new()
            .with(
                "coal",
                GeneratorMeta {
                    production: BigValue::from_plain(10.0),
                    heat_rate: 10.0,
                    tolerance: 100.0,
                    build_secs: 4.0,
                },
            )
            .with(
                "solar",
                GeneratorMeta {
                    production: BigValue::from_plain(1.0),
                    heat_rate: 0.0,
                    tolerance: 100.0,
                    build_secs: 0.0,
                },
            )
    }

    fn sim() -> Simulation {
        Simulation::new(SimConfig::default(), catalog())
    }

    #[test]
    fn test_place_and_complete_build() {
        let mut sim = sim();
        let id = sim.place("coal", at(0)).unwrap();
        assert!(sim.generator(id).unwrap().is_developing());
        assert_eq!(sim.remaining_build_time(id, at(1)).unwrap(), 3.0);
        assert_eq!(sim.build_progress(id, at(2)).unwrap(), 0.5);

        let report = sim.tick_with_delta(at(2), 1.0);
        assert!(report.completed.is_empty());
        assert!(report.gained.is_zero());

        let report = sim.tick_with_delta(at(4), 1.0);
        assert_eq!(report.completed, vec![id]);
        assert_eq!(report.cmd, Cmd::RefreshProgress { id });
        // Completes and produces within the same tick
        assert_eq!(report.gained.to_plain(), 10.0);
        assert_eq!(sim.user().energy.to_plain(), 10.0);

        let events = sim.drain_events();
        assert!(matches!(events[0], SimEvent::Placed { .. }));
        assert_eq!(events[1], SimEvent::BuildCompleted { id });
        assert_eq!(sim.drain_commands(), vec![Cmd::RefreshProgress { id }]);
        assert!(sim.drain_commands().is_empty());
    }

    #[test]
    fn test_default_build_duration() {
        let mut sim = sim();
        let id = sim.place("solar", at(0)).unwrap();
        assert_eq!(sim.generator(id).unwrap().build_complete_at, Some(at(2)));
    }

    #[test]
    fn test_place_errors() {
        let mut sim = sim();
        assert_eq!(
            sim.place("fusion", at(0)),
            Err(Error::UnknownType(TypeRef::from("fusion")))
        );

        for _ in 0..10 {
            sim.place("solar", at(0)).unwrap();
        }
        assert_eq!(
            sim.place("solar", at(0)),
            Err(Error::CapacityReached { limit: 10 })
        );

        sim.update_user(|user| user.max_generators_bonus = 1);
        assert!(sim.place("solar", at(0)).is_ok());
        assert_eq!(sim.generator_count(), 11);
    }

    #[test]
    fn test_pause_resume() {
        let mut sim = sim();
        let id = sim.place("solar", at(0)).unwrap();
        assert!(matches!(
            sim.pause(id),
            Err(Error::InvalidTransition { from: GeneratorState::Building, .. })
        ));

        sim.skip_build(id).unwrap();
        sim.pause(id).unwrap();
        assert_eq!(sim.generator(id).unwrap().state, GeneratorState::Paused);
        assert!(sim.production_rate().is_zero());

        sim.resume(id).unwrap();
        assert_eq!(sim.production_rate().to_plain(), 1.0);
        assert!(sim.resume(id).is_err());
        assert_eq!(sim.pause(GeneratorId(99)), Err(Error::GeneratorNotFound(GeneratorId(99))));
    }

    #[test]
    fn test_heat_and_tolerance_modifiers() {
        let mut sim = sim();
        let id = sim.place("coal", at(0)).unwrap();
        sim.set_upgrade_levels(
            id,
            UpgradeLevels {
                production: 2,
                heat_reduction: 5,
                tolerance: 3,
            },
        )
        .unwrap();
        sim.update_user(|user| {
            user.tolerance_bonus = 2;
            user.heat_reduction_percent = 0.5;
        });

        // 10 * 0.5 * 0.5 + 0.5 * 2
        assert_eq!(sim.effective_heat_rate(id).unwrap(), 3.5);
        assert_eq!(sim.effective_tolerance(id).unwrap(), 150.0);

        sim.update_user(|user| user.heat_reduction_percent = 1.0);
        sim.set_upgrade_levels(
            id,
            UpgradeLevels {
                heat_reduction: 20,
                ..Default::default()
            },
        )
        .unwrap();
        // Both factors floor at 0.1
        assert!((sim.effective_heat_rate(id).unwrap() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_type_degrades_and_cools() {
        let mut sim = sim();
        let id = sim.place("coal", at(0)).unwrap();
        sim.skip_build(id).unwrap();
        sim.drain_events();
        sim.set_catalog(MemoryCatalog::new());

        let report = sim.tick_with_delta(at(1), 1.0);
        assert_eq!(report.degraded, vec![id]);
        assert!(report.gained.is_zero());
        assert!(sim.generator(id).unwrap().degraded);

        // Reported once
        sim.tick_with_delta(at(2), 1.0);
        let degraded = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::Degraded { .. }))
            .count();
        assert_eq!(degraded, 1);

        sim.set_catalog(catalog());
        sim.tick_with_delta(at(3), 1.0);
        assert!(!sim.generator(id).unwrap().degraded);
    }

    #[test]
    fn test_other_generators_continue_after_degraded_one() {
        let mut sim = sim();
        sim.insert(GeneratorEntity {
            type_ref: TypeRef::from("missing"),
            state: GeneratorState::Building,
            heat: 3.0,
            build_complete_at: Some(at(100)),
            ..running("coal", 7)
        })
        .unwrap();
        sim.insert(running("solar", 8)).unwrap();

        let report = sim.tick_with_delta(at(0), 1.0);
        assert_eq!(report.degraded, vec![GeneratorId(7)]);
        assert_eq!(report.gained.to_plain(), 1.0);
        assert_eq!(sim.heat(GeneratorId(7)).unwrap(), 2.0);
    }

    fn running(type_ref: &str, id: u64) -> GeneratorEntity {
        let meta = catalog().generator_meta(&TypeRef::from(type_ref)).unwrap();
        let mut generator = GeneratorEntity::from_meta(GeneratorId(id), type_ref, &meta, 4.0, at(0));
        generator.state = GeneratorState::Running;
        generator.build_complete_at = None;
        generator
    }

    #[test]
    fn test_insert_rejects_duplicates_and_advances_ids() {
        let mut sim = sim();
        sim.insert(running("solar", 5)).unwrap();
        assert_eq!(
            sim.insert(running("solar", 5)),
            Err(Error::DuplicateGenerator(GeneratorId(5)))
        );
        assert_eq!(sim.place("solar", at(0)).unwrap(), GeneratorId(6));
    }

    #[test]
    fn test_overload_emits_report() {
        let mut sim = sim();
        sim.insert(running("coal", 1)).unwrap();
        let report = sim.tick_with_delta(at(0), 11.0);
        assert_eq!(report.overloaded, vec![GeneratorId(1)]);

        let generator = sim.generator(GeneratorId(1)).unwrap();
        assert!(generator.is_developing());
        match report.cmd {
            Cmd::ReportOverload(ref overload) => {
                assert_eq!(overload.heat, 110.0);
                assert_eq!(overload.revision, generator.revision);
                assert_eq!(overload.build_complete_at, Some(at(4)));
            }
            ref other => panic!("Expected overload report, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_tolerance_never_overloads() {
        let mut sim = sim();
        let mut generator = running("coal", 1);
        generator.base_tolerance = 0.0;
        sim.insert(generator).unwrap();
        let report = sim.tick_with_delta(at(0), 50.0);
        assert!(report.overloaded.is_empty());
        assert_eq!(sim.heat(GeneratorId(1)).unwrap(), 500.0);
    }

    #[test]
    fn test_negative_heat_rate_floors_at_zero() {
        let mut sim = sim();
        let mut generator = running("coal", 1);
        generator.heat_rate = -5.0;
        generator.heat = 2.0;
        sim.insert(generator).unwrap();

        sim.tick_with_delta(at(0), 1.0);
        assert_eq!(sim.heat(GeneratorId(1)).unwrap(), 0.0);
        sim.tick_with_delta(at(1), 1.0);
        assert_eq!(sim.heat(GeneratorId(1)).unwrap(), 0.0);
    }

    #[test]
    fn test_huge_rebuild_duration_does_not_abort_tick() {
        let mut sim = sim();
        let mut slow = running("coal", 1);
        slow.build_duration_secs = 1e13;
        sim.insert(slow).unwrap();
        sim.insert(running("solar", 2)).unwrap();

        let report = sim.tick_with_delta(at(0), 11.0);
        assert_eq!(report.overloaded, vec![GeneratorId(1)]);
        assert_eq!(report.gained.to_plain(), 121.0);
        let slow = sim.generator(GeneratorId(1)).unwrap();
        assert_eq!(slow.build_complete_at, Some(DateTime::<Utc>::MAX_UTC));
        assert!(!slow.build_finished(at(1_000_000)));

        sim.set_catalog(catalog().with(
            "glacier",
            GeneratorMeta {
                production: BigValue::from_plain(1.0),
                heat_rate: 0.0,
                tolerance: 100.0,
                build_secs: 1e13,
            },
        ));
        let id = sim.place("glacier", at(20)).unwrap();
        assert!(sim.remaining_build_time(id, at(20)).unwrap() > 1e12);
    }

    #[test]
    fn test_energy_exchange_clamps() {
        let mut sim = sim();
        sim.grant_energy(BigValue::from_plain(50.0));
        assert_eq!(sim.spend_energy(BigValue::from_plain(20.0)).to_plain(), 30.0);
        assert!(sim.spend_energy(BigValue::from_plain(100.0)).is_zero());
    }

    #[test]
    fn test_entity_patch_is_monotonic() {
        let mut sim = sim();
        sim.insert(running("coal", 1)).unwrap();
        sim.tick_with_delta(at(0), 11.0);
        let revision = sim.generator(GeneratorId(1)).unwrap().revision;

        // Build completes locally before the remote answer arrives
        sim.tick_with_delta(at(5), 1.0);
        assert!(sim.generator(GeneratorId(1)).unwrap().is_running());

        let late = EntityPatch {
            id: GeneratorId(1),
            revision,
            state: GeneratorState::Building,
            heat: 0.0,
            build_complete_at: Some(at(4)),
        };
        assert_eq!(sim.apply_entity_patch(&late), PatchOutcome::Stale);
        assert!(sim.generator(GeneratorId(1)).unwrap().is_running());

        let current = EntityPatch {
            revision: sim.generator(GeneratorId(1)).unwrap().revision,
            state: GeneratorState::Running,
            heat: 4.0,
            build_complete_at: None,
            ..late.clone()
        };
        assert_eq!(sim.apply_entity_patch(&current), PatchOutcome::Applied);
        assert_eq!(sim.heat(GeneratorId(1)).unwrap(), 4.0);

        // Heat accrued since the patch was taken is newer than the patch
        sim.tick_with_delta(at(6), 1.0);
        assert_eq!(sim.heat(GeneratorId(1)).unwrap(), 14.0);
        assert_eq!(sim.apply_entity_patch(&current), PatchOutcome::Stale);
        assert_eq!(sim.heat(GeneratorId(1)).unwrap(), 14.0);

        sim.demolish(GeneratorId(1)).unwrap();
        assert_eq!(sim.apply_entity_patch(&current), PatchOutcome::Dropped);
    }

    #[test]
    fn test_aggregate_patch() {
        let mut sim = sim();
        sim.grant_energy(BigValue::from_plain(10.0));
        let revision = sim.aggregate_revision();

        let patch = AggregatePatch {
            revision,
            energy: Some(BigValue::from_plain(12.0)),
            money: Some(BigValue::from_plain(3.0)),
            bonuses: None,
        };
        assert_eq!(sim.apply_aggregate_patch(&patch), PatchOutcome::Applied);
        assert_eq!(sim.user().energy.to_plain(), 12.0);
        assert_eq!(sim.user().money.to_plain(), 3.0);

        // Local energy moves on, money still merges
        sim.grant_energy(BigValue::from_plain(1.0));
        let money_only = AggregatePatch {
            money: Some(BigValue::from_plain(7.0)),
            ..patch.clone()
        };
        assert_eq!(sim.apply_aggregate_patch(&money_only), PatchOutcome::Applied);
        assert_eq!(sim.user().energy.to_plain(), 13.0);
        assert_eq!(sim.user().money.to_plain(), 7.0);

        let older = AggregatePatch {
            revision: revision - 1,
            ..patch
        };
        assert_eq!(sim.apply_aggregate_patch(&older), PatchOutcome::Stale);
        assert_eq!(sim.user().money.to_plain(), 7.0);
    }

    #[test]
    fn test_dirty_flag() {
        let mut sim = sim();
        assert!(!sim.is_dirty());
        sim.place("solar", at(0)).unwrap();
        assert!(sim.take_dirty());
        assert!(!sim.is_dirty());
        sim.tick_with_delta(at(1), 1.0);
        assert!(sim.is_dirty());
    }

    #[test]
    fn test_tick_uses_clock_delta() {
        let mut sim = sim();
        sim.insert(running("solar", 1)).unwrap();
        assert!(sim.is_due(at(0)));

        let first = sim.tick(at(0));
        assert_eq!(first.tick, 1);
        assert_eq!(first.delta, 0.5);
        assert_eq!(first.gained.to_wire(), (500, 0));
        assert!(!sim.is_due(at(0)));

        let second = sim.tick(at(3));
        assert_eq!(second.delta, 3.0);
        assert_eq!(sim.current_tick(), 2);
        assert_eq!(sim.user().energy.to_wire(), (3_500, 0));
    }
}
