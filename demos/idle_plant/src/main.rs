//! Idle Plant Example
//!
//! Demonstrates ampere with a small power plant: generators are built, run,
//! overheat and rebuild while an autosave loop persists and reconciles state.
//! Time is simulated, so the run is deterministic.

use ampere_core::{BigValue, GeneratorId};
use ampere_script::Loader;
use ampere_sim::{SimEvent, Simulation, UpgradeLevels};
use ampere_sync::{AutosaveScheduler, MemoryPersistence, Outbox, Persistence, Reconciler, SyncConfig};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

const TICKS: i64 = 60;

fn data_dir() -> PathBuf {
    std::env::var_os("AMPERE_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Ampere Idle Plant Example ===\n");

    let mut loader = Loader::new();
    if let Err(err) = loader.load_directory(data_dir()) {
        eprintln!("Failed to load game data: {}", err);
        std::process::exit(1);
    }
    let defs = loader.finish();

    println!("Generator types:");
    for def in defs.generators() {
        println!(
            "  {:<16} cost {:>6}  produces {:>6}/s  heat {:>5.1}/s  tolerance {}",
            def.name, def.cost, def.production, def.heat_rate, def.tolerance
        );
    }
    println!();

    let config = defs.config.clone();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);
    let mut sim = Simulation::new(config, defs);

    let mut placed: Vec<GeneratorId> = Vec::new();
    for type_ref in ["solar", "solar", "coal"] {
        match sim.place(type_ref, start) {
            Ok(id) => placed.push(id),
            Err(err) => warn!(type_ref, error = %err, "placement failed"),
        }
    }
    if let Some(&coal) = placed.last() {
        let levels = UpgradeLevels {
            production: 2,
            ..Default::default()
        };
        if let Err(err) = sim.set_upgrade_levels(coal, levels) {
            warn!(error = %err, "upgrade failed");
        }
    }
    sim.update_user(|user| {
        user.rebirth_count = 1;
        user.production_bonus = 2;
    });

    let sync = SyncConfig::default();
    let mut scheduler = AutosaveScheduler::new(sync.autosave_interval_ms);
    let mut outbox = Outbox::new(sync.max_in_flight);
    let mut reconciler = Reconciler::new(sync.drift_tolerance);
    let mut persistence = MemoryPersistence::new();

    println!("Running {} ticks (multiplier x{:.1})...\n", TICKS, sim.aggregate_multiplier().factor());

    for second in 0..TICKS {
        let now = start + Duration::seconds(second);
        let report = sim.tick(now);

        outbox.collect(&mut sim);
        outbox.deliver(&mut persistence, &mut sim);
        autosave(&mut scheduler, &mut persistence, &mut reconciler, &mut sim, now);

        for event in sim.drain_events() {
            describe(&event, second);
        }

        if second % 10 == 9 {
            print_status(&sim, now, report.gained);
        }
    }

    if let Some(&solar) = placed.first() {
        if sim.pause(solar).is_ok() {
            println!("\nPaused {} for maintenance", solar);
        }
    }
    let spent = sim.spend_energy(BigValue::from_plain(100.0));
    println!("Bought an upgrade for 100 energy, {} left", spent);

    match persistence.last_snapshot() {
        Ok(Some(snapshot)) => println!(
            "\nLast autosave: version {} at {} ({} saves, {} overloads reported)",
            snapshot.version,
            snapshot.taken_at.format("%H:%M:%S"),
            persistence.save_count(),
            persistence.overloads().len()
        ),
        Ok(None) => println!("\nNo autosave yet"),
        Err(err) => eprintln!("Autosave cache unreadable: {}", err),
    }

    println!("\n=== Example Complete ===");
}

fn autosave(
    scheduler: &mut AutosaveScheduler,
    persistence: &mut MemoryPersistence,
    reconciler: &mut Reconciler,
    sim: &mut Simulation,
    now: DateTime<Utc>,
) {
    let Some(snapshot) = scheduler.poll(sim, now) else {
        return;
    };
    match persistence.save(&snapshot) {
        Ok(merged) => {
            reconciler.apply(sim, &merged);
            info!(version = snapshot.version, "autosaved");
        }
        Err(err) => warn!(error = %err, "autosave failed"),
    }
}

fn describe(event: &SimEvent, second: i64) {
    match event {
        SimEvent::BuildCompleted { id } => println!("[{:>3}s] {} finished building", second, id),
        SimEvent::Overloaded { id, heat, tolerance } => println!(
            "[{:>3}s] {} overloaded ({:.1} > {:.1}), rebuilding",
            second, id, heat, tolerance
        ),
        SimEvent::Degraded { id, type_ref } => {
            println!("[{:>3}s] {} has unknown type {}", second, id, type_ref)
        }
        _ => {}
    }
}

fn print_status(sim: &Simulation, now: DateTime<Utc>, gained: BigValue) {
    println!(
        "  tick {:>3}: energy {:>8}  (+{} this tick, {}/s)",
        sim.current_tick(),
        sim.user().energy,
        gained,
        sim.production_rate()
    );
    for generator in sim.generators() {
        let tolerance = sim.effective_tolerance(generator.id).unwrap_or_default();
        let remaining = sim.remaining_build_time(generator.id, now).unwrap_or_default();
        println!(
            "    {:<14} {:<8} heat {:>5.1}/{:<5.1} build {:>4.1}s",
            generator.id.to_string(),
            generator.state.to_string(),
            generator.heat,
            tolerance,
            remaining
        );
    }
}
