//! Outbound queue for simulator commands awaiting the persistence layer
//!
//! Overloads are applied locally first. The report is queued here with a
//! ticket, delivered later, and whatever the collaborator answers is merged
//! back through the simulator's monotonic patch rules.

use crate::error::{Error, Result};
use crate::persistence::Persistence;
use ampere_core::Tick;
use ampere_sim::{Cmd, OverloadReport, PatchOutcome, Simulation};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Handle for one in-flight command
pub type Ticket = u64;

/// An entry awaiting completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InFlight {
    pub ticket: Ticket,
    /// Tick the command was queued at
    pub tick: Tick,
    pub report: OverloadReport,
}

/// Tally of one delivery pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub applied: usize,
    pub stale: usize,
    pub dropped: usize,
    /// Collaborator calls that failed (logged, not retried)
    pub failed: usize,
}

/// Bounded queue of dispatched commands
#[derive(Debug)]
pub struct Outbox {
    in_flight: VecDeque<InFlight>,
    capacity: usize,
    next_ticket: Ticket,
}

impl Outbox {
    /// Create an outbox holding at most `capacity` commands
    pub fn new(capacity: usize) -> Self {
        Self {
            in_flight: VecDeque::with_capacity(capacity),
            capacity,
            next_ticket: 1,
        }
    }

    /// Queue an overload report
    ///
    /// Returns `Err` if the outbox is full.
    pub fn dispatch(&mut self, tick: Tick, report: OverloadReport) -> Result<Ticket> {
        if self.in_flight.len() >= self.capacity {
            return Err(Error::OutboxFull {
                capacity: self.capacity,
            });
        }
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight.push_back(InFlight {
            ticket,
            tick,
            report,
        });
        Ok(ticket)
    }

    /// Take the simulator's queued commands
    ///
    /// Overload reports are queued for delivery. Everything else is returned
    /// for the display layer. Reports that do not fit are logged and dropped;
    /// the local reset already happened.
    pub fn collect(&mut self, sim: &mut Simulation) -> Vec<Cmd> {
        let tick = sim.current_tick();
        let mut passthrough = Vec::new();
        for cmd in sim.drain_commands() {
            for leaf in cmd.iter() {
                match leaf {
                    Cmd::ReportOverload(report) => {
                        if let Err(err) = self.dispatch(tick, report.clone()) {
                            warn!(generator = %report.id, error = %err, "overload report dropped");
                        }
                    }
                    other => passthrough.push(other.clone()),
                }
            }
        }
        passthrough
    }

    /// Remove a completed entry
    pub fn complete(&mut self, ticket: Ticket) -> Result<InFlight> {
        let index = self
            .in_flight
            .iter()
            .position(|entry| entry.ticket == ticket)
            .ok_or(Error::UnknownTicket(ticket))?;
        self.in_flight
            .remove(index)
            .ok_or(Error::UnknownTicket(ticket))
    }

    /// Deliver every queued report and merge the answers
    pub fn deliver(&mut self, persistence: &mut dyn Persistence, sim: &mut Simulation) -> DeliveryStats {
        let mut stats = DeliveryStats::default();
        while let Some(entry) = self.in_flight.pop_front() {
            match persistence.report_overload(&entry.report) {
                Ok(Some(patch)) => match sim.apply_entity_patch(&patch) {
                    PatchOutcome::Applied => stats.applied += 1,
                    PatchOutcome::Stale => stats.stale += 1,
                    PatchOutcome::Dropped => stats.dropped += 1,
                },
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        generator = %entry.report.id,
                        ticket = entry.ticket,
                        error = %err,
                        "overload report failed"
                    );
                    stats.failed += 1;
                }
            }
        }
        debug!(?stats, "outbox delivered");
        stats
    }

    /// Entries awaiting completion, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &InFlight> {
        self.in_flight.iter()
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.in_flight.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryPersistence;
    use ampere_core::{BigValue, GeneratorId};
    use ampere_sim::{
        GeneratorEntity, GeneratorMeta, GeneratorState, MemoryCatalog, SimConfig,
    };
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn hot_sim() -> Simulation {
        let meta = GeneratorMeta {
            production: BigValue::from_plain(1.0),
            heat_rate: 10.0,
            tolerance: 100.0,
            build_secs: 5.0,
        };
        let mut sim = Simulation::new(SimConfig::default(), MemoryCatalog::new().with("coal", meta));
        let mut generator = GeneratorEntity::from_meta(GeneratorId(1), "coal", &meta, 5.0, at(0));
        generator.state = GeneratorState::Running;
        generator.build_complete_at = None;
        sim.insert(generator).unwrap();
        sim
    }

    fn report(id: u64) -> OverloadReport {
        OverloadReport {
            id: GeneratorId(id),
            revision: 1,
            heat: 101.0,
            tolerance: 100.0,
            build_complete_at: None,
            at: at(0),
        }
    }

    #[test]
    fn test_dispatch_and_complete() {
        let mut outbox = Outbox::new(2);
        let first = outbox.dispatch(1, report(1)).unwrap();
        let second = outbox.dispatch(1, report(2)).unwrap();
        assert!(outbox.is_full());
        assert!(matches!(
            outbox.dispatch(2, report(3)),
            Err(Error::OutboxFull { capacity: 2 })
        ));

        assert_eq!(outbox.complete(second).unwrap().report.id, GeneratorId(2));
        assert!(matches!(outbox.complete(second), Err(Error::UnknownTicket(_))));
        assert_eq!(outbox.pending().next().unwrap().ticket, first);
    }

    #[test]
    fn test_collect_and_deliver() {
        let mut sim = hot_sim();
        sim.tick_with_delta(at(11), 11.0);

        let mut outbox = Outbox::new(8);
        let passthrough = outbox.collect(&mut sim);
        assert!(passthrough.is_empty());
        assert_eq!(outbox.len(), 1);

        let mut persistence = MemoryPersistence::new();
        let stats = outbox.deliver(&mut persistence, &mut sim);
        assert_eq!(stats.applied, 1);
        assert!(outbox.is_empty());
        assert!(sim.generator(GeneratorId(1)).unwrap().is_developing());
    }

    #[test]
    fn test_late_answer_is_stale() {
        let mut sim = hot_sim();
        sim.tick_with_delta(at(11), 11.0);
        let mut outbox = Outbox::new(8);
        outbox.collect(&mut sim);

        // Rebuild finishes before the report is delivered
        sim.tick_with_delta(at(16), 1.0);
        let passthrough = outbox.collect(&mut sim);
        assert_eq!(passthrough, vec![Cmd::RefreshProgress { id: GeneratorId(1) }]);

        let stats = outbox.deliver(&mut MemoryPersistence::new(), &mut sim);
        assert_eq!(stats.stale, 1);
        assert!(sim.generator(GeneratorId(1)).unwrap().is_running());
    }

    #[test]
    fn test_failure_keeps_local_state() {
        let mut sim = hot_sim();
        sim.tick_with_delta(at(11), 11.0);
        let mut outbox = Outbox::new(8);
        outbox.collect(&mut sim);

        let mut persistence = MemoryPersistence::new();
        persistence.fail_next();
        let stats = outbox.deliver(&mut persistence, &mut sim);
        assert_eq!(stats.failed, 1);
        assert!(outbox.is_empty());
        assert!(sim.generator(GeneratorId(1)).unwrap().is_developing());
    }

    #[test]
    fn test_demolished_before_delivery() {
        let mut sim = hot_sim();
        sim.tick_with_delta(at(11), 11.0);
        let mut outbox = Outbox::new(8);
        outbox.collect(&mut sim);
        sim.demolish(GeneratorId(1)).unwrap();

        let stats = outbox.deliver(&mut MemoryPersistence::new(), &mut sim);
        assert_eq!(stats.dropped, 1);
    }
}
