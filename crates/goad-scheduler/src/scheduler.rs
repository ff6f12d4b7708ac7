//! The main tick loop. Orchestrates the VU pool, the event queue, the
//! ledger, the PRNG, and a protocol handler into the five-step loop the
//! governing design fixes: timed events, cohort activation, handler poll,
//! tick advance, periodic flush.

use std::collections::HashMap;
use std::io::Write;

use goad_core::error::QueueError;
use goad_core::event_queue::EventQueue;
use goad_core::memory_budget::MemoryBudget;
use goad_core::pool::{Handle as VuHandle, Pool};
use goad_core::prng::Prng;
use goad_core::vu::{Vu, VuState};
use goad_ledger::{
    ConnEstablishedPayload, ErrorPayload, Ledger, LedgerError, LedgerHeader, Record, RecordKind,
    RequestIssuedPayload, ResponseReceivedPayload,
};
use goad_protocol::{Completion, ConnectionId, Method, Outcome, ProtocolHandler, Request, Target};

use crate::config::SchedulerConfig;
use crate::error::{ConfigError, ResourceError, SchedulerError};
use crate::events::ScheduledEvent;
use crate::scenario::{Protocol as ScenarioProtocol, ScheduleKind, Scenario};

fn method_bytes(method: Method) -> [u8; 8] {
    let mut out = [0u8; 8];
    let s = method.as_str().as_bytes();
    let len = s.len().min(8);
    out[..len].copy_from_slice(&s[..len]);
    out
}

/// FNV-1a, used only to compress a request path into the ledger's
/// fixed-width `url_hash` field. Not a security boundary.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

struct InFlight {
    vu_id: u32,
}

/// Orchestrates one run. `H` is fixed at construction time — there is no
/// dynamic protocol registry, keeping the handler a compile-time type
/// parameter rather than a runtime-loaded plugin.
pub struct Scheduler<H: ProtocolHandler> {
    config: SchedulerConfig,
    scenario: Scenario,
    handler: H,
    vus: Pool<Vu>,
    vu_handles: HashMap<u32, VuHandle>,
    queue: EventQueue<ScheduledEvent>,
    ledger: Ledger,
    prng: Prng,
    budget: MemoryBudget,
    current_tick: u64,
    connections: HashMap<u32, ConnectionId>,
    pending_requests: HashMap<u64, InFlight>,
    next_request_sequence: u64,
    activation_paused: bool,
}

impl<H: ProtocolHandler> Scheduler<H> {
    pub fn new(
        config: SchedulerConfig,
        scenario: Scenario,
        handler: H,
        start_wall_ns: u64,
    ) -> Result<Self, SchedulerError> {
        config.validate()?;
        if scenario.total_weight() == 0 {
            return Err(ConfigError::AllWeightsZero.into());
        }
        if scenario.runtime.vus > config.max_vus {
            return Err(ConfigError::InvalidScenario(format!(
                "scenario requests {} vus but max_vus is {}",
                scenario.runtime.vus, config.max_vus
            ))
            .into());
        }

        let ledger_bytes = config.max_events * goad_ledger::RECORD_SIZE;
        let vu_bytes = config.max_vus as usize * std::mem::size_of::<Vu>();
        let queue_bytes = config.event_queue_capacity * std::mem::size_of::<ScheduledEvent>();
        let total_budget = ledger_bytes + vu_bytes + queue_bytes;
        let mut budget = MemoryBudget::new(total_budget);
        budget
            .allocate(ledger_bytes.max(1))
            .map_err(|_| ConfigError::InsufficientBudget {
                needed: ledger_bytes,
                available: total_budget,
            })?;
        budget
            .allocate((vu_bytes + queue_bytes).max(1))
            .map_err(|_| ConfigError::InsufficientBudget {
                needed: vu_bytes + queue_bytes,
                available: total_budget,
            })?;

        let header = LedgerHeader {
            prng_seed: config.prng_seed,
            start_wall_ns,
            scenario_hash: scenario.scenario_hash(),
        };
        let ledger = Ledger::new(header, config.max_events);
        let queue = EventQueue::new(config.event_queue_capacity);
        let prng = Prng::new(config.prng_seed);
        let vu_pool = Pool::new(config.max_vus.max(1) as usize, Vu::new(1, 0));

        Ok(Self {
            config,
            scenario,
            handler,
            vus: vu_pool,
            vu_handles: HashMap::new(),
            queue,
            ledger,
            prng,
            budget,
            current_tick: 0,
            connections: HashMap::new(),
            pending_requests: HashMap::new(),
            next_request_sequence: 1,
            activation_paused: false,
        })
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    #[must_use]
    pub fn budget(&self) -> &MemoryBudget {
        &self.budget
    }

    fn spawn_tick_for(&self, index: u32) -> u64 {
        let vus = self.scenario.runtime.vus.max(1);
        let param = |key: &str, default: u64| -> u64 {
            self.scenario
                .schedule
                .parameters
                .iter()
                .find(|(k, _)| k == key)
                .map_or(default, |(_, v)| *v)
        };
        match self.scenario.schedule.kind {
            ScheduleKind::Constant => 0,
            ScheduleKind::Ramp => {
                let ramp_ticks = param("ramp_ticks", u64::from(self.scenario.runtime.duration_ticks) / 2);
                u64::from(index) * ramp_ticks / u64::from(vus)
            }
            ScheduleKind::Spike => param("at_tick", 0),
            ScheduleKind::Steps => {
                if self.scenario.schedule.parameters.is_empty() {
                    0
                } else {
                    let len = self.scenario.schedule.parameters.len();
                    self.scenario.schedule.parameters[index as usize % len].1
                }
            }
        }
    }

    /// Run to completion, writing the finalized ledger to `sink`.
    /// `end_wall_ns` is informational only — it never influences control
    /// flow or record contents.
    pub fn run<W: Write>(&mut self, sink: &mut W, end_wall_ns: u64) -> Result<(), SchedulerError> {
        for index in 0..self.scenario.runtime.vus {
            let spawn_tick = self.spawn_tick_for(index);
            self.queue
                .push(spawn_tick, ScheduledEvent::Spawn { vu_id: index + 1 })?;
        }

        loop {
            self.process_timed_events()?;
            self.activate_ready_cohorts()?;
            self.poll_handler()?;
            self.current_tick += 1;

            if self.config.flush_interval_ticks > 0
                && self.current_tick % self.config.flush_interval_ticks == 0
            {
                self.ledger.flush()?;
            }

            let all_complete =
                !self.vus.is_empty() && self.vus.iter().all(|(_, vu)| vu.is_complete());
            if all_complete || self.current_tick >= self.config.duration_ticks {
                break;
            }
        }

        self.cancel_remaining_requests();
        self.ledger.flush()?;
        self.ledger.finalize(sink, end_wall_ns)?;
        Ok(())
    }

    fn process_timed_events(&mut self) -> Result<(), SchedulerError> {
        loop {
            match self.queue.peek() {
                Ok((fire_tick, _)) if fire_tick <= self.current_tick => {
                    let (_, event) = self.queue.pop().expect("peek just confirmed an entry");
                    self.dispatch_event(event)?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn dispatch_event(&mut self, event: ScheduledEvent) -> Result<(), SchedulerError> {
        match event {
            ScheduledEvent::Spawn { vu_id } => {
                let vu = Vu::new(vu_id, self.current_tick);
                self.append(vu_id, RecordKind::VuSpawned, goad_ledger::Payload::zeroed())?;
                let handle = self
                    .vus
                    .acquire()
                    .map_err(|_| ResourceError::MemoryBudgetExceeded)?;
                *self.vus.get_mut(handle) = vu;
                self.vu_handles.insert(vu_id, handle);
                self.transition_to_ready(vu_id)?;
            }
            ScheduledEvent::Timeout { vu_id, request_id } => {
                self.fire_timeout(vu_id, request_id)?;
            }
            ScheduledEvent::Retry { vu_id } => {
                self.try_issue_request(vu_id)?;
            }
        }
        Ok(())
    }

    fn vu_index(&self, vu_id: u32) -> Option<VuHandle> {
        self.vu_handles.get(&vu_id).copied()
    }

    fn transition_to_ready(&mut self, vu_id: u32) -> Result<(), SchedulerError> {
        let tick = self.current_tick;
        let idx = self.vu_index(vu_id).expect("vu must exist");
        self.vus.get_mut(idx).transition_to(VuState::Ready, tick);
        self.append(vu_id, RecordKind::VuReady, goad_ledger::Payload::zeroed())
    }

    /// Appends a record, honoring the ledger-saturated backpressure policy:
    /// on first `LogFull`, attempt a flush and retry once; if it is still
    /// full, try to append a final `error_resource_exhausted` record
    /// (best-effort — there may be no space left for it either) before
    /// aborting the run.
    fn append(
        &mut self,
        vu_id: u32,
        kind: RecordKind,
        payload: goad_ledger::Payload,
    ) -> Result<(), SchedulerError> {
        let record = Record::new(self.current_tick, vu_id, kind, payload);
        match self.ledger.append(record) {
            Ok(()) => Ok(()),
            Err(LedgerError::LogFull { .. }) => {
                self.ledger.flush()?;
                match self.ledger.append(record) {
                    Ok(()) => Ok(()),
                    Err(LedgerError::LogFull { .. }) => {
                        let exhausted = Record::new(
                            self.current_tick,
                            0,
                            RecordKind::ErrorResourceExhausted,
                            ErrorPayload::new(0, "event ledger saturated").encode(),
                        );
                        let _ = self.ledger.append(exhausted);
                        Err(ResourceError::EventLogFull.into())
                    }
                    Err(other) => Err(other.into()),
                }
            }
            Err(other) => Err(other.into()),
        }
    }

    fn fire_timeout(&mut self, vu_id: u32, request_id: u32) -> Result<(), SchedulerError> {
        let Some(idx) = self.vu_index(vu_id) else {
            return Ok(());
        };
        if self.vus.get(idx).pending_request_id != u64::from(request_id) {
            // Decision #4: response already arrived, drop silently.
            return Ok(());
        }

        self.pending_requests.remove(&u64::from(request_id));
        self.append(vu_id, RecordKind::RequestTimeout, goad_ledger::Payload::zeroed())?;

        self.vus.get_mut(idx).pending_request_id = 0;
        self.vus.get_mut(idx).timeout_tick = 0;
        self.vus.get_mut(idx).timeouts_on_step += 1;

        let tick = self.current_tick;
        if self.vus.get(idx).timeouts_on_step >= self.config.max_timeouts_per_step {
            self.vus.get_mut(idx).transition_to(VuState::Complete, tick);
            self.close_connection(vu_id)?;
            self.append(vu_id, RecordKind::VuComplete, goad_ledger::Payload::zeroed())?;
        } else {
            self.vus.get_mut(idx).transition_to(VuState::Ready, tick);
            self.append(vu_id, RecordKind::VuReady, goad_ledger::Payload::zeroed())?;
        }
        Ok(())
    }

    fn activate_ready_cohorts(&mut self) -> Result<(), SchedulerError> {
        if self.activation_paused {
            if self.queue.len() < self.config.event_queue_capacity / 2 {
                self.activation_paused = false;
            } else {
                return Ok(());
            }
        }

        let mut ready_ids: Vec<u32> = self
            .vus
            .iter()
            .filter(|(_, v)| v.can_execute())
            .map(|(_, v)| v.id)
            .collect();
        ready_ids.sort_unstable_by_key(|&id| {
            let idx = self.vu_index(id).expect("vu must exist");
            (self.vus.get(idx).scenario_step, id)
        });

        for vu_id in ready_ids {
            if self.queue.len() >= self.config.event_queue_capacity {
                self.append(
                    0,
                    RecordKind::BackpressureWarning,
                    goad_ledger::Payload::zeroed(),
                )?;
                self.activation_paused = true;
                break;
            }
            self.try_issue_request(vu_id)?;
        }
        Ok(())
    }

    fn select_request(&mut self) -> usize {
        let total = self.scenario.total_weight();
        let draw = self
            .prng
            .range(total)
            .expect("total_weight is validated non-zero at construction");
        let mut cumulative: u64 = 0;
        for (index, request) in self.scenario.requests.iter().enumerate() {
            cumulative += u64::from(request.weight);
            if draw < cumulative {
                return index;
            }
        }
        self.scenario.requests.len() - 1
    }

    /// `Ok(Some)` is a usable connection. `Ok(None)` covers a scheduler-side
    /// admission denial against `max_connections`, a handler-side
    /// pool-exhaustion retry, and a Network/Protocol/Timeout connect
    /// failure (recorded as a typed ledger event; the VU stays `READY` and
    /// is retried on the next cohort activation). None of these abort the
    /// run.
    fn ensure_connection(&mut self, vu_id: u32) -> Result<Option<ConnectionId>, SchedulerError> {
        if let Some(&conn_id) = self.connections.get(&vu_id) {
            return Ok(Some(conn_id));
        }
        if self.connections.len() >= self.config.max_connections as usize {
            let delay = 1 + self.prng.range(8).unwrap_or(0);
            self.queue
                .push(self.current_tick + delay, ScheduledEvent::Retry { vu_id })?;
            return Ok(None);
        }
        let target = Target {
            host: self.scenario.target.host.clone(),
            port: self.scenario.target.port,
            tls: self.scenario.target.tls,
            protocol: match self.scenario.target.protocol {
                ScenarioProtocol::Http1 => goad_protocol::Protocol::Http1,
                ScenarioProtocol::Http2 => goad_protocol::Protocol::Http2,
            },
        };
        match self.handler.connect(&target) {
            Ok(conn_id) => {
                self.connections.insert(vu_id, conn_id);
                let conn_time_ns = self.prng.next() % 1_000_000;
                let payload = ConnEstablishedPayload {
                    conn_id: conn_id.0,
                    remote_addr_hash: fnv1a(self.scenario.target.host.as_bytes()),
                    protocol: u8::from(matches!(
                        self.scenario.target.protocol,
                        ScenarioProtocol::Http2
                    )),
                    tls_flag: self.scenario.target.tls,
                    conn_time_ns,
                }
                .encode();
                self.append(vu_id, RecordKind::ConnEstablished, payload)?;
                Ok(Some(conn_id))
            }
            Err(goad_protocol::ProtocolError::ConnectionPoolExhausted) => {
                let delay = 1 + self.prng.range(8).unwrap_or(0);
                self.queue
                    .push(self.current_tick + delay, ScheduledEvent::Retry { vu_id })?;
                Ok(None)
            }
            Err(err) => {
                let payload = ErrorPayload::new(0, &err.to_string()).encode();
                self.append(vu_id, err.ledger_kind(), payload)?;
                Ok(None)
            }
        }
    }

    /// Closes a VU's open connection, if any, and records the closure.
    /// Idempotent: a VU with no tracked connection is a no-op.
    fn close_connection(&mut self, vu_id: u32) -> Result<(), SchedulerError> {
        if let Some(conn_id) = self.connections.remove(&vu_id) {
            self.handler.close(conn_id);
            self.append(vu_id, RecordKind::ConnClosed, goad_ledger::Payload::zeroed())?;
        }
        Ok(())
    }

    fn try_issue_request(&mut self, vu_id: u32) -> Result<(), SchedulerError> {
        let conn_id = match self.ensure_connection(vu_id)? {
            Some(id) => id,
            None => return Ok(()),
        };

        let spec_index = self.select_request();
        let spec = self.scenario.requests[spec_index].clone();
        let request = Request {
            method: spec.method,
            path: spec.path.clone(),
            header_count: spec.header_count,
            body_size: spec.body_size,
            timeout_ticks: if spec.timeout_ticks > 0 {
                spec.timeout_ticks
            } else {
                self.config.default_timeout_ticks
            },
        };

        match self.handler.send(conn_id, &request) {
            Ok(request_id) => {
                let sequence = self.next_request_sequence;
                self.next_request_sequence += 1;
                let payload = RequestIssuedPayload {
                    request_id: u64::from(request_id.0),
                    method: method_bytes(spec.method),
                    url_hash: fnv1a(spec.path.as_bytes()),
                    header_count: spec.header_count,
                    body_size: spec.body_size,
                }
                .encode();
                self.append(vu_id, RecordKind::RequestIssued, payload)?;

                let idx = self.vu_index(vu_id).expect("vu must exist");
                let timeout_tick = self.current_tick + request.timeout_ticks;
                self.vus.get_mut(idx).pending_request_id = u64::from(request_id.0);
                self.vus.get_mut(idx).timeout_tick = timeout_tick;
                self.vus
                    .get_mut(idx)
                    .transition_to(VuState::Executing, self.current_tick);
                self.vus
                    .get_mut(idx)
                    .transition_to(VuState::Waiting, self.current_tick);

                self.pending_requests
                    .insert(u64::from(request_id.0), InFlight { vu_id });
                let _ = sequence;
                match self
                    .queue
                    .push(timeout_tick, ScheduledEvent::Timeout { vu_id, request_id: request_id.0 })
                {
                    Ok(()) => {}
                    Err(QueueError::QueueFull { .. }) => {
                        self.append(
                            0,
                            RecordKind::BackpressureWarning,
                            goad_ledger::Payload::zeroed(),
                        )?;
                        self.activation_paused = true;
                    }
                    Err(other) => return Err(other.into()),
                }
            }
            Err(goad_protocol::ProtocolError::ConnectionPoolExhausted) => {
                let delay = 1 + self.prng.range(8).unwrap_or(0);
                self.queue
                    .push(self.current_tick + delay, ScheduledEvent::Retry { vu_id })?;
            }
            Err(err) => {
                let payload = ErrorPayload::new(0, &err.to_string()).encode();
                self.append(vu_id, err.ledger_kind(), payload)?;
            }
        }
        Ok(())
    }

    fn poll_handler(&mut self) -> Result<(), SchedulerError> {
        let mut completions: Vec<Completion> = Vec::new();
        self.handler.poll(&mut completions);

        for completion in completions {
            let request_id = u64::from(completion.request_id.0);
            let Some(in_flight) = self.pending_requests.remove(&request_id) else {
                continue;
            };
            let vu_id = in_flight.vu_id;
            let Some(idx) = self.vu_index(vu_id) else {
                continue;
            };
            if self.vus.get(idx).pending_request_id != request_id {
                continue;
            }

            match completion.outcome {
                Outcome::Response(response) => {
                    let payload = ResponseReceivedPayload {
                        request_id,
                        status_code: response.status_code,
                        header_size: response.header_size,
                        body_size: response.body_size,
                        latency_ns: response.latency_ns,
                    }
                    .encode();
                    self.append(vu_id, RecordKind::ResponseReceived, payload)?;
                }
                Outcome::Error(err) => {
                    let payload = ErrorPayload::new(request_id, &err.to_string()).encode();
                    self.append(vu_id, RecordKind::ResponseError, payload)?;
                }
            }

            self.vus.get_mut(idx).pending_request_id = 0;
            self.vus.get_mut(idx).timeout_tick = 0;
            self.vus.get_mut(idx).timeouts_on_step = 0;
            self.vus.get_mut(idx).scenario_step += 1;

            let tick = self.current_tick;
            if self.vus.get(idx).scenario_step >= self.scenario.runtime.total_steps {
                self.vus.get_mut(idx).transition_to(VuState::Complete, tick);
                self.close_connection(vu_id)?;
                self.append(vu_id, RecordKind::VuComplete, goad_ledger::Payload::zeroed())?;
            } else {
                self.vus.get_mut(idx).transition_to(VuState::Ready, tick);
                self.append(vu_id, RecordKind::VuReady, goad_ledger::Payload::zeroed())?;
            }
        }
        Ok(())
    }

    /// Run-end teardown: force any still-pending request to a timeout
    /// record, close every connection still open, and push every
    /// non-`COMPLETE` VU to `COMPLETE`.
    fn cancel_remaining_requests(&mut self) {
        let pending: Vec<(u32, u64)> = self
            .vus
            .iter()
            .filter(|(_, v)| v.pending_request_id != 0)
            .map(|(_, v)| (v.id, v.pending_request_id))
            .collect();

        for (vu_id, _request_id) in pending {
            let tick = self.current_tick;
            let idx = self.vu_index(vu_id).expect("vu must exist");
            let _ = self.append(vu_id, RecordKind::RequestTimeout, goad_ledger::Payload::zeroed());
            self.vus.get_mut(idx).pending_request_id = 0;
            self.vus.get_mut(idx).timeout_tick = 0;
            if !self.vus.get(idx).is_complete() {
                self.vus.get_mut(idx).transition_to(VuState::Complete, tick);
                let _ = self.append(vu_id, RecordKind::VuComplete, goad_ledger::Payload::zeroed());
            }
        }

        let still_open: Vec<u32> = self.connections.keys().copied().collect();
        for vu_id in still_open {
            let _ = self.close_connection(vu_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{
        Assertion, Metadata, RequestSpec, Runtime, ScheduleConfig, TargetConfig,
    };
    use goad_protocol::{ScriptedHandler, ScriptedOutcome};

    fn null_scenario(vus: u32) -> Scenario {
        Scenario {
            metadata: Metadata {
                name: "null".to_string(),
                version: "1".to_string(),
            },
            runtime: Runtime {
                duration_ticks: 10,
                vus,
                prng_seed: 1,
                total_steps: 1,
            },
            target: TargetConfig {
                host: "example.test".to_string(),
                port: 80,
                tls: false,
                protocol: ScenarioProtocol::Http1,
            },
            requests: vec![RequestSpec {
                name: "home".to_string(),
                method: Method::Get,
                path: "/".to_string(),
                header_count: 0,
                body_size: 0,
                timeout_ticks: 50,
                weight: 1,
            }],
            schedule: ScheduleConfig {
                kind: ScheduleKind::Constant,
                parameters: vec![],
            },
            assertions: vec![],
        }
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            max_vus: 10,
            max_events: 100,
            event_queue_capacity: 64,
            flush_interval_ticks: 5,
            default_timeout_ticks: 10,
            prng_seed: 42,
            duration_ticks: 10,
            max_timeouts_per_step: 3,
            max_connections: 8,
        }
    }

    #[test]
    fn null_run_produces_empty_ledger() {
        let scenario = null_scenario(0);
        let handler = ScriptedHandler::new(vec![], 4);
        let mut scheduler = Scheduler::new(config(), scenario, handler, 0).unwrap();
        let mut buf = Vec::new();
        scheduler.run(&mut buf, 0).unwrap();
        assert_eq!(scheduler.ledger().len(), 0);
    }

    #[test]
    fn single_request_success_completes_vu() {
        let mut scenario = null_scenario(1);
        scenario.runtime.duration_ticks = 100;
        let handler = ScriptedHandler::new(
            vec![ScriptedOutcome::success_after(5, 200, 1_234)],
            4,
        );
        let mut scheduler = Scheduler::new(config(), scenario, handler, 0).unwrap();
        let mut buf = Vec::new();
        scheduler.run(&mut buf, 0).unwrap();

        assert!(scheduler.vus.iter().all(|(_, vu)| vu.is_complete()));
        let kinds: Vec<RecordKind> = scheduler.ledger().iter().map(|r| r.header.kind).collect();
        assert!(kinds.contains(&RecordKind::VuSpawned));
        assert!(kinds.contains(&RecordKind::ConnEstablished));
        assert!(kinds.contains(&RecordKind::RequestIssued));
        assert!(kinds.contains(&RecordKind::ResponseReceived));
        assert!(kinds.contains(&RecordKind::VuComplete));
    }

    #[test]
    fn timeout_forces_completion_after_retry_budget() {
        let mut scenario = null_scenario(1);
        scenario.runtime.duration_ticks = 200;
        let handler = ScriptedHandler::new(vec![], 4); // exhausted script -> Never
        let mut cfg = config();
        cfg.default_timeout_ticks = 5;
        cfg.max_timeouts_per_step = 2;
        cfg.duration_ticks = 200;
        let mut scheduler = Scheduler::new(cfg, scenario.clone(), handler, 0).unwrap();
        let mut buf = Vec::new();
        scheduler.run(&mut buf, 0).unwrap();

        let timeouts = scheduler
            .ledger()
            .iter()
            .filter(|r| r.header.kind == RecordKind::RequestTimeout)
            .count();
        assert!(timeouts >= 1);
        assert!(scheduler.vus.iter().all(|(_, vu)| vu.is_complete()));
        let _ = scenario;
    }

    #[test]
    fn determinism_same_seed_same_bytes() {
        let run_once = |seed: u64| {
            let mut scenario = null_scenario(1);
            scenario.runtime.prng_seed = seed;
            scenario.runtime.duration_ticks = 100;
            let handler = ScriptedHandler::new(
                vec![ScriptedOutcome::success_after(3, 200, 999)],
                4,
            );
            let mut cfg = config();
            cfg.prng_seed = seed;
            let mut scheduler = Scheduler::new(cfg, scenario, handler, 0).unwrap();
            let mut buf = Vec::new();
            scheduler.run(&mut buf, 0).unwrap();
            buf
        };
        assert_eq!(run_once(7), run_once(7));
    }

    #[test]
    fn rejects_all_zero_weights() {
        let mut scenario = null_scenario(1);
        scenario.requests[0].weight = 0;
        let handler = ScriptedHandler::new(vec![], 4);
        let err = Scheduler::new(config(), scenario, handler, 0).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Config(ConfigError::AllWeightsZero)
        ));
    }

    #[test]
    fn assertions_field_is_carried_but_unused_during_run() {
        let mut scenario = null_scenario(0);
        scenario.assertions.push(Assertion::SuccessRateOver {
            numerator: 1,
            denominator: 1,
        });
        let handler = ScriptedHandler::new(vec![], 4);
        let mut scheduler = Scheduler::new(config(), scenario, handler, 0).unwrap();
        let mut buf = Vec::new();
        scheduler.run(&mut buf, 0).unwrap();
        assert_eq!(scheduler.ledger().len(), 0);
    }

    /// A handler whose `connect` always fails with a non-pool-exhaustion
    /// error, counting how many times `close` is called.
    struct AlwaysRefusesConnectHandler {
        close_calls: u32,
    }

    impl ProtocolHandler for AlwaysRefusesConnectHandler {
        fn connect(&mut self, _target: &Target) -> Result<ConnectionId, goad_protocol::ProtocolError> {
            Err(goad_protocol::ProtocolError::ConnectionRefused)
        }

        fn send(
            &mut self,
            _conn_id: ConnectionId,
            _request: &Request,
        ) -> Result<goad_protocol::RequestId, goad_protocol::ProtocolError> {
            unreachable!("connect never succeeds, so send is never reached")
        }

        fn poll(&mut self, _completions: &mut Vec<Completion>) {}

        fn close(&mut self, _conn_id: ConnectionId) {
            self.close_calls += 1;
        }
    }

    #[test]
    fn connect_refusal_is_recorded_and_does_not_abort_the_run() {
        let scenario = null_scenario(1);
        let handler = AlwaysRefusesConnectHandler { close_calls: 0 };
        let mut scheduler = Scheduler::new(config(), scenario, handler, 0).unwrap();
        let mut buf = Vec::new();

        scheduler.run(&mut buf, 0).unwrap();

        let kinds: Vec<RecordKind> = scheduler.ledger().iter().map(|r| r.header.kind).collect();
        assert!(kinds.contains(&RecordKind::ErrorTcp));
        assert!(!kinds.contains(&RecordKind::ErrorResourceExhausted));
        assert!(scheduler.vus.iter().all(|(_, vu)| vu.is_complete()));
    }

    #[test]
    fn max_connections_admission_denial_retries_instead_of_failing() {
        let mut scenario = null_scenario(1);
        scenario.runtime.duration_ticks = 50;
        let handler = ScriptedHandler::new(vec![ScriptedOutcome::success_after(1, 200, 100)], 4);
        let mut cfg = config();
        cfg.max_connections = 0;
        cfg.duration_ticks = 50;
        let mut scheduler = Scheduler::new(cfg, scenario.clone(), handler, 0).unwrap();
        let mut buf = Vec::new();

        scheduler.run(&mut buf, 0).unwrap();

        let kinds: Vec<RecordKind> = scheduler.ledger().iter().map(|r| r.header.kind).collect();
        assert!(!kinds.contains(&RecordKind::ConnEstablished));
        assert!(!kinds.contains(&RecordKind::ResponseReceived));
        let _ = scenario;
    }

    #[test]
    fn completed_vu_closes_its_connection() {
        let mut scenario = null_scenario(1);
        scenario.runtime.duration_ticks = 100;
        let handler = ScriptedHandler::new(
            vec![ScriptedOutcome::success_after(5, 200, 1_234)],
            4,
        );
        let mut scheduler = Scheduler::new(config(), scenario, handler, 0).unwrap();
        let mut buf = Vec::new();
        scheduler.run(&mut buf, 0).unwrap();

        let kinds: Vec<RecordKind> = scheduler.ledger().iter().map(|r| r.header.kind).collect();
        assert!(kinds.contains(&RecordKind::ConnClosed));
        assert!(scheduler.connections.is_empty());
    }
}
