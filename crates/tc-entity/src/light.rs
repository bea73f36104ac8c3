//! The `TrafficLight` entity.
//!
//! A light mirrors the engine's signal program and its live phase state.
//! Link `i` of the program is fed by `links[i]`; a phase grants a lane green
//! when its state string has `G` or `g` at any link index fed by that lane.

use std::fmt::Write as _;

use tc_core::{LaneId, LightId};
use tc_engine::{EngineResult, LightProgram, Phase, TrafficEngine};
use tracing::debug;

use crate::{EntityError, EntityResult};

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficLight {
    id:             LightId,
    alias:          String,
    program:        LightProgram,
    links:          Vec<LaneId>,
    phase_index:    usize,
    remaining_secs: f64,
}

impl TrafficLight {
    /// Read program, controlled links, and live state for `id` from the
    /// engine.  `alias` is the stable short name commands use.
    pub fn import<E: TrafficEngine + ?Sized>(engine: &E, id: LightId, alias: String) -> EngineResult<Self> {
        let program = engine.light_program(&id)?;
        let links = engine.controlled_lanes(&id)?;
        let state = engine.light_state(&id)?;
        Ok(Self {
            id,
            alias,
            program,
            links,
            phase_index:    state.phase_index,
            remaining_secs: state.remaining_secs,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// Engine-native id.
    #[inline]
    pub fn id(&self) -> &LightId {
        &self.id
    }

    #[inline]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[inline]
    pub fn program_id(&self) -> &str {
        &self.program.program_id
    }

    #[inline]
    pub fn program(&self) -> &LightProgram {
        &self.program
    }

    #[inline]
    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    #[inline]
    pub fn remaining_secs(&self) -> f64 {
        self.remaining_secs
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.program.phases.get(self.phase_index)
    }

    /// Distinct controlled lanes in link order.
    pub fn controlled_lanes(&self) -> Vec<&LaneId> {
        let mut lanes: Vec<&LaneId> = Vec::with_capacity(self.links.len());
        for lane in &self.links {
            if !lanes.contains(&lane) {
                lanes.push(lane);
            }
        }
        lanes
    }

    // ── Engine sync ───────────────────────────────────────────────────────

    /// Pull the live phase state.  Re-reads the program and links if the
    /// engine switched to a different program.
    pub fn refresh<E: TrafficEngine + ?Sized>(&mut self, engine: &E) -> EngineResult<()> {
        let state = engine.light_state(&self.id)?;
        if state.program_id != self.program.program_id {
            debug!(light = %self.alias, program = %state.program_id, "program changed, reloading");
            self.program = engine.light_program(&self.id)?;
            self.links = engine.controlled_lanes(&self.id)?;
        }
        self.phase_index = state.phase_index;
        self.remaining_secs = state.remaining_secs;
        Ok(())
    }

    // ── Congestion signal ─────────────────────────────────────────────────

    /// The controlled lane with the most halting vehicles, if that count is
    /// strictly above `threshold`.  Ties go to the earlier link.
    pub fn most_congested_lane<E: TrafficEngine + ?Sized>(
        &self,
        engine:    &E,
        threshold: u32,
    ) -> EngineResult<Option<LaneId>> {
        let mut worst: Option<(&LaneId, u32)> = None;
        for lane in self.controlled_lanes() {
            let halting = engine.lane_halting_count(lane)?;
            if halting > threshold && worst.is_none_or(|(_, best)| halting > best) {
                worst = Some((lane, halting));
            }
        }
        Ok(worst.map(|(lane, _)| lane.clone()))
    }

    /// First phase giving `lane` a green movement.
    pub fn green_phase_for_lane(&self, lane: &LaneId) -> Option<usize> {
        let links: Vec<usize> = self
            .links
            .iter()
            .enumerate()
            .filter(|(_, l)| *l == lane)
            .map(|(i, _)| i)
            .collect();
        if links.is_empty() {
            return None;
        }
        self.program
            .phases
            .iter()
            .position(|phase| links.iter().any(|&i| phase.is_green_at(i)))
    }

    pub fn is_green_phase(&self) -> bool {
        self.current_phase().is_some_and(Phase::has_green)
    }

    pub fn is_red_phase(&self) -> bool {
        self.current_phase().is_some_and(Phase::is_all_red)
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Switch immediately to `phase_index`.  The engine validates the index.
    pub fn set_phase<E: TrafficEngine + ?Sized>(&mut self, engine: &E, phase_index: usize) -> EngineResult<()> {
        engine.set_phase(&self.id, phase_index)?;
        self.phase_index = phase_index;
        if let Some(phase) = self.program.phases.get(phase_index) {
            self.remaining_secs = phase.duration_secs;
        }
        Ok(())
    }

    /// Set the remaining duration of the current phase.
    pub fn set_phase_duration<E: TrafficEngine + ?Sized>(&mut self, engine: &E, secs: f64) -> EngineResult<()> {
        engine.set_phase_duration(&self.id, secs)?;
        self.remaining_secs = secs;
        Ok(())
    }

    /// Jump to the next phase (cyclically) that has a green movement.
    pub fn switch_to_next_green<E: TrafficEngine + ?Sized>(&mut self, engine: &E) -> EntityResult<usize> {
        self.switch_to_next(engine, "green", Phase::has_green)
    }

    /// Jump to the next phase (cyclically) where every approach is red.
    pub fn switch_to_next_red<E: TrafficEngine + ?Sized>(&mut self, engine: &E) -> EntityResult<usize> {
        self.switch_to_next(engine, "red", Phase::is_all_red)
    }

    fn switch_to_next<E: TrafficEngine + ?Sized>(
        &mut self,
        engine: &E,
        class:  &'static str,
        pred:   fn(&Phase) -> bool,
    ) -> EntityResult<usize> {
        let n = self.program.phases.len();
        let target = (1..=n)
            .map(|step| (self.phase_index + step) % n)
            .find(|&i| pred(&self.program.phases[i]))
            .ok_or_else(|| EntityError::NoPhase { light: self.alias.clone(), class })?;
        self.set_phase(engine, target)?;
        Ok(target)
    }

    /// Human-readable dump of the active program.
    pub fn program_definition(&self) -> String {
        let mut out = format!(
            "light {} ({}) program {}: {} phases, {} links\n",
            self.alias,
            self.id,
            self.program.program_id,
            self.program.phases.len(),
            self.links.len(),
        );
        for (i, phase) in self.program.phases.iter().enumerate() {
            let marker = if i == self.phase_index { '*' } else { ' ' };
            let _ = writeln!(out, "{marker} {i:>2}: {:>6.1}s  {}", phase.duration_secs, phase.state);
        }
        out
    }
}
