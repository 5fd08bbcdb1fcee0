//! Simulation engine context.
//!
//! The engine owns the augmented state, the simulation clock and the active
//! closed-loop system. Gain updates build a complete replacement system first
//! and swap it in only on success, so a step always sees one coherent
//! `(A_cl, B_ref, C_cl)` triple and the state carries over unchanged.

use crate::clock::SimulationClock;
use crate::error::{SimError, SimResult};
use crate::model::{ClosedLoopModel, TransientModel};
use crate::projection::{Sample, SampleProjection};
use crate::sim::SimOptions;
use nalgebra::DVector;
use pl_control::{ClosedLoopSystem, ControllerGains};
use pl_core::{first_non_finite, inf_norm};
use pl_plant::{PlantMatrices, PlantParams};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

#[derive(Debug)]
pub struct Engine {
    plant: PlantMatrices,
    projection: SampleProjection,
    active: Arc<ClosedLoopSystem>,
    state: DVector<f64>,
    clock: SimulationClock,
    opts: SimOptions,
    run_state: RunState,
}

impl Engine {
    /// Build an engine for the electromechanical actuator described by `params`.
    ///
    /// The engine starts STOPPED with a zero state at t=0.
    pub fn new(params: &PlantParams, gains: ControllerGains, opts: SimOptions) -> SimResult<Self> {
        let plant = PlantMatrices::from_params(params)?;
        let projection = SampleProjection::new(params.gear_ratio, opts.limits)?;
        Self::with_plant(plant, projection, gains, opts)
    }

    /// Build an engine around an arbitrary single-input plant.
    pub fn with_plant(
        plant: PlantMatrices,
        projection: SampleProjection,
        gains: ControllerGains,
        opts: SimOptions,
    ) -> SimResult<Self> {
        opts.validate()?;
        let clock = SimulationClock::new(opts.dt, opts.output_interval)?;
        let active = Arc::new(ClosedLoopSystem::build(&plant, gains)?);
        let state = ClosedLoopModel {
            system: &active,
            setpoint: opts.setpoint,
        }
        .initial_state();

        Ok(Self {
            plant,
            projection,
            active,
            state,
            clock,
            opts,
            run_state: RunState::Stopped,
        })
    }

    /// Begin (or resume) stepping. With `reset`, the state is zeroed and the
    /// clock restarts at t=0 first.
    pub fn start(&mut self, reset: bool) {
        if reset {
            self.zero_state();
        }
        if self.run_state != RunState::Running {
            info!(t = self.clock.time(), gains = %self.gains(), "Simulation running");
        }
        self.run_state = RunState::Running;
    }

    /// Halt stepping. State and time are kept.
    pub fn stop(&mut self) {
        if self.run_state == RunState::Running {
            info!(t = self.clock.time(), "Simulation stopped");
        }
        self.run_state = RunState::Stopped;
    }

    /// Stop, zero the state, restart the clock and resume running.
    pub fn reset(&mut self) {
        self.stop();
        self.start(true);
    }

    /// Rebuild the closed loop for new gains and swap it in.
    ///
    /// On failure the previous system stays active and the error is returned.
    /// The state vector is never modified.
    pub fn apply_gains(&mut self, gains: ControllerGains) -> SimResult<()> {
        match ClosedLoopSystem::build(&self.plant, gains) {
            Ok(system) => {
                self.active = Arc::new(system);
                info!(t = self.clock.time(), %gains, "Controller gains applied");
                Ok(())
            }
            Err(e) => {
                warn!(%gains, error = %e, "Gain update rejected, keeping previous controller");
                Err(SimError::Rebuild(e))
            }
        }
    }

    /// Advance one integration step.
    ///
    /// Returns `Ok(None)` while stopped or between samples, and the sample
    /// when the output cadence is reached. A non-finite state or one whose
    /// infinity norm exceeds the divergence bound stops the engine, keeps the
    /// last finite state and returns [`SimError::IntegrationDiverged`].
    pub fn step(&mut self) -> SimResult<Option<Sample>> {
        if self.run_state == RunState::Stopped {
            return Ok(None);
        }

        let system = Arc::clone(&self.active);
        let model = ClosedLoopModel {
            system: &system,
            setpoint: self.opts.setpoint,
        };
        let t = self.clock.time();
        let next = self
            .opts
            .integrator
            .step(&model, t, &self.state, self.opts.dt)?;

        let bad = first_non_finite(&next);
        let norm = inf_norm(&next);
        if bad.is_some() || norm > self.opts.divergence_bound {
            self.run_state = RunState::Stopped;
            error!(
                t,
                gains = %system.gains(),
                non_finite = ?bad,
                norm,
                "Integration diverged, simulation stopped"
            );
            return Err(SimError::IntegrationDiverged {
                time: t,
                gains: system.gains(),
                last_good_state: self.state.as_slice().to_vec(),
            });
        }

        self.state = next;
        self.clock.advance();

        if self.clock.should_emit() {
            let sample = self.sample();
            debug!(t = sample.timestamp, pressure = sample.pressure, "Sample due");
            Ok(Some(sample))
        } else {
            Ok(None)
        }
    }

    /// Project the current state into a sample without stepping.
    pub fn sample(&self) -> Sample {
        self.projection
            .project(&self.active, &self.state, self.opts.setpoint, self.clock.time())
    }

    /// Unclamped measured output of the current state.
    pub fn output(&self) -> f64 {
        self.active.output(&self.state)
    }

    /// Actuator voltage the active controller commands for the current state.
    pub fn control_input(&self) -> f64 {
        self.active.control_input(&self.state, self.opts.setpoint)
    }

    pub fn active_system(&self) -> Arc<ClosedLoopSystem> {
        Arc::clone(&self.active)
    }

    pub fn state(&self) -> &DVector<f64> {
        &self.state
    }

    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    pub fn gains(&self) -> ControllerGains {
        self.active.gains()
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn options(&self) -> &SimOptions {
        &self.opts
    }

    pub fn plant(&self) -> &PlantMatrices {
        &self.plant
    }

    fn zero_state(&mut self) {
        self.state.fill(0.0);
        self.clock.reset();
    }
}
