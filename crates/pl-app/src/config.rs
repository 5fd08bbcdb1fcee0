//! Engine configuration file.

use crate::error::{AppError, AppResult};
use pl_control::ControllerGains;
use pl_plant::PlantParams;
use pl_sim::{DisplayLimits, Engine, IntegratorType, SimOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything needed to build and run an engine. Every field has a default,
/// so a partial YAML document is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub plant: PlantParams,
    pub gains: ControllerGains,
    /// Pressure setpoint (bar).
    pub setpoint: f64,
    pub integrator: IntegratorType,
    /// Integration step (s).
    pub dt_s: f64,
    /// Telemetry cadence (s).
    pub output_interval_s: f64,
    /// Pace ticks to wall-clock time.
    pub realtime: bool,
    /// Infinity-norm bound on the state.
    pub divergence_bound: f64,
    pub command_capacity: usize,
    pub telemetry_capacity: usize,
    pub limits: DisplayLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let sim = SimOptions::default();
        Self {
            plant: PlantParams::default(),
            gains: ControllerGains::default(),
            setpoint: sim.setpoint,
            integrator: sim.integrator,
            dt_s: sim.dt,
            output_interval_s: sim.output_interval,
            realtime: true,
            divergence_bound: sim.divergence_bound,
            command_capacity: 64,
            telemetry_capacity: 64,
            limits: sim.limits,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.plant.validate()?;
        self.gains
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        self.sim_options()
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if self.output_interval_s < self.dt_s {
            return Err(AppError::Config(format!(
                "output interval {} s is shorter than the step {} s",
                self.output_interval_s, self.dt_s
            )));
        }
        if self.command_capacity == 0 || self.telemetry_capacity == 0 {
            return Err(AppError::Config(
                "channel capacities must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn sim_options(&self) -> SimOptions {
        SimOptions {
            dt: self.dt_s,
            output_interval: self.output_interval_s,
            setpoint: self.setpoint,
            integrator: self.integrator,
            divergence_bound: self.divergence_bound,
            limits: self.limits,
        }
    }

    /// Validate and build a stopped engine at rest.
    pub fn build_engine(&self) -> AppResult<Engine> {
        self.validate()?;
        let engine = Engine::new(&self.plant, self.gains, self.sim_options())?;
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = EngineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.setpoint, 500.0);
        assert_eq!(config.dt_s, 0.01);
        assert_eq!(config.output_interval_s, 0.1);
        assert!(config.realtime);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let yaml = r#"
setpoint: 350.0
integrator: forward_euler
dt_s: 0.001
gains: { Kp: 10.0, Ki: 1.0, Kd: 2.0 }
plant:
  gear_ratio: 20.0
limits:
  pressure_max: 400.0
"#;
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.setpoint, 350.0);
        assert_eq!(config.integrator, IntegratorType::ForwardEuler);
        assert_eq!(config.gains, ControllerGains::new(10.0, 1.0, 2.0).unwrap());
        assert_eq!(config.plant.gear_ratio, 20.0);
        assert_eq!(config.plant.resistance_ohm, 1.2);
        assert_eq!(config.limits.pressure_max, 400.0);
        assert_eq!(config.limits.current_max, 25.0);
    }

    #[test]
    fn rejects_non_positive_step() {
        let err = EngineConfig::from_yaml_str("dt_s: 0.0").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn rejects_interval_shorter_than_step() {
        let err = EngineConfig::from_yaml_str("dt_s: 0.1\noutput_interval_s: 0.01").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn rejects_bad_plant_and_gains() {
        assert!(EngineConfig::from_yaml_str("plant: { inductance_h: 0.0 }").is_err());
        assert!(EngineConfig::from_yaml_str("gains: { Kp: -1.0, Ki: 0.0, Kd: 0.0 }").is_err());
        assert!(EngineConfig::from_yaml_str("command_capacity: 0").is_err());
    }

    #[test]
    fn rejects_unknown_integrator() {
        let err = EngineConfig::from_yaml_str("integrator: midpoint").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn builds_stopped_engine() {
        let engine = EngineConfig::default().build_engine().unwrap();
        assert!(!engine.is_running());
        assert_eq!(engine.gains(), ControllerGains::default());
    }
}
