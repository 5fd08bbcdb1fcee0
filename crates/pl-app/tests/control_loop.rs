//! Integration tests: the control loop with channel-backed commands and
//! telemetry, run unpaced.

use crossbeam::channel::bounded;
use nalgebra::{DMatrix, DVector, RowDVector};
use pl_app::{
    AppError, ChannelCommandSource, ChannelSink, CommandSource, EngineConfig, RunOptions,
    Shutdown, TelemetrySink, run_loop,
};
use pl_control::ControllerGains;
use pl_plant::PlantMatrices;
use pl_sim::{DisplayLimits, Engine, Sample, SampleProjection, SimError, SimOptions};

#[derive(Default)]
struct Collect(Vec<Sample>);

impl TelemetrySink for Collect {
    fn try_deliver(&mut self, sample: &Sample) -> pl_app::AppResult<()> {
        self.0.push(*sample);
        Ok(())
    }
}

struct NoCommands;

impl CommandSource for NoCommands {
    fn try_recv(&mut self) -> Option<ControllerGains> {
        None
    }
}

fn unpaced(seconds: f64) -> RunOptions {
    RunOptions {
        realtime: false,
        max_duration_s: Some(seconds),
    }
}

fn engine() -> Engine {
    EngineConfig::default().build_engine().unwrap()
}

#[test]
fn emits_one_sample_per_interval() {
    let mut engine = engine();
    let mut sink = Collect::default();
    let summary = run_loop(
        &mut engine,
        &mut NoCommands,
        &mut sink,
        &unpaced(2.0),
        &Shutdown::new(),
    )
    .unwrap();

    assert_eq!(summary.ticks, 200);
    assert_eq!(summary.samples_emitted, 20);
    assert_eq!(summary.samples_dropped, 0);
    assert!((summary.final_time - 2.0).abs() < 1e-9);
    assert!(!engine.is_running());

    assert_eq!(sink.0.len(), 20);
    for (k, s) in sink.0.iter().enumerate() {
        assert!((s.timestamp - 0.1 * (k + 1) as f64).abs() < 1e-9);
        assert_eq!(s.setpoint, 500.0);
        assert!((0.0..=700.0).contains(&s.pressure));
    }
    // Pressure rises toward the setpoint.
    assert!(sink.0[19].pressure > sink.0[0].pressure);
}

#[test]
fn pending_updates_coalesce_to_the_last_one() {
    let (tx, rx) = bounded(8);
    for line in [
        r#"{"Kp": 100, "Ki": 30, "Kd": 40}"#,
        "garbage",
        r#"{"Kp": 90, "Ki": 25, "Kd": 35}"#,
    ] {
        tx.send(line.to_string()).unwrap();
    }
    let mut commands = ChannelCommandSource::new(rx);
    let mut engine = engine();

    let summary = run_loop(
        &mut engine,
        &mut commands,
        &mut Collect::default(),
        &unpaced(1.0),
        &Shutdown::new(),
    )
    .unwrap();

    assert_eq!(summary.updates_accepted, 1);
    assert_eq!(summary.updates_rejected, 0);
    assert_eq!(summary.commands_malformed, 1);
    assert_eq!(engine.gains(), ControllerGains::new(90.0, 25.0, 35.0).unwrap());
}

#[test]
fn closed_command_stream_keeps_streaming() {
    let (tx, rx) = bounded(1);
    tx.send(r#"{"Kp": 80, "Ki": 20, "Kd": 30}"#.to_string()).unwrap();
    drop(tx);
    let mut commands = ChannelCommandSource::new(rx);
    let mut engine = engine();
    let mut sink = Collect::default();

    let summary = run_loop(
        &mut engine,
        &mut commands,
        &mut sink,
        &unpaced(3.0),
        &Shutdown::new(),
    )
    .unwrap();

    assert!(commands.is_closed());
    assert_eq!(summary.samples_emitted, 30);
    assert_eq!(engine.gains().kp, 80.0);
}

#[test]
fn zero_gains_mid_run_keep_streaming() {
    let (tx, rx) = bounded(4);
    let mut commands = ChannelCommandSource::new(rx);
    let mut engine = engine();
    let mut sink = Collect::default();

    let before = run_loop(
        &mut engine,
        &mut commands,
        &mut sink,
        &unpaced(2.0),
        &Shutdown::new(),
    )
    .unwrap();
    assert_eq!(before.samples_emitted, 20);

    tx.send(r#"{"Kp": 0, "Ki": 0, "Kd": 0}"#.to_string()).unwrap();
    let after = run_loop(
        &mut engine,
        &mut commands,
        &mut sink,
        &unpaced(5.0),
        &Shutdown::new(),
    )
    .unwrap();

    assert_eq!(after.updates_accepted, 1);
    assert_eq!(after.updates_rejected, 0);
    assert_eq!(after.samples_emitted, 50);
    assert_eq!(after.samples_dropped, 0);
    assert_eq!(engine.gains(), ControllerGains::zero());
    assert!((after.final_time - 7.0).abs() < 1e-9);

    assert_eq!(sink.0.len(), 70);
    assert!(sink.0.windows(2).all(|w| w[1].timestamp > w[0].timestamp));
    assert!(sink.0.iter().all(|s| s.pressure.is_finite()));
}

#[test]
fn full_sink_drops_samples_without_stalling() {
    let (tx, rx) = bounded(1);
    let mut sink = ChannelSink::new(tx);
    let mut engine = engine();

    let summary = run_loop(
        &mut engine,
        &mut NoCommands,
        &mut sink,
        &unpaced(2.0),
        &Shutdown::new(),
    )
    .unwrap();

    assert_eq!(summary.ticks, 200);
    assert_eq!(summary.samples_emitted, 1);
    assert_eq!(summary.samples_dropped, 19);
    assert_eq!(rx.len(), 1);
}

#[test]
fn shutdown_before_start_runs_no_ticks() {
    let shutdown = Shutdown::new();
    shutdown.trigger();
    let mut engine = engine();
    let summary = run_loop(
        &mut engine,
        &mut NoCommands,
        &mut Collect::default(),
        &RunOptions::default(),
        &shutdown,
    )
    .unwrap();
    assert_eq!(summary.ticks, 0);
    assert_eq!(summary.final_time, 0.0);
}

#[test]
fn singular_update_is_counted_and_skipped() {
    // C·B = -0.5, so Kd = 2 makes the derivative loop closure vanish.
    let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -1.0, -1.0]);
    let b = DVector::from_vec(vec![0.0, -0.5]);
    let c = RowDVector::from_vec(vec![0.0, 1.0]);
    let plant = PlantMatrices::new(a, b, c, 0.0).unwrap();
    let opts = SimOptions {
        setpoint: 1.0,
        ..SimOptions::default()
    };
    let mut engine = Engine::with_plant(
        plant,
        SampleProjection::new(1.0, DisplayLimits::default()).unwrap(),
        ControllerGains::new(1.0, 1.0, 0.5).unwrap(),
        opts,
    )
    .unwrap();

    let (tx, rx) = bounded(4);
    tx.send(r#"{"Kp": 1, "Ki": 1, "Kd": 2}"#.to_string()).unwrap();
    let mut commands = ChannelCommandSource::new(rx);
    let mut sink = Collect::default();

    let summary = run_loop(
        &mut engine,
        &mut commands,
        &mut sink,
        &unpaced(0.5),
        &Shutdown::new(),
    )
    .unwrap();

    assert_eq!(summary.updates_rejected, 1);
    assert_eq!(summary.updates_accepted, 0);
    assert_eq!(engine.gains().kd, 0.5);
    assert_eq!(summary.samples_emitted, 5);
}

#[test]
fn divergence_aborts_the_loop() {
    let config = EngineConfig {
        gains: ControllerGains::new(11_520.0, 3_456.0, 4_992.0).unwrap(),
        ..EngineConfig::default()
    };
    let mut engine = config.build_engine().unwrap();

    let err = run_loop(
        &mut engine,
        &mut NoCommands,
        &mut Collect::default(),
        &unpaced(10.0),
        &Shutdown::new(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        AppError::Simulation(SimError::IntegrationDiverged { .. })
    ));
    assert!(!engine.is_running());
}
