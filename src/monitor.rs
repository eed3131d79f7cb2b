//! Motion sensor monitor: the tremor-detection state machine.
//!
//! Arbitrates between a real hardware accelerometer and a synthetic
//! sampler. The mode is an explicit enum with one transition function
//! per event (`probe_capability`, `start`, `stop`, plus the in-tick
//! hardware-error fallback) rather than a family of boolean flags.
//! Exactly one sampling source (timer XOR hardware subscription) is
//! active at any instant; the source is owned by the monitor and
//! released on every exit path, including drop.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::errors::SensorError;

/// Scales the acceleration vector norm into the 0-100 intensity range.
const SENSITIVITY_MULTIPLIER: f64 = 10.0;

/// Intensity above which a tremor is flagged.
const DETECTION_THRESHOLD: f64 = 75.0;

/// Upper bound of the intensity scale.
const INTENSITY_MAX: f64 = 100.0;

/// Nominal sampling cadence driven by the caller, in seconds.
pub const SAMPLE_INTERVAL_SECS: u64 = 1;

/// One three-axis acceleration reading. Transient: consumed into a
/// scalar intensity and discarded.
#[derive(Debug, Clone, Copy)]
pub struct SensorSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SensorSample {
    /// Euclidean norm of the acceleration vector.
    #[must_use]
    pub fn norm(self) -> f64 {
        self.x.mul_add(self.x, self.y.mul_add(self.y, self.z * self.z)).sqrt()
    }
}

/// Hardware motion sensor abstraction.
pub trait MotionSensor {
    /// Acquire the device, including any permission check.
    ///
    /// # Errors
    ///
    /// Returns an error if permission is denied or acquisition fails;
    /// the monitor falls back to simulation on any error here.
    fn start(&mut self) -> Result<(), SensorError>;

    /// Release the device. Must be safe to call more than once.
    fn stop(&mut self);

    /// Take one reading.
    ///
    /// # Errors
    ///
    /// A runtime error here triggers an in-flight fallback to the
    /// simulated source without interrupting monitoring.
    fn read(&mut self) -> Result<SensorSample, SensorError>;
}

/// Outcome of the one-shot capability probe.
pub enum Probe {
    /// Probing is not possible in this environment; the monitor stays
    /// unavailable for the session.
    Unsupported,
    /// Probe ran but found no hardware; only simulation is offered.
    NoHardware,
    /// Hardware sensor present, not yet started.
    Hardware(Box<dyn MotionSensor>),
}

/// Capability probe for motion sensor hardware.
pub trait SensorProvider {
    fn probe(&self) -> Probe;
}

/// Provider for environments with no sensor stack at all.
pub struct NoSensorStack;

impl SensorProvider for NoSensorStack {
    fn probe(&self) -> Probe {
        Probe::Unsupported
    }
}

/// Provider that can probe but never finds hardware. Monitoring runs
/// on the synthetic sampler.
pub struct SimulationOnly;

impl SensorProvider for SimulationOnly {
    fn probe(&self) -> Probe {
        Probe::NoHardware
    }
}

/// Monitor mode. `Idle` and the two active states are only reachable
/// after a successful capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorMode {
    Unavailable,
    Idle,
    Simulating,
    SensingReal,
}

impl MonitorMode {
    /// Human description of the current data source.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Unavailable => "Motion sensors are not supported on this device.",
            Self::Idle => "Monitoring stopped.",
            Self::Simulating => "Simulating accelerometer data for tremor detection.",
            Self::SensingReal => "Using real device accelerometer data.",
        }
    }
}

/// Synthetic sampler: one uniform draw per tick.
///
/// 5% of ticks spike into the detected band (50-100), 25% land in the
/// minor band (10-50), the rest stay in background noise (0-10).
#[derive(Debug)]
struct SimulatedSampler {
    rng: StdRng,
}

impl SimulatedSampler {
    fn sample(&mut self) -> (f64, bool) {
        let r: f64 = self.rng.r#gen();
        if r > 0.95 {
            (self.rng.gen_range(50.0..100.0), true)
        } else if r > 0.7 {
            (self.rng.gen_range(10.0..50.0), false)
        } else {
            (self.rng.gen_range(0.0..10.0), false)
        }
    }
}

/// The active sampling source: the simulated tick generator or a
/// started hardware subscription. Never both.
enum SamplingSource {
    Timer(SimulatedSampler),
    Hardware(Box<dyn MotionSensor>),
}

/// Tremor-detection state machine.
///
/// Exactly one instance per running session. All state mutation goes
/// through this type.
pub struct MotionMonitor {
    mode: MonitorMode,
    /// Base state to return to on `stop()`: `Idle` once probed,
    /// `Unavailable` otherwise.
    base: MonitorMode,
    probed: bool,
    /// Probed-but-stopped hardware, held for the next `start()`.
    idle_sensor: Option<Box<dyn MotionSensor>>,
    source: Option<SamplingSource>,
    intensity_level: f64,
    tremor_detected: bool,
    rng_seed: Option<u64>,
}

impl MotionMonitor {
    /// Create a monitor in its pre-probe state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: MonitorMode::Unavailable,
            base: MonitorMode::Unavailable,
            probed: false,
            idle_sensor: None,
            source: None,
            intensity_level: 0.0,
            tremor_detected: false,
            rng_seed: None,
        }
    }

    /// Create a monitor whose simulated sampler is deterministic.
    #[must_use]
    pub fn with_rng_seed(seed: u64) -> Self {
        let mut monitor = Self::new();
        monitor.rng_seed = Some(seed);
        monitor
    }

    /// Run the capability probe. Effective exactly once per session;
    /// repeat calls are no-ops.
    pub fn probe_capability(&mut self, provider: &dyn SensorProvider) {
        if self.probed {
            return;
        }
        self.probed = true;

        match provider.probe() {
            Probe::Unsupported => {
                debug!("sensor capability probe unsupported; monitor unavailable");
            }
            Probe::NoHardware => {
                debug!("no motion sensor hardware; simulation only");
                self.base = MonitorMode::Idle;
                self.mode = MonitorMode::Idle;
            }
            Probe::Hardware(sensor) => {
                debug!("motion sensor hardware present");
                self.idle_sensor = Some(sensor);
                self.base = MonitorMode::Idle;
                self.mode = MonitorMode::Idle;
            }
        }
    }

    /// Start monitoring.
    ///
    /// With hardware present this attempts the real sensor and falls
    /// back to simulation on any acquisition failure; the user action
    /// always starts something unless the monitor is unavailable.
    /// No-op when unavailable or already monitoring.
    pub fn start(&mut self) {
        if self.mode != MonitorMode::Idle {
            return;
        }

        if let Some(mut sensor) = self.idle_sensor.take() {
            match sensor.start() {
                Ok(()) => {
                    self.source = Some(SamplingSource::Hardware(sensor));
                    self.mode = MonitorMode::SensingReal;
                    return;
                }
                Err(e) => {
                    warn!("failed to start motion sensor, falling back to simulation: {e}");
                    self.idle_sensor = Some(sensor);
                }
            }
        }

        self.start_simulation();
    }

    /// Enter the simulated source, releasing any other source first.
    fn start_simulation(&mut self) {
        self.release_source();
        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.source = Some(SamplingSource::Timer(SimulatedSampler { rng }));
        self.mode = MonitorMode::Simulating;
    }

    /// Process one sampling tick.
    ///
    /// The caller drives this on the fixed cadence; a tick fully
    /// updates state before the next can fire. No-op while idle or
    /// unavailable.
    pub fn tick(&mut self) {
        let reading = match self.source.as_mut() {
            Some(SamplingSource::Hardware(sensor)) => sensor.read(),
            Some(SamplingSource::Timer(sampler)) => {
                let (level, detected) = sampler.sample();
                self.intensity_level = level;
                self.tremor_detected = detected;
                return;
            }
            None => return,
        };

        match reading {
            Ok(sample) => self.apply_intensity(sample.norm() * SENSITIVITY_MULTIPLIER),
            Err(e) => {
                warn!("motion sensor error, falling back to simulation: {e}");
                self.start_simulation();
                // Keep the tick productive so monitoring never shows a
                // gap during the fallback.
                self.tick();
            }
        }
    }

    fn apply_intensity(&mut self, raw: f64) {
        self.intensity_level = raw.min(INTENSITY_MAX);
        self.tremor_detected = self.intensity_level > DETECTION_THRESHOLD;
    }

    /// Stop monitoring: cancel the sampling source and reset to the
    /// idle readings. No further ticks have any effect after this
    /// returns.
    pub fn stop(&mut self) {
        self.release_source();
        self.intensity_level = 0.0;
        self.tremor_detected = false;
        self.mode = self.base;
    }

    /// Release whichever sampling source is active. A stopped hardware
    /// sensor goes back to the idle slot for the next `start()`.
    fn release_source(&mut self) {
        match self.source.take() {
            Some(SamplingSource::Hardware(mut sensor)) => {
                sensor.stop();
                self.idle_sensor = Some(sensor);
            }
            Some(SamplingSource::Timer(_)) | None => {}
        }
    }

    #[must_use]
    pub const fn mode(&self) -> MonitorMode {
        self.mode
    }

    #[must_use]
    pub const fn is_monitoring(&self) -> bool {
        matches!(self.mode, MonitorMode::Simulating | MonitorMode::SensingReal)
    }

    /// Normalized intensity in [0, 100].
    #[must_use]
    pub const fn intensity_level(&self) -> f64 {
        self.intensity_level
    }

    #[must_use]
    pub const fn tremor_detected(&self) -> bool {
        self.tremor_detected
    }

    /// Status line for display.
    #[must_use]
    pub const fn status_line(&self) -> &'static str {
        if !self.is_monitoring() {
            "Inactive"
        } else if self.tremor_detected {
            "Tremor Detected!"
        } else {
            "Monitoring..."
        }
    }
}

impl Default for MotionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MotionMonitor {
    fn drop(&mut self) {
        // Guarantee the sampling source is cancelled even if stop()
        // was never called. take() makes the release single-shot.
        self.release_source();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    /// Scripted hardware sensor for tests.
    struct MockSensor {
        fail_start: bool,
        readings: Vec<Result<SensorSample, SensorError>>,
        next: usize,
        stop_count: Arc<AtomicUsize>,
    }

    impl MockSensor {
        fn new(readings: Vec<Result<SensorSample, SensorError>>) -> (Self, Arc<AtomicUsize>) {
            let stop_count = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    fail_start: false,
                    readings,
                    next: 0,
                    stop_count: stop_count.clone(),
                },
                stop_count,
            )
        }

        fn failing_start() -> Self {
            Self {
                fail_start: true,
                readings: Vec::new(),
                next: 0,
                stop_count: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl MotionSensor for MockSensor {
        fn start(&mut self) -> Result<(), SensorError> {
            if self.fail_start {
                Err(SensorError::PermissionDenied)
            } else {
                Ok(())
            }
        }

        fn stop(&mut self) {
            self.stop_count.fetch_add(1, Ordering::SeqCst);
        }

        fn read(&mut self) -> Result<SensorSample, SensorError> {
            let result = self
                .readings
                .get_mut(self.next)
                .map_or(Err(SensorError::Device("exhausted".into())), |r| {
                    std::mem::replace(r, Err(SensorError::Device("taken".into())))
                });
            self.next += 1;
            result
        }
    }

    struct HardwareProvider {
        sensor: std::cell::RefCell<Option<Box<dyn MotionSensor>>>,
    }

    impl HardwareProvider {
        fn new(sensor: Box<dyn MotionSensor>) -> Self {
            Self {
                sensor: std::cell::RefCell::new(Some(sensor)),
            }
        }
    }

    impl SensorProvider for HardwareProvider {
        fn probe(&self) -> Probe {
            match self.sensor.borrow_mut().take() {
                Some(sensor) => Probe::Hardware(sensor),
                None => Probe::NoHardware,
            }
        }
    }

    fn sample(x: f64, y: f64, z: f64) -> Result<SensorSample, SensorError> {
        Ok(SensorSample { x, y, z })
    }

    #[test]
    fn test_unavailable_until_probed() {
        let monitor = MotionMonitor::new();
        assert_eq!(monitor.mode(), MonitorMode::Unavailable);
        assert!(!monitor.is_monitoring());
    }

    #[test]
    fn test_probe_unsupported_stays_unavailable() {
        let mut monitor = MotionMonitor::new();
        monitor.probe_capability(&NoSensorStack);
        assert_eq!(monitor.mode(), MonitorMode::Unavailable);

        // start() from Unavailable is a no-op
        monitor.start();
        assert_eq!(monitor.mode(), MonitorMode::Unavailable);
        assert!(!monitor.is_monitoring());
    }

    #[test]
    fn test_probe_runs_once() {
        let (sensor, _) = MockSensor::new(vec![sample(1.0, 0.0, 0.0)]);
        let mut monitor = MotionMonitor::new();
        monitor.probe_capability(&SimulationOnly);
        assert_eq!(monitor.mode(), MonitorMode::Idle);

        // A second probe must not change the arbitration outcome.
        monitor.probe_capability(&HardwareProvider::new(Box::new(sensor)));
        monitor.start();
        assert_eq!(monitor.mode(), MonitorMode::Simulating);
    }

    #[test]
    fn test_start_without_hardware_simulates() {
        let mut monitor = MotionMonitor::with_rng_seed(7);
        monitor.probe_capability(&SimulationOnly);

        monitor.start();
        assert_eq!(monitor.mode(), MonitorMode::Simulating);
        assert!(monitor.is_monitoring());
    }

    #[test]
    fn test_start_with_hardware_senses_real() {
        let (sensor, _) = MockSensor::new(vec![sample(0.3, 0.4, 0.0)]);
        let mut monitor = MotionMonitor::new();
        monitor.probe_capability(&HardwareProvider::new(Box::new(sensor)));

        monitor.start();
        assert_eq!(monitor.mode(), MonitorMode::SensingReal);

        // norm 0.5 * 10 = 5.0
        monitor.tick();
        assert!((monitor.intensity_level() - 5.0).abs() < 1e-9);
        assert!(!monitor.tremor_detected());
    }

    #[test]
    fn test_intensity_clamped_and_threshold() {
        let (sensor, _) = MockSensor::new(vec![
            sample(6.0, 8.0, 0.0),  // norm 10 -> 100, clamped, detected
            sample(0.0, 7.6, 0.0),  // 76 -> detected
            sample(0.0, 7.5, 0.0),  // 75 -> not detected (strict >)
        ]);
        let mut monitor = MotionMonitor::new();
        monitor.probe_capability(&HardwareProvider::new(Box::new(sensor)));
        monitor.start();

        monitor.tick();
        assert!((monitor.intensity_level() - 100.0).abs() < 1e-9);
        assert!(monitor.tremor_detected());

        monitor.tick();
        assert!(monitor.tremor_detected());

        monitor.tick();
        assert!(!monitor.tremor_detected());
    }

    #[test]
    fn test_failed_start_falls_back_to_simulation() {
        let mut monitor = MotionMonitor::with_rng_seed(3);
        monitor.probe_capability(&HardwareProvider::new(Box::new(MockSensor::failing_start())));

        monitor.start();
        assert_eq!(monitor.mode(), MonitorMode::Simulating);
        assert!(monitor.is_monitoring());
    }

    #[test]
    fn test_runtime_error_falls_back_in_flight() {
        let (sensor, stop_count) = MockSensor::new(vec![
            sample(0.1, 0.0, 0.0),
            Err(SensorError::Device("shaken loose".into())),
        ]);
        let mut monitor = MotionMonitor::with_rng_seed(11);
        monitor.probe_capability(&HardwareProvider::new(Box::new(sensor)));
        monitor.start();
        assert_eq!(monitor.mode(), MonitorMode::SensingReal);

        monitor.tick();
        assert!(monitor.is_monitoring());

        // Error on the second read: must switch sources without
        // monitoring ever observably stopping.
        monitor.tick();
        assert_eq!(monitor.mode(), MonitorMode::Simulating);
        assert!(monitor.is_monitoring());

        // The hardware subscription was released when simulation took
        // over (timer XOR hardware).
        assert_eq!(stop_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_resets_and_quiesces() {
        let mut monitor = MotionMonitor::with_rng_seed(42);
        monitor.probe_capability(&SimulationOnly);
        monitor.start();

        for _ in 0..20 {
            monitor.tick();
        }

        monitor.stop();
        assert_eq!(monitor.mode(), MonitorMode::Idle);
        assert!((monitor.intensity_level() - 0.0).abs() < f64::EPSILON);
        assert!(!monitor.tremor_detected());

        // A tick past the nominal interval mutates nothing.
        monitor.tick();
        assert!((monitor.intensity_level() - 0.0).abs() < f64::EPSILON);
        assert!(!monitor.tremor_detected());
        assert_eq!(monitor.status_line(), "Inactive");
    }

    #[test]
    fn test_stop_returns_hardware_for_restart() {
        let (sensor, stop_count) = MockSensor::new(vec![
            sample(0.1, 0.0, 0.0),
            sample(0.2, 0.0, 0.0),
        ]);
        let mut monitor = MotionMonitor::new();
        monitor.probe_capability(&HardwareProvider::new(Box::new(sensor)));

        monitor.start();
        monitor.tick();
        monitor.stop();
        assert_eq!(stop_count.load(Ordering::SeqCst), 1);

        monitor.start();
        assert_eq!(monitor.mode(), MonitorMode::SensingReal);
    }

    #[test]
    fn test_drop_releases_hardware_exactly_once() {
        let (sensor, stop_count) = MockSensor::new(vec![sample(0.1, 0.0, 0.0)]);
        {
            let mut monitor = MotionMonitor::new();
            monitor.probe_capability(&HardwareProvider::new(Box::new(sensor)));
            monitor.start();
            // Dropped while actively sensing, stop() never called.
        }
        assert_eq!(stop_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_simulated_detection_rate_converges() {
        let mut monitor = MotionMonitor::with_rng_seed(20_260_829);
        monitor.probe_capability(&SimulationOnly);
        monitor.start();

        let ticks: u32 = 10_000;
        let mut detected = 0u32;
        for _ in 0..ticks {
            monitor.tick();
            assert!((0.0..=100.0).contains(&monitor.intensity_level()));
            if monitor.tremor_detected() {
                detected += 1;
                assert!(monitor.intensity_level() >= 50.0);
            }
        }

        let fraction = f64::from(detected) / f64::from(ticks);
        assert!(
            (fraction - 0.05).abs() < 0.01,
            "detection fraction {fraction} outside tolerance"
        );
    }

    #[test]
    fn test_mode_descriptions() {
        let mut monitor = MotionMonitor::with_rng_seed(1);
        assert_eq!(
            monitor.mode().description(),
            "Motion sensors are not supported on this device."
        );
        monitor.probe_capability(&SimulationOnly);
        monitor.start();
        assert_eq!(
            monitor.mode().description(),
            "Simulating accelerometer data for tremor detection."
        );
    }
}
