//! Integration tests for servo-actuator

use crate::*;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::thread;

const CONFIG: &str = r#"{
    "servo": {
        "gpio_pin": 18,
        "frequency": 50,
        "min_pulse_width": 500,
        "max_pulse_width": 2500,
        "position_closed": 0,
        "position_open": 90,
        "default_position": 45
    },
    "system": { "log_level": "DEBUG" }
}"#;

/// Guarda a ação registrada para disparo manual
#[derive(Default)]
struct CapturedHook {
    action: Mutex<Option<ShutdownAction>>,
}

impl CapturedHook {
    fn fire(&self) {
        if let Some(action) = self.action.lock().unwrap().as_ref() {
            action();
        }
    }

    fn is_registered(&self) -> bool {
        self.action.lock().unwrap().is_some()
    }
}

impl ShutdownHook for CapturedHook {
    fn register(&self, action: ShutdownAction) -> ActuatorResult<()> {
        *self.action.lock().unwrap() = Some(action);
        Ok(())
    }
}

struct RefusingHook;

impl ShutdownHook for RefusingHook {
    fn register(&self, _action: ShutdownAction) -> ActuatorResult<()> {
        Err(ActuatorError::ShutdownHook("handler already installed".into()))
    }
}

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

// ═══════════════════════════════════════════════════════════════════════════
// STARTUP
// ═══════════════════════════════════════════════════════════════════════════

/// Carrega do arquivo e inicializa, como faz o binário
fn start_from_file<H: ShutdownHook>(
    path: &std::path::Path,
    driver: &mut SimulatedPwm,
    hook: &H,
) -> ActuatorResult<(Config, ServoController<SimulatedChannel>)> {
    let config = Config::load(path)?;
    let controller = ServoController::launch(&config, driver, hook)?;
    Ok((config, controller))
}

#[test]
fn test_launch_full_sequence() {
    let file = write_config(CONFIG);
    let mut driver = SimulatedPwm::new();
    let hook = CapturedHook::default();

    let (config, controller) = start_from_file(file.path(), &mut driver, &hook).unwrap();

    assert_eq!(config.system.log_level, LogLevel::Debug);
    assert!(hook.is_registered());
    assert_eq!(controller.state().current_angle, 45.0);
    assert_eq!(
        driver.journal().calls(),
        vec![
            PwmCall::Configure { pin: 18, frequency_hz: 50.0 },
            PwmCall::Start(DutyCycle::ZERO),
        ]
    );
}

#[test]
fn test_launch_missing_gpio_pin_touches_no_hardware() {
    let file = write_config(&CONFIG.replace("\"gpio_pin\": 18,", ""));
    let mut driver = SimulatedPwm::new();
    let hook = CapturedHook::default();

    let err = start_from_file(file.path(), &mut driver, &hook).unwrap_err();

    assert!(matches!(err, ActuatorError::MalformedConfig(_)));
    assert!(err.is_fatal());
    assert!(driver.journal().is_empty());
    assert!(!hook.is_registered());
}

#[test]
fn test_launch_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut driver = SimulatedPwm::new();

    let err = start_from_file(&dir.path().join("absent.json"), &mut driver, &CapturedHook::default())
        .unwrap_err();

    assert!(matches!(err, ActuatorError::ConfigNotFound(_)));
    assert!(driver.journal().is_empty());
}

#[test]
fn test_launch_invalid_config_touches_no_hardware() {
    let mut config = Config::from_json(CONFIG).unwrap();
    config.servo.frequency = -1.0;
    let mut driver = SimulatedPwm::new();
    let hook = CapturedHook::default();

    let err = ServoController::launch(&config, &mut driver, &hook).unwrap_err();

    assert!(err.is_config());
    assert!(driver.journal().is_empty());
    assert!(!hook.is_registered());
}

#[test]
fn test_launch_hook_failure_releases_channel() {
    let config = Config::from_json(CONFIG).unwrap();
    let mut driver = SimulatedPwm::new();

    let err = ServoController::launch(&config, &mut driver, &RefusingHook).unwrap_err();

    assert!(matches!(err, ActuatorError::ShutdownHook(_)));
    assert_eq!(driver.journal().releases(), 1);
}

#[test]
fn test_pulse_wider_than_period_saturates_output() {
    let config =
        Config::from_json(&CONFIG.replace("\"max_pulse_width\": 2500", "\"max_pulse_width\": 25000"))
            .unwrap();
    let mut driver = SimulatedPwm::new();
    let mut servo = ServoController::new(&config, &mut driver).unwrap();

    let duty = servo.set_position(180.0).unwrap();
    assert_eq!(duty.percent(), 100.0);
    assert_eq!(driver.journal().last_duty_cycle(), Some(DutyCycle::from_percent(100.0)));
}

// ═══════════════════════════════════════════════════════════════════════════
// POSITION / TOGGLE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_reference_scenario() {
    let config = Config::from_json(CONFIG).unwrap();
    let mut driver = SimulatedPwm::new();
    let mut servo = ServoController::new(&config, &mut driver).unwrap();

    assert!((servo.set_position(0.0).unwrap().percent() - 2.5).abs() < 1e-9);
    assert!((servo.set_position(180.0).unwrap().percent() - 12.5).abs() < 1e-9);

    // set_position não altera is_open
    servo.set_position(45.0).unwrap();
    assert!(!servo.is_open());

    servo.toggle_position().unwrap();
    assert_eq!(servo.state().current_angle, 90.0);
    assert!(servo.is_open());

    servo.toggle_position().unwrap();
    assert_eq!(servo.state().current_angle, 0.0);
    assert!(!servo.is_open());
}

#[test]
fn test_double_toggle_restores_state() {
    let config = Config::from_json(CONFIG).unwrap();
    let mut driver = SimulatedPwm::new();
    let mut servo = ServoController::new(&config, &mut driver).unwrap();

    // primeiro toggle leva a um estado nomeado
    servo.toggle_position().unwrap();

    for _ in 0..4 {
        let before = servo.state();
        servo.toggle_position().unwrap();
        servo.toggle_position().unwrap();
        assert_eq!(servo.state(), before);
    }
}

#[test]
fn test_write_failure_is_recoverable() {
    let config = Config::from_json(CONFIG).unwrap();
    let mut driver = SimulatedPwm::new();
    let fault = driver.write_fault();
    let mut servo = ServoController::new(&config, &mut driver).unwrap();

    fault.set(true);
    assert!(servo.set_position(10.0).is_err());
    assert!(servo.toggle_position().is_err());
    assert_eq!(servo.state(), ServoState::new(45.0));

    fault.set(false);
    servo.toggle_position().unwrap();
    assert!(servo.is_open());
}

// ═══════════════════════════════════════════════════════════════════════════
// SHUTDOWN
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_shutdown_action_releases_once() {
    let config = Config::from_json(CONFIG).unwrap();
    let mut driver = SimulatedPwm::new();
    let hook = CapturedHook::default();
    let servo = ServoController::new(&config, &mut driver).unwrap();
    servo.install_shutdown(&hook).unwrap();

    hook.fire();
    assert!(servo.is_released());
    assert!(servo.shutdown_flag().is_requested());

    hook.fire();
    servo.cleanup();
    drop(servo);

    assert_eq!(driver.journal().releases(), 1);
}

#[test]
fn test_signal_mid_operation_releases_once() {
    let config = Config::from_json(CONFIG).unwrap();
    let mut driver = SimulatedPwm::new();
    let hook = Arc::new(CapturedHook::default());
    let mut servo = ServoController::new(&config, &mut driver).unwrap();
    servo.install_shutdown(hook.as_ref()).unwrap();

    let signal = {
        let hook = Arc::clone(&hook);
        thread::spawn(move || hook.fire())
    };

    let flag = servo.shutdown_flag();
    let mut step = 0u32;
    while !flag.is_requested() {
        let _ = servo.set_position((step % 180) as f64);
        step += 1;
    }
    signal.join().unwrap();

    assert!(matches!(
        servo.set_position(90.0),
        Err(ActuatorError::ChannelReleased)
    ));
    drop(servo);
    assert_eq!(driver.journal().releases(), 1);
}

#[test]
fn test_cleanup_handle_from_other_thread() {
    let config = Config::from_json(CONFIG).unwrap();
    let mut driver = SimulatedPwm::new();
    let servo = ServoController::new(&config, &mut driver).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let handle = servo.cleanup_handle();
            thread::spawn(move || handle.cleanup())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    servo.cleanup();

    assert_eq!(driver.journal().releases(), 1);
    assert_eq!(driver.journal().count(|c| matches!(c, PwmCall::Stop)), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// LOGGING
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_logs_go_to_injected_subscriber() {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let config = Config::from_json(CONFIG).unwrap();
        let mut driver = SimulatedPwm::new();
        let fault = driver.write_fault();
        let mut servo = ServoController::new(&config, &mut driver).unwrap();

        servo.set_position(90.0).unwrap();
        fault.set(true);
        let _ = servo.set_position(10.0);
        servo.cleanup();
    });

    let logs = buffer.contents();
    assert!(logs.contains("servo moved to 90.0°"));
    assert!(logs.contains("failed to move servo"));
    assert!(logs.contains("hardware channel released"));
}
