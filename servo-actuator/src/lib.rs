//! # servo-actuator — controlador de servo de eixo único
//!
//! Converte comandos lógicos (abrir/fechar, ângulo arbitrário) em sinal PWM
//! para um servo, mantém o estado lógico do atuador e garante que o pino de
//! hardware seja liberado em todo caminho de término.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │            ServoController                │
//! │  set_position(), toggle_position(),       │
//! │  status(), cleanup()                      │
//! │  ┌────────────┐   ┌────────────────────┐  │
//! │  │ ServoState │   │ angle_to_duty_cycle│  │
//! │  │ (ângulo,   │   │ (0-180° → 0-100%)  │  │
//! │  │  aberto?)  │   └────────────────────┘  │
//! │  └────────────┘                           │
//! └───────────────────────────────────────────┘
//!          ↓                        ↑
//!   HardwareChannel (PWM)     ShutdownHook (SIGINT/SIGTERM)
//! ```
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use servo_actuator::{Config, ServoController, SimulatedPwm};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_json(r#"{
//!     "servo": {
//!         "gpio_pin": 18, "frequency": 50,
//!         "min_pulse_width": 500, "max_pulse_width": 2500,
//!         "position_closed": 0, "position_open": 90, "default_position": 45
//!     },
//!     "system": { "log_level": "INFO" }
//! }"#)?;
//!
//! let mut driver = SimulatedPwm::new();
//! let mut servo = ServoController::new(&config, &mut driver)?;
//!
//! servo.toggle_position()?;
//! assert!(servo.is_open());
//!
//! servo.cleanup();
//! # Ok(())
//! # }
//! ```
//!
//! ## Falhas
//!
//! - Configuração e aquisição de hardware: fatais, retornam antes de existir
//!   um controlador parcialmente inicializado
//! - Escrita de duty cycle: registrada no log, estado inalterado
//! - Sinal de interrupção: não é erro, dispara o cleanup

pub mod error;
pub mod types;
pub mod config;
pub mod hardware;
pub mod shutdown;
pub mod servo;

pub use error::{ActuatorError, ActuatorResult};
pub use types::{angle_to_duty_cycle, DutyCycle, PulseRange, ServoPosition, PERIOD_US};
pub use config::{Config, LogLevel, ServoConfig, SystemConfig, DEFAULT_CONFIG_PATH};
pub use hardware::{HardwareChannel, PwmCall, PwmDriver, PwmJournal, SimulatedChannel, SimulatedPwm};
#[cfg(feature = "rpi")]
pub use hardware::{RpiChannel, RpiPwm};
pub use shutdown::{CleanupHandle, ShutdownAction, ShutdownFlag, ShutdownHook, SignalShutdown};
pub use servo::{ServoController, ServoState, ServoStatus};

#[cfg(test)]
mod tests;
