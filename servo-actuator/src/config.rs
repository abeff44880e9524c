//! Configuração do controlador
//!
//! Carregada uma única vez na inicialização a partir de um documento JSON:
//!
//! ```json
//! {
//!   "servo": {
//!     "gpio_pin": 18,
//!     "frequency": 50,
//!     "min_pulse_width": 500,
//!     "max_pulse_width": 2500,
//!     "position_closed": 0,
//!     "position_open": 90,
//!     "default_position": 45
//!   },
//!   "system": { "log_level": "INFO" }
//! }
//! ```
//!
//! Seções desconhecidas são ignoradas. Todo campo é validado em [`Config::validate`],
//! antes de qualquer acesso ao hardware.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::error::{ActuatorError, ActuatorResult};
use crate::types::{PulseRange, ServoPosition};

/// Caminho padrão do arquivo de configuração
pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

fn default_update_rate() -> f64 {
    50.0
}

/// Configuração completa
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub servo: ServoConfig,
    pub system: SystemConfig,
}

/// Seção `servo`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServoConfig {
    /// Pino GPIO (numeração BCM)
    pub gpio_pin: u8,
    /// Frequência PWM do canal (Hz)
    pub frequency: f64,
    /// Largura de pulso em 0° (µs)
    pub min_pulse_width: f64,
    /// Largura de pulso em 180° (µs)
    pub max_pulse_width: f64,
    /// Posição "fechado" (graus)
    pub position_closed: f64,
    /// Posição "aberto" (graus)
    pub position_open: f64,
    /// Posição inicial (graus)
    pub default_position: f64,
}

/// Seção `system`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub log_level: LogLevel,
    /// Volta para `default_position` antes de parar o PWM
    #[serde(default)]
    pub park_on_shutdown: bool,
    /// Taxa de relatório de status no modo daemon (Hz)
    #[serde(default = "default_update_rate")]
    pub update_rate: f64,
}

/// Nível de log
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Diretiva para `EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ActuatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" | "CRITICAL" | "FATAL" => Ok(LogLevel::Error),
            other => Err(ActuatorError::InvalidConfig(format!(
                "unknown log level '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ActuatorError;

    fn try_from(value: String) -> Result<Self, ActuatorError> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_directive().to_ascii_uppercase()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_directive())
    }
}

impl Config {
    /// Lê, interpreta e valida o arquivo
    pub fn load(path: impl AsRef<Path>) -> ActuatorResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ActuatorError::ConfigNotFound(path.display().to_string()),
            _ => ActuatorError::MalformedConfig(format!("{}: {}", path.display(), e)),
        })?;
        Self::from_json(&text)
    }

    /// Interpreta e valida um documento JSON
    pub fn from_json(text: &str) -> ActuatorResult<Self> {
        let config: Config = serde_json::from_str(text)
            .map_err(|e| ActuatorError::MalformedConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Valida invariantes de todos os campos
    pub fn validate(&self) -> ActuatorResult<()> {
        self.servo.validate()?;
        self.system.report_interval()?;
        Ok(())
    }
}

impl SystemConfig {
    /// Intervalo entre relatórios de status (`1 / update_rate`)
    pub fn report_interval(&self) -> ActuatorResult<Duration> {
        if !self.update_rate.is_finite() || self.update_rate <= 0.0 {
            return Err(ActuatorError::InvalidConfig(format!(
                "system.update_rate must be positive, got {}",
                self.update_rate
            )));
        }
        Duration::try_from_secs_f64(1.0 / self.update_rate).map_err(|_| {
            ActuatorError::InvalidConfig(format!(
                "system.update_rate {} gives an unrepresentable interval",
                self.update_rate
            ))
        })
    }
}

impl ServoConfig {
    /// Valida frequência, faixa de pulso e posições nomeadas
    pub fn validate(&self) -> ActuatorResult<()> {
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            return Err(ActuatorError::InvalidConfig(format!(
                "servo.frequency must be positive, got {}",
                self.frequency
            )));
        }
        self.pulse_range()?;

        for (field, angle) in [
            ("position_closed", self.position_closed),
            ("position_open", self.position_open),
            ("default_position", self.default_position),
        ] {
            ServoPosition::new(angle)
                .map_err(|e| ActuatorError::InvalidConfig(format!("servo.{}: {}", field, e)))?;
        }
        Ok(())
    }

    /// Faixa de pulso validada
    pub fn pulse_range(&self) -> ActuatorResult<PulseRange> {
        PulseRange::new(self.min_pulse_width, self.max_pulse_width)
    }
}
