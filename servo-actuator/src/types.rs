//! Tipos de dados do servo e conversão ângulo → duty cycle

use crate::error::{ActuatorError, ActuatorResult};

/// Ângulo mínimo (graus)
pub const MIN_ANGLE: f64 = 0.0;

/// Ângulo máximo (graus)
pub const MAX_ANGLE: f64 = 180.0;

/// Período usado na conversão para duty cycle (20 ms = 50 Hz).
///
/// Fixo: `servo.frequency` só configura o canal, não entra na conversão.
pub const PERIOD_US: f64 = 20_000.0;

/// Posição de servo (ângulo em graus)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoPosition {
    /// Ângulo em graus (0.0 a 180.0)
    pub angle: f64,
}

impl ServoPosition {
    /// Cria nova posição, rejeitando ângulos fora de 0-180°
    pub fn new(angle: f64) -> ActuatorResult<Self> {
        let position = Self { angle };
        position.validate()?;
        Ok(position)
    }

    /// Cria posição saturando o ângulo em 0-180°.
    ///
    /// `NaN` satura em 0°.
    pub fn clamped(angle: f64) -> Self {
        if angle.is_nan() {
            return Self::min();
        }
        Self {
            angle: angle.clamp(MIN_ANGLE, MAX_ANGLE),
        }
    }

    /// Posição mínima (0°)
    pub fn min() -> Self {
        Self { angle: MIN_ANGLE }
    }

    /// Valida se a posição está no range válido
    pub fn validate(&self) -> ActuatorResult<()> {
        if !(MIN_ANGLE..=MAX_ANGLE).contains(&self.angle) {
            return Err(ActuatorError::OutOfRange(format!(
                "Servo angle must be 0-180°, got {}°",
                self.angle
            )));
        }
        Ok(())
    }
}

/// Faixa de largura de pulso do servo (µs).
///
/// Pulsos maiores que o período são aceitos; o duty cycle satura em 100%.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseRange {
    /// Pulso em 0°
    pub min_us: f64,
    /// Pulso em 180°
    pub max_us: f64,
}

impl PulseRange {
    /// Cria nova faixa; exige `0 < min < max`
    pub fn new(min_us: f64, max_us: f64) -> ActuatorResult<Self> {
        if !min_us.is_finite() || !max_us.is_finite() || min_us <= 0.0 {
            return Err(ActuatorError::InvalidConfig(format!(
                "pulse widths must be positive, got {}-{}µs",
                min_us, max_us
            )));
        }
        if min_us >= max_us {
            return Err(ActuatorError::InvalidConfig(format!(
                "min_pulse_width ({}µs) must be less than max_pulse_width ({}µs)",
                min_us, max_us
            )));
        }
        Ok(Self { min_us, max_us })
    }

    /// Interpolação linear entre os limites (ângulo já saturado)
    pub fn pulse_width_us(&self, position: ServoPosition) -> f64 {
        self.min_us + (position.angle / MAX_ANGLE) * (self.max_us - self.min_us)
    }
}

impl Default for PulseRange {
    /// 0° = 500µs, 180° = 2500µs
    fn default() -> Self {
        Self {
            min_us: 500.0,
            max_us: 2500.0,
        }
    }
}

/// Duty cycle PWM em porcentagem (0.0 a 100.0)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct DutyCycle(f64);

impl DutyCycle {
    /// Sinal desligado
    pub const ZERO: DutyCycle = DutyCycle(0.0);

    /// Cria a partir de porcentagem, saturando em 0-100%
    pub fn from_percent(percent: f64) -> Self {
        if percent.is_nan() {
            return Self::ZERO;
        }
        Self(percent.clamp(0.0, 100.0))
    }

    /// Converte largura de pulso (µs) sobre o período fixo de 20 ms
    pub fn from_pulse_width_us(pulse_us: f64) -> Self {
        Self::from_percent(pulse_us / PERIOD_US * 100.0)
    }

    /// Porcentagem (0-100)
    pub fn percent(&self) -> f64 {
        self.0
    }

    /// Fração (0.0-1.0), formato esperado pelos drivers de GPIO
    pub fn fraction(&self) -> f64 {
        self.0 / 100.0
    }
}

/// Converte ângulo em duty cycle.
///
/// O ângulo é saturado em 0-180° antes da conversão e o resultado em 0-100%.
/// Função pura, sem modo de falha.
pub fn angle_to_duty_cycle(range: &PulseRange, angle: f64) -> DutyCycle {
    let position = ServoPosition::clamped(angle);
    DutyCycle::from_pulse_width_us(range.pulse_width_us(position))
}
