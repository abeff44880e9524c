//! Controlador de servo de eixo único

use std::fmt;
use std::sync::{Arc, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use crate::config::{Config, ServoConfig};
use crate::error::{ActuatorError, ActuatorResult};
use crate::hardware::{HardwareChannel, PwmDriver};
use crate::shutdown::{lock_slot, ChannelSlot, CleanupHandle, ShutdownFlag, ShutdownHook};
use crate::types::{angle_to_duty_cycle, DutyCycle, PulseRange, ServoPosition};

/// Estado lógico do servo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoState {
    /// Posição atual (graus)
    pub current_angle: f64,
    /// Aberto/fechado; só `toggle_position` altera
    pub is_open: bool,
}

impl ServoState {
    /// Estado inicial: ângulo saturado, sempre fechado
    pub fn new(initial_angle: f64) -> Self {
        Self {
            current_angle: ServoPosition::clamped(initial_angle).angle,
            is_open: false,
        }
    }
}

/// Retrato do controlador
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ServoStatus {
    pub current_angle: f64,
    pub is_open: bool,
    pub gpio_pin: u8,
    pub frequency_hz: f64,
}

impl fmt::Display for ServoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Servo: {} (position: {:.1}°) | GPIO: {} | frequency: {}Hz",
            if self.is_open { "OPEN" } else { "CLOSED" },
            self.current_angle,
            self.gpio_pin,
            self.frequency_hz
        )
    }
}

/// Controlador de servo
///
/// Possui o estado e o canal de hardware. O canal é liberado por
/// [`cleanup`](Self::cleanup), chamado explicitamente, pela ação de
/// encerramento registrada em [`install_shutdown`](Self::install_shutdown)
/// ou pelo `Drop`.
pub struct ServoController<C: HardwareChannel> {
    config: ServoConfig,
    range: PulseRange,
    state: ServoState,
    channel: ChannelSlot<C>,
    cleanup: CleanupHandle<C>,
    flag: ShutdownFlag,
}

impl<C: HardwareChannel> fmt::Debug for ServoController<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServoController")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("released", &self.is_released())
            .finish()
    }
}

impl<C: HardwareChannel> ServoController<C> {
    /// Valida a configuração, adquire o canal e inicia o PWM em 0%.
    ///
    /// Qualquer falha é fatal; se o canal já foi adquirido, é liberado
    /// antes de retornar o erro.
    pub fn new<D>(config: &Config, driver: &mut D) -> ActuatorResult<Self>
    where
        D: PwmDriver<Channel = C>,
    {
        config.validate()?;
        let servo = config.servo.clone();
        let range = servo.pulse_range()?;

        let mut channel = driver.configure(servo.gpio_pin, servo.frequency)?;
        if let Err(e) = channel.start(DutyCycle::ZERO) {
            if let Err(release_err) = channel.release() {
                warn!(error = %release_err, "failed to release channel after start failure");
            }
            return Err(match e {
                ActuatorError::HardwareAcquisition(msg) | ActuatorError::HardwareWrite(msg) => {
                    ActuatorError::HardwareAcquisition(msg)
                }
                other => other,
            });
        }
        info!(pin = servo.gpio_pin, frequency_hz = servo.frequency, "GPIO configured for PWM");

        let park = config
            .system
            .park_on_shutdown
            .then(|| angle_to_duty_cycle(&range, servo.default_position));
        let flag = ShutdownFlag::new();
        let slot = Arc::new(Mutex::new(Some(channel)));
        let cleanup = CleanupHandle::new(Arc::clone(&slot), flag.clone(), park);

        Ok(Self {
            state: ServoState::new(servo.default_position),
            config: servo,
            range,
            channel: slot,
            cleanup,
            flag,
        })
    }

    /// Inicialização completa a partir de uma configuração carregada:
    /// adquire o canal e registra a ação de encerramento em `hook`.
    ///
    /// Se o registro falhar, o canal é liberado antes de retornar o erro.
    pub fn launch<D, H>(config: &Config, driver: &mut D, hook: &H) -> ActuatorResult<Self>
    where
        D: PwmDriver<Channel = C>,
        H: ShutdownHook + ?Sized,
        C: 'static,
    {
        let controller = Self::new(config, driver)?;
        // em caso de erro o Drop do controlador libera o canal
        controller.install_shutdown(hook)?;
        Ok(controller)
    }

    /// Registra no `hook` a ação que marca o encerramento e libera o canal
    pub fn install_shutdown<H>(&self, hook: &H) -> ActuatorResult<()>
    where
        H: ShutdownHook + ?Sized,
        C: 'static,
    {
        let cleanup = self.cleanup.clone();
        hook.register(Box::new(move || cleanup.cleanup()))?;
        debug!("shutdown handlers installed");
        Ok(())
    }

    /// Move o servo para `angle` (saturado em 0-180°).
    ///
    /// Falha de escrita é registrada no log e devolvida; o estado não muda.
    pub fn set_position(&mut self, angle: f64) -> ActuatorResult<DutyCycle> {
        let position = ServoPosition::clamped(angle);
        if position.angle != angle {
            debug!(requested = angle, applied = position.angle, "angle saturated");
        }
        let duty = angle_to_duty_cycle(&self.range, position.angle);

        let written = match lock_slot(&self.channel).as_mut() {
            Some(channel) => channel.set_duty_cycle(duty),
            None => Err(ActuatorError::ChannelReleased),
        };
        if let Err(e) = written {
            error!(angle = position.angle, error = %e, "failed to move servo");
            return Err(e);
        }

        self.state.current_angle = position.angle;
        info!(
            angle = position.angle,
            duty_cycle = duty.percent(),
            "servo moved to {:.1}° (duty cycle: {:.2}%)",
            position.angle,
            duty.percent()
        );
        Ok(duty)
    }

    /// Alterna entre as posições aberta e fechada.
    ///
    /// `is_open` só muda se a escrita no canal tiver sucesso.
    pub fn toggle_position(&mut self) -> ActuatorResult<DutyCycle> {
        let (target, opening) = if self.state.is_open {
            (self.config.position_closed, false)
        } else {
            (self.config.position_open, true)
        };

        let duty = self.set_position(target)?;
        self.state.is_open = opening;
        info!(open = opening, "{}", if opening { "servo opened" } else { "servo closed" });
        Ok(duty)
    }

    /// Retrato somente-leitura
    pub fn status(&self) -> ServoStatus {
        ServoStatus {
            current_angle: self.state.current_angle,
            is_open: self.state.is_open,
            gpio_pin: self.config.gpio_pin,
            frequency_hz: self.config.frequency,
        }
    }

    pub fn state(&self) -> ServoState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    pub fn config(&self) -> &ServoConfig {
        &self.config
    }

    /// Para o PWM e libera o canal. Idempotente.
    pub fn cleanup(&self) {
        self.cleanup.cleanup();
    }

    /// Handle para liberar o canal a partir de outra thread
    pub fn cleanup_handle(&self) -> CleanupHandle<C> {
        self.cleanup.clone()
    }

    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.flag.clone()
    }

    pub fn is_released(&self) -> bool {
        self.cleanup.is_released()
    }
}

impl<C: HardwareChannel> Drop for ServoController<C> {
    fn drop(&mut self) {
        self.cleanup.cleanup();
    }
}
