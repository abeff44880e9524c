//! Fronteira de hardware: canal PWM de um único pino
//!
//! [`PwmDriver::configure`] reserva o pino e devolve o [`HardwareChannel`];
//! o canal é possuído exclusivamente pelo controlador e consumido em
//! [`HardwareChannel::release`].
//!
//! Implementações:
//! - [`SimulatedPwm`]: sem hardware, registra cada chamada num [`PwmJournal`]
//! - `RpiPwm` (feature `rpi`): PWM por software no GPIO do Raspberry Pi

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use crate::error::{ActuatorError, ActuatorResult};
use crate::types::DutyCycle;

#[cfg(feature = "rpi")]
pub use rpi::{RpiChannel, RpiPwm};

/// Canal PWM adquirido
pub trait HardwareChannel: Send {
    /// Inicia a geração do sinal
    fn start(&mut self, duty: DutyCycle) -> ActuatorResult<()>;

    /// Altera o duty cycle do sinal em execução
    fn set_duty_cycle(&mut self, duty: DutyCycle) -> ActuatorResult<()>;

    /// Para a geração do sinal
    fn stop(&mut self) -> ActuatorResult<()>;

    /// Libera o pino; o canal não pode ser usado depois
    fn release(self) -> ActuatorResult<()>
    where
        Self: Sized;
}

/// Fábrica de canais
pub trait PwmDriver {
    type Channel: HardwareChannel;

    /// Reserva `pin` e o configura para PWM em `frequency_hz`
    fn configure(&mut self, pin: u8, frequency_hz: f64) -> ActuatorResult<Self::Channel>;
}

// ═══════════════════════════════════════════════════════════════════════════
// SIMULATED HARDWARE
// ═══════════════════════════════════════════════════════════════════════════

/// Chamada registrada no hardware simulado
#[derive(Debug, Clone, PartialEq)]
pub enum PwmCall {
    Configure { pin: u8, frequency_hz: f64 },
    Start(DutyCycle),
    SetDutyCycle(DutyCycle),
    Stop,
    Release,
}

/// Histórico compartilhado das chamadas
#[derive(Debug, Clone, Default)]
pub struct PwmJournal {
    calls: Arc<Mutex<Vec<PwmCall>>>,
}

impl PwmJournal {
    fn record(&self, call: PwmCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Cópia das chamadas até agora
    pub fn calls(&self) -> Vec<PwmCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Número de chamadas que satisfazem `predicate`
    pub fn count(&self, predicate: impl Fn(&PwmCall) -> bool) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    /// Número de `release`
    pub fn releases(&self) -> usize {
        self.count(|call| matches!(call, PwmCall::Release))
    }

    /// Último duty cycle escrito (start ou set)
    pub fn last_duty_cycle(&self) -> Option<DutyCycle> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find_map(|call| match call {
                PwmCall::Start(duty) | PwmCall::SetDutyCycle(duty) => Some(*duty),
                _ => None,
            })
    }

    pub fn is_empty(&self) -> bool {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

/// Interruptor de falhas de escrita, compartilhado com os canais
#[derive(Debug, Clone, Default)]
pub struct WriteFault(Arc<AtomicBool>);

impl WriteFault {
    pub fn set(&self, failing: bool) {
        self.0.store(failing, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Driver PWM simulado
#[derive(Debug, Clone, Default)]
pub struct SimulatedPwm {
    journal: PwmJournal,
    write_fault: WriteFault,
    fail_acquisition: bool,
}

impl SimulatedPwm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver cujo `configure` sempre falha
    pub fn unavailable() -> Self {
        Self {
            fail_acquisition: true,
            ..Self::default()
        }
    }

    pub fn journal(&self) -> PwmJournal {
        self.journal.clone()
    }

    /// Liga/desliga falhas em `set_duty_cycle` dos canais deste driver
    pub fn write_fault(&self) -> WriteFault {
        self.write_fault.clone()
    }
}

impl PwmDriver for SimulatedPwm {
    type Channel = SimulatedChannel;

    fn configure(&mut self, pin: u8, frequency_hz: f64) -> ActuatorResult<SimulatedChannel> {
        if self.fail_acquisition {
            return Err(ActuatorError::HardwareAcquisition(format!(
                "GPIO {} is not available",
                pin
            )));
        }
        self.journal.record(PwmCall::Configure { pin, frequency_hz });
        debug!(pin, frequency_hz, "simulated PWM channel configured");

        Ok(SimulatedChannel {
            pin,
            journal: self.journal.clone(),
            write_fault: self.write_fault.clone(),
            running: false,
        })
    }
}

/// Canal simulado
#[derive(Debug)]
pub struct SimulatedChannel {
    pin: u8,
    journal: PwmJournal,
    write_fault: WriteFault,
    running: bool,
}

impl SimulatedChannel {
    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl HardwareChannel for SimulatedChannel {
    fn start(&mut self, duty: DutyCycle) -> ActuatorResult<()> {
        self.journal.record(PwmCall::Start(duty));
        self.running = true;
        Ok(())
    }

    fn set_duty_cycle(&mut self, duty: DutyCycle) -> ActuatorResult<()> {
        if self.write_fault.is_set() {
            return Err(ActuatorError::HardwareWrite(format!(
                "GPIO {}: simulated write fault",
                self.pin
            )));
        }
        if !self.running {
            return Err(ActuatorError::HardwareWrite(format!(
                "GPIO {}: PWM not running",
                self.pin
            )));
        }
        self.journal.record(PwmCall::SetDutyCycle(duty));
        Ok(())
    }

    fn stop(&mut self) -> ActuatorResult<()> {
        self.journal.record(PwmCall::Stop);
        self.running = false;
        Ok(())
    }

    fn release(self) -> ActuatorResult<()> {
        self.journal.record(PwmCall::Release);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RASPBERRY PI
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(feature = "rpi")]
mod rpi {
    use rppal::gpio::{Gpio, OutputPin};
    use tracing::debug;
    use crate::error::{ActuatorError, ActuatorResult};
    use crate::types::DutyCycle;
    use super::{HardwareChannel, PwmDriver};

    /// PWM por software no GPIO (numeração BCM)
    #[derive(Debug, Default)]
    pub struct RpiPwm;

    impl RpiPwm {
        pub fn new() -> Self {
            Self
        }
    }

    impl PwmDriver for RpiPwm {
        type Channel = RpiChannel;

        fn configure(&mut self, pin: u8, frequency_hz: f64) -> ActuatorResult<RpiChannel> {
            let gpio = Gpio::new().map_err(|e| {
                ActuatorError::HardwareAcquisition(format!("GPIO unavailable: {}", e))
            })?;
            let output = gpio
                .get(pin)
                .map_err(|e| ActuatorError::HardwareAcquisition(format!("GPIO {}: {}", pin, e)))?
                .into_output_low();
            debug!(pin, frequency_hz, "GPIO configured for PWM");

            Ok(RpiChannel {
                pin,
                frequency_hz,
                output,
            })
        }
    }

    /// Pino de saída com PWM por software
    #[derive(Debug)]
    pub struct RpiChannel {
        pin: u8,
        frequency_hz: f64,
        output: OutputPin,
    }

    impl HardwareChannel for RpiChannel {
        fn start(&mut self, duty: DutyCycle) -> ActuatorResult<()> {
            self.output
                .set_pwm_frequency(self.frequency_hz, duty.fraction())
                .map_err(|e| {
                    ActuatorError::HardwareAcquisition(format!("GPIO {}: {}", self.pin, e))
                })
        }

        fn set_duty_cycle(&mut self, duty: DutyCycle) -> ActuatorResult<()> {
            self.output
                .set_pwm_frequency(self.frequency_hz, duty.fraction())
                .map_err(|e| ActuatorError::HardwareWrite(format!("GPIO {}: {}", self.pin, e)))
        }

        fn stop(&mut self) -> ActuatorResult<()> {
            self.output
                .clear_pwm()
                .map_err(|e| ActuatorError::HardwareWrite(format!("GPIO {}: {}", self.pin, e)))
        }

        fn release(mut self) -> ActuatorResult<()> {
            self.output.set_low();
            // OutputPin restaura o modo original do pino no drop
            drop(self.output);
            Ok(())
        }
    }
}
