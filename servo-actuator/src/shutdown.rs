//! Encerramento cooperativo
//!
//! O controlador não instala handlers de sinal por conta própria: recebe um
//! [`ShutdownHook`] e registra nele uma [`ShutdownAction`] que marca o
//! [`ShutdownFlag`] e executa o mesmo caminho de liberação usado no
//! encerramento normal ([`CleanupHandle::cleanup`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};
use crate::error::{ActuatorError, ActuatorResult};
use crate::hardware::HardwareChannel;
use crate::types::DutyCycle;

/// Ação executada quando o processo recebe pedido de encerramento
pub type ShutdownAction = Box<dyn Fn() + Send + Sync + 'static>;

/// Capacidade de registrar a ação de encerramento
pub trait ShutdownHook {
    fn register(&self, action: ShutdownAction) -> ActuatorResult<()>;
}

/// Flag de encerramento compartilhada
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// SIGINT e SIGTERM: executa a ação e termina o processo com status 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalShutdown;

impl ShutdownHook for SignalShutdown {
    fn register(&self, action: ShutdownAction) -> ActuatorResult<()> {
        ctrlc::set_handler(move || {
            info!("interrupt received, shutting down");
            action();
            std::process::exit(0);
        })
        .map_err(|e| ActuatorError::ShutdownHook(e.to_string()))
    }
}

/// Slot do canal: `None` depois de liberado
pub(crate) type ChannelSlot<C> = Arc<Mutex<Option<C>>>;

pub(crate) fn lock_slot<C>(slot: &Mutex<Option<C>>) -> MutexGuard<'_, Option<C>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Caminho único de liberação do canal.
///
/// Clonável e `Send`; todas as cópias apontam para o mesmo slot, então o
/// canal é liberado exatamente uma vez, seja qual for o caminho que chega
/// primeiro (cleanup explícito, sinal ou `Drop` do controlador).
pub struct CleanupHandle<C> {
    slot: ChannelSlot<C>,
    flag: ShutdownFlag,
    park: Option<DutyCycle>,
}

impl<C> Clone for CleanupHandle<C> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            flag: self.flag.clone(),
            park: self.park,
        }
    }
}

impl<C: HardwareChannel> CleanupHandle<C> {
    pub(crate) fn new(slot: ChannelSlot<C>, flag: ShutdownFlag, park: Option<DutyCycle>) -> Self {
        Self { slot, flag, park }
    }

    /// Para o PWM e libera o canal. Idempotente.
    pub fn cleanup(&self) {
        self.flag.request();

        let mut slot = lock_slot(&self.slot);
        let Some(mut channel) = slot.take() else {
            debug!("hardware channel already released");
            return;
        };

        if let Some(duty) = self.park {
            if let Err(e) = channel.set_duty_cycle(duty) {
                warn!(error = %e, "could not park servo before shutdown");
            }
        }
        if let Err(e) = channel.stop() {
            error!(error = %e, "failed to stop PWM");
        }
        match channel.release() {
            Ok(()) => info!("hardware channel released"),
            Err(e) => error!(error = %e, "failed to release hardware channel"),
        }
    }

    /// `true` depois que o canal foi liberado
    pub fn is_released(&self) -> bool {
        lock_slot(&self.slot).is_none()
    }
}
