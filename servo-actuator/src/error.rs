//! Erros do controlador de servo

use thiserror::Error;

pub type ActuatorResult<T> = Result<T, ActuatorError>;

/// Erros do controlador
///
/// As variantes seguem a taxonomia de falhas: erros de configuração e de
/// aquisição de hardware encerram o processo; erros de escrita no canal são
/// registrados e a operação retorna sem alterar o estado.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    /// Arquivo de configuração ausente ou ilegível
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    /// Documento de configuração malformado (JSON inválido, campo ausente)
    #[error("Malformed configuration: {0}")]
    MalformedConfig(String),

    /// Campo presente mas fora do intervalo permitido
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Fora de alcance
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Pino não pôde ser reservado ou configurado para PWM
    #[error("Hardware acquisition failed: {0}")]
    HardwareAcquisition(String),

    /// Escrita de duty cycle falhou
    #[error("Hardware write failed: {0}")]
    HardwareWrite(String),

    /// Canal já liberado pelo cleanup
    #[error("Hardware channel already released")]
    ChannelReleased,

    /// Registro dos handlers de sinal falhou
    #[error("Shutdown hook registration failed: {0}")]
    ShutdownHook(String),
}

impl ActuatorError {
    /// `true` para erros que abortam a inicialização.
    pub fn is_fatal(&self) -> bool {
        match self {
            ActuatorError::ConfigNotFound(_)
            | ActuatorError::MalformedConfig(_)
            | ActuatorError::InvalidConfig(_)
            | ActuatorError::HardwareAcquisition(_)
            | ActuatorError::ShutdownHook(_) => true,
            ActuatorError::OutOfRange(_)
            | ActuatorError::HardwareWrite(_)
            | ActuatorError::ChannelReleased => false,
        }
    }

    /// Erro de configuração (nenhum hardware foi tocado).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            ActuatorError::ConfigNotFound(_)
                | ActuatorError::MalformedConfig(_)
                | ActuatorError::InvalidConfig(_)
        )
    }
}
