//! # Station Core
//!
//! Crate compartilhada da estação de monitoramento: modelo de dados,
//! estado compartilhado, fila de comandos, protocolo de linha e
//! configuração TOML.
//!
//! ## Módulos
//! - [`types`] – Leituras, atuadores, histórico fill-once e snapshot
//! - [`state`] – Estado compartilhado protegido por um único lock
//! - [`queue`] – Fila circular limitada de tokens de comando
//! - [`protocol`] – Linha de telemetria e vocabulário de comandos
//! - [`config`] – Configuração unificada via TOML
//! - [`alerts`] – Thresholds e níveis de alerta

pub mod types;
pub mod state;
pub mod queue;
pub mod protocol;
pub mod config;
pub mod alerts;

// Re-exports convenientes
pub use types::{ActuatorId, ActuatorState, Channel, SampleHistory, SensorReading, Snapshot};
pub use state::SharedState;
pub use queue::{CommandQueue, QUEUE_CAPACITY};
pub use protocol::{Command, format_telemetry_line, parse_telemetry_line};
pub use config::{AppConfig, StationConfig, PeerConfig};
