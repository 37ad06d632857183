//! Dispatcher de comandos, executado no tick do loop principal.
//!
//! A cada tick: lê um snapshot consistente, drena a fila de comandos,
//! aplica cada token em ordem FIFO (estado compartilhado + driver + eco
//! para o peer) e entrega o snapshot atualizado ao renderizador.
//! Nunca cria threads nem bloqueia esperando a fila.

use crate::actuator::{ActuatorDriver, DriverError};
use crate::channel::TelemetrySink;
use station_core::alerts::{Alert, evaluate_alerts};
use station_core::config::AlertThresholds;
use station_core::{Channel, Command, CommandQueue, SharedState, Snapshot};
use std::sync::Arc;
use tracing::{debug, warn};

/// Tudo que o renderizador precisa para um quadro.
#[derive(Debug, Clone)]
pub struct DisplaySnapshot {
    pub snapshot: Snapshot,
    /// Medidor de CO2 (0–100)
    pub co2_gauge: u8,
    pub alerts: Vec<Alert>,
    /// Cabeçalho "YYYY-MM-DD HH:MM"
    pub header_time: String,
    /// Tokens descartados por fila cheia desde o início
    pub dropped_commands: u64,
}

/// Colaborador de interface: consome um snapshot por tick.
pub trait UiRenderer {
    fn render(&mut self, view: &DisplaySnapshot);
}

pub struct CommandDispatcher {
    state: Arc<SharedState>,
    queue: Arc<CommandQueue>,
    driver: Box<dyn ActuatorDriver>,
    /// Eco das mudanças para o peer (best-effort)
    echo: Option<Arc<dyn TelemetrySink>>,
    thresholds: AlertThresholds,
}

impl CommandDispatcher {
    pub fn new(
        state: Arc<SharedState>,
        queue: Arc<CommandQueue>,
        driver: Box<dyn ActuatorDriver>,
        echo: Option<Arc<dyn TelemetrySink>>,
        thresholds: AlertThresholds,
    ) -> Self {
        Self {
            state,
            queue,
            driver,
            echo,
            thresholds,
        }
    }

    /// Um tick do loop principal. Retorna quantos comandos foram aplicados.
    pub fn tick(&mut self, ui: &mut dyn UiRenderer) -> usize {
        let mut snapshot = self.state.read_snapshot();

        let mut applied = 0;
        for token in self.queue.drain() {
            match Command::parse(&token) {
                Some(cmd) => {
                    self.apply(cmd);
                    applied += 1;
                }
                None => debug!("Comando desconhecido ignorado: {token:?}"),
            }
        }
        if applied > 0 {
            snapshot.actuators = self.state.actuators();
        }

        let view = DisplaySnapshot {
            co2_gauge: snapshot.reading.co2_gauge(),
            alerts: evaluate_alerts(&snapshot.reading, &self.thresholds),
            header_time: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
            dropped_commands: self.queue.dropped(),
            snapshot,
        };
        ui.render(&view);
        applied
    }

    /// Interação do usuário: inverte a chave pelo mesmo caminho dos comandos remotos.
    pub fn on_user_toggle(&mut self, channel: Channel) -> Command {
        let on = self.state.toggle_actuator(channel);
        let cmd = Command::new(channel, on);
        self.mirror(cmd);
        cmd
    }

    fn apply(&mut self, cmd: Command) {
        self.state.set_actuator(cmd.channel, cmd.on);
        self.mirror(cmd);
    }

    /// Reflete a mudança no driver e no peer. Chamado sem nenhum lock.
    fn mirror(&mut self, cmd: Command) {
        for &id in cmd.channel.outputs() {
            match self.driver.set_channel(id, cmd.on) {
                Ok(()) | Err(DriverError::Unavailable(_)) => {}
                Err(e) => warn!("Falha no atuador: {e}"),
            }
        }

        if let Some(echo) = &self.echo {
            let token = format!("{}\n", cmd.token());
            match echo.send(token.as_bytes()) {
                Ok(()) => debug!("→ eco {}", cmd.token()),
                Err(e) => warn!("Erro ao enviar eco {}: {e}", cmd.token()),
            }
        }
    }
}
