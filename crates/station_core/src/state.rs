//! Estado compartilhado entre a thread de aquisição e o dispatcher.
//!
//! Um único `Mutex` protege leitura, atuadores e histórico. Toda operação
//! copia ou escreve dentro de uma seção crítica curta; formatação de
//! strings e I/O de rede acontecem depois do lock ser liberado.

use crate::types::{ActuatorState, Channel, SensorReading, Snapshot};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Registro compartilhado da estação.
#[derive(Debug, Default)]
pub struct SharedState {
    inner: Mutex<Snapshot>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    // Seções críticas são atribuições sem pânico; um lock envenenado
    // ainda guarda dados consistentes.
    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copia o estado atual. O snapshot pode ser usado sem lock depois.
    pub fn read_snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    /// Substitui a leitura atual e anexa ao histórico (se ainda não cheio).
    ///
    /// Retorna o estado dos atuadores no mesmo instante do commit, para a
    /// linha de telemetria refletir um estado consistente.
    pub fn update_reading(&self, reading: SensorReading) -> ActuatorState {
        let mut state = self.lock();
        state.history.push(&reading);
        state.reading = reading;
        state.actuators
    }

    /// Inverte a chave e retorna o novo valor.
    pub fn toggle_actuator(&self, channel: Channel) -> bool {
        let mut state = self.lock();
        let on = !state.actuators.get(channel);
        state.actuators.set(channel, on);
        on
    }

    /// Define a chave explicitamente. Retorna o valor anterior.
    pub fn set_actuator(&self, channel: Channel, on: bool) -> bool {
        let mut state = self.lock();
        let previous = state.actuators.get(channel);
        state.actuators.set(channel, on);
        previous
    }

    pub fn actuators(&self) -> ActuatorState {
        self.lock().actuators
    }
}
