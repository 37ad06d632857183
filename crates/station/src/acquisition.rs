//! Thread de aquisição: amostra sensores, atualiza o estado compartilhado
//! e envia uma linha de telemetria a cada intervalo.
//!
//! Estados: RUNNING → (shutdown) → STOPPED. O shutdown é observado entre
//! ciclos; o ciclo em andamento sempre termina.

use crate::channel::TelemetrySink;
use crate::shutdown::ShutdownToken;
use rand::random_range;
use station_core::{SensorReading, SharedState, format_telemetry_line};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Fonte de leituras. Trocável por um driver de sensor real.
pub trait SensorSource: Send {
    fn sample(&mut self) -> SensorReading;
}

/// Sensores simulados em faixas plausíveis.
#[derive(Debug, Default)]
pub struct SimulatedSensors;

impl SensorSource for SimulatedSensors {
    fn sample(&mut self) -> SensorReading {
        SensorReading {
            temperature: 20.0 + random_range(0..100) as f32 / 10.0, // 20.0–29.9 °C
            humidity: random_range(60..80) as f32,                  // 60–79 %
            co2: random_range(400..2000),                           // ppm
            illuminance: random_range(5000..10000),                 // lux
            time_label: time_label(),
        }
    }
}

/// Hora local no formato "HH:MM".
pub fn time_label() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

/// Worker periódico de aquisição.
pub struct AcquisitionWorker<S> {
    source: S,
    state: Arc<SharedState>,
    /// `None` quando a estação roda sem canal de telemetria.
    sink: Option<Arc<dyn TelemetrySink>>,
    interval: Duration,
    shutdown: ShutdownToken,
}

impl<S: SensorSource + 'static> AcquisitionWorker<S> {
    pub fn new(
        source: S,
        state: Arc<SharedState>,
        sink: Option<Arc<dyn TelemetrySink>>,
        interval: Duration,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            source,
            state,
            sink,
            interval,
            shutdown,
        }
    }

    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("acquisition".into())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        info!("Aquisição iniciada (intervalo {:.1}s)", self.interval.as_secs_f64());

        while !self.shutdown.is_triggered() {
            let cycle_start = Instant::now();
            self.cycle();

            // Dormir pelo tempo restante do intervalo
            let remaining = self.interval.saturating_sub(cycle_start.elapsed());
            if self.shutdown.wait(remaining) {
                break;
            }
        }

        info!("Aquisição encerrada");
    }

    /// Um ciclo completo. Retorna a linha de telemetria gerada.
    pub fn cycle(&mut self) -> String {
        let reading = self.source.sample();
        let actuators = self.state.update_reading(reading.clone());

        // Lock já liberado: formatação e envio fora da seção crítica
        let line = format_telemetry_line(&reading, &actuators);

        if let Some(sink) = &self.sink {
            match sink.send(line.as_bytes()) {
                Ok(()) => debug!("→ {}", line.trim_end()),
                Err(e) => warn!("Erro ao enviar telemetria: {e}"),
            }
        }
        line
    }
}
