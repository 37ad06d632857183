//! Interface de console: substituto mínimo do painel gráfico.
//!
//! Renderiza o snapshot no log a cada N ticks e converte linhas digitadas
//! em stdin (`l` = iluminação, `a` = alarme) em toggles do usuário.

use crate::dispatcher::{DisplaySnapshot, UiRenderer};
use crossbeam_channel::{Receiver, bounded};
use station_core::Channel;
use std::io::BufRead;
use tracing::{debug, info, warn};

/// Renderizador com limitação de taxa.
pub struct ConsoleRenderer {
    every: u32,
    ticks: u32,
    frames: u32,
}

impl ConsoleRenderer {
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
            ticks: 0,
            frames: 0,
        }
    }
}

impl UiRenderer for ConsoleRenderer {
    fn render(&mut self, view: &DisplaySnapshot) {
        let due = self.ticks % self.every == 0;
        self.ticks = self.ticks.wrapping_add(1);
        if !due {
            return;
        }
        self.frames += 1;
        info!("#{} {}", self.frames, format_panel(view));
        for alert in &view.alerts {
            warn!(
                "⚠ {} {:?}: {:.1}{}",
                alert.label, alert.level, alert.value, alert.unit
            );
        }
    }
}

/// Uma linha de painel com os valores atuais e o histórico.
pub fn format_panel(view: &DisplaySnapshot) -> String {
    let s = &view.snapshot;
    let onoff = |on: bool| if on { "ON" } else { "OFF" };
    format!(
        "[{}] {:.1}°C {:.0}% | CO2 {} ppm ({}%) | {} lux | luz {} | alarme {} | hist {}/{} co2={:?} | descartados {}",
        view.header_time,
        s.reading.temperature,
        s.reading.humidity,
        s.reading.co2,
        view.co2_gauge,
        s.reading.illuminance,
        onoff(s.actuators.lighting_enabled),
        onoff(s.actuators.alarm_enabled),
        s.history.len(),
        station_core::types::HISTORY_CAPACITY,
        s.history.co2(),
        view.dropped_commands,
    )
}

/// Interpreta uma linha digitada como toggle de chave.
pub fn parse_toggle(line: &str) -> Option<Channel> {
    match line.trim() {
        "l" | "lights" => Some(Channel::Lighting),
        "a" | "alarm" => Some(Channel::Alarm),
        _ => None,
    }
}

/// Inicia a thread de entrada do usuário. Retorna o receiver dos toggles.
///
/// A thread não é aguardada no shutdown: fica bloqueada em stdin até o
/// processo terminar.
pub fn spawn_input_thread() -> std::io::Result<Receiver<Channel>> {
    let (tx, rx) = bounded::<Channel>(16);

    std::thread::Builder::new()
        .name("console-input".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match parse_toggle(&line) {
                    Some(channel) => {
                        if tx.try_send(channel).is_err() {
                            debug!("Channel de entrada cheio, descartando toggle");
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => info!("Entrada desconhecida: {line:?} (use 'l' ou 'a')"),
                }
            }
        })?;

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use station_core::{ActuatorState, SensorReading, Snapshot};

    fn view() -> DisplaySnapshot {
        DisplaySnapshot {
            snapshot: Snapshot {
                reading: SensorReading::default(),
                actuators: ActuatorState {
                    lighting_enabled: true,
                    alarm_enabled: false,
                },
                ..Default::default()
            },
            co2_gauge: 12,
            alerts: Vec::new(),
            header_time: "2026-01-02 03:04".into(),
            dropped_commands: 0,
        }
    }

    #[test]
    fn panel_shows_current_values() {
        let panel = format_panel(&view());
        assert!(panel.starts_with("[2026-01-02 03:04] 25.0°C 60%"), "{panel}");
        assert!(panel.contains("CO2 600 ppm (12%)"));
        assert!(panel.contains("luz ON | alarme OFF"));
        assert!(panel.contains("hist 0/5"));
    }

    #[test]
    fn toggle_keys() {
        assert_eq!(parse_toggle("l\n"), Some(Channel::Lighting));
        assert_eq!(parse_toggle(" alarm "), Some(Channel::Alarm));
        assert_eq!(parse_toggle("x"), None);
    }

    #[test]
    fn renderer_is_rate_limited() {
        let mut ui = ConsoleRenderer::new(3);
        for _ in 0..7 {
            ui.render(&view());
        }
        assert_eq!(ui.ticks, 7);
        assert_eq!(ui.frames, 3);
    }
}
