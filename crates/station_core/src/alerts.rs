//! Sistema de alertas – níveis e avaliação de thresholds ambientais.

use crate::config::AlertThresholds;
use crate::types::SensorReading;
use serde::{Deserialize, Serialize};

/// Nível de alerta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertLevel {
    Normal,
    Warning,
    Critical,
}

/// Um alerta disparado.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub metric: &'static str,
    pub label: &'static str,
    pub value: f32,
    pub unit: &'static str,
    pub level: AlertLevel,
}

/// Avalia uma leitura contra os thresholds e retorna alertas.
pub fn evaluate_alerts(reading: &SensorReading, thresholds: &AlertThresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();

    check(
        &mut alerts,
        "co2",
        "CO2",
        reading.co2 as f32,
        "ppm",
        thresholds.co2_warning,
        thresholds.co2_critical,
    );

    check(
        &mut alerts,
        "temperature",
        "Temperatura",
        reading.temperature,
        "°C",
        thresholds.temperature_warning,
        thresholds.temperature_critical,
    );

    check(
        &mut alerts,
        "humidity",
        "Umidade",
        reading.humidity,
        "%",
        thresholds.humidity_warning,
        thresholds.humidity_critical,
    );

    alerts
}

fn check(
    alerts: &mut Vec<Alert>,
    metric: &'static str,
    label: &'static str,
    value: f32,
    unit: &'static str,
    warn: f32,
    crit: f32,
) {
    let level = level_for_value(value, warn, crit);
    if level == AlertLevel::Normal {
        return;
    }

    alerts.push(Alert {
        metric,
        label,
        value,
        unit,
        level,
    });
}

/// Retorna o [`AlertLevel`] para um valor dado thresholds.
pub fn level_for_value(value: f32, warn: f32, crit: f32) -> AlertLevel {
    if value >= crit {
        AlertLevel::Critical
    } else if value >= warn {
        AlertLevel::Warning
    } else {
        AlertLevel::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_alerts_for_startup_reading() {
        let alerts = evaluate_alerts(&SensorReading::default(), &AlertThresholds::default());
        assert!(alerts.is_empty());
    }

    #[test]
    fn critical_co2_triggers_alert() {
        let reading = SensorReading {
            co2: 1900,
            ..Default::default()
        };
        let alerts = evaluate_alerts(&reading, &AlertThresholds::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, "co2");
        assert_eq!(alerts[0].level, AlertLevel::Critical);
    }

    #[test]
    fn warning_level() {
        assert_eq!(level_for_value(1200.0, 1000.0, 1500.0), AlertLevel::Warning);
        assert_eq!(level_for_value(1500.0, 1000.0, 1500.0), AlertLevel::Critical);
        assert_eq!(level_for_value(800.0, 1000.0, 1500.0), AlertLevel::Normal);
    }
}
