//! Configuração unificada via TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Configuração da estação (device).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// IP do servidor de telemetria
    pub server_ip: String,
    /// Porta TCP do servidor
    pub server_port: u16,
    /// Timeout da conexão inicial (segundos)
    pub connect_timeout_secs: f64,
    /// Timeout de cada envio no socket (segundos)
    pub send_timeout_secs: f64,
    /// Intervalo entre ciclos de aquisição (segundos)
    pub acquisition_interval_secs: f64,
    /// Período do tick do loop principal (ms)
    pub tick_ms: u64,
    /// Device dos 4 LEDs
    pub led_device: String,
    /// Device do buzzer
    pub beep_device: String,
    /// Renderiza o painel de console a cada N ticks
    pub render_every_ticks: u32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            server_ip: "192.168.5.42".into(),
            server_port: 60005,
            connect_timeout_secs: 5.0,
            send_timeout_secs: 1.0,
            acquisition_interval_secs: 5.0,
            tick_ms: 5,
            led_device: "/dev/Led".into(),
            beep_device: "/dev/beep".into(),
            render_every_ticks: 200,
        }
    }
}

impl StationConfig {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_ip, self.server_port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout_secs)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.send_timeout_secs)
    }

    pub fn acquisition_interval(&self) -> Duration {
        Duration::from_secs_f64(self.acquisition_interval_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Thresholds de alerta ambientais.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub co2_warning: f32,
    pub co2_critical: f32,
    pub temperature_warning: f32,
    pub temperature_critical: f32,
    pub humidity_warning: f32,
    pub humidity_critical: f32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            co2_warning: 1000.0,
            co2_critical: 1500.0,
            temperature_warning: 28.0,
            temperature_critical: 32.0,
            humidity_warning: 75.0,
            humidity_critical: 85.0,
        }
    }
}

/// Configuração do peer de console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// IP local para escutar
    pub listen_ip: String,
    /// Porta TCP
    pub port: u16,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            listen_ip: "0.0.0.0".into(),
            port: 60005,
        }
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub station: StationConfig,
    pub alerts: AlertThresholds,
    pub peer: PeerConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let st = &self.station;

        if st.server_port == 0 {
            errors.push("Porta do servidor não pode ser 0".into());
        }
        if !(0.1..=3600.0).contains(&st.acquisition_interval_secs) {
            errors.push(format!(
                "Intervalo de aquisição inválido: {} (0.1–3600.0)",
                st.acquisition_interval_secs
            ));
        }
        if !(1..=1000).contains(&st.tick_ms) {
            errors.push(format!("Tick inválido: {} ms (1–1000)", st.tick_ms));
        }
        if !(0.1..=3600.0).contains(&st.connect_timeout_secs) {
            errors.push(format!(
                "Timeout de conexão inválido: {} (0.1–3600.0)",
                st.connect_timeout_secs
            ));
        }
        if !(0.1..=3600.0).contains(&st.send_timeout_secs) {
            errors.push(format!(
                "Timeout de envio inválido: {} (0.1–3600.0)",
                st.send_timeout_secs
            ));
        }
        if st.render_every_ticks == 0 {
            errors.push("render_every_ticks não pode ser 0".into());
        }
        if self.alerts.co2_warning > self.alerts.co2_critical
            || self.alerts.temperature_warning > self.alerts.temperature_critical
            || self.alerts.humidity_warning > self.alerts.humidity_critical
        {
            errors.push("Threshold de warning maior que o crítico".into());
        }
        if self.peer.port == 0 {
            errors.push("Porta do peer não pode ser 0".into());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.station.server_port, parsed.station.server_port);
        assert_eq!(config.station.led_device, parsed.station.led_device);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[station]
server_ip = "10.0.0.7"
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.station.server_addr(), "10.0.0.7:60005");
        // Outros campos devem ter valor padrão
        assert_eq!(config.station.acquisition_interval(), Duration::from_secs(5));
        assert_eq!(config.station.tick(), Duration::from_millis(5));
        assert_eq!(config.peer.port, 60005);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = AppConfig::default();
        config.station.tick_ms = 0;
        config.station.acquisition_interval_secs = 0.0;
        config.alerts.co2_warning = 2000.0;
        assert_eq!(config.validate().len(), 3);
    }

    #[test]
    fn rejects_timeouts_that_do_not_fit_a_duration() {
        let mut config = AppConfig::default();
        config.station.connect_timeout_secs = 1e20;
        config.station.send_timeout_secs = f64::NAN;
        let errors = config.validate();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("conexão"));
        assert!(errors[1].contains("envio"));

        config.station.connect_timeout_secs = 3600.0;
        config.station.send_timeout_secs = 0.1;
        assert!(config.validate().is_empty());
        assert_eq!(config.station.connect_timeout(), Duration::from_secs(3600));
    }
}
