//! Modelo de dados da estação: leituras, atuadores e histórico de amostras.

// ──────────────────────────────────────────────
// Leitura de sensores
// ──────────────────────────────────────────────

/// Número de pontos capturados para os gráficos.
pub const HISTORY_CAPACITY: usize = 5;

/// Faixa do medidor de CO2 (ppm).
const CO2_GAUGE_MIN: u32 = 400;
const CO2_GAUGE_SPAN: u32 = 1600;

/// Uma leitura completa dos sensores ambientais.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    /// Temperatura (°C)
    pub temperature: f32,
    /// Umidade relativa (%)
    pub humidity: f32,
    /// Concentração de CO2 (ppm)
    pub co2: u32,
    /// Iluminância (lux)
    pub illuminance: u32,
    /// Hora da leitura, "HH:MM"
    pub time_label: String,
}

impl Default for SensorReading {
    fn default() -> Self {
        Self {
            temperature: 25.0,
            humidity: 60.0,
            co2: 600,
            illuminance: 7000,
            time_label: "00:00".into(),
        }
    }
}

impl SensorReading {
    /// Valor do medidor de CO2 (0–100), `(co2 - 400) * 100 / 1600`.
    pub fn co2_gauge(&self) -> u8 {
        let offset = self.co2.saturating_sub(CO2_GAUGE_MIN).min(CO2_GAUGE_SPAN);
        (offset * 100 / CO2_GAUGE_SPAN) as u8
    }
}

// ──────────────────────────────────────────────
// Atuadores
// ──────────────────────────────────────────────

/// Chave lógica controlável pelo operador ou pelo peer remoto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Iluminação (4 LEDs acionados juntos)
    Lighting,
    /// Buzzer de alarme
    Alarm,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Lighting, Channel::Alarm];

    /// Saídas físicas acionadas por esta chave, na ordem de acionamento.
    pub fn outputs(self) -> &'static [ActuatorId] {
        match self {
            Channel::Lighting => &[
                ActuatorId::Led1,
                ActuatorId::Led2,
                ActuatorId::Led3,
                ActuatorId::Led4,
            ],
            Channel::Alarm => &[ActuatorId::Beep],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Lighting => "lights",
            Channel::Alarm => "alarm",
        }
    }
}

/// Identificador lógico de uma saída física do driver de atuadores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorId {
    Led1,
    Led2,
    Led3,
    Led4,
    Beep,
}

impl ActuatorId {
    /// Índice da saída dentro do seu device (LED 0–3, buzzer 0).
    pub fn index(self) -> u8 {
        match self {
            ActuatorId::Led1 => 0,
            ActuatorId::Led2 => 1,
            ActuatorId::Led3 => 2,
            ActuatorId::Led4 => 3,
            ActuatorId::Beep => 0,
        }
    }

    pub fn is_led(self) -> bool {
        !matches!(self, ActuatorId::Beep)
    }
}

/// Estado on/off das duas chaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorState {
    pub lighting_enabled: bool,
    pub alarm_enabled: bool,
}

impl ActuatorState {
    pub fn get(&self, channel: Channel) -> bool {
        match channel {
            Channel::Lighting => self.lighting_enabled,
            Channel::Alarm => self.alarm_enabled,
        }
    }

    pub fn set(&mut self, channel: Channel, on: bool) {
        match channel {
            Channel::Lighting => self.lighting_enabled = on,
            Channel::Alarm => self.alarm_enabled = on,
        }
    }
}

// ──────────────────────────────────────────────
// Histórico
// ──────────────────────────────────────────────

/// Quatro séries paralelas de capacidade fixa, preenchidas uma única vez.
///
/// Depois de [`HISTORY_CAPACITY`] amostras o histórico congela: novas
/// leituras não são anexadas nem substituem as antigas. Os gráficos
/// consomem uma série estática de 5 pontos.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleHistory {
    co2: Vec<i32>,
    illuminance: Vec<i32>,
    temperature_x10: Vec<i32>,
    humidity: Vec<i32>,
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self {
            co2: Vec::with_capacity(HISTORY_CAPACITY),
            illuminance: Vec::with_capacity(HISTORY_CAPACITY),
            temperature_x10: Vec::with_capacity(HISTORY_CAPACITY),
            humidity: Vec::with_capacity(HISTORY_CAPACITY),
        }
    }
}

impl SampleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anexa uma amostra. Retorna `false` (sem alterar nada) se já está cheio.
    pub fn push(&mut self, reading: &SensorReading) -> bool {
        if self.is_full() {
            return false;
        }
        self.co2.push(reading.co2 as i32);
        self.illuminance.push(reading.illuminance as i32);
        self.temperature_x10.push((reading.temperature * 10.0).round() as i32);
        self.humidity.push(reading.humidity.round() as i32);
        true
    }

    pub fn len(&self) -> usize {
        self.co2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.co2.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= HISTORY_CAPACITY
    }

    pub fn co2(&self) -> &[i32] {
        &self.co2
    }

    pub fn illuminance(&self) -> &[i32] {
        &self.illuminance
    }

    /// Temperatura em décimos de grau (ponto fixo).
    pub fn temperature_x10(&self) -> &[i32] {
        &self.temperature_x10
    }

    pub fn humidity(&self) -> &[i32] {
        &self.humidity
    }
}

// ──────────────────────────────────────────────
// Snapshot
// ──────────────────────────────────────────────

/// Cópia imutável do estado compartilhado, tirada sob lock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub reading: SensorReading,
    pub actuators: ActuatorState,
    pub history: SampleHistory,
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(temperature: f32, co2: u32) -> SensorReading {
        SensorReading {
            temperature,
            humidity: 65.0,
            co2,
            illuminance: 8000,
            time_label: "10:00".into(),
        }
    }

    #[test]
    fn default_reading_matches_startup_values() {
        let r = SensorReading::default();
        assert_eq!(r.temperature, 25.0);
        assert_eq!(r.humidity, 60.0);
        assert_eq!(r.co2, 600);
        assert_eq!(r.illuminance, 7000);
        assert_eq!(r.time_label, "00:00");
    }

    #[test]
    fn history_freezes_after_capacity() {
        let mut h = SampleHistory::new();
        for i in 0..HISTORY_CAPACITY {
            assert!(h.push(&reading(20.0 + i as f32, 500 + i as u32)));
        }
        assert!(h.is_full());
        let frozen = h.clone();

        assert!(!h.push(&reading(29.9, 1999)));
        assert_eq!(h, frozen);
        assert_eq!(h.co2(), &[500, 501, 502, 503, 504]);
    }

    #[test]
    fn temperature_is_stored_in_tenths() {
        let mut h = SampleHistory::new();
        h.push(&reading(29.3, 400));
        h.push(&reading(20.1, 400));
        assert_eq!(h.temperature_x10(), &[293, 201]);
        assert_eq!(h.humidity(), &[65, 65]);
        assert_eq!(h.illuminance(), &[8000, 8000]);
    }

    #[test]
    fn co2_gauge_is_clamped() {
        assert_eq!(reading(25.0, 300).co2_gauge(), 0);
        assert_eq!(reading(25.0, 400).co2_gauge(), 0);
        assert_eq!(reading(25.0, 1200).co2_gauge(), 50);
        assert_eq!(reading(25.0, 2000).co2_gauge(), 100);
        assert_eq!(reading(25.0, 5000).co2_gauge(), 100);
    }

    #[test]
    fn lighting_drives_four_leds() {
        assert_eq!(Channel::Lighting.outputs().len(), 4);
        assert!(Channel::Lighting.outputs().iter().all(|id| id.is_led()));
        assert_eq!(Channel::Alarm.outputs(), &[ActuatorId::Beep]);
    }

    #[test]
    fn actuator_state_get_set() {
        let mut s = ActuatorState::default();
        s.set(Channel::Alarm, true);
        assert!(s.get(Channel::Alarm));
        assert!(!s.get(Channel::Lighting));
    }
}
