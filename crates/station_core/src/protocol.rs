//! Protocolo de linha entre a estação e o peer remoto.
//!
//! Telemetria (estação → peer), uma linha por ciclo de aquisição:
//!
//! ```text
//! temp=25.0C humi=60% co2=600ppm lux=7000lx time=12:34 lights=0 alarm=0\n
//! ```
//!
//! A ordem dos campos é fixa. Comandos (peer → estação) são tokens curtos
//! (≤ 32 bytes), opcionalmente terminados por `\n`.

use crate::types::{ActuatorState, Channel, SensorReading};

/// Tamanho máximo de um token de comando (bytes).
pub const MAX_TOKEN_LEN: usize = 32;

/// Campos da linha de telemetria, na ordem de transmissão.
pub const TELEMETRY_FIELDS: [&str; 7] = ["temp", "humi", "co2", "lux", "time", "lights", "alarm"];

/// Erros do protocolo.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProtocolError {
    #[error("Token muito longo ({0} bytes, máximo {MAX_TOKEN_LEN})")]
    TokenTooLong(usize),

    #[error("Campo ausente na linha de telemetria: {0}")]
    MissingField(&'static str),

    #[error("Campo inesperado na posição de {expected}: {found:?}")]
    UnexpectedField { expected: &'static str, found: String },

    #[error("Valor inválido para {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Conteúdo extra após os campos: {0:?}")]
    TrailingData(String),
}

// ──────────────────────────────────────────────
// Comandos
// ──────────────────────────────────────────────

/// Diretiva de atuador interpretada a partir de um token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub channel: Channel,
    pub on: bool,
}

impl Command {
    pub fn new(channel: Channel, on: bool) -> Self {
        Self { channel, on }
    }

    /// Interpreta um token do vocabulário fixo. Tokens desconhecidos → `None`.
    ///
    /// Aceita também os tokens do peer legado (开灯, 关灯, 开启报警, 关闭报警).
    pub fn parse(token: &str) -> Option<Self> {
        let cmd = match token.trim() {
            "lights:on" | "开灯" => Self::new(Channel::Lighting, true),
            "lights:off" | "关灯" => Self::new(Channel::Lighting, false),
            "alarm:on" | "开启报警" => Self::new(Channel::Alarm, true),
            "alarm:off" | "关闭报警" => Self::new(Channel::Alarm, false),
            _ => return None,
        };
        Some(cmd)
    }

    /// Token canônico, usado também no eco para o peer.
    pub fn token(&self) -> &'static str {
        match (self.channel, self.on) {
            (Channel::Lighting, true) => "lights:on",
            (Channel::Lighting, false) => "lights:off",
            (Channel::Alarm, true) => "alarm:on",
            (Channel::Alarm, false) => "alarm:off",
        }
    }
}

/// Remonta tokens de comando a partir dos blocos lidos do socket.
///
/// `\n` e `\r` delimitam tokens. Um pedaço final sem delimitador fica
/// pendente e é completado pelo próximo bloco. Enquanto o peer não enviou
/// nenhuma quebra de linha, cada bloco é um único token (peer sem framing).
/// Espaços nas pontas são removidos e tokens vazios ignorados.
#[derive(Debug, Default)]
pub struct TokenAssembler {
    pending: Vec<u8>,
    /// Já vimos um delimitador neste stream
    framed: bool,
    /// Descartando o resto de um token longo demais até o próximo delimitador
    discarding: bool,
}

impl TokenAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processa um bloco e devolve os tokens completados por ele.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<String, ProtocolError>> {
        let mut tokens = Vec::new();

        if !self.framed {
            if !chunk.iter().any(|&b| is_delimiter(b)) {
                tokens.extend(finish_token(chunk));
                return tokens;
            }
            self.framed = true;
        }

        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| is_delimiter(b)) {
            self.append(&rest[..pos], &mut tokens);
            if self.discarding {
                self.discarding = false;
            } else {
                let token = std::mem::take(&mut self.pending);
                tokens.extend(finish_token(&token));
            }
            rest = &rest[pos + 1..];
        }
        self.append(rest, &mut tokens);
        tokens
    }

    /// `true` se há um pedaço de token aguardando o resto.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn append(&mut self, bytes: &[u8], tokens: &mut Vec<Result<String, ProtocolError>>) {
        if self.discarding {
            return;
        }
        self.pending.extend_from_slice(bytes);
        let len = self.pending.trim_ascii().len();
        if len > MAX_TOKEN_LEN {
            tokens.push(Err(ProtocolError::TokenTooLong(len)));
            self.pending.clear();
            self.discarding = true;
        }
    }
}

fn is_delimiter(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

fn finish_token(bytes: &[u8]) -> Option<Result<String, ProtocolError>> {
    let text = String::from_utf8_lossy(bytes);
    let token = text.trim();
    if token.is_empty() {
        None
    } else if token.len() > MAX_TOKEN_LEN {
        Some(Err(ProtocolError::TokenTooLong(token.len())))
    } else {
        Some(Ok(token.to_string()))
    }
}

// ──────────────────────────────────────────────
// Telemetria
// ──────────────────────────────────────────────

/// Conteúdo de uma linha de telemetria decodificada.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryLine {
    pub reading: SensorReading,
    pub actuators: ActuatorState,
}

/// Formata a linha de telemetria (com `\n` final).
pub fn format_telemetry_line(reading: &SensorReading, actuators: &ActuatorState) -> String {
    format!(
        "temp={:.1}C humi={:.0}% co2={}ppm lux={}lx time={} lights={} alarm={}\n",
        reading.temperature,
        reading.humidity,
        reading.co2,
        reading.illuminance,
        reading.time_label,
        u8::from(actuators.lighting_enabled),
        u8::from(actuators.alarm_enabled),
    )
}

/// Decodifica uma linha gerada por [`format_telemetry_line`].
pub fn parse_telemetry_line(line: &str) -> Result<TelemetryLine, ProtocolError> {
    let mut parts = line.split_whitespace();
    let mut next = |field: &'static str, unit: &str| -> Result<String, ProtocolError> {
        let part = parts.next().ok_or(ProtocolError::MissingField(field))?;
        let value = part
            .strip_prefix(field)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or_else(|| ProtocolError::UnexpectedField {
                expected: field,
                found: part.to_string(),
            })?;
        value
            .strip_suffix(unit)
            .map(str::to_string)
            .ok_or_else(|| invalid(field, value))
    };

    let temperature = next("temp", "C")?;
    let humidity = next("humi", "%")?;
    let co2 = next("co2", "ppm")?;
    let illuminance = next("lux", "lx")?;
    let time_label = next("time", "")?;
    let lighting = next("lights", "")?;
    let alarm = next("alarm", "")?;

    let rest: Vec<&str> = parts.collect();
    if !rest.is_empty() {
        return Err(ProtocolError::TrailingData(rest.join(" ")));
    }

    Ok(TelemetryLine {
        reading: SensorReading {
            temperature: temperature.parse().map_err(|_| invalid("temp", &temperature))?,
            humidity: humidity.parse().map_err(|_| invalid("humi", &humidity))?,
            co2: co2.parse().map_err(|_| invalid("co2", &co2))?,
            illuminance: illuminance.parse().map_err(|_| invalid("lux", &illuminance))?,
            time_label,
        },
        actuators: ActuatorState {
            lighting_enabled: parse_flag("lights", &lighting)?,
            alarm_enabled: parse_flag("alarm", &alarm)?,
        },
    })
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ProtocolError> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(invalid(field, value)),
    }
}

fn invalid(field: &'static str, value: &str) -> ProtocolError {
    ProtocolError::InvalidValue {
        field,
        value: value.to_string(),
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (SensorReading, ActuatorState) {
        (
            SensorReading {
                temperature: 23.4,
                humidity: 71.0,
                co2: 1450,
                illuminance: 9120,
                time_label: "08:05".into(),
            },
            ActuatorState {
                lighting_enabled: true,
                alarm_enabled: false,
            },
        )
    }

    #[test]
    fn telemetry_line_has_fixed_field_order() {
        let (reading, actuators) = sample();
        let line = format_telemetry_line(&reading, &actuators);
        assert_eq!(
            line,
            "temp=23.4C humi=71% co2=1450ppm lux=9120lx time=08:05 lights=1 alarm=0\n"
        );
        let keys: Vec<&str> = line
            .split_whitespace()
            .map(|p| p.split_once('=').unwrap().0)
            .collect();
        assert_eq!(keys, TELEMETRY_FIELDS);
    }

    #[test]
    fn parser_inverts_formatter() {
        let (reading, actuators) = sample();
        let parsed = parse_telemetry_line(&format_telemetry_line(&reading, &actuators)).unwrap();
        assert_eq!(parsed.reading, reading);
        assert_eq!(parsed.actuators, actuators);
    }

    #[test]
    fn parser_rejects_reordered_fields() {
        let err = parse_telemetry_line("humi=71% temp=23.4C").unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedField { expected: "temp", .. }));
    }

    #[test]
    fn parser_rejects_bad_flag_and_missing_fields() {
        let bad_flag = "temp=23.4C humi=71% co2=1450ppm lux=9120lx time=08:05 lights=2 alarm=0";
        assert_eq!(
            parse_telemetry_line(bad_flag),
            Err(ProtocolError::InvalidValue { field: "lights", value: "2".into() })
        );
        assert_eq!(
            parse_telemetry_line("temp=23.4C humi=71%"),
            Err(ProtocolError::MissingField("co2"))
        );
    }

    #[test]
    fn command_vocabulary() {
        assert_eq!(Command::parse("lights:on"), Some(Command::new(Channel::Lighting, true)));
        assert_eq!(Command::parse("lights:off"), Some(Command::new(Channel::Lighting, false)));
        assert_eq!(Command::parse(" alarm:on "), Some(Command::new(Channel::Alarm, true)));
        assert_eq!(Command::parse("alarm:off"), Some(Command::new(Channel::Alarm, false)));
        assert_eq!(Command::parse("open:door"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn legacy_tokens_are_aliases() {
        assert_eq!(Command::parse("开灯").map(|c| c.token()), Some("lights:on"));
        assert_eq!(Command::parse("关灯").map(|c| c.token()), Some("lights:off"));
        assert_eq!(Command::parse("开启报警").map(|c| c.token()), Some("alarm:on"));
        assert_eq!(Command::parse("关闭报警").map(|c| c.token()), Some("alarm:off"));
    }

    #[test]
    fn canonical_token_parses_back() {
        for channel in Channel::ALL {
            for on in [true, false] {
                let cmd = Command::new(channel, on);
                assert_eq!(Command::parse(cmd.token()), Some(cmd));
            }
        }
    }

    #[test]
    fn assembler_handles_framing() {
        let mut assembler = TokenAssembler::new();
        let tokens: Vec<_> = assembler
            .feed(b"lights:on\r\nalarm:off\n\n  \n")
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tokens, vec!["lights:on".to_string(), "alarm:off".to_string()]);
        assert!(!assembler.has_pending());

        let mut unframed = TokenAssembler::new();
        assert_eq!(unframed.feed(b"alarm:on"), vec![Ok("alarm:on".to_string())]);
        assert_eq!(unframed.feed(b"lights:on"), vec![Ok("lights:on".to_string())]);
    }

    #[test]
    fn token_split_across_reads_is_reassembled() {
        let mut assembler = TokenAssembler::new();
        assert_eq!(assembler.feed(b"alarm:off\nlig"), vec![Ok("alarm:off".to_string())]);
        assert!(assembler.has_pending());
        assert!(assembler.feed(b"hts").is_empty());
        assert_eq!(assembler.feed(b":on\n"), vec![Ok("lights:on".to_string())]);
        assert!(!assembler.has_pending());
    }

    #[test]
    fn multibyte_token_split_mid_character() {
        let bytes = "开启报警\n".as_bytes();
        let mut assembler = TokenAssembler::new();
        assert!(assembler.feed(b"\n").is_empty());
        assert!(assembler.feed(&bytes[..4]).is_empty());
        assert_eq!(assembler.feed(&bytes[4..]), vec![Ok("开启报警".to_string())]);
    }

    #[test]
    fn assembler_rejects_long_tokens() {
        let long = "x".repeat(MAX_TOKEN_LEN + 1);
        let chunk = format!("{long}\nlights:off\n");
        let tokens = TokenAssembler::new().feed(chunk.as_bytes());
        assert_eq!(tokens[0], Err(ProtocolError::TokenTooLong(MAX_TOKEN_LEN + 1)));
        assert_eq!(tokens[1], Ok("lights:off".to_string()));
    }

    #[test]
    fn oversized_pending_fragment_is_dropped_until_delimiter() {
        let mut assembler = TokenAssembler::new();
        assert_eq!(assembler.feed(b"alarm:on\nyyyyyyyyyyyyyyyyyyyy").len(), 1);
        let tokens = assembler.feed(b"yyyyyyyyyyyyyyyyyyyy");
        assert_eq!(tokens, vec![Err(ProtocolError::TokenTooLong(40))]);
        assert!(assembler.feed(b"yyyy").is_empty());
        assert_eq!(assembler.feed(b"yy\nlights:on\n"), vec![Ok("lights:on".to_string())]);
    }
}
