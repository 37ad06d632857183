//! Thread de rede que lê linhas da estação e as envia para o loop principal via channel.

use crossbeam_channel::{Receiver, Sender, bounded};
use station_core::Command;
use station_core::protocol::{TelemetryLine, parse_telemetry_line};
use std::io::{BufRead, BufReader};
use std::net::TcpStream;
use tracing::{debug, warn};

/// Mensagem enviada da thread de rede para o loop principal.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// Linha periódica de telemetria
    Telemetry(TelemetryLine),
    /// Eco de uma mudança de atuador
    Echo(Command),
    /// Linha fora do protocolo
    Unknown(String),
    /// Estação desconectou
    Disconnected,
}

/// Classifica uma linha recebida.
pub fn classify_line(line: &str) -> Option<PeerEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(cmd) = Command::parse(line) {
        return Some(PeerEvent::Echo(cmd));
    }
    Some(match parse_telemetry_line(line) {
        Ok(telemetry) => PeerEvent::Telemetry(telemetry),
        Err(e) => {
            debug!("Linha inválida ({e}): {line:?}");
            PeerEvent::Unknown(line.to_string())
        }
    })
}

/// Inicia a thread de leitura da conexão. Retorna o receiver do channel.
pub fn spawn_connection_thread(stream: TcpStream) -> std::io::Result<Receiver<PeerEvent>> {
    let (tx, rx) = bounded::<PeerEvent>(64); // Buffer de 64 mensagens

    std::thread::Builder::new()
        .name("station-reader".into())
        .spawn(move || reader_loop(&tx, stream))?;

    Ok(rx)
}

fn reader_loop(tx: &Sender<PeerEvent>, stream: TcpStream) {
    for line in BufReader::new(stream).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Erro ao ler da estação: {e}");
                break;
            }
        };
        if let Some(event) = classify_line(&line) {
            // Non-blocking send: se o loop principal está lento, descarta
            if tx.try_send(event).is_err() {
                debug!("Channel cheio, descartando linha");
            }
        }
    }
    // Bloqueante: o fim da conexão não pode se perder
    tx.send(PeerEvent::Disconnected).ok();
}
