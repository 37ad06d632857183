//! # Station Peer
//!
//! Peer de console para comissionamento: escuta a conexão TCP da estação,
//! mostra a telemetria recebida e envia os comandos digitados.
//!
//! ## Comandos
//! - `lights:on` / `lights:off`
//! - `alarm:on` / `alarm:off`
//! - qualquer outro texto é enviado como está (a estação ignora)

mod net_thread;

use crossbeam_channel::{Receiver, bounded, select};
use net_thread::PeerEvent;
use station_core::config::AppConfig;
use std::io::{BufRead, Write};
use std::net::{TcpListener, TcpStream};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Config ──
    let config = AppConfig::load(&AppConfig::default_path());
    let bind_addr = format!("{}:{}", config.peer.listen_ip, config.peer.port);

    let listener = match TcpListener::bind(&bind_addr) {
        Ok(listener) => listener,
        Err(e) => {
            error!("Falha ao escutar em {bind_addr}: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("Peer escutando em {bind_addr}");

    let commands = match spawn_stdin_thread() {
        Ok(rx) => rx,
        Err(e) => {
            error!("Falha ao criar thread de entrada: {e}");
            return ExitCode::FAILURE;
        }
    };

    for conn in listener.incoming() {
        match conn {
            Ok(stream) => {
                if let Err(e) = serve(stream, &commands) {
                    warn!("Sessão encerrada com erro: {e}");
                }
            }
            Err(e) => warn!("Falha ao aceitar conexão: {e}"),
        }
    }

    ExitCode::SUCCESS
}

/// Atende uma estação até ela desconectar.
fn serve(stream: TcpStream, commands: &Receiver<String>) -> std::io::Result<()> {
    let station = stream.peer_addr()?;
    info!("Estação conectada: {station}");

    let events = net_thread::spawn_connection_thread(stream.try_clone()?)?;
    let mut writer = stream;

    loop {
        select! {
            recv(events) -> event => {
                if !show_event(event.unwrap_or(PeerEvent::Disconnected)) {
                    break;
                }
            },
            recv(commands) -> token => match token {
                Ok(token) => {
                    writer.write_all(format!("{token}\n").as_bytes())?;
                    info!("→ {token}");
                }
                Err(_) => {
                    // stdin fechado: continua só recebendo
                    while show_event(events.recv().unwrap_or(PeerEvent::Disconnected)) {}
                    break;
                }
            },
        }
    }

    info!("Estação {station} desconectou");
    Ok(())
}

/// Mostra um evento da estação. Retorna `false` na desconexão.
fn show_event(event: PeerEvent) -> bool {
    match event {
        PeerEvent::Telemetry(t) => {
            let r = &t.reading;
            info!(
                "← {} | {:.1}°C {:.0}% | CO2 {} ppm | {} lux | luz {} | alarme {}",
                r.time_label,
                r.temperature,
                r.humidity,
                r.co2,
                r.illuminance,
                u8::from(t.actuators.lighting_enabled),
                u8::from(t.actuators.alarm_enabled),
            );
        }
        PeerEvent::Echo(cmd) => info!("← estação aplicou {}", cmd.token()),
        PeerEvent::Unknown(line) => debug!("← {line}"),
        PeerEvent::Disconnected => return false,
    }
    true
}

/// Lê tokens de stdin, um por linha.
fn spawn_stdin_thread() -> std::io::Result<Receiver<String>> {
    let (tx, rx) = bounded::<String>(16);

    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let token = line.trim();
                if token.is_empty() {
                    continue;
                }
                if tx.send(token.to_string()).is_err() {
                    break;
                }
            }
        })?;

    Ok(rx)
}
