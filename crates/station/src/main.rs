//! # Station
//!
//! Estação de monitoramento ambiental: aquisição periódica de sensores,
//! telemetria TCP para o servidor, recepção de comandos remotos e
//! acionamento dos atuadores (LEDs e buzzer).
//!
//! ## Threads
//! - `acquisition` – amostra e envia telemetria a cada intervalo
//! - `command-receiver` – lê comandos do servidor para a fila
//! - principal – tick de ~5 ms: drena a fila, aplica comandos, renderiza
//!
//! ## Uso
//! ```bash
//! station            # digite 'l' ou 'a' + Enter para alternar luz/alarme
//! ```

mod acquisition;
mod actuator;
mod channel;
mod console;
mod dispatcher;
mod receiver;
mod shutdown;

use acquisition::{AcquisitionWorker, SimulatedSensors};
use actuator::DeviceActuatorDriver;
use channel::{TelemetryChannel, TelemetrySink};
use console::ConsoleRenderer;
use dispatcher::CommandDispatcher;
use receiver::CommandReceiverWorker;
use shutdown::Workers;
use station_core::config::AppConfig;
use station_core::{CommandQueue, SharedState};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Config inválida: {e}");
        }
        return ExitCode::FAILURE;
    }
    let st = &config.station;

    shutdown::install_signal_handlers();

    // ── Estado compartilhado ──
    let state = Arc::new(SharedState::new());
    let queue = Arc::new(CommandQueue::new());
    let driver = DeviceActuatorDriver::open(Path::new(&st.led_device), Path::new(&st.beep_device));
    if driver.is_degraded() {
        warn!("Atuadores em modo degradado (somente estado)");
    }

    // ── Canal de telemetria (tentativa única) ──
    let link = TelemetryChannel::connect(
        &st.server_addr(),
        st.connect_timeout(),
        st.send_timeout(),
    )
    .and_then(TelemetryChannel::split);
    let (sink, reader, closer) = match link {
        Ok((writer, reader, closer)) => {
            let sink: Arc<dyn TelemetrySink> = Arc::new(writer);
            (Some(sink), Some(reader), Some(closer))
        }
        Err(e) => {
            error!("{e} – operando sem telemetria");
            (None, None, None)
        }
    };

    let (trigger, token) = shutdown::channel();

    // ── Threads de trabalho ──
    let acquisition = match AcquisitionWorker::new(
        SimulatedSensors,
        Arc::clone(&state),
        sink.clone(),
        st.acquisition_interval(),
        token.clone(),
    )
    .spawn()
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Falha ao criar thread de aquisição: {e}");
            return ExitCode::FAILURE;
        }
    };

    let receiver = match reader {
        Some(reader) => {
            match CommandReceiverWorker::new(reader, Arc::clone(&queue), token).spawn() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    error!("Falha ao criar thread de recepção: {e}");
                    None
                }
            }
        }
        None => None,
    };

    let input = match console::spawn_input_thread() {
        Ok(rx) => Some(rx),
        Err(e) => {
            warn!("Entrada de console indisponível: {e}");
            None
        }
    };

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   🌱 ESTAÇÃO DE MONITORAMENTO – ATIVA");
    println!("══════════════════════════════════════════════");
    println!("  Servidor:  {}", st.server_addr());
    println!("  Intervalo: {:.1}s", st.acquisition_interval_secs);
    println!("  Tick:      {} ms", st.tick_ms);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    let mut dispatcher = CommandDispatcher::new(
        Arc::clone(&state),
        Arc::clone(&queue),
        Box::new(driver),
        sink,
        config.alerts.clone(),
    );
    let mut ui = ConsoleRenderer::new(st.render_every_ticks);
    let tick = st.tick();

    while !shutdown::signal_received() {
        if let Some(input) = &input {
            while let Ok(channel) = input.try_recv() {
                let cmd = dispatcher.on_user_toggle(channel);
                info!("Toggle do usuário: {}", cmd.token());
            }
        }
        dispatcher.tick(&mut ui);
        std::thread::sleep(tick);
    }

    // ── Shutdown ──
    info!("Sinal de término recebido, encerrando...");
    Workers {
        acquisition,
        receiver,
        closer,
    }
    .stop(trigger);
    drop(dispatcher);
    info!("Recursos liberados (comandos descartados: {})", queue.dropped());

    ExitCode::SUCCESS
}
