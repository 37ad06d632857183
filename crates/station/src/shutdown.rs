//! Coordenação de shutdown entre o loop principal e as threads.
//!
//! O sinal de término (SIGINT/SIGTERM) só marca uma flag global; o loop
//! principal a observa e dispara o [`ShutdownTrigger`]. O trigger marca
//! uma flag compartilhada e derruba um channel, acordando na hora quem
//! está dormindo em [`ShutdownToken::wait`].

use crate::channel::ChannelCloser;
use crate::receiver::ReceiverExit;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info};

/// Flag global marcada pelo handler de sinal. Uma vez `true`, nunca volta.
static SIGNALLED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn on_signal(_sig: libc::c_int) {
    SIGNALLED.store(true, Ordering::Relaxed);
}

/// Instala os handlers de SIGINT e SIGTERM.
#[cfg(unix)]
pub fn install_signal_handlers() {
    // SAFETY: o handler só faz um store atômico (async-signal-safe).
    unsafe {
        libc::signal(libc::SIGINT, on_signal as *const () as libc::sighandler_t);
        libc::signal(libc::SIGTERM, on_signal as *const () as libc::sighandler_t);
    }
}

#[cfg(not(unix))]
pub fn install_signal_handlers() {}

/// `true` depois que um sinal de término chegou.
pub fn signal_received() -> bool {
    SIGNALLED.load(Ordering::Relaxed)
}

/// Cria o par trigger/token.
pub fn channel() -> (ShutdownTrigger, ShutdownToken) {
    let flag = Arc::new(AtomicBool::new(false));
    let (tx, rx) = bounded::<()>(0);
    (
        ShutdownTrigger {
            flag: Arc::clone(&flag),
            wake: Some(tx),
        },
        ShutdownToken { flag, wake: rx },
    )
}

/// Lado que dispara o shutdown. Dropar também dispara.
#[derive(Debug)]
pub struct ShutdownTrigger {
    flag: Arc<AtomicBool>,
    wake: Option<Sender<()>>,
}

impl ShutdownTrigger {
    /// Idempotente.
    pub fn trigger(&mut self) {
        self.flag.store(true, Ordering::Release);
        self.wake.take();
    }
}

impl Drop for ShutdownTrigger {
    fn drop(&mut self) {
        self.trigger();
    }
}

/// Lado observado pelas threads de trabalho.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
    wake: Receiver<()>,
}

impl ShutdownToken {
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Dorme até `timeout` ou até o shutdown. Retorna `true` se foi shutdown.
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.wake.recv_timeout(timeout) {
            Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) | Ok(()) => self.is_triggered(),
        }
    }
}

// ──────────────────────────────────────────────
// Encerramento das threads
// ──────────────────────────────────────────────

/// Threads de trabalho da estação e o handle do socket.
#[derive(Debug)]
pub struct Workers {
    pub acquisition: JoinHandle<()>,
    /// `None` sem canal de telemetria
    pub receiver: Option<JoinHandle<ReceiverExit>>,
    pub closer: Option<ChannelCloser>,
}

impl Workers {
    /// Encerra na ordem: dispara o shutdown, espera a aquisição, fecha o
    /// socket (destrava a leitura pendente) e espera a recepção.
    pub fn stop(self, mut trigger: ShutdownTrigger) -> Option<ReceiverExit> {
        trigger.trigger();
        if self.acquisition.join().is_err() {
            error!("Thread de aquisição terminou com pânico");
        }
        if let Some(closer) = &self.closer {
            closer.close();
        }
        let receiver = self.receiver?;
        match receiver.join() {
            Ok(exit) => {
                info!("Recepção finalizada: {exit:?}");
                Some(exit)
            }
            Err(_) => {
                error!("Thread de recepção terminou com pânico");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{AcquisitionWorker, SimulatedSensors};
    use crate::channel::TelemetrySink;
    use crate::channel::tests::stalled_peer;
    use crate::receiver::CommandReceiverWorker;
    use station_core::{CommandQueue, SharedState};
    use std::thread;
    use std::time::Instant;

    #[test]
    fn wait_times_out_without_trigger() {
        let (_trigger, token) = channel();
        assert!(!token.wait(Duration::from_millis(10)));
        assert!(!token.is_triggered());
    }

    #[test]
    fn trigger_wakes_sleeping_waiter() {
        let (mut trigger, token) = channel();
        let waiter = thread::spawn(move || {
            let start = Instant::now();
            let stopped = token.wait(Duration::from_secs(30));
            (stopped, start.elapsed())
        });

        thread::sleep(Duration::from_millis(20));
        trigger.trigger();
        trigger.trigger();

        let (stopped, elapsed) = waiter.join().unwrap();
        assert!(stopped);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn dropping_trigger_signals_all_clones() {
        let (trigger, token) = channel();
        let other = token.clone();
        drop(trigger);
        assert!(token.is_triggered());
        assert!(other.wait(Duration::from_secs(30)));
    }

    #[test]
    fn stop_joins_both_workers_with_silent_peer() {
        let (_listener, _server, writer, reader, closer) = stalled_peer(Duration::from_secs(1));
        let state = Arc::new(SharedState::new());
        let queue = Arc::new(CommandQueue::new());
        let (trigger, token) = channel();

        let acquisition = AcquisitionWorker::new(
            SimulatedSensors,
            Arc::clone(&state),
            Some(Arc::new(writer) as Arc<dyn TelemetrySink>),
            Duration::from_secs(60),
            token.clone(),
        )
        .spawn()
        .unwrap();
        let receiver = CommandReceiverWorker::new(reader, Arc::clone(&queue), token)
            .spawn()
            .unwrap();
        let workers = Workers {
            acquisition,
            receiver: Some(receiver),
            closer: Some(closer),
        };

        // Recepção bloqueada na leitura, aquisição dormindo no intervalo
        thread::sleep(Duration::from_millis(50));

        let (done_tx, done_rx) = bounded(1);
        thread::spawn(move || {
            done_tx.send(workers.stop(trigger)).ok();
        });
        let exit = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("shutdown não terminou");
        assert!(
            matches!(exit, Some(ReceiverExit::Disconnected | ReceiverExit::Shutdown)),
            "{exit:?}"
        );
        assert!(!state.read_snapshot().history.is_empty());
    }
}
