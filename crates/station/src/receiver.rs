//! Thread de recepção: lê tokens do canal e os coloca na fila de comandos.
//!
//! Estados: RUNNING → (desconexão do peer ou shutdown) → STOPPED. Não há
//! reconexão. Uma leitura bloqueada só é destravada pelo peer ou pelo
//! fechamento do socket, nunca pela flag de shutdown diretamente.

use crate::channel::{ChannelError, CommandSource};
use crate::shutdown::ShutdownToken;
use station_core::CommandQueue;
use station_core::protocol::TokenAssembler;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Tamanho do buffer de leitura.
pub const RECV_BUFFER_SIZE: usize = 128;

/// Motivo de término do loop de recepção.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverExit {
    /// Peer fechou a conexão (ou o socket foi fechado localmente).
    Disconnected,
    /// Erro de leitura.
    Failed,
    /// Shutdown observado entre leituras.
    Shutdown,
}

pub struct CommandReceiverWorker<C> {
    source: C,
    queue: Arc<CommandQueue>,
    shutdown: ShutdownToken,
    /// Tokens que cruzam o limite entre leituras
    assembler: TokenAssembler,
}

impl<C: CommandSource + 'static> CommandReceiverWorker<C> {
    pub fn new(source: C, queue: Arc<CommandQueue>, shutdown: ShutdownToken) -> Self {
        Self {
            source,
            queue,
            shutdown,
            assembler: TokenAssembler::new(),
        }
    }

    pub fn spawn(self) -> std::io::Result<JoinHandle<ReceiverExit>> {
        thread::Builder::new()
            .name("command-receiver".into())
            .spawn(move || self.run())
    }

    pub fn run(mut self) -> ReceiverExit {
        info!("Recepção de comandos iniciada");
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        let exit = loop {
            if self.shutdown.is_triggered() {
                break ReceiverExit::Shutdown;
            }
            match self.source.receive_blocking(&mut buf) {
                Ok(n) => self.enqueue_chunk(&buf[..n]),
                Err(ChannelError::Disconnected) => {
                    if self.assembler.has_pending() {
                        debug!("Token incompleto descartado na desconexão");
                    }
                    info!("Servidor desconectou, encerrando recepção");
                    break ReceiverExit::Disconnected;
                }
                Err(e) => {
                    warn!("Erro ao receber comandos: {e}");
                    break ReceiverExit::Failed;
                }
            }
        };

        info!("Recepção de comandos encerrada ({exit:?})");
        exit
    }

    fn enqueue_chunk(&mut self, chunk: &[u8]) {
        for token in self.assembler.feed(chunk) {
            match token {
                Ok(token) => {
                    debug!("← comando: {token}");
                    if !self.queue.try_enqueue(token.clone()) {
                        warn!("Fila de comandos cheia, descartando: {token}");
                    }
                }
                Err(e) => warn!("Token rejeitado: {e}"),
            }
        }
    }
}
