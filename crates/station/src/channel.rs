//! Canal de telemetria TCP: conexão única, envio e recepção bloqueantes.
//!
//! Sem reconexão: uma falha de conexão é terminal para a instância e é
//! devolvida ao chamador.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// Erros do canal de telemetria.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Endereço inválido {addr}: {reason}")]
    Address { addr: String, reason: String },

    #[error("Falha ao conectar em {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Falha ao duplicar socket: {0}")]
    Clone(#[source] io::Error),

    #[error("Falha ao enviar: {0}")]
    Send(#[source] io::Error),

    #[error("Falha ao receber: {0}")]
    Receive(#[source] io::Error),

    #[error("Peer desconectou")]
    Disconnected,
}

/// Lado de envio do canal. Compartilhado entre threads.
pub trait TelemetrySink: Send + Sync {
    /// Envio bloqueante, best-effort.
    fn send(&self, bytes: &[u8]) -> Result<(), ChannelError>;
}

/// Lado de recepção do canal. Um único consumidor.
pub trait CommandSource: Send {
    /// Lê até `buf.len()` bytes. Zero bytes vira [`ChannelError::Disconnected`].
    fn receive_blocking(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError>;
}

/// Conexão TCP com o servidor de telemetria.
#[derive(Debug)]
pub struct TelemetryChannel {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TelemetryChannel {
    /// Uma única tentativa de conexão, sem retry.
    ///
    /// `send_timeout` limita cada escrita: um peer que parou de ler faz o
    /// envio falhar com [`ChannelError::Send`] em vez de travar o chamador.
    pub fn connect(
        addr: &str,
        timeout: Duration,
        send_timeout: Duration,
    ) -> Result<Self, ChannelError> {
        let peer = addr
            .to_socket_addrs()
            .map_err(|e| ChannelError::Address {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| ChannelError::Address {
                addr: addr.to_string(),
                reason: "nenhum endereço resolvido".into(),
            })?;

        let stream = TcpStream::connect_timeout(&peer, timeout).map_err(|source| {
            ChannelError::Connect {
                addr: addr.to_string(),
                source,
            }
        })?;
        stream.set_nodelay(true).ok();
        stream
            .set_write_timeout(Some(send_timeout))
            .map_err(|source| ChannelError::Connect {
                addr: addr.to_string(),
                source,
            })?;

        info!("Conectado ao servidor [{peer}]");
        Ok(Self { stream, peer })
    }

    /// Separa o canal em escritor, leitor e um handle para fechar o socket.
    pub fn split(self) -> Result<(ChannelWriter, ChannelReader, ChannelCloser), ChannelError> {
        let reader = self.stream.try_clone().map_err(ChannelError::Clone)?;
        let closer = self.stream.try_clone().map_err(ChannelError::Clone)?;
        Ok((
            ChannelWriter {
                stream: Mutex::new(self.stream),
            },
            ChannelReader { stream: reader },
            ChannelCloser {
                stream: closer,
                peer: self.peer,
            },
        ))
    }
}

/// Escritor do socket. O mutex mantém cada linha inteira no stream.
#[derive(Debug)]
pub struct ChannelWriter {
    stream: Mutex<TcpStream>,
}

impl TelemetrySink for ChannelWriter {
    fn send(&self, bytes: &[u8]) -> Result<(), ChannelError> {
        let mut stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        stream.write_all(bytes).map_err(ChannelError::Send)
    }
}

/// Leitor do socket, usado apenas pela thread de recepção.
#[derive(Debug)]
pub struct ChannelReader {
    stream: TcpStream,
}

impl CommandSource for ChannelReader {
    fn receive_blocking(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        loop {
            match self.stream.read(buf) {
                Ok(0) => return Err(ChannelError::Disconnected),
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ChannelError::Receive(e)),
            }
        }
    }
}

/// Fecha o socket nas duas direções.
///
/// Uma leitura bloqueada em [`ChannelReader`] retorna zero bytes e a thread
/// de recepção termina pelo caminho normal de desconexão.
#[derive(Debug)]
pub struct ChannelCloser {
    stream: TcpStream,
    peer: SocketAddr,
}

impl ChannelCloser {
    pub fn close(&self) {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => info!("Socket com {} fechado", self.peer),
            // Já fechado pelo peer
            Err(e) => debug!("shutdown do socket: {e}"),
        }
    }
}
