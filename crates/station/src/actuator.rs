//! Driver dos atuadores físicos (4 LEDs + buzzer) via ioctl.
//!
//! Se um device não abre, o driver segue só com o rastreamento de estado:
//! as chamadas para aquele device são puladas com
//! [`DriverError::Unavailable`]. A indisponibilidade é logada uma vez, na
//! abertura.

use station_core::ActuatorId;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// Magic dos requests ioctl do driver de LED.
const LED_MAGIC: u8 = b'x';
/// Argumento do ioctl de LED: 0 acende, 1 apaga.
const LED_ON: i32 = 0;
const LED_OFF: i32 = 1;
/// Request do ioctl do buzzer: 0 liga, 1 desliga (argumento fixo 1).
const BEEP_ON: u64 = 0;
const BEEP_OFF: u64 = 1;

/// Equivalente a `_IO(ty, nr)` do Linux (sem direção, sem tamanho).
const fn io_request(ty: u8, nr: u8) -> u64 {
    ((ty as u64) << 8) | nr as u64
}

/// Erros do driver de atuadores.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Device indisponível para {0:?}")]
    Unavailable(ActuatorId),

    #[error("ioctl falhou para {id:?}: {source}")]
    Ioctl {
        id: ActuatorId,
        #[source]
        source: io::Error,
    },
}

/// Interface do driver de atuadores.
pub trait ActuatorDriver: Send {
    fn set_channel(&mut self, id: ActuatorId, on: bool) -> Result<(), DriverError>;
}

/// Driver real sobre os devices de caractere.
#[derive(Debug)]
pub struct DeviceActuatorDriver {
    leds: Option<File>,
    beep: Option<File>,
}

impl DeviceActuatorDriver {
    pub fn open(led_device: &Path, beep_device: &Path) -> Self {
        Self {
            leds: open_device(led_device),
            beep: open_device(beep_device),
        }
    }

    /// `true` se algum device está ausente.
    pub fn is_degraded(&self) -> bool {
        self.leds.is_none() || self.beep.is_none()
    }
}

fn open_device(path: &Path) -> Option<File> {
    match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => {
            info!("✓ Device {} aberto", path.display());
            Some(file)
        }
        Err(e) => {
            warn!(
                "✗ Não foi possível abrir {}: {e} – apenas rastreamento de estado",
                path.display()
            );
            None
        }
    }
}

impl ActuatorDriver for DeviceActuatorDriver {
    fn set_channel(&mut self, id: ActuatorId, on: bool) -> Result<(), DriverError> {
        let (file, request, arg) = if id.is_led() {
            let arg = if on { LED_ON } else { LED_OFF };
            (&self.leds, io_request(LED_MAGIC, id.index()), arg)
        } else {
            let request = if on { BEEP_ON } else { BEEP_OFF };
            (&self.beep, request, 1)
        };

        let file = file.as_ref().ok_or(DriverError::Unavailable(id))?;
        ioctl(file, request, arg).map_err(|source| DriverError::Ioctl { id, source })
    }
}

#[cfg(unix)]
fn ioctl(file: &File, request: u64, arg: i32) -> io::Result<()> {
    use std::os::fd::AsRawFd;

    // SAFETY: fd válido enquanto `file` vive; o request não lê nem escreve
    // memória do processo, o argumento é passado por valor.
    let rc = unsafe { libc::ioctl(file.as_raw_fd(), request as _, arg) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(not(unix))]
fn ioctl(_file: &File, _request: u64, _arg: i32) -> io::Result<()> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_requests_follow_io_encoding() {
        assert_eq!(io_request(LED_MAGIC, 0), 0x7800);
        assert_eq!(io_request(LED_MAGIC, 3), 0x7803);
    }

    #[test]
    fn missing_devices_degrade_to_state_tracking() {
        let mut driver = DeviceActuatorDriver::open(
            Path::new("/nonexistent/station-led"),
            Path::new("/nonexistent/station-beep"),
        );
        assert!(driver.is_degraded());
        for id in [ActuatorId::Led1, ActuatorId::Led4, ActuatorId::Beep] {
            assert!(matches!(
                driver.set_channel(id, true),
                Err(DriverError::Unavailable(got)) if got == id
            ));
        }
    }

    #[cfg(unix)]
    #[test]
    fn ioctl_on_regular_file_reports_error() {
        let dir = std::env::temp_dir().join(format!("station-actuator-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let led = dir.join("led");
        std::fs::write(&led, b"").unwrap();

        let mut driver = DeviceActuatorDriver::open(&led, &dir.join("beep"));
        assert!(driver.is_degraded());
        assert!(matches!(
            driver.set_channel(ActuatorId::Led2, true),
            Err(DriverError::Ioctl { id: ActuatorId::Led2, .. })
        ));
        assert!(matches!(
            driver.set_channel(ActuatorId::Beep, false),
            Err(DriverError::Unavailable(ActuatorId::Beep))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
