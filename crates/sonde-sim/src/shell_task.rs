//! Virtual shell actor task
//!
//! Owns a [`VirtualShell`] and serves it over an async stream: every read
//! from the stream is one command, answered with the shell's reply.

use std::io;
use std::time::Duration;

use tokio::io::{duplex, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::VirtualShell;

/// Pause between reply fragments
const FRAGMENT_DELAY: Duration = Duration::from_millis(2);

/// Capacity of the in-memory link
const LINK_CAPACITY: usize = 1024;

/// Run the virtual shell task until the stream closes
///
/// Returns the shell so callers can inspect the commands it received.
pub async fn run_virtual_shell_task<S>(mut stream: S, mut shell: VirtualShell) -> io::Result<VirtualShell>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; 256];
    info!("Starting virtual shell task for {}", shell.id());

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            debug!("Virtual shell stream closed for {}", shell.id());
            break;
        }

        let Some(reply) = shell.respond(&buf[..n]) else {
            continue;
        };

        let delay = shell
            .received()
            .last()
            .map(|token| shell.reply_delay(token))
            .unwrap_or_default();
        if !delay.is_zero() {
            debug!("Virtual shell {} holding reply for {:?}", shell.id(), delay);
            tokio::time::sleep(delay).await;
        }

        match shell.fragment_size() {
            Some(size) => {
                for part in reply.chunks(size) {
                    stream.write_all(part).await?;
                    stream.flush().await?;
                    tokio::time::sleep(FRAGMENT_DELAY).await;
                }
            }
            None => {
                stream.write_all(&reply).await?;
                stream.flush().await?;
            }
        }
    }

    Ok(shell)
}

/// Spawn a virtual shell on an in-memory link
///
/// Returns the host end of the link and the task handle.
pub fn spawn_virtual_shell(shell: VirtualShell) -> (DuplexStream, JoinHandle<io::Result<VirtualShell>>) {
    let (host, device) = duplex(LINK_CAPACITY);
    let handle = tokio::spawn(run_virtual_shell_task(device, shell));
    (host, handle)
}
