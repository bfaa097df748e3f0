use std::path::Path;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::LinkStream;

/// Maximum socket path length.
/// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
#[cfg(target_os = "linux")]
const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
const MAX_PATH_LEN: usize = 104;

/// Connect to a serial bridge listening on a Unix domain socket (blocking).
///
/// This is how a pty exported by `socat` or a local panel simulator is
/// reached.
pub fn connect(path: impl AsRef<Path>) -> Result<LinkStream> {
    let path = path.as_ref();

    if path.as_os_str().len() >= MAX_PATH_LEN {
        return Err(TransportError::InvalidEndpoint {
            input: path.display().to_string(),
            reason: "socket path too long",
        });
    }

    let stream =
        std::os::unix::net::UnixStream::connect(path).map_err(|e| TransportError::Connect {
            endpoint: path.display().to_string(),
            source: e,
        })?;
    debug!(?path, "connected to unix domain socket");
    Ok(LinkStream::from(stream))
}
