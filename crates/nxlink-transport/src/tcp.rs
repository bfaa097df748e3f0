use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::LinkStream;

/// Connect to a serial-over-TCP bridge (ser2net and similar).
///
/// Every resolved address is tried in order; the last failure is reported.
/// Nagle is disabled since frames are small and latency bounds the reply
/// window.
pub fn connect(addr: &str, timeout: Option<Duration>) -> Result<LinkStream> {
    let addrs: Vec<SocketAddr> = addr
        .to_socket_addrs()
        .map_err(|e| TransportError::Connect {
            endpoint: addr.to_string(),
            source: e,
        })?
        .collect();

    let mut last_err = std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "address resolved to nothing",
    );
    for candidate in addrs {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&candidate, timeout),
            None => TcpStream::connect(candidate),
        };
        match attempt {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                debug!(%candidate, "connected to tcp serial bridge");
                return Ok(LinkStream::from(stream));
            }
            Err(err) => {
                debug!(%candidate, %err, "tcp connect attempt failed");
                last_err = err;
            }
        }
    }

    Err(TransportError::Connect {
        endpoint: addr.to_string(),
        source: last_err,
    })
}
