//! Raw TCP printing
//!
//! Most label printers with an Ethernet port accept the command stream on
//! TCP port 9100. Unlike USB there is nothing to claim; the open stream is
//! the handle.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

use super::{Link, classify_write_error};
use crate::error::{PrintError, PrintResult};

pub const DEFAULT_NETWORK_PORT: u16 = 9100;

/// Open TCP connection to a printer
#[derive(Debug)]
pub struct NetworkLink {
    addr: SocketAddr,
    stream: Option<TcpStream>,
}

impl NetworkLink {
    /// Connect with a bounded wait
    #[instrument(skip(timeout))]
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> PrintResult<Self> {
        let addr = resolve(host, port).await?;

        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", addr)))?
            .map_err(|e| PrintError::DeviceNotFound(format!("{}: {}", addr, e)))?;
        // small command buffers; do not hold them back
        let _ = stream.set_nodelay(true);

        info!(%addr, "Connected to network printer");
        Ok(Self {
            addr,
            stream: Some(stream),
        })
    }
}

async fn resolve(host: &str, port: u16) -> PrintResult<SocketAddr> {
    let target = format!("{}:{}", host, port);
    if let Ok(addr) = target.parse() {
        return Ok(addr);
    }
    tokio::net::lookup_host(&target)
        .await
        .map_err(|e| PrintError::DeviceNotFound(format!("{}: {}", target, e)))?
        .next()
        .ok_or_else(|| PrintError::DeviceNotFound(format!("{}: no address", target)))
}

#[async_trait]
impl Link for NetworkLink {
    #[instrument(skip(self, data), fields(addr = %self.addr, data_len = data.len()))]
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let target = self.addr.to_string();
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| PrintError::DeviceGone(format!("{}: stream closed", target)))?;

        stream
            .write_all(data)
            .await
            .map_err(|e| classify_write_error(&target, e))?;
        stream
            .flush()
            .await
            .map_err(|e| classify_write_error(&target, e))?;

        info!("Sent {} bytes", data.len());
        Ok(())
    }

    async fn release(&mut self) -> PrintResult<()> {
        if let Some(mut stream) = self.stream.take()
            && let Err(e) = stream.shutdown().await
        {
            warn!(addr = %self.addr, error = %e, "Shutdown failed");
            return Err(PrintError::Io(e));
        }
        Ok(())
    }
}
