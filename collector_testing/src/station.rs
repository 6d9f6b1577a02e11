//! A scripted stand-in for the station console driver.

use std::{io, net::SocketAddr, time::Duration};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::{sleep, timeout},
};

/// TCP client writing readings the way a console driver does.
#[derive(Debug)]
pub struct StationClient {
    stream: TcpStream,
}

impl StationClient {
    /// Connect to a collector.
    ///
    /// # Errors
    ///
    /// Returns the connect error.
    pub async fn connect(addr: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    /// Write `data` in one call.
    ///
    /// # Errors
    ///
    /// Returns the write error.
    pub async fn send(&mut self, data: &str) -> io::Result<()> {
        self.stream.write_all(data.as_bytes()).await
    }

    /// Write each chunk separately, pausing `gap` between them so the
    /// collector sees them as separate reads.
    ///
    /// # Errors
    ///
    /// Returns the first write error.
    pub async fn send_chunks(&mut self, chunks: &[&[u8]], gap: Duration) -> io::Result<()> {
        for chunk in chunks {
            self.stream.write_all(chunk).await?;
            sleep(gap).await;
        }
        Ok(())
    }

    /// Read exactly `len` reply bytes, waiting at most a second.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::TimedOut`] if the reply does not arrive, or
    /// the read error.
    pub async fn read_reply(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; len];
        timeout(Duration::from_secs(1), self.stream.read_exact(&mut buf))
            .await
            .map_err(|_| io::Error::from(io::ErrorKind::TimedOut))??;
        Ok(buf)
    }

    /// Returns `true` if the collector closed the connection within a second.
    pub async fn closed_by_collector(&mut self) -> bool {
        let mut buf = [0_u8; 64];
        matches!(
            timeout(Duration::from_secs(1), self.stream.read(&mut buf)).await,
            Ok(Ok(0) | Err(_))
        )
    }
}
