//! Serving one connected station.

use std::{fmt, io};

use bytes::BytesMut;
use log::{debug, warn};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite},
    select,
    time::timeout,
};

use crate::{
    consumer::MessageConsumer,
    framer::StreamFramer,
    metrics::{self, ErrorKind},
    scanner::TokenScanner,
    server::{ControlHandle, LoopSettings},
};

/// Why a session ended.
#[derive(Debug)]
pub(in crate::server) enum SessionEnd {
    /// The peer closed its side of the connection.
    PeerClosed,
    /// Reading from the peer failed.
    ReadFailed(io::ErrorKind),
    /// Writing a reply failed.
    WriteFailed(io::ErrorKind),
    /// A controller asked for the connection to be dropped.
    CloseRequested,
    /// A controller asked for the loop to stop.
    Terminated,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => f.write_str("peer closed"),
            Self::ReadFailed(kind) => write!(f, "read failed ({kind})"),
            Self::WriteFailed(kind) => write!(f, "reply write failed ({kind})"),
            Self::CloseRequested => f.write_str("close requested"),
            Self::Terminated => f.write_str("terminated"),
        }
    }
}

/// Read from `stream` until the peer leaves or a controller intervenes.
///
/// Each read is bounded by the configured timeout; an expired timeout only
/// re-checks the stop flags. Replies are written before the next read.
pub(in crate::server) async fn serve_connection<St, S, C>(
    stream: &mut St,
    framer: &mut StreamFramer<S>,
    consumer: &mut C,
    settings: &LoopSettings,
    control: &ControlHandle,
) -> SessionEnd
where
    St: AsyncRead + AsyncWrite + Unpin,
    S: TokenScanner,
    C: MessageConsumer + ?Sized,
{
    let shutdown = control.shutdown_token();
    let mut buf = BytesMut::with_capacity(settings.read_buffer_size);

    loop {
        if control.is_terminating() {
            return SessionEnd::Terminated;
        }
        if control.take_close_request() {
            return SessionEnd::CloseRequested;
        }

        buf.clear();
        let read = select! {
            biased;

            () = shutdown.cancelled() => return SessionEnd::Terminated,
            res = timeout(settings.read_timeout, stream.read_buf(&mut buf)) => res,
        };

        match read {
            Err(_) => {
                tracing::trace!(pending = framer.pending().len(), "read timed out");
            }
            Ok(Ok(0)) => return SessionEnd::PeerClosed,
            Ok(Ok(_)) => {
                let arrival = select! {
                    biased;

                    () = shutdown.cancelled() => return SessionEnd::Terminated,
                    res = framer.process_arrival(&buf, consumer, stream) => res,
                };
                if let Err(e) = arrival {
                    warn!("reply write failed: error={e}");
                    metrics::inc_errors(ErrorKind::Io);
                    return SessionEnd::WriteFailed(e.kind());
                }
            }
            Ok(Err(e)) => {
                debug!("read failed: error={e}");
                control.stats_handle().record_read_failure();
                metrics::inc_errors(ErrorKind::Io);
                return SessionEnd::ReadFailed(e.kind());
            }
        }
    }
}
