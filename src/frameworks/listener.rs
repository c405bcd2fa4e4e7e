// Accept loop that surfaces listener faults instead of retrying them forever.

use axum::serve::Listener;
use std::{fmt::Debug, future::Future, io, net::SocketAddr};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream},
    sync::oneshot,
};
use tracing::{debug, error};

/// Something that hands out accepted connections or an accept error.
pub trait AcceptSource: Send + 'static {
    type Io: AsyncRead + AsyncWrite + Unpin + Send + 'static;
    type Addr: Send + Debug;

    fn accept_conn(&mut self) -> impl Future<Output = io::Result<(Self::Io, Self::Addr)>> + Send;

    fn local_addr(&self) -> io::Result<Self::Addr>;
}

impl AcceptSource for TcpListener {
    type Io = TcpStream;
    type Addr = SocketAddr;

    fn accept_conn(&mut self) -> impl Future<Output = io::Result<(Self::Io, Self::Addr)>> + Send {
        TcpListener::accept(self)
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        TcpListener::local_addr(self)
    }
}

/// Wraps an accept source for `axum::serve`. Errors tied to a single
/// connection are skipped; any other accept error is sent once on `fault_tx`
/// and the accept loop parks.
pub struct FaultAwareListener<A> {
    source: A,
    fault_tx: Option<oneshot::Sender<io::Error>>,
}

impl<A: AcceptSource> FaultAwareListener<A> {
    pub fn new(source: A) -> (Self, oneshot::Receiver<io::Error>) {
        let (fault_tx, fault_rx) = oneshot::channel();
        (
            Self {
                source,
                fault_tx: Some(fault_tx),
            },
            fault_rx,
        )
    }
}

impl<A: AcceptSource> Listener for FaultAwareListener<A> {
    type Io = A::Io;
    type Addr = A::Addr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            match self.source.accept_conn().await {
                Ok(conn) => return conn,
                Err(e) if is_connection_error(&e) => {
                    debug!(error = %e, "connection dropped during accept");
                }
                Err(e) => {
                    error!(error = %e, "listener fault");
                    if let Some(fault_tx) = self.fault_tx.take() {
                        let _ = fault_tx.send(e);
                    }
                    std::future::pending::<()>().await;
                }
            }
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        self.source.local_addr()
    }
}

fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_peer_resets_during_accept_then_it_is_not_a_listener_fault() {
        assert!(is_connection_error(&io::Error::from(
            io::ErrorKind::ConnectionReset
        )));
        assert!(!is_connection_error(&io::Error::other("too many open files")));
    }
}
