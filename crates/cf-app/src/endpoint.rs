//! Non-blocking JSON-lines TCP endpoint.
//!
//! The endpoint never blocks: [`Endpoint::poll`] accepts pending
//! connections, drains whatever bytes are available and answers every
//! complete line. It is driven from the dispatch loop between model ticks,
//! so request handling and the tick never overlap.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// Connections sending a longer line without a newline are dropped.
const MAX_LINE: usize = 64 * 1024;

#[derive(Debug)]
struct Client {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: Vec<u8>,
    closed: bool,
}

impl Client {
    /// Read what is available, stopping once the buffer exceeds [`MAX_LINE`].
    fn fill(&mut self) {
        let mut chunk = [0u8; 4096];
        while self.buffer.len() <= MAX_LINE {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    self.closed = true;
                    return;
                }
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(peer = %self.peer, error = %e, "read failed");
                    self.closed = true;
                    return;
                }
            }
        }
    }

    fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }

    fn reply(&mut self, response: &str) {
        let result = self
            .stream
            .write_all(response.as_bytes())
            .and_then(|_| self.stream.write_all(b"\n"));
        if let Err(e) = result {
            debug!(peer = %self.peer, error = %e, "write failed");
            self.closed = true;
        }
    }
}

/// Listener plus its open connections.
#[derive(Debug)]
pub struct Endpoint {
    listener: TcpListener,
    clients: Vec<Client>,
}

impl Endpoint {
    pub fn bind(addr: &str) -> AppResult<Self> {
        let endpoint_err = |source| AppError::Endpoint {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).map_err(endpoint_err)?;
        listener.set_nonblocking(true).map_err(endpoint_err)?;
        info!(addr = %listener.local_addr()?, "endpoint listening");
        Ok(Self {
            listener,
            clients: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn connections(&self) -> usize {
        self.clients.len()
    }

    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nonblocking(true) {
                        warn!(%peer, error = %e, "dropping connection");
                        continue;
                    }
                    debug!(%peer, "client connected");
                    self.clients.push(Client {
                        stream,
                        peer,
                        buffer: Vec::new(),
                        closed: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    return;
                }
            }
        }
    }

    /// Serve every complete request line; returns how many were answered.
    pub fn poll(&mut self, mut handler: impl FnMut(&str) -> String) -> usize {
        self.accept_pending();
        let mut served = 0;
        for client in &mut self.clients {
            client.fill();
            while let Some(line) = client.next_line() {
                if line.is_empty() {
                    continue;
                }
                let response = handler(&line);
                client.reply(&response);
                served += 1;
                if client.closed {
                    break;
                }
            }
            if client.buffer.len() > MAX_LINE {
                warn!(peer = %client.peer, "request line too long, closing");
                client.closed = true;
            }
        }
        self.clients.retain(|c| {
            if c.closed {
                debug!(peer = %c.peer, "client disconnected");
            }
            !c.closed
        });
        served
    }
}
