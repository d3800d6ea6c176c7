//! `HostChannel` que escribe un mensaje JSON por línea.

use std::io::{self, Write};

use lesson_core::{HostChannel, HostMessage, StoreError};
use log::debug;

#[derive(Debug)]
pub struct JsonLinesHostChannel<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesHostChannel<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonLinesHostChannel<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> HostChannel for JsonLinesHostChannel<W> {
    fn post(&mut self, message: &HostMessage) -> Result<(), StoreError> {
        let line = serde_json::to_string(message).map_err(|e| StoreError::Io(e.to_string()))?;
        writeln!(self.out, "{line}").and_then(|_| self.out.flush()).map_err(|e| match e.kind() {
            io::ErrorKind::BrokenPipe => StoreError::ChannelClosed,
            _ => StoreError::Io(e.to_string()),
        })?;
        debug!("post:done bytes={}", line.len());
        Ok(())
    }
}
