use crate::domain::event::LedgerEvent;
use crate::error::{LedgerError, Result};
use std::io::Write;

/// Appends ledger notifications as JSON lines.
pub struct EventWriter<W: Write> {
    sink: W,
}

impl<W: Write> EventWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn write_event(&mut self, event: &LedgerEvent) -> Result<()> {
        serde_json::to_writer(&mut self.sink, event)
            .map_err(|e| LedgerError::InternalError(Box::new(e)))?;
        self.sink.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}
