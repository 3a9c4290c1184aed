//! Output stream and acknowledgment prompt shared by all renderers.
//!
//! Writes are best-effort: a closed pipe or a sink that cannot flush must
//! never take the engine down, so I/O errors are logged at `trace` level and
//! dropped.

use std::io::{self, ErrorKind, Read, Stdin, Stdout, Write};

/// Prompt printed before blocking for acknowledgment.
pub const ACK_PROMPT: &str = "\nPress <Enter> to continue\n";

/// A text sink plus the input used to wait for the user.
#[derive(Debug)]
pub struct Terminal<W = Stdout, R = Stdin> {
    out: W,
    input: R,
}

impl Terminal<Stdout, Stdin> {
    /// Process stdout and stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stdin())
    }
}

impl Default for Terminal<Stdout, Stdin> {
    fn default() -> Self {
        Self::stdio()
    }
}

impl<W: Write, R: Read> Terminal<W, R> {
    pub fn new(out: W, input: R) -> Self {
        Self { out, input }
    }

    /// Write `text` with no terminator and force it out.
    pub fn write_partial(&mut self, text: &str) {
        let result = self.out.write_all(text.as_bytes());
        Self::ignore(result);
        self.flush();
    }

    /// Write `text` followed by a line break.
    pub fn write_line(&mut self, text: &str) {
        let result = writeln!(self.out, "{}", text);
        Self::ignore(result);
        self.flush();
    }

    /// Write `text` followed by a carriage return so the next write on a
    /// terminal overwrites it.
    pub fn write_overwritable(&mut self, text: &str) {
        let result = write!(self.out, "{}\r", text);
        Self::ignore(result);
        self.flush();
    }

    pub fn flush(&mut self) {
        let result = self.out.flush();
        Self::ignore(result);
    }

    /// Print [`ACK_PROMPT`] and block until a line (or EOF) is read.
    ///
    /// Input is consumed a byte at a time so nothing past the line break is
    /// taken from a shared stdin.
    pub fn wait_for_ack(&mut self) {
        self.write_partial(ACK_PROMPT);
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => break,
                Ok(_) if byte[0] == b'\n' => break,
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::debug!("Acknowledgment read failed: {}", e);
                    break;
                }
            }
        }
    }

    /// Borrow the underlying sink.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Split back into sink and input.
    pub fn into_parts(self) -> (W, R) {
        (self.out, self.input)
    }

    fn ignore(result: io::Result<()>) {
        if let Err(e) = result {
            tracing::trace!("Console write dropped: {}", e);
        }
    }
}
