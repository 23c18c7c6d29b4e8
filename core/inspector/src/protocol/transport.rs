//! `Content-Length` framing over byte streams.

use log::trace;
use std::io::{self, BufRead, Write};

/// Largest message body a peer may announce, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Something that exchanges framed protocol messages.
pub trait Transport {
    /// Reads the next message body. `None` means the peer closed the stream.
    fn read_message(&mut self) -> io::Result<Option<String>>;

    /// Writes one message body with its header.
    fn write_message(&mut self, message: &str) -> io::Result<()>;
}

/// Framing over any buffered reader and writer.
#[derive(Debug)]
pub struct FramedTransport<R, W> {
    reader: R,
    writer: W,
}

/// Framing over the process's standard streams.
pub type StdioTransport = FramedTransport<io::StdinLock<'static>, io::Stdout>;

impl<R: BufRead, W: Write> FramedTransport<R, W> {
    /// Frames messages over `reader` and `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Gives back the underlying streams.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl StdioTransport {
    /// Frames messages over stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Transport for FramedTransport<R, W> {
    fn read_message(&mut self) -> io::Result<Option<String>> {
        let mut content_length = None;
        let mut seen_header = false;

        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                if seen_header {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream closed inside a message header",
                    ));
                }
                return Ok(None);
            }

            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                if seen_header {
                    break;
                }
                continue;
            }
            seen_header = true;

            if let Some((name, value)) = line.split_once(':')
                && name.trim().eq_ignore_ascii_case("Content-Length")
            {
                content_length = value.trim().parse::<usize>().ok();
            }
        }

        let content_length = content_length
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Missing Content-Length"))?;
        if content_length > MAX_MESSAGE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Content-Length {content_length} exceeds {MAX_MESSAGE_SIZE} bytes"),
            ));
        }

        let mut body = vec![0u8; content_length];
        self.reader.read_exact(&mut body)?;
        let body =
            String::from_utf8(body).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        trace!("<- {body}");
        Ok(Some(body))
    }

    fn write_message(&mut self, message: &str) -> io::Result<()> {
        trace!("-> {message}");
        write!(
            self.writer,
            "Content-Length: {}\r\n\r\n{}",
            message.len(),
            message
        )?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_consecutive_messages() {
        let input = "Content-Length: 2\r\n\r\n{}Content-Length: 4\r\n\r\nnull";
        let mut transport = FramedTransport::new(input.as_bytes(), Vec::new());
        assert_eq!(transport.read_message().expect("readable").as_deref(), Some("{}"));
        assert_eq!(transport.read_message().expect("readable").as_deref(), Some("null"));
        assert_eq!(transport.read_message().expect("readable"), None);
    }

    #[test]
    fn missing_length_is_invalid() {
        let input = "Content-Type: json\r\n\r\n{}";
        let mut transport = FramedTransport::new(input.as_bytes(), Vec::new());
        let error = transport.read_message().expect_err("no length header");
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn oversized_messages_are_rejected_before_reading() {
        let input = format!("Content-Length: {}\r\n\r\n{{}}", usize::MAX);
        let mut transport = FramedTransport::new(input.as_bytes(), Vec::new());
        let error = transport.read_message().expect_err("too large");
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);

        let input = format!("Content-Length: {}\r\n\r\n", MAX_MESSAGE_SIZE + 1);
        let mut transport = FramedTransport::new(input.as_bytes(), Vec::new());
        let error = transport.read_message().expect_err("too large");
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn writes_byte_length_headers() {
        let mut transport = FramedTransport::new(io::empty(), Vec::new());
        transport.write_message("\"\u{2026}\"").expect("writable");
        let (_, written) = transport.into_inner();
        assert_eq!(written, b"Content-Length: 5\r\n\r\n\"\xE2\x80\xA6\"");
    }
}
