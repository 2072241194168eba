//! Newline-delimited JSON worker streams.
//!
//! Each message is one versioned envelope per line. The server wraps a TCP
//! connection in these; tests use `tokio::io::duplex`.

use crate::error::StreamError;
use crate::stream::{MessageSink, MessageSource};
use async_trait::async_trait;
use membrane_trigger::{ClientMessage, Envelope, ServerMessage};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Writes server messages as JSON lines.
pub struct LineSink<W> {
    writer: Mutex<W>,
}

impl<W> LineSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MessageSink for LineSink<W> {
    async fn send(&self, message: ServerMessage) -> Result<(), StreamError> {
        let line = Envelope::new(message)
            .to_json_line()
            .map_err(|e| StreamError::Encode {
                message: e.to_string(),
            })?;

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| StreamError::Io {
                message: e.to_string(),
            })?;
        writer.flush().await.map_err(|e| StreamError::Io {
            message: e.to_string(),
        })
    }
}

/// Reads client messages from JSON lines.
pub struct LineSource<R> {
    reader: R,
    line: String,
}

impl<R> LineSource<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> MessageSource for LineSource<R> {
    async fn recv(&mut self) -> Result<Option<ClientMessage>, StreamError> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .await
                .map_err(|e| StreamError::Io {
                    message: e.to_string(),
                })?;
            if read == 0 {
                return Ok(None);
            }
            if self.line.trim().is_empty() {
                continue;
            }

            let envelope: Envelope<ClientMessage> = Envelope::from_json_line(&self.line)
                .map_err(|e| StreamError::Decode {
                    message: e.to_string(),
                })?;
            return Ok(Some(envelope.into_payload()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use membrane_trigger::{ServerContent, Trigger, TriggerResponse, WorkerRegistration};
    use tokio::io::{AsyncReadExt, BufReader};

    #[tokio::test]
    async fn reads_client_lines_and_skips_blanks() {
        let (mut worker, membrane) = tokio::io::duplex(4096);
        let mut source = LineSource::new(BufReader::new(membrane));

        let init = Envelope::new(ClientMessage::init(WorkerRegistration::CatchAll))
            .to_json_line()
            .expect("encode");
        worker.write_all(b"\n").await.expect("write blank");
        worker.write_all(init.as_bytes()).await.expect("write init");
        drop(worker);

        let message = source.recv().await.expect("recv").expect("message");
        assert_eq!(message, ClientMessage::init(WorkerRegistration::CatchAll));
        assert_eq!(source.recv().await.expect("recv at eof"), None);
    }

    #[tokio::test]
    async fn writes_one_enveloped_line_per_message() {
        let (membrane, mut worker) = tokio::io::duplex(4096);
        let sink = LineSink::new(membrane);

        sink.send(ServerMessage::trigger_request(
            "tkt_1",
            Trigger::topic("orders", b"hi".to_vec()),
        ))
        .await
        .expect("send");
        drop(sink);

        let mut written = String::new();
        worker
            .read_to_string(&mut written)
            .await
            .expect("read written");
        let decoded: Envelope<ServerMessage> =
            Envelope::from_json_line(&written).expect("decode");
        let message = decoded.into_payload();
        assert_eq!(message.id, "tkt_1");
        assert!(matches!(message.content, ServerContent::TriggerRequest(_)));
    }

    #[tokio::test]
    async fn wrong_version_is_a_decode_error() {
        let (mut worker, membrane) = tokio::io::duplex(4096);
        let mut source = LineSource::new(BufReader::new(membrane));

        let mut line = serde_json::to_string(&Envelope {
            version: 7,
            payload: ClientMessage::response("tkt_1", TriggerResponse::Topic { success: true }),
        })
        .expect("encode");
        line.push('\n');
        worker.write_all(line.as_bytes()).await.expect("write");

        let err = source.recv().await.unwrap_err();
        assert!(matches!(err, StreamError::Decode { .. }));
        assert!(err.to_string().contains("version 7"));
    }
}
