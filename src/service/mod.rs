//! Editor language service over stdio.
//!
//! Messages are framed with `Content-Length` headers, JSON-RPC 2.0
//! bodies. Stdout belongs to the transport, so terminal logging is
//! silenced before the loop starts. The service never touches the
//! compiler snapshot: it parses open buffers independently, which also
//! keeps it usable in projects that have never been built.

pub mod documents;
pub mod messages;

use crate::utils::log::silence;
use anyhow::{Context, Result, bail};
use messages::{
    Decoded, IncomingMessage, InitializeResult, Notification, NotificationMessage,
    PublishDiagnosticsParams, Request, ResponseMessage,
};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, BufRead, BufReader, Read, Write};

enum Flow {
    Continue,
    Exit,
}

/// Run the language service until the client disconnects or sends
/// `exit`.
pub fn run() -> Result<()> {
    silence();

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    loop {
        let Some(raw) = read_message(&mut reader)? else {
            break;
        };
        let Ok(message) = serde_json::from_str::<IncomingMessage>(&raw) else {
            continue;
        };
        if let Flow::Exit = dispatch(message, &mut writer)? {
            break;
        }
    }

    Ok(())
}

/// Read one framed message body. `None` on clean EOF.
fn read_message(reader: &mut impl BufRead) -> Result<Option<String>> {
    let mut content_length: Option<usize> = None;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Content-Length:") {
            content_length = value.trim().parse().ok();
        }
    }

    let Some(length) = content_length else {
        bail!("message frame without a Content-Length header");
    };

    let mut buffer = vec![0u8; length];
    reader
        .read_exact(&mut buffer)
        .context("truncated message frame")?;
    Ok(Some(String::from_utf8(buffer)?))
}

fn write_message(writer: &mut impl Write, payload: &impl Serialize) -> Result<()> {
    let body = serde_json::to_string(payload)?;
    write!(writer, "Content-Length: {}\r\n\r\n{body}", body.len())?;
    writer.flush()?;
    Ok(())
}

fn publish(writer: &mut impl Write, params: PublishDiagnosticsParams) -> Result<()> {
    let notification = NotificationMessage::new(
        "textDocument/publishDiagnostics",
        serde_json::to_value(params)?,
    );
    write_message(writer, &notification)
}

fn respond_ok(writer: &mut impl Write, id: Value, result: impl Serialize) -> Result<()> {
    let result = serde_json::to_value(result)?;
    write_message(writer, &ResponseMessage::success(id, result))
}

fn dispatch(message: IncomingMessage, writer: &mut impl Write) -> Result<Flow> {
    match message.decode() {
        Decoded::Request {
            id,
            request: Err(err),
        } => {
            let response = ResponseMessage::failure(id, err.code(), err.to_string());
            write_message(writer, &response)?;
        }

        Decoded::Request {
            id,
            request: Ok(request),
        } => match request {
            Request::Initialize => respond_ok(writer, id, InitializeResult::default())?,
            Request::Shutdown => respond_ok(writer, id, Value::Null)?,
            Request::Hover(params) => {
                let hover = documents::hover(&params.text_document.uri, params.position);
                respond_ok(writer, id, hover)?;
            }
            Request::CodeAction(params) => {
                let actions =
                    documents::code_actions(&params.text_document.uri, &params.context.diagnostics);
                respond_ok(writer, id, actions)?;
            }
        },

        Decoded::Notification(notification) => match notification {
            Notification::Initialized => {}
            Notification::DidOpen(params) => {
                let item = params.text_document;
                publish(writer, documents::refresh(&item.uri, item.text))?;
            }
            Notification::DidChange(mut params) => {
                // Full sync: the last change event carries the whole text
                if let Some(change) = params.content_changes.pop() {
                    publish(
                        writer,
                        documents::refresh(&params.text_document.uri, change.text),
                    )?;
                }
            }
            Notification::DidClose(params) => {
                publish(writer, documents::close(&params.text_document.uri))?;
            }
            Notification::Exit => return Ok(Flow::Exit),
            Notification::Ignored => {}
        },
    }

    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    fn frame(body: &str) -> Vec<u8> {
        format!("Content-Length: {}\r\n\r\n{body}", body.len()).into_bytes()
    }

    fn dispatch_json(message: Value) -> String {
        let message: IncomingMessage = serde_json::from_value(message).unwrap();
        let mut out = Vec::new();
        dispatch(message, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_read_message_unframes_body() {
        let mut reader = Cursor::new(frame(r#"{"method":"initialized"}"#));
        let body = read_message(&mut reader).unwrap().unwrap();
        assert_eq!(body, r#"{"method":"initialized"}"#);
    }

    #[test]
    fn test_read_message_eof_is_none() {
        let mut reader = Cursor::new(Vec::new());
        assert!(read_message(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_read_message_ignores_extra_headers() {
        let body = r#"{"method":"initialized"}"#;
        let raw = format!(
            "Content-Type: application/vscode-jsonrpc\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let mut reader = Cursor::new(raw.into_bytes());
        assert_eq!(read_message(&mut reader).unwrap().unwrap(), body);
    }

    #[test]
    fn test_read_message_without_length_is_an_error() {
        let mut reader = Cursor::new(b"X-Other: 1\r\n\r\nbody".to_vec());
        assert!(read_message(&mut reader).is_err());
    }

    #[test]
    fn test_write_message_frames_payload() {
        let mut out = Vec::new();
        write_message(&mut out, &json!({"ok": true})).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("Content-Length: "));
        assert!(out.ends_with(r#"{"ok":true}"#));
    }

    #[test]
    fn test_initialize_advertises_capabilities() {
        let out = dispatch_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {}
        }));
        assert!(out.contains("textDocumentSync"));
        assert!(out.contains("hoverProvider"));
    }

    #[test]
    fn test_unknown_request_gets_method_not_found() {
        let out = dispatch_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "workspace/symbol",
            "params": {}
        }));
        assert!(out.contains("-32601"));
        assert!(out.contains("workspace/symbol"));
    }

    #[test]
    fn test_unknown_notification_is_ignored() {
        let out = dispatch_json(json!({
            "jsonrpc": "2.0",
            "method": "$/setTrace",
            "params": {"value": "off"}
        }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_did_open_publishes_diagnostics() {
        let out = dispatch_json(json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didOpen",
            "params": {
                "textDocument": {
                    "uri": "file:///proj/src/pages/opened.rsx",
                    "languageId": "rsx",
                    "version": 1,
                    "text": "<script>\nlte x = 5;\n</script>\n"
                }
            }
        }));
        assert!(out.contains("textDocument/publishDiagnostics"));
        assert!(out.contains("suggestions"));
    }

    #[test]
    fn test_exit_breaks_the_loop() {
        let message: IncomingMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "exit"
        }))
        .unwrap();
        let mut out = Vec::new();
        assert!(matches!(dispatch(message, &mut out).unwrap(), Flow::Exit));
    }

    #[test]
    fn test_hover_with_bad_params_reports_invalid() {
        let out = dispatch_json(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "textDocument/hover",
            "params": {"nope": true}
        }));
        assert!(out.contains("-32602"));
    }
}
