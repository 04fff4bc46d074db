//! Wire types for the editor service.
//!
//! JSON-RPC 2.0 messages plus the slice of the language server
//! protocol the service implements: lifecycle, full-text document
//! sync, published diagnostics, hover, and quickfix code actions.
//! Positions are zero-based lines and character columns, matching the
//! conversions in `document::diagnostic`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const JSONRPC_VERSION: &str = "2.0";

/// Request could not be decoded into valid parameters.
pub const INVALID_PARAMS: i64 = -32602;
/// Request named a method the service does not implement.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Any incoming message: a request when `id` is present, otherwise a
/// notification.
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// A request the service answers.
#[derive(Debug)]
pub enum Request {
    Initialize,
    Shutdown,
    Hover(HoverParams),
    CodeAction(CodeActionParams),
}

/// A client notification the service reacts to. Anything untracked
/// (`$/setTrace`, malformed bodies) decodes to `Ignored`.
#[derive(Debug)]
pub enum Notification {
    Initialized,
    DidOpen(DidOpenParams),
    DidChange(DidChangeParams),
    DidClose(DidCloseParams),
    Exit,
    Ignored,
}

/// An [`IncomingMessage`] split into its typed form. Requests that
/// fail to decode keep their `id` so the caller can still answer them
/// with an error.
#[derive(Debug)]
pub enum Decoded {
    Request {
        id: Value,
        request: Result<Request, DecodeError>,
    },
    Notification(Notification),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("method not found: {0}")]
    MethodNotFound(String),
    #[error("invalid params: {0}")]
    InvalidParams(#[from] serde_json::Error),
}

impl DecodeError {
    pub fn code(&self) -> i64 {
        match self {
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) => INVALID_PARAMS,
        }
    }
}

impl IncomingMessage {
    pub fn decode(self) -> Decoded {
        let Self { id, method, params } = self;
        match id {
            Some(id) => {
                let request = match method.as_str() {
                    "initialize" => Ok(Request::Initialize),
                    "shutdown" => Ok(Request::Shutdown),
                    "textDocument/hover" => serde_json::from_value(params)
                        .map(Request::Hover)
                        .map_err(DecodeError::from),
                    "textDocument/codeAction" => serde_json::from_value(params)
                        .map(Request::CodeAction)
                        .map_err(DecodeError::from),
                    _ => Err(DecodeError::MethodNotFound(method)),
                };
                Decoded::Request { id, request }
            }
            None => {
                let notification = match method.as_str() {
                    "initialized" => Notification::Initialized,
                    "textDocument/didOpen" => serde_json::from_value(params)
                        .map(Notification::DidOpen)
                        .unwrap_or(Notification::Ignored),
                    "textDocument/didChange" => serde_json::from_value(params)
                        .map(Notification::DidChange)
                        .unwrap_or(Notification::Ignored),
                    "textDocument/didClose" => serde_json::from_value(params)
                        .map(Notification::DidClose)
                        .unwrap_or(Notification::Ignored),
                    "exit" => Notification::Exit,
                    _ => Notification::Ignored,
                };
                Decoded::Notification(notification)
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseMessage {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl ResponseMessage {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(ResponseError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
}

/// Server-initiated notification, e.g. published diagnostics.
#[derive(Debug, Serialize)]
pub struct NotificationMessage {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
}

impl NotificationMessage {
    pub fn new(method: &'static str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Deserialize)]
pub struct TextDocumentIdentifier {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentItem {
    pub uri: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidOpenParams {
    pub text_document: TextDocumentItem,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidChangeParams {
    pub text_document: TextDocumentIdentifier,
    pub content_changes: Vec<ContentChange>,
}

/// Full-sync change event; only the final text matters.
#[derive(Debug, Deserialize)]
pub struct ContentChange {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidCloseParams {
    pub text_document: TextDocumentIdentifier,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverParams {
    pub text_document: TextDocumentIdentifier,
    pub position: Position,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeActionParams {
    pub text_document: TextDocumentIdentifier,
    pub context: CodeActionContext,
}

#[derive(Debug, Deserialize)]
pub struct CodeActionContext {
    #[serde(default)]
    pub diagnostics: Vec<LspDiagnostic>,
}

/// Protocol diagnostic. Published by the service and echoed back by
/// the client inside code action requests, `data` included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LspDiagnostic {
    pub range: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub const SEVERITY_ERROR: u8 = 1;
pub const SEVERITY_WARNING: u8 = 2;
pub const SEVERITY_HINT: u8 = 4;

#[derive(Debug, Serialize)]
pub struct PublishDiagnosticsParams {
    pub uri: String,
    pub diagnostics: Vec<LspDiagnostic>,
}

#[derive(Debug, Serialize)]
pub struct Hover {
    pub contents: MarkupContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

#[derive(Debug, Serialize)]
pub struct MarkupContent {
    pub kind: &'static str,
    pub value: String,
}

impl MarkupContent {
    pub fn markdown(value: String) -> Self {
        Self {
            kind: "markdown",
            value,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CodeAction {
    pub title: String,
    pub kind: &'static str,
    pub edit: WorkspaceEdit,
}

#[derive(Debug, Serialize)]
pub struct WorkspaceEdit {
    pub changes: HashMap<String, Vec<TextEdit>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    /// 1 = full document sync on every change.
    pub text_document_sync: u8,
    pub hover_provider: bool,
    pub code_action_provider: bool,
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: &'static str,
    pub version: &'static str,
}

impl Default for InitializeResult {
    fn default() -> Self {
        Self {
            capabilities: ServerCapabilities {
                text_document_sync: 1,
                hover_provider: true,
                code_action_provider: true,
            },
            server_info: ServerInfo {
                name: "rsx",
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}
