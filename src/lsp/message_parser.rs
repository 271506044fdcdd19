use crate::error::{FrameError, Result};
use crate::lsp::types::{Message, Notification, Request, ResponseMessage};

fn invalid(err: serde_json::Error) -> FrameError {
    FrameError::InvalidMessage(err.to_string())
}

pub fn parse_request(json: &serde_json::Value) -> Result<Option<Request>> {
    if json.get("method").is_some() && json.get("id").is_some() {
        let request: Request = serde_json::from_value(json.clone()).map_err(invalid)?;
        return Ok(Some(request));
    }
    Ok(None)
}

pub fn parse_notification(json: &serde_json::Value) -> Result<Option<Notification>> {
    if json.get("method").is_some() && json.get("id").is_none() {
        let notification: Notification = serde_json::from_value(json.clone()).map_err(invalid)?;
        return Ok(Some(notification));
    }
    Ok(None)
}

pub fn parse_response(json: &serde_json::Value) -> Result<Option<ResponseMessage>> {
    if json.get("id").is_some() && (json.get("result").is_some() || json.get("error").is_some()) {
        let response: ResponseMessage = serde_json::from_value(json.clone()).map_err(invalid)?;
        return Ok(Some(response));
    }
    Ok(None)
}

/// Classify a decoded value as a request, notification or response.
pub fn classify(json: &serde_json::Value) -> Result<Message> {
    if !json.is_object() {
        return Err(FrameError::InvalidMessage(format!(
            "expected a JSON object, got {json}"
        )));
    }
    if let Some(request) = parse_request(json)? {
        return Ok(Message::Request(request));
    }
    if let Some(notification) = parse_notification(json)? {
        return Ok(Message::Notification(notification));
    }
    if let Some(response) = parse_response(json)? {
        return Ok(Message::Response(response));
    }
    Err(FrameError::InvalidMessage(
        "object has neither method nor result/error".into(),
    ))
}

/// Parse a full JSON payload (bytes) into a classified [`Message`].
pub fn parse_message_from_slice(s: &[u8]) -> Result<Message> {
    let json: serde_json::Value = serde_json::from_slice(s).map_err(FrameError::JsonParse)?;
    classify(&json)
}
