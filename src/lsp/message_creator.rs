use lsp_types::{ClientCapabilities, InitializeParams, Url, WorkspaceFolder};
use serde::Serialize;

use crate::error::{FrameError, Result};
use crate::lsp::types::{Notification, Request, RequestId};

/// Builds requests and notifications with increasing integer ids.
#[derive(Debug)]
pub struct MessageFactory {
    /// `None` once `i64::MAX` has been handed out.
    next: Option<i64>,
}

impl Default for MessageFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageFactory {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Start numbering so that the next request gets `first_id`.
    pub fn starting_at(first_id: i64) -> Self {
        MessageFactory {
            next: Some(first_id),
        }
    }

    pub fn get_id(&mut self) -> Result<i64> {
        let id = self.next.ok_or(FrameError::IdsExhausted)?;
        self.next = id.checked_add(1);
        Ok(id)
    }

    pub fn create_request<T: Serialize>(&mut self, method: &str, params: T) -> Result<Request> {
        let params = serde_json::to_value(params).map_err(FrameError::Serialization)?;
        Ok(Request::new(
            RequestId::Number(self.get_id()?),
            method.to_string(),
            params,
        ))
    }

    pub fn create_notification<T: Serialize>(
        &mut self,
        method: &str,
        params: T,
    ) -> Result<Notification> {
        let params = serde_json::to_value(params).map_err(FrameError::Serialization)?;
        Ok(Notification::new(method.to_string(), params))
    }

    /// The `initialize` request a client opens a session with.
    ///
    /// Capabilities are left empty; `workspace` adds a single workspace folder.
    pub fn initialize(&mut self, workspace: Option<(Url, String)>) -> Result<Request> {
        let params = InitializeParams {
            process_id: Some(std::process::id()),
            workspace_folders: workspace.map(|(uri, name)| vec![WorkspaceFolder { uri, name }]),
            capabilities: ClientCapabilities::default(),
            ..Default::default()
        };
        self.create_request("initialize", params)
    }

    pub fn initialized_notification(&mut self) -> Result<Notification> {
        self.create_notification("initialized", serde_json::json!({}))
    }

    pub fn shutdown(&mut self) -> Result<Request> {
        self.create_request("shutdown", serde_json::Value::Null)
    }

    pub fn exit(&mut self) -> Result<Notification> {
        self.create_notification("exit", serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_increase_from_one() {
        let mut factory = MessageFactory::new();
        let first = factory.create_request("a", ()).unwrap();
        let second = factory.create_request("b", ()).unwrap();
        assert_eq!(first.id, RequestId::Number(1));
        assert_eq!(second.id, RequestId::Number(2));
    }

    #[test]
    fn test_starting_at() {
        let mut factory = MessageFactory::starting_at(10);
        assert_eq!(factory.get_id().unwrap(), 10);
    }

    #[test]
    fn test_starting_at_extremes() {
        let mut factory = MessageFactory::starting_at(i64::MIN);
        assert_eq!(factory.get_id().unwrap(), i64::MIN);
        assert_eq!(factory.get_id().unwrap(), i64::MIN + 1);

        let mut factory = MessageFactory::starting_at(i64::MAX);
        let request = factory.create_request("shutdown", ()).unwrap();
        assert_eq!(request.id, RequestId::Number(i64::MAX));
        assert!(matches!(
            factory.create_request("shutdown", ()),
            Err(FrameError::IdsExhausted)
        ));
    }

    #[test]
    fn test_notifications_do_not_consume_ids() {
        let mut factory = MessageFactory::new();
        factory.initialized_notification().unwrap();
        assert_eq!(factory.shutdown().unwrap().id, RequestId::Number(1));
    }

    #[test]
    fn test_initialize_request() {
        let mut factory = MessageFactory::new();
        let uri = Url::parse("file:///tmp/project").unwrap();
        let request = factory
            .initialize(Some((uri, "project".to_string())))
            .unwrap();

        assert_eq!(request.method, "initialize");
        assert_eq!(request.jsonrpc, "2.0");
        assert!(request.params["capabilities"].is_object());
        assert_eq!(request.params["processId"], std::process::id());
        assert_eq!(request.params["workspaceFolders"][0]["name"], "project");
    }

    #[test]
    fn test_exit_has_no_params() {
        let exit = MessageFactory::new().exit().unwrap();
        assert_eq!(
            serde_json::to_value(&exit).unwrap(),
            serde_json::json!({"jsonrpc": "2.0", "method": "exit"})
        );
    }
}
