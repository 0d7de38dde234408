//! MCP surface: exposes every registered operation as a tool over stdio.
//!
//! DispatchServer (rmcp ServerHandler)
//!   list_tools -> one Tool per OperationSpec (prefixed name, description, input schema)
//!   call_tool  -> Dispatcher::dispatch, text payload, isError for dispatcher failures
//!
//! stdout carries the protocol; all diagnostics go through `log` (stderr).

use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::transport::stdio;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};

use crate::dispatch::Dispatcher;
use crate::dispatch::compiler::ArgumentMap;
use crate::dispatch::registry::Family;

const INSTRUCTIONS: &str = "Project-analysis (llm_support_*) and clarification-tracking \
(llm_clarify_*) tools. Each call runs one backend command and returns its text report.";

#[derive(Clone)]
pub struct DispatchServer {
    dispatcher: Arc<Dispatcher>,
}

impl DispatchServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        DispatchServer { dispatcher }
    }

    /// Tool descriptors in registration order.
    pub fn tools(&self) -> Vec<Tool> {
        self.dispatcher
            .registry()
            .iter()
            .map(|spec| {
                Tool::new(
                    spec.tool_name(),
                    spec.description,
                    Arc::new(spec.input_schema()),
                )
            })
            .collect()
    }

    /// Dispatch one call; absent arguments behave like an empty object.
    pub async fn call(&self, name: &str, arguments: Option<ArgumentMap>) -> CallToolResult {
        let args = arguments.unwrap_or_default();
        let out = self.dispatcher.dispatch(name, &args).await;
        if out.is_error {
            log::warn!("{name}: {}", out.text);
            CallToolResult::error(vec![Content::text(out.text)])
        } else {
            CallToolResult::success(vec![Content::text(out.text)])
        }
    }
}

impl ServerHandler for DispatchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(ListToolsResult {
                tools: self.tools(),
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            log::debug!("call_tool {}", request.name);
            Ok(self.call(&request.name, request.arguments).await)
        }
    }
}

/// Log what each family would resolve to right now. Missing backends are not fatal:
/// the server still starts and the affected tools answer with an error payload.
pub fn log_backend_probe(dispatcher: &Dispatcher) {
    for family in Family::all() {
        match dispatcher.resolver().probe(*family) {
            Ok(choice) => log::info!("{family} backend: {choice}"),
            Err(e) => log::warn!("{family} backend unavailable: {e}"),
        }
    }
}

/// Serve the registry over stdio until the client disconnects.
pub async fn serve(dispatcher: Arc<Dispatcher>) -> Result<()> {
    ensure!(!dispatcher.registry().is_empty(), "no operations registered");
    log_backend_probe(&dispatcher);
    log::info!("serving {} tools over stdio", dispatcher.registry().len());

    let server = DispatchServer::new(dispatcher)
        .serve(stdio())
        .await
        .context("failed to initialize MCP session on stdio")?;
    let reason = server.waiting().await.context("MCP session failed")?;
    log::info!("MCP session ended: {reason:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatchConfig;
    use serde_json::{Value, json};

    fn server_without_backends() -> (tempfile::TempDir, DispatchServer) {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = DispatchConfig {
            support_native: dir.path().join("llm-support"),
            support_script: dir.path().join("llm-support.py"),
            clarify_script: dir.path().join("llm-clarification.py"),
            ..DispatchConfig::default()
        };
        let d = Dispatcher::new(cfg).unwrap();
        (dir, DispatchServer::new(Arc::new(d)))
    }

    #[test]
    fn tools_cover_both_families_with_prefixed_names() {
        let (_dir, server) = server_without_backends();
        let tools = server.tools();
        assert_eq!(tools.len(), 25);
        let names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
        assert!(names.contains(&"llm_support_grep".to_string()));
        assert!(names.contains(&"llm_clarify_detect_conflicts".to_string()));
        assert!(names.iter().all(|n| n.starts_with("llm_support_") || n.starts_with("llm_clarify_")));
    }

    #[test]
    fn grep_schema_requires_pattern() {
        let (_dir, server) = server_without_backends();
        let grep = server
            .tools()
            .into_iter()
            .find(|t| t.name == "llm_support_grep")
            .unwrap();
        let schema = Value::Object((*grep.input_schema).clone());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["pattern"]["type"], "string");
        assert_eq!(schema["required"], json!(["pattern", "paths"]));
    }

    #[tokio::test]
    async fn unknown_tool_is_error_result() {
        let (_dir, server) = server_without_backends();
        let res = server.call("llm_support_nope", None).await;
        let v = serde_json::to_value(&res).unwrap();
        assert_eq!(v["isError"], true);
        assert_eq!(
            v["content"][0]["text"],
            "ERROR: [UnknownOperation] unknown operation 'llm_support_nope'"
        );
    }

    #[tokio::test]
    async fn missing_backend_reported_not_raised() {
        let (_dir, server) = server_without_backends();
        let res = server.call("llm_support_tree", Some(ArgumentMap::new())).await;
        let v = serde_json::to_value(&res).unwrap();
        assert_eq!(v["isError"], true);
        assert!(
            v["content"][0]["text"]
                .as_str()
                .unwrap()
                .starts_with("ERROR: [NoBackendAvailable]")
        );
    }

    #[test]
    fn info_advertises_tools() {
        let (_dir, server) = server_without_backends();
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("llm_support_"));
    }
}
