//! MCP Server implementation for Wolfram|Alpha
//!
//! Four query tools share one [`WolframClient`]. None of them lets a failure
//! escape as a protocol error: empty input, provider failures and transport
//! problems all come back as an error-flagged text result with a label.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo, Tool},
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use wolfram_core::{
    presets, render_sections, Endpoint, Lookup, PodMap, Query, QueryParams, QueryResult, WolframClient,
    WolframError, NO_RESULT,
};

const INSTRUCTIONS: &str = "Wolfram|Alpha MCP Server - answers math, science and factual questions \
     through Wolfram|Alpha. Use wolfram_math for equations and calculus, wolfram_science for \
     chemistry/physics/biology topics, wolfram_fact for geography, history and statistics, and \
     wolfram_query for anything else or to fetch a single pod by id.";

/// The main Wolfram|Alpha MCP Server
#[derive(Clone)]
pub struct WolframMcpServer {
    client: WolframClient,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Parameter Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WolframQueryParams {
    #[schemars(
        description = "Question or expression, e.g. 'population of China', 'H2O molecular structure', 'what is the speed of light'"
    )]
    pub query: String,
    #[schemars(
        description = "Only return this pod (e.g. 'Result', 'Input', 'Solution'); omit to return every section"
    )]
    pub pod_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MathParams {
    #[schemars(
        description = "Math expression or equation, e.g. 'solve x^2 + 2x + 1 = 0', 'integrate x^2 dx'"
    )]
    pub expression: String,
    #[schemars(description = "Include plot pods (default: false)")]
    pub include_plot: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ScienceParams {
    #[schemars(
        description = "Science topic, e.g. 'H2O molecular structure', 'speed of light', 'carbon properties'"
    )]
    pub topic: String,
    #[schemars(description = "Include structure and visualization pods (default: true)")]
    pub include_visualization: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FactParams {
    #[schemars(
        description = "Factual question, e.g. 'population of France', 'capital of Japan', 'area of Earth'"
    )]
    pub question: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

fn error_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(text.into())])
}

/// Reject empty input before anything touches the network
fn require(value: &str, what: &str) -> Result<Query, CallToolResult> {
    Query::new(value).map_err(|_| error_result(format!("Error: {} must not be empty", what)))
}

fn failed(label: &str, err: &WolframError) -> CallToolResult {
    tracing::warn!(kind = err.kind(), "{} failed: {}", label, err);
    error_result(format!("{} failed: {}", label, err))
}

fn sections_or_placeholder(heading: &str, sections: &PodMap, numbered: bool) -> String {
    if sections.is_empty() {
        format!("{}\n\n{}", heading, NO_RESULT)
    } else {
        render_sections(heading, sections, numbered)
    }
}

/// Textual pods keyed by title alone; repeated titles are merged
fn sections_by_title(result: &QueryResult) -> PodMap {
    let mut map = PodMap::new();
    for pod in &result.pods {
        let texts: Vec<String> = pod.texts().map(str::to_string).collect();
        if !texts.is_empty() {
            map.entry(pod.title.clone()).or_default().extend(texts);
        }
    }
    map
}

// ============================================================================
// Tool Router Implementation
// ============================================================================

#[tool_router]
impl WolframMcpServer {
    pub fn new(client: WolframClient) -> Self {
        tracing::info!(
            "Using Wolfram|Alpha at {} via {}",
            client.signer().host(),
            client.transport_name()
        );

        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "General Wolfram|Alpha query for math, science, facts and more. Returns every text section, or a single pod when pod_id is given."
    )]
    async fn wolfram_query(
        &self,
        Parameters(params): Parameters<WolframQueryParams>,
    ) -> Result<CallToolResult, McpError> {
        let query = match require(&params.query, "query") {
            Ok(q) => q,
            Err(rejected) => return Ok(rejected),
        };

        if let Some(pod_id) = params.pod_id.filter(|p| !p.trim().is_empty()) {
            tracing::info!("Querying pod {} for: {}", pod_id, query.input());
            return Ok(match self.client.pod_by_id(query.input(), &pod_id).await {
                Ok(Lookup::Found(text)) => text_result(format!("Result ({}):\n{}", pod_id, text)),
                Ok(Lookup::NotFound) => text_result(format!("Result ({}):\n{}", pod_id, NO_RESULT)),
                Ok(Lookup::ProviderFailure(msg)) => failed("Query", &WolframError::ProviderFailure(msg)),
                Err(e) => failed("Query", &e),
            });
        }

        tracing::info!("Querying all sections for: {}", query.input());
        Ok(match self.client.sections(&query).await {
            Ok(Lookup::Found(sections)) => text_result(sections_or_placeholder(
                &format!("Query: {}", query.input()),
                &sections,
                true,
            )),
            Ok(Lookup::NotFound) => text_result(format!("Query: {}\n\n{}", query.input(), NO_RESULT)),
            Ok(Lookup::ProviderFailure(msg)) => failed("Query", &WolframError::ProviderFailure(msg)),
            Err(e) => failed("Query", &e),
        })
    }

    #[tool(
        description = "Solve math problems with Wolfram|Alpha: equations, calculus, algebra, series. Use for any calculation."
    )]
    async fn wolfram_math(
        &self,
        Parameters(params): Parameters<MathParams>,
    ) -> Result<CallToolResult, McpError> {
        let query = match require(&params.expression, "math expression") {
            Ok(q) => q,
            Err(rejected) => return Ok(rejected),
        };

        let preset = if params.include_plot.unwrap_or(false) {
            QueryParams::new()
        } else {
            presets::math_plotless()
        };
        let query = query.overlay(&preset);

        tracing::info!("Math query: {}", query.input());
        Ok(match self.client.sections(&query).await {
            Ok(Lookup::Found(sections)) => text_result(sections_or_placeholder(
                &format!("Math: {}", query.input()),
                &sections,
                true,
            )),
            Ok(Lookup::NotFound) => text_result(format!("Math: {}\n\n{}", query.input(), NO_RESULT)),
            Ok(Lookup::ProviderFailure(msg)) => failed("Math query", &WolframError::ProviderFailure(msg)),
            Err(e) => failed("Math query", &e),
        })
    }

    #[tool(
        description = "Science lookups with Wolfram|Alpha: chemistry, physics, biology. Returns results and properties."
    )]
    async fn wolfram_science(
        &self,
        Parameters(params): Parameters<ScienceParams>,
    ) -> Result<CallToolResult, McpError> {
        let query = match require(&params.topic, "science topic") {
            Ok(q) => q,
            Err(rejected) => return Ok(rejected),
        };

        let include_visualization = params.include_visualization.unwrap_or(true);
        let query = query.overlay(&presets::science(include_visualization));

        tracing::info!("Science query: {}", query.input());
        Ok(match self.client.fetch_full(&query).await {
            Ok(Lookup::Found(result)) => text_result(sections_or_placeholder(
                &format!("Science: {}", query.input()),
                &sections_by_title(&result),
                false,
            )),
            Ok(Lookup::NotFound) => text_result(format!("Science: {}\n\n{}", query.input(), NO_RESULT)),
            Ok(Lookup::ProviderFailure(msg)) => {
                failed("Science query", &WolframError::ProviderFailure(msg))
            }
            Err(e) => failed("Science query", &e),
        })
    }

    #[tool(
        description = "Factual lookups with Wolfram|Alpha: geography, history, statistics. Returns the primary result, or all sections when there is none."
    )]
    async fn wolfram_fact(
        &self,
        Parameters(params): Parameters<FactParams>,
    ) -> Result<CallToolResult, McpError> {
        let query = match require(&params.question, "question") {
            Ok(q) => q,
            Err(rejected) => return Ok(rejected),
        };

        tracing::info!("Fact query: {}", query.input());
        match self.client.pod_by_id(query.input(), "Result").await {
            Ok(Lookup::Found(text)) => {
                return Ok(text_result(format!(
                    "Fact: {}\n\nResult:\n{}",
                    query.input(),
                    text
                )))
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(kind = e.kind(), "Result pod lookup failed: {}", e),
        }

        tracing::info!("No Result pod, falling back to all sections");
        Ok(match self.client.sections(&query).await {
            Ok(Lookup::Found(sections)) if !sections.is_empty() => text_result(render_sections(
                &format!("Fact: {}", query.input()),
                &sections,
                false,
            )),
            Ok(Lookup::ProviderFailure(msg)) => failed("Fact query", &WolframError::ProviderFailure(msg)),
            Ok(_) => error_result(format!("Fact query failed: {}", NO_RESULT)),
            Err(e) => failed("Fact query", &e),
        })
    }

    #[tool(description = "Get the Wolfram|Alpha provider configuration in use (credentials omitted).")]
    async fn get_config(&self) -> Result<CallToolResult, McpError> {
        #[derive(Serialize)]
        struct ConfigStatus<'a> {
            host: &'a str,
            endpoint: String,
            app_id_configured: bool,
            transport: &'a str,
            format: &'a str,
            podtimeout: u32,
            scantimeout: u32,
            reinterpret: bool,
        }

        let defaults = self.client.defaults();
        let status = ConfigStatus {
            host: self.client.signer().host(),
            endpoint: format!("https://{}{}", self.client.signer().host(), Endpoint::Query.path()),
            app_id_configured: !self.client.signer().app_id().is_empty(),
            transport: self.client.transport_name(),
            format: &defaults.format,
            podtimeout: defaults.podtimeout,
            scantimeout: defaults.scantimeout,
            reinterpret: defaults.reinterpret,
        };

        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for WolframMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ============================================================================
// In-process dispatch
// ============================================================================

/// Errors from calling a tool in-process
#[derive(Debug, thiserror::Error)]
pub enum ToolCallError {
    /// Tool was not found in the server
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Parameters did not match the tool's schema
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] serde_json::Error),

    /// MCP protocol error
    #[error("mcp error: {0}")]
    Mcp(String),
}

impl From<McpError> for ToolCallError {
    fn from(err: McpError) -> Self {
        ToolCallError::Mcp(err.message.to_string())
    }
}

impl WolframMcpServer {
    pub fn server_name(&self) -> &str {
        "wolfram"
    }

    pub fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    /// Call a tool by name without going through a transport
    pub async fn call_tool(&self, name: &str, params: Value) -> Result<CallToolResult, ToolCallError> {
        match name {
            "wolfram_query" => {
                let params: WolframQueryParams = serde_json::from_value(params)?;
                self.wolfram_query(Parameters(params)).await.map_err(Into::into)
            }

            "wolfram_math" => {
                let params: MathParams = serde_json::from_value(params)?;
                self.wolfram_math(Parameters(params)).await.map_err(Into::into)
            }

            "wolfram_science" => {
                let params: ScienceParams = serde_json::from_value(params)?;
                self.wolfram_science(Parameters(params)).await.map_err(Into::into)
            }

            "wolfram_fact" => {
                let params: FactParams = serde_json::from_value(params)?;
                self.wolfram_fact(Parameters(params)).await.map_err(Into::into)
            }

            "get_config" => self.get_config().await.map_err(Into::into),

            _ => Err(ToolCallError::ToolNotFound(name.to_string())),
        }
    }
}
