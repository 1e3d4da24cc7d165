//!  Wayfarer Trip Planner
//!
//!  Copyright (C) 2026  The Wayfarer Developers
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Server Entry Point
//!
//! - `wayfarer-server stdio`: MCP tools over stdio (for desktop LLM clients)
//! - `wayfarer-server http`: REST API under `/api`, MCP tools under `/mcp`

use anyhow::{Context, Error, Result};
use clap::{Parser, Subcommand};
use rmcp::handler::server::{ServerHandler, tool::ToolRouter, wrapper::Parameters};
use rmcp::service::serve_server;
use rmcp::tool;
use rmcp::tool_router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wayfarer_trip_planner::{Category, PlannerArgs, TripAggregator, TripQueryInput, rest_api};

#[derive(Parser, Debug)]
#[command(name = "wayfarer-server")]
#[command(
    author,
    version,
    about = "Trip planner server: REST API and MCP tools (flights, hotels, activities, travel info)"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    planner: PlannerArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run MCP server over stdio (for Claude Desktop, etc.)
    Stdio,

    /// Run REST API and MCP server over HTTP
    Http {
        #[arg(long, env = "WAYFARER_HOST", default_value = "0.0.0.0")]
        host: String,

        #[arg(long, env = "WAYFARER_PORT", default_value = "8080")]
        port: u16,
    },
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct FlightsInput {
    pub origin_city: String,
    pub destination_city: String,
    /// YYYY-MM-DD
    pub date: String,
    /// YYYY-MM-DD, omit for one-way
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travelers: Option<u32>,
    /// economy | premium_economy | business | first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_class: Option<String>,
}

impl From<FlightsInput> for TripQueryInput {
    fn from(input: FlightsInput) -> Self {
        let end_date = input.return_date.unwrap_or_else(|| input.date.clone());
        TripQueryInput {
            travelers: input.travelers,
            flight_class: input.flight_class,
            include_activities: Some(false),
            ..TripQueryInput::new(input.origin_city, input.destination_city, input.date, end_date)
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub struct HotelsInput {
    pub location: String,
    /// YYYY-MM-DD
    pub checkin_date: String,
    /// YYYY-MM-DD
    pub checkout_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guests: Option<u32>,
    /// budget | moderate | luxury
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_level: Option<String>,
    /// hotel, hostel, apartment...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation_type: Option<String>,
}

impl From<HotelsInput> for TripQueryInput {
    fn from(input: HotelsInput) -> Self {
        // a hotel search has no origin; the location stands in for it
        TripQueryInput {
            travelers: input.guests,
            budget_level: input.budget_level,
            accommodation_type: input.accommodation_type,
            include_activities: Some(false),
            ..TripQueryInput::new(
                input.location.clone(),
                input.location,
                input.checkin_date,
                input.checkout_date,
            )
        }
    }
}

#[derive(Clone)]
pub struct TripPlannerServer {
    aggregator: Arc<TripAggregator>,
    tool_router: ToolRouter<Self>,
}

impl TripPlannerServer {
    pub fn new(aggregator: Arc<TripAggregator>) -> Self {
        Self {
            aggregator,
            tool_router: Self::tool_router(),
        }
    }

    async fn search(&self, input: TripQueryInput, category: Category) -> Result<String, String> {
        let query = input.validate().map_err(|e| e.to_string())?;
        let result = self.aggregator.search_category(&query, category).await;
        serde_json::to_string(&result).map_err(|e| e.to_string())
    }
}

#[tool_router]
impl TripPlannerServer {
    #[tool(
        name = "plan_trip",
        description = "Plan a trip: flights, accommodations, activities and travel info (visa, advisories, health) in one envelope. Parameters: origin_city, destination_city, start_date (YYYY-MM-DD), end_date (YYYY-MM-DD), origin_country, destination_country, travelers (1+), budget_level (budget/moderate/luxury), trip_type, accommodation_type, flight_class (economy/premium_economy/business/first), include_activities."
    )]
    async fn plan_trip(&self, params: Parameters<TripQueryInput>) -> Result<String, String> {
        let query = params.0.validate().map_err(|e| e.to_string())?;
        let plan = self.aggregator.plan(&query).await;
        serde_json::to_string(&plan).map_err(|e| e.to_string())
    }

    #[tool(
        name = "search_flights",
        description = "Search flights across several sites, deduplicated and ranked by price. Parameters: origin_city, destination_city, date (YYYY-MM-DD), return_date (YYYY-MM-DD, optional), travelers (1+), flight_class (economy/premium_economy/business/first)."
    )]
    async fn search_flights(&self, params: Parameters<FlightsInput>) -> Result<String, String> {
        self.search(params.0.into(), Category::Flights).await
    }

    #[tool(
        name = "search_hotels",
        description = "Search accommodations across several sites, deduplicated and ranked by nightly price. Parameters: location (city), checkin_date (YYYY-MM-DD), checkout_date (YYYY-MM-DD), guests (1+), budget_level (budget/moderate/luxury), accommodation_type."
    )]
    async fn search_hotels(&self, params: Parameters<HotelsInput>) -> Result<String, String> {
        self.search(params.0.into(), Category::Accommodations).await
    }
}

impl ServerHandler for TripPlannerServer {
    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<rmcp::model::ListToolsResult, rmcp::ErrorData>> + Send + '_
    {
        Box::pin(async move {
            let tools = self.tool_router.list_all();
            tracing::debug!("Returning {} tools", tools.len());
            Ok(rmcp::model::ListToolsResult::with_all_items(tools))
        })
    }

    fn call_tool(
        &self,
        request: rmcp::model::CallToolRequestParam,
        context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<rmcp::model::CallToolResult, rmcp::ErrorData>> + Send + '_
    {
        let router = self.tool_router.clone();
        let self_clone = self.clone();
        Box::pin(async move {
            tracing::info!("[mcp] tool call: {}", request.name);
            let context =
                rmcp::handler::server::tool::ToolCallContext::new(&self_clone, request, context);
            router.call(context).await
        })
    }

    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::V_2025_03_26,
            capabilities: rmcp::model::ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                ..Default::default()
            },
            server_info: rmcp::model::Implementation::from_build_env(),
            instructions: Some(
                "Use plan_trip for a complete itinerary; search_flights and search_hotels for a single category."
                    .to_string(),
            ),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".to_string().into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse();
    tracing::debug!("Parsed args: {:?}", args.command);

    let config = args.planner.into_config().context("Invalid configuration")?;
    let aggregator = Arc::new(TripAggregator::from_config(config).context("Failed to create trip aggregator")?);

    match args.command {
        Command::Stdio => {
            eprintln!("Starting MCP server over stdio...");
            let server = TripPlannerServer::new(aggregator);
            let (stdin, stdout) = rmcp::transport::io::stdio();
            let _running = serve_server(Arc::new(server), (stdin, stdout))
                .await
                .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
            tracing::debug!("Server running. Press Ctrl+C to stop.");
            std::future::pending::<()>().await;
        }
        Command::Http { host, port } => {
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .context("Invalid host:port")?;
            let server = TripPlannerServer::new(Arc::clone(&aggregator));
            let session_manager = Arc::new(LocalSessionManager::default());
            let config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..Default::default()
            };
            let service =
                StreamableHttpService::new(move || Ok(server.clone()), session_manager, config);
            let app = rest_api::router(aggregator).nest_service("/mcp", service);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .context("Failed to bind to address")?;
            tracing::info!("Listening on {} (REST under /api, MCP under /mcp)", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("HTTP server error")?;
        }
    }

    Ok(())
}
