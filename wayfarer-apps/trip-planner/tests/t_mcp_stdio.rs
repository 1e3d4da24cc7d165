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

//! MCP server integration tests using subprocess with stdio transport.

#![cfg(all(test, feature = "server", feature = "cli"))]

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use serde_json::Value;
use serde_json::json;
use std::process::Stdio;
use std::sync::Once;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::time::Duration;
use tracing_subscriber::EnvFilter;

const TIMEOUT: Duration = Duration::from_secs(3);
const SERVER_BIN: &str = env!("CARGO_BIN_EXE_wayfarer-server");

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_thread_ids(true)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::new("debug"))
            .init();
    });
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Server process with credentials scrubbed so no request leaves the box
fn spawn_stdio_server() -> Result<Child> {
    Command::new(SERVER_BIN)
        .arg("--no-llm")
        .arg("stdio")
        .env_remove("OPENAI_API_KEY")
        .env_remove("AMADEUS_API_KEY")
        .env_remove("AMADEUS_API_SECRET")
        .env("RUST_LOG", "info")
        .stdout(Stdio::piped())
        .stdin(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .context("Failed to spawn wayfarer-server")
}

async fn mcp_initialize(stdin: &mut ChildStdin, stdout: &mut ChildStdout) -> Result<()> {
    let init = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "1.0"}
        }
    });
    let mut init_str = init.to_string();
    init_str.push('\n');
    tracing::debug!("Sending init request...");
    stdin.write_all(init_str.as_bytes()).await?;

    let mut buf = [0u8; 4096];
    let n = tokio::time::timeout(TIMEOUT, stdout.read(&mut buf))
        .await?
        .context("Failed to read init response")?;
    let resp = String::from_utf8_lossy(&buf[..n]).to_string();
    tracing::debug!("Init response received ({} bytes)", resp.len());
    assert!(resp.contains("2.0"), "Should get JSON-RPC init response: {}", resp);

    stdin
        .write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n")
        .await?;
    tracing::debug!("Initialized notification sent");
    Ok(())
}

async fn send_request(stdin: &mut ChildStdin, id: u64, method: &str, params: Value) -> Result<()> {
    let request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    });
    let mut line = request.to_string();
    line.push('\n');
    tracing::debug!("Sending {}", method);
    stdin.write_all(line.as_bytes()).await?;
    Ok(())
}

async fn read_json_response_with_timeout(stdout: &mut ChildStdout, dur: Duration) -> Result<Value> {
    let mut output = String::new();
    let mut buf = [0u8; 4096];

    loop {
        match tokio::time::timeout(dur, stdout.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                output.push_str(&String::from_utf8_lossy(&buf[..n]));
                if let Ok(response) = serde_json::from_str::<Value>(&output) {
                    if response.get("id").is_some() && response.get("result").is_some() {
                        return Ok(response);
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::debug!("Read error: {:?}", e);
                break;
            }
            Err(_) => {
                tracing::debug!("Read timed out after {:?}", dur);
                break;
            }
        }
    }

    if output.is_empty() {
        anyhow::bail!("Stdout output is empty - server produced no response");
    }
    serde_json::from_str(&output).context(format!(
        "Failed to parse JSON response ({} bytes): {}",
        output.len(),
        &output[..output.len().min(500)]
    ))
}

async fn read_stderr_until_done(stderr: &mut ChildStderr) -> Result<String> {
    let mut output = String::new();
    let mut buf = [0u8; 4096];
    let mut iterations = 0;

    while iterations < 10 {
        iterations += 1;
        match tokio::time::timeout(TIMEOUT, stderr.read(&mut buf)).await {
            Ok(Ok(0)) | Err(_) => break,
            Ok(Ok(n)) => {
                let chunk = String::from_utf8_lossy(&buf[..n]);
                output.push_str(&chunk);
                if chunk.contains("input stream terminated") {
                    break;
                }
            }
            Ok(Err(e)) => {
                tracing::debug!("Stderr error: {:?}", e);
                break;
            }
        }
    }
    Ok(output)
}

#[tokio::test]
async fn test_mcp_server_starts_stdio() -> Result<()> {
    init_tracing();
    let mut child = spawn_stdio_server()?;
    let mut stdout = child.stdout.take().context("no stdout")?;
    let mut stderr = child.stderr.take().context("no stderr")?;
    let mut stdin = child.stdin.take().context("no stdin")?;

    mcp_initialize(&mut stdin, &mut stdout)
        .await
        .context("MCP initialize failed")?;

    drop(stdin);
    let stderr_output = read_stderr_until_done(&mut stderr).await?;
    if !stderr_output.is_empty() {
        println!("=== STDERR ===\n{}\n===========", stderr_output);
    }
    drop(child);
    Ok(())
}

#[tokio::test]
async fn test_mcp_lists_trip_tools() -> Result<()> {
    init_tracing();
    let mut child = spawn_stdio_server()?;
    let mut stdout = child.stdout.take().context("no stdout")?;
    let mut stdin = child.stdin.take().context("no stdin")?;

    mcp_initialize(&mut stdin, &mut stdout).await?;
    send_request(&mut stdin, 2, "tools/list", json!({})).await?;
    let response = read_json_response_with_timeout(&mut stdout, TIMEOUT).await?;

    let names: Vec<&str> = response["result"]["tools"]
        .as_array()
        .context("tools/list should return a tools array")?
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    for expected in ["plan_trip", "search_flights", "search_hotels"] {
        assert!(names.contains(&expected), "missing tool {} in {:?}", expected, names);
    }

    let plan_trip = response["result"]["tools"]
        .as_array()
        .and_then(|tools| tools.iter().find(|t| t["name"] == "plan_trip"))
        .context("plan_trip tool")?;
    let required = plan_trip["inputSchema"]["required"].to_string();
    assert!(required.contains("origin_city") && required.contains("start_date"));
    Ok(())
}

#[tokio::test]
async fn test_mcp_plan_trip_rejects_reversed_dates() -> Result<()> {
    init_tracing();
    let mut child = spawn_stdio_server()?;
    let mut stdout = child.stdout.take().context("no stdout")?;
    let mut stdin = child.stdin.take().context("no stdin")?;

    mcp_initialize(&mut stdin, &mut stdout).await?;
    let start = today() + Days::new(30);
    let end = start - Days::new(3);
    send_request(
        &mut stdin,
        2,
        "tools/call",
        json!({
            "name": "plan_trip",
            "arguments": {
                "origin_city": "New York",
                "destination_city": "Paris",
                "start_date": start.format("%Y-%m-%d").to_string(),
                "end_date": end.format("%Y-%m-%d").to_string()
            }
        }),
    )
    .await?;
    let response = read_json_response_with_timeout(&mut stdout, TIMEOUT).await?;

    assert_eq!(response["result"]["isError"], true, "response: {}", response);
    let text = response["result"]["content"][0]["text"].as_str().unwrap_or_default();
    assert!(text.contains("end_date"), "unexpected error text: {}", text);
    Ok(())
}

#[tokio::test]
async fn test_mcp_help_output() -> Result<()> {
    init_tracing();
    let output = Command::new(SERVER_BIN).arg("--help").output().await?;

    assert!(output.status.success(), "Help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wayfarer-server"), "Help should show binary name");
    assert!(stdout.contains("stdio"), "Help should show stdio command");
    assert!(stdout.contains("http"), "Help should show http command");
    assert!(stdout.contains("--site-timeout"), "Help should show planner flags");
    Ok(())
}

#[tokio::test]
async fn test_mcp_version_output() -> Result<()> {
    init_tracing();
    let output = Command::new(SERVER_BIN).arg("--version").output().await?;

    assert!(output.status.success(), "Version should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.1.0"), "Version should show 0.1.0");
    Ok(())
}
