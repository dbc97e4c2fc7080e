//! SDW CLI - Command-line interface for the SDW Order Runner

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8721";
const WATCH_INTERVAL_MS: u64 = 750;

#[derive(Parser)]
#[command(name = "sdw")]
#[command(about = "SDW Order Runner CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "SDW_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start processing an order
    Start {
        /// Wholesale order number (digits only)
        order_number: String,

        /// Card slot to pay with
        #[arg(short, long, default_value = "primary")]
        card: String,

        /// Processing mode: order or quote
        #[arg(short, long, default_value = "order")]
        mode: String,

        /// Link to an existing quote on the wholesale site
        #[arg(long)]
        quote_link: Option<String>,

        /// Keep polling and print progress until the job settles
        #[arg(short, long)]
        watch: bool,
    },

    /// Show one job's status
    Status {
        /// Job ID
        job_id: String,

        /// Keep polling and print progress until the job settles
        #[arg(short, long)]
        watch: bool,
    },

    /// Confirm a purchase awaiting confirmation
    Confirm {
        /// Job ID
        job_id: String,
    },

    /// Answer a pending worker prompt
    Input {
        /// Job ID
        job_id: String,

        /// Response as JSON string
        #[arg(long)]
        response: String,
    },

    /// Cancel a job
    Cancel {
        /// Job ID
        job_id: String,
    },

    /// Show daemon statistics
    Stats,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct StartResult {
    job_id: String,
    order_number: String,
    status: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn status_color(status: &str) -> colored::ColoredString {
    match status {
        "completed" => status.green(),
        "failed" => status.red(),
        "cancelled" => status.yellow(),
        "awaiting_confirmation" | "awaiting_user_input" => status.cyan(),
        other => other.normal(),
    }
}

fn print_snapshot(snap: &serde_json::Value) {
    let status = snap["status"].as_str().unwrap_or("?");
    let message = snap["progress_message"].as_str().unwrap_or("");
    println!("  {} {}", status_color(status).bold(), message);

    if status == "awaiting_confirmation" {
        println!(
            "  {} shipping {} / total {}",
            "Pricing:".bold(),
            snap["calculated_shipping"],
            snap["calculated_total"]
        );
        println!(
            "  Run {} to place the order",
            format!("sdw confirm {}", snap["job_id"].as_str().unwrap_or("?")).cyan()
        );
    }

    if status == "awaiting_user_input" {
        println!(
            "  {} {}",
            "Prompt:".bold(),
            snap["pending_prompt"]["prompt_type"]
                .as_str()
                .unwrap_or("?")
        );
        println!(
            "  Run {} to answer",
            format!(
                "sdw input {} --response '<json>'",
                snap["job_id"].as_str().unwrap_or("?")
            )
            .cyan()
        );
    }
}

fn is_settled(status: &str) -> bool {
    matches!(
        status,
        "completed" | "failed" | "cancelled" | "awaiting_confirmation" | "awaiting_user_input"
    )
}

/// Poll a job and print each status/message change until it settles
async fn watch_job(rpc_url: &str, job_id: &str) -> Result<()> {
    let mut last_line = String::new();
    loop {
        let snap = call_rpc(rpc_url, "order.status.v1", json!({ "job_id": job_id })).await?;
        let status = snap["status"].as_str().unwrap_or("?").to_string();
        let message = snap["progress_message"].as_str().unwrap_or("").to_string();

        let line = format!("{status}: {message}");
        if line != last_line {
            println!("  [{}] {}", status_color(&status), message);
            last_line = line;
        }

        if is_settled(&status) {
            println!();
            print_snapshot(&snap);
            return Ok(());
        }

        tokio::time::sleep(std::time::Duration::from_millis(WATCH_INTERVAL_MS)).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            order_number,
            card,
            mode,
            quote_link,
            watch,
        } => {
            let mut params = json!({
                "order_number": order_number,
                "card": card,
                "mode": mode,
            });
            if let Some(link) = quote_link {
                params["quote_link"] = json!(link);
            }

            let result = call_rpc(&cli.rpc_url, "order.start.v1", params).await?;
            let start_result: StartResult = serde_json::from_value(result)?;

            println!("{}", "✓ Order job started".green().bold());
            println!();

            let job_id = start_result.job_id.clone();
            let table = Table::new(vec![start_result]).to_string();
            println!("{}", table);

            if watch {
                println!();
                watch_job(&cli.rpc_url, &job_id).await?;
            }
        }

        Commands::Status { job_id, watch } => {
            if watch {
                watch_job(&cli.rpc_url, &job_id).await?;
            } else {
                let snap =
                    call_rpc(&cli.rpc_url, "order.status.v1", json!({ "job_id": job_id })).await?;
                println!("{}", format!("Job {}", job_id).cyan().bold());
                println!();
                print_snapshot(&snap);
            }
        }

        Commands::Confirm { job_id } => {
            let result =
                call_rpc(&cli.rpc_url, "order.confirm.v1", json!({ "job_id": job_id })).await?;

            println!(
                "{}",
                format!(
                    "✓ Purchase confirmed, job {} is now {}",
                    job_id,
                    result["status"].as_str().unwrap_or("?")
                )
                .green()
                .bold()
            );
        }

        Commands::Input { job_id, response } => {
            let response_json: serde_json::Value =
                serde_json::from_str(&response).context("Invalid JSON response")?;

            let result = call_rpc(
                &cli.rpc_url,
                "order.input.v1",
                json!({ "job_id": job_id, "response": response_json }),
            )
            .await?;

            println!(
                "{}",
                format!(
                    "✓ Input submitted, job {} resumed as {}",
                    job_id,
                    result["status"].as_str().unwrap_or("?")
                )
                .green()
                .bold()
            );
        }

        Commands::Cancel { job_id } => {
            let result =
                call_rpc(&cli.rpc_url, "order.cancel.v1", json!({ "job_id": job_id })).await?;

            if result["cancelled"].as_bool().unwrap_or(false) {
                println!("{}", format!("✓ Job {} cancelled", job_id).green().bold());
            } else {
                println!(
                    "{}",
                    format!(
                        "○ Job {} already finished ({})",
                        job_id,
                        result["status"].as_str().unwrap_or("?")
                    )
                    .yellow()
                );
            }
        }

        Commands::Stats => {
            println!("{}", "Daemon Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {}", "Version:".bold(), stats["version"]);
                    println!();
                    println!("  {} {}", "Total Jobs:".bold(), stats["total_jobs"]);
                    println!("  {} {}", "Active:".bold(), stats["active_jobs"]);
                    println!(
                        "  {} {}",
                        "Awaiting Confirmation:".bold(),
                        stats["awaiting_confirmation"]
                    );
                    println!(
                        "  {} {}",
                        "Awaiting Input:".bold(),
                        stats["awaiting_user_input"]
                    );
                    println!("  {} {}", "Completed:".bold(), stats["completed_jobs"]);
                    println!("  {} {}", "Failed:".bold(), stats["failed_jobs"]);
                    println!("  {} {}", "Cancelled:".bold(), stats["cancelled_jobs"]);
                    println!();
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
