//! Cartback CLI
//!
//! Command-line interface for a running Cartback server:
//! - List, log and recover abandoned carts
//! - List campaigns and change their status
//! - Print dashboard stats
//! - Seed demo data
//! - Print a default config file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cartback-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cart-abandonment recovery from the command line")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8090", global = true)]
    pub api_url: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show server status
    Status,

    /// Abandoned carts
    Carts {
        #[command(subcommand)]
        command: CartCommand,
    },

    /// Recovery campaigns
    Campaigns {
        #[command(subcommand)]
        command: CampaignCommand,
    },

    /// Print dashboard stat cards
    Stats,

    /// Seed demo carts and campaigns
    Demo {
        /// Number of carts to generate
        #[arg(short, long, default_value = "10")]
        count: usize,
        /// Also insert the stock campaigns
        #[arg(long)]
        campaigns: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// List carts
    List {
        /// Only recovered (true) or unrecovered (false) carts
        #[arg(long)]
        recovered: Option<bool>,
        /// Only carts of this customer
        #[arg(long)]
        email: Option<String>,
    },
    /// Log an abandoned cart
    Add {
        /// Customer email
        email: String,
        /// Items as id:name:price:quantity
        #[arg(short, long, required = true)]
        item: Vec<String>,
    },
    /// Mark a cart as recovered
    Recover {
        /// Cart id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum CampaignCommand {
    /// List campaigns
    List {
        /// active, draft or archived
        #[arg(long)]
        status: Option<String>,
    },
    /// Change a campaign's status
    Status {
        /// Campaign id
        id: String,
        /// active, draft or archived
        status: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let api = cli.api_url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let response = client
                .get(format!("{}/health", api))
                .send()
                .await
                .with_context(|| {
                    format!(
                        "Cannot connect to Cartback API at {} (is `cargo run --bin cartback` running?)",
                        api
                    )
                })?;
            let health = read_json(response).await?;

            if cli.format == OutputFormat::Json {
                return print_json(&health);
            }

            println!("Cartback v{}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
            println!("Store: {}", health["store"].as_str().unwrap_or("unknown"));
            println!(
                "WebSocket connections: {}",
                health["connections"].as_u64().unwrap_or(0)
            );
            if let Some(uptime) = health["uptime_seconds"].as_u64() {
                println!("Uptime: {}", format_duration(uptime));
            }
        }

        Commands::Carts { command } => match command {
            CartCommand::List { recovered, email } => {
                let mut query = Vec::new();
                if let Some(recovered) = recovered {
                    query.push(("recovered", recovered.to_string()));
                }
                if let Some(email) = email {
                    query.push(("user_email", email));
                }

                let response = client
                    .get(format!("{}/api/v1/carts", api))
                    .query(&query)
                    .send()
                    .await?;
                let data = read_json(response).await?;

                match cli.format {
                    OutputFormat::Json => print_json(&data)?,
                    OutputFormat::Table => print_carts(&data),
                }
            }
            CartCommand::Add { email, item } => {
                let items = item
                    .iter()
                    .map(|raw| parse_item(raw))
                    .collect::<anyhow::Result<Vec<_>>>()?;

                let response = client
                    .post(format!("{}/api/v1/carts", api))
                    .json(&serde_json::json!({ "user_email": email, "items": items }))
                    .send()
                    .await?;
                let cart = read_json(response).await?;

                match cli.format {
                    OutputFormat::Json => print_json(&cart)?,
                    OutputFormat::Table => println!(
                        "Logged cart {} ({}) for {}",
                        cart["id"].as_str().unwrap_or("-"),
                        format_money(cart["cart_value"].as_f64().unwrap_or(0.0)),
                        email
                    ),
                }
            }
            CartCommand::Recover { id } => {
                let response = client
                    .post(format!("{}/api/v1/carts/{}/recover", api, id))
                    .send()
                    .await?;
                let cart = read_json(response).await?;

                match cli.format {
                    OutputFormat::Json => print_json(&cart)?,
                    OutputFormat::Table => println!("Cart {} marked as recovered", id),
                }
            }
        },

        Commands::Campaigns { command } => match command {
            CampaignCommand::List { status } => {
                let mut request = client.get(format!("{}/api/v1/campaigns", api));
                if let Some(status) = status {
                    request = request.query(&[("status", status)]);
                }
                let data = read_json(request.send().await?).await?;

                match cli.format {
                    OutputFormat::Json => print_json(&data)?,
                    OutputFormat::Table => print_campaigns(&data),
                }
            }
            CampaignCommand::Status { id, status } => {
                let response = client
                    .put(format!("{}/api/v1/campaigns/{}/status", api, id))
                    .json(&serde_json::json!({ "status": status.to_lowercase() }))
                    .send()
                    .await?;
                let campaign = read_json(response).await?;

                match cli.format {
                    OutputFormat::Json => print_json(&campaign)?,
                    OutputFormat::Table => println!(
                        "Campaign \"{}\" is now {}",
                        campaign["name"].as_str().unwrap_or("-"),
                        campaign["status"].as_str().unwrap_or("-")
                    ),
                }
            }
        },

        Commands::Stats => {
            let response = client.get(format!("{}/api/v1/dashboard", api)).send().await?;
            let dashboard = read_json(response).await?;

            match cli.format {
                OutputFormat::Json => print_json(&dashboard)?,
                OutputFormat::Table => print_stats(&dashboard),
            }
        }

        Commands::Demo { count, campaigns } => {
            let response = client
                .post(format!("{}/api/v1/demo/carts", api))
                .json(&serde_json::json!({ "count": count }))
                .send()
                .await?;
            let carts = read_json(response).await?;
            println!("Created {} demo carts", carts["created"].as_u64().unwrap_or(0));

            if campaigns {
                let response = client
                    .post(format!("{}/api/v1/demo/campaigns", api))
                    .send()
                    .await?;
                let created = read_json(response).await?;
                println!(
                    "Created {} demo campaigns",
                    created["created"].as_u64().unwrap_or(0)
                );
            }
        }

        Commands::Config { output } => {
            let config = cartback::config::generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Decode a JSON body, turning API errors into their message
async fn read_json(response: reqwest::Response) -> anyhow::Result<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .with_context(|| format!("Unreadable response ({})", status))?;

    if !status.is_success() {
        let message = body["error"]["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());
        bail!("Request failed ({}): {}", status, message);
    }
    Ok(body)
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse `id:name:price:quantity`; the name may itself contain colons
fn parse_item(raw: &str) -> anyhow::Result<Value> {
    let mut parts = raw.split(':');
    let id = parts.next().filter(|s| !s.is_empty());
    let quantity = parts.next_back();
    let price = parts.next_back();
    let name = parts.collect::<Vec<_>>().join(":");

    let (Some(id), Some(price), Some(quantity)) = (id, price, quantity) else {
        bail!("Invalid item '{}'. Use id:name:price:quantity", raw);
    };
    if name.is_empty() {
        bail!("Invalid item '{}'. Use id:name:price:quantity", raw);
    }

    let price: f64 = price
        .parse()
        .with_context(|| format!("Invalid price in '{}'", raw))?;
    let quantity: u32 = quantity
        .parse()
        .with_context(|| format!("Invalid quantity in '{}'", raw))?;

    Ok(serde_json::json!({
        "id": id,
        "name": name,
        "price": price,
        "quantity": quantity,
    }))
}

fn format_money(value: f64) -> String {
    format!("${:.2}", value)
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn print_carts(data: &Value) {
    let carts = data["carts"].as_array().map(Vec::as_slice).unwrap_or_default();
    if carts.is_empty() {
        println!("No abandoned carts yet.");
        println!();
        println!("Seed some with:");
        println!("  cartback-cli demo --count 20");
        return;
    }

    println!(
        "{:<36}  {:<28} {:>10} {:>5}  {:<13} {}",
        "ID", "Customer", "Value", "Items", "Status", "Abandoned"
    );
    println!("{}", "-".repeat(118));

    for cart in carts {
        let abandoned = cart["abandoned_at"]
            .as_str()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<36}  {:<28} {:>10} {:>5}  {:<13} {}",
            cart["id"].as_str().unwrap_or("-"),
            cart["user_email"].as_str().unwrap_or("-"),
            format_money(cart["cart_value"].as_f64().unwrap_or(0.0)),
            cart["item_count"].as_u64().unwrap_or(0),
            cart["status"].as_str().unwrap_or("-"),
            abandoned
        );
    }
    println!();
    println!("{} carts", data["total"].as_u64().unwrap_or(carts.len() as u64));
}

fn print_campaigns(data: &Value) {
    let campaigns = data["campaigns"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();
    if campaigns.is_empty() {
        println!("No campaigns defined yet.");
        return;
    }

    println!(
        "{:<36}  {:<32} {:<9} {:<14} {}",
        "ID", "Name", "Status", "Modified", "Channels"
    );
    println!("{}", "-".repeat(111));

    for campaign in campaigns {
        let channels = campaign["channels"]
            .as_array()
            .map(|c| {
                c.iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();

        println!(
            "{:<36}  {:<32} {:<9} {:<14} {}",
            campaign["id"].as_str().unwrap_or("-"),
            campaign["name"].as_str().unwrap_or("-"),
            campaign["status"].as_str().unwrap_or("-"),
            campaign["last_modified"].as_str().unwrap_or("-"),
            channels
        );
    }
}

fn print_stats(dashboard: &Value) {
    let cards = dashboard["cards"].as_array().map(Vec::as_slice).unwrap_or_default();

    for card in cards {
        let change = match card.get("change") {
            Some(change) if !change.is_null() => format!(
                "{} {} {}",
                if change["direction"] == "up" { "▲" } else { "▼" },
                change["value"].as_str().unwrap_or("-"),
                change["period"].as_str().unwrap_or("")
            ),
            _ => String::new(),
        };
        println!(
            "{:<20} {:>12}  {}",
            card["title"].as_str().unwrap_or("-"),
            card["value"].as_str().unwrap_or("-"),
            change
        );
    }

    if let Some(trend) = dashboard["trend"].as_array() {
        println!();
        println!("{:<6} {:>10} {:>10}", "Month", "Abandoned", "Recovered");
        for point in trend {
            println!(
                "{:<6} {:>10} {:>10}",
                point["name"].as_str().unwrap_or("-"),
                point["abandoned"].as_u64().unwrap_or(0),
                point["recovered"].as_u64().unwrap_or(0)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        let item = parse_item("p4:Laptop Stand: Pro:49.5:2").unwrap();
        assert_eq!(item["id"], "p4");
        assert_eq!(item["name"], "Laptop Stand: Pro");
        assert_eq!(item["price"], 49.5);
        assert_eq!(item["quantity"], 2);

        assert!(parse_item("p4:49.5:2").is_err());
        assert!(parse_item("p4:Stand:cheap:2").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(3_700), "1h 1m");
        assert_eq!(format_duration(90_000), "1d 1h");
    }
}
