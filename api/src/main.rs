use anyhow::Result;
use clap::{Parser, Subcommand};

use wolfram_api::ServeConfig;
use wolfram_core::{render_sections, Config, Query, QueryParams, WolframClient};

#[derive(Parser)]
#[command(name = "wolfram-api")]
#[command(about = "Wolfram|Alpha HTTP API server and command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, env = "WOLFRAM_API_HOST", default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(long, env = "WOLFRAM_API_PORT", default_value_t = 5000)]
        port: u16,
    },
    /// Run a query and print the provider JSON
    Query {
        /// Query text
        text: String,
        /// Extra provider parameter as key=value (repeatable)
        #[arg(long = "param", short, value_parser = parse_param)]
        param: Vec<(String, String)>,
    },
    /// Print the primary result text
    Result {
        /// Query text
        text: String,
        /// Read this pod instead of the first one
        #[arg(long)]
        pod: Option<String>,
    },
    /// Print every text section
    Pods {
        /// Query text
        text: String,
    },
    /// Check whether the provider can interpret a query
    Validate {
        /// Query text
        text: String,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    wolfram_core::init_tracing("wolfram_api")?;

    let cli = Cli::parse();
    let config = Config::load()?;
    let client = WolframClient::from_config(&config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            wolfram_api::serve(ServeConfig { host, port }, client).await?;
        }
        Commands::Query { text, param } => {
            let params: QueryParams = param.into_iter().collect();
            let query = Query::with_params(text, params)?;
            let data = client.query(&query).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Commands::Result { text, pod } => {
            let result = match pod {
                Some(pod_id) => client.get_result_text(&text, &pod_id).await?,
                None => client.get_primary_text(&text).await?,
            };
            println!("{}", result);
        }
        Commands::Pods { text } => {
            let sections = client.get_all_sections(&text).await?;
            print!("{}", render_sections(&format!("Query: {}", text), &sections, true));
        }
        Commands::Validate { text } => {
            let data = client.validate(&text).await?.raw;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }

    Ok(())
}
