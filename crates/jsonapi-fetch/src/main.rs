//! Issue a JSON or JSON:API request and print the resolved payload.
//!
//! Branching state is read from a JSON file given with `--store`, holding the
//! same keys a settings page would write (`branchingEnabled`, `branching`).
//!
//! # Examples
//!
//! ```sh
//! # Plain JSON read
//! jsonapi-fetch get https://api.example.com/health
//!
//! # JSON:API read for a tenant, with routing rules from a file
//! jsonapi-fetch --store branching.json --partition tenant-42 \
//!   get-api https://api.example.com/orders
//!
//! # Create a resource from stdin, seeding an extra header
//! cat order.json | jsonapi-fetch post https://api.example.com/orders \
//!   --stdin --header "X-Csrf-Token: abc"
//!
//! # Show the Routing header that would be sent
//! jsonapi-fetch --store branching.json routing
//! ```

use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use jsonapi_fetch::api::retry::DEFAULT_MAX_RETRIES;
use jsonapi_fetch::prelude::*;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Issue a JSON or JSON:API request and print the resolved payload.
#[derive(Parser)]
#[command(name = "jsonapi-fetch", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    // ── Branching ──────────────────────────────────────────────
    /// JSON file holding branching state
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    // ── Request options ────────────────────────────────────────
    /// Tenant / namespace sent as Data-Partition
    #[arg(long, global = true)]
    partition: Option<String>,

    /// Resolve JSON responses to {} instead of printing the body
    #[arg(long, global = true)]
    ignore_return: bool,

    /// Retries after the first attempt (GET, PATCH, DELETE)
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Per-request transport timeout in seconds (default: none)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    // ── Output ─────────────────────────────────────────────────
    /// Log every attempt to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// GET accepting application/json
    Get { url: String },
    /// GET accepting application/vnd.api+json
    GetApi { url: String },
    /// PATCH a JSON:API resource
    Patch {
        url: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// POST a JSON:API resource (never retried)
    Post {
        url: String,
        #[command(flatten)]
        body: BodyArgs,
        /// Extra header as "Name: value"; standard headers take precedence
        #[arg(long = "header")]
        headers: Vec<String>,
    },
    /// DELETE a JSON:API resource
    Delete { url: String },
    /// Print the Routing header computed from the store
    Routing,
}

#[derive(Args)]
struct BodyArgs {
    /// Request body
    #[arg(long, conflicts_with_all = ["body_file", "stdin"])]
    body: Option<String>,

    /// Read the request body from a file
    #[arg(long, conflicts_with = "stdin")]
    body_file: Option<PathBuf>,

    /// Read the request body from stdin
    #[arg(long)]
    stdin: bool,
}

impl BodyArgs {
    fn read(&self) -> Result<String, String> {
        if let Some(body) = &self.body {
            return Ok(body.clone());
        }
        if let Some(path) = &self.body_file {
            return std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()));
        }
        if self.stdin {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            return Ok(buf);
        }
        Ok(String::new())
    }
}

fn parse_headers(raw: &[String]) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();
    for entry in raw {
        let (name, value) = entry
            .split_once(':')
            .ok_or_else(|| format!("header '{entry}' is not in 'Name: value' form"))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| format!("bad header name in '{entry}': {e}"))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| format!("bad header value in '{entry}': {e}"))?;
        headers.append(name, value);
    }
    Ok(headers)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("jsonapi_fetch=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn print_payload(payload: &Payload) {
    match payload {
        Payload::Json(value) => match serde_json::to_string_pretty(value) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{value}"),
        },
        Payload::Text(text) => println!("{text}"),
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let store: Box<dyn KeyValueStore> = match &cli.store {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(EmptyStore),
    };

    let mut config = ClientConfig::default().with_max_retries(cli.max_retries);
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    let client = FetchClient::with_config(store, config)?;

    let mut opts = RequestOptions::new().ignore_return(cli.ignore_return);
    if let Some(partition) = cli.partition {
        opts = opts.partition(partition);
    }

    let result = match cli.command {
        Command::Routing => {
            println!("{}", client.routing_header());
            return Ok(());
        }
        Command::Get { url } => client.read_json(&url).await,
        Command::GetApi { url } => client.read_json_api(&url, &opts).await,
        Command::Patch { url, body } => client.patch_json_api(&body.read()?, &url, &opts).await,
        Command::Post { url, body, headers } => {
            let seeded = parse_headers(&headers)?;
            let resource = body.read()?;
            client
                .post_json_api_with_headers(&resource, &url, &opts, || seeded.clone())
                .await
        }
        Command::Delete { url } => client.delete_json_api(&url, &opts).await,
    };

    match result {
        Ok(payload) => {
            print_payload(&payload);
            Ok(())
        }
        Err(FetchError::Rejected(resp)) => {
            let body = resp.text();
            if body.is_empty() {
                Err(format!("HTTP {}", resp.status()))
            } else {
                Err(format!("HTTP {}: {body}", resp.status()))
            }
        }
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
