use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use httpcall::{Client, Method, Params};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "httpcall")]
#[command(about = "Issue one outbound HTTP call and print the buffered response")]
#[command(version)]
struct Cli {
    /// HTTP method to use
    #[arg(short, long, default_value = "get")]
    method: MethodArg,

    /// URL to request
    #[arg(value_name = "URL")]
    url: String,

    /// Parameters (format: "key=value"); query string for GET, form body for POST
    #[arg(short, long = "param")]
    params: Vec<String>,

    /// Request headers (format: "Name: Value")
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Raw request body, sent verbatim
    #[arg(short, long, conflicts_with = "params")]
    body: Option<String>,

    /// Timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Encode POST parameters as multipart/form-data
    #[arg(long)]
    multipart: bool,

    /// Skip certificate verification
    #[arg(long)]
    insecure: bool,

    /// Reuse connections
    #[arg(long)]
    keep_alive: bool,

    /// Correlation id written to the log record
    #[arg(long, default_value = "cli")]
    correlation_id: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy)]
enum MethodArg {
    Get,
    Post,
    Put,
    Head,
    Delete,
}

impl From<MethodArg> for Method {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Get => Method::Get,
            MethodArg::Post => Method::Post,
            MethodArg::Put => Method::Put,
            MethodArg::Head => Method::Head,
            MethodArg::Delete => Method::Delete,
        }
    }
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_params(raw: &[String]) -> anyhow::Result<Params> {
    let mut params = Params::new();
    for entry in raw {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("parameter '{}' is not in key=value form", entry);
        };
        params.insert(key, value);
    }
    Ok(params)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = Client::builder()
        .default_timeout(Duration::from_millis(cli.timeout_ms))
        .user_agent(concat!("httpcall/", env!("CARGO_PKG_VERSION")))
        .build();

    let method: Method = cli.method.into();
    let params = parse_params(&cli.params)?;

    let mut builder = client
        .request(method, &cli.url)?
        .keep_alive(cli.keep_alive)
        .insecure_tls(cli.insecure)
        .multipart(cli.multipart);

    for header in &cli.headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("header '{}' is not in 'Name: Value' form", header);
        };
        builder = builder.header(name.trim(), value.trim())?;
    }

    builder = match (method, cli.body) {
        (_, Some(body)) => builder.raw_body(body),
        (Method::Get, None) => builder.query(&params),
        (_, None) => builder.payload(params),
    };

    let result = client
        .execute(&cli.correlation_id, builder.build()?)
        .await
        .with_context(|| format!("{} {} failed", method, cli.url))?;

    match cli.format {
        OutputFormat::Text => {
            let status = if result.is_success() {
                result.status().to_string().green()
            } else {
                result.status().to_string().red()
            };
            eprintln!("Status: {} ({} ms)", status, result.duration_millis());
            println!("{}", result.body());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
