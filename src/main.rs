use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use rsiteauditor::{AuditError, ConfigManager, HttpRenderer, ProgressEvent, Scanner};

#[derive(Debug, Parser)]
#[command(name = "rsiteauditor", version, about = "Audit a website across eight dimensions and score it")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 扫描一个站点
    Scan(ScanArgs),
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// 目标 URL，缺少协议时补 https://
    url: String,
    /// PageSpeed 结果语言
    #[arg(long, default_value = "en")]
    lang: String,
    /// 对比的竞品 URL
    #[arg(long, conflicts_with = "stream")]
    competitor: Option<String>,
    /// 以 NDJSON 输出进度事件
    #[arg(long)]
    stream: bool,
    /// 格式化 JSON 输出
    #[arg(long)]
    pretty: bool,
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let Command::Scan(args) = cli.command;
    init_tracing(args.verbose);

    let scanner = Scanner::new(ConfigManager::from_env()).context("failed to build HTTP clients")?;
    let renderer = Arc::new(HttpRenderer::new(scanner.probe().clone()));
    let scanner = scanner.with_renderer(renderer);

    let url = normalize_url(&args.url);
    if args.stream {
        return stream_scan(&scanner, &url, &args.lang).await;
    }

    let outcome = match args.competitor.as_deref() {
        Some(competitor) => scanner.compare(&url, &normalize_url(competitor), &args.lang).await,
        None => scanner.run_scan(&url, &args.lang).await,
    };

    match outcome {
        Ok(result) => {
            let json = if args.pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{}", json);
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ AuditError::Unreachable(_)) => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

async fn stream_scan(scanner: &Scanner, url: &str, lang: &str) -> anyhow::Result<ExitCode> {
    let events = scanner.run_scan_stream(url, lang);
    futures::pin_mut!(events);

    let mut code = ExitCode::SUCCESS;
    while let Some(event) = events.next().await {
        println!("{}", event.to_ndjson()?);
        if matches!(event, ProgressEvent::Error { .. }) {
            code = ExitCode::FAILURE;
        }
    }
    Ok(code)
}

/// 日志写 stderr，stdout 只输出 JSON
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}
