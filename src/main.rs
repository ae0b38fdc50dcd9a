use anyhow::{Context, Result};
use clap::Parser;
use form_ragent::{
    ApplicationRequest, ApplicationSession, Capture, Config, FieldMap, ProxyConfig,
    ScreenshotManager, SessionTrait,
};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Fill and submit one job-application form.
#[derive(Debug, Parser)]
#[command(name = "form-ragent", version, about)]
struct Args {
    /// Application page url
    #[arg(long)]
    url: String,

    /// Field map as inline JSON or a path to a JSON file, e.g. {"email": "a@b.nl"}
    #[arg(long)]
    fields: String,

    /// Résumé to attach
    #[arg(long)]
    resume: Option<PathBuf>,

    /// JSON config file; missing keys use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for checkpoint screenshots and report.json
    #[arg(long)]
    out: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Fill but never submit
    #[arg(long)]
    dry_run: bool,

    /// Route traffic through HTTPS_PROXY / HTTP_PROXY
    #[arg(long)]
    proxy_from_env: bool,

    /// Embed checkpoint PNGs as base64 in the printed report
    #[arg(long)]
    inline_captures: bool,
}

fn load_fields(raw: &str) -> Result<FieldMap> {
    let json = if raw.trim_start().starts_with('{') {
        raw.to_string()
    } else {
        std::fs::read_to_string(raw).with_context(|| format!("reading field map {}", raw))?
    };
    serde_json::from_str(&json).context("parsing field map")
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if args.headful {
        config.browser.headless = false;
    }
    if args.dry_run {
        config.session.dry_run = true;
    }
    if args.proxy_from_env {
        match ProxyConfig::from_env() {
            Some(proxy) => {
                info!("Using proxy {}", proxy.server);
                config.browser.proxy = Some(proxy);
            }
            None => warn!("--proxy-from-env given but no usable proxy variable is set"),
        }
    }
    Ok(config)
}

fn inline_captures(report: &mut Value, captures: &[Capture]) {
    let Some(Value::Array(entries)) = report.get_mut("captures") else {
        return;
    };
    for (entry, capture) in entries.iter_mut().zip(captures) {
        if let Value::Object(map) = entry {
            map.insert(
                "png_base64".to_string(),
                Value::String(ScreenshotManager::to_base64(capture)),
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let fields = load_fields(&args.fields)?;

    let mut request = ApplicationRequest::new(args.url.clone(), fields);
    if let Some(resume) = &args.resume {
        request = request.with_attachment(resume);
    }

    let mut session = ApplicationSession::with_config(config)
        .await
        .context("launching browser")?;
    let report = session
        .apply(&request)
        .await
        .with_context(|| format!("applying at {}", args.url))?;
    session.close().await?;

    info!(
        "{}: {} ({})",
        report.url,
        report.outcome.label(),
        report.fill.summary()
    );

    let mut value = serde_json::to_value(&report)?;
    if args.inline_captures {
        inline_captures(&mut value, &report.captures);
    }
    let json = serde_json::to_string_pretty(&value)?;
    if let Some(out) = &args.out {
        tokio::fs::create_dir_all(out)
            .await
            .with_context(|| format!("creating {}", out.display()))?;
        let written = ScreenshotManager::save_all(&report.captures, out, &report.session_id).await?;
        info!("Wrote {} captures to {}", written.len(), out.display());
        tokio::fs::write(out.join("report.json"), &json).await?;
    }
    println!("{}", json);

    Ok(())
}
