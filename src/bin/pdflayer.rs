//! CLI binary for pdflayer-client.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `PdfLayerConfig` plus client calls, and writes the PDF.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdflayer_client::{
    config::sandbox_from_env, source::is_url, ErrorKind, PdfLayer, PdfLayerConfig, PdfLayerError,
    DEFAULT_ENDPOINT,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a web page (sandbox mode, watermarked)
  pdflayer https://example.com -o example.pdf

  # Convert a local HTML file in production mode
  pdflayer --production invoice.html -o invoice.pdf

  # Inline HTML, landscape A4
  pdflayer --html '<h1>Hello world!</h1>' --paper A4 --orientation landscape -o hello.pdf

  # Any API option: verbatim keys or camel-case setter names
  pdflayer page.html --param margin_top=20 --set WatermarkInBackground=1 -o page.pdf

  # Show the request that would be sent, without calling the API
  pdflayer page.html --param grayscale=1 --dry-run

ENVIRONMENT VARIABLES:
  PDF_LAYER_ACCESS_KEY      API access key (required)
  PDF_LAYER_ENDPOINT        Conversion endpoint
  PDF_LAYER_SECRET_KEYWORD  Secret keyword for signing document URLs
  PDF_LAYER_SANDBOX         Force sandbox mode (test=1) unless --production
  PDF_LAYER_TIMEOUT         HTTP timeout in seconds
  APP_ENV                   Sandbox is on unless this is "production"
"#;

/// Convert web pages and HTML to PDF with the pdflayer API.
#[derive(Parser, Debug)]
#[command(
    name = "pdflayer",
    version,
    about = "Convert web pages and HTML to PDF with the pdflayer API",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document URL or local HTML file path.
    #[arg(required_unless_present = "html", conflicts_with = "html")]
    input: Option<String>,

    /// Inline HTML to convert instead of INPUT.
    #[arg(long)]
    html: Option<String>,

    /// Text encoding of the inline HTML (e.g. UTF-8).
    #[arg(long, requires = "html")]
    encoding: Option<String>,

    /// Write the PDF to this file instead of stdout.
    #[arg(short, long, env = "PDF_LAYER_OUTPUT")]
    output: Option<PathBuf>,

    /// API access key.
    #[arg(long, env = "PDF_LAYER_ACCESS_KEY", hide_env_values = true)]
    access_key: String,

    /// Conversion endpoint.
    #[arg(long, env = "PDF_LAYER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Secret keyword used to sign document URLs.
    #[arg(long, env = "PDF_LAYER_SECRET_KEYWORD", hide_env_values = true)]
    secret_keyword: Option<String>,

    /// Disable sandbox mode (no test=1 marker, counts against quota),
    /// whatever PDF_LAYER_SANDBOX and APP_ENV say.
    #[arg(long)]
    production: bool,

    /// Page size: A4, Letter, …
    #[arg(long)]
    paper: Option<String>,

    /// Page orientation: portrait or landscape.
    #[arg(long, default_value = "portrait", requires = "paper")]
    orientation: String,

    /// API option as KEY=VALUE, sent verbatim. Repeatable.
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    /// API option as SetterName=VALUE, e.g. MarginTop=20. Repeatable.
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    setters: Vec<(String, String)>,

    /// Print the prepared request as JSON and exit without calling the API.
    #[arg(long)]
    dry_run: bool,

    /// HTTP timeout in seconds.
    #[arg(long, env = "PDF_LAYER_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_LAYER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_LAYER_QUIET")]
    quiet: bool,
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if k.trim().is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((k.trim().to_string(), v.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build client ─────────────────────────────────────────────────────
    let config = build_config(&cli, |key| std::env::var(key).ok())?;
    let mut pdf = PdfLayer::new(config).context("Failed to create client")?;

    // ── Load document ────────────────────────────────────────────────────
    match (&cli.html, &cli.input) {
        (Some(html), _) => {
            pdf.load_html(html.as_str(), cli.encoding.as_deref());
        }
        (None, Some(input)) if is_url(input) => {
            pdf.load_url(input);
        }
        (None, Some(input)) => {
            pdf.load_file(input)
                .await
                .with_context(|| format!("Failed to load {input}"))?;
        }
        (None, None) => anyhow::bail!("Provide a document URL, a file path, or --html"),
    }

    // ── Options ──────────────────────────────────────────────────────────
    if let Some(ref paper) = cli.paper {
        pdf.set_paper(paper, &cli.orientation);
    }
    pdf.add_params(cli.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    for (name, value) in &cli.setters {
        pdf.call(&format!("set{name}"), value.as_str())
            .with_context(|| format!("Invalid option --set {name}"))?;
    }

    if cli.dry_run {
        let request = pdf.see_request_args();
        println!(
            "{}",
            serde_json::to_string_pretty(&request).context("Failed to serialise request")?
        );
        return Ok(());
    }

    // ── Convert ──────────────────────────────────────────────────────────
    let spinner = (!cli.quiet).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.set_message("waiting for pdflayer…");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = pdf.output().await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let bytes = match result {
        Ok(bytes) => bytes,
        Err(e) => {
            report_failure(&e, cli.quiet);
            return Err(e).context("Conversion failed");
        }
    };

    if let Some(ref output_path) = cli.output {
        pdf.save(output_path).await.context("Failed to save PDF")?;
        if !cli.quiet {
            eprintln!(
                "{}  {}  →  {}",
                green("✔"),
                dim(&format!("{} bytes", bytes.len())),
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(&bytes)
            .context("Failed to write to stdout")?;
        handle.flush().ok();
    }

    Ok(())
}

/// Map CLI flags to a config. Sandbox mode comes from the environment
/// (`PDF_LAYER_SANDBOX`, `APP_ENV`) unless `--production` turns it off.
fn build_config<F>(cli: &Cli, env: F) -> Result<PdfLayerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = PdfLayerConfig::builder(&cli.access_key)
        .endpoint(&cli.endpoint)
        .sandbox(!cli.production && sandbox_from_env(env))
        .timeout_secs(cli.timeout);
    if let Some(ref keyword) = cli.secret_keyword {
        builder = builder.secret_keyword(keyword);
    }
    builder.build().context("Invalid configuration")
}

/// One-line hint for the failure categories users can act on.
fn report_failure(e: &PdfLayerError, quiet: bool) {
    if quiet {
        return;
    }
    let hint = match e.kind() {
        ErrorKind::Service => e
            .as_service_error()
            .map(|s| format!("pdflayer rejected the request (code {}, {})", s.code, s.kind)),
        ErrorKind::Transport => Some("could not reach the pdflayer API".to_string()),
        _ => None,
    };
    if let Some(hint) = hint {
        eprintln!("{} {}", red("✘"), hint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_parsing() {
        assert_eq!(
            parse_key_value("margin_top=20"),
            Ok(("margin_top".to_string(), "20".to_string()))
        );
        assert_eq!(
            parse_key_value("footer_text=a=b"),
            Ok(("footer_text".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["pdflayer", "--access-key", "k", "--html", "<p>x</p>"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn sandbox_follows_app_env() {
        let config = build_config(&parse(&[]), env(&[("APP_ENV", "production")])).unwrap();
        assert!(!config.sandbox);
        assert!(!config.initial_params().contains_key("test"));

        let config = build_config(&parse(&[]), env(&[("APP_ENV", "local")])).unwrap();
        assert!(config.sandbox);

        let config = build_config(&parse(&[]), env(&[])).unwrap();
        assert!(config.sandbox);
    }

    #[test]
    fn sandbox_flag_forces_sandbox_on() {
        let config = build_config(
            &parse(&[]),
            env(&[("APP_ENV", "production"), ("PDF_LAYER_SANDBOX", "1")]),
        )
        .unwrap();
        assert!(config.sandbox);
    }

    #[test]
    fn production_flag_disables_sandbox() {
        let config = build_config(
            &parse(&["--production"]),
            env(&[("PDF_LAYER_SANDBOX", "1")]),
        )
        .unwrap();
        assert!(!config.sandbox);
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
