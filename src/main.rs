use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gh_i18n_core::services::{
    audit_locale, detect_language, DirectoryLoader, HttpTransport, Notifier, PageSession,
    SessionReport,
};
use gh_i18n_core::CoreConfig;
use lexicon::{normalize_key, Document};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gh-i18n",
    about = "Localize saved GitHub pages with dictionary and CSS-override locales"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, default_value = "gh-i18n.toml")]
    config: PathBuf,
    /// Host language tag (defaults to config, then the OS locale)
    #[arg(long, global = true)]
    lang: Option<String>,
    /// Directory of <tag>.json locale documents
    #[arg(long, global = true)]
    locales: Option<PathBuf>,
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Translate a saved page: overrides, full pass, then settle the live watcher
    Render {
        /// HTML file, or `-` for stdin
        input: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Print the run report as JSON on stderr
        #[arg(long)]
        report: bool,
    },
    /// Render, then machine-translate the repository description over HTTP
    Describe {
        input: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        report: bool,
    },
    /// Check locale documents for keys and selectors that can never apply
    Audit {
        /// Locale tags (defaults to every supported tag)
        tags: Vec<String>,
    },
    /// Print the dictionary key each argument would be looked up under
    Normalize { texts: Vec<String> },
}

/// Failures are shown to the person running the command.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        tracing::debug!(error = %error, "Tracing subscriber already initialized");
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut cfg = CoreConfig::load(&cli.config)?;
    if let Some(dir) = cli.locales {
        cfg.locale.resources_dir = Some(dir);
    }

    match cli.cmd {
        Cmd::Render { input, out, report } => {
            let language = detect_language(cli.lang.as_deref(), &cfg.locale);
            let session = PageSession::from_config(&cfg, &language)?;
            let (html, run) = session.render(&read_input(&input)?);
            write_output(out.as_deref(), &html)?;
            if report {
                print_report(&run)?;
            }
            Ok(())
        }
        Cmd::Describe { input, out, report } => {
            anyhow::ensure!(
                cfg.translator.enabled,
                "description translation is disabled in {}",
                cli.config.display()
            );
            let language = detect_language(cli.lang.as_deref(), &cfg.locale);
            let session = PageSession::from_config(&cfg, &language)?;
            let transport = HttpTransport::new(Duration::from_secs(cfg.translator.timeout_secs))
                .context("building http client")?;

            let mut doc = Document::parse(&read_input(&input)?);
            let mut page = session.start(&mut doc);
            session.pump(&mut doc, &mut page);
            session.translate_description(&mut doc, &mut page, &transport, &StderrNotifier);
            let run = page.finish(&mut doc);

            write_output(out.as_deref(), &doc.to_html())?;
            if report {
                print_report(&run)?;
            }
            Ok(())
        }
        Cmd::Audit { tags } => {
            let tags = if tags.is_empty() {
                cfg.locale.supported.clone()
            } else {
                tags
            };
            let loader = DirectoryLoader::new(cfg.locale.resources_dir.clone());
            let mut dirty = 0;
            for tag in &tags {
                let audit = audit_locale(tag, &loader)?;
                println!("{}", serde_json::to_string_pretty(&audit)?);
                if !audit.is_clean() {
                    dirty += 1;
                }
            }
            anyhow::ensure!(dirty == 0, "{dirty} locale(s) need attention");
            Ok(())
        }
        Cmd::Normalize { texts } => {
            for text in texts {
                println!("{}", normalize_key(&text));
            }
            Ok(())
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("reading page from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("reading page {}", path.display()))
}

fn write_output(path: Option<&Path>, html: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("writing {}", path.display()))
        }
        None => io::stdout()
            .write_all(html.as_bytes())
            .context("writing page to stdout"),
    }
}

fn print_report(report: &SessionReport) -> Result<()> {
    eprintln!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gh-i18n").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let parsed = cli(&["render", "page.html", "--lang", "ja", "-vv"]);
        assert_eq!(parsed.lang.as_deref(), Some("ja"));
        assert_eq!(parsed.verbose, 2);
        assert!(matches!(parsed.cmd, Cmd::Render { report: false, .. }));
    }

    #[test]
    fn render_writes_translated_page() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("page.html");
        let out = dir.path().join("out.html");
        fs::write(
            &input,
            "<html><body><button><span>Sign in</span></button><code>Sign in</code></body></html>",
        )
        .unwrap();
        let config = dir.path().join("missing.toml");

        run(cli(&[
            "--config",
            config.to_str().unwrap(),
            "--lang",
            "zh-CN",
            "render",
            input.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ]))
        .unwrap();

        let html = fs::read_to_string(out).unwrap();
        assert!(html.contains("<span>登录</span>"));
        assert!(html.contains("<code>Sign in</code>"));
    }

    #[test]
    fn audit_of_embedded_locales_passes() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("missing.toml");
        run(cli(&["--config", config.to_str().unwrap(), "audit"])).unwrap();
    }

    #[test]
    fn audit_flags_unreachable_keys() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ja.json"), r#"{"dict": {"Sign In": "サインイン"}}"#).unwrap();
        let config = dir.path().join("missing.toml");
        let result = run(cli(&[
            "--config",
            config.to_str().unwrap(),
            "--locales",
            dir.path().to_str().unwrap(),
            "audit",
            "ja",
        ]));
        assert!(result.is_err());
    }
}
