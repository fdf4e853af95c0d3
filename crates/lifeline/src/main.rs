// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifeline - safety triage and crisis routing.
//!
//! This is the binary entry point for the Lifeline service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod audit;
mod classify;
mod doctor;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lifeline_config::LifelineConfig;

/// Lifeline - safety triage and crisis routing.
#[derive(Parser, Debug)]
#[command(name = "lifeline", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the standard search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Classify one questionnaire offline and print the result.
    Classify(ClassifyArgs),
    /// Inspect the audit log.
    Audit {
        #[command(subcommand)]
        action: AuditCommands,
    },
    /// Run diagnostic checks.
    Doctor {
        /// Run the slower checks too.
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

/// Questionnaire answers. Flags that are absent are "no".
#[derive(Args, Debug)]
struct ClassifyArgs {
    /// The person is in immediate danger.
    #[arg(long)]
    immediate_danger: bool,
    /// The person has thoughts of harming themselves.
    #[arg(long)]
    harm_self: bool,
    /// The person has thoughts of harming others.
    #[arg(long)]
    harm_others: bool,
    /// The person needs help soon.
    #[arg(long)]
    need_help_soon: bool,
    /// The person needs help today.
    #[arg(long)]
    need_help_today: bool,
    /// Two-letter region code used to pick crisis resources.
    #[arg(long, value_name = "CODE")]
    region: Option<String>,
}

#[derive(Subcommand, Debug)]
enum AuditCommands {
    /// Print aggregate counts.
    Summary {
        /// Only count events at or after this RFC 3339 timestamp.
        #[arg(long, value_name = "TIMESTAMP")]
        since: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // `classify` is a pure function of its flags and needs no configuration.
    if let Some(Commands::Classify(args)) = &cli.command {
        if let Err(e) = classify::run_classify(args) {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            lifeline_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Audit {
            action: AuditCommands::Summary { since },
        }) => audit::run_summary(&config, since.as_deref()).await,
        Some(Commands::Doctor { deep, plain }) => {
            doctor::run_doctor(&config, cli.config.as_deref(), deep, plain).await
        }
        Some(Commands::Classify(_)) => Ok(()),
        None => {
            println!("lifeline: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<LifelineConfig, Vec<lifeline_config::ConfigError>> {
    match path {
        Some(path) => lifeline_config::load_and_validate_path(path),
        None => lifeline_config::load_and_validate(),
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "lifeline={log_level},lifeline_router={log_level},lifeline_gateway={log_level},\
             lifeline_notify={log_level},lifeline_storage={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_classify_flags() {
        let cli = Cli::try_parse_from([
            "lifeline",
            "classify",
            "--harm-self",
            "--need-help-today",
            "--region",
            "gb",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Classify(args)) => {
                assert!(args.harm_self);
                assert!(args.need_help_today);
                assert!(!args.immediate_danger);
                assert_eq!(args.region.as_deref(), Some("gb"));
            }
            other => panic!("expected classify, got {other:?}"),
        }
    }

    #[test]
    fn cli_parses_audit_summary_since() {
        let cli = Cli::try_parse_from([
            "lifeline",
            "--config",
            "/etc/lifeline.toml",
            "audit",
            "summary",
            "--since",
            "2026-01-01T00:00:00Z",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/lifeline.toml")));
        match cli.command {
            Some(Commands::Audit {
                action: AuditCommands::Summary { since },
            }) => assert_eq!(since.as_deref(), Some("2026-01-01T00:00:00Z")),
            other => panic!("expected audit summary, got {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["lifeline", "shell"]).is_err());
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = lifeline_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.service.name, "lifeline");
    }
}
