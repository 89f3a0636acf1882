use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};

use crate::lint::{fail_if_issues, lint_route, print_issues};
use crate::response::{DefaultErrorHandler, ErrorHandler};
use crate::route::{RequestFixture, RouteValidation};
use crate::runtime_config::RuntimeConfig;

/// Command-line interface for reqcheck
#[derive(Parser)]
#[command(name = "reqcheck")]
#[command(about = "Validate requests against route validation files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "REQCHECK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Validate a request fixture against a route file
    Check {
        /// Route validation file (YAML or JSON)
        #[arg(short, long)]
        route: PathBuf,

        /// Request fixture (YAML or JSON)
        #[arg(short = 'q', long)]
        request: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Check route files for schema and type problems
    Lint {
        /// Route validation files (repeatable)
        #[arg(short, long, required = true, num_args = 1..)]
        route: Vec<PathBuf>,

        /// Exit with an error when any issue is found
        #[arg(long, default_value_t = false)]
        fail_on_error: bool,
    },
}

/// Result of validating one fixture
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub passed: bool,
    /// Validated request (`to_json`) or the error envelope with its status
    pub output: Value,
}

/// Load a route and a fixture, then run the route's pipeline
///
/// # Errors
///
/// Fails on unreadable files or a route that does not compile. A request
/// that fails validation is a successful check with `passed == false`.
pub fn check_request(
    route: &Path,
    request: &Path,
    config: &RuntimeConfig,
) -> anyhow::Result<CheckOutcome> {
    let route = RouteValidation::load(route)?;
    let pipeline = route.pipeline(config)?;
    let surfaces = RequestFixture::load(request)?.to_surfaces()?;
    debug!(route = %route.name, surfaces = ?pipeline.surfaces(), "Running route pipeline");

    Ok(match pipeline.run(&surfaces) {
        Ok(validated) => CheckOutcome {
            passed: true,
            output: validated.to_json(),
        },
        Err(err) => {
            let res = DefaultErrorHandler.handle(&err);
            CheckOutcome {
                passed: false,
                output: serde_json::json!({
                    "status": res.status.as_u16(),
                    "body": res.body,
                }),
            }
        }
    })
}

/// Execute a parsed command line
///
/// # Errors
///
/// Returns loader and lint failures; validation failures are reported
/// through the exit code.
pub fn run_cli(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = RuntimeConfig::from_env();
    match &cli.command {
        Commands::Check {
            route,
            request,
            pretty,
        } => {
            let outcome = check_request(route, request, &config)?;
            let text = if *pretty {
                serde_json::to_string_pretty(&outcome.output)?
            } else {
                outcome.output.to_string()
            };
            println!("{text}");
            Ok(if outcome.passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Lint {
            route,
            fail_on_error,
        } => {
            let mut issues = Vec::new();
            for path in route {
                let parsed = RouteValidation::load(path)?;
                issues.extend(lint_route(&parsed, &config));
            }
            if *fail_on_error {
                fail_if_issues(&issues)?;
            } else if !issues.is_empty() {
                print_issues(&issues);
            }
            info!(files = route.len(), issues = issues.len(), "Lint finished");
            Ok(ExitCode::SUCCESS)
        }
    }
}
