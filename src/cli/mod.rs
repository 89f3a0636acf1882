//! # CLI Module
//!
//! Command-line front end for checking requests against route validation
//! files without running a server.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Run the pipeline declared by a route file against a request fixture:
//!
//! ```bash
//! reqcheck check --route demos/pet_store/get_pet.yaml --request demos/pet_store/get_pet_ok.json
//! ```
//!
//! Prints the validated request as JSON and exits 0, or prints the error
//! envelope and exits 1.
//!
//! ### `lint`
//!
//! Compile every schema and type name of one or more route files and report
//! problems:
//!
//! ```bash
//! reqcheck lint --route demos/pet_store/get_pet.yaml --fail-on-error
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use clap::Parser;
//! use reqcheck::cli::{run_cli, Cli};
//!
//! let cli = Cli::parse();
//! run_cli(&cli)?;
//! ```

mod commands;


pub use commands::{check_request, run_cli, CheckOutcome, Cli, Commands};
