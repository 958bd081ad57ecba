// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! PKI Hierarchy Generation Command-Line Tool
//!
//! # Usage
//!
//! ```text
//! pki-generate [OPTIONS] --config <PATH> [COMMAND]
//!
//! Commands:
//!   generate  Generate every certificate in the hierarchy (default)
//!   validate  Check the hierarchy without writing anything
//!   plan      Show the generation order and Signing Tool commands
//!
//! Options:
//!   -c, --config <PATH>               Hierarchy document (.json, .yml, .yaml)
//!       --working-dir <DIR>           Policy and secret file directory [default: ./bin]
//!       --scripts-dir <DIR>           Signing Tool scripts directory [default: ./ssl]
//!       --password-policy <POLICY>    strict (8 characters) or relaxed (4 characters)
//!       --min-password-length <N>     Explicit minimum password length
//!   -v, --verbose                     Enable debug output
//!   -q, --quiet                       Only print errors
//!       --log-json                    Emit logs as JSON lines
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Generate the hierarchy
//! pki-generate -c hierarchy.yaml
//!
//! # Check a document with the relaxed password policy
//! pki-generate -c hierarchy.json --password-policy relaxed validate
//!
//! # Show what would run
//! pki-generate -c hierarchy.yaml plan
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pki_hierarchy::config::{DEFAULT_SCRIPTS_DIR, DEFAULT_WORKING_DIR};
use pki_hierarchy::hierarchy::load_hierarchy;
use pki_hierarchy::logging::{LogConfig, LogLevel, init_logging};
use pki_hierarchy::resolver::{PreparedHierarchy, prepare};
use pki_hierarchy::validation::Validator;
use pki_hierarchy::{
    DryRunSigningTool, GeneratorConfig, HierarchyResolver, PasswordPolicy, ScriptSigningTool,
};

/// PKI Hierarchy Generation Command-Line Tool
#[derive(Parser)]
#[command(name = "pki-generate")]
#[command(author = "U.S. Federal Government")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate a PKI certificate hierarchy from a declarative document", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Hierarchy document (.json, .yml, .yaml)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory receiving policy files and staged secrets
    #[arg(long, global = true, value_name = "DIR", default_value = DEFAULT_WORKING_DIR)]
    working_dir: PathBuf,

    /// Directory containing the Signing Tool scripts
    #[arg(long, global = true, value_name = "DIR", default_value = DEFAULT_SCRIPTS_DIR)]
    scripts_dir: PathBuf,

    /// Password policy
    #[arg(long, global = true, value_enum, default_value_t = PolicyArg::Strict)]
    password_policy: PolicyArg,

    /// Explicit minimum password length (overrides --password-policy)
    #[arg(long, global = true, value_name = "N")]
    min_password_length: Option<usize>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Generate every certificate in the hierarchy
    Generate,

    /// Check the hierarchy without writing anything or running the Signing Tool
    Validate,

    /// Show the generation order and the Signing Tool commands
    Plan,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// At least 8 characters
    Strict,
    /// At least 4 characters
    Relaxed,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: LogLevel::from_flags(cli.verbose, cli.quiet),
        json_format: cli.log_json,
        show_target: false,
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_command(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli
        .config
        .as_deref()
        .ok_or("a hierarchy document is required (--config <PATH>)")?;
    let config_path = std::path::absolute(config_path)?;
    let config = build_config(cli)?;

    match cli.command.unwrap_or(Commands::Generate) {
        Commands::Generate => cmd_generate(&config, &config_path),
        Commands::Validate => cmd_validate(&config, &config_path),
        Commands::Plan => cmd_plan(&config, &config_path),
    }
}

fn build_config(cli: &Cli) -> pki_hierarchy::Result<GeneratorConfig> {
    let policy = match (cli.min_password_length, cli.password_policy) {
        (Some(length), _) => PasswordPolicy::Custom(length),
        (None, PolicyArg::Strict) => PasswordPolicy::Strict,
        (None, PolicyArg::Relaxed) => PasswordPolicy::Relaxed,
    };

    GeneratorConfig::builder()
        .working_dir(&cli.working_dir)
        .scripts_dir(&cli.scripts_dir)
        .password_policy(policy)
        .build()
}

// ============================================================================
// Command Implementations
// ============================================================================

fn load_prepared(
    config: &GeneratorConfig,
    config_path: &Path,
) -> pki_hierarchy::Result<PreparedHierarchy> {
    let spec = load_hierarchy(config_path)?;
    prepare(spec, config_path, &Validator::new(config.password_policy))
}

fn cmd_generate(
    config: &GeneratorConfig,
    config_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let tool = ScriptSigningTool::new(&config.scripts_dir);
    tool.verify_available()?;

    let hierarchy = load_prepared(config, config_path)?;
    let report = HierarchyResolver::new(config, &tool).generate(&hierarchy)?;

    tracing::info!(
        "Wrote {} policy files, kept {} existing",
        report.policies_written.len(),
        report.policies_kept.len()
    );
    Ok(())
}

fn cmd_validate(
    config: &GeneratorConfig,
    config_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let hierarchy = load_prepared(config, config_path)?;

    println!("Configuration is valid: {}", config_path.display());
    println!("  Root certificate authorities:         {}", hierarchy.roots.len());
    println!("  Intermediate certificate authorities: {}", hierarchy.intermediates.len());
    println!("  Leaf certificates:                    {}", hierarchy.leaves.len());
    println!("  Minimum password length:              {}", config.min_password_length());
    Ok(())
}

fn cmd_plan(
    config: &GeneratorConfig,
    config_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let hierarchy = load_prepared(config, config_path)?;
    let tool = DryRunSigningTool::new();
    HierarchyResolver::planning(config, &tool).generate(&hierarchy)?;

    let invocations = tool.invocations();
    println!("Generation order ({} certificates):", invocations.len());
    for (i, invocation) in invocations.iter().enumerate() {
        println!("  {}. {} {}", i + 1, invocation.kind, invocation.name);
        println!("     {}", invocation.command_line());
    }
    Ok(())
}
