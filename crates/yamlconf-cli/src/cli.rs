//! yamlconf CLI - Command-line interface for layered YAML configuration
//!
//! Usage:
//!   yamlconf dump config/ --format json
//!   yamlconf get config/ local.yaml database.url
//!   yamlconf check config/ --overlay production

use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use yamlconf_core::{
    ArrayMerge, Config, ConfigOptions, LoadOptions, ResolveOptions, SubstitutionPolicy, Value,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_GROWTH, DEFAULT_MAX_PASSES,
};

/// yamlconf - Merge YAML files and resolve ${path} placeholders
#[derive(Parser)]
#[command(name = "yamlconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the merged configuration
    Dump {
        /// Configuration files or directories, merged in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Show placeholders instead of resolved values
        #[arg(long)]
        raw: bool,

        /// Output format: yaml, json
        #[arg(short, long, default_value = "yaml", value_parser = ["yaml", "json"])]
        format: String,

        /// Write to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Get a specific resolved value from the configuration
    Get {
        /// Configuration files or directories, merged in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Path to the value (e.g., database.host)
        path: String,

        /// Output format: text, json, yaml
        #[arg(short, long, default_value = "text", value_parser = ["text", "json", "yaml"])]
        format: String,

        /// Default value if key not found
        #[arg(short, long)]
        default: Option<String>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Report resolution problems and leftover placeholders
    Check {
        /// Configuration files or directories, merged in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,
    },
}

/// Loading and resolution options shared by every subcommand
#[derive(Args, Debug, Clone)]
struct OptionArgs {
    /// Top-level mapping to merge over the root (repeatable, applied in order)
    #[arg(long = "overlay", value_name = "NAME")]
    overlays: Vec<String>,

    /// How sequences from later files combine: concat, replace
    #[arg(long, default_value = "concat", value_parser = ["concat", "replace"])]
    array_merge: String,

    /// Maximum re-resolutions of a single value
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Maximum whole-tree resolution passes
    #[arg(long, default_value_t = DEFAULT_MAX_PASSES)]
    max_passes: usize,

    /// Maximum values copied from mappings and sequences in one pass
    #[arg(long, default_value_t = DEFAULT_MAX_GROWTH)]
    max_growth: usize,

    /// Leave placeholders whose value is empty, 0, false or null unresolved
    #[arg(long)]
    legacy_truthy: bool,
}

impl OptionArgs {
    fn to_config_options(&self) -> ConfigOptions {
        let array_merge = match self.array_merge.as_str() {
            "replace" => ArrayMerge::Replace,
            _ => ArrayMerge::Concat,
        };
        let load = self
            .overlays
            .iter()
            .fold(LoadOptions::default().with_array_merge(array_merge), |opts, name| {
                opts.with_overlay(name.clone())
            });

        let policy = if self.legacy_truthy {
            SubstitutionPolicy::LegacyTruthy
        } else {
            SubstitutionPolicy::Presence
        };
        let resolve = ResolveOptions::default()
            .with_max_depth(self.max_depth)
            .with_max_passes(self.max_passes)
            .with_max_growth(self.max_growth)
            .with_policy(policy);

        ConfigOptions::default().with_load(load).with_resolve(resolve)
    }
}

/// Run the CLI with the given arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Dump {
            files,
            raw,
            format,
            output,
            options,
        } => cmd_dump(&files, &options, raw, &format, output),

        Commands::Get {
            files,
            path,
            format,
            default,
            options,
        } => cmd_get(&files, &options, &path, &format, default),

        Commands::Check { files, options } => cmd_check(&files, &options),
    }
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Send `log` records to stderr; `RUST_LOG` wins over `-v`
fn init_logging(verbose: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn load_config(files: &[PathBuf], options: &OptionArgs) -> Result<Config, String> {
    if files.is_empty() {
        return Err("No configuration files specified".to_string());
    }

    log::debug!("Loading {} path(s)", files.len());
    let config = Config::load_merged_with_options(files, options.to_config_options())
        .map_err(|e| format!("Failed to load configuration: {}", e))?;
    log::info!(
        "Merged {} file(s), resolved in {} pass(es)",
        config.files().len(),
        config.passes()
    );

    Ok(config)
}

fn report_diagnostics(config: &Config) {
    for diagnostic in config.diagnostics() {
        eprintln!("{} {}", "✗".red(), diagnostic);
    }
}

fn write_output(content: &str, output: Option<PathBuf>) -> ExitCode {
    if let Some(output_path) = output {
        if let Err(e) = std::fs::write(&output_path, content) {
            eprintln!("{}: {}", "Error writing file".red(), e);
            return ExitCode::from(2);
        }
        eprintln!("{} Wrote to {}", "✓".green(), output_path.display());
    } else {
        print!("{}", content);
    }
    ExitCode::SUCCESS
}

fn cmd_dump(
    files: &[PathBuf],
    options: &OptionArgs,
    raw: bool,
    format: &str,
    output: Option<PathBuf>,
) -> ExitCode {
    let config = match load_config(files, options) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let result = match format {
        "json" => config.to_json(!raw).map(|mut s| {
            s.push('\n');
            s
        }),
        _ => config.to_yaml(!raw),
    };

    let content = match result {
        Ok(content) => content,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            return ExitCode::from(1);
        }
    };

    let code = write_output(&content, output);
    if raw || config.diagnostics().is_empty() {
        return code;
    }
    report_diagnostics(&config);
    ExitCode::from(1)
}

/// Render a value for `get --format text`
fn render_text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(format!("{}\n", s)),
        Value::Null | Value::Bool(_) | Value::Integer(_) | Value::Float(_) => {
            Ok(format!("{}\n", value))
        }
        Value::Sequence(_) | Value::Mapping(_) => {
            serde_yaml::to_string(value).map_err(|e| e.to_string())
        }
    }
}

fn cmd_get(
    files: &[PathBuf],
    options: &OptionArgs,
    path: &str,
    format: &str,
    default: Option<String>,
) -> ExitCode {
    let config = match load_config(files, options) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let value = match config.get(path) {
        Ok(value) => value,
        Err(_) => {
            if let Some(default_val) = default {
                println!("{}", default_val);
                return ExitCode::SUCCESS;
            }
            eprintln!("{}: Path '{}' not found", "Error".red(), path);
            return ExitCode::from(1);
        }
    };

    let rendered = match format {
        "json" => serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .map_err(|e| e.to_string()),
        "yaml" => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        _ => render_text(value),
    };

    match rendered {
        Ok(content) => {
            print!("{}", content);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

/// Problems `check` reports, one line each
fn check_findings(config: &Config) -> Vec<String> {
    let mut findings: Vec<String> = config.diagnostics().iter().map(|d| d.to_string()).collect();
    findings.extend(
        config
            .unresolved()
            .into_iter()
            .map(|u| format!("{}: unresolved placeholder {}", u.path, u.token)),
    );
    findings
}

fn cmd_check(files: &[PathBuf], options: &OptionArgs) -> ExitCode {
    let config = match load_config(files, options) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            return ExitCode::from(2);
        }
    };

    let findings = check_findings(&config);
    if findings.is_empty() {
        println!(
            "{} {} file(s) resolved in {} pass(es)",
            "✓".green(),
            config.files().len(),
            config.passes()
        );
        return ExitCode::SUCCESS;
    }

    for finding in &findings {
        eprintln!("{} {}", "✗".red(), finding);
    }
    eprintln!("\n{} problem(s) found", findings.len().to_string().yellow());
    ExitCode::from(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn options_of(cli: Cli) -> OptionArgs {
        match cli.command {
            Commands::Dump { options, .. }
            | Commands::Get { options, .. }
            | Commands::Check { options, .. } => options,
        }
    }

    #[test]
    fn test_default_options() {
        let options = options_of(parse(&["yamlconf", "check", "config"])).to_config_options();
        assert_eq!(options, ConfigOptions::default());
    }

    #[test]
    fn test_flags_map_to_options() {
        let cli = parse(&[
            "yamlconf",
            "dump",
            "config",
            "local.yaml",
            "--overlay",
            "production",
            "--overlay",
            "eu",
            "--array-merge",
            "replace",
            "--max-depth",
            "3",
            "--max-passes",
            "5",
            "--max-growth",
            "500",
            "--legacy-truthy",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);

        let options = options_of(cli).to_config_options();
        assert_eq!(
            options.load,
            LoadOptions::default()
                .with_array_merge(ArrayMerge::Replace)
                .with_overlay("production")
                .with_overlay("eu")
        );
        assert_eq!(
            options.resolve,
            ResolveOptions::default()
                .with_max_depth(3)
                .with_max_passes(5)
                .with_max_growth(500)
                .with_policy(SubstitutionPolicy::LegacyTruthy)
        );
    }

    #[test]
    fn test_get_takes_last_positional_as_path() {
        let cli = parse(&["yamlconf", "get", "a.yaml", "b.yaml", "database.host"]);
        match cli.command {
            Commands::Get { files, path, .. } => {
                assert_eq!(files, vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")]);
                assert_eq!(path, "database.host");
            }
            _ => panic!("expected get"),
        }
    }

    #[test]
    fn test_invalid_array_merge_rejected() {
        assert!(Cli::try_parse_from(["yamlconf", "check", "c", "--array-merge", "zip"]).is_err());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0), "warn");
        assert_eq!(log_level(1), "info");
        assert_eq!(log_level(2), "debug");
        assert_eq!(log_level(7), "trace");
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render_text(&Value::from("host")).unwrap(), "host\n");
        assert_eq!(render_text(&Value::Integer(5432)).unwrap(), "5432\n");
        assert_eq!(render_text(&Value::Null).unwrap(), "null\n");
        assert_eq!(
            render_text(&Value::from(vec!["a", "b"])).unwrap(),
            "- a\n- b\n"
        );
    }

    #[test]
    fn test_check_findings() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.yaml");
        std::fs::write(&file, "a: ${b}\nb: ${a}\nc: ${missing}\nd: ok\n").unwrap();

        let options = options_of(parse(&["yamlconf", "check", "app.yaml"]));
        let config = load_config(&[file], &options).unwrap();
        let findings = check_findings(&config);

        // two depth errors, then the tokens left in a, b and c
        assert_eq!(findings.len(), 5);
        assert!(findings[0].contains("Resolution depth exceeded"));
        assert_eq!(findings[2], "a: unresolved placeholder ${b}");
        assert_eq!(findings[4], "c: unresolved placeholder ${missing}");
    }

    #[test]
    fn test_check_findings_clean() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.yaml");
        std::fs::write(&file, "host: localhost\nurl: http://${host}\n").unwrap();

        let options = options_of(parse(&["yamlconf", "check", "app.yaml"]));
        let config = load_config(&[file], &options).unwrap();

        assert!(check_findings(&config).is_empty());
    }
}
