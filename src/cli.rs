//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::adapters::tracing_event_adapter::TracingEventAdapter;
use crate::domain::allocation::{suggest_allocation, RiskProfile, DEFAULT_STABLE_ASSETS};
use crate::domain::analysis::{analyze_portfolio, AnalysisRequest, PortfolioAnalysis};
use crate::domain::assets::{parse_assets, parse_holdings, parse_prices};
use crate::domain::concentration::{calculate_concentration_risk, effective_asset_count};
use crate::domain::config_validation::{
    parse_optional_date, validate_allocation_config, validate_data_config, validate_risk_config,
};
use crate::domain::error::AstraportError;
use crate::domain::event::RiskEvent;
use crate::domain::risk::{
    MissingHistoryPolicy, RiskPolicy, RiskWeights, VolatilityNormalization,
    DEFAULT_LOGISTIC_STEEPNESS, DEFAULT_VOLATILITY_CAP,
};
use crate::domain::volatility::calculate_volatility;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::event_port::EventPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "astraport", about = "Wallet portfolio risk analysis")]
pub struct Cli {
    /// Log debug events (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a wallet: risk score, correlation and rebalancing
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        wallet: String,
        #[arg(short, long)]
        profile: Option<String>,
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Volatility of a comma-separated price series
    Volatility {
        #[arg(long)]
        prices: String,
    },
    /// Concentration of comma-separated ASSET=AMOUNT holdings
    Concentration {
        #[arg(long)]
        holdings: String,
    },
    /// Show target allocations by risk profile
    Allocate {
        #[arg(short, long)]
        profile: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List assets with price history in the data directory
    ListAssets {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            wallet,
            profile,
            format,
            output,
        } => run_analyze(
            &config,
            &wallet,
            profile.as_deref(),
            format,
            output.as_deref(),
        ),
        Command::Volatility { prices } => run_volatility(&prices),
        Command::Concentration { holdings } => run_concentration(&holdings),
        Command::Allocate { profile } => run_allocate(profile.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListAssets { config } => run_list_assets(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn fail(err: AstraportError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

/// Builds the risk policy from the `[risk]` section, validating it first.
pub fn build_risk_policy(config: &dyn ConfigPort) -> Result<RiskPolicy, AstraportError> {
    validate_risk_config(config)?;

    let weights = RiskWeights::new(
        config.get_double("risk", "volatility_weight", 0.5),
        config.get_double("risk", "concentration_weight", 0.5),
    )?;

    let normalization = match config
        .get_string("risk", "normalization")
        .map(|s| s.trim().to_lowercase())
        .as_deref()
    {
        Some("logistic") => VolatilityNormalization::Logistic {
            steepness: config.get_double("risk", "logistic_steepness", DEFAULT_LOGISTIC_STEEPNESS),
        },
        _ => VolatilityNormalization::Linear {
            cap: config.get_double("risk", "volatility_cap", DEFAULT_VOLATILITY_CAP),
        },
    };

    let missing_history = match config.get_string("risk", "missing_history") {
        Some(value) => value
            .parse::<MissingHistoryPolicy>()
            .map_err(|reason| AstraportError::ConfigInvalid {
                section: "risk".into(),
                key: "missing_history".into(),
                reason,
            })?,
        None => MissingHistoryPolicy::default(),
    };

    let policy = RiskPolicy {
        weights,
        normalization,
        missing_history,
    };
    policy.validate()?;
    Ok(policy)
}

/// Stable asset ids from `[allocation] stable_assets`, or the defaults.
pub fn resolve_stable_assets(config: &dyn ConfigPort) -> Result<HashSet<String>, AstraportError> {
    match config.get_string("allocation", "stable_assets") {
        Some(raw) if !raw.trim().is_empty() => parse_assets(&raw)
            .map(|assets| assets.into_iter().collect())
            .map_err(|e| AstraportError::ConfigInvalid {
                section: "allocation".into(),
                key: "stable_assets".into(),
                reason: e.to_string(),
            }),
        _ => Ok(DEFAULT_STABLE_ASSETS.iter().map(|s| s.to_string()).collect()),
    }
}

/// Assembles an [`AnalysisRequest`] for `wallet`.
///
/// `profile_override` wins over `[allocation] profile`. An unrecognised label
/// falls back to the default profile and emits [`RiskEvent::ProfileFallback`].
pub fn build_analysis_request(
    config: &dyn ConfigPort,
    wallet: &str,
    profile_override: Option<&str>,
    events: &dyn EventPort,
) -> Result<AnalysisRequest, AstraportError> {
    let label = profile_override
        .map(str::to_string)
        .or_else(|| config.get_string("allocation", "profile"));

    let profile = match label {
        Some(label) => {
            let (profile, fell_back) = RiskProfile::parse_or_default(&label);
            if fell_back {
                events.emit(&RiskEvent::ProfileFallback {
                    requested: label,
                    used: profile.to_string(),
                });
            }
            profile
        }
        None => RiskProfile::default(),
    };

    let mut request = AnalysisRequest::new(wallet.trim(), profile);
    request.stable_assets = resolve_stable_assets(config)?;
    if let Some(start) = parse_optional_date(config, "start_date")? {
        request.start_date = start;
    }
    if let Some(end) = parse_optional_date(config, "end_date")? {
        request.end_date = end;
    }
    Ok(request)
}

/// Validates the configuration and runs the full analysis against `data`.
pub fn run_analysis_pipeline(
    data: &dyn DataPort,
    config: &dyn ConfigPort,
    wallet: &str,
    profile_override: Option<&str>,
    events: &dyn EventPort,
) -> Result<PortfolioAnalysis, AstraportError> {
    validate_allocation_config(config)?;
    let policy = build_risk_policy(config)?;
    let request = build_analysis_request(config, wallet, profile_override, events)?;
    analyze_portfolio(data, &request, &policy, events)
}

pub fn report_adapter(format: ReportFormat) -> Result<Box<dyn ReportPort>, AstraportError> {
    match format {
        ReportFormat::Text => Ok(Box::new(TextReportAdapter::default())),
        #[cfg(feature = "json")]
        ReportFormat::Json => Ok(Box::new(
            crate::adapters::json_report_adapter::JsonReportAdapter { pretty: true },
        )),
        #[cfg(not(feature = "json"))]
        ReportFormat::Json => Err(AstraportError::ConfigInvalid {
            section: "cli".into(),
            key: "format".into(),
            reason: "json feature is required for json output".into(),
        }),
    }
}

fn run_analyze(
    config_path: &Path,
    wallet: &str,
    profile_override: Option<&str>,
    format: ReportFormat,
    output_path: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_data_config(&config) {
        return fail(e);
    }
    let data_path = config.get_string("data", "path").unwrap_or_default();
    let data = CsvAdapter::new(PathBuf::from(data_path.trim()));

    let reporter = match report_adapter(format) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    eprintln!("Analyzing wallet {}", wallet);
    let events = TracingEventAdapter;
    let analysis = match run_analysis_pipeline(&data, &config, wallet, profile_override, &events)
    {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let result = match output_path {
        Some(path) => reporter.write(&analysis, path).map(|()| {
            eprintln!("Report written to {}", path.display());
        }),
        None => reporter.render(&analysis).map(|content| print!("{content}")),
    };
    if let Err(e) = result {
        return fail(e);
    }

    let risk = &analysis.risk;
    eprintln!("\n=== Portfolio Risk ===");
    eprintln!("Profile:            {}", analysis.profile);
    eprintln!("Volatility Risk:    {:.6}", risk.volatility_risk);
    eprintln!("Concentration Risk: {:.6}", risk.concentration_risk);
    eprintln!("Overall Score:      {:.4}", risk.overall_risk_score);
    if !risk.skipped.is_empty() {
        eprintln!("Skipped Assets:     {}", risk.skipped.len());
    }

    ExitCode::SUCCESS
}

fn run_volatility(prices: &str) -> ExitCode {
    let series = match parse_prices(prices) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: failed to parse prices: {e}");
            return ExitCode::from(4);
        }
    };

    match calculate_volatility(&series) {
        Ok(volatility) => {
            println!("{volatility:.6}");
            eprintln!("{} prices, {} returns", series.len(), series.len().saturating_sub(1));
            ExitCode::SUCCESS
        }
        Err(e) => fail(e.into()),
    }
}

fn run_concentration(holdings: &str) -> ExitCode {
    let holdings = match parse_holdings(holdings) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: failed to parse holdings: {e}");
            return ExitCode::from(4);
        }
    };

    println!("{:.6}", calculate_concentration_risk(&holdings));
    eprintln!(
        "{} assets, total {:.2}, effective count {:.2}",
        holdings.len(),
        holdings.total(),
        effective_asset_count(&holdings)
    );
    ExitCode::SUCCESS
}

fn run_allocate(profile: Option<&str>) -> ExitCode {
    let profiles = match profile {
        Some(label) => match label.parse::<RiskProfile>() {
            Ok(p) => vec![p],
            Err(e) => return fail(e.into()),
        },
        None => RiskProfile::ALL.to_vec(),
    };

    for profile in profiles {
        let allocation = suggest_allocation(profile);
        println!(
            "{profile}: stable_assets = {:.2}, growth_assets = {:.2}",
            allocation.stable, allocation.growth
        );
    }
    ExitCode::SUCCESS
}

/// Runs every config check. Returns the effective policy and the sorted
/// stable asset list.
pub fn validate_config(
    config: &dyn ConfigPort,
) -> Result<(RiskPolicy, Vec<String>), AstraportError> {
    validate_data_config(config)?;
    let policy = build_risk_policy(config)?;
    validate_allocation_config(config)?;
    let mut stable: Vec<String> = resolve_stable_assets(config)?.into_iter().collect();
    stable.sort();
    Ok((policy, stable))
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let (policy, stable) = match validate_config(&config) {
        Ok(v) => v,
        Err(e) => return fail(e),
    };

    eprintln!("\nRisk policy:");
    eprintln!(
        "  weights: volatility {:.2}, concentration {:.2}",
        policy.weights.volatility(),
        policy.weights.concentration()
    );
    match policy.normalization {
        VolatilityNormalization::Linear { cap } => {
            eprintln!("  normalization: linear (cap {cap})");
        }
        VolatilityNormalization::Logistic { steepness } => {
            eprintln!("  normalization: logistic (steepness {steepness})");
        }
    }
    eprintln!("  missing history: {}", policy.missing_history);

    eprintln!("\nStable assets: {}", stable.join(", "));

    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}

fn run_list_assets(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_data_config(&config) {
        return fail(e);
    }

    let base = config.get_string("data", "path").unwrap_or_default();
    let base = PathBuf::from(base.trim());
    if !fs::metadata(&base).map(|m| m.is_dir()).unwrap_or(false) {
        return fail(AstraportError::DataSource {
            reason: format!("data path {} is not a directory", base.display()),
        });
    }

    match CsvAdapter::new(base).list_assets() {
        Ok(assets) if assets.is_empty() => {
            eprintln!("No assets found");
            ExitCode::SUCCESS
        }
        Ok(assets) => {
            for asset in &assets {
                println!("{asset}");
            }
            eprintln!("{} assets found", assets.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
