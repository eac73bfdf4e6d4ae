//! CLI definition and dispatch.
//!
//! Reports go to stdout, as text or with `--json` as pretty JSON. Progress
//! and warnings are tracing events on stderr.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::build_data_port;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::AnalyzerError;
use crate::domain::fundamental::FundamentalAnalysis;
use crate::domain::indicator::IndicatorValue;
use crate::domain::market::MarketOverview;
use crate::domain::period::Period;
use crate::domain::recommendation::RiskProfile;
use crate::domain::settings::{AnalysisSettings, DataSourceKind, DEFAULT_CAPITAL};
use crate::service::{self, IndicatorReport, PortfolioReport, StockReport};

#[derive(Parser, Debug)]
#[command(name = "ihsg", version, about = "Technical and fundamental analysis for IDX stocks")]
pub struct Cli {
    /// INI configuration file; built-in defaults when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Full technical and fundamental analysis with a recommendation
    Analyze {
        ticker: String,
        #[arg(short, long, default_value = "1y")]
        period: String,
        #[arg(short, long, default_value = "moderate")]
        risk_profile: String,
    },
    /// Latest value of every indicator plus Fibonacci and pivot levels
    Indicators {
        ticker: String,
        #[arg(short, long, default_value = "1y")]
        period: String,
    },
    /// Index summary, sentiment and a comparison of the leading tickers
    Market {
        #[arg(short, long, default_value = "moderate")]
        risk_profile: String,
    },
    /// Allocate capital across the configured tickers
    Portfolio {
        #[arg(long, default_value_t = DEFAULT_CAPITAL)]
        capital: f64,
        #[arg(short, long, default_value = "moderate")]
        risk_profile: String,
        #[arg(short, long, default_value = "1y")]
        period: String,
    },
    /// List the configured ticker universe
    Tickers,
    /// Validate the configuration and print the effective settings
    Validate,
    /// Start the JSON HTTP server
    Serve,
}

pub fn run(cli: Cli) -> ExitCode {
    let config = cli.config.as_deref();
    let json = cli.json;

    let result = match cli.command {
        Command::Analyze {
            ticker,
            period,
            risk_profile,
        } => run_analyze(config, json, &ticker, &period, &risk_profile),
        Command::Indicators { ticker, period } => run_indicators(config, json, &ticker, &period),
        Command::Market { risk_profile } => run_market(config, json, &risk_profile),
        Command::Portfolio {
            capital,
            risk_profile,
            period,
        } => run_portfolio(config, json, capital, &risk_profile, &period),
        Command::Tickers => run_tickers(config, json),
        Command::Validate => run_validate(config, json),
        Command::Serve => run_serve(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

pub fn load_settings(path: Option<&Path>) -> Result<AnalysisSettings, AnalyzerError> {
    let adapter = match path {
        Some(p) => {
            info!(path = %p.display(), "loading config");
            FileConfigAdapter::from_file(p)?
        }
        None => FileConfigAdapter::empty(),
    };
    AnalysisSettings::from_config(&adapter)
}

fn normalize_ticker(raw: &str) -> Result<String, AnalyzerError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(AnalyzerError::invalid_argument("ticker must not be empty"));
    }
    Ok(ticker)
}

fn emit_json<T: Serialize>(value: &T) -> Result<(), AnalyzerError> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{}", text);
    Ok(())
}

fn run_analyze(
    config: Option<&Path>,
    json: bool,
    ticker: &str,
    period: &str,
    risk_profile: &str,
) -> Result<(), AnalyzerError> {
    let period: Period = period.parse()?;
    let profile: RiskProfile = risk_profile.parse()?;
    let ticker = normalize_ticker(ticker)?;
    let settings = load_settings(config)?;
    let port = build_data_port(&settings.data)?;

    let report = service::analyze_ticker(&*port, &settings, &ticker, period, profile)?;
    if json {
        emit_json(&report)
    } else {
        print_stock_report(&report);
        Ok(())
    }
}

fn run_indicators(config: Option<&Path>, json: bool, ticker: &str, period: &str) -> Result<(), AnalyzerError> {
    let period: Period = period.parse()?;
    let ticker = normalize_ticker(ticker)?;
    let settings = load_settings(config)?;
    let port = build_data_port(&settings.data)?;

    let report = service::indicator_report(&*port, &settings, &ticker, period)?;
    if json {
        emit_json(&report)
    } else {
        print_indicator_report(&report);
        Ok(())
    }
}

fn run_market(config: Option<&Path>, json: bool, risk_profile: &str) -> Result<(), AnalyzerError> {
    let profile: RiskProfile = risk_profile.parse()?;
    let settings = load_settings(config)?;
    let port = build_data_port(&settings.data)?;

    let overview = service::market_overview(&*port, &settings, profile);
    if json {
        emit_json(&overview)
    } else {
        print_market_overview(&overview);
        Ok(())
    }
}

fn run_portfolio(
    config: Option<&Path>,
    json: bool,
    capital: f64,
    risk_profile: &str,
    period: &str,
) -> Result<(), AnalyzerError> {
    let period: Period = period.parse()?;
    let profile: RiskProfile = risk_profile.parse()?;
    let settings = load_settings(config)?;
    let port = build_data_port(&settings.data)?;

    let report = service::build_portfolio(&*port, &settings, capital, profile, period)?;
    if json {
        emit_json(&report)
    } else {
        print_portfolio(&report);
        Ok(())
    }
}

fn run_tickers(config: Option<&Path>, json: bool) -> Result<(), AnalyzerError> {
    let settings = load_settings(config)?;
    let mut tickers = settings.universe.tickers.clone();

    if settings.data.source == DataSourceKind::Csv {
        let available = CsvAdapter::new(settings.data.csv_dir.clone()).list_tickers()?;
        for t in available {
            if !tickers.contains(&t) {
                tickers.push(t);
            }
        }
    }

    if json {
        return emit_json(&serde_json::json!({
            "index": settings.universe.index,
            "tickers": tickers,
        }));
    }
    println!("Index: {}", settings.universe.index);
    for t in &tickers {
        println!("{}", t);
    }
    Ok(())
}

fn run_validate(config: Option<&Path>, json: bool) -> Result<(), AnalyzerError> {
    let settings = load_settings(config)?;
    if json {
        return emit_json(&settings);
    }

    println!("Configuration OK");
    println!("  Source:        {:?}", settings.data.source);
    match &settings.data.cache_path {
        Some(p) => println!(
            "  Cache:         {} ({}s)",
            p.display(),
            settings.data.cache_duration.as_secs()
        ),
        None => println!("  Cache:         disabled"),
    }
    println!("  Tickers:       {}", settings.universe.tickers.join(", "));
    println!("  Index:         {}", settings.universe.index);
    let t = &settings.technical;
    println!(
        "  Technical:     RSI {} | MACD {}/{}/{} | MA {}/{} | BB {} x{}",
        t.rsi_period, t.macd_fast, t.macd_slow, t.macd_signal, t.ma_short, t.ma_long,
        t.bollinger_period, t.bollinger_std
    );
    for profile in RiskProfile::ALL {
        let r = settings.risk_settings(profile);
        println!(
            "  {:<13}  size {:.0}% | SL {:.0}% | TP {:.0}% | min score {}",
            profile.as_str(),
            r.max_position_size * 100.0,
            r.stop_loss * 100.0,
            r.take_profit * 100.0,
            r.min_score
        );
    }
    println!("  Listen:        {}", settings.listen);
    Ok(())
}

fn run_serve(config: Option<&Path>) -> Result<(), AnalyzerError> {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{build_router, AppState};
        use std::fs;
        use std::net::SocketAddr;
        use std::sync::Arc;

        let settings = load_settings(config)?;
        let addr: SocketAddr = settings.listen.parse().map_err(|e| AnalyzerError::ConfigInvalid {
            section: "web".to_string(),
            key: "listen".to_string(),
            reason: format!("'{}': {}", settings.listen, e),
        })?;

        fs::create_dir_all(&settings.data.csv_dir)?;
        if let Some(parent) = settings.data.cache_path.as_deref().and_then(Path::parent) {
            fs::create_dir_all(parent)?;
        }

        let data_port: Arc<dyn crate::ports::data_port::MarketDataPort + Send + Sync> =
            Arc::from(build_data_port(&settings.data)?);
        // The blocking HTTP client must be dropped outside the runtime.
        let _keep_alive = Arc::clone(&data_port);

        let router = build_router(AppState {
            data_port,
            settings: Arc::new(settings),
        });

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(%addr, "listening");
            axum::serve(listener, router).await
        })?;
        Ok(())
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config;
        Err(AnalyzerError::invalid_argument(
            "this binary was built without the web feature",
        ))
    }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

fn opt_pct(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{:+.2}%", v))
}

fn opt_num(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

fn print_stock_report(r: &StockReport) {
    let rec = &r.recommendation;
    let tech = &r.technical;

    println!("{} ({})  period {}  {} bars to {}", r.name, r.ticker, r.period, r.bars, r.as_of);
    println!("Price: {:.2} ({})", r.latest_price, opt_pct(r.change_pct));
    println!();
    println!(
        "Recommendation: {}  confidence {:.0}%  horizon {}",
        rec.recommendation.action, rec.recommendation.confidence, rec.recommendation.time_horizon
    );
    println!("  {}", rec.recommendation.reason);
    println!(
        "  Combined score {:.1} ({})  technical {:.1}  fundamental {:.1}",
        rec.combined_score.combined_score,
        rec.combined_score.grade,
        rec.combined_score.technical_score,
        rec.combined_score.fundamental_score
    );

    println!();
    println!(
        "Trend: {}  strength {:.0}%  20d change {}",
        tech.trend.trend.as_str(),
        tech.trend.strength,
        opt_pct(tech.trend.price_change_20d)
    );
    println!(
        "Signal: {}  confidence {:.0}%  ({} buy / {} sell)",
        tech.signals.signal.as_str(),
        tech.signals.confidence,
        tech.signals.buy_signals,
        tech.signals.sell_signals
    );
    if !tech.signals.reasons.is_empty() {
        let reasons: Vec<String> = tech.signals.reasons.iter().map(|r| format!("{:?}", r)).collect();
        println!("  {}", reasons.join(", "));
    }
    println!(
        "Support {}  Resistance {}",
        opt_num(tech.support_resistance.nearest_support),
        opt_num(tech.support_resistance.nearest_resistance)
    );

    if let Some(targets) = &tech.price_targets {
        println!();
        println!("Targets (ATR {:.2}):", targets.atr);
        let levels = [
            ("TP1", targets.take_profit_1),
            ("TP2", targets.take_profit_2),
            ("TP3", targets.take_profit_3),
            ("SL", targets.stop_loss),
            ("SL2", targets.stop_loss_2),
        ];
        for (label, level) in levels {
            if let Some(l) = level {
                println!("  {:<4}{:>12.2} ({:+.2}%)", label, l.price, l.pct);
            }
        }
    }

    if let Some(f) = &r.fundamental {
        println!();
        print_fundamental(f);
    } else {
        println!();
        println!("Fundamentals: unavailable");
    }

    if let Some(rm) = &rec.risk_management {
        println!();
        println!("Risk management ({}):", rec.risk_profile);
        println!(
            "  entry {:.2}  stop {:.2}  target {:.2}  R/R {:.2}",
            rm.entry_price, rm.stop_loss, rm.take_profit, rm.risk_reward_ratio
        );
        println!(
            "  position {:.1}% of capital  {}",
            rm.position_sizing.recommended_size * 100.0,
            rm.position_sizing.reasoning
        );
    }

    if !rec.insights.is_empty() {
        println!();
        println!("Insights:");
        for i in &rec.insights {
            println!("  [{:?}] {} -> {}", i.priority, i.insight, i.action);
        }
    }
}

fn print_fundamental(f: &FundamentalAnalysis) {
    println!(
        "Fundamentals: score {:.0} ({})  {}  confidence {:.0}%",
        f.score.total_score, f.score.grade, f.recommendation.recommendation, f.recommendation.confidence
    );
    println!("  {}", f.recommendation.reasoning);
    println!("  Benchmark: {}", f.benchmark.name);
    println!(
        "  P/E {}  P/B {}  ROE {}  D/E {}  Yield {}",
        opt_num(f.company.pe_ratio),
        opt_num(f.company.pb_ratio),
        opt_num(f.company.roe),
        opt_num(f.company.debt_to_equity),
        opt_num(f.company.dividend_yield)
    );
    let iv = &f.intrinsic_value;
    println!(
        "  Intrinsic: Graham {}  P/E {}  book {}  DCF {}",
        opt_num(iv.graham_number),
        opt_num(iv.pe_method),
        opt_num(iv.book_value_method),
        opt_num(iv.dcf_method)
    );
}

fn format_value(v: &IndicatorValue) -> String {
    match v {
        IndicatorValue::Simple(x) => format!("{:.2}", x),
        IndicatorValue::Macd {
            line,
            signal,
            histogram,
        } => format!("line {:.2}  signal {:.2}  hist {:.2}", line, signal, histogram),
        IndicatorValue::Stochastic { k, d } => format!("%K {:.2}  %D {:.2}", k, d),
        IndicatorValue::Bollinger { upper, middle, lower } => {
            format!("upper {:.2}  middle {:.2}  lower {:.2}", upper, middle, lower)
        }
    }
}

fn print_indicator_report(r: &IndicatorReport) {
    println!("{}  period {}  {} bars to {}", r.ticker, r.period, r.bars, r.as_of);
    println!();
    for reading in &r.readings {
        let value = reading
            .value
            .as_ref()
            .map_or_else(|| "n/a".to_string(), format_value);
        println!("  {:<22}{}", reading.name, value);
    }

    println!();
    println!("Fibonacci retracements:");
    for level in &r.fibonacci.levels {
        println!("  {:>5.1}%{:>14.2}", level.percent, level.price);
    }

    let p = &r.pivots;
    println!();
    println!("Pivot {:.2}", p.pivot);
    println!("  R1 {:.2}  R2 {:.2}  R3 {:.2}", p.r1, p.r2, p.r3);
    println!("  S1 {:.2}  S2 {:.2}  S3 {:.2}", p.s1, p.s2, p.s3);
}

fn print_market_overview(m: &MarketOverview) {
    match &m.index {
        Some(idx) => println!(
            "{}  {:.2} ({}) on {}",
            idx.symbol,
            idx.current,
            opt_pct(idx.change_pct),
            idx.date
        ),
        None => println!("Index: unavailable"),
    }

    if let Some(s) = &m.sentiment {
        println!(
            "Sentiment: {}  avg {:+.2}%  {} up / {} down of {}",
            s.sentiment.as_str(),
            s.average_change,
            s.positive_stocks,
            s.negative_stocks,
            s.total_stocks
        );
    } else {
        println!("Sentiment: unavailable");
    }

    if !m.comparison.is_empty() {
        println!();
        println!(
            "{:<10}{:>12}{:>9}{:>7}{:>8}{:>8}  {}",
            "Ticker", "Price", "Change", "Tech", "Fund", "Score", "Action"
        );
        for row in &m.comparison {
            println!(
                "{:<10}{:>12}{:>9}{:>7}{:>8}{:>8.1}  {}",
                row.ticker,
                opt_num(row.price),
                opt_pct(row.change_pct),
                row.technical_signal.as_str(),
                row.fundamental_score
                    .map_or_else(|| "n/a".to_string(), |s| format!("{:.0}", s)),
                row.combined_score,
                row.action
            );
        }
    }

    if !m.skipped.is_empty() {
        println!();
        println!("Skipped: {}", m.skipped.join(", "));
    }
}

fn print_portfolio(r: &PortfolioReport) {
    let plan = &r.plan;
    println!(
        "Portfolio ({})  capital {:.0}  allocated {:.0}  remaining {:.0}",
        plan.risk_profile, plan.total_capital, plan.total_allocated, plan.remaining_capital
    );
    println!();
    if plan.positions.is_empty() {
        println!("No ticker met the minimum score for this profile.");
    }
    for p in &plan.positions {
        println!(
            "  {:<10}{:<12}{:>16.0}{:>8.2}%  score {:.1}",
            p.ticker, p.action.as_str(), p.position_size, p.position_percentage, p.combined_score
        );
    }

    let d = &plan.diversification;
    println!();
    println!(
        "Diversification: {} ({})  {}",
        d.status, d.score, d.recommendation
    );
    if !r.skipped.is_empty() {
        println!("Skipped: {}", r.skipped.join(", "));
    }
}
