use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wealthevolve_core::domain::account::SubscriptionTier;
use wealthevolve_core::domain::questionnaire::{InvestmentGoal, Timeframe};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "wealthevolve", about = "WealthEvolve calculators and local account tools")]
struct Args {
    /// Print results as pretty JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Fund catalog to use instead of the bundled one (overrides FUND_CATALOG_PATH).
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the funds in the catalog.
    Funds,

    /// Validate a fund catalog file.
    CheckCatalog {
        /// Defaults to FUND_CATALOG_PATH.
        path: Option<PathBuf>,
    },

    /// Portfolio overlap between two or three funds.
    Overlap {
        #[arg(required = true, num_args = 2..=3)]
        fund_ids: Vec<String>,
    },

    /// Asset allocation for a risk tolerance and timeframe.
    Allocate {
        #[arg(long)]
        risk: u8,
        #[arg(long, value_parser = parse_timeframe)]
        timeframe: Timeframe,
        #[arg(long, default_value_t = 0.0)]
        initial: f64,
        #[arg(long, default_value_t = 0.0)]
        monthly: f64,
    },

    /// SIP future value.
    Sip {
        #[arg(long)]
        monthly: f64,
        /// Expected annual return, in percent.
        #[arg(long)]
        rate: f64,
        #[arg(long)]
        years: u32,
        /// Yearly increase of the instalment, in percent.
        #[arg(long, default_value_t = 0.0)]
        step_up: f64,
    },

    /// Print the risk-profile questions.
    RiskQuestions,

    /// Score risk-profile answers given as QUESTION=OPTION pairs.
    RiskProfile {
        #[arg(required = true, value_parser = parse_answer)]
        answers: Vec<(String, u8)>,
    },

    /// Full recommendation from questionnaire answers.
    Recommend {
        #[arg(long)]
        risk: u8,
        #[arg(long, value_parser = parse_timeframe)]
        timeframe: Timeframe,
        #[arg(long = "goal", required = true, value_parser = parse_goal)]
        goals: Vec<InvestmentGoal>,
        #[arg(long, default_value_t = 0.0)]
        initial: f64,
        #[arg(long, default_value_t = 0.0)]
        monthly: f64,
        #[arg(long)]
        esg: bool,
        #[arg(long)]
        tax_saving: bool,
        #[arg(long)]
        liquidity: bool,
    },

    /// Subscription plans.
    Plans,

    /// Local account management.
    #[command(subcommand)]
    Account(AccountCommand),
}

#[derive(Debug, Subcommand)]
enum AccountCommand {
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Show,
    Logout,
    Subscribe {
        #[arg(value_parser = parse_tier)]
        tier: SubscriptionTier,
    },
    Settings {
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        newsletter: Option<bool>,
        #[arg(long)]
        email_notifications: Option<bool>,
        #[arg(long)]
        sms_notifications: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = wealthevolve_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match commands::run(args, &settings).await {
        Ok(()) => Ok(()),
        Err(err) => {
            if !commands::is_user_error(&err) {
                sentry_anyhow::capture_anyhow(&err);
            }
            Err(err)
        }
    }
}

fn init_sentry(settings: &wealthevolve_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

fn parse_timeframe(s: &str) -> Result<Timeframe, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_tier(s: &str) -> Result<SubscriptionTier, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_goal(s: &str) -> Result<InvestmentGoal, String> {
    let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| format!("unknown goal {s:?}"))
}

fn parse_answer(s: &str) -> Result<(String, u8), String> {
    let (question, option) = s
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION=OPTION (got {s:?})"))?;
    let option = option
        .trim()
        .parse::<u8>()
        .map_err(|_| format!("option for {question} must be a number (got {option:?})"))?;
    Ok((question.trim().to_string(), option))
}
