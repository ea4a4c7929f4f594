use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use wealthevolve_core::calc::{allocation, overlap, recommendation, risk, sip};
use wealthevolve_core::catalog::FundCatalog;
use wealthevolve_core::config::Settings;
use wealthevolve_core::domain::account::{subscription_plans, User};
use wealthevolve_core::domain::error::{ConflictError, NotFoundError, ValidationError};
use wealthevolve_core::domain::questionnaire::{InvestmentPreferences, QuestionnaireResult};
use wealthevolve_core::storage::{AccountService, JsonFileStore};

use crate::{AccountCommand, Args, Command};

/// Errors caused by what the user typed rather than by the program.
pub fn is_user_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ValidationError>().is_some()
        || err.downcast_ref::<NotFoundError>().is_some()
        || err.downcast_ref::<ConflictError>().is_some()
}

pub async fn run(args: Args, settings: &Settings) -> anyhow::Result<()> {
    let json = args.json;
    let catalog_path = args.catalog.or_else(|| settings.fund_catalog_path.clone());

    match args.command {
        Command::Funds => {
            let catalog = FundCatalog::load(catalog_path.as_deref()).await?;
            emit(json, &catalog.summaries(), |funds| {
                for f in funds {
                    println!(
                        "{:<28} {:<10} {:>2} holdings  {}",
                        f.id,
                        f.category.label(),
                        f.holdings_count,
                        f.name
                    );
                }
            })
        }
        Command::CheckCatalog { path } => {
            let path = match path {
                Some(p) => p,
                None => settings.require_fund_catalog_path()?.to_path_buf(),
            };
            let check = check_catalog(&path).await?;
            emit(json, &check, |c| println!("{}: {} funds OK", c.path, c.funds))
        }
        Command::Overlap { fund_ids } => {
            let catalog = FundCatalog::load(catalog_path.as_deref()).await?;
            let report = overlap::analyze(&catalog, &fund_ids)?;
            emit(json, &report, print_overlap)
        }
        Command::Allocate {
            risk,
            timeframe,
            initial,
            monthly,
        } => {
            let advice = allocation::recommend(risk, timeframe)?;
            let projection = allocation::project(
                initial,
                monthly,
                advice.expected_return_pct,
                timeframe.horizon_years(),
            )?;

            #[derive(Serialize)]
            struct Out {
                advice: allocation::AllocationAdvice,
                projection: allocation::Projection,
            }
            emit(json, &Out { advice, projection }, |out| {
                print_allocation(&out.advice);
                print_projection(&out.projection);
            })
        }
        Command::Sip {
            monthly,
            rate,
            years,
            step_up,
        } => {
            let result = sip::calculate(&sip::SipInput {
                monthly_amount: monthly,
                annual_return_pct: rate,
                years,
                annual_step_up_pct: step_up,
            })?;
            emit(json, &result, |r| {
                println!("Invested:          {:>16.2}", r.invested_amount);
                println!("Estimated returns: {:>16.2}", r.estimated_returns);
                println!("Total value:       {:>16.2}", r.total_value);
                println!();
                println!("{:>4} {:>12} {:>16} {:>16}", "year", "monthly", "invested", "value");
                for y in &r.yearly {
                    println!(
                        "{:>4} {:>12.2} {:>16.2} {:>16.2}",
                        y.year, y.monthly_amount, y.invested, y.value
                    );
                }
            })
        }
        Command::RiskQuestions => emit(json, &risk::QUESTIONS[..], |questions| {
            for q in questions {
                println!("{} ({})", q.prompt, q.id);
                for (i, option) in q.options.iter().enumerate() {
                    println!("  {}. {option}", i + 1);
                }
            }
        }),
        Command::RiskProfile { answers } => {
            let answers: BTreeMap<String, u8> = answers.into_iter().collect();
            let profile = risk::assess(&answers)?;
            emit(json, &profile, |p| {
                println!(
                    "Risk score {}/10 (raw {}), {:?}",
                    p.risk_score, p.raw_score, p.category
                );
                println!("{}", p.description);
                println!("Suggested timeframe: {:?}", p.timeframe);
                print_shares(&p.allocation, p.expected_return_pct);
            })
        }
        Command::Recommend {
            risk,
            timeframe,
            goals,
            initial,
            monthly,
            esg,
            tax_saving,
            liquidity,
        } => {
            let catalog = FundCatalog::load(catalog_path.as_deref()).await?;
            let questionnaire = QuestionnaireResult {
                risk_tolerance: risk,
                timeframe,
                goals,
                initial_investment: initial,
                monthly_contribution: monthly,
                preferences: InvestmentPreferences {
                    esg_focus: esg,
                    tax_saving,
                    liquidity_needs: liquidity,
                },
            };
            let rec = recommendation::recommend(&catalog, questionnaire)?;
            emit(json, &rec, |r| {
                print_allocation(&r.advice);
                print_projection(&r.projection);
                println!();
                for line in &r.guidance {
                    println!("- {line}");
                }
                if !r.suggested_funds.is_empty() {
                    println!();
                    println!("Funds to consider:");
                    for f in &r.suggested_funds {
                        println!("  {} ({})", f.name, f.category.label());
                    }
                }
            })
        }
        Command::Plans => emit(json, &subscription_plans(), |plans| {
            for p in plans {
                println!("{} - INR {}/month", p.name, p.monthly_price);
                for feature in p.features {
                    println!("  * {feature}");
                }
            }
        }),
        Command::Account(cmd) => {
            let store = JsonFileStore::new(settings.store_path());
            tracing::debug!(store = %store.path().display(), "using local account store");
            let accounts = AccountService::new(Arc::new(store));
            run_account(json, &accounts, cmd).await
        }
    }
}

#[derive(Debug, Serialize)]
struct CatalogCheck {
    path: String,
    funds: usize,
}

async fn check_catalog(path: &Path) -> anyhow::Result<CatalogCheck> {
    let catalog = FundCatalog::load(Some(path)).await?;
    Ok(CatalogCheck {
        path: path.display().to_string(),
        funds: catalog.len(),
    })
}

async fn run_account(
    json: bool,
    accounts: &AccountService,
    cmd: AccountCommand,
) -> anyhow::Result<()> {
    match cmd {
        AccountCommand::Signup {
            name,
            email,
            password,
            confirm_password,
        } => {
            let user = accounts
                .signup(&name, &email, &password, &confirm_password)
                .await?;
            emit(json, &user, print_user)
        }
        AccountCommand::Login { email, password } => {
            let user = accounts.login(&email, &password).await?;
            emit(json, &user, print_user)
        }
        AccountCommand::Show => {
            let user = accounts
                .current_user()
                .await?
                .ok_or_else(|| NotFoundError::new("account", "no user is signed in"))?;
            emit(json, &user, print_user)
        }
        AccountCommand::Logout => {
            accounts.logout().await?;
            println!("signed out");
            Ok(())
        }
        AccountCommand::Subscribe { tier } => {
            let user = accounts.change_subscription(tier).await?;
            emit(json, &user, print_user)
        }
        AccountCommand::Settings {
            currency,
            newsletter,
            email_notifications,
            sms_notifications,
        } => {
            let mut settings = accounts.settings().await?;
            let changed = currency.is_some()
                || newsletter.is_some()
                || email_notifications.is_some()
                || sms_notifications.is_some();
            if let Some(c) = currency {
                settings.currency = c;
            }
            if let Some(v) = newsletter {
                settings.newsletter = v;
            }
            if let Some(v) = email_notifications {
                settings.email_notifications = v;
            }
            if let Some(v) = sms_notifications {
                settings.sms_notifications = v;
            }
            if changed {
                settings = accounts.update_settings(settings).await?;
            }
            emit(json, &settings, |s| {
                println!("currency:            {}", s.currency);
                println!("newsletter:          {}", s.newsletter);
                println!("email notifications: {}", s.email_notifications);
                println!("sms notifications:   {}", s.sms_notifications);
            })
        }
    }
}

fn emit<T: Serialize + ?Sized>(json: bool, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
        println!("{out}");
    } else {
        text(value);
    }
    Ok(())
}

fn print_user(user: &User) {
    println!("{} <{}>", user.name, user.email);
    println!("plan: {:?}, member since {}", user.subscription, user.created_at.date_naive());
}

fn print_shares(a: &allocation::AssetAllocation, expected_return_pct: f64) {
    for (class, pct) in a.shares() {
        println!("  {class:<7} {pct:>3}%");
    }
    println!("Expected return: {expected_return_pct:.2}% a year");
}

fn print_allocation(advice: &allocation::AllocationAdvice) {
    println!(
        "Risk tolerance {} -> {:?}, {:?} term",
        advice.risk_tolerance, advice.category, advice.timeframe
    );
    print_shares(&advice.allocation, advice.expected_return_pct);
}

fn print_projection(p: &allocation::Projection) {
    println!(
        "After {} years: {:.2} (contributed {:.2}, gains {:.2})",
        p.years, p.final_value, p.total_contributed, p.estimated_gains
    );
}

fn print_overlap(report: &overlap::OverlapReport) {
    for pair in &report.pairs {
        println!(
            "{} <-> {}: {:.2}% overlap, {} common stocks ({:?})",
            pair.fund_a, pair.fund_b, pair.overlap_pct, pair.common_stocks, pair.level
        );
    }
    println!("Average overlap: {:.2}%", report.average_overlap_pct);

    if report.common_holdings.is_empty() {
        return;
    }
    println!();
    println!("Common holdings:");
    for h in &report.common_holdings {
        let per_fund: Vec<String> = h
            .allocations
            .iter()
            .map(|(fund, pct)| format!("{fund} {pct:.2}%"))
            .collect();
        println!("  {:<32} {:<24} {}", h.name, h.sector, per_fund.join(", "));
    }
    println!();
    println!("By sector:");
    for s in &report.sectors {
        println!("  {:<24} {} stocks, {:.2}%", s.sector, s.stocks, s.overlap_weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use wealthevolve_core::domain::account::UserSettings;
    use wealthevolve_core::storage::MemoryStore;

    fn bundled_catalog() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../core/data/funds.json")
    }

    fn settings_with(store: &Path, catalog: Option<&Path>) -> Settings {
        Settings {
            sentry_dsn: None,
            fund_catalog_path: catalog.map(Path::to_path_buf),
            store_path: Some(store.to_path_buf()),
        }
    }

    fn no_flags() -> AccountCommand {
        AccountCommand::Settings {
            currency: None,
            newsletter: None,
            email_notifications: None,
            sms_notifications: None,
        }
    }

    #[tokio::test]
    async fn settings_without_flags_leave_stored_settings_alone() {
        let accounts = AccountService::new(Arc::new(MemoryStore::new()));
        accounts
            .update_settings(UserSettings {
                currency: "USD".to_string(),
                newsletter: false,
                sms_notifications: true,
                ..UserSettings::default()
            })
            .await
            .unwrap();
        let before = accounts.settings().await.unwrap();

        run_account(true, &accounts, no_flags()).await.unwrap();
        assert_eq!(accounts.settings().await.unwrap(), before);
    }

    #[tokio::test]
    async fn settings_flags_update_only_what_was_given() {
        let accounts = AccountService::new(Arc::new(MemoryStore::new()));
        run_account(
            false,
            &accounts,
            AccountCommand::Settings {
                currency: Some("eur".to_string()),
                newsletter: None,
                email_notifications: None,
                sms_notifications: Some(true),
            },
        )
        .await
        .unwrap();

        let stored = accounts.settings().await.unwrap();
        assert_eq!(stored.currency, "EUR");
        assert!(stored.sms_notifications);
        assert_eq!(stored.newsletter, UserSettings::default().newsletter);
    }

    #[tokio::test]
    async fn invalid_settings_flags_are_user_errors() {
        let accounts = AccountService::new(Arc::new(MemoryStore::new()));
        let err = run_account(
            false,
            &accounts,
            AccountCommand::Settings {
                currency: Some("rupees".to_string()),
                newsletter: None,
                email_notifications: None,
                sms_notifications: None,
            },
        )
        .await
        .unwrap_err();
        assert!(is_user_error(&err));
        assert_eq!(accounts.settings().await.unwrap(), UserSettings::default());
    }

    #[tokio::test]
    async fn check_catalog_reports_fund_count() {
        let check = check_catalog(&bundled_catalog()).await.unwrap();
        assert_eq!(check.funds, 8);

        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(&dir.path().join("store.json"), Some(&bundled_catalog()));
        let args = Args::parse_from(["wealthevolve", "--json", "check-catalog"]);
        run(args, &settings).await.unwrap();
    }

    #[tokio::test]
    async fn check_catalog_rejects_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("funds.json");
        std::fs::write(&path, r#"{"funds": [{"id": "x", "name": "X"}]}"#).unwrap();
        assert!(check_catalog(&path).await.is_err());

        let settings = settings_with(&dir.path().join("store.json"), None);
        let args = Args::parse_from(["wealthevolve", "check-catalog"]);
        let err = run(args, &settings).await.unwrap_err();
        assert!(err.to_string().contains("FUND_CATALOG_PATH"));
    }

    #[tokio::test]
    async fn account_commands_use_the_configured_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("local_storage.json");
        let settings = settings_with(&store, None);

        let args = Args::parse_from([
            "wealthevolve",
            "account",
            "settings",
            "--currency",
            "gbp",
        ]);
        run(args, &settings).await.unwrap();
        run(Args::parse_from(["wealthevolve", "account", "settings"]), &settings)
            .await
            .unwrap();

        let accounts = AccountService::new(Arc::new(JsonFileStore::new(&store)));
        assert_eq!(accounts.settings().await.unwrap().currency, "GBP");
    }
}
