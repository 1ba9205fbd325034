use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use shared_types::TransactionKind;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;

use kopilka_client::app::App;
use kopilka_client::config::ClientConfig;
use kopilka_client::modal::TransactionForm;
use kopilka_client::navigation::Page;
use kopilka_client::render::{self, charts, BalanceView};
use kopilka_client::state::{AppState, NoticeLevel, UserContext};
use kopilka_client::storage::{FileStore, KeyValueStore, MemoryStore, USER_ID_KEY};
use kopilka_client::{FinanceApiClient, FinanceBackend};

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal dashboard for the Kopilka finance tracker", long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,

    /// Keep user id and sync watermark in memory only
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Balance, recent transactions and expense breakdown
    Dashboard,
    /// Full transaction list; `all` clears a filter
    Transactions {
        #[arg(long = "type", default_value = "all")]
        kind: String,
        #[arg(long, default_value = "all")]
        category: String,
        #[arg(long, default_value = "all")]
        date: String,
    },
    /// Add a transaction
    Add {
        kind: TransactionKind,
        amount: String,
        category: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a transaction by id
    Delete { id: i64 },
    /// Run one sync, or keep syncing until Ctrl+C with --watch
    Sync {
        #[arg(long)]
        watch: bool,
        /// Forget the last sync time and fetch the whole history
        #[arg(long)]
        full: bool,
    },
    /// Show one page: dashboard, transactions, reports, family, budget
    Page { name: String },
    /// Show, create or join the family
    Family {
        #[arg(long, conflicts_with = "join")]
        create: Option<String>,
        #[arg(long)]
        join: Option<String>,
    },
    /// Show budgets, or set one with --category and --limit
    Budgets {
        #[arg(long, requires = "limit")]
        category: Option<String>,
        #[arg(long)]
        limit: Option<f64>,
        #[arg(long, default_value = "monthly")]
        period: String,
    },
    /// Suggested categories from the backend
    Categories {
        #[arg(long = "type")]
        kind: Option<TransactionKind>,
    },
    /// Mark a notification as read
    Read { id: i64 },
    /// Remember the user id for later runs
    SetUser { user_id: i64 },
}

fn init_tracing(log_file_path: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("kopilka-dashboard.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file_path.as_deref());

    let (config, config_path) = ClientConfig::load().context("Failed to load config")?;
    tracing::info!("Loaded config from {:?}", config_path);

    let store: Arc<dyn KeyValueStore> = if args.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        let path = config.storage_path();
        Arc::new(
            FileStore::open(&path)
                .with_context(|| format!("Failed to open storage at {:?}", path))?,
        )
    };

    let api = config.api_settings();
    if let Some(user_id) = api.user_id {
        store.set(USER_ID_KEY, &user_id.to_string())?;
    }

    let command = args.command.unwrap_or(Command::Dashboard);
    if let Command::SetUser { user_id } = command {
        store.set(USER_ID_KEY, &user_id.to_string())?;
        println!("User id set to {}", user_id);
        return Ok(());
    }

    let user = UserContext::load(store.as_ref())
        .context("No user configured, run `kopilka-dashboard set-user <id>` or set KOPILKA_USER_ID")?;

    let client = FinanceApiClient::new(
        &api.base_url,
        user.user_id,
        Duration::from_secs(api.request_timeout_secs),
    )
    .context("Failed to build API client")?;
    tracing::info!("Using backend at {}", client.base_url());

    let backend: Arc<dyn FinanceBackend> = Arc::new(client);
    let mut app = App::new(backend.clone(), store, &config.sync_settings())?;
    let today = chrono::Local::now().date_naive();

    match command {
        Command::Dashboard => {
            app.load_dashboard().await;
            print_page(&app, Page::Dashboard).await;
        }
        Command::Transactions {
            kind,
            category,
            date,
        } => {
            app.apply_filters(&kind, &category, &date).await;
            app.wait_for_page().await;
            print_page(&app, Page::Transactions).await;
        }
        Command::Add {
            kind,
            amount,
            category,
            description,
            date,
        } => {
            app.open_modal(Some(kind), today);
            let form = TransactionForm {
                kind,
                amount,
                category,
                description: description.unwrap_or_default(),
                date: date.or(Some(today)),
            };
            let saved = app.save_transaction(&form, today).await;
            print_notices(&app).await;
            saved?;
            print_page(&app, Page::Dashboard).await;
        }
        Command::Delete { id } => {
            app.delete_transaction(id).await;
            print_notices(&app).await;
        }
        Command::Sync { watch, full } => {
            if full {
                app.sync_manager().reset_watermark()?;
            }
            if watch {
                watch_sync(&mut app).await;
            } else {
                let outcome = app.sync_now().await;
                tracing::info!("Sync outcome: {:?}", outcome);
                print_notices(&app).await;
                println!(
                    "Синхронизация: {}",
                    render::sync_status_text(app.sync_manager().status())
                );
            }
        }
        Command::Page { name } => {
            let page = app
                .navigate(&name)
                .await
                .with_context(|| format!("Unknown page: {}", name))?;
            app.wait_for_page().await;
            print_page(&app, page).await;
        }
        Command::Family { create, join } => {
            if let Some(name) = create {
                app.create_family(&name).await;
            } else if let Some(code) = join {
                app.join_family(&code).await;
            } else {
                app.navigate(Page::Family.as_str()).await;
                app.wait_for_page().await;
            }
            print_notices(&app).await;
            print_page(&app, Page::Family).await;
        }
        Command::Budgets {
            category,
            limit,
            period,
        } => {
            match (category, limit) {
                (Some(category), Some(limit)) => {
                    app.set_budget(&category, limit, &period).await;
                }
                _ => {
                    app.navigate(Page::Budget.as_str()).await;
                    app.wait_for_page().await;
                }
            }
            print_notices(&app).await;
            print_page(&app, Page::Budget).await;
        }
        Command::Categories { kind } => {
            let categories = backend
                .get_categories(kind)
                .await
                .context("Failed to load categories")?;
            for category in categories {
                println!("{:<8} {}", category.kind, category.name);
            }
        }
        Command::Read { id } => {
            app.mark_notification_read(id).await;
        }
        Command::SetUser { .. } => {}
    }

    app.shutdown().await;
    Ok(())
}

async fn watch_sync(app: &mut App) {
    let mut status = app.sync_manager().subscribe();
    app.load_dashboard().await;
    print_page(app, Page::Dashboard).await;
    app.start_sync().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, stopping sync");
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                println!("[{}]", render::sync_status_text(current));
                print_notices(app).await;
            }
        }
    }
}

async fn print_notices(app: &App) {
    let state = app.state();
    let notices = state.write().await.drain_notices();
    for notice in notices {
        let marker = match notice.level {
            NoticeLevel::Success => "✓",
            NoticeLevel::Error => "✗",
            NoticeLevel::Info => "•",
        };
        println!("{} {}", marker, notice.message);
    }
}

async fn print_page(app: &App, page: Page) {
    let state = app.state();
    let state = state.read().await;
    match page {
        Page::Dashboard => print_dashboard(&state),
        Page::Transactions => {
            println!("{}", render::render_transactions(&state.transactions, state.highlight));
        }
        Page::Reports => print_reports(&state),
        Page::Family => print_family(&state),
        Page::Budget => print_budgets(&state),
    }
}

fn print_dashboard(state: &AppState) {
    if let Some(report) = &state.monthly_report {
        println!("{}", BalanceView::from(report));
        println!();
    }

    println!("Последние транзакции");
    println!(
        "{}",
        render::render_transactions(&state.recent_transactions, state.highlight)
    );

    if let Some(report) = &state.category_report {
        let series = charts::expense_doughnut(&report.categories);
        if !series.labels.is_empty() {
            println!();
            println!("Расходы по категориям");
            for i in 0..series.labels.len() {
                if let Some(line) = series.tooltip(i) {
                    println!("  {}", line);
                }
            }
        }
    }

    let unread: Vec<_> = state.notifications.iter().filter(|n| !n.is_read).collect();
    if !unread.is_empty() {
        println!();
        println!("Уведомления ({})", unread.len());
        for notification in unread {
            println!("  [{}] {}", notification.id, notification.message);
        }
    }
}

fn print_reports(state: &AppState) {
    let Some(report) = &state.category_report else {
        println!("Нет данных");
        return;
    };

    let series = charts::category_bars(&report.categories);
    for i in 0..series.labels.len() {
        if let Some(line) = series.tooltip(i) {
            println!("{}", line);
        }
    }

    if !state.transactions.is_empty() {
        let year = chrono::Local::now().year();
        let (income, expense) = charts::monthly_series(&state.transactions, year);
        println!();
        for (month, label) in charts::MONTH_LABELS.iter().enumerate() {
            println!(
                "{:<4} +{:>12} -{:>12}",
                label,
                render::format_amount(income[month]),
                render::format_amount(expense[month])
            );
        }
    }
}

fn print_family(state: &AppState) {
    let Some(family) = &state.family else {
        println!("Вы не состоите в семье");
        return;
    };

    println!("Семья: {}", family.name);
    if let Some(code) = &family.invite_code {
        println!("Код приглашения: {}", code);
    }
    for member in &state.family_members {
        println!("  {}", member.display_name());
    }
}

fn print_budgets(state: &AppState) {
    if state.budgets.is_empty() {
        println!("Бюджеты не заданы");
        return;
    }

    for budget in &state.budgets {
        let spent = budget
            .spent
            .map(|spent| format!(" (потрачено {})", render::format_amount(spent)))
            .unwrap_or_default();
        println!(
            "{:<14} {:>14} {}{}",
            budget.category,
            render::format_amount(budget.amount_limit),
            budget.period,
            spent
        );
    }
}
