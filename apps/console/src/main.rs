use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    views::{
        servers::{ServerFilters, ServerScreen},
        LoadOutcome,
    },
    BanController, CmarkRenderer, FlashQueue, HistoryNavigator, HttpApiGateway, LoginView,
    ProfileController, ReportController, ServerBrowser, Session, ViewContext, WikiController,
};
use shared::domain::{BanId, ReportId, ReportStatus, SteamId};
use tokio_stream::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

mod config;

#[derive(Parser, Debug)]
#[command(about = "Moderation panel views driven from the terminal")]
struct Args {
    /// Config file, `console.toml` in the working directory by default.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a wiki page (`home` when no slug is given).
    Wiki { slug: Option<String> },
    /// Replace the body of a wiki page with the contents of a markdown file.
    WikiSave { slug: String, file: PathBuf },
    Report { report_id: i64 },
    ReportState {
        report_id: i64,
        #[arg(value_enum)]
        state: StateArg,
    },
    Profile { steam_id: String },
    Ban {
        ban_id: i64,
        /// Post a message to the ban thread before showing it.
        #[arg(long)]
        message: Option<String>,
        /// Lift the ban with this reason.
        #[arg(long)]
        unban: Option<String>,
    },
    /// Poll the server list and print each snapshot.
    Servers {
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        open_only: bool,
        /// Stop after this many snapshots; runs until ctrl-c otherwise.
        #[arg(long)]
        snapshots: Option<usize>,
    },
    /// Show the sign-in gate for a path.
    Login {
        #[arg(long, default_value = "/")]
        path: String,
        #[arg(long)]
        message: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StateArg {
    Opened,
    NeedMoreInfo,
    ClosedWithoutAction,
    ClosedWithAction,
}

impl From<StateArg> for ReportStatus {
    fn from(value: StateArg) -> Self {
        match value {
            StateArg::Opened => ReportStatus::Opened,
            StateArg::NeedMoreInfo => ReportStatus::NeedMoreInfo,
            StateArg::ClosedWithoutAction => ReportStatus::ClosedWithoutAction,
            StateArg::ClosedWithAction => ReportStatus::ClosedWithAction,
        }
    }
}

struct Console {
    ctx: ViewContext,
    flashes: Arc<FlashQueue>,
    navigator: Arc<HistoryNavigator>,
}

impl Console {
    async fn connect(settings: &config::Settings) -> Result<Self> {
        let api = Arc::new(HttpApiGateway::new(
            &settings.api_url,
            settings.api_token.clone(),
            settings.request_timeout,
        )?);
        let session = Session::establish(api.as_ref()).await;
        let flashes = Arc::new(FlashQueue::new());
        let navigator = Arc::new(HistoryNavigator::new());
        let ctx = ViewContext {
            api,
            session: Arc::new(session),
            notifications: flashes.clone(),
            navigator: navigator.clone(),
            markdown: Arc::new(CmarkRenderer),
        };
        Ok(Self {
            ctx,
            flashes,
            navigator,
        })
    }

    fn print_flashes(&self) {
        for flash in self.flashes.drain() {
            println!("[{:?}] {}: {}", flash.level, flash.heading, flash.message);
        }
        if let Some(path) = self.navigator.current() {
            println!("-> redirected to {path}");
        }
    }
}

fn print_outcome(outcome: LoadOutcome) {
    if outcome != LoadOutcome::Applied {
        warn!("console: load finished outcome={outcome:?}");
    }
}

fn print_servers(screen: &ServerScreen) {
    let global = &screen.stats.global;
    println!(
        "global {}/{} ({}%)",
        global.used,
        global.capacity,
        global.percent()
    );
    for region in &screen.stats.regions {
        println!(
            "  {:<12} {}/{} ({}%)",
            region.label,
            region.used,
            region.capacity,
            region.percent()
        );
    }
    for row in &screen.rows {
        println!(
            "{:<32} {:<8} {:<22} {:<20} {}/{}",
            row.name, row.region, row.address, row.map, row.players, row.slots
        );
    }
    if let Some(err) = &screen.last_error {
        println!("last poll failed: {err}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let settings = config::load_settings(args.config.as_deref())?;
    info!("console: using api_url={}", settings.api_url);

    let console = Console::connect(&settings).await?;
    let ctx = console.ctx.clone();

    match args.command {
        Command::Wiki { slug } => {
            let wiki = WikiController::new(ctx);
            print_outcome(wiki.load(slug.as_deref()).await);
            println!("{:#?}", wiki.render());
        }
        Command::WikiSave { slug, file } => {
            let body = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let wiki = WikiController::new(ctx);
            wiki.load(Some(&slug)).await;
            wiki.begin_edit()?;
            let saved = wiki.save(body).await?;
            println!("saved {} at revision {}", saved.slug, saved.revision);
        }
        Command::Report { report_id } => {
            let report = ReportController::new(ctx);
            print_outcome(report.load(ReportId(report_id)).await);
            println!("{:#?}", report.render());
        }
        Command::ReportState { report_id, state } => {
            let report = ReportController::new(ctx);
            if report.load(ReportId(report_id)).await == LoadOutcome::Applied {
                report.select_state(state.into());
                report.apply_state().await?;
            }
        }
        Command::Profile { steam_id } => {
            let steam_id: SteamId = steam_id.parse().map_err(anyhow::Error::msg)?;
            let profile = ProfileController::new(ctx);
            print_outcome(profile.load(steam_id).await);
            println!("{:#?}", profile.render());
        }
        Command::Ban {
            ban_id,
            message,
            unban,
        } => {
            let ban = BanController::new(ctx);
            print_outcome(ban.load(BanId(ban_id)).await);
            if let Some(message) = message {
                ban.post_message(&message).await?;
            }
            if let Some(reason) = unban {
                ban.unban(&reason).await?;
            }
            println!("{:#?}", ban.render());
        }
        Command::Servers {
            region,
            open_only,
            snapshots,
        } => {
            let browser = ServerBrowser::mount(ctx, settings.poll_interval);
            browser.set_filters(ServerFilters {
                region,
                open_only,
                proximity: None,
            });
            let mut updates = browser
                .poller()
                .stream()
                .filter(|snapshot| snapshot.updated_at.is_some() || snapshot.last_error.is_some());
            let limit = snapshots.unwrap_or(usize::MAX);
            let mut seen = 0;
            while seen < limit {
                tokio::select! {
                    update = updates.next() => {
                        if update.is_none() {
                            break;
                        }
                        print_servers(&browser.render());
                        console.print_flashes();
                        seen += 1;
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            browser.unmount().await;
        }
        Command::Login { path, message } => {
            let base = Url::parse(settings.login_return_base())
                .with_context(|| format!("invalid login return url {}", settings.login_return_base()))?;
            if base.cannot_be_a_base() {
                bail!("login return url cannot be a base: {base}");
            }
            let login = LoginView::new(base);
            println!(
                "{:#?}",
                login.render(&console.ctx.session, message.as_deref(), &path)
            );
        }
    }

    console.print_flashes();
    Ok(())
}
