use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use futures::stream::LocalBoxStream;
use futures::{FutureExt, StreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use mailview::app::{watch, AccountScreen, EmailScreen, Intent, Message, ScreenModel};
use mailview::config::ViewConfig;
use mailview::core::grouping::GroupBy;
use mailview::core::heuristic::{Density, ViewMode};
use mailview::core::models::Record;
use mailview::core::store::{MemoryStore, PreferenceStore, SqliteStore};
use mailview::ui::rows::{plan_text, RowText};
use mailview::Result;

#[derive(Parser, Debug)]
#[command(name = "mailview")]
#[command(about = "Render an account or email snapshot the way the dashboard would", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(value_enum)]
    screen: Screen,

    /// JSON array of records.
    snapshot: PathBuf,

    /// Filter by search text.
    #[arg(long)]
    search: Option<String>,

    /// Pin the view mode.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Pin the row density.
    #[arg(long, value_enum)]
    density: Option<DensityArg>,

    /// Return view mode and density to auto.
    #[arg(long)]
    auto: bool,

    #[arg(long, value_enum)]
    group_by: Option<GroupArg>,

    /// Page to show in the table view.
    #[arg(long)]
    page: Option<usize>,

    #[arg(long)]
    page_size: Option<usize>,

    /// Select every record passing the filters.
    #[arg(long)]
    select_all: bool,

    /// Reset this screen's saved preferences.
    #[arg(long)]
    reset: bool,

    /// JSON array of ids with an operation in flight.
    #[arg(long)]
    busy: Option<PathBuf>,

    /// Re-read the snapshot (and busy file) periodically and re-render.
    #[arg(long)]
    watch: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Screen {
    Accounts,
    Emails,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Flat,
    Virtualized,
    Grouped,
    #[value(alias = "paginated")]
    PaginatedTable,
}

impl From<ModeArg> for ViewMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Flat => ViewMode::Flat,
            ModeArg::Virtualized => ViewMode::Virtualized,
            ModeArg::Grouped => ViewMode::Grouped,
            ModeArg::PaginatedTable => ViewMode::PaginatedTable,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DensityArg {
    Detailed,
    Compact,
    Minimal,
}

impl From<DensityArg> for Density {
    fn from(arg: DensityArg) -> Self {
        match arg {
            DensityArg::Detailed => Density::Detailed,
            DensityArg::Compact => Density::Compact,
            DensityArg::Minimal => Density::Minimal,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GroupArg {
    None,
    Status,
    /// Provider for accounts, folder category for emails.
    #[value(alias = "provider")]
    Category,
    #[value(alias = "sync-status")]
    Secondary,
    Domain,
    #[value(alias = "usage")]
    UsageFrequency,
}

impl From<GroupArg> for GroupBy {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::None => GroupBy::None,
            GroupArg::Status => GroupBy::Status,
            GroupArg::Category => GroupBy::Category,
            GroupArg::Secondary => GroupBy::SecondaryStatus,
            GroupArg::Domain => GroupBy::Domain,
            GroupArg::UsageFrequency => GroupBy::UsageFrequency,
        }
    }
}

impl Cli {
    /// Messages the command line stands for, in the order a user would click.
    fn messages<R: Record>(&self) -> Vec<Message<R>> {
        let mut out = Vec::new();
        if self.reset {
            out.push(Message::ResetPreferences);
        }
        if self.auto {
            out.push(Message::AutoViewMode);
            out.push(Message::AutoDensity);
        }
        if let Some(mode) = self.mode {
            out.push(Message::SelectViewMode(mode.into()));
        }
        if let Some(density) = self.density {
            out.push(Message::SelectDensity(density.into()));
        }
        if let Some(by) = self.group_by {
            out.push(Message::GroupBy(by.into()));
        }
        if let Some(text) = &self.search {
            out.push(Message::SearchChanged(text.clone()));
        }
        if let Some(size) = self.page_size {
            out.push(Message::SetPageSize(size));
        }
        if let Some(page) = self.page {
            out.push(Message::SetPage(page));
        }
        if self.select_all {
            out.push(Message::SelectAllVisible);
        }
        out
    }
}

async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&data)?)
}

fn open_store(config: &ViewConfig) -> Arc<dyn PreferenceStore> {
    let path = config.preference_db_path();
    let opened = path
        .parent()
        .map(std::fs::create_dir_all)
        .transpose()
        .map_err(mailview::Error::from)
        .and_then(|_| SqliteStore::open_at(&path));
    match opened {
        Ok(store) => {
            log::info!("Preferences stored at {}", path.display());
            Arc::new(store)
        }
        Err(e) => {
            log::warn!("Failed to open preference store, running without: {}", e);
            Arc::new(MemoryStore::new())
        }
    }
}

fn drain_intents<Id: std::fmt::Debug>(rx: &mut mpsc::UnboundedReceiver<Intent<Id>>) {
    while let Ok(intent) = rx.try_recv() {
        // No backend behind the demo; the request is only reported.
        log::info!("Intent requested: {:?}", intent);
    }
}

async fn run<R>(
    mut screen: ScreenModel<R>,
    mut intents: mpsc::UnboundedReceiver<Intent<R::Id>>,
    cli: &Cli,
    config: &ViewConfig,
    store: Arc<dyn PreferenceStore>,
) -> Result<()>
where
    R: Record + RowText + DeserializeOwned + Send + 'static,
    R::Id: DeserializeOwned + Send + 'static,
{
    let records: Vec<R> = load_json(&cli.snapshot).await?;
    screen.update(Message::CollectionUpdated(records));
    if let Some(path) = &cli.busy {
        let busy: HashSet<R::Id> = load_json(path).await?;
        screen.update(Message::BusyChanged(busy));
    }
    for message in cli.messages() {
        screen.update(message);
    }
    print!("{}", plan_text(&screen.render_plan()));
    drain_intents(&mut intents);

    if !cli.watch {
        return Ok(());
    }

    // The first poll of each stream would repeat the loads above.
    let snapshot = cli.snapshot.clone();
    let mut streams: Vec<LocalBoxStream<'static, Message<R>>> = vec![
        watch::collection_stream(config.refresh_interval(), move || {
            let path = snapshot.clone();
            async move { load_json::<Vec<R>>(&path).await }.boxed()
        })
        .skip(1)
        .boxed_local(),
        watch::preference_stream::<R>(store.as_ref()).boxed_local(),
    ];
    if let Some(busy) = cli.busy.clone() {
        streams.push(
            watch::busy_stream(config.busy_poll_interval(), move || {
                let path = busy.clone();
                async move { load_json::<HashSet<R::Id>>(&path).await }.boxed()
            })
            .skip(1)
            .boxed_local(),
        );
    }
    let mut events = futures::stream::select_all(streams);

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(message) = event else { break };
                screen.update(message);
                println!();
                print!("{}", plan_text(&screen.render_plan()));
                drain_intents(&mut intents);
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, exiting");
                break;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = ViewConfig::resolve();
    let store = open_store(&config);

    let result = match cli.screen {
        Screen::Accounts => {
            let (tx, rx) = mpsc::unbounded_channel();
            let screen = AccountScreen::accounts(store.clone(), config.clone(), tx);
            run(screen, rx, &cli, &config, store).await
        }
        Screen::Emails => {
            let (tx, rx) = mpsc::unbounded_channel();
            let screen = EmailScreen::emails(store.clone(), config.clone(), tx);
            run(screen, rx, &cli, &config, store).await
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("mailview: {e}");
        std::process::exit(1);
    }
}
