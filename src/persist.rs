use std::path::PathBuf;

use color_eyre::{Result, eyre::Context};
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use tokio::{
    runtime::Builder,
    select,
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
    task::LocalSet,
};
use tracing::{debug, error, info, warn};

pub mod local;
pub mod model;
mod schema;

pub use local::LocalStore;
pub use model::*;

use crate::{
    advisory, config::Config, export, notify, remote::SupabaseStore, sync::Synchronizer,
};

pub(crate) const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn db_path(config: &Config) -> PathBuf {
    config.config.data_dir.join("moodshot.sqlite3")
}

/// Open the on-device store and pair it with the cloud mirror, if one is
/// configured.
pub fn build_synchronizer(config: &Config) -> Result<Synchronizer<SupabaseStore>> {
    std::fs::create_dir_all(&config.config.data_dir)
        .wrap_err_with(|| format!("creating data dir {:?}", config.config.data_dir))?;
    let local = LocalStore::open(&db_path(config))?;
    let remote = SupabaseStore::from_config(&config.remote);
    if remote.is_none() {
        info!("cloud mirror not configured; entries stay on this device");
    }
    Ok(Synchronizer::new(local, remote, config.read_policy))
}

pub fn start_async(
    cmd_rx: UnboundedReceiver<Command>,
    evt_tx: UnboundedSender<Event>,
    config: Config,
) -> Result<std::thread::JoinHandle<()>> {
    let handler = PersistHandler {
        sync: build_synchronizer(&config)?,
        config,
        cmd_rx,
        evt_tx,
    };
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime to build in persist thread");
    let handle = std::thread::Builder::new()
        .name("persist".into())
        .spawn(move || {
            let local = LocalSet::new();
            local.spawn_local(handler.run());
            runtime.block_on(local);
        })?;
    Ok(handle)
}

struct PersistHandler {
    sync: Synchronizer<SupabaseStore>,
    config: Config,
    cmd_rx: UnboundedReceiver<Command>,
    evt_tx: UnboundedSender<Event>,
}

impl PersistHandler {
    async fn run(mut self) -> Result<()> {
        loop {
            select! {
                biased; // Stop should take prio
                _ = self.evt_tx.closed() => {
                    debug!("Persistence events channel closed, shutting down persist handler...");
                    self.cmd_rx.close();
                    while let Ok(leftover_cmd) = self.cmd_rx.try_recv() {
                        warn!("Still handling leftover command {leftover_cmd:?}");
                        self.try_handle(leftover_cmd).await;
                    }
                    return Ok(());
                },
                work_opt = self.cmd_rx.recv() => {
                    let work = work_opt.expect("nobody else to close the cmd_rx");
                    info!("Persistence command: {work:?}");
                    self.try_handle(work).await;
                }
            }
        }
    }

    async fn try_handle(&mut self, cmd: Command) {
        match self.handle(cmd).await {
            Ok(event) => {
                if let Err(err) = self.evt_tx.send(event) {
                    debug!("Unable to send persistence event: {err:?}");
                }
            }
            Err(err) => {
                error!("Error handling persistence command: {err:?}");
                let event = Event::Failure(format!("{err:?}"));
                if let Err(err) = self.evt_tx.send(event) {
                    debug!("Unable to send persistence error: {err:?}");
                }
            }
        }
    }

    async fn handle(&mut self, cmd: Command) -> Result<Event> {
        match cmd {
            Command::PostEntry {
                mood,
                image_url,
                summary,
            } => {
                // No picture attached: let the advisory dress up the post.
                let (image_url, phrase) = match image_url {
                    Some(url) if !url.trim().is_empty() => (url, String::new()),
                    _ => {
                        let advice = advisory::advise(&self.config.advisory, &mood).await;
                        (advice.image_url(), advice.phrase)
                    }
                };
                let record = Entry::compose(mood, image_url, summary);
                self.sync.save(&record).await?;
                notify::spawn_notification(&self.config.notify, &record.mood, &record.date);
                Ok(Event::EntryPosted {
                    entry: record,
                    phrase,
                })
            }
            Command::LoadEntries => {
                let entries = self.sync.load().await?;
                Ok(Event::EntriesLoaded { entries })
            }
            Command::LoadDay { date } => {
                let mut entries = self.sync.local_mut().on_date(&date)?;
                sort_newest_first(&mut entries);
                Ok(Event::DayLoaded { date, entries })
            }
            Command::ExportCsv { path } => {
                let entries = self.sync.load().await?;
                let file = std::fs::File::create(&path)
                    .wrap_err_with(|| format!("creating export file {path:?}"))?;
                export::write_csv(&entries, file)?;
                Ok(Event::Exported {
                    path,
                    rows: entries.len(),
                })
            }
            Command::Reconcile => {
                let report = self.sync.reconcile_all_local_to_remote().await?;
                Ok(Event::Reconciled { report })
            }
        }
    }
}
