use std::path::Path;

use color_eyre::{Result, eyre::Context};
use futures::executor;

use crate::{
    cli::CliCommand,
    config::Config,
    export,
    persist::{self, Entry, LocalStore},
};

pub fn run(cmd: CliCommand, config: &Config) -> Result<()> {
    match cmd {
        CliCommand::Export { path } => export_csv(config, &path),
        CliCommand::Sync => reconcile(config),
        CliCommand::Import { path } => import(config, &path),
        CliCommand::Delete { id } => delete(config, &id),
    }
}

fn export_csv(config: &Config, path: &Path) -> Result<()> {
    let mut sync = persist::build_synchronizer(config)?;
    let entries = executor::block_on(sync.load())?;
    let file = std::fs::File::create(path)
        .wrap_err_with(|| format!("creating export file {path:?}"))?;
    export::write_csv(&entries, file)?;
    println!("Exported {} entries to {}", entries.len(), path.display());
    Ok(())
}

fn reconcile(config: &Config) -> Result<()> {
    let mut sync = persist::build_synchronizer(config)?;
    let report = executor::block_on(sync.reconcile_all_local_to_remote())?;
    println!(
        "Pushed {} entries to the cloud, {} failed",
        report.pushed, report.failed
    );
    Ok(())
}

fn import(config: &Config, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading import file {path:?}"))?;
    let entries: Vec<Entry> =
        serde_json::from_str(&raw).wrap_err("import file should be a JSON array of entries")?;

    let mut sync = persist::build_synchronizer(config)?;
    // Imported entries keep the ids they were born with.
    for record in &entries {
        sync.local_mut().put(record)?;
    }
    let report = executor::block_on(sync.reconcile_all_local_to_remote())?;
    println!(
        "Imported {} entries ({} pushed to the cloud, {} failed)",
        entries.len(),
        report.pushed,
        report.failed
    );
    Ok(())
}

fn delete(config: &Config, id: &str) -> Result<()> {
    std::fs::create_dir_all(&config.config.data_dir)
        .wrap_err_with(|| format!("creating data dir {:?}", config.config.data_dir))?;
    let mut local = LocalStore::open(&persist::db_path(config))?;
    match local.delete(id)? {
        0 => println!("No entry with id {id}"),
        _ => println!("Deleted entry {id}"),
    }
    Ok(())
}
