use anyhow::Context;
use colored::Colorize;
use esync_diff::{describe, diff, DescribeOptions};
use esync_store::{EtcdTreeStore, FsTreeStore, TreeStore};
use esync_types::EditScript;
use tracing::info;

use crate::cli::{Cli, Direction, OutputFormat};
use crate::config::SyncConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = SyncConfig::load(cli.config.as_deref())?;
    if let Some(max_value_len) = cli.max_value_len {
        config.max_value_len = max_value_len;
    }

    let local = FsTreeStore::new(&cli.local_path);
    let etcd = EtcdTreeStore::connect(&cli.etcd_url, &config.etcd_options())?;

    let (base, target): (&dyn TreeStore, &dyn TreeStore) = match cli.direction() {
        Direction::ToEtcd => (&etcd, &local),
        Direction::ToFiles => (&local, &etcd),
    };
    let script = plan(base, target).await?;

    if !cli.apply {
        if cli.format == OutputFormat::Text {
            println!("{}", "--apply not specified. Operations to perform:".yellow());
        }
        println!(
            "{}",
            render(&script, &base.location(), cli.format, &config.describe_options())?
        );
        return Ok(());
    }

    let applied = base.apply(&script).await?;
    match cli.direction() {
        Direction::ToEtcd => info!(operations = applied, "file system synchronized to etcd"),
        Direction::ToFiles => info!(operations = applied, "etcd synchronized to file system"),
    }
    Ok(())
}

/// Read both sides and compute the script that makes `base` match `target`.
pub async fn plan(base: &dyn TreeStore, target: &dyn TreeStore) -> anyhow::Result<EditScript> {
    let base_tree = base
        .read_tree()
        .await
        .with_context(|| format!("reading {}", base.location()))?;
    let target_tree = target
        .read_tree()
        .await
        .with_context(|| format!("reading {}", target.location()))?;
    let script = diff(base_tree.as_ref(), target_tree.as_ref())
        .context("the two trees cannot be synchronized")?;
    info!(changes = %script.stats(), "computed edit script");
    Ok(script)
}

pub fn render(
    script: &EditScript,
    location: &str,
    format: OutputFormat,
    options: &DescribeOptions,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(describe(script, location, options)),
        OutputFormat::Json => Ok(script.to_json()?),
    }
}
