use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use ldb_database::{Database, DbConfig, TracingLogger};
use tracing::info;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => DbConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DbConfig::default(),
    };
    match cli.command {
        Command::Report(args) => cmd_report(&args, config),
        Command::Info(args) => cmd_info(&args, config),
        Command::Verify(args) => cmd_verify(&args, config),
        Command::Eco(args) => cmd_eco(args, config),
    }
}

/// Load a saved database with diagnostics routed to `tracing`.
fn load(path: &Path, config: DbConfig) -> anyhow::Result<Database> {
    let mut db = Database::with_config(config);
    db.set_logger(Arc::new(TracingLogger));
    db.read_file(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(db)
}

fn cmd_report(args: &DbArgs, config: DbConfig) -> anyhow::Result<()> {
    let db = load(&args.db, config)?;
    println!("{} {}", "Memory report for".bold(), args.db.display());
    for line in db.report_lines() {
        println!("{line}");
    }
    Ok(())
}

fn cmd_info(args: &DbArgs, config: DbConfig) -> anyhow::Result<()> {
    let db = load(&args.db, config)?;
    let stats = db.stats();
    println!("{} (schema {})", args.db.display().to_string().bold(), db.schema());
    println!("  Technologies: {}", stats.techs.to_string().cyan());
    println!("  Libraries:    {}", stats.libs.to_string().cyan());
    println!("  Masters:      {}", stats.masters.to_string().cyan());
    println!("  Blocks:       {}", stats.blocks.to_string().cyan());
    println!("  Instances:    {}", stats.insts.to_string().cyan());
    println!("  Nets:         {}", stats.nets.to_string().cyan());
    println!("  Properties:   {}", stats.props.to_string().cyan());
    Ok(())
}

/// Re-serialize `db` and load it back. Returns whether the copy is equal.
fn round_trips(db: &Database) -> anyhow::Result<bool> {
    let mut buf = Vec::new();
    db.write(&mut buf)?;
    let mut copy = Database::with_config(db.config().clone());
    copy.set_logger(Arc::new(TracingLogger));
    copy.read(&mut buf.as_slice())?;
    Ok(copy == *db)
}

fn cmd_verify(args: &DbArgs, config: DbConfig) -> anyhow::Result<()> {
    let db = load(&args.db, config)?;
    if round_trips(&db)? {
        println!("{} {} round-trips cleanly", "✓".green().bold(), args.db.display());
        Ok(())
    } else {
        println!("{} {} differs after reload", "✗".red().bold(), args.db.display());
        anyhow::bail!("verification failed for {}", args.db.display())
    }
}

fn cmd_eco(args: EcoArgs, config: DbConfig) -> anyhow::Result<()> {
    let (files, forward) = match args.action {
        EcoAction::Commit(files) => (files, true),
        EcoAction::Undo(files) => (files, false),
    };
    let edits = apply_eco(&files, config, forward)?;
    let verb = if forward { "Committed" } else { "Undid" };
    println!(
        "{} {} {} edits from {} → {}",
        "✓".green().bold(),
        verb,
        edits.to_string().yellow(),
        files.eco.display(),
        files.out.display().to_string().bold()
    );
    Ok(())
}

/// Replay the journal in `files.eco` onto the chosen block and save the
/// result. Returns the number of edits replayed.
fn apply_eco(files: &EcoFiles, config: DbConfig, forward: bool) -> anyhow::Result<usize> {
    let mut db = load(&files.db, config)?;
    let block = match &files.block {
        Some(name) => db.block_by_name(name)?,
        None => db.top_block().context("database has no top block")?,
    };
    db.read_eco(block, &files.eco)
        .with_context(|| format!("reading {}", files.eco.display()))?;
    let edits = db
        .block(block)
        .and_then(|b| b.pending_eco_len())
        .unwrap_or(0);
    if forward {
        db.commit_eco(block)?;
    } else {
        db.undo_eco(block)?;
    }
    db.write_file(&files.out)
        .with_context(|| format!("writing {}", files.out.display()))?;
    info!(edits, forward, out = %files.out.display(), "ECO applied");
    Ok(edits)
}
