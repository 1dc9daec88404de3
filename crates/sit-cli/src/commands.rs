use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;
use sit_engine::{
    Commit, DiffStatus, EngineError, Repository, ResetAction, SnapshotDiff,
    SnapshotSource,
};

use crate::cli::*;
use crate::render;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Init(args) => cmd_init(args),
        Command::Add(args) => cmd_add(args, format),
        Command::Rm(args) => cmd_rm(args, format),
        Command::Commit(args) => cmd_commit(args, format),
        Command::Status(_) => cmd_status(format),
        Command::Checkout(args) => cmd_checkout(args, format),
        Command::Reset(args) => cmd_reset(args, format),
        Command::Log(args) => cmd_log(args, format),
        Command::Show(args) => cmd_show(args, format),
        Command::Diff(args) => cmd_diff(args, format),
        Command::Branch(args) => cmd_branch(args, format),
        Command::Config(args) => cmd_config(args, format),
        Command::Fsck(_) => cmd_fsck(format),
    }
}

fn open_repo() -> anyhow::Result<Repository> {
    let cwd = std::env::current_dir()?;
    Ok(Repository::discover(&cwd)?)
}

/// Paths as typed, made absolute against the current directory.
fn from_cwd(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let cwd = std::env::current_dir()?;
    Ok(paths.iter().map(|p| cwd.join(p)).collect())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_source(repo: &Repository, name: &str) -> anyhow::Result<SnapshotSource> {
    Ok(match name {
        "index" => SnapshotSource::Index,
        "worktree" => SnapshotSource::Worktree,
        rev => SnapshotSource::Commit(repo.resolve_revision(rev)?),
    })
}

fn cmd_init(args: InitArgs) -> anyhow::Result<()> {
    let dir = std::env::current_dir()?.join(args.path.unwrap_or_else(|| ".".into()));
    std::fs::create_dir_all(&dir)?;
    let repo = Repository::init(&dir)?;
    println!(
        "{} Initialized empty sit repository in {}",
        "✓".green().bold(),
        repo.sit_dir().display().to_string().bold()
    );
    Ok(())
}

fn cmd_add(args: AddArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut repo = open_repo()?;
    let report = repo.add(&from_cwd(&args.paths)?)?;
    if format == OutputFormat::Json {
        return print_json(&report);
    }
    for path in &report.added {
        println!("  {} {}", "staged:".green(), path);
    }
    for path in &report.removed {
        println!("  {} {}", "unstaged:".red(), path);
    }
    for path in &report.large {
        println!("  {} {} is large", "warning:".yellow(), path);
    }
    for (path, reason) in &report.skipped {
        println!("  {} {} ({})", "skipped:".yellow(), path, reason);
    }
    Ok(())
}

fn cmd_rm(args: RmArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut repo = open_repo()?;
    let removed = repo.rm(&from_cwd(&args.paths)?)?;
    if format == OutputFormat::Json {
        return print_json(&removed);
    }
    for path in &removed {
        println!("  {} {}", "unstaged:".red(), path);
    }
    Ok(())
}

fn cmd_commit(args: CommitArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut repo = open_repo()?;
    let commit = repo.commit(args.message.as_deref(), args.amend)?;
    if format == OutputFormat::Json {
        return print_json(&commit);
    }
    let place = repo
        .current_branch()?
        .unwrap_or_else(|| "detached HEAD".into());
    let verb = if args.amend { "Amended" } else { "Committed" };
    println!(
        "{} {} [{} {}] {}",
        "✓".green().bold(),
        verb,
        place.yellow(),
        commit.id.short_hex().dimmed(),
        commit.summary()
    );
    Ok(())
}

fn print_changes(title: &str, diff: &SnapshotDiff) {
    if diff.is_clean() {
        return;
    }
    println!("{title}:");
    for (path, entry) in diff.changes() {
        let line = format!("  {:>9} {}", format!("{}:", entry.status.as_str()), path);
        match entry.status {
            DiffStatus::Added => println!("{}", line.green()),
            DiffStatus::Removed => println!("{}", line.red()),
            _ => println!("{}", line.yellow()),
        }
    }
    println!();
}

fn cmd_status(format: OutputFormat) -> anyhow::Result<()> {
    let repo = open_repo()?;
    let status = repo.status()?;
    if format == OutputFormat::Json {
        return print_json(&status);
    }
    match &status.branch {
        Some(branch) => println!("On branch {}", branch.yellow().bold()),
        None => println!("HEAD detached at {}", status.head.short_hex().yellow()),
    }
    println!();
    print_changes("Changes to be committed", &status.staged);
    print_changes("Changes not staged for commit", &status.unstaged);
    if !status.untracked.is_empty() {
        println!("Untracked files:");
        for path in &status.untracked {
            println!("  {}", path.red());
        }
        println!();
    }
    if status.is_clean() && status.untracked.is_empty() {
        println!("Nothing to commit. Working tree clean.");
    }
    Ok(())
}

fn cmd_checkout(args: CheckoutArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut repo = open_repo()?;

    if !args.paths.is_empty() {
        let target = repo.checkout_target(args.target.as_deref().unwrap_or("index"))?;
        let mut written = Vec::new();
        for path in from_cwd(&args.paths)? {
            written.extend(repo.checkout_path(&target, &path)?);
        }
        if format == OutputFormat::Json {
            return print_json(&written);
        }
        for path in &written {
            println!("  {} {}", "restored:".green(), path);
        }
        return Ok(());
    }

    // With no target, stay where HEAD is without detaching it.
    let rev = match args.target {
        Some(rev) => rev,
        None => repo.current_branch()?.unwrap_or_else(|| "HEAD".into()),
    };
    let target = repo.checkout_target(&rev)?;
    let report = repo.checkout(&target, args.branch.as_deref())?;
    if format == OutputFormat::Json {
        return print_json(&report);
    }
    match (&report.branch, &report.commit) {
        (Some(branch), _) => println!("{} Switched to branch {}", "✓".green().bold(), branch.yellow()),
        (None, Some(id)) => println!("{} HEAD is now detached at {}", "✓".green().bold(), id.short_hex().yellow()),
        (None, None) => println!("{} Restored the index", "✓".green().bold()),
    }
    println!("  {} files written, {} removed", report.written, report.removed);
    Ok(())
}

fn print_reset(actions: &[ResetAction]) {
    for action in actions.iter().filter(|a| a.is_change()) {
        let kind = format!("{:?}", action.kind).to_lowercase();
        println!("  {:>8} {}", kind.cyan(), action.path);
    }
}

fn cmd_reset(args: ResetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut repo = open_repo()?;
    let target = repo.resolve_revision(args.target.as_deref().unwrap_or("HEAD"))?;

    let actions = if args.paths.is_empty() {
        repo.reset(&target, args.hard)?
    } else {
        let mut actions = Vec::new();
        for path in from_cwd(&args.paths)? {
            actions.extend(repo.reset_path(&target, &path)?);
        }
        actions
    };
    if format == OutputFormat::Json {
        return print_json(&actions);
    }
    print_reset(&actions);
    if args.paths.is_empty() {
        println!("HEAD is now at {}", target.short_hex().yellow());
    }
    Ok(())
}

fn print_commit(commit: &Commit) {
    println!("{} {}", "commit".yellow(), commit.id.to_hex().yellow());
    if commit.pred.len() > 1 {
        let parents: Vec<_> = commit.pred.iter().map(|p| p.short_hex()).collect();
        println!("Merge:  {}", parents.join(" "));
    }
    println!("Author: {}", commit.author);
    if commit.committer != commit.author {
        println!("Commit: {}", commit.committer);
    }
    println!();
    for line in commit.message.lines() {
        println!("    {line}");
    }
}

fn cmd_log(args: LogArgs, format: OutputFormat) -> anyhow::Result<()> {
    let repo = open_repo()?;
    let log = repo.log(args.rev.as_deref().unwrap_or("HEAD"), args.limit)?;
    if format == OutputFormat::Json {
        return print_json(&log);
    }
    for (i, commit) in log.iter().enumerate() {
        if args.oneline {
            println!("{} {}", commit.id.short_hex().yellow(), commit.summary());
            continue;
        }
        if i > 0 {
            println!();
        }
        print_commit(commit);
    }
    Ok(())
}

fn cmd_show(args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let repo = open_repo()?;
    let commit = repo.show(&args.rev)?;
    let base = commit.first_parent().unwrap_or(commit.id);
    let diff = repo.diff(
        SnapshotSource::Commit(base),
        SnapshotSource::Commit(commit.id),
        &[],
    )?;
    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({ "commit": commit, "changes": diff }));
    }
    print_commit(&commit);
    println!();
    for (path, entry) in diff.changes() {
        println!("{}\t{}", entry.status.letter(), path);
    }
    Ok(())
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let repo = open_repo()?;
    let base = parse_source(&repo, args.base.as_deref().unwrap_or("index"))?;
    let target = parse_source(&repo, args.target.as_deref().unwrap_or("worktree"))?;
    let diff = repo.diff(base, target, &from_cwd(&args.paths)?)?.only_changes();
    if format == OutputFormat::Json {
        return print_json(&diff);
    }
    for (path, entry) in diff.changes() {
        if args.name_status {
            println!("{}\t{}", entry.status.letter(), path);
            continue;
        }
        let old = entry.old.map(|id| repo.read_content(path, &id)).transpose()?;
        let new = entry.new.map(|id| repo.read_content(path, &id)).transpose()?;
        render::print_unified(path, old.as_deref(), new.as_deref());
    }
    Ok(())
}

fn cmd_branch(args: BranchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let repo = open_repo()?;
    if let Some(name) = &args.name {
        let id = repo.create_branch(name, args.at.as_deref())?;
        if format == OutputFormat::Json {
            return print_json(&serde_json::json!({ "name": name, "commit": id }));
        }
        println!("Created branch {} at {}", name.yellow(), id.short_hex().dimmed());
        return Ok(());
    }

    let current = repo.current_branch()?;
    let branches = repo.branches()?;
    if format == OutputFormat::Json {
        let list: Vec<_> = branches
            .iter()
            .map(|(name, id)| {
                serde_json::json!({
                    "name": name,
                    "commit": id,
                    "current": current.as_deref() == Some(name.as_str()),
                })
            })
            .collect();
        return print_json(&list);
    }
    for (name, id) in &branches {
        if current.as_deref() == Some(name.as_str()) {
            println!("* {} {}", name.green().bold(), id.short_hex().dimmed());
        } else {
            println!("  {} {}", name, id.short_hex().dimmed());
        }
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut repo = open_repo()?;
    match (args.key, args.value) {
        (Some(key), Some(value)) => {
            repo.config_set(&key, &value)?;
            println!("{} {} = {}", "✓".green().bold(), key.bold(), value);
        }
        (Some(key), None) => {
            let value = repo
                .config_get(&key)
                .ok_or(EngineError::MissingConfig { key })?;
            println!("{value}");
        }
        (None, _) => {
            let entries = repo.config().entries();
            if format == OutputFormat::Json {
                let map: serde_json::Map<_, _> = entries
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect();
                return print_json(&map);
            }
            for (key, value) in entries {
                println!("{} = {}", key.bold(), value);
            }
        }
    }
    Ok(())
}

fn cmd_fsck(format: OutputFormat) -> anyhow::Result<()> {
    let repo = open_repo()?;
    let repaired = repo.repair_successors()?;
    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({ "repaired": repaired }));
    }
    if repaired == 0 {
        println!("{} No issues.", "✓".green().bold());
    } else {
        println!("{} Repaired {} commit record(s).", "✓".green().bold(), repaired);
    }
    Ok(())
}
