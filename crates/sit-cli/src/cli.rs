use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sit",
    about = "sit: a small local version control system",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty repository
    Init(InitArgs),
    /// Stage files and directories
    Add(AddArgs),
    /// Unstage paths, keeping the files
    Rm(RmArgs),
    /// Record the index as a commit
    Commit(CommitArgs),
    /// Show staged, unstaged and untracked changes
    Status(StatusArgs),
    /// Switch to a commit or branch, or restore paths
    Checkout(CheckoutArgs),
    /// Move the index (and optionally the work tree) to a commit
    Reset(ResetArgs),
    /// Show first-parent history
    Log(LogArgs),
    /// Show one commit
    Show(ShowArgs),
    /// Compare two snapshots
    Diff(DiffArgs),
    /// List or create branches
    Branch(BranchArgs),
    /// Get or set configuration
    Config(ConfigArgs),
    /// Check and repair the commit graph
    Fsck(FsckArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct RmArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: Option<String>,
    #[arg(long)]
    pub amend: bool,
}

#[derive(Args)]
pub struct StatusArgs {}

#[derive(Args)]
pub struct CheckoutArgs {
    /// Revision, branch, or `index`
    pub target: Option<String>,
    /// Create this branch at the target and switch to it
    #[arg(short = 'b', value_name = "BRANCH")]
    pub branch: Option<String>,
    /// Restore only these paths
    #[arg(last = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct ResetArgs {
    pub target: Option<String>,
    #[arg(long, conflicts_with = "paths")]
    pub hard: bool,
    #[arg(last = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct LogArgs {
    pub rev: Option<String>,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    #[arg(default_value = "HEAD")]
    pub rev: String,
}

#[derive(Args)]
pub struct DiffArgs {
    /// `index`, `worktree`, or a revision (default: index)
    pub base: Option<String>,
    /// `index`, `worktree`, or a revision (default: worktree)
    pub target: Option<String>,
    /// List changed paths without line diffs
    #[arg(long)]
    pub name_status: bool,
    #[arg(last = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct BranchArgs {
    pub name: Option<String>,
    /// Revision for the new branch (default: HEAD)
    pub at: Option<String>,
}

#[derive(Args)]
pub struct ConfigArgs {
    pub key: Option<String>,
    pub value: Option<String>,
}

#[derive(Args)]
pub struct FsckArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["sit", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init(InitArgs { path: None })));
    }

    #[test]
    fn parse_add_requires_paths() {
        assert!(Cli::try_parse_from(["sit", "add"]).is_err());
        let cli = Cli::try_parse_from(["sit", "add", "a.txt", "src"]).unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.paths, [PathBuf::from("a.txt"), PathBuf::from("src")]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_commit_amend() {
        let cli = Cli::try_parse_from(["sit", "commit", "-m", "hello", "--amend"]).unwrap();
        if let Command::Commit(args) = cli.command {
            assert_eq!(args.message, Some("hello".into()));
            assert!(args.amend);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_checkout_new_branch() {
        let cli = Cli::try_parse_from(["sit", "checkout", "HEAD~1", "-b", "fix"]).unwrap();
        if let Command::Checkout(args) = cli.command {
            assert_eq!(args.target.as_deref(), Some("HEAD~1"));
            assert_eq!(args.branch.as_deref(), Some("fix"));
            assert!(args.paths.is_empty());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_checkout_paths() {
        let cli = Cli::try_parse_from(["sit", "checkout", "--", "docs", "a.txt"]).unwrap();
        if let Command::Checkout(args) = cli.command {
            assert_eq!(args.target, None);
            assert_eq!(args.paths.len(), 2);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_reset_hard_conflicts_with_paths() {
        let cli = Cli::try_parse_from(["sit", "reset", "HEAD~1", "--hard"]).unwrap();
        if let Command::Reset(args) = cli.command {
            assert!(args.hard);
            assert_eq!(args.target.as_deref(), Some("HEAD~1"));
        } else { panic!("wrong command"); }
        assert!(Cli::try_parse_from(["sit", "reset", "--hard", "--", "a.txt"]).is_err());
    }

    #[test]
    fn parse_log_limit() {
        let cli = Cli::try_parse_from(["sit", "log", "master", "-n", "5", "--oneline"]).unwrap();
        if let Command::Log(args) = cli.command {
            assert_eq!(args.rev.as_deref(), Some("master"));
            assert_eq!(args.limit, Some(5));
            assert!(args.oneline);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_diff_sources_and_paths() {
        let cli = Cli::try_parse_from(["sit", "diff", "HEAD", "index", "--", "src"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.base.as_deref(), Some("HEAD"));
            assert_eq!(args.target.as_deref(), Some("index"));
            assert_eq!(args.paths, [PathBuf::from("src")]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_config_set() {
        let cli = Cli::try_parse_from(["sit", "config", "user.name", "Ada"]).unwrap();
        if let Command::Config(args) = cli.command {
            assert_eq!(args.key.as_deref(), Some("user.name"));
            assert_eq!(args.value.as_deref(), Some("Ada"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_verbose_json() {
        let cli = Cli::try_parse_from(["sit", "--verbose", "--format", "json", "status"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
