//! These structs provide the CLI interface for the ledger-quest CLI.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;
use uuid::Uuid;

/// ledger-quest: A personal finance ledger that levels you up.
///
/// Record income and expenses, watch your balance and your progress toward a savings target, and
/// earn experience along the way. Income earns experience, expenses cost a little. Enough
/// experience raises your level, and your level decides your rank.
///
/// Everything is stored in a small SQLite database in your ledger-quest home directory. Start by
/// running `ledger-quest init`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory with a default config.json and an empty ledger.
    ///
    /// This is the first command you should run. By default the home directory is
    /// $HOME/ledger-quest; pass --home or set LEDGER_QUEST_HOME to put it somewhere else. Edit
    /// config.json afterwards to change the default username or the experience rules.
    Init,
    /// Record an income or an expense dated now.
    Add(AddArgs),
    /// Delete a transaction by its position in `list`, or by its id.
    Delete(DeleteArgs),
    /// Set the savings target. Use 0 to clear it.
    Target(TargetArgs),
    /// Change your display name.
    Rename(RenameArgs),
    /// Show balance, savings progress, the last 7 days, level and rank.
    Show,
    /// List all transactions, newest first.
    List,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the ledger and its configuration are held. Defaults to ~/ledger-quest
    #[arg(long, env = "LEDGER_QUEST_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `ledger-quest add` command.
#[derive(Debug, ClapArgs, Clone)]
pub struct AddArgs {
    /// Either "income" or "expense"
    kind: String,

    /// A positive whole amount, e.g. 150000 or 150,000
    #[arg(allow_hyphen_values = true)]
    amount: String,

    /// What the transaction was for
    #[arg(required = true, num_args = 1..)]
    description: Vec<String>,
}

impl AddArgs {
    pub fn new(
        kind: impl Into<String>,
        amount: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            amount: amount.into(),
            description: vec![description.into()],
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// The description words joined with single spaces.
    pub fn description(&self) -> String {
        self.description.join(" ")
    }
}

/// (Not shown): Args for the `ledger-quest delete` command.
#[derive(Debug, ClapArgs, Clone)]
pub struct DeleteArgs {
    /// The position shown by `list`, where 0 is the newest transaction
    #[arg(required_unless_present = "id", conflicts_with = "id")]
    position: Option<usize>,

    /// The id of the transaction, as shown by `list`
    #[arg(long)]
    id: Option<Uuid>,
}

impl DeleteArgs {
    pub fn by_position(position: usize) -> Self {
        Self {
            position: Some(position),
            id: None,
        }
    }

    pub fn by_id(id: Uuid) -> Self {
        Self {
            position: None,
            id: Some(id),
        }
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }
}

/// (Not shown): Args for the `ledger-quest target` command.
#[derive(Debug, ClapArgs, Clone)]
pub struct TargetArgs {
    /// The amount you want to save, e.g. 5000000 or 5,000,000
    amount: String,
}

impl TargetArgs {
    pub fn new(amount: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
        }
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }
}

/// (Not shown): Args for the `ledger-quest rename` command.
#[derive(Debug, ClapArgs, Clone)]
pub struct RenameArgs {
    /// The new name
    #[arg(required = true, num_args = 1..)]
    name: Vec<String>,
}

impl RenameArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: vec![name.into()],
        }
    }

    /// The name words joined with single spaces.
    pub fn name(&self) -> String {
        self.name.join(" ")
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("ledger-quest"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or LEDGER_QUEST_HOME instead of relying on the default \
                ledger-quest home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("ledger-quest")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["ledger-quest", "--home", "/tmp/lq"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_add() {
        let args = parse(&["add", "income", "150,000", "Gaji", "bulan", "Juni"]);
        assert_eq!(args.common().home().path(), Path::new("/tmp/lq"));
        match args.command() {
            Command::Add(add) => {
                assert_eq!(add.kind(), "income");
                assert_eq!(add.amount(), "150,000");
                assert_eq!(add.description(), "Gaji bulan Juni");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_delete() {
        match parse(&["delete", "2"]).command() {
            Command::Delete(d) => {
                assert_eq!(d.position(), Some(2));
                assert_eq!(d.id(), None);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let id = "6f1c1f3e-8a3b-4a5e-9c55-0a4d4f8f2b11";
        match parse(&["delete", "--id", id]).command() {
            Command::Delete(d) => {
                assert_eq!(d.position(), None);
                assert_eq!(d.id(), Some(Uuid::parse_str(id).unwrap()));
            }
            other => panic!("unexpected command {other:?}"),
        }

        let argv = ["ledger-quest", "delete"];
        assert!(Args::try_parse_from(argv).is_err());
        let argv = ["ledger-quest", "delete", "1", "--id", id];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_parse_log_level() {
        let args = Args::try_parse_from(["ledger-quest", "--log-level", "debug", "show"]).unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
    }
}
