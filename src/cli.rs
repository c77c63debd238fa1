//! Command-line interface
//!
//! Argument definitions plus terminal implementations of the controller's
//! collaborators. Prompts read answers from stdin; `--yes` answers them.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gameshelf::config::{AppPaths, GameEntry, SortMode};
use gameshelf::controller::{
    Customization, EntryCustomizer, LibraryController, LibraryView, Notice, UserPrompt,
};
use gameshelf::import::{ImportOutcome, ImportReport};
use gameshelf::utils::IconSource;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "gameshelf")]
#[command(author, version, about = "Manage a local game library")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Data directory holding games.json, settings.json and logs
    #[arg(long, global = true, env = "GAMESHELF_HOME")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered games
    List(ListArgs),

    /// Register one executable
    Add(AddArgs),

    /// Change fields of a registered game
    Edit(EditArgs),

    /// Remove a registered game
    Remove {
        /// Identifier of the game
        id: Uuid,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Register several executables in one batch
    Import {
        /// Executables to import, processed in order
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Accept every entry without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Set and persist the list ordering
    Sort {
        /// New ordering
        mode: SortArg,
    },

    /// Assign identifiers to entries from older versions
    Migrate,
}

#[derive(Args)]
pub struct ListArgs {
    /// Ordering for this listing only
    #[arg(long)]
    pub sort: Option<SortArg>,

    /// Show where each icon comes from
    #[arg(long)]
    pub icons: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Executable to register
    pub exe: PathBuf,

    #[command(flatten)]
    pub fields: FieldArgs,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct EditArgs {
    /// Identifier of the game
    pub id: Uuid,

    /// New executable path
    #[arg(long)]
    pub exe: Option<PathBuf>,

    #[command(flatten)]
    pub fields: FieldArgs,

    /// Remove the custom icon
    #[arg(long, conflicts_with = "icon")]
    pub clear_icon: bool,
}

/// Field overrides shared by `add` and `edit`
#[derive(Args, Clone, Default)]
pub struct FieldArgs {
    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Working directory for launch
    #[arg(long)]
    pub start_dir: Option<PathBuf>,

    /// Custom icon image
    #[arg(long)]
    pub icon: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SortArg {
    /// Order in which games were added
    Insertion,
    /// Case-insensitive by name
    Alphabetical,
}

impl From<SortArg> for SortMode {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Insertion => SortMode::InsertionOrder,
            SortArg::Alphabetical => SortMode::Alphabetical,
        }
    }
}

/// Run one subcommand against the library in `paths`
pub fn execute(command: Commands, paths: AppPaths) -> Result<()> {
    let assume_yes = matches!(
        command,
        Commands::Remove { yes: true, .. } | Commands::Import { yes: true, .. }
    ) || matches!(&command, Commands::Add(args) if args.yes);

    let mut prompt = TerminalPrompt::new(assume_yes);
    let mut controller = LibraryController::open(paths, &mut prompt)
        .context("Failed to open game library")?;

    match command {
        Commands::List(args) => {
            let view = match args.sort {
                Some(sort) => controller.view_with(sort.into()),
                None => controller.view(),
            };
            print_view(&controller, &view, args.icons);
        }
        Commands::Add(args) => {
            let mut customizer = TerminalCustomizer {
                overrides: EntryOverrides::from_fields(args.fields),
                assume_yes: args.yes,
            };
            match controller.add_game(&args.exe, &mut customizer)? {
                Some(entry) => println!("Added '{}' ({})", entry.display_name, entry.id),
                None => println!("Nothing added"),
            }
        }
        Commands::Edit(args) => {
            let mut overrides = EntryOverrides::from_fields(args.fields);
            overrides.executable = args.exe;
            overrides.clear_icon = args.clear_icon;
            let mut customizer = TerminalCustomizer {
                overrides,
                assume_yes: true,
            };
            if let Some(entry) = controller.edit_game(args.id, &mut customizer)? {
                println!("Updated '{}' ({})", entry.display_name, entry.id);
            }
        }
        Commands::Remove { id, .. } => match controller.delete_game(id, &mut prompt)? {
            Some(entry) => println!("Removed '{}'", entry.display_name),
            None => println!("Nothing removed"),
        },
        Commands::Import { paths, yes } => {
            let customizer = TerminalCustomizer {
                overrides: EntryOverrides::default(),
                assume_yes: yes,
            };
            controller.begin_import(paths, Box::new(customizer))?;
            if let Some(report) = controller.wait_for_import()? {
                print_report(&report);
                prompt.notify(&Notice::ImportFinished {
                    summary: report.summary(),
                });
            }
        }
        Commands::Sort { mode } => {
            controller.set_sort_mode(mode.into())?;
            println!("Sort mode set to {:?}", SortMode::from(mode));
        }
        Commands::Migrate => {
            if !prompt.notified_migration {
                println!("All entries already have identifiers");
            }
        }
    }

    // No window in a terminal session; keep the stored geometry
    let window = controller.settings().window;
    controller.shutdown(window).context("Failed to save settings")
}

fn print_view(controller: &LibraryController, view: &LibraryView, show_icons: bool) {
    if view.entries.is_empty() {
        println!("No games registered");
        return;
    }

    let icons = show_icons.then(|| controller.icons_for_view(view));
    for (index, entry) in view.entries.iter().enumerate() {
        let icon = icons.as_ref().map_or(String::new(), |icons| {
            let label = match icons[index].source() {
                IconSource::Custom => "custom",
                IconSource::Executable => "exe",
                IconSource::Fallback => "generic",
            };
            format!("  [{label}]")
        });
        println!(
            "{}  {}  {}{}",
            entry.id,
            entry.display_name,
            entry.executable_path.display(),
            icon
        );
    }
}

fn print_report(report: &ImportReport) {
    for item in &report.items {
        match &item.outcome {
            ImportOutcome::Added(entry) => {
                println!("added    {}  ({})", item.path.display(), entry.id);
            }
            ImportOutcome::Skipped => println!("skipped  {}", item.path.display()),
            ImportOutcome::Failed(e) => println!("failed   {}  {e}", item.path.display()),
        }
    }
}

/// Read a yes/no answer; an empty line picks `default`
fn ask(question: &str, default: bool) -> bool {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    print!("{question} {hint} ");
    if std::io::stdout().flush().is_err() {
        return default;
    }

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return default;
    }
    match answer.trim().to_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    }
}

/// Terminal confirmation prompts and notices
struct TerminalPrompt {
    assume_yes: bool,
    notified_migration: bool,
}

impl TerminalPrompt {
    fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            notified_migration: false,
        }
    }
}

impl UserPrompt for TerminalPrompt {
    fn confirm_delete(&mut self, entry: &GameEntry) -> bool {
        self.assume_yes
            || ask(
                &format!("Remove '{}' from the library?", entry.display_name),
                false,
            )
    }

    fn notify(&mut self, notice: &Notice) {
        match notice {
            Notice::MigrationCompleted { count } => {
                self.notified_migration = true;
                println!("Updated {count} entries from an older library version");
            }
            Notice::ImportFinished { summary } => println!("Import finished: {summary}"),
        }
    }
}

/// Field changes requested on the command line
#[derive(Clone, Default)]
struct EntryOverrides {
    name: Option<String>,
    executable: Option<PathBuf>,
    start_dir: Option<PathBuf>,
    icon: Option<PathBuf>,
    clear_icon: bool,
}

impl EntryOverrides {
    fn from_fields(fields: FieldArgs) -> Self {
        Self {
            name: fields.name,
            start_dir: fields.start_dir,
            icon: fields.icon,
            ..Self::default()
        }
    }

    fn apply(&self, mut entry: GameEntry) -> GameEntry {
        if let Some(name) = &self.name {
            entry.display_name.clone_from(name);
        }
        if let Some(executable) = &self.executable {
            entry.executable_path.clone_from(executable);
        }
        if let Some(start_dir) = &self.start_dir {
            entry.start_directory.clone_from(start_dir);
        }
        if let Some(icon) = &self.icon {
            entry.custom_icon_path = Some(icon.clone());
        }
        if self.clear_icon {
            entry.custom_icon_path = None;
        }
        entry
    }
}

/// Applies overrides, then asks before keeping each entry
struct TerminalCustomizer {
    overrides: EntryOverrides,
    assume_yes: bool,
}

impl EntryCustomizer for TerminalCustomizer {
    fn customize(&mut self, candidate: GameEntry) -> Customization {
        let entry = self.overrides.apply(candidate);
        let keep = self.assume_yes
            || ask(
                &format!(
                    "Add '{}' ({})?",
                    entry.display_name,
                    entry.executable_path.display()
                ),
                true,
            );
        if keep {
            Customization::Confirmed(entry)
        } else {
            Customization::Cancelled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_import_with_yes() {
        let cli = Cli::try_parse_from(["gameshelf", "import", "a.exe", "b.exe", "--yes"]).unwrap();
        match cli.command {
            Commands::Import { paths, yes } => {
                assert_eq!(paths, [PathBuf::from("a.exe"), PathBuf::from("b.exe")]);
                assert!(yes);
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn test_edit_rejects_icon_and_clear_icon() {
        let id = Uuid::new_v4().to_string();
        let result = Cli::try_parse_from([
            "gameshelf",
            "edit",
            id.as_str(),
            "--icon",
            "x.png",
            "--clear-icon",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_apply_fields() {
        let overrides = EntryOverrides {
            name: Some("Doom II".to_string()),
            icon: Some(PathBuf::from("/icons/doom.png")),
            ..EntryOverrides::default()
        };
        let entry = overrides.apply(GameEntry::new("doom", "/games/doom.exe", "/games"));

        assert_eq!(entry.display_name, "Doom II");
        assert_eq!(entry.custom_icon_path, Some(PathBuf::from("/icons/doom.png")));
        assert_eq!(entry.executable_path, PathBuf::from("/games/doom.exe"));
    }

    #[test]
    fn test_clear_icon_wins() {
        let overrides = EntryOverrides {
            clear_icon: true,
            ..EntryOverrides::default()
        };
        let entry = overrides.apply(
            GameEntry::new("doom", "/games/doom.exe", "/games").with_custom_icon("/icons/a.png"),
        );
        assert_eq!(entry.custom_icon_path, None);
    }
}
