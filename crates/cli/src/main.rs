use anyhow::Result;
use clap::{Parser, Subcommand};
use dbimport::commands::{
    import_command, init_program_command, list_imports_command, show_program_command,
};
use dbimport::init_tracing;

/// Import x64dbg annotation databases into a program database.
///
/// This CLI is a thin wrapper around `dbimport-core` (exposed in code as `dbimport_core`).
/// All merge logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "dbimport",
    version,
    about = "Import x64dbg comments, bookmarks, labels and functions",
    long_about = None
)]
struct Cli {
    /// Log each applied record.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a program database for a module loaded at a given base.
    InitProgram {
        /// Path to the program database file.
        #[arg(long)]
        program: String,

        /// Module name as x64dbg records it (e.g., `target.exe`).
        #[arg(long)]
        name: String,

        /// Image base in hex (e.g., `0x400000`).
        #[arg(long)]
        base: String,

        /// Pointer size in bytes (4 for 32-bit databases, 8 for 64-bit).
        #[arg(long, default_value_t = 8)]
        pointer_size: u8,
    },

    /// Import a decompressed x64dbg database (.dd32/.dd64 as JSON).
    ///
    /// The database must be decompressed first, e.g. `lz4 -d db.dd64 out.json`.
    /// Omitting `--database` cancels the import without changing anything.
    Import {
        /// Path to the program database file.
        #[arg(long)]
        program: String,

        /// Path to the decompressed JSON database.
        #[arg(long)]
        database: Option<String>,

        /// Optional import config (JSON or YAML).
        #[arg(long)]
        config: Option<String>,

        /// Emit the summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the program identity and all annotations.
    ShowProgram {
        #[arg(long)]
        program: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List imports previously applied to the program database.
    ListImports {
        #[arg(long)]
        program: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::InitProgram { program, name, base, pointer_size } => {
            init_program_command(&program, &name, &base, pointer_size)?
        }
        Command::Import { program, database, config, json } => {
            import_command(&program, database.as_deref(), config.as_deref(), json)?;
        }
        Command::ShowProgram { program, json } => show_program_command(&program, json)?,
        Command::ListImports { program, json } => list_imports_command(&program, json)?,
    }

    Ok(())
}
