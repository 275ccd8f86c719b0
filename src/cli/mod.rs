//! CLI argument definitions for rig.

use clap::{Parser, Subcommand};

/// rig - Typed environment configuration with remote sync.
///
/// Run `rig init` once, then manage schemas, config sheets and projects.
/// Without a subcommand rig prints the store status.
#[derive(Parser, Debug)]
#[command(name = "rig")]
#[command(author, version, about = "Typed environment configuration with remote sync", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Use <path> as the rig home instead of ~/.rigging.
    /// Can also be set via RIG_HOME environment variable.
    #[arg(short = 'C', long = "home", global = true, env = "RIG_HOME")]
    pub home: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the rig home directory and its indexes
    Init,

    /// Show version and build information
    Version,

    /// Schema management commands
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },

    /// Config sheet management commands
    Sheet {
        #[command(subcommand)]
        command: SheetCommands,
    },

    /// Project and environment management commands
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Re-validate stored sheets or schemas
    ///
    /// Pick one target: --sheet, --project (optionally narrowed with
    /// --env), or --schema. Exits non-zero when any target fails.
    Verify {
        /// Verify a single config sheet by name or UUID
        #[arg(long)]
        sheet: Option<String>,

        /// Verify every environment sheet of a project
        #[arg(long)]
        project: Option<String>,

        /// Narrow --project to one environment
        #[arg(long)]
        env: Option<String>,

        /// Verify a schema definition and its extends chain
        #[arg(long)]
        schema: Option<String>,
    },

    /// Push a project and everything it references to the remote
    Push {
        /// Project name or UUID
        project: String,

        /// Remote URL or org@host shorthand
        #[arg(long, env = "RIG_REMOTE_URL")]
        remote: Option<String>,

        /// Plan and report without changing the remote
        #[arg(long)]
        dry_run: bool,

        /// Overwrite remote copies even when they are newer
        #[arg(long)]
        force: bool,
    },

    /// Pull schemas and config sheets from the remote
    Pull {
        /// Remote URL or org@host shorthand
        #[arg(long, env = "RIG_REMOTE_URL")]
        remote: Option<String>,

        /// Pull schemas only
        #[arg(long)]
        schemas: bool,

        /// Pull config sheets only
        #[arg(long)]
        sheets: bool,

        /// Plan and report without changing the store
        #[arg(long)]
        dry_run: bool,

        /// Overwrite local copies even when they are newer
        #[arg(long)]
        force: bool,
    },

    /// Remote service commands
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },

    /// Local store maintenance commands
    Store {
        #[command(subcommand)]
        command: StoreCommands,
    },
}

/// Schema subcommands
#[derive(Subcommand, Debug)]
pub enum SchemaCommands {
    /// Create a new schema
    Create {
        /// Schema name
        name: String,

        /// Schema description
        #[arg(short, long)]
        description: Option<String>,

        /// Parent schema (name or UUID) to inherit variables from
        #[arg(short, long)]
        extends: Vec<String>,

        /// Variable spec: name:type[:title[:required[:default]]]
        #[arg(short, long = "variable")]
        variable: Vec<String>,
    },

    /// List schemas
    List,

    /// Show schema details
    Show {
        /// Schema name or UUID
        name: String,

        /// Include the effective variables through the extends chain
        #[arg(short, long)]
        resolved: bool,
    },

    /// Update a schema
    Update {
        /// Schema name or UUID
        name: String,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// Add or replace a variable: name:type[:title[:required[:default]]]
        #[arg(short, long = "variable")]
        variable: Vec<String>,

        /// Remove a variable by name
        #[arg(long)]
        remove_variable: Vec<String>,

        /// Replace the extends list (repeat for multiple parents)
        #[arg(short, long)]
        extends: Option<Vec<String>>,
    },

    /// Delete a schema (refused while anything references it)
    Delete {
        /// Schema name or UUID
        name: String,

        /// Also delete the remote copy
        #[arg(long)]
        remote: bool,
    },
}

/// Config sheet subcommands
#[derive(Subcommand, Debug)]
pub enum SheetCommands {
    /// Create a new config sheet
    ///
    /// With --project and --env the sheet backs that environment and its
    /// name is derived as {project}-{environment}.
    Create {
        /// Sheet name (optional with --project/--env)
        name: Option<String>,

        /// Schema (name or UUID) to validate values against
        #[arg(short, long)]
        schema: Option<String>,

        /// Project this sheet belongs to
        #[arg(short, long)]
        project: Option<String>,

        /// Environment within --project
        #[arg(short, long)]
        env: Option<String>,

        /// Sheet description
        #[arg(short, long)]
        description: Option<String>,

        /// Parent sheet (name or UUID) to inherit values from
        #[arg(long)]
        extends: Vec<String>,

        /// Set a value: KEY=value (overrides imported values)
        #[arg(short, long = "value")]
        value: Vec<String>,

        /// Import values from a dotenv file
        #[arg(long)]
        import_env: Option<std::path::PathBuf>,

        /// Import values from a flat JSON object file
        #[arg(long)]
        import_json: Option<std::path::PathBuf>,
    },

    /// List config sheets
    List {
        /// Only sheets belonging to this project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Show sheet details (sensitive values masked)
    Show {
        /// Sheet name or UUID (or use --project/--env)
        name: Option<String>,

        /// Project owning the sheet
        #[arg(short, long)]
        project: Option<String>,

        /// Environment within --project
        #[arg(short, long)]
        env: Option<String>,

        /// Include the effective values through the extends chain
        #[arg(short, long)]
        resolved: bool,

        /// Print sensitive values unmasked
        #[arg(long)]
        reveal: bool,
    },

    /// Set values on a sheet
    Set {
        /// Sheet name or UUID
        name: String,

        /// KEY=value pairs
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Remove values from a sheet
    Unset {
        /// Sheet name or UUID
        name: String,

        /// Keys to remove
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Export a sheet's values (unmasked)
    Export {
        /// Sheet name or UUID (or use --project/--env)
        name: Option<String>,

        /// Project owning the sheet
        #[arg(short, long)]
        project: Option<String>,

        /// Environment within --project
        #[arg(short, long)]
        env: Option<String>,

        /// Output format: dotenv or json
        #[arg(short, long, default_value = "dotenv")]
        format: String,

        /// Export the effective values through the extends chain
        #[arg(short, long)]
        resolved: bool,

        /// Write to a file instead of printing
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },

    /// Delete a config sheet
    Delete {
        /// Sheet name or UUID (or use --project/--env)
        name: Option<String>,

        /// Project owning the sheet
        #[arg(short, long)]
        project: Option<String>,

        /// Environment within --project
        #[arg(short, long)]
        env: Option<String>,

        /// Also delete the remote copy
        #[arg(long)]
        remote: bool,
    },
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project
    Create {
        /// Project name
        name: String,

        /// Project description
        #[arg(short, long)]
        description: Option<String>,

        /// Default schema (name or UUID) for new environment sheets
        #[arg(short, long)]
        schema: Option<String>,
    },

    /// List projects
    List,

    /// Show project details
    Show {
        /// Project name or UUID
        name: String,
    },

    /// Update a project
    Update {
        /// Project name or UUID
        name: String,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New default schema (name or UUID)
        #[arg(short, long)]
        schema: Option<String>,
    },

    /// Delete a project and its environment sheets
    Delete {
        /// Project name or UUID
        name: String,

        /// Keep the sheets as standalone sheets instead of deleting them
        #[arg(long)]
        keep_sheets: bool,
    },

    /// Environment management commands
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
}

/// Project environment subcommands
#[derive(Subcommand, Debug)]
pub enum EnvCommands {
    /// Add an environment and create its backing sheet
    Add {
        /// Project name or UUID
        project: String,

        /// Environment name
        env: String,

        /// Schema for the sheet (defaults to the project's)
        #[arg(short, long)]
        schema: Option<String>,
    },

    /// Remove an environment and delete its backing sheet
    Remove {
        /// Project name or UUID
        project: String,

        /// Environment name
        env: String,
    },

    /// List a project's environments
    List {
        /// Project name or UUID
        project: String,
    },
}

/// Remote subcommands
#[derive(Subcommand, Debug)]
pub enum RemoteCommands {
    /// Check connectivity and report remote entity counts
    Check {
        /// Remote URL or org@host shorthand
        #[arg(long, env = "RIG_REMOTE_URL")]
        remote: Option<String>,
    },
}

/// Store subcommands
#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// Check store and index consistency
    Check,
}
