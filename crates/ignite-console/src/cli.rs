//! Clap derive structures for the `ignite-console` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ignite-console -- manage Ignite Web Console cluster configurations
#[derive(Debug, Parser)]
#[command(
    name = "ignite-console",
    version,
    about = "Manage Apache Ignite cluster configurations from the command line",
    long_about = "Inspect and edit the cluster configurations stored by an Apache Ignite\n\
        Web Console backend: clusters, caches, domain models and IGFS.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "IGNITE_CONSOLE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Web Console URL (overrides profile)
    #[arg(long, short = 'u', env = "IGNITE_CONSOLE_URL", global = true)]
    pub url: Option<String>,

    /// Sign-in email (overrides profile)
    #[arg(long, short = 'e', env = "IGNITE_CONSOLE_EMAIL", global = true)]
    pub email: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "IGNITE_CONSOLE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "IGNITE_CONSOLE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "IGNITE_CONSOLE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage cluster configurations
    #[command(alias = "cl")]
    Clusters(ClustersArgs),

    /// List the caches of a cluster
    Caches(ItemsArgs),

    /// List the domain models of a cluster
    #[command(alias = "domains")]
    Models(ItemsArgs),

    /// List the IGFS of a cluster
    Igfss(ItemsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CLUSTERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ClustersArgs {
    #[command(subcommand)]
    pub command: ClustersCommand,
}

#[derive(Debug, Subcommand)]
pub enum ClustersCommand {
    /// List clusters
    #[command(alias = "ls")]
    List,

    /// Show a cluster with every cache, model and IGFS it links
    Show {
        /// Cluster ID
        id: String,
    },

    /// Remove clusters
    #[command(alias = "rm")]
    Remove {
        /// Cluster IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Copy clusters under fresh names
    #[command(alias = "cp")]
    Clone {
        /// Cluster IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Save a cluster and its caches, as the basic screen does
    SaveBasic {
        /// JSON file holding `{cluster, caches}`
        #[arg(long, short = 'F')]
        from_file: PathBuf,
    },

    /// Save a complete configuration, as the advanced screens do
    SaveAdvanced {
        /// JSON file holding `{cluster, caches, models, igfss}`
        #[arg(long, short = 'F')]
        from_file: PathBuf,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CLUSTER ITEMS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ItemsArgs {
    #[command(subcommand)]
    pub command: ItemsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ItemsCommand {
    /// List the items linked to a cluster
    #[command(alias = "ls")]
    List {
        /// Cluster ID
        #[arg(long, short = 'c')]
        cluster: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (url, email, password_env, insecure, timeout, ca_cert)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
