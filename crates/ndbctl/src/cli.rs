//! CLI structure and command definitions

use clap::{Args, Parser, Subcommand};

/// Nutanix NDB database server management CLI
#[derive(Parser, Debug)]
#[command(name = "ndbctl")]
#[command(version, about = "Nutanix NDB database server management CLI")]
#[command(long_about = "
Nutanix NDB database server management CLI

Provision, inspect, update and delete NDB database server VMs. Long-running
actions are tracked through NDB operations and waited on by default.

EXAMPLES:
    # Set up a profile (password can come from NDB_PASSWORD)
    ndbctl profile set lab --url https://ndb.example.com --username admin

    # Provision a DB server VM from a config file and wait for it
    ndbctl dbserver create --file dbserver.toml

    # Show a DB server as JSON
    ndbctl dbserver get 6b2c1a4e-0000-0000-0000-000000000000 -o json

    # Wait on an operation started elsewhere
    ndbctl operation wait 9f1e2d3c-0000-0000-0000-000000000000

For more help on a specific command, run:
    ndbctl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "NDBCTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file (environment overrides are ignored)
    #[arg(long, global = true, env = "NDBCTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table for humans
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// DB server VM lifecycle
    #[command(subcommand, visible_alias = "db")]
    Dbserver(DbServerCommands),

    /// Inspect and wait on NDB operations
    #[command(subcommand, visible_alias = "op")]
    Operation(OperationCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof")]
    Profile(ProfileCommands),

    /// Show version information
    #[command(visible_alias = "ver")]
    Version,
}

/// Arguments shared by commands that wait on an operation
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Return as soon as the operation is accepted
    #[arg(long)]
    pub no_wait: bool,

    /// Maximum time to wait in seconds (defaults to the profile's timeout)
    #[arg(long, conflicts_with = "no_wait")]
    pub timeout: Option<u64>,

    /// Polling interval in seconds (defaults to the profile's interval)
    #[arg(long, conflicts_with = "no_wait")]
    pub interval: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum DbServerCommands {
    /// Provision a DB server VM
    #[command(after_help = "EXAMPLES:
    # dbserver.toml
    database_type = \"postgres_database\"
    software_profile_id = \"...\"
    software_profile_version_id = \"...\"
    network_profile_id = \"...\"
    compute_profile_id = \"...\"
    nx_cluster_id = \"...\"
    vm_password = \"...\"

    [[postgres_database]]
    vm_name = \"pg-vm-01\"
    client_public_key = \"ssh-rsa AAAA...\"

    ndbctl dbserver create --file dbserver.toml
")]
    Create {
        /// DB server configuration (TOML, JSON or YAML)
        #[arg(long, short)]
        file: String,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Show a DB server
    #[command(visible_alias = "show")]
    Get {
        /// DB server ID
        id: String,
    },

    /// Update the name, description or tags of a DB server
    Update {
        /// DB server ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// Tag as TAG_ID=VALUE (repeatable; replaces all tags)
        #[arg(long = "tag", value_name = "TAG_ID=VALUE")]
        tags: Vec<String>,
    },

    /// Delete a DB server VM
    #[command(visible_alias = "rm")]
    Delete {
        /// DB server ID
        id: String,

        /// Unregister from NDB but keep the VM
        #[arg(long)]
        remove_only: bool,

        /// Soft remove
        #[arg(long)]
        soft_remove: bool,

        /// Keep the VM's volume groups
        #[arg(long)]
        keep_vgs: bool,

        /// Keep the VM's snapshots
        #[arg(long)]
        keep_snapshots: bool,

        #[command(flatten)]
        wait: WaitArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum OperationCommands {
    /// Show the current state of an operation
    Get {
        /// Operation ID
        id: String,
    },

    /// Wait for an operation to reach COMPLETED or FAILED
    Wait {
        /// Operation ID
        id: String,

        /// Maximum time to wait in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Polling interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(after_help = "EXAMPLES:
    # Create a profile (password from NDB_PASSWORD or prompted on use)
    ndbctl profile set lab --url https://ndb.example.com --username admin

    # Store the password and make this the default profile
    ndbctl profile set prod --url https://ndb.prod:8443 --username admin \\
        --password secret --default

    # Self-signed certificate on a lab appliance
    ndbctl profile set lab --url https://10.0.0.10 --username admin --insecure
")]
    Set {
        /// Profile name
        name: String,

        /// NDB server URL
        #[arg(long)]
        url: String,

        /// NDB username
        #[arg(long)]
        username: String,

        /// NDB password
        #[arg(long)]
        password: Option<String>,

        /// Accept invalid TLS certificates
        #[arg(long)]
        insecure: bool,

        /// Make this the default profile
        #[arg(long)]
        default: bool,

        /// Store the password in the OS keyring
        #[cfg(feature = "secure-storage")]
        #[arg(long, requires = "password")]
        use_keyring: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm")]
    Remove {
        /// Profile name to remove
        name: String,
    },
}
