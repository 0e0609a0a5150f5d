//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Query and update CloudStack resources using cloudmonkey profiles.
#[derive(Parser, Debug, Clone)]
#[command(name = "stackctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Profile file to read (defaults to ~/.cloudmonkey/config).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Profile section to use instead of the one named in [core].
    #[arg(long, global = true, visible_alias = "region")]
    pub profile: Option<String>,

    /// Project to scope every call to, overriding the profile's projectid.
    #[arg(long, global = true, env = "CLOUDSTACK_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable columns.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the sorted, unique display names of all machines.
    ListMachines,

    /// Show machines whose name, id, IP, zone or offering equals TERM.
    GetMachineInfo {
        /// Display name, IP address, zone name, offering or machine id.
        term: String,
    },

    /// Print the IP addresses of machines with this display name.
    GetMachinesIps {
        /// Exact machine display name.
        name: String,

        /// Print only the first address.
        #[arg(short = 'o', long = "only-first")]
        only_first: bool,
    },

    /// List networks with their CIDR.
    ListNetworks,

    /// Show networks whose name contains NAME (case-insensitive).
    GetNetworkInfo {
        /// Network name fragment.
        name: String,
    },

    /// List the project's own OS templates.
    ListOsTemplates,

    /// List service offerings.
    ListServiceOfferings,

    /// Print one deployVirtualMachine argument line per matching network.
    GenerateTemplate(GenerateTemplateArgs),

    /// Replace the user data of machines with a base64-encoded file.
    UpdateMachineUserdata(UpdateUserdataArgs),

    /// Invoke any API operation and print its payload as JSON.
    Call(CallArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateTemplateArgs {
    /// Display name for the deployed machines.
    pub name: String,

    /// OS template id.
    #[arg(short = 't', long = "os-template-id")]
    pub os_template_id: String,

    /// Network name fragment; one line is printed per match.
    #[arg(short = 'n', long = "network-name")]
    pub network_name: String,

    /// Service offering name fragment; the first match is used.
    #[arg(short = 'o', long = "service-offering")]
    pub service_offering: String,

    /// Disk offering id.
    #[arg(short = 'd', long = "disk-offering-id")]
    pub disk_offering_id: Option<String>,

    /// Disk size, for custom-size disk offerings.
    #[arg(short = 's', long = "disk-offering-size")]
    pub disk_offering_size: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateUserdataArgs {
    /// Machine display name (or any other machine search term).
    #[arg(short = 'm', long = "machine-name")]
    pub machine_name: String,

    /// File whose contents become the user data.
    #[arg(short = 'f', long = "user-data-file")]
    pub user_data_file: PathBuf,

    /// Only update the machine with this id.
    #[arg(short = 'i', long = "machine-id")]
    pub machine_id: Option<String>,

    /// Print what would be updated without calling the API.
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CallArgs {
    /// Operation name, e.g. listZones.
    pub operation: String,

    /// Parameters as key=value.
    #[arg(value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Treat the operation as asynchronous and wait for its job.
    #[arg(long = "async")]
    pub is_async: bool,

    /// With --async, return the job id instead of waiting.
    #[arg(long)]
    pub no_wait: bool,
}
