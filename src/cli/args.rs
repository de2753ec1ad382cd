use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Workspace containing apidocs.toml and the collection (default: current directory)
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Path to custom config file (default: {workspace}/apidocs.toml)
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// Collection file to convert (default: collection.json)
    #[arg(long, value_name = "FILE", help_heading = "Artifact Paths")]
    pub collection: Option<PathBuf>,

    /// Destination of the OpenAPI YAML document (default: openapi.yml)
    #[arg(short, long, value_name = "FILE", help_heading = "Artifact Paths")]
    pub output: Option<PathBuf>,

    /// Tag applied to requests that are not inside a folder (default: General)
    #[arg(long, value_name = "TAG", help_heading = "Conversion")]
    pub default_tag: Option<String>,

    /// External converter invoked as `<CMD> <collection> -f <output>` (default: p2o)
    #[arg(
        long,
        value_name = "CMD",
        conflicts_with = "no_fallback",
        help_heading = "Subprocess Fallback"
    )]
    pub fallback_cmd: Option<String>,

    /// Kill the external converter after this many seconds; 0 disables the limit
    #[arg(long, value_name = "SECONDS", help_heading = "Subprocess Fallback")]
    pub fallback_timeout: Option<u64>,

    /// Never spawn the external converter
    #[arg(long, help_heading = "Subprocess Fallback")]
    pub no_fallback: bool,

    /// Print the run report as JSON on stdout
    #[arg(long, help_heading = "Output Options")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Workspace containing apidocs.toml and the OpenAPI document (default: current directory)
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Path to custom config file (default: {workspace}/apidocs.toml)
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// OpenAPI document to serve (default: the configured output path)
    #[arg(long, value_name = "FILE")]
    pub spec: Option<PathBuf>,

    /// Socket address to listen on (default: 127.0.0.1:3000)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Route serving Swagger UI (default: /api-docs)
    #[arg(long, value_name = "ROUTE")]
    pub docs_route: Option<String>,
}
