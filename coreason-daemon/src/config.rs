//! CLI/env configuration for the daemon (§4.9): small `clap`-derived struct, each field
//! falling back to an environment variable when the flag is omitted.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "coreason-daemon")]
#[command(about = "Federated query broker for a catalog of MCP data sources", long_about = None)]
#[command(version)]
pub struct Config {
    /// Address the HTTP shell binds to.
    #[arg(long, env = "CORBROKER_LISTEN_ADDR", default_value = "127.0.0.1:8088")]
    pub listen_addr: SocketAddr,

    /// Path to a local vector index snapshot file. If omitted, the index is in-memory only.
    #[arg(long, env = "CORBROKER_VECTOR_INDEX_PATH")]
    pub vector_index_path: Option<PathBuf>,

    /// Explicit path to the `opa` binary. If omitted, it is resolved from `PATH`.
    #[arg(long, env = "CORBROKER_OPA_PATH")]
    pub opa_path: Option<String>,

    /// Per-call timeout (seconds) for the policy oracle.
    #[arg(long, env = "CORBROKER_POLICY_TIMEOUT_SECS", default_value = "5")]
    pub policy_timeout_secs: u64,

    /// Connect+read timeout (seconds) for the dispatcher's transport.
    #[arg(long, env = "CORBROKER_DISPATCH_TIMEOUT_SECS", default_value = "30")]
    pub dispatch_timeout_secs: u64,

    /// Default result limit for `/v1/query` when the request omits one.
    #[arg(long, env = "CORBROKER_DEFAULT_LIMIT", default_value = "10")]
    pub default_limit: usize,

    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, env = "CORBROKER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
