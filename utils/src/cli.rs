use clap::{ArgAction, Args};

/// CLI flags shared by every binary in this workspace, flattened into the
/// binary's own `clap::Parser` struct the way `ServerConfig` flattens
/// `CommandLineConfig` upstream.
#[derive(Args, Debug, Clone)]
pub struct CommandLineConfig {
    ///  Log level
    #[arg(long, default_value_t = String::from("info"))]
    pub log_level: String,

    /// Allows enabling tracing output
    #[arg(long, default_value_t = false, action=ArgAction::SetTrue)]
    pub enable_tracing: bool,

    ///  CPU threadpool size used for parallel chunk prefetch
    ///  Defaults to 4
    #[arg(long, default_value_t = 4)]
    pub threadpool_size: usize,
}

impl Default for CommandLineConfig {
    fn default() -> Self {
        Self {
            log_level: String::from("info"),
            enable_tracing: false,
            threadpool_size: 4,
        }
    }
}
