use std::net::SocketAddr;

use clap::Parser;

use crate::query::DEFAULT_PER_PAGE;

#[derive(Debug, Clone, Parser)]
#[command(name = "tasktrack", about = "Browse and manage tasks held by a remote task service")]
pub struct Config {
    /// Task resource on the remote service.
    #[arg(long, env = "TASKTRACK_API_URL", default_value = "http://localhost:3001/tasks")]
    pub api_url: String,

    /// Address the page is served on.
    #[arg(long, env = "TASKTRACK_LISTEN", default_value = "0.0.0.0:5876")]
    pub listen: SocketAddr,

    /// Tasks shown per page.
    #[arg(long, env = "TASKTRACK_PER_PAGE", default_value_t = DEFAULT_PER_PAGE, value_parser = parse_per_page)]
    pub per_page: usize,

    /// Seconds before a call to the task service is abandoned.
    #[arg(long, env = "TASKTRACK_TIMEOUT", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, env = "TASKTRACK_LOG", default_value = "info")]
    pub log_level: String,
}

fn parse_per_page(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(err) => Err(err.to_string()),
    }
}
