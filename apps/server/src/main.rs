use anyhow::Context;
use warren::domain::config::ApiConfig;
use warren::kernel::config::load_config;
use warren_server::{Server, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional first argument: explicit config file, which must then exist.
    let path = std::env::args_os().nth(1);
    let cfg: ApiConfig =
        load_config(path.as_deref()).context("Critical: Configuration is malformed")?;

    let _log = init_logging(&cfg.logging)?;

    Server::builder().config(cfg).build()?.run().await
}
