//! PostScriptum binary.
//!
//! Kept small: parse arguments, open the credential store, run the login
//! prompt, then hand over to the node. Everything else lives in the library.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use crossterm::style::Stylize;

use postscriptum::auth::CredentialStore;
use postscriptum::config::{Cli, NodeConfig};
use postscriptum::console::{self, ConsoleSink, HELP};
use postscriptum::node::Node;
use postscriptum::session::{Active, Authenticating};
use postscriptum::store::PoloUserStore;
use postscriptum::utils::Terminal;

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    println!("{}", "Welcome to the PostScriptum P2P Messenger!".green());
    let Some(config) = cli.into_config() else {
        Cli::command().print_help()?;
        return Ok(());
    };
    init_tracing();

    let users = PoloUserStore::open(&config.db_path)
        .with_context(|| format!("cannot open {}", config.db_path.display()))?;
    let auth = Authenticating::new(CredentialStore::new(Arc::new(users)));
    let Some(user) = console::authenticate(auth, &mut Terminal, &mut io::stdout())? else {
        return Ok(());
    };

    let runtime = tokio::runtime::Runtime::new().context("cannot start async runtime")?;
    let result = runtime.block_on(chat(config, user));
    // Pending peer deliveries are abandoned on exit.
    runtime.shutdown_background();
    result
}

async fn chat(config: NodeConfig, user: Active) -> Result<()> {
    let node = Node::start(&config, user, Arc::new(ConsoleSink))
        .await
        .context("cannot start listener")?;
    println!("{}", format!("Listening on port {}", config.port).green());
    for &line in HELP {
        println!("{}", line.cyan());
    }
    node.run_interactive().await?;
    Ok(())
}
