//! Server command implementation

use anyhow::Result;
use tally_core::Config;
use tally_server::ServerConfig;

use super::open_db;

pub async fn cmd_serve(config: Config) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;

    println!("🚀 Starting Tally web server...");
    println!("   Database: {}", config.database.path.display());
    println!("   Listening: http://{}:{}", host, port);
    match config.scheduler.interval_hours {
        Some(hours) => println!("   ⏰ Recurring runs: every {} hours", hours),
        None => println!("   ⏰ Recurring runs: on request (POST /api/recurring/process)"),
    }
    println!();

    let db = open_db(&config.database.path)?;
    let server_config = ServerConfig::from_config(&config);

    tally_server::serve_with_config(db, &host, port, server_config).await
}
