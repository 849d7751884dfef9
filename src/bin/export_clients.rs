//! Maintenance binary writing the full active-client CSV export to stdout.

use std::io::Write;

use dotenvy::dotenv;

use tributa_crm::db::{establish_connection_pool, run_migrations};
use tributa_crm::models::config::ServerConfig;
use tributa_crm::repository::client::DieselClientRepository;
use tributa_crm::services::client::export_csv;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let config = ServerConfig::load()?;

    let pool = establish_connection_pool(&config.database_url)?;
    run_migrations(&pool)?;

    let repo = DieselClientRepository::new(&pool);
    let csv = export_csv(&repo)?;

    std::io::stdout().write_all(csv.as_bytes())?;
    log::info!("export written to stdout");

    Ok(())
}
