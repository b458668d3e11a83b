use std::net::TcpListener;

use anyhow::Context;
use env_logger::Env;
use permits::{
    configuration::get_configuration,
    services::{ParcelEnricher, PermitCrawler},
    startup::run,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;

    let enricher = ParcelEnricher::new(&configuration.parcel_api)
        .context("Failed to build parcel api client.")?;
    let crawler = PermitCrawler::new(configuration.portal.clone(), enricher);

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
    log::info!("Listening on {}", address);

    run(listener, crawler, configuration.application.clone())?.await?;

    Ok(())
}
