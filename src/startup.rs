use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    configuration::ApplicationSettings,
    routes::{default_route, permit_route},
    services::{PermitCrawler, ReportCache},
};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(default_route::default)
        .service(permit_route::permits)
        .service(permit_route::export);
}

pub fn run(
    listener: TcpListener,
    crawler: PermitCrawler,
    application: ApplicationSettings,
) -> Result<Server, std::io::Error> {
    let crawler = web::Data::new(crawler);
    let application = web::Data::new(application);
    let report_cache = web::Data::new(ReportCache::default());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(configure_routes)
            .app_data(crawler.clone())
            .app_data(application.clone())
            .app_data(report_cache.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
