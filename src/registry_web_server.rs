use crate::core::config::BootstrapAdminConfig;
use crate::core::AppConfig;
use crate::db::RemoteUserDirectory;
use crate::routes::registry_routes;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{dev::Server, web::Data, App, HttpServer};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub struct RegistryWebServer {
    port: u16,
    server: Server,
}

impl RegistryWebServer {
    pub async fn build(configuration: AppConfig) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.registry_server_config.host, configuration.registry_server_config.port
        );

        let directory = RemoteUserDirectory::service(&configuration.supabase)
            .map_err(|e| anyhow::anyhow!(e.message()))?;

        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let server = run(listener, directory, configuration.bootstrap_admin)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    directory: RemoteUserDirectory,
    bootstrap_admin: BootstrapAdminConfig,
) -> Result<Server, anyhow::Error> {
    let directory = Data::new(directory);
    let bootstrap_admin = Data::new(bootstrap_admin);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::HeaderName::from_static("x-client-info"),
                header::HeaderName::from_static("apikey"),
            ]);
        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .configure(registry_routes)
            .app_data(directory.clone())
            .app_data(bootstrap_admin.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
