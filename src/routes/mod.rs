use actix_web::web::{scope, ServiceConfig};
use actix_web::Scope;
use bootstrap::create_admin;

mod bootstrap;
mod health_check;

use crate::routes::health_check::*;

fn bootstrap_routes() -> Scope {
    scope("bootstrap").service(create_admin)
}

fn util_routes() -> Scope {
    scope("").service(health_check)
}

pub fn registry_routes(conf: &mut ServiceConfig) {
    conf.service(
        scope("api/v1")
            .service(bootstrap_routes())
            .service(util_routes()),
    );
}
