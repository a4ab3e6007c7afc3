use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::middleware::JwtMiddleware;
use crate::routes::{current_user, health_check, login, refresh, revoke};

pub fn run(listener: TcpListener, auth: AuthService) -> Result<Server, std::io::Error> {
    let auth = web::Data::new(auth);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(auth.clone())
            // Public routes
            .route("/api/healthz", web::get().to(health_check))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            // Protected routes (require an access token)
            .service(
                web::scope("/api/me")
                    .wrap(JwtMiddleware::new(auth.clone().into_inner()))
                    .route("", web::get().to(current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
