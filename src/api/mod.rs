use actix_web::web;
mod handlers;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(handlers::list_networks)
            .service(handlers::check_address)
            .service(handlers::open_session)
            .service(handlers::get_session)
            .service(handlers::close_session)
            .service(handlers::switch_network)
            .service(handlers::update_wallet)
            .service(handlers::set_address)
            .service(handlers::search)
            .service(handlers::copy_address)
    );
}
