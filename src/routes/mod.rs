pub mod auth;
pub mod contacts;
pub mod health;
pub mod users;

use actix_web::web;

/// Mounts the `/api` routes. `/birthdays` is registered before `/{contact_id}` so the
/// literal segment wins.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::signup)
            .service(auth::login)
            .service(auth::refresh_token)
            .service(auth::confirmed_email)
            .service(auth::request_email),
    )
    .service(
        web::scope("/contacts")
            .service(contacts::get_contacts)
            .service(contacts::get_birthdays)
            .service(contacts::get_contact)
            .service(contacts::create_contact)
            .service(contacts::update_contact)
            .service(contacts::remove_contact),
    )
    .service(
        web::scope("/users")
            .service(users::read_users_me)
            .service(users::update_avatar_user),
    );
}
