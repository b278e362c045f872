use crate::{
    error::AppError,
    models::{ContactInput, ContactQuery, PageQuery},
    repository::contacts as repository_contacts,
    services::auth::CurrentUser,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use sqlx::PgPool;
use validator::Validate;

fn contact_not_found() -> AppError {
    AppError::NotFound("Contact with requested id not found".into())
}

fn duplicate_contact(error: AppError) -> AppError {
    match error {
        AppError::Conflict(_) => {
            AppError::Conflict("Contact with this email or phone already exists".into())
        }
        other => other,
    }
}

/// Lists the authenticated user's contacts.
///
/// ## Query Parameters:
/// - `skip` (optional, default 0) and `limit` (optional, default 10, max 100).
/// - `first_name`, `last_name`, `email` (optional): exact-match filters. When several are
///   given, a contact matching any of them is returned.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Contact`.
/// - `404 Not Found`: Nothing matched.
/// - `422 Unprocessable Entity`: Paging parameters out of range.
#[get("")]
pub async fn get_contacts(
    pool: web::Data<PgPool>,
    query: web::Query<ContactQuery>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    query.validate()?;
    log::debug!(
        "listing contacts for user {} (filtered: {})",
        user.0.id,
        query.has_filters()
    );

    let contacts = repository_contacts::get_contacts(&pool, &query, user.0.id).await?;
    if contacts.is_empty() {
        return Err(AppError::NotFound(
            "Contacts with requested parameters not found".into(),
        ));
    }

    Ok(HttpResponse::Ok().json(contacts))
}

/// Lists contacts whose birthday is today or within the next 7 days.
#[get("/birthdays")]
pub async fn get_birthdays(
    pool: web::Data<PgPool>,
    query: web::Query<PageQuery>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    query.validate()?;

    let today = Utc::now().date_naive();
    let contacts = repository_contacts::get_contacts_birthdays(
        &pool,
        query.skip(),
        query.limit(),
        user.0.id,
        today,
    )
    .await?;

    if contacts.is_empty() {
        return Err(AppError::NotFound(
            "Contacts with birthdays for the next 7 days not found".into(),
        ));
    }

    Ok(HttpResponse::Ok().json(contacts))
}

#[get("/{contact_id}")]
pub async fn get_contact(
    pool: web::Data<PgPool>,
    contact_id: web::Path<i32>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let contact = repository_contacts::get_contact_by_id(&pool, contact_id.into_inner(), user.0.id)
        .await?
        .ok_or_else(contact_not_found)?;

    Ok(HttpResponse::Ok().json(contact))
}

/// Creates a contact owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: The new `Contact`.
/// - `409 Conflict`: The user already has a contact with this email or phone.
/// - `422 Unprocessable Entity`: Input validation failed.
#[post("")]
pub async fn create_contact(
    pool: web::Data<PgPool>,
    body: web::Json<ContactInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let contact = repository_contacts::create_contact(&pool, &body, user.0.id)
        .await
        .map_err(duplicate_contact)?;
    log::info!("user {} created contact {}", user.0.id, contact.id);

    Ok(HttpResponse::Created().json(contact))
}

#[put("/{contact_id}")]
pub async fn update_contact(
    pool: web::Data<PgPool>,
    contact_id: web::Path<i32>,
    body: web::Json<ContactInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let contact =
        repository_contacts::update_contact(&pool, contact_id.into_inner(), &body, user.0.id)
            .await
            .map_err(duplicate_contact)?
            .ok_or_else(contact_not_found)?;

    Ok(HttpResponse::Ok().json(contact))
}

#[delete("/{contact_id}")]
pub async fn remove_contact(
    pool: web::Data<PgPool>,
    contact_id: web::Path<i32>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let contact = repository_contacts::remove_contact(&pool, contact_id.into_inner(), user.0.id)
        .await?
        .ok_or_else(contact_not_found)?;
    log::info!("user {} removed contact {}", user.0.id, contact.id);

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_contact_rewrites_only_conflicts() {
        match duplicate_contact(AppError::Conflict("Record already exists".into())) {
            AppError::Conflict(msg) => {
                assert_eq!(msg, "Contact with this email or phone already exists")
            }
            other => panic!("unexpected: {:?}", other),
        }

        assert!(matches!(
            duplicate_contact(AppError::DatabaseError("boom".into())),
            AppError::DatabaseError(_)
        ));
    }
}
