use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::contact::upcoming_birthdays;
use crate::models::{Contact, ContactInput, ContactQuery};

const CONTACT_COLUMNS: &str =
    "id, first_name, last_name, email, phone, date_of_birth, user_id, created_at, updated_at";

/// Builds the search statement for [`get_contacts`].
///
/// `$1` is always the owner id. Name/email filters follow in the order first name, last name,
/// email, and are OR-ed together. The last two parameters are the offset and the limit.
fn search_sql(query: &ContactQuery) -> String {
    let mut sql = format!("SELECT {} FROM contacts WHERE user_id = $1", CONTACT_COLUMNS);
    let mut param_count = 2;
    let mut conditions: Vec<String> = Vec::new();

    for (column, value) in query.filters() {
        if value.is_some() {
            conditions.push(format!("{} = ${}", column, param_count));
            param_count += 1;
        }
    }

    if !conditions.is_empty() {
        sql.push_str(" AND (");
        sql.push_str(&conditions.join(" OR "));
        sql.push(')');
    }

    sql.push_str(&format!(
        " ORDER BY id OFFSET ${} LIMIT ${}",
        param_count,
        param_count + 1
    ));
    sql
}

/// Lists the owner's contacts, optionally narrowed by name or email.
pub async fn get_contacts(
    pool: &PgPool,
    query: &ContactQuery,
    user_id: i32,
) -> Result<Vec<Contact>, AppError> {
    let sql = search_sql(query);
    let mut query_builder = sqlx::query_as::<_, Contact>(&sql).bind(user_id);

    for value in query.filters().into_iter().filter_map(|(_, value)| value) {
        query_builder = query_builder.bind(value);
    }

    let contacts = query_builder
        .bind(query.skip())
        .bind(query.limit())
        .fetch_all(pool)
        .await?;

    Ok(contacts)
}

/// Lists the owner's contacts whose birthday falls within the next week of `today`.
///
/// The window check runs over all of the owner's contacts; `skip` and `limit` page the
/// matching ones.
pub async fn get_contacts_birthdays(
    pool: &PgPool,
    skip: i64,
    limit: i64,
    user_id: i32,
    today: NaiveDate,
) -> Result<Vec<Contact>, AppError> {
    let contacts = sqlx::query_as::<_, Contact>(&format!(
        "SELECT {} FROM contacts WHERE user_id = $1 ORDER BY id",
        CONTACT_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(upcoming_birthdays(contacts, today, skip, limit))
}

pub async fn get_contact_by_id(
    pool: &PgPool,
    contact_id: i32,
    user_id: i32,
) -> Result<Option<Contact>, AppError> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        "SELECT {} FROM contacts WHERE id = $1 AND user_id = $2",
        CONTACT_COLUMNS
    ))
    .bind(contact_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}

pub async fn create_contact(
    pool: &PgPool,
    input: &ContactInput,
    user_id: i32,
) -> Result<Contact, AppError> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        "INSERT INTO contacts (first_name, last_name, email, phone, date_of_birth, user_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {}",
        CONTACT_COLUMNS
    ))
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(input.date_of_birth)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(contact)
}

/// Replaces every editable field of a contact. `None` when the owner has no such contact.
pub async fn update_contact(
    pool: &PgPool,
    contact_id: i32,
    input: &ContactInput,
    user_id: i32,
) -> Result<Option<Contact>, AppError> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        "UPDATE contacts
         SET first_name = $1, last_name = $2, email = $3, phone = $4, date_of_birth = $5,
             updated_at = NOW()
         WHERE id = $6 AND user_id = $7
         RETURNING {}",
        CONTACT_COLUMNS
    ))
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(input.date_of_birth)
    .bind(contact_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}

/// Deletes a contact and returns it. `None` when the owner has no such contact.
pub async fn remove_contact(
    pool: &PgPool,
    contact_id: i32,
    user_id: i32,
) -> Result<Option<Contact>, AppError> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        "DELETE FROM contacts WHERE id = $1 AND user_id = $2 RETURNING {}",
        CONTACT_COLUMNS
    ))
    .bind(contact_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}
