use chrono::{DateTime, Datelike, NaiveDate, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

pub const DEFAULT_LIMIT: i64 = 10;
/// Birthdays this many days ahead (inclusive) count as upcoming.
pub const BIRTHDAY_WINDOW_DAYS: i64 = 7;

lazy_static! {
    static ref PHONE_REGEX: regex::Regex = regex::Regex::new(r"^\+?[0-9][0-9 ()-]{5,20}$").unwrap();
}

fn validate_not_in_future(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date > Utc::now().date_naive() {
        return Err(ValidationError::new("date_of_birth_in_future"));
    }
    Ok(())
}

/// Input structure for creating or replacing a contact.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ContactInput {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(email, length(max = 250))]
    pub email: String,
    #[validate(regex(path = "PHONE_REGEX", message = "Phone must contain 6 to 21 digits"))]
    pub phone: String,
    #[validate(custom = "validate_not_in_future")]
    pub date_of_birth: NaiveDate,
}

/// A contact as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Contact {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    /// Owner of the contact.
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing and searching contacts.
///
/// When any of `first_name`, `last_name` or `email` is present, contacts matching at least one
/// of them are returned.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct ContactQuery {
    #[validate(range(min = 0))]
    pub skip: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// Paging parameters for the birthdays listing.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 0))]
    pub skip: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl ContactQuery {
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Search columns paired with their value. Blank values count as absent.
    pub fn filters(&self) -> [(&'static str, Option<&str>); 3] {
        [
            ("first_name", non_blank(&self.first_name)),
            ("last_name", non_blank(&self.last_name)),
            ("email", non_blank(&self.email)),
        ]
    }

    pub fn has_filters(&self) -> bool {
        self.filters().iter().any(|(_, value)| value.is_some())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl PageQuery {
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

/// The date on which `date_of_birth` is celebrated in `year`.
/// Feb 29 birthdays fall on Feb 28 in common years.
fn birthday_in_year(date_of_birth: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, date_of_birth.month(), date_of_birth.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
}

impl Contact {
    /// Number of days from `today` until the next birthday, `0` when it is today.
    pub fn days_until_birthday(&self, today: NaiveDate) -> Option<i64> {
        let this_year = birthday_in_year(self.date_of_birth, today.year())?;
        let next = if this_year < today {
            birthday_in_year(self.date_of_birth, today.year() + 1)?
        } else {
            this_year
        };
        Some((next - today).num_days())
    }

    pub fn has_upcoming_birthday(&self, today: NaiveDate) -> bool {
        matches!(self.days_until_birthday(today), Some(days) if days <= BIRTHDAY_WINDOW_DAYS)
    }
}

/// Keeps the contacts with an upcoming birthday, then pages over what is left.
pub fn upcoming_birthdays(
    contacts: Vec<Contact>,
    today: NaiveDate,
    skip: i64,
    limit: i64,
) -> Vec<Contact> {
    contacts
        .into_iter()
        .filter(|contact| contact.has_upcoming_birthday(today))
        .skip(skip.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}
