//! Data access for contacts and users. Every function takes the shared `PgPool` and maps
//! driver failures into `AppError` through `?`.

pub mod contacts;
pub mod users;
