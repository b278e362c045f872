pub mod contact;
pub mod user;

pub use contact::{Contact, ContactInput, ContactQuery, PageQuery};
pub use user::{AvatarInput, SignupResponse, User, UserInput, UserResponse};
