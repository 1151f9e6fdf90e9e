//! Database models, one file per collection.

pub mod application;
pub mod job;
pub mod notification;
pub mod user;

pub use self::application::*;
pub use self::job::*;
pub use self::notification::*;
pub use self::user::*;
