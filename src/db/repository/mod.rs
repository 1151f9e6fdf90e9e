pub mod application_repository;
pub mod job_repository;
pub mod notification_repository;
pub mod user;

pub use application_repository::ApplicationRepository;
pub use job_repository::JobRepository;
pub use notification_repository::SqliteNotificationStore;
pub use user::UserRepository;
