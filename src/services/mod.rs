pub mod applications;
pub mod feed;
pub mod init;
pub mod jobs;
pub mod messages;
