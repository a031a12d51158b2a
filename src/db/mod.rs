pub mod init;
pub mod movie;
pub mod rating;
