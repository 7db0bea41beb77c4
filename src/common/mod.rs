pub mod response;
pub mod upload;
pub mod workspace;
