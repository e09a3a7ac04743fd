pub mod attachment;
pub mod comment;
pub mod month;
pub mod request;
