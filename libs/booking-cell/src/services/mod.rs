pub mod booking;
pub mod identity;
pub mod lifecycle;
pub mod publisher;
