pub mod dbserver;
pub mod operation;
pub mod profile;
pub mod wait;
