pub mod chat;
pub mod profile;
pub mod shortlist;
pub mod task;
pub mod university;
pub mod user;
