pub mod auth;
pub mod club_info;
pub mod error;
pub mod files;
pub mod magazines;
pub mod members;
pub mod middleware;
pub mod portal;
pub mod posts;
