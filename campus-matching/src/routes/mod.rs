pub mod blocks;
pub mod discover;
pub mod health;
pub mod likes;
pub mod matches;
pub mod profiles;
pub mod reports;
pub mod requests;
