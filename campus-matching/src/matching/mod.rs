pub mod compatibility;
pub mod discovery;
pub mod pair;
pub mod profile;
pub mod protocol;
pub mod report;
pub mod requests;
