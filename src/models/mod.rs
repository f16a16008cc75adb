pub mod contributions;
pub mod github;
pub mod report;
