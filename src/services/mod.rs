pub mod contributions;
pub mod gemini;
pub mod github;
pub mod identity;
pub mod issues;
pub mod queries;
pub mod render;
