// Demo mode: seed content and delayed canned replies.

pub mod demo_service;
pub mod seed_data;

pub use demo_service::DemoService;
pub use seed_data::{
    demo_articles, demo_reports, demo_snippets, DEMO_USER_EMAIL, DEMO_USER_ID, DEMO_USER_NAME,
};
