pub mod browse;
pub mod dashboard;
pub mod detect;
pub mod export;
pub mod history;
pub mod remove;
pub mod scan;
pub mod summary;
pub mod tui;
