pub mod history;
pub mod metrics;
pub mod persona;
pub mod report;
