pub mod aggregation;
pub mod presence_service;
pub mod report;
