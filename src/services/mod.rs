//! Background services

pub mod jobs;
