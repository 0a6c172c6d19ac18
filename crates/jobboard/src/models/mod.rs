//! Data-access functions for the job board tables.

mod company;
mod job;

pub use company::Company;
pub use job::{Job, JobDetail, JobFilter, JobListing, JobUpdate, NewJob};
