pub mod account;
pub mod contract;
pub mod error;
pub mod fund;
pub mod questionnaire;
