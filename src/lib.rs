pub mod cli;
pub mod config;
pub mod db;
pub mod drafts;
pub mod error;
pub mod models;
pub mod output;
pub mod planner;
pub mod social;
pub mod wizard;
