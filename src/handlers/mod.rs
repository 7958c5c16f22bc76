pub mod auth;
pub mod campaigns;
pub mod common;
pub mod customers;
pub mod deals;
pub mod feedback;
pub mod health;
pub mod interactions;
pub mod orders;
pub mod products;
pub mod quotes;
pub mod tasks;
pub mod tickets;
pub mod workflows;
