pub mod automation;
pub mod campaigns;
pub mod customers;
pub mod deals;
pub mod feedback;
pub mod interactions;
pub mod loyalty;
pub mod notifier;
pub mod orders;
pub mod otp;
pub mod products;
pub mod quotes;
pub mod scoring;
pub mod tasks;
pub mod tickets;
