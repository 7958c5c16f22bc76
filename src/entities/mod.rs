pub mod automation_workflow;
pub mod communication_preference;
pub mod customer;
pub mod customer_analytics;
pub mod customer_feedback;
pub mod customer_rfm;
pub mod deal;
pub mod interaction;
pub mod loyalty_account;
pub mod loyalty_transaction;
pub mod marketing_campaign;
pub mod order;
pub mod order_item;
pub mod otp_code;
pub mod product;
pub mod quote;
pub mod support_ticket;
pub mod task;
