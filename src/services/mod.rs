pub mod email;
pub mod payments;
pub mod webhook;
