pub mod account;
pub mod destination;
pub mod health;
pub mod journal;
pub mod trip;
