pub mod destination;
pub mod journal;
pub mod trip;
pub mod user;
