pub mod balance;
pub mod payouts;
pub mod positions;
pub mod reveal;
pub mod statistics;
pub mod statistics_poller;
pub mod wagers;
