pub mod boundaries;
pub mod gateways;
pub mod interactors;
pub mod models;
pub mod utils;
