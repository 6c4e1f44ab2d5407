pub mod configuration;
pub mod logging;
pub mod routes;
pub mod state;
