pub mod dashboard_handlers;
pub mod general_handlers;
