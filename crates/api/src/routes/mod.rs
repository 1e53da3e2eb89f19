mod misc;
mod payment;
mod webhook;

pub use misc::misc_routes;
pub use payment::payment_routes;
pub use webhook::webhook_routes;
