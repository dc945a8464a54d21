pub mod lifecycle;
pub mod messaging;
pub mod notifications;
pub mod session;
pub mod store;
pub mod validation;
