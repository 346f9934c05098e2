//! # Pages Module
//!
//! Minimal server-rendered HTML: home, sign-in, the sign-in error page and
//! the admin pages. Admin pages run the render guard and redirect instead of
//! rendering; the data behind them is still protected by the API handlers.

pub mod handlers;
pub mod layout;
pub mod routes;


pub use routes::pages_routes;
