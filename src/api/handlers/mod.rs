//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod account;
pub mod health;
pub mod redirect;
pub mod shorten;
pub mod urls;

pub use account::{
    auth_check_handler, delete_account_handler, sign_in_handler, signup_complete_handler,
    signup_handler,
};
pub use health::health_handler;
pub use redirect::redirect_handler;
pub use shorten::{count_handler, shorten_handler};
pub use urls::{delete_url_handler, list_urls_handler};
