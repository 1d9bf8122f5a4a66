//! Rust client for the Form3 accounts REST API.
//! Resolves request paths against a configurable base URL, wraps payloads in
//! the API's `{"data": ...}` envelope and turns non-2xx answers into
//! structured errors.

pub mod accounts;
pub mod client;
pub mod error;
pub mod models;

pub use accounts::{AccountService, ListOptions};
pub use client::{Client, decode_response};
pub use error::{ApiError, Form3Error};
pub use models::{
    Account, AccountAttributes, DataRequest, DataResponse, Links, NewAccount,
    NewAccountAttributes,
};
