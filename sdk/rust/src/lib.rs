//! Typed Rust client for the Klunkaz API.

mod client;

pub use client::{
    ApiFailure, CreateUserRequest, Envelope, ExecuteActionRequest, KlunkazClient,
    RecordTransactionRequest, VerifyRequest,
};
