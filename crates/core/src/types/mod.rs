//! Core types for the Karthik store.
//!
//! This module provides type-safe wrappers and records for the storefront domain.

pub mod cart;
pub mod demo;
pub mod email;
pub mod id;
pub mod money;
pub mod product;
pub mod session;
pub mod status;
pub mod user;
pub mod wire;

pub use cart::{Cart, CartError, CartItem};
pub use demo::{DemoRequest, DemoRequestError, NewDemoRequest};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CurrencyConverter, format_inr, format_usd};
pub use product::{MAX_PRICE, NewProduct, Product, ProductError, ProductUpdate, default_catalog};
pub use session::{AdminSession, SESSION_TTL, SessionRecord, UserSession};
pub use status::*;
pub use user::{AccountInputError, MIN_PASSWORD_LENGTH, ProfileUpdate, Registration, UserProfile};
pub use wire::{
    AccountReply, AdminCredentials, AdminLoginReply, DemoRequestReply, ErrorBody, MessageBody,
    ProfileUpdateRequest, UserAction, UserCredentials,
};
