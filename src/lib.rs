//! TOTP（RFC 6238）による二要素認証サービス
//!
//! シークレットの発行、認証コードの検証、有効/無効の切り替えを提供する。

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod router;
pub mod services;
pub mod state;
pub mod totp;

pub use router::create_router;
