//! Client-side utilities for walking through Token-2022 extensions.
//!
//! Includes the wallet store, the recipe runner and the ledger clients it submits through,
//! one recipe per extension, and console logging/pretty-printing helpers.

pub mod config;
pub mod faucet;
pub mod ledger;
pub mod logs;
pub mod mollusk_helpers;
pub mod pretty;
pub mod recipe;
pub mod recipes;
pub mod space;
pub mod wallet;

pub use logs::LogColor;
