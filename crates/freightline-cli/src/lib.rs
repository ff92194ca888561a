//! Freightline CLI library.
//!
//! Argument parsing helpers and output rendering for the `freightline-cli`
//! binary. Pricing and geometry come from `freightline-lib`.

#![deny(warnings)]

pub mod input;
pub mod output;
