// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # WillVault Protocol Primitives
//!
//! The vocabulary every other WillVault crate speaks. Nothing in here knows
//! about guardians or thresholds; this crate only answers "who is calling"
//! and "what is being committed to".
//!
//! ## Modules
//!
//! - **config**: lengths, domain-separation contexts, default ports.
//! - **crypto**: Hashing, Ed25519 keys, and the 256-bit data commitment.
//! - **identity**: Addresses and signed calls. This is the authentication
//!   layer that turns a signature into a verified caller before anything
//!   reaches the vault.
//!
//! ## Design Philosophy
//!
//! 1. The vault core never verifies signatures. It receives an [`Address`]
//!    that somebody upstream already vouched for.
//! 2. Commitments, not documents. The encrypted material lives off-chain and
//!    only its hash travels through here.
//! 3. Every wire type serializes to hex strings, so JSON stays readable.
//!
//! [`Address`]: identity::Address

pub mod config;
pub mod crypto;
pub mod identity;
