//! # Identity Module
//!
//! Who is calling. The stack is two layers deep:
//!
//! 1. **Address**: a 20-byte principal derived from an Ed25519 public key.
//!    This is the only identity type the vault core understands.
//! 2. **Signed calls**: an envelope binding a vault operation to a vault id
//!    and a signature. Authenticating it yields the caller's [`Address`].
//!
//! The vault never checks signatures itself; whoever hosts it runs
//! [`SignedCall::authenticate`] first and passes the resulting address in.

pub mod address;
pub mod auth;

pub use address::{Address, AddressError};
pub use auth::{AuthError, SignedCall, VaultCall};
