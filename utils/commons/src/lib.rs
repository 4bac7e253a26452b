//! Shared types for the Overture sale contracts: errors, roles, event tags,
//! token identifiers and the ownership ledger interface.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{authority::*, constants::*, errors::*, ledger::*, structs::*, types::*};
use concordium_std::*;

pub mod test;

mod authority;
mod constants;
mod errors;
mod ledger;
mod structs;
mod types;
