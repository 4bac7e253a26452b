//! Randomized primary sale of a fixed-supply collection.
//!
//! Ids are sold through a whitelist presale, paid direct mints drained in
//! batches and finally Dutch auctions. Every id is drawn from the active slot
//! with an oracle-provided random value and recorded on an external ledger.
#![cfg_attr(not(feature = "std"), no_std)]

mod allocation;
mod auction;
mod contract;
mod events;
mod external;
mod oracle;
mod phase;
mod premint;
mod state;
mod whitelist;
