//! # Shared Types Crate
//!
//! Domain entities, wire types and encoding helpers shared by every
//! wallet-backend crate.
//!
//! ## Contents
//!
//! - **Entities**: `Bill`, `FeeCreditBill`, `SystemDescriptionRecord`, `TxHistoryRecord`
//! - **Wire types**: `Block`, `TransactionRecord`, `TransactionOrder`, `TxPayload`
//! - **Proofs**: `MerkleTree`, `TxProof`, `Proof`
//! - **Ports**: `NodeClient`

pub mod encoding;
pub mod entities;
pub mod errors;
pub mod node_client;
pub mod payloads;
pub mod predicates;
pub mod proof;
pub mod transaction;

pub use encoding::{decode_hex, decode_hex_fixed, encode_hex, from_cbor, sha256, to_cbor};
pub use entities::*;
pub use errors::*;
pub use node_client::{BlockBatch, NodeClient, NodeClientError};
pub use payloads::*;
pub use predicates::{p2pkh_predicate, PubKey};
pub use proof::{MerkleTree, Proof, ProofNode, SiblingPosition, TxProof};
pub use transaction::*;
