//! # REST API (wb-04)
//!
//! The read side of the wallet backend plus transaction submission.
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | GET | `/api/v1/list-bills?pubkey=&limit=&offsetKey=&includeDcBills=` | `{total, bills}` + `Link` |
//! | GET | `/api/v1/balance?pubkey=&includeDcBills=` or `?billId=` | `{balance}` |
//! | GET | `/api/v1/units/:unitId` | bill |
//! | GET | `/api/v1/units/:unitId/transactions/:txHash/proof` | proof |
//! | GET | `/api/v1/fee-credit-bills/:unitId` | fee credit bill |
//! | GET | `/api/v1/locked-fee-credit/:systemId/:unitId` | transaction record |
//! | GET | `/api/v1/closed-fee-credit/:unitId` | transaction record |
//! | GET | `/api/v1/round-number` | `{roundNumber}` |
//! | GET | `/api/v1/info` | `{systemId, name}` |
//! | GET | `/api/v1/tx-history/:pubkey?limit=&offsetKey=` | history, newest first + `Link` |
//! | POST | `/api/v1/transactions/:pubkey` | 202 + `{txHash: reason}` for rejected orders |
//!
//! Errors are `{"message": "..."}` with 400, 404, 500 or 502.

pub mod domain;
pub mod handlers;
pub mod service;


pub use domain::{RestConfig, RestConfigError, RestError};
pub use handlers::AppState;
pub use service::RestService;
