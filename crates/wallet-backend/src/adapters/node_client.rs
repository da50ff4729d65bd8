//! # Node RPC Client
//!
//! `NodeClient` over the partition node's REST interface. Bodies are CBOR
//! in both directions.
//!
//! | Call | Request |
//! |---|---|
//! | latest round | `GET /api/v1/rounds/latest` |
//! | block | `GET /api/v1/rounds/{round}/block` (404 for an empty round) |
//! | submit | `POST /api/v1/transactions` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use shared_types::{
    from_cbor, to_cbor, Block, BlockBatch, NodeClient, NodeClientError, TransactionOrder,
};
use tracing::debug;

const CBOR_CONTENT_TYPE: &str = "application/cbor";

/// HTTP client for one partition node.
pub struct RpcNodeClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl RpcNodeClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, NodeClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeClientError::Unavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_cbor(&self, path: &str) -> Result<Option<Vec<u8>>, NodeClientError> {
        let response = self
            .http_client
            .get(self.url(path))
            .header(reqwest::header::ACCEPT, CBOR_CONTENT_TYPE)
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.bytes().await.map_err(unavailable)?;
                Ok(Some(body.to_vec()))
            }
            status => Err(NodeClientError::Unavailable(format!(
                "GET {path} returned {status}"
            ))),
        }
    }
}

fn unavailable(err: reqwest::Error) -> NodeClientError {
    NodeClientError::Unavailable(err.to_string())
}

fn invalid_response(err: impl std::fmt::Display) -> NodeClientError {
    NodeClientError::InvalidResponse(err.to_string())
}

#[async_trait]
impl NodeClient for RpcNodeClient {
    async fn get_round_number(&self) -> Result<u64, NodeClientError> {
        let body = self
            .get_cbor("/api/v1/rounds/latest")
            .await?
            .ok_or_else(|| NodeClientError::InvalidResponse("latest round not found".into()))?;
        from_cbor(&body).map_err(invalid_response)
    }

    async fn get_block(&self, round: u64) -> Result<Option<Block>, NodeClientError> {
        let Some(body) = self.get_cbor(&format!("/api/v1/rounds/{round}/block")).await? else {
            return Ok(None);
        };
        let block: Block = from_cbor(&body).map_err(invalid_response)?;
        if block.round_number != round {
            return Err(NodeClientError::InvalidResponse(format!(
                "asked for round {round}, got block of round {}",
                block.round_number
            )));
        }
        Ok(Some(block))
    }

    /// Fetches rounds `from_round ..= min(from_round + count - 1, latest)`
    /// one by one. When the node is behind `from_round` the batch is empty and
    /// `max_round_number` is the node's latest round.
    async fn get_blocks(&self, from_round: u64, count: u64) -> Result<BlockBatch, NodeClientError> {
        let latest = self.get_round_number().await?;
        if from_round > latest {
            return Ok(BlockBatch {
                max_round_number: latest,
                blocks: Vec::new(),
            });
        }

        let end = from_round
            .saturating_add(count.max(1) - 1)
            .min(latest);
        let mut blocks = Vec::new();
        for round in from_round..=end {
            if let Some(block) = self.get_block(round).await? {
                blocks.push(block);
            }
        }
        debug!(
            "[wallet-backend] Fetched rounds {}..={} ({} blocks)",
            from_round,
            end,
            blocks.len()
        );
        Ok(BlockBatch {
            max_round_number: end,
            blocks,
        })
    }

    async fn submit_transaction(&self, order: &TransactionOrder) -> Result<(), NodeClientError> {
        let body = to_cbor(order).map_err(invalid_response)?;
        let response = self
            .http_client
            .post(self.url("/api/v1/transactions"))
            .header(reqwest::header::CONTENT_TYPE, CBOR_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let reason = response.text().await.unwrap_or_default();
        let reason = if reason.is_empty() {
            status.to_string()
        } else {
            reason
        };
        if status.is_client_error() {
            Err(NodeClientError::Rejected(reason))
        } else {
            Err(NodeClientError::Unavailable(reason))
        }
    }
}
