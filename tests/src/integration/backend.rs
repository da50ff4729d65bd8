//! # Backend Over HTTP
//!
//! The assembled backend with an in-memory store and a scripted node,
//! queried through its REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use shared_types::{
    encode_hex, to_cbor, Block, BlockBatch, NodeClient, NodeClientError, TransactionOrder,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use wallet_backend::container::BackendConfig;
use wallet_backend::WalletBackend;

use crate::fixtures::{block, pubkey, record, split, transfer, unit};

/// Serves a fixed chain and records submitted orders.
struct ScriptedNode {
    blocks: Vec<Block>,
    submitted: Mutex<Vec<TransactionOrder>>,
}

impl ScriptedNode {
    fn latest(&self) -> u64 {
        self.blocks.iter().map(|b| b.round_number).max().unwrap_or(0)
    }
}

#[async_trait]
impl NodeClient for ScriptedNode {
    async fn get_round_number(&self) -> Result<u64, NodeClientError> {
        Ok(self.latest())
    }

    async fn get_block(&self, round: u64) -> Result<Option<Block>, NodeClientError> {
        Ok(self.blocks.iter().find(|b| b.round_number == round).cloned())
    }

    async fn get_blocks(&self, from_round: u64, count: u64) -> Result<BlockBatch, NodeClientError> {
        let latest = self.latest();
        if from_round > latest {
            return Ok(BlockBatch {
                max_round_number: latest,
                blocks: vec![],
            });
        }
        let end = (from_round + count - 1).min(latest);
        Ok(BlockBatch {
            max_round_number: end,
            blocks: self
                .blocks
                .iter()
                .filter(|b| (from_round..=end).contains(&b.round_number))
                .cloned()
                .collect(),
        })
    }

    async fn submit_transaction(&self, order: &TransactionOrder) -> Result<(), NodeClientError> {
        self.submitted.lock().push(order.clone());
        Ok(())
    }
}

struct Running {
    base_url: String,
    http: reqwest::Client,
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<Result<(), String>>,
}

async fn start(node: Arc<ScriptedNode>, initial_value: u64) -> Running {
    let mut config = BackendConfig::default();
    config.storage.in_memory = true;
    config.sync.poll_interval = Duration::from_millis(10);
    config.chain.initial_bill_id = unit(1);
    config.chain.initial_bill_value = initial_value;
    config.chain.initial_bill_owner = pubkey(1).owner_predicate();
    config.validate().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let (shutdown, shutdown_rx) = watch::channel(false);
    let backend = WalletBackend::with_client(config, node);
    let task = tokio::spawn(async move {
        backend
            .run_on(listener, shutdown_rx)
            .await
            .map_err(|e| e.to_string())
    });

    Running {
        base_url,
        http: reqwest::Client::new(),
        shutdown,
        task,
    }
}

impl Running {
    async fn get(&self, path: &str) -> (u16, Value) {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn wait_for_round(&self, round: u64) {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let (_, body) = self.get("/api/v1/round-number").await;
                if body["roundNumber"].as_str() == Some(round.to_string().as_str()) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("backend did not index the chain in time");
    }

    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        self.task.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_indexed_payment_is_visible_over_rest() {
    let (x, y) = (pubkey(1), pubkey(2));
    let pay = record(unit(1), &split(&y, 30, 70));
    let node = Arc::new(ScriptedNode {
        blocks: vec![block(2, vec![pay]), block(5, vec![])],
        submitted: Mutex::new(vec![]),
    });
    let backend = start(Arc::clone(&node), 100).await;
    backend.wait_for_round(5).await;

    let (status, body) = backend
        .get(&format!("/api/v1/balance?pubkey={}", encode_hex(x.as_bytes())))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["balance"], "70");

    let (_, body) = backend
        .get(&format!("/api/v1/list-bills?pubkey={}", encode_hex(y.as_bytes())))
        .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["bills"][0]["value"], "30");

    let (_, body) = backend
        .get(&format!("/api/v1/tx-history/{}", encode_hex(y.as_bytes())))
        .await;
    assert_eq!(body[0]["kind"], "INCOMING");
    assert_eq!(body[0]["state"], "CONFIRMED");
    assert_eq!(body[0]["blockNumber"], "2");

    let (_, body) = backend.get("/api/v1/info").await;
    assert_eq!(body["name"], "money");

    backend.stop().await;
}

#[tokio::test]
async fn test_submitted_transfer_is_forwarded_and_pending() {
    let (x, y) = (pubkey(1), pubkey(2));
    let node = Arc::new(ScriptedNode {
        blocks: vec![],
        submitted: Mutex::new(vec![]),
    });
    let backend = start(Arc::clone(&node), 100).await;

    let order = record(unit(1), &transfer(&y, 100)).transaction_order;
    let response = backend
        .http
        .post(format!(
            "{}/api/v1/transactions/{}",
            backend.base_url,
            encode_hex(x.as_bytes())
        ))
        .header("content-type", "application/cbor")
        .body(to_cbor(&vec![order.clone()]).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 202);
    let failures: Value = response.json().await.unwrap();
    assert_eq!(failures, serde_json::json!({}));
    assert_eq!(node.submitted.lock().as_slice(), &[order]);

    let (_, body) = backend
        .get(&format!("/api/v1/tx-history/{}", encode_hex(x.as_bytes())))
        .await;
    assert_eq!(body[0]["kind"], "OUTGOING");
    assert_eq!(body[0]["state"], "UNCONFIRMED");

    backend.stop().await;
}

#[tokio::test]
async fn test_bad_requests_are_reported() {
    let node = Arc::new(ScriptedNode {
        blocks: vec![],
        submitted: Mutex::new(vec![]),
    });
    let backend = start(node, 0).await;

    let (status, body) = backend.get("/api/v1/list-bills?pubkey=0x00").await;
    assert_eq!(status, 400);
    assert_eq!(
        body["message"],
        "invalid pubkey length: expected 33 bytes, got 1"
    );

    let (status, _) = backend
        .get(&format!("/api/v1/units/{}", encode_hex(&unit(1))))
        .await;
    assert_eq!(status, 404);

    backend.stop().await;
}
