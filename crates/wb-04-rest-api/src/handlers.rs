//! # Request Handlers
//!
//! Each handler does one store read or one node call (submission also
//! files pending history entries).

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use shared_types::{
    decode_hex, decode_hex_fixed, encode_hex, from_cbor, Hash, NodeClient, PubKey, SystemId,
    TransactionOrder, TxHistoryKind, TxHistoryRecord, TxHistoryState, TxPayload, UnitId,
};
use tracing::{debug, warn};
use wb_01_bill_store::{BillStore, BillStoreRead, StoreError, MAX_PAGE_LIMIT};

use crate::domain::{
    BalanceResponse, BillView, FeeCreditBillView, InfoResponse, ListBillsResponse, ProofView,
    RestConfig, RestError, RoundNumberResponse, TxHistoryView, TxRecordView,
};

/// Shared handler state.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub client: Arc<dyn NodeClient>,
    pub config: Arc<RestConfig>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            client: Arc::clone(&self.client),
            config: Arc::clone(&self.config),
        }
    }
}

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBillsQuery {
    pubkey: Option<String>,
    limit: Option<String>,
    offset_key: Option<String>,
    /// Accepted as an alias of `offsetKey`.
    offset: Option<String>,
    include_dc_bills: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceQuery {
    pubkey: Option<String>,
    bill_id: Option<String>,
    include_dc_bills: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    limit: Option<String>,
    offset_key: Option<String>,
}

fn parse_pubkey(value: Option<&str>) -> Result<PubKey, RestError> {
    let value = value.ok_or_else(|| RestError::BadRequest("missing required parameter pubkey".into()))?;
    Ok(PubKey::from_hex(value)?)
}

fn parse_limit(value: Option<&str>, config: &RestConfig) -> Result<usize, RestError> {
    let Some(raw) = value else {
        return Ok(config.default_limit);
    };
    let limit: usize = raw
        .parse()
        .map_err(|_| RestError::BadRequest(format!("invalid limit: {raw}")))?;
    if limit == 0 {
        return Err(RestError::BadRequest("limit must be positive".into()));
    }
    Ok(limit.min(MAX_PAGE_LIMIT))
}

fn parse_bool(name: &str, value: Option<&str>, default: bool) -> Result<bool, RestError> {
    match value {
        None => Ok(default),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(RestError::BadRequest(format!("invalid {name}: {other}"))),
    }
}

fn parse_unit_id(name: &'static str, value: &str) -> Result<UnitId, RestError> {
    Ok(decode_hex_fixed::<32>(name, value)?)
}

fn not_found(what: &str, id: &[u8]) -> RestError {
    RestError::NotFound(format!("{what} {} not found", encode_hex(id)))
}

fn internal(err: impl std::fmt::Display) -> RestError {
    RestError::Internal(err.to_string())
}

/// `Link: <path?query>; rel="next"`
fn next_link(path: &str, params: &[(&str, String)]) -> Result<HeaderValue, RestError> {
    let query = params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    HeaderValue::from_str(&format!("<{path}?{query}>; rel=\"next\"")).map_err(internal)
}

// =============================================================================
// BILLS
// =============================================================================

/// `GET /api/v1/list-bills`
pub async fn list_bills<S: BillStore + 'static>(
    State(state): State<AppState<S>>,
    uri: Uri,
    Query(query): Query<ListBillsQuery>,
) -> Result<Response, RestError> {
    let pubkey = parse_pubkey(query.pubkey.as_deref())?;
    let limit = parse_limit(query.limit.as_deref(), &state.config)?;
    let include_dc = parse_bool("includeDcBills", query.include_dc_bills.as_deref(), true)?;
    let offset = query
        .offset_key
        .as_deref()
        .or(query.offset.as_deref())
        .map(|value| parse_unit_id("offsetKey", value))
        .transpose()?;

    let page = state
        .store
        .get_bills_filtered(&pubkey.owner_predicate(), offset.as_ref(), limit, include_dc)?;
    let bills: Vec<BillView> = page.bills.iter().map(BillView::from).collect();

    let mut response = Json(ListBillsResponse {
        total: bills.len(),
        bills,
    })
    .into_response();
    if let Some(next) = page.next_key {
        let link = next_link(
            uri.path(),
            &[
                ("pubkey", encode_hex(pubkey.as_bytes())),
                ("limit", limit.to_string()),
                ("includeDcBills", include_dc.to_string()),
                ("offsetKey", encode_hex(&next)),
            ],
        )?;
        response.headers_mut().insert(header::LINK, link);
    }
    Ok(response)
}

/// `GET /api/v1/balance`
pub async fn balance<S: BillStore + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, RestError> {
    if let Some(bill_id) = query.bill_id.as_deref() {
        let id = parse_unit_id("billId", bill_id)?;
        let bill = state.store.get_bill(&id)?.ok_or_else(|| not_found("bill", &id))?;
        return Ok(Json(BalanceResponse {
            balance: bill.value.to_string(),
        }));
    }

    let owner = parse_pubkey(query.pubkey.as_deref())?.owner_predicate();
    let include_dc = parse_bool("includeDcBills", query.include_dc_bills.as_deref(), false)?;

    let total = state.store.get_balance(&owner, include_dc)?;
    Ok(Json(BalanceResponse {
        balance: total.to_string(),
    }))
}

/// `GET /api/v1/units/:unit_id`
pub async fn get_unit<S: BillStore + 'static>(
    State(state): State<AppState<S>>,
    Path(unit_id): Path<String>,
) -> Result<Json<BillView>, RestError> {
    let id = parse_unit_id("unitId", &unit_id)?;
    let bill = state.store.get_bill(&id)?.ok_or_else(|| not_found("bill", &id))?;
    Ok(Json(BillView::from(&bill)))
}

/// `GET /api/v1/units/:unit_id/transactions/:tx_hash/proof`
pub async fn get_proof<S: BillStore + 'static>(
    State(state): State<AppState<S>>,
    Path((unit_id, tx_hash)): Path<(String, String)>,
) -> Result<Json<ProofView>, RestError> {
    let id = parse_unit_id("unitId", &unit_id)?;
    let tx_hash: Hash = decode_hex_fixed("txHash", &tx_hash)?;
    let proof = state
        .store
        .get_tx_proof(&id, &tx_hash)?
        .ok_or_else(|| not_found("proof for transaction", &tx_hash))?;
    Ok(Json(ProofView::from_proof(&proof).map_err(internal)?))
}

// =============================================================================
// FEE CREDIT
// =============================================================================

/// `GET /api/v1/fee-credit-bills/:unit_id`
pub async fn get_fee_credit_bill<S: BillStore + 'static>(
    State(state): State<AppState<S>>,
    Path(unit_id): Path<String>,
) -> Result<Json<FeeCreditBillView>, RestError> {
    let id = parse_unit_id("unitId", &unit_id)?;
    let fcb = state
        .store
        .get_fee_credit_bill(&id)?
        .ok_or_else(|| not_found("fee credit bill", &id))?;
    Ok(Json(FeeCreditBillView::from(&fcb)))
}

/// `GET /api/v1/locked-fee-credit/:system_id/:unit_id`
pub async fn get_locked_fee_credit<S: BillStore + 'static>(
    State(state): State<AppState<S>>,
    Path((system_id, unit_id)): Path<(String, String)>,
) -> Result<Json<TxRecordView>, RestError> {
    let system_id: SystemId = decode_hex_fixed("systemId", &system_id)?;
    let id = parse_unit_id("unitId", &unit_id)?;
    let record = state
        .store
        .get_locked_fee_credit(&system_id, &id)?
        .ok_or_else(|| not_found("locked fee credit for", &id))?;
    Ok(Json(TxRecordView::from_record(&record).map_err(internal)?))
}

/// `GET /api/v1/closed-fee-credit/:unit_id`
pub async fn get_closed_fee_credit<S: BillStore + 'static>(
    State(state): State<AppState<S>>,
    Path(unit_id): Path<String>,
) -> Result<Json<TxRecordView>, RestError> {
    let id = parse_unit_id("unitId", &unit_id)?;
    let record = state
        .store
        .get_closed_fee_credit(&id)?
        .ok_or_else(|| not_found("closed fee credit for", &id))?;
    Ok(Json(TxRecordView::from_record(&record).map_err(internal)?))
}

// =============================================================================
// CHAIN STATE
// =============================================================================

/// `GET /api/v1/round-number`
pub async fn round_number<S: BillStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<RoundNumberResponse>, RestError> {
    let round = state.store.get_block_number()?;
    Ok(Json(RoundNumberResponse {
        round_number: round.to_string(),
    }))
}

/// `GET /api/v1/info`
pub async fn info<S: BillStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<InfoResponse>, RestError> {
    let system_id = state.config.system_id;
    let name = state
        .store
        .get_system_description_records()?
        .into_iter()
        .find(|sdr| sdr.system_identifier == system_id)
        .map(|sdr| sdr.name)
        .unwrap_or_else(|| "money".to_string());
    Ok(Json(InfoResponse {
        system_id: encode_hex(&system_id),
        name,
    }))
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "wallet-backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// `GET /api/v1/tx-history/:pubkey`
pub async fn tx_history<S: BillStore + 'static>(
    State(state): State<AppState<S>>,
    uri: Uri,
    Path(pubkey): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, RestError> {
    let owner = PubKey::from_hex(&pubkey)?.owner_predicate();
    let limit = parse_limit(query.limit.as_deref(), &state.config)?;
    let offset = query
        .offset_key
        .as_deref()
        .map(|value| decode_hex("offsetKey", value))
        .transpose()?;

    let page = state
        .store
        .get_tx_history_records(&owner, offset.as_deref(), limit)?;
    let records: Vec<TxHistoryView> = page.records.iter().map(TxHistoryView::from).collect();

    let mut response = Json(records).into_response();
    if let Some(next) = page.next_key {
        let link = next_link(
            uri.path(),
            &[("limit", limit.to_string()), ("offsetKey", encode_hex(&next))],
        )?;
        response.headers_mut().insert(header::LINK, link);
    }
    Ok(response)
}

/// `POST /api/v1/transactions/:pubkey`
///
/// The body is a CBOR array of transaction orders. Orders are forwarded
/// one by one; the response maps the hash of every rejected order to the
/// reason and is `202 Accepted` even when some were rejected.
pub async fn submit_transactions<S: BillStore + 'static>(
    State(state): State<AppState<S>>,
    Path(pubkey): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<BTreeMap<String, String>>), RestError> {
    let sender = PubKey::from_hex(&pubkey)?.owner_predicate();
    let orders: Vec<TransactionOrder> = from_cbor(&body)?;
    if orders.is_empty() {
        return Err(RestError::BadRequest(
            "request body contains no transactions".into(),
        ));
    }

    // Failures are keyed by tx hash, so every order must hash before any is sent.
    let hashes = orders
        .iter()
        .map(TransactionOrder::hash)
        .collect::<Result<Vec<_>, _>>()?;

    let mut failures = BTreeMap::new();
    for (order, tx_hash) in orders.iter().zip(hashes) {
        let key = encode_hex(&tx_hash);

        if let Err(e) = state.client.submit_transaction(order).await {
            warn!("[wb-04] Node rejected transaction {}: {}", key, e);
            failures.insert(key, e.to_string());
            continue;
        }
        debug!("[wb-04] Forwarded {} transaction {}", order.payload_type(), key);

        if let Err(e) = record_pending(state.store.as_ref(), &sender, order, &tx_hash) {
            warn!("[wb-04] Could not file history for {}: {}", key, e);
        }
    }
    Ok((StatusCode::ACCEPTED, Json(failures)))
}

/// File unconfirmed history entries for a submitted transfer or split.
fn record_pending<S: BillStore>(
    store: &S,
    sender: &[u8],
    order: &TransactionOrder,
    tx_hash: &Hash,
) -> Result<(), StoreError> {
    let (amount, receiver) = match TxPayload::decode(order) {
        Ok(TxPayload::Transfer(attrs)) => (attrs.target_value, attrs.new_bearer),
        Ok(TxPayload::Split(attrs)) => (attrs.amount, attrs.target_bearer),
        _ => return Ok(()),
    };
    let unit_id = *order.unit_id();

    store.with_transaction(|tx| {
        // Already indexed; the confirmed entries stay
        if tx.get_tx_proof(&unit_id, tx_hash)?.is_some() {
            return Ok(());
        }
        let outgoing = pending_record(*tx_hash, unit_id, TxHistoryKind::Outgoing, amount, &receiver);
        let incoming = pending_record(*tx_hash, unit_id, TxHistoryKind::Incoming, amount, sender);
        tx.store_tx_history_record(sender, &outgoing)?;
        tx.store_tx_history_record(&receiver, &incoming)
    })
}

fn pending_record(
    tx_hash: Hash,
    unit_id: UnitId,
    kind: TxHistoryKind,
    amount: u64,
    counterparty: &[u8],
) -> TxHistoryRecord {
    TxHistoryRecord {
        tx_hash,
        unit_id,
        kind,
        state: TxHistoryState::Unconfirmed,
        amount,
        counterparty: counterparty.to_vec(),
        block_number: None,
    }
}
