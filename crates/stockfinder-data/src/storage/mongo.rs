//! MongoDB 저장소.
//!
//! 컬렉션:
//! - `tickers`: 티커 레코드 (Fundamental 원본 포함)
//! - `collector_state`: 워크플로우 체크포인트 (`_id` = 워크플로우 이름)
//! - `counters`: `seq` 발급용 카운터

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::error::{ErrorKind, InsertManyError, WriteFailure};
use mongodb::options::{ClientOptions, Credential, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use stockfinder_core::config::{lookup_trimmed, parse_or, string_or, EnvLookup};
use stockfinder_core::{
    format_symbol, CheckpointStatus, CollectorCheckpoint, TickerDescriptor, TickerRecord,
};
use tracing::{debug, info};

use super::{CheckpointStore, TickerQuery, TickerStore, UpsertSummary};
use crate::{DataError, Result};

const TICKERS_COLLECTION: &str = "tickers";
const CHECKPOINTS_COLLECTION: &str = "collector_state";
const COUNTERS_COLLECTION: &str = "counters";
const TICKER_SEQ_COUNTER: &str = "ticker_seq";
const APP_NAME: &str = "stockfinder";

/// MongoDB 고유 인덱스 위반 코드
const DUPLICATE_KEY_CODE: i32 = 11000;

/// 문서 크기 초과 에러 코드 (BSONObjectTooLarge 등)
const DOCUMENT_TOO_LARGE_CODES: [i32; 3] = [10334, 17419, 17420];

/// MongoDB 연결 설정.
#[derive(Clone, PartialEq, Eq)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            host: "db".to_string(),
            port: 27017,
            username: None,
            password: None,
            database: "stockfinder".to_string(),
        }
    }
}

impl fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .finish()
    }
}

impl MongoConfig {
    /// 환경변수에서 설정 로드.
    ///
    /// - `MONGODB_HOST` (기본: db)
    /// - `MONGODB_PORT` (기본: 27017)
    /// - `MONGODB_USERNAME`, `MONGODB_PASSWORD` (둘 다 있을 때만 인증 사용)
    /// - `MONGODB_DATABASE` (기본: stockfinder)
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: string_or(lookup, "MONGODB_HOST", &defaults.host),
            port: parse_or(lookup, "MONGODB_PORT", defaults.port)?,
            username: lookup_trimmed(lookup, "MONGODB_USERNAME"),
            password: lookup_trimmed(lookup, "MONGODB_PASSWORD"),
            database: string_or(lookup, "MONGODB_DATABASE", &defaults.database),
        })
    }

    /// 자격 증명을 제외한 접속 URI
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }

    fn credential(&self) -> Option<Credential> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(
                Credential::builder()
                    .username(username.clone())
                    .password(password.clone())
                    .build(),
            ),
            _ => None,
        }
    }
}

/// `tickers` 컬렉션 문서
#[derive(Debug, Serialize, Deserialize)]
struct TickerDocument {
    code: String,
    exchange: String,
    name: Option<String>,
    country: Option<String>,
    currency: Option<String>,
    isin: Option<String>,
    ticker_type: Option<String>,
    seq: i64,
    fundamentals_fetched: bool,
    fetched_at: Option<bson::DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fundamentals: Option<Document>,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

impl From<TickerDocument> for TickerRecord {
    fn from(doc: TickerDocument) -> Self {
        Self {
            code: doc.code,
            exchange: doc.exchange,
            name: doc.name,
            country: doc.country,
            currency: doc.currency,
            isin: doc.isin,
            ticker_type: doc.ticker_type,
            seq: doc.seq,
            fundamentals_fetched: doc.fundamentals_fetched,
            fetched_at: doc.fetched_at.map(to_chrono),
            fundamentals: doc
                .fundamentals
                .map(|d| Bson::Document(d).into_relaxed_extjson()),
            created_at: to_chrono(doc.created_at),
            updated_at: to_chrono(doc.updated_at),
        }
    }
}

/// `collector_state` 컬렉션 문서
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointDocument {
    #[serde(rename = "_id")]
    workflow: String,
    status: CheckpointStatus,
    last_symbol: Option<String>,
    total_processed: i64,
    cooldown_until: Option<bson::DateTime>,
    updated_at: bson::DateTime,
}

impl From<&CollectorCheckpoint> for CheckpointDocument {
    fn from(cp: &CollectorCheckpoint) -> Self {
        Self {
            workflow: cp.workflow.clone(),
            status: cp.status,
            last_symbol: cp.last_symbol.clone(),
            total_processed: i64::try_from(cp.total_processed).unwrap_or(i64::MAX),
            cooldown_until: cp.cooldown_until.map(to_bson),
            updated_at: to_bson(cp.updated_at),
        }
    }
}

impl From<CheckpointDocument> for CollectorCheckpoint {
    fn from(doc: CheckpointDocument) -> Self {
        Self {
            workflow: doc.workflow,
            status: doc.status,
            last_symbol: doc.last_symbol,
            total_processed: u64::try_from(doc.total_processed).unwrap_or(0),
            cooldown_until: doc.cooldown_until.map(to_chrono),
            updated_at: to_chrono(doc.updated_at),
        }
    }
}

fn to_bson(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

fn to_chrono(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

/// Fundamental 원본을 BSON으로 변환.
///
/// `i64` 범위를 넘는 정수처럼 BSON으로 표현할 수 없는 값은 `PayloadRejected`.
fn encode_payload(symbol: &str, fundamentals: &serde_json::Value) -> Result<Bson> {
    bson::to_bson(fundamentals)
        .map_err(|e| DataError::PayloadRejected(format!("{}: {}", symbol, e)))
}

/// Fundamental 저장 실패 분류 (문서 크기 초과는 `PayloadRejected`)
fn mark_fetched_error(symbol: &str, err: mongodb::error::Error) -> DataError {
    let too_large = match err.kind.as_ref() {
        ErrorKind::InvalidArgument { .. } => true,
        ErrorKind::Write(WriteFailure::WriteError(e)) => is_too_large(e.code),
        ErrorKind::Command(e) => is_too_large(e.code),
        _ => false,
    };
    if too_large {
        DataError::PayloadRejected(format!("{}: {}", symbol, err))
    } else {
        DataError::from(err)
    }
}

fn is_too_large(code: i32) -> bool {
    DOCUMENT_TOO_LARGE_CODES.contains(&code)
}

/// 순서 없는 일괄 삽입에서 중복 키로 건너뛴 문서 수.
///
/// 중복 키 외의 에러가 하나라도 있으면 `None`.
fn duplicate_only(err: &InsertManyError) -> Option<usize> {
    if err.write_concern_error.is_some() {
        return None;
    }
    let write_errors = err.write_errors.as_ref()?;
    write_errors
        .iter()
        .all(|e| e.code == DUPLICATE_KEY_CODE)
        .then_some(write_errors.len())
}

fn fetched_filter(fetched: Option<bool>) -> Document {
    match fetched {
        Some(f) => doc! { "fundamentals_fetched": f },
        None => doc! {},
    }
}

/// MongoDB 티커/체크포인트 저장소.
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
    tickers: Collection<TickerDocument>,
    checkpoints: Collection<CheckpointDocument>,
    counters: Collection<Document>,
}

impl MongoStore {
    /// 연결, ping, 인덱스 생성까지 수행.
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(config.uri()).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.credential = config.credential();

        let client = Client::with_options(options)?;
        let store = Self::from_database(client.database(&config.database));

        store.ping().await?;
        store.ensure_indexes().await?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            authenticated = config.credential().is_some(),
            "MongoDB 연결 완료"
        );

        Ok(store)
    }

    /// 기존 데이터베이스 핸들로 생성 (인덱스는 생성하지 않음).
    pub fn from_database(db: Database) -> Self {
        Self {
            tickers: db.collection(TICKERS_COLLECTION),
            checkpoints: db.collection(CHECKPOINTS_COLLECTION),
            counters: db.collection(COUNTERS_COLLECTION),
            db,
        }
    }

    /// 인덱스 생성 (이미 있으면 무시됨).
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique_symbol = IndexModel::builder()
            .keys(doc! { "code": 1, "exchange": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("code_exchange_unique".to_string())
                    .build(),
            )
            .build();
        let unfetched_order = IndexModel::builder()
            .keys(doc! { "fundamentals_fetched": 1, "seq": 1 })
            .options(
                IndexOptions::builder()
                    .name("fetched_seq".to_string())
                    .build(),
            )
            .build();

        self.tickers
            .create_indexes([unique_symbol, unfetched_order])
            .await?;
        debug!("tickers 인덱스 확인 완료");
        Ok(())
    }

    /// `count`개의 연속된 `seq`를 예약하고 첫 번째 값을 반환.
    async fn reserve_seq(&self, count: usize) -> Result<i64> {
        let count = i64::try_from(count)
            .map_err(|_| DataError::InvalidData(format!("seq 예약 개수 초과: {}", count)))?;

        let counter = self
            .counters
            .find_one_and_update(
                doc! { "_id": TICKER_SEQ_COUNTER },
                doc! { "$inc": { "value": count } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| DataError::QueryError("seq 카운터 갱신 결과 없음".to_string()))?;

        let last = counter
            .get_i64("value")
            .map_err(|e| DataError::InvalidData(format!("seq 카운터 형식 오류: {}", e)))?;
        Ok(last - count + 1)
    }
}

#[async_trait]
impl TickerStore for MongoStore {
    async fn upsert_tickers(&self, descriptors: &[TickerDescriptor]) -> Result<UpsertSummary> {
        let mut summary = UpsertSummary::default();
        if descriptors.is_empty() {
            return Ok(summary);
        }

        // 기존 티커에 할당된 seq는 버려지지만 순서만 보장되면 충분
        let first_seq = self.reserve_seq(descriptors.len()).await?;
        let now = to_bson(Utc::now());

        let documents: Vec<TickerDocument> = descriptors
            .iter()
            .enumerate()
            .map(|(offset, d)| TickerDocument {
                code: d.code.clone(),
                exchange: d.exchange.clone(),
                name: d.name.clone(),
                country: d.country.clone(),
                currency: d.currency.clone(),
                isin: d.isin.clone(),
                ticker_type: d.ticker_type.clone(),
                seq: first_seq + offset as i64,
                fundamentals_fetched: false,
                fetched_at: None,
                fundamentals: None,
                created_at: now,
                updated_at: now,
            })
            .collect();
        let total = documents.len();

        // 순서 없는 일괄 삽입: 이미 있는 (code, exchange)는 고유 인덱스가 거부
        match self.tickers.insert_many(documents).ordered(false).await {
            Ok(result) => {
                summary.inserted = result.inserted_ids.len();
                summary.existing = total - summary.inserted;
            }
            Err(err) => {
                let duplicates = match err.kind.as_ref() {
                    ErrorKind::InsertMany(e) => duplicate_only(e),
                    _ => None,
                };
                let Some(duplicates) = duplicates else {
                    return Err(err.into());
                };
                summary.existing = duplicates;
                summary.inserted = total.saturating_sub(duplicates);
            }
        }

        debug!(
            inserted = summary.inserted,
            existing = summary.existing,
            "티커 upsert 완료"
        );
        Ok(summary)
    }

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.tickers.count_documents(doc! {}).limit(1).await? == 0)
    }

    async fn next_unfetched_batch(
        &self,
        limit: usize,
        after_seq: Option<i64>,
    ) -> Result<Vec<TickerRecord>> {
        let mut filter = doc! { "fundamentals_fetched": false };
        if let Some(after) = after_seq {
            filter.insert("seq", doc! { "$gt": after });
        }

        let cursor = self
            .tickers
            .find(filter)
            .sort(doc! { "seq": 1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .projection(doc! { "fundamentals": 0 })
            .await?;
        let docs: Vec<TickerDocument> = cursor.try_collect().await?;

        Ok(docs.into_iter().map(TickerRecord::from).collect())
    }

    async fn mark_fetched(
        &self,
        code: &str,
        exchange: &str,
        fundamentals: serde_json::Value,
    ) -> Result<bool> {
        let symbol = format_symbol(code, exchange);
        let payload = encode_payload(&symbol, &fundamentals)?;
        let now = to_bson(Utc::now());

        let result = self
            .tickers
            .update_one(
                doc! { "code": code, "exchange": exchange, "fundamentals_fetched": false },
                doc! {
                    "$set": {
                        "fundamentals": payload,
                        "fundamentals_fetched": true,
                        "fetched_at": now,
                        "updated_at": now,
                    }
                },
            )
            .await
            .map_err(|e| mark_fetched_error(&symbol, e))?;

        Ok(result.modified_count == 1)
    }

    async fn get_ticker(&self, code: &str, exchange: &str) -> Result<Option<TickerRecord>> {
        let found = self
            .tickers
            .find_one(doc! { "code": code, "exchange": exchange })
            .await?;
        Ok(found.map(TickerRecord::from))
    }

    async fn list_tickers(&self, query: &TickerQuery) -> Result<Vec<TickerRecord>> {
        let mut filter = fetched_filter(query.fetched);
        if let Some(country) = &query.country {
            filter.insert("country", country);
        }
        if let Some(exchange) = &query.exchange {
            filter.insert("exchange", exchange);
        }

        let cursor = self
            .tickers
            .find(filter)
            .sort(doc! { "seq": 1 })
            .skip(query.offset)
            .limit(i64::try_from(query.limit).unwrap_or(i64::MAX))
            .projection(doc! { "fundamentals": 0 })
            .await?;
        let docs: Vec<TickerDocument> = cursor.try_collect().await?;

        Ok(docs.into_iter().map(TickerRecord::from).collect())
    }

    async fn count_tickers(&self, fetched: Option<bool>) -> Result<u64> {
        Ok(self.tickers.count_documents(fetched_filter(fetched)).await?)
    }

    async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for MongoStore {
    async fn save_checkpoint(&self, checkpoint: &CollectorCheckpoint) -> Result<()> {
        let document = CheckpointDocument::from(checkpoint);
        self.checkpoints
            .replace_one(doc! { "_id": &checkpoint.workflow }, &document)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn load_checkpoint(&self, workflow: &str) -> Result<Option<CollectorCheckpoint>> {
        let found = self.checkpoints.find_one(doc! { "_id": workflow }).await?;
        Ok(found.map(CollectorCheckpoint::from))
    }

    async fn list_checkpoints(&self) -> Result<Vec<CollectorCheckpoint>> {
        let cursor = self
            .checkpoints
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await?;
        let docs: Vec<CheckpointDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(CollectorCheckpoint::from).collect())
    }
}
