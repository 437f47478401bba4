//! Scripted in-memory driver for integration tests.
//!
//! Records every prepared statement, bind, flush, commit and autocommit
//! toggle as an ordered event log, and serves canned results from a
//! reply queue. Precondition tests assert on the empty event log to
//! prove no statement was prepared.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use dbrow::db::{
    Connection, ConnectionProvider, KeyRetrieval, MaterializedRows, RawBatch, Rows, Statement,
};
use dbrow::dialect::Dialect;
use dbrow::{Db, DbConfig, DbError, DbResult, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One observable driver interaction, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Prepared { sql: String, keys: KeyRetrieval },
    Query { sql: String, params: Vec<Value> },
    Update { sql: String, params: Vec<Value> },
    AddBatch { params: Vec<Value> },
    Flush { size: usize },
    Commit,
    SetAutocommit(bool),
    DateBind { index: usize },
    TimestampBind { index: usize },
    Released,
}

/// Canned driver responses, consumed front to back.
#[derive(Debug, Clone)]
pub enum Reply {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Update {
        affected: u64,
        keys: Vec<Value>,
    },
    Fail(String),
}

#[derive(Default)]
pub struct FakeState {
    pub events: Vec<Event>,
    pub replies: VecDeque<Reply>,
    pub autocommit: bool,
    /// Sequence number handed out per batched unit, so tests can prove
    /// outcome order across chunk boundaries.
    batch_sequence: i64,
}

impl FakeState {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            replies: VecDeque::new(),
            autocommit: true,
            batch_sequence: 0,
        }
    }
}

pub struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
    ambient: AtomicBool,
}

impl FakeProvider {
    pub fn set_ambient(&self, active: bool) {
        self.ambient.store(active, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectionProvider for FakeProvider {
    async fn acquire(&self) -> DbResult<Box<dyn Connection>> {
        Ok(Box::new(FakeConnection {
            state: self.state.clone(),
        }))
    }

    async fn release(&self, conn: Box<dyn Connection>) {
        self.state.lock().unwrap().events.push(Event::Released);
        drop(conn);
    }

    fn in_transaction(&self) -> bool {
        self.ambient.load(Ordering::SeqCst)
    }
}

struct FakeConnection {
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn prepare(
        &self,
        sql: &str,
        keys: KeyRetrieval,
    ) -> DbResult<Box<dyn Statement + Send + '_>> {
        self.state.lock().unwrap().events.push(Event::Prepared {
            sql: sql.to_string(),
            keys: keys.clone(),
        });
        Ok(Box::new(FakeStatement {
            state: self.state.clone(),
            sql: sql.to_string(),
            keys,
            binds: Vec::new(),
            batch: Vec::new(),
            generated: Vec::new(),
        }))
    }

    async fn raw_batch(&self) -> DbResult<Box<dyn RawBatch + Send + '_>> {
        Ok(Box::new(FakeRawBatch {
            state: self.state.clone(),
            pending: Vec::new(),
        }))
    }

    async fn autocommit(&self) -> DbResult<bool> {
        Ok(self.state.lock().unwrap().autocommit)
    }

    async fn set_autocommit(&self, enabled: bool) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        state.autocommit = enabled;
        state.events.push(Event::SetAutocommit(enabled));
        Ok(())
    }

    async fn commit(&self) -> DbResult<()> {
        self.state.lock().unwrap().events.push(Event::Commit);
        Ok(())
    }
}

struct FakeStatement {
    state: Arc<Mutex<FakeState>>,
    sql: String,
    keys: KeyRetrieval,
    binds: Vec<Value>,
    batch: Vec<Vec<Value>>,
    generated: Vec<Value>,
}

impl FakeStatement {
    fn set_bind(&mut self, index: usize, value: Value) {
        if self.binds.len() <= index {
            self.binds.resize(index + 1, Value::Null);
        }
        self.binds[index] = value;
    }
}

#[async_trait]
impl Statement for FakeStatement {
    fn bind(&mut self, index: usize, value: &Value) -> DbResult<()> {
        self.set_bind(index, value.clone());
        Ok(())
    }

    fn bind_date(&mut self, index: usize, value: NaiveDate) -> DbResult<()> {
        self.state
            .lock()
            .unwrap()
            .events
            .push(Event::DateBind { index });
        self.set_bind(index, Value::Date(value));
        Ok(())
    }

    fn bind_timestamp(&mut self, index: usize, value: NaiveDateTime) -> DbResult<()> {
        self.state
            .lock()
            .unwrap()
            .events
            .push(Event::TimestampBind { index });
        self.set_bind(index, Value::Timestamp(value));
        Ok(())
    }

    fn add_batch(&mut self) -> DbResult<()> {
        let params = std::mem::take(&mut self.binds);
        self.state
            .lock()
            .unwrap()
            .events
            .push(Event::AddBatch {
                params: params.clone(),
            });
        self.batch.push(params);
        Ok(())
    }

    async fn execute_query(&mut self) -> DbResult<Box<dyn Rows + Send>> {
        let params = std::mem::take(&mut self.binds);
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Query {
            sql: self.sql.clone(),
            params,
        });
        let scripted = matches!(
            state.replies.front(),
            Some(Reply::Rows { .. }) | Some(Reply::Fail(_))
        );
        let reply = if scripted { state.replies.pop_front() } else { None };
        match reply {
            Some(Reply::Rows { columns, rows }) => {
                Ok(Box::new(MaterializedRows::new(columns, rows)))
            }
            Some(Reply::Fail(message)) => Err(DbError::execution(message)),
            _ => Ok(Box::new(MaterializedRows::empty())),
        }
    }

    async fn execute_update(&mut self) -> DbResult<u64> {
        let params = std::mem::take(&mut self.binds);
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Update {
            sql: self.sql.clone(),
            params,
        });
        let scripted = matches!(
            state.replies.front(),
            Some(Reply::Update { .. }) | Some(Reply::Fail(_))
        );
        let reply = if scripted { state.replies.pop_front() } else { None };
        match reply {
            Some(Reply::Update { affected, keys }) => {
                self.generated = keys;
                Ok(affected)
            }
            Some(Reply::Fail(message)) => Err(DbError::execution(message)),
            _ => {
                self.generated = Vec::new();
                Ok(1)
            }
        }
    }

    async fn execute_batch(&mut self) -> DbResult<Vec<i64>> {
        let batch = std::mem::take(&mut self.batch);
        let mut state = self.state.lock().unwrap();
        let failing = matches!(state.replies.front(), Some(Reply::Fail(_)));
        if failing {
            if let Some(Reply::Fail(message)) = state.replies.pop_front() {
                return Err(DbError::execution(message));
            }
        }
        state.events.push(Event::Flush { size: batch.len() });
        let outcomes = batch
            .iter()
            .map(|_| {
                state.batch_sequence += 1;
                state.batch_sequence
            })
            .collect();
        Ok(outcomes)
    }

    async fn generated_keys(&mut self) -> DbResult<Box<dyn Rows + Send>> {
        if self.keys == KeyRetrieval::None {
            return Ok(Box::new(MaterializedRows::empty()));
        }
        let rows = self.generated.iter().map(|v| vec![v.clone()]).collect();
        Ok(Box::new(MaterializedRows::new(
            vec!["generated_key".to_string()],
            rows,
        )))
    }
}

struct FakeRawBatch {
    state: Arc<Mutex<FakeState>>,
    pending: Vec<String>,
}

#[async_trait]
impl RawBatch for FakeRawBatch {
    fn add(&mut self, sql: &str) -> DbResult<()> {
        self.pending.push(sql.to_string());
        Ok(())
    }

    async fn execute(&mut self) -> DbResult<Vec<i64>> {
        let pending = std::mem::take(&mut self.pending);
        let mut state = self.state.lock().unwrap();
        let failing = matches!(state.replies.front(), Some(Reply::Fail(_)));
        if failing {
            if let Some(Reply::Fail(message)) = state.replies.pop_front() {
                return Err(DbError::execution(message));
            }
        }
        state.events.push(Event::Flush {
            size: pending.len(),
        });
        let outcomes = pending
            .iter()
            .map(|_| {
                state.batch_sequence += 1;
                state.batch_sequence
            })
            .collect();
        Ok(outcomes)
    }
}

/// A `Db` wired to the spy driver, plus handles for scripting replies
/// and inspecting the event log.
pub struct FakeDb {
    pub db: Db,
    pub state: Arc<Mutex<FakeState>>,
    pub provider: Arc<FakeProvider>,
}

impl FakeDb {
    pub fn new(dialect: impl Dialect + 'static) -> Self {
        let state = Arc::new(Mutex::new(FakeState::new()));
        let provider = Arc::new(FakeProvider {
            state: state.clone(),
            ambient: AtomicBool::new(false),
        });
        let config = DbConfig::builder("test")
            .dialect(dialect)
            .provider_arc(provider.clone())
            .build()
            .unwrap();
        Self {
            db: Db::new(Arc::new(config)),
            state,
            provider,
        }
    }

    pub fn queue_rows(&self, columns: &[&str], rows: Vec<Vec<Value>>) {
        self.state.lock().unwrap().replies.push_back(Reply::Rows {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        });
    }

    pub fn queue_update(&self, affected: u64, keys: Vec<Value>) {
        self.state
            .lock()
            .unwrap()
            .replies
            .push_back(Reply::Update { affected, keys });
    }

    pub fn queue_fail(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .replies
            .push_back(Reply::Fail(message.to_string()));
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    /// SQL of every prepared statement, in order.
    pub fn prepared_sql(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Prepared { sql, .. } => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn commits(&self) -> usize {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::Commit))
            .count()
    }

    /// Flush sizes in execution order.
    pub fn flushes(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Flush { size } => Some(size),
                _ => None,
            })
            .collect()
    }

    /// True when no statement and no raw batch ever reached the driver.
    pub fn no_statement_prepared(&self) -> bool {
        !self.events().iter().any(|e| {
            matches!(
                e,
                Event::Prepared { .. }
                    | Event::Query { .. }
                    | Event::Update { .. }
                    | Event::Flush { .. }
            )
        })
    }
}
