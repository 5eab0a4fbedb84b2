use crate::domain::account::PartyAccount;
use crate::domain::loan::{Loan, LoanId};
use crate::domain::party::PartyId;
use crate::domain::ports::{Changeset, LedgerStore};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing loan records, keyed by big-endian loan id.
pub const CF_LOANS: &str = "loans";
/// Column Family for storing party accounts, keyed by party id.
pub const CF_ACCOUNTS: &str = "accounts";

/// A persistent store implementation using RocksDB.
///
/// Loans and accounts live in separate Column Families. Big-endian loan keys
/// keep loans in id order, so the last key is the highest id handed out.
/// Changesets are written with a single `WriteBatch`.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

fn internal(msg: String) -> LedgerError {
    LedgerError::InternalError(Box::new(std::io::Error::other(msg)))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        LedgerError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Serialization error: {}", e),
        )))
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        LedgerError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Deserialization error: {}", e),
        )))
    })
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("loans" and "accounts") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_loans = ColumnFamilyDescriptor::new(CF_LOANS, Options::default());
        let cf_accounts = ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_loans, cf_accounts])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| internal(format!("{name} column family not found")))
    }

    fn scan<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let cf = self.cf(name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| internal(format!("RocksDB iteration error: {}", e)))?;
            values.push(decode(&value)?);
        }
        Ok(values)
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn get_loan(&self, id: LoanId) -> Result<Option<Loan>> {
        let cf = self.cf(CF_LOANS)?;
        match self.db.get_cf(cf, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn get_account(&self, party: &PartyId) -> Result<Option<PartyAccount>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        match self.db.get_cf(cf, party.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn last_loan_id(&self) -> Result<Option<LoanId>> {
        let cf = self.cf(CF_LOANS)?;
        let Some(item) = self.db.iterator_cf(cf, IteratorMode::End).next() else {
            return Ok(None);
        };
        let (key, _value) = item.map_err(|e| internal(format!("RocksDB iteration error: {}", e)))?;
        let bytes = <[u8; 8]>::try_from(&key[..])
            .map_err(|_| internal(format!("malformed loan key of {} bytes", key.len())))?;
        Ok(Some(LoanId::from_be_bytes(bytes)))
    }

    async fn all_loans(&self) -> Result<Vec<Loan>> {
        self.scan(CF_LOANS)
    }

    async fn all_accounts(&self) -> Result<Vec<PartyAccount>> {
        self.scan(CF_ACCOUNTS)
    }

    async fn commit(&self, changes: Changeset) -> Result<()> {
        let loans = self.cf(CF_LOANS)?;
        let accounts = self.cf(CF_ACCOUNTS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(loans, changes.loan.id.to_be_bytes(), encode(&changes.loan)?);
        for account in &changes.accounts {
            batch.put_cf(accounts, account.party.as_str().as_bytes(), encode(account)?);
        }
        self.db.write(batch)?;

        Ok(())
    }
}
