//! Bucket and entry operations.
//!
//! A bucket is a named set of request/response pairs. Entries are keyed by
//! [`request_key`] inside their bucket, so storing the same request twice
//! overwrites the earlier response.

use super::connection::CacheDb;
use super::hash::request_key;
use crate::Error;
use crate::model::{Request, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};
use url::Url;

/// Bucket name with its size, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BucketInfo {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
}

/// Metadata of one stored entry, without the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryMeta {
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body_len: u64,
    pub stored_at: String,
}

/// Row shape shared by the match queries: status, headers, body, response url.
type RawResponse = (i64, String, Vec<u8>, String);

fn decode_response(raw: RawResponse) -> Result<Response, Error> {
    let (status, headers_json, body, response_url) = raw;
    let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status}")))?;
    let headers: Vec<(String, String)> =
        serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
    let url = Url::parse(&response_url).map_err(|e| Error::CorruptEntry(format!("url: {e}")))?;

    Ok(Response { status, headers, body: Bytes::from(body), url, source: Default::default() }.into_cached())
}

/// Owned row ready to be written inside a connection closure.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status_code: i64,
    headers_json: String,
    body: Vec<u8>,
    response_url: String,
}

impl EntryRow {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(format!("headers: {e}")))?;
        Ok(Self {
            key_hash: request_key(request),
            method: request.method.to_string(),
            url: request.url.to_string(),
            status_code: i64::from(response.status),
            headers_json,
            body: response.body.to_vec(),
            response_url: response.url.to_string(),
        })
    }

    fn write(&self, conn: &rusqlite::Connection, bucket: &str, stored_at: &str) -> Result<(), rusqlite::Error> {
        conn.execute(
            "INSERT INTO entries (
                bucket, key_hash, method, url, status_code, headers_json, body, response_url, stored_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(bucket, key_hash) DO UPDATE SET
                method = excluded.method,
                url = excluded.url,
                status_code = excluded.status_code,
                headers_json = excluded.headers_json,
                body = excluded.body,
                response_url = excluded.response_url,
                stored_at = excluded.stored_at",
            params![
                bucket,
                &self.key_hash,
                &self.method,
                &self.url,
                self.status_code,
                &self.headers_json,
                &self.body,
                &self.response_url,
                stored_at,
            ],
        )?;
        Ok(())
    }
}

fn ensure_bucket(conn: &rusqlite::Connection, bucket: &str, now: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
        params![bucket, now],
    )?;
    Ok(())
}

impl CacheDb {
    /// Create the bucket if it does not exist yet.
    pub async fn open_bucket(&self, bucket: &str) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_bucket(conn, &bucket, &now)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the stored response for `request` in one bucket.
    pub async fn match_in_bucket(&self, bucket: &str, request: &Request) -> Result<Option<Response>, Error> {
        let bucket = bucket.to_string();
        let key = request_key(request);
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<RawResponse>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status_code, headers_json, body, response_url
                         FROM entries WHERE bucket = ?1 AND key_hash = ?2",
                        params![bucket, key],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        raw.map(decode_response).transpose()
    }

    /// Look up `request` across every bucket, oldest bucket first.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key = request_key(request);
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<RawResponse>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status_code, e.headers_json, e.body, e.response_url
                         FROM entries e JOIN buckets b ON b.name = e.bucket
                         WHERE e.key_hash = ?1
                         ORDER BY b.rowid ASC
                         LIMIT 1",
                        params![key],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        raw.map(decode_response).transpose()
    }

    /// Store `response` for `request`, creating the bucket if needed.
    pub async fn put_entry(&self, bucket: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_entries(bucket, &[(request.clone(), response.clone())]).await
    }

    /// Store several entries in one transaction: either all land or none do.
    pub async fn put_entries(&self, bucket: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(req, resp)| EntryRow::new(req, resp))
            .collect::<Result<Vec<_>, _>>()?;
        let bucket = bucket.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.unchecked_transaction()?;
                ensure_bucket(&tx, &bucket, &now)?;
                for row in &rows {
                    row.write(&tx, &bucket, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a bucket and its entries. Returns false if it did not exist.
    pub async fn delete_bucket(&self, bucket: &str) -> Result<bool, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.unchecked_transaction()?;
                tx.execute("DELETE FROM entries WHERE bucket = ?1", params![bucket])?;
                let removed = tx.execute("DELETE FROM buckets WHERE name = ?1", params![bucket])?;
                tx.commit()?;
                Ok(removed > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Bucket names in creation order.
    pub async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM buckets ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Bucket names with creation time and entry counts, in creation order.
    pub async fn bucket_infos(&self) -> Result<Vec<BucketInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<BucketInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT b.name, b.created_at, COUNT(e.key_hash)
                     FROM buckets b LEFT JOIN entries e ON e.bucket = b.name
                     GROUP BY b.name
                     ORDER BY b.rowid ASC",
                )?;
                let infos = stmt
                    .query_map([], |row| {
                        Ok(BucketInfo {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entries: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(infos)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored in `bucket` (0 if it does not exist).
    pub async fn entry_count(&self, bucket: &str) -> Result<u64, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE bucket = ?1", params![bucket], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Entry metadata for one bucket, ordered by URL.
    pub async fn list_entries(&self, bucket: &str) -> Result<Vec<EntryMeta>, Error> {
        let bucket = bucket.to_string();
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<(EntryMeta, i64, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key_hash, method, url, status_code, length(body), stored_at, headers_json
                     FROM entries WHERE bucket = ?1
                     ORDER BY url ASC, method ASC",
                )?;
                let rows = stmt
                    .query_map(params![bucket], |row| {
                        Ok((
                            EntryMeta {
                                key_hash: row.get(0)?,
                                method: row.get(1)?,
                                url: row.get(2)?,
                                status_code: 0,
                                content_type: None,
                                body_len: row.get::<_, i64>(4)? as u64,
                                stored_at: row.get(5)?,
                            },
                            row.get(3)?,
                            row.get(6)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(mut meta, status, headers_json)| {
                meta.status_code = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status}")))?;
                meta.content_type = serde_json::from_str::<Vec<(String, String)>>(&headers_json)
                    .ok()
                    .and_then(|headers| {
                        headers
                            .into_iter()
                            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                            .map(|(_, v)| v)
                    });
                Ok(meta)
            })
            .collect()
    }

    /// Delete every bucket whose name is not `keep`.
    ///
    /// Returns the names that were removed.
    pub async fn purge_stale_buckets(&self, keep: &str) -> Result<Vec<String>, Error> {
        let keep = keep.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.unchecked_transaction()?;
                let stale = tx
                    .prepare("SELECT name FROM buckets WHERE name != ?1 ORDER BY rowid ASC")?
                    .query_map(params![keep], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                tx.execute("DELETE FROM entries WHERE bucket != ?1", params![keep])?;
                tx.execute("DELETE FROM buckets WHERE name != ?1", params![keep])?;
                tx.commit()?;
                Ok(stale)
            })
            .await
            .map_err(Error::from)
    }
}
