//! Cache entry CRUD operations.
//!
//! Entries are keyed by `(generation, request identity)` and use UPSERT
//! semantics so a later write for the same request replaces the earlier one.

use super::connection::CacheDb;
use crate::Error;
use crate::http::{Request, Response};
use bytes::Bytes;
use tokio_rusqlite::rusqlite::{self, Row};
use tokio_rusqlite::{params, rusqlite::Connection};

/// A stored request/response pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub response: Response,
    pub stored_at: String,
}

const UPSERT_ENTRY: &str = "INSERT INTO entries (
        generation, key_hash, method, url, status, status_text, headers_json, body, stored_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(generation, key_hash) DO UPDATE SET
        method = excluded.method,
        url = excluded.url,
        status = excluded.status,
        status_text = excluded.status_text,
        headers_json = excluded.headers_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

const SELECT_ENTRY: &str = "SELECT key_hash, method, url, status, status_text, headers_json, body, stored_at
    FROM entries";

/// Owned row ready to be written on the database thread.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        Ok(Self {
            key_hash: request.cache_key(),
            method: request.method.clone(),
            url: request.identity_url().to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.to_vec(),
        })
    }

    fn insert(&self, conn: &Connection, generation: &str, stored_at: &str) -> Result<(), Error> {
        conn.execute(
            UPSERT_ENTRY,
            params![
                generation,
                &self.key_hash,
                &self.method,
                &self.url,
                self.status,
                &self.status_text,
                &self.headers_json,
                &self.body,
                stored_at,
            ],
        )?;
        Ok(())
    }
}

fn read_entry(row: &Row<'_>) -> rusqlite::Result<(CacheEntry, String)> {
    let headers_json: String = row.get(5)?;
    let body: Vec<u8> = row.get(6)?;
    let entry = CacheEntry {
        key_hash: row.get(0)?,
        method: row.get(1)?,
        url: row.get(2)?,
        response: Response {
            status: row.get(3)?,
            status_text: row.get(4)?,
            headers: Vec::new(),
            body: Bytes::from(body),
        },
        stored_at: row.get(7)?,
    };
    Ok((entry, headers_json))
}

fn decode_headers((mut entry, headers_json): (CacheEntry, String)) -> Result<CacheEntry, Error> {
    entry.response.headers = serde_json::from_str(&headers_json)?;
    Ok(entry)
}

impl CacheDb {
    /// Store a response under the request's identity in `generation`.
    ///
    /// Fails if the generation does not exist.
    pub async fn put_entry(&self, generation: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let row = EntryRow::new(request, response)?;
        let generation = generation.to_string();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> { row.insert(conn, &generation, &stored_at) })
            .await
            .map_err(Error::from)
    }

    /// Write a complete precache set and mark the generation ready.
    ///
    /// All rows and the readiness flag are committed in a single transaction:
    /// either every entry becomes visible together with `ready = 1`, or none do.
    pub async fn commit_precache(&self, generation: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(request, response)| EntryRow::new(request, response))
            .collect::<Result<Vec<_>, _>>()?;
        let generation = generation.to_string();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.unchecked_transaction()?;
                for row in &rows {
                    row.insert(&tx, &generation, &stored_at)?;
                }
                let updated = tx.execute("UPDATE generations SET ready = 1 WHERE name = ?1", params![generation])?;
                if updated == 0 {
                    return Err(Error::CorruptEntry(format!("generation {generation} vanished during precache")));
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry stored for a request identity.
    ///
    /// Returns None if the generation holds no such entry.
    pub async fn match_entry(&self, generation: &str, request: &Request) -> Result<Option<CacheEntry>, Error> {
        let generation = generation.to_string();
        let key_hash = request.cache_key();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_ENTRY} WHERE generation = ?1 AND key_hash = ?2"))?;
                match stmt.query_row(params![generation, key_hash], read_entry) {
                    Ok(raw) => decode_headers(raw).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// All entries of a generation, ordered by URL.
    pub async fn list_entries(&self, generation: &str) -> Result<Vec<CacheEntry>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CacheEntry>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_ENTRY} WHERE generation = ?1 ORDER BY url ASC"))?;
                let raw = stmt
                    .query_map(params![generation], read_entry)?
                    .collect::<Result<Vec<_>, _>>()?;
                raw.into_iter().map(decode_headers).collect()
            })
            .await
            .map_err(Error::from)
    }

    pub async fn entry_count(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![generation], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn request(path: &str) -> Request {
        Request::get(Url::parse("http://localhost:8000/").unwrap().join(path).unwrap())
    }

    fn html(body: &str) -> Response {
        Response::new(200, "OK", body.to_string()).with_header("Content-Type", "text/html; charset=utf-8")
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("fuec-v3").await.unwrap();

        let req = request("/login");
        db.put_entry("fuec-v3", &req, &html("<h1>Login</h1>")).await.unwrap();

        let entry = db.match_entry("fuec-v3", &req).await.unwrap().unwrap();
        assert_eq!(entry.url, "http://localhost:8000/login");
        assert_eq!(entry.method, "GET");
        assert_eq!(entry.response.status, 200);
        assert_eq!(entry.response.body, Bytes::from_static(b"<h1>Login</h1>"));
        assert_eq!(entry.response.header("content-type"), Some("text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_fragment_variants_share_one_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("fuec-v3").await.unwrap();

        db.put_entry("fuec-v3", &request("/ayuda#contacto"), &html("<h1>Ayuda</h1>")).await.unwrap();

        let entry = db.match_entry("fuec-v3", &request("/ayuda")).await.unwrap().unwrap();
        assert_eq!(entry.url, "http://localhost:8000/ayuda");
        assert!(db.match_entry("fuec-v3", &request("/ayuda#faq")).await.unwrap().is_some());
        assert_eq!(db.entry_count("fuec-v3").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("fuec-v3").await.unwrap();
        assert!(db.match_entry("fuec-v3", &request("/nothing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_is_scoped_to_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("fuec-v2").await.unwrap();
        db.open_generation("fuec-v3").await.unwrap();

        let req = request("/");
        db.put_entry("fuec-v2", &req, &html("old")).await.unwrap();

        assert!(db.match_entry("fuec-v3", &req).await.unwrap().is_none());
        assert!(db.match_entry("fuec-v2", &req).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_put_overwrites_same_identity() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("fuec-v3").await.unwrap();

        let req = request("/conductor");
        db.put_entry("fuec-v3", &req, &html("first")).await.unwrap();
        db.put_entry("fuec-v3", &req, &html("second")).await.unwrap();

        assert_eq!(db.entry_count("fuec-v3").await.unwrap(), 1);
        let entry = db.match_entry("fuec-v3", &req).await.unwrap().unwrap();
        assert_eq!(entry.response.text(), "second");
    }

    #[tokio::test]
    async fn test_put_requires_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.put_entry("missing", &request("/"), &html("x")).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[tokio::test]
    async fn test_commit_precache_marks_ready() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("fuec-v3").await.unwrap();

        let entries = vec![(request("/"), html("home")), (request("/offline"), html("offline"))];
        db.commit_precache("fuec-v3", &entries).await.unwrap();

        assert!(db.is_generation_ready("fuec-v3").await.unwrap());
        assert_eq!(db.entry_count("fuec-v3").await.unwrap(), 2);

        let listed = db.list_entries("fuec-v3").await.unwrap();
        let urls: Vec<_> = listed.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["http://localhost:8000/", "http://localhost:8000/offline"]);
    }

    #[tokio::test]
    async fn test_commit_precache_without_generation_writes_nothing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![(request("/"), html("home"))];

        assert!(db.commit_precache("fuec-v3", &entries).await.is_err());
        assert!(!db.has_generation("fuec-v3").await.unwrap());
        assert_eq!(db.entry_count("fuec-v3").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_generation_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("fuec-v1").await.unwrap();
        db.put_entry("fuec-v1", &request("/"), &html("home")).await.unwrap();

        db.delete_generation("fuec-v1").await.unwrap();
        assert_eq!(db.entry_count("fuec-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_binary_body_round_trip() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("fuec-v3").await.unwrap();

        let body: Vec<u8> = (0u8..=255).collect();
        let req = request("/static/img/logo.png");
        let response = Response::new(200, "OK", body.clone()).with_header("Content-Type", "image/png");
        db.put_entry("fuec-v3", &req, &response).await.unwrap();

        let entry = db.match_entry("fuec-v3", &req).await.unwrap().unwrap();
        assert_eq!(entry.response.body.as_ref(), body.as_slice());
    }
}
