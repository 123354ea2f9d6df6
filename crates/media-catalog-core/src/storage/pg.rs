use super::schema;
use super::{CatalogStore, InsertOutcome, PageKey};
use crate::config::DatabaseConfig;
use crate::error::Error;
use crate::model::{CatalogRecord, HostPaths, MediaCandidate};
use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Integer, Jsonb, Nullable, Text, Timestamp};
use tracing::debug;

pub const POSTGRES_MAX_PARAMETERS: usize = 65535;
const MEDIA_FIELD_COUNT: usize = 8;

// The merge depends on the cursor order matching Rust's byte ordering of
// the normalized key, hence COLLATE "C" throughout.
const FIRST_PAGE_SQL: &str = r#"
SELECT id, name, create_date, last_modify, file_size, hash, type AS media_type, metadata, paths
  FROM media
 ORDER BY translate(name, '-_', '') COLLATE "C", name COLLATE "C"
 LIMIT $1"#;

const NEXT_PAGE_SQL: &str = r#"
SELECT id, name, create_date, last_modify, file_size, hash, type AS media_type, metadata, paths
  FROM media
 WHERE (translate(name, '-_', '') COLLATE "C", name COLLATE "C") > ($1, $2)
 ORDER BY translate(name, '-_', '') COLLATE "C", name COLLATE "C"
 LIMIT $3"#;

const FIND_BY_NAME_SQL: &str = r#"
SELECT id, name, create_date, last_modify, file_size, hash, type AS media_type, metadata, paths
  FROM media
 WHERE name = $1"#;

// The no-op DO UPDATE makes RETURNING yield the conflicting row, so a
// raced insert still reports the winner atomically. xmax = 0 marks rows
// this statement actually created.
const UPSERT_SQL: &str = r#"
INSERT INTO media (name, create_date, last_modify, file_size, hash, type, metadata, paths)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (name) DO UPDATE SET name = excluded.name
RETURNING id, name, create_date, last_modify, file_size, hash, type AS media_type,
          metadata, paths, (xmax = 0) AS inserted"#;

const UPDATE_PATHS_SQL: &str = "UPDATE media SET paths = $1 WHERE id = $2";
const UPDATE_HASH_SQL: &str = "UPDATE media SET hash = $1 WHERE id = $2";
const PROBE_SQL: &str = "SELECT 1 AS present FROM media LIMIT 1";

#[derive(QueryableByName)]
struct MediaRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Timestamp)]
    create_date: NaiveDateTime,
    #[diesel(sql_type = Timestamp)]
    last_modify: NaiveDateTime,
    #[diesel(sql_type = BigInt)]
    file_size: i64,
    #[diesel(sql_type = Nullable<Text>)]
    hash: Option<String>,
    #[diesel(sql_type = Text)]
    media_type: String,
    #[diesel(sql_type = Jsonb)]
    metadata: serde_json::Value,
    #[diesel(sql_type = Jsonb)]
    paths: serde_json::Value,
}

impl MediaRow {
    fn into_record(self) -> Result<CatalogRecord, Error> {
        let paths: HostPaths = serde_json::from_value(self.paths)?;
        Ok(CatalogRecord::new(
            self.id,
            self.name,
            self.create_date,
            self.last_modify,
            self.file_size,
            self.hash,
            self.media_type,
            self.metadata,
            paths,
        ))
    }
}

#[derive(QueryableByName)]
struct UpsertRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Timestamp)]
    create_date: NaiveDateTime,
    #[diesel(sql_type = Timestamp)]
    last_modify: NaiveDateTime,
    #[diesel(sql_type = BigInt)]
    file_size: i64,
    #[diesel(sql_type = Nullable<Text>)]
    hash: Option<String>,
    #[diesel(sql_type = Text)]
    media_type: String,
    #[diesel(sql_type = Jsonb)]
    metadata: serde_json::Value,
    #[diesel(sql_type = Jsonb)]
    paths: serde_json::Value,
    #[diesel(sql_type = Bool)]
    inserted: bool,
}

#[derive(QueryableByName)]
struct ProbeRow {
    #[diesel(sql_type = Integer)]
    #[allow(dead_code)]
    present: i32,
}

#[derive(Insertable)]
#[diesel(table_name = schema::media)]
struct NewMediaRow {
    name: String,
    create_date: NaiveDateTime,
    last_modify: NaiveDateTime,
    file_size: i64,
    hash: Option<String>,
    media_type: String,
    metadata: serde_json::Value,
    paths: serde_json::Value,
}

impl From<&MediaCandidate> for NewMediaRow {
    fn from(candidate: &MediaCandidate) -> NewMediaRow {
        NewMediaRow {
            name: candidate.name.clone(),
            create_date: candidate.created_at,
            last_modify: candidate.last_modify,
            file_size: candidate.size,
            hash: candidate.content_hash.clone(),
            media_type: candidate.media_type.clone(),
            metadata: metadata_json(candidate),
            paths: paths_json(&candidate.paths),
        }
    }
}

fn metadata_json(candidate: &MediaCandidate) -> serde_json::Value {
    serde_json::Value::Object(
        candidate
            .metadata
            .iter()
            .map(|(tag, value)| (tag.name().to_string(), serde_json::Value::String(value.clone())))
            .collect(),
    )
}

fn paths_json(paths: &HostPaths) -> serde_json::Value {
    serde_json::Value::Object(
        paths
            .iter()
            .map(|(host, path)| (host.clone(), serde_json::Value::String(path.clone())))
            .collect(),
    )
}

/// Catalog storage on Postgres. Owns the single connection for the run and
/// the run-scoped transaction state.
pub struct PgCatalog {
    conn: PgConnection,
    in_tx: bool,
}

impl PgCatalog {
    pub fn connect(config: &DatabaseConfig) -> Result<PgCatalog, Error> {
        let conn = PgConnection::establish(&config.connection_url())?;
        debug!("Connected to media catalog database");
        Ok(PgCatalog { conn, in_tx: false })
    }

    /// Create the media table and its merge-order index if absent.
    pub fn ensure_schema(&mut self) -> Result<(), Error> {
        self.conn.batch_execute(include_str!("schema.sql"))?;
        debug!("Catalog schema ensured");
        Ok(())
    }
}

impl CatalogStore for PgCatalog {
    fn has_records(&mut self) -> Result<bool, Error> {
        let rows: Vec<ProbeRow> = diesel::sql_query(PROBE_SQL).get_results(&mut self.conn)?;
        Ok(!rows.is_empty())
    }

    fn fetch_page(
        &mut self,
        after: Option<&PageKey>,
        limit: i64,
    ) -> Result<Vec<CatalogRecord>, Error> {
        let rows: Vec<MediaRow> = match after {
            None => diesel::sql_query(FIRST_PAGE_SQL)
                .bind::<BigInt, _>(limit)
                .get_results(&mut self.conn)?,
            Some(key) => diesel::sql_query(NEXT_PAGE_SQL)
                .bind::<Text, _>(&key.normalized)
                .bind::<Text, _>(&key.name)
                .bind::<BigInt, _>(limit)
                .get_results(&mut self.conn)?,
        };
        rows.into_iter().map(MediaRow::into_record).collect()
    }

    fn find_by_name(&mut self, name: &str) -> Result<Option<CatalogRecord>, Error> {
        let row: Option<MediaRow> = diesel::sql_query(FIND_BY_NAME_SQL)
            .bind::<Text, _>(name)
            .get_result(&mut self.conn)
            .optional()?;
        row.map(MediaRow::into_record).transpose()
    }

    fn insert_or_existing(&mut self, candidate: &MediaCandidate) -> Result<InsertOutcome, Error> {
        let row: UpsertRow = diesel::sql_query(UPSERT_SQL)
            .bind::<Text, _>(&candidate.name)
            .bind::<Timestamp, _>(candidate.created_at)
            .bind::<Timestamp, _>(candidate.last_modify)
            .bind::<BigInt, _>(candidate.size)
            .bind::<Nullable<Text>, _>(candidate.content_hash.as_deref())
            .bind::<Text, _>(&candidate.media_type)
            .bind::<Jsonb, _>(metadata_json(candidate))
            .bind::<Jsonb, _>(paths_json(&candidate.paths))
            .get_result(&mut self.conn)?;
        if row.inserted {
            Ok(InsertOutcome::Inserted(row.id))
        } else {
            let record = MediaRow {
                id: row.id,
                name: row.name,
                create_date: row.create_date,
                last_modify: row.last_modify,
                file_size: row.file_size,
                hash: row.hash,
                media_type: row.media_type,
                metadata: row.metadata,
                paths: row.paths,
            }
            .into_record()?;
            Ok(InsertOutcome::Existing(record))
        }
    }

    fn insert_batch(&mut self, candidates: &[MediaCandidate]) -> Result<usize, Error> {
        let chunk_size = POSTGRES_MAX_PARAMETERS / MEDIA_FIELD_COUNT;
        let mut rows_added = 0;
        for chunk in candidates.chunks(chunk_size) {
            let rows: Vec<NewMediaRow> = chunk.iter().map(NewMediaRow::from).collect();
            rows_added += diesel::insert_into(schema::media::table)
                .values(&rows)
                .execute(&mut self.conn)?;
        }
        Ok(rows_added)
    }

    fn update_paths(&mut self, id: i64, paths: &HostPaths) -> Result<(), Error> {
        diesel::sql_query(UPDATE_PATHS_SQL)
            .bind::<Jsonb, _>(paths_json(paths))
            .bind::<BigInt, _>(id)
            .execute(&mut self.conn)?;
        Ok(())
    }

    fn update_hash(&mut self, id: i64, hash: &str) -> Result<(), Error> {
        diesel::sql_query(UPDATE_HASH_SQL)
            .bind::<Text, _>(hash)
            .bind::<BigInt, _>(id)
            .execute(&mut self.conn)?;
        Ok(())
    }

    fn begin(&mut self) -> Result<(), Error> {
        self.conn.batch_execute("BEGIN")?;
        self.in_tx = true;
        Ok(())
    }

    fn checkpoint(&mut self) -> Result<(), Error> {
        if self.in_tx {
            self.conn.batch_execute("COMMIT; BEGIN")?;
            debug!("Intermediate commit issued");
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        if self.in_tx {
            self.conn.batch_execute("COMMIT")?;
            self.in_tx = false;
        }
        Ok(())
    }
}
