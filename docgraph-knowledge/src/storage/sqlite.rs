use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::Utc;
use libsqlite3_sys::{SQLITE_OK, sqlite3, sqlite3_api_routines, sqlite3_auto_extension};
use sqlite_vec::sqlite3_vec_init;
use sqlx::{Sqlite, SqlitePool, Transaction};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::Mutex;
use tracing::debug;

use super::EntityStore;
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::{EntityLabel, EntityNode, Param};

static SQLITE_VEC_INIT_RC: OnceLock<i32> = OnceLock::new();

/// SQLite-backed graph with a `vec0` cosine index per label.
///
/// Vector tables are created on first write, sized by the first embedding
/// seen. The dimension is recorded in `meta` and enforced afterwards.
#[derive(Debug)]
pub struct SqliteEntityStore {
    pool: SqlitePool,
    embedding_dim: Mutex<Option<usize>>,
}

/// label, name, component, description, url, type_signature, default_value,
/// returns, params_json
type EntityRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

impl SqliteEntityStore {
    pub async fn open(db_path: &Path, embedding_dim: Option<usize>) -> KnowledgeResult<Self> {
        init_sqlite_vec_once()?;
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA synchronous = NORMAL")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations/knowledge").run(&pool).await?;

        let stored = stored_embedding_dim(&pool).await?;
        let dim = match (stored, embedding_dim) {
            (Some(expected), Some(actual)) if expected != actual => {
                return Err(KnowledgeError::EmbeddingDimMismatch { expected, actual });
            }
            (stored, configured) => stored.or(configured),
        };

        debug!(path = %db_path.display(), ?dim, "opened entity store");
        Ok(Self {
            pool,
            embedding_dim: Mutex::new(dim),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the label's vector table if needed and check the dimension.
    async fn ensure_vec_table(&self, label: EntityLabel, dimension: usize) -> KnowledgeResult<()> {
        let mut dim = self.embedding_dim.lock().await;
        if let Some(expected) = *dim {
            if expected != dimension {
                return Err(KnowledgeError::EmbeddingDimMismatch {
                    expected,
                    actual: dimension,
                });
            }
        }

        if !vec_table_exists(&self.pool, label).await? {
            let create_sql = format!(
                "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING vec0(embedding float[{}] distance_metric=cosine)",
                label.index_name(),
                dimension
            );
            sqlx::query(&create_sql).execute(&self.pool).await?;
        }

        sqlx::query("INSERT OR REPLACE INTO meta (key, value) VALUES ('embedding_dim', ?)")
            .bind(dimension.to_string())
            .execute(&self.pool)
            .await?;
        *dim = Some(dimension);

        Ok(())
    }

    async fn upsert_node(
        &self,
        label: EntityLabel,
        node: &EntityNode,
        component_id: Option<i64>,
        embedding: &[f32],
    ) -> KnowledgeResult<()> {
        self.ensure_vec_table(label, embedding.len()).await?;

        let params_json = if node.params.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&node.params)?)
        };

        let mut tx = self.pool.begin().await?;
        let (id,): (i64,) = sqlx::query_as(
            r#"INSERT INTO entities (
                label, name, component, component_id, description, url, type_signature,
                default_value, returns, params_json, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(label, name, component) DO UPDATE SET
                component_id=excluded.component_id,
                description=excluded.description,
                url=excluded.url,
                type_signature=excluded.type_signature,
                default_value=excluded.default_value,
                returns=excluded.returns,
                params_json=excluded.params_json,
                updated_at=excluded.updated_at
            RETURNING id"#,
        )
        .bind(label.as_str())
        .bind(&node.name)
        .bind(node.component.as_deref().unwrap_or_default())
        .bind(component_id)
        .bind(&node.description)
        .bind(&node.url)
        .bind(&node.type_signature)
        .bind(&node.default_value)
        .bind(&node.returns)
        .bind(params_json)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&mut *tx)
        .await?;

        replace_vec(&mut tx, label, id, embedding).await?;
        tx.commit().await?;
        debug!(label = %label, name = %node.name, id, "upserted node");
        Ok(())
    }
}

fn init_sqlite_vec_once() -> KnowledgeResult<()> {
    let rc = *SQLITE_VEC_INIT_RC.get_or_init(|| unsafe {
        type SqliteVecInitFn =
            unsafe extern "C" fn(*mut sqlite3, *mut *const i8, *const sqlite3_api_routines) -> i32;

        sqlite3_auto_extension(Some(std::mem::transmute::<*const (), SqliteVecInitFn>(
            sqlite3_vec_init as *const (),
        )))
    });

    if rc == SQLITE_OK {
        Ok(())
    } else {
        Err(KnowledgeError::SqliteVec(format!(
            "sqlite-vec init failed with code {rc}"
        )))
    }
}

async fn stored_embedding_dim(pool: &SqlitePool) -> KnowledgeResult<Option<usize>> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT value FROM meta WHERE key = 'embedding_dim' LIMIT 1")
            .fetch_optional(pool)
            .await?;
    Ok(existing.and_then(|(value,)| value.parse::<usize>().ok()))
}

async fn vec_table_exists(pool: &SqlitePool, label: EntityLabel) -> KnowledgeResult<bool> {
    let table: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(label.index_name())
            .fetch_optional(pool)
            .await?;
    Ok(table.is_some())
}

/// vec0 tables ignore `OR REPLACE`, so the old row is deleted first.
async fn replace_vec(
    tx: &mut Transaction<'_, Sqlite>,
    label: EntityLabel,
    entity_id: i64,
    embedding: &[f32],
) -> KnowledgeResult<()> {
    let payload = serde_json::to_string(embedding)
        .map_err(|e| KnowledgeError::Embedding(format!("embedding serialize failed: {e}")))?;

    let delete_sql = format!("DELETE FROM {} WHERE rowid = ?", label.index_name());
    sqlx::query(&delete_sql)
        .bind(entity_id)
        .execute(&mut **tx)
        .await?;

    let insert_sql = format!(
        "INSERT INTO {}(rowid, embedding) VALUES (?, ?)",
        label.index_name()
    );
    sqlx::query(&insert_sql)
        .bind(entity_id)
        .bind(payload)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

fn row_to_node(row: EntityRow) -> KnowledgeResult<EntityNode> {
    let (label, name, component, description, url, type_signature, default_value, returns, params) =
        row;
    let label = label
        .parse::<EntityLabel>()
        .map_err(|_| KnowledgeError::InvalidInput(format!("unknown label in store: {label}")))?;
    let params: Vec<Param> = match params {
        Some(json) => serde_json::from_str(&json)?,
        None => Vec::new(),
    };

    Ok(EntityNode {
        label,
        name,
        description,
        url,
        component: (!component.is_empty()).then_some(component),
        type_signature,
        default_value,
        returns,
        params,
    })
}

#[async_trait]
impl EntityStore for SqliteEntityStore {
    async fn vector_search(
        &self,
        label: EntityLabel,
        k: usize,
        vector: &[f32],
    ) -> KnowledgeResult<Vec<(EntityNode, f32)>> {
        if k == 0 || !vec_table_exists(&self.pool, label).await? {
            return Ok(Vec::new());
        }
        if let Some(expected) = *self.embedding_dim.lock().await {
            if expected != vector.len() {
                return Err(KnowledgeError::EmbeddingDimMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        let payload = serde_json::to_string(vector)
            .map_err(|e| KnowledgeError::Embedding(format!("embedding serialize failed: {e}")))?;

        let sql = format!(
            "WITH knn AS (SELECT rowid, distance FROM {} WHERE embedding MATCH ? AND k = ?) \
             SELECT e.label, e.name, e.component, e.description, e.url, e.type_signature, \
                    e.default_value, e.returns, e.params_json, knn.distance \
             FROM knn JOIN entities e ON e.id = knn.rowid \
             ORDER BY knn.distance ASC",
            label.index_name()
        );

        let rows: Vec<(
            String,
            String,
            String,
            String,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            f64,
        )> = sqlx::query_as(&sql)
            .bind(payload)
            .bind(k as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|(l, n, c, d, u, t, dv, r, p, distance)| {
                let node = row_to_node((l, n, c, d, u, t, dv, r, p))?;
                Ok((node, 1.0 - distance as f32))
            })
            .collect()
    }

    async fn exact_match(
        &self,
        label: EntityLabel,
        names: &[String],
    ) -> KnowledgeResult<Vec<(String, String)>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = names.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT name, description FROM entities WHERE label = ? AND name IN ({}) ORDER BY name ASC",
            placeholders
        );
        let mut query = sqlx::query_as::<_, (String, String)>(&sql).bind(label.as_str());
        for name in names {
            query = query.bind(name);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn upsert_component(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()> {
        self.upsert_node(EntityLabel::Component, node, None, embedding)
            .await
    }

    async fn upsert_prop(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()> {
        let component = node.component.clone().unwrap_or_default();
        let owner: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM entities WHERE label = 'Component' AND name = ? AND component = '' LIMIT 1",
        )
        .bind(&component)
        .fetch_optional(&self.pool)
        .await?;

        let Some((component_id,)) = owner else {
            return Err(KnowledgeError::UnknownComponent {
                component,
                prop: node.name.clone(),
            });
        };

        self.upsert_node(EntityLabel::Prop, node, Some(component_id), embedding)
            .await
    }

    async fn upsert_hook(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()> {
        self.upsert_node(EntityLabel::Hook, node, None, embedding).await
    }

    async fn upsert_util(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()> {
        self.upsert_node(EntityLabel::Util, node, None, embedding).await
    }

    async fn upsert_type(&self, node: &EntityNode, embedding: &[f32]) -> KnowledgeResult<()> {
        self.upsert_node(EntityLabel::Type, node, None, embedding).await
    }

    async fn delete_all(&self) -> KnowledgeResult<()> {
        let mut dim = self.embedding_dim.lock().await;

        sqlx::query("DELETE FROM entities").execute(&self.pool).await?;
        for label in EntityLabel::ALL {
            let sql = format!("DROP TABLE IF EXISTS {}", label.index_name());
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        sqlx::query("DELETE FROM meta WHERE key = 'embedding_dim'")
            .execute(&self.pool)
            .await?;
        *dim = None;

        debug!("cleared entity store");
        Ok(())
    }

    async fn count(&self, label: EntityLabel) -> KnowledgeResult<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entities WHERE label = ?")
            .bind(label.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
