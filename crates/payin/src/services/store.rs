use crate::{
    config::Database,
    connection::{diesel_make_pg_pool, PgPool},
    core::errors,
};

/// Handle to the relational store. Cheap to clone; all state lives in the
/// underlying connection pool.
#[derive(Clone)]
pub struct Store {
    pub master_pool: PgPool,
}

impl Store {
    pub async fn new(database: &Database) -> errors::CustomResult<Self, errors::StorageError> {
        Ok(Self {
            master_pool: diesel_make_pg_pool(database).await?,
        })
    }
}
