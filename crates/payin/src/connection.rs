use bb8::PooledConnection;
use diesel::PgConnection;
use error_stack::{IntoReport, ResultExt};

use crate::{config::Database, core::errors, services::Store};

pub type PgPool = bb8::Pool<async_bb8_diesel::ConnectionManager<PgConnection>>;

/// Build the connection pool the store hands out for every query.
pub async fn diesel_make_pg_pool(
    database: &Database,
) -> errors::CustomResult<PgPool, errors::StorageError> {
    let manager = async_bb8_diesel::ConnectionManager::<PgConnection>::new(
        database.connection_url(),
    );
    bb8::Pool::builder()
        .max_size(database.pool_size)
        .build(manager)
        .await
        .into_report()
        .change_context(errors::StorageError::DatabaseConnectionError)
        .attach_printable("Failed to create PostgreSQL connection pool")
}

pub async fn pg_connection_write(
    store: &Store,
) -> errors::CustomResult<
    PooledConnection<'_, async_bb8_diesel::ConnectionManager<PgConnection>>,
    errors::StorageError,
> {
    store
        .master_pool
        .get()
        .await
        .into_report()
        .change_context(errors::StorageError::DatabaseConnectionError)
}

pub async fn pg_connection_read(
    store: &Store,
) -> errors::CustomResult<
    PooledConnection<'_, async_bb8_diesel::ConnectionManager<PgConnection>>,
    errors::StorageError,
> {
    // Reads go to the same pool; a replica pool can be swapped in here
    // without touching call sites.
    pg_connection_write(store).await
}
