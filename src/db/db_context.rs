use crate::app_config::AppConfig;
use crate::errors::{ErrorKind, Result, ResultExt};
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::{r2d2, PgConnection};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub struct DbContext {
    pub db_pool: DbPool,
}

impl DbContext {
    pub fn get_conn(&self) -> Result<DbConnection> {
        self.db_pool
            .get()
            .chain_err(|| "Failed to get connection from pool")
    }

    pub fn new(db_pool: DbPool) -> DbContext {
        DbContext { db_pool }
    }

    pub fn from_config(config: &AppConfig) -> Result<DbContext> {
        let url = match &config.database_url {
            Some(url) => url,
            None => {
                return Err(ErrorKind::InvalidConfig(
                    "DATABASE_URL is required without a destination file".into(),
                )
                .into())
            }
        };

        Ok(DbContext::new(DbContext::custom_pool(
            url,
            config.database_pool_size,
        )?))
    }

    pub(crate) fn custom_pool(connspec: &str, pool_size: u32) -> Result<DbPool> {
        if pool_size < 1 {
            return Err(ErrorKind::InvalidConfig("Pool size must be at least 1".into()).into());
        }
        let manager = ConnectionManager::<PgConnection>::new(connspec);

        r2d2::Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .chain_err(|| "Failed to create pool")
    }
}
