use diesel::pg::PgConnection;
use diesel::prelude::*;

/// Establish a single, unpooled database connection. Used by
/// `DatabaseContext::new` to fail fast before standing up the pool.
pub fn establish_connection(database_url: &str) -> Result<PgConnection, diesel::ConnectionError> {
  PgConnection::establish(database_url)
}
