//! Connection helper shared by the binaries, the server and the tests.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Everything but the RFC 3986 unreserved characters.
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Open a connection pool for `url`.
///
/// SQLite gets a single pooled connection: every transaction then runs one
/// after the other, so the conditional stock decrement can never race
/// against a concurrent writer. MySQL keeps the default pool and relies on
/// InnoDB row locks.
pub async fn open(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(url.to_owned());
    if url.starts_with("sqlite:") {
        options.max_connections(1).min_connections(1);
    }
    options.sqlx_logging(false);
    Database::connect(options).await
}

/// Build a MySQL connection URL from its parts. User and password are
/// percent-encoded, so any character may appear in them.
#[must_use]
pub fn mysql_url(host: &str, port: u16, user: &str, password: &str, database: &str) -> String {
    format!(
        "mysql://{}:{}@{host}:{port}/{database}",
        utf8_percent_encode(user, USERINFO),
        utf8_percent_encode(password, USERINFO),
    )
}
