//! cli::commands::connection
//!
//! `test-connection`: check the selected connection.

use anyhow::{bail, Result};

use crate::cli::Context;
use crate::store::LakeFsClient;
use crate::ui::output;

/// Check the connection and report the outcome.
///
/// An unknown connection id is an error. A descriptor that does not resolve
/// (missing host or credentials) is reported like any other failed check.
pub async fn test_connection(ctx: &Context) -> Result<()> {
    let connection = ctx.config.connection(&ctx.conn_id)?;

    let (ok, message) = match LakeFsClient::build(&connection) {
        Ok(client) => {
            client
                .with_settings(ctx.config.client_settings())
                .test_connection()
                .await
        }
        Err(e) => (false, e.to_string()),
    };

    if !ok {
        bail!("connection '{}' failed: {}", ctx.conn_id, message);
    }
    output::print(message, ctx.verbosity);
    Ok(())
}
