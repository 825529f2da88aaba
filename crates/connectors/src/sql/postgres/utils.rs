use crate::error::ConnectorError;
use native_tls::{Certificate, TlsConnector};
use postgres_native_tls::MakeTlsConnector;
use std::path::Path;
use tokio_postgres::{Client, Config, NoTls, config::SslMode};
use tracing::{error, warn};

/// Connects honouring the `sslmode` of the connection string. `root_cert`
/// is an extra PEM file trusted for TLS connections.
pub async fn connect_client(
    conn_str: &str,
    root_cert: Option<&Path>,
) -> Result<Client, ConnectorError> {
    let config = conn_str
        .parse::<Config>()
        .map_err(|e| ConnectorError::InvalidUrl(e.to_string()))?;
    let ssl_mode = config.get_ssl_mode();

    match ssl_mode {
        SslMode::Disable => connect_without_tls(config).await,
        SslMode::Prefer => match connect_with_tls(config.clone(), root_cert).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                connect_without_tls(config).await
            }
        },
        _ => connect_with_tls(config, root_cert).await,
    }
}

pub(crate) async fn connect_with_tls(
    config: Config,
    root_cert: Option<&Path>,
) -> Result<Client, ConnectorError> {
    let mut builder = TlsConnector::builder();
    if let Some(path) = root_cert {
        let pem = std::fs::read(path).map_err(|source| ConnectorError::RootCert {
            path: path.display().to_string(),
            source,
        })?;
        builder.add_root_certificate(Certificate::from_pem(&pem)?);
    }
    let connector = builder.build()?;
    let tls = MakeTlsConnector::new(connector);
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

pub(crate) async fn connect_without_tls(config: Config) -> Result<Client, ConnectorError> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}
