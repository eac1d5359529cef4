//! QuickBooks Online accounting API client.
//!
//! Issues one authenticated query against a company (tenant) and pulls a single display
//! field out of the first entity in the response.

use connect_auth::http::{read_text, send, Backchannel};
use log::*;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use service::config::Config;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{
    DomainErrorKind, Error, InternalErrorKind, SchemaErrorKind, UsageErrorKind,
};

/// Outer key of every query response.
pub const QUERY_RESPONSE_KEY: &str = "QueryResponse";

/// A query in the accounting API's own query language, plus where to find the answer.
///
/// The query text is opaque here: it is URL-encoded, never parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    /// Key of the entity array inside the query response, e.g. `Customer`.
    pub entity: String,
    /// Field read from the first entity, e.g. `DisplayName`.
    pub display_field: String,
}

impl Query {
    pub fn new(
        text: impl Into<String>,
        entity: impl Into<String>,
        display_field: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            entity: entity.into(),
            display_field: display_field.into(),
        }
    }

    /// The display name of one customer of the company.
    pub fn first_customer() -> Self {
        Self::new("select * from Customer MAXRESULTS 1", "Customer", "DisplayName")
    }
}

/// Accounting API client bound to a base URL and API minor version.
pub struct Client {
    http_client: Backchannel,
    base_url: Url,
    minor_version: String,
}

impl Client {
    /// Create a new client. `base_url` is the company collection, e.g.
    /// `https://sandbox-quickbooks.api.intuit.com/v3/company`.
    pub fn new(http_client: Backchannel, base_url: &str, minor_version: &str) -> Result<Self, Error> {
        let base_url = Url::parse(base_url).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::new(
                DomainErrorKind::Internal(InternalErrorKind::Config),
                "Accounting API base URL cannot carry path segments",
            ));
        }

        Ok(Self {
            http_client,
            base_url,
            minor_version: minor_version.to_string(),
        })
    }

    pub fn from_config(config: &Config, http_client: Backchannel) -> Result<Self, Error> {
        Self::new(
            http_client,
            &config.accounting_api_base_url,
            &config.accounting_api_minor_version,
        )
    }

    /// `<base>/<tenant_id>/query?query=<text>&minorversion=<version>`
    pub fn query_url(&self, tenant_id: &str, query_text: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(tenant_id).push("query");
        }
        url.query_pairs_mut()
            .append_pair("query", query_text)
            .append_pair("minorversion", &self.minor_version);
        url
    }

    /// Run `query` for `tenant_id` and return the display field of the first entity.
    ///
    /// A blank access token or tenant id is rejected before any request is issued.
    pub async fn query_display_field(
        &self,
        access_token: &SecretString,
        tenant_id: &str,
        query: &Query,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        if access_token.expose_secret().is_empty() {
            return Err(Error::new(
                DomainErrorKind::Usage(UsageErrorKind::MissingAccessToken),
                "An access token is required to call the accounting API",
            ));
        }
        if tenant_id.is_empty() {
            return Err(Error::new(
                DomainErrorKind::Usage(UsageErrorKind::MissingTenantId),
                "A tenant id is required to call the accounting API",
            ));
        }

        let url = self.query_url(tenant_id, &query.text);
        debug!("Querying accounting API for {} of tenant {}", query.entity, tenant_id);

        let request = self
            .http_client
            .get(url)
            .bearer_auth(access_token.expose_secret())
            .header(ACCEPT, "application/json");

        let response = send(request, cancel)
            .await
            .inspect_err(|e| warn!("Accounting API query failed: {}", e))?;
        let body = read_text(response, cancel).await?;

        let json: Value = serde_json::from_str(&body).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::Schema(SchemaErrorKind::Unexpected(
                "Accounting API response is not JSON".to_string(),
            )),
        })?;

        extract_display_field(&json, query)
    }
}

/// Read `QueryResponse.<entity>[0].<display_field>` out of a query response.
///
/// A missing or empty entity array is `NoResult`. Anything else that does not match the
/// expected shape is `Unexpected`.
pub fn extract_display_field(response: &Value, query: &Query) -> Result<String, Error> {
    let query_response = response
        .get(QUERY_RESPONSE_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| unexpected(format!("`{}` object is missing", QUERY_RESPONSE_KEY)))?;

    // The API leaves the entity key out entirely when nothing matched.
    let entities = match query_response.get(&query.entity) {
        None => return Err(no_result(query)),
        Some(Value::Array(entities)) => entities,
        Some(_) => return Err(unexpected(format!("`{}` is not an array", query.entity))),
    };

    let first = entities.first().ok_or_else(|| no_result(query))?;

    first
        .get(&query.display_field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            unexpected(format!(
                "`{}` has no string field `{}`",
                query.entity, query.display_field
            ))
        })
}

fn no_result(query: &Query) -> Error {
    Error::new(
        DomainErrorKind::Schema(SchemaErrorKind::NoResult),
        &format!("The query returned no {} records", query.entity),
    )
}

fn unexpected(message: String) -> Error {
    Error {
        source: Some(message.clone().into()),
        error_kind: DomainErrorKind::Schema(SchemaErrorKind::Unexpected(message)),
    }
}
