//! Mapping of provider user-info payloads to local claims.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{claims_error, ClaimsErrorKind, Error};
use crate::identity::Claim;

/// Declared table of `provider_field -> local_claim_type`.
///
/// Fields are applied in key order so the produced claims are stable for a given payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimMap {
    fields: BTreeMap<String, String>,
}

impl ClaimMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `provider_field` onto `claim_type`. A later mapping of the same field wins.
    pub fn map_json_key(mut self, claim_type: impl Into<String>, provider_field: impl Into<String>) -> Self {
        self.fields.insert(provider_field.into(), claim_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse `field=claim_type` entries, as they come from configuration.
    pub fn from_entries<I, T>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        entries
            .into_iter()
            .filter(|entry| !entry.as_ref().trim().is_empty())
            .try_fold(Self::new(), |map, entry| {
                let entry = entry.as_ref();
                match entry.split_once('=') {
                    Some((field, claim_type))
                        if !field.trim().is_empty() && !claim_type.trim().is_empty() =>
                    {
                        Ok(map.map_json_key(claim_type.trim(), field.trim()))
                    }
                    _ => Err(claims_error(
                        ClaimsErrorKind::InvalidMapping,
                        &format!("Expected `field=claim_type`, got `{}`", entry),
                    )),
                }
            })
    }
}

impl FromStr for ClaimMap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_entries(s.split(','))
    }
}

/// Translate a user-info payload into claims using `map`.
///
/// Unmapped fields are ignored. Scalar values become one claim each, arrays yield one
/// claim per scalar element, and nested objects, nulls and empty strings are skipped.
pub fn map_claims(payload: &Map<String, Value>, map: &ClaimMap) -> Vec<Claim> {
    let mut claims = Vec::new();
    for (field, claim_type) in &map.fields {
        match payload.get(field) {
            Some(Value::Array(items)) => claims.extend(
                items
                    .iter()
                    .filter_map(scalar_value)
                    .map(|value| Claim::new(claim_type.as_str(), value)),
            ),
            Some(value) => {
                if let Some(value) = scalar_value(value) {
                    claims.push(Claim::new(claim_type.as_str(), value));
                }
            }
            None => {}
        }
    }
    claims
}

/// Read the tenant identifier out of the inbound redirect's query parameters.
///
/// The tenant id is mandatory, so an absent or blank parameter is an error.
pub fn tenant_claim(
    query: &HashMap<String, String>,
    query_param: &str,
    claim_type: &str,
) -> Result<Claim, Error> {
    match query.get(query_param) {
        Some(value) if !value.is_empty() => Ok(Claim::new(claim_type, value.as_str())),
        _ => Err(claims_error(
            ClaimsErrorKind::MissingTenant,
            &format!("Query parameter `{}` is missing from the redirect", query_param),
        )),
    }
}

fn scalar_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    fn sub_and_email() -> ClaimMap {
        ClaimMap::new()
            .map_json_key("nameidentifier", "sub")
            .map_json_key("email", "email")
    }

    #[test]
    fn test_maps_declared_fields() {
        let user = payload(json!({"sub": "123", "email": "a@b.com"}));
        let mut claims = map_claims(&user, &sub_and_email());
        claims.sort_by(|a, b| a.claim_type.cmp(&b.claim_type));

        assert_eq!(
            claims,
            vec![
                Claim::new("email", "a@b.com"),
                Claim::new("nameidentifier", "123"),
            ]
        );
    }

    #[test]
    fn test_unmapped_fields_are_ignored() {
        let user = payload(json!({"sub": "123", "givenName": "Ada", "unknown": {"a": 1}}));
        let claims = map_claims(&user, &sub_and_email());
        assert_eq!(claims, vec![Claim::new("nameidentifier", "123")]);
    }

    #[test]
    fn test_mapping_is_idempotent() {
        let user = payload(json!({"sub": "123", "email": "a@b.com", "phoneNumber": "555"}));
        let map = sub_and_email().map_json_key("mobilephone", "phoneNumber");
        assert_eq!(map_claims(&user, &map), map_claims(&user, &map));
    }

    #[test]
    fn test_scalar_kinds_and_skipped_values() {
        let user = payload(json!({
            "emailVerified": true,
            "age": 42,
            "email": "",
            "address": {"locality": "Mountain View"},
            "sub": null,
            "roles": ["admin", "", {"x": 1}, 7]
        }));
        let map = ClaimMap::new()
            .map_json_key("emailverified", "emailVerified")
            .map_json_key("age", "age")
            .map_json_key("email", "email")
            .map_json_key("address", "address")
            .map_json_key("nameidentifier", "sub")
            .map_json_key("role", "roles");

        let claims = map_claims(&user, &map);
        assert_eq!(
            claims,
            vec![
                Claim::new("age", "42"),
                Claim::new("emailverified", "true"),
                Claim::new("role", "admin"),
                Claim::new("role", "7"),
            ]
        );
    }

    #[test]
    fn test_parse_from_config_entries() {
        let map: ClaimMap = "sub=nameidentifier, email=email".parse().unwrap();
        assert_eq!(map, sub_and_email());
    }

    #[test]
    fn test_parse_rejects_malformed_entry() {
        let result = ClaimMap::from_entries(["sub=nameidentifier", "email"]);
        assert!(matches!(
            result,
            Err(Error {
                error_kind: ErrorKind::Claims(ClaimsErrorKind::InvalidMapping),
                ..
            })
        ));
    }

    #[test]
    fn test_tenant_claim_is_copied_verbatim() {
        let query = HashMap::from([
            ("code".to_string(), "abc".to_string()),
            ("realmId".to_string(), "Q999".to_string()),
        ]);
        let claim = tenant_claim(&query, "realmId", "realmId").unwrap();
        assert_eq!(claim, Claim::new("realmId", "Q999"));
    }

    #[test]
    fn test_tenant_claim_missing_or_blank() {
        let missing = HashMap::from([("code".to_string(), "abc".to_string())]);
        let blank = HashMap::from([("realmId".to_string(), String::new())]);

        for query in [missing, blank] {
            let result = tenant_claim(&query, "realmId", "realmId");
            assert!(matches!(
                result,
                Err(Error {
                    error_kind: ErrorKind::Claims(ClaimsErrorKind::MissingTenant),
                    ..
                })
            ));
        }
    }
}
