//! Identity and claim model.
//!
//! A [`Principal`] is the set of identities attached to one browser session. Each
//! [`Identity`] is tagged with the issuer that authenticated it and carries the claims
//! collected while that identity was created.

use serde::{Deserialize, Serialize};

/// A typed fact attached to an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// An identity issued by a single authority.
///
/// Claims are append-only: once attached they are never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    authentication_type: String,
    claims: Vec<Claim>,
}

impl Identity {
    /// Create an empty identity for the given issuer.
    pub fn new(authentication_type: impl Into<String>) -> Self {
        Self {
            authentication_type: authentication_type.into(),
            claims: Vec::new(),
        }
    }

    /// The issuer that authenticated this identity.
    pub fn authentication_type(&self) -> &str {
        &self.authentication_type
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn add_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    pub fn add_claims(&mut self, claims: impl IntoIterator<Item = Claim>) {
        self.claims.extend(claims);
    }

    /// Value of the first claim of the given type, if any.
    pub fn find_first(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|claim| claim.claim_type == claim_type)
            .map(|claim| claim.value.as_str())
    }
}

/// The identities attached to one authenticated session.
///
/// Holds at most one identity per issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    identities: Vec<Identity>,
}

impl Principal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    /// True if one of the identities was issued by `issuer`.
    pub fn has_issuer(&self, issuer: &str) -> bool {
        self.identity_for(issuer).is_some()
    }

    pub fn identity_for(&self, issuer: &str) -> Option<&Identity> {
        self.identities
            .iter()
            .find(|identity| identity.authentication_type == issuer)
    }

    /// Attach an identity, replacing any previous identity from the same issuer.
    pub fn add_identity(&mut self, identity: Identity) {
        self.identities
            .retain(|existing| existing.authentication_type != identity.authentication_type);
        self.identities.push(identity);
    }

    /// Drop the identity issued by `issuer`, returning it if present.
    pub fn remove_issuer(&mut self, issuer: &str) -> Option<Identity> {
        let position = self
            .identities
            .iter()
            .position(|identity| identity.authentication_type == issuer)?;
        Some(self.identities.remove(position))
    }
}
