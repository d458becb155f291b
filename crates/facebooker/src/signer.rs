//! Request signing.
//!
//! Every `key=value` pair is rendered, the rendered strings are sorted
//! byte-wise, concatenated without separators, and the active secret is
//! appended. The MD5 digest of that UTF-8 byte string, in lowercase hex, is the
//! `sig` parameter. MD5 is fixed by the wire protocol.

use std::collections::BTreeMap;

use md5::{Digest, Md5};

use crate::Secret;

/// Name of the form field that carries the signature.
pub const SIGNATURE_PARAMETER: &str = "sig";

/// A request signature (lowercase hex MD5).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    /// Returns the signature as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signs `parameters` with `secret`.
///
/// Pure and deterministic. An empty parameter set signs the secret alone.
pub fn sign(parameters: &BTreeMap<String, String>, secret: &Secret) -> Signature {
    let mut pairs: Vec<String> = parameters
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    pairs.sort_unstable();

    let mut hasher = Md5::new();
    for pair in &pairs {
        hasher.update(pair.as_bytes());
    }
    hasher.update(secret.expose().as_bytes());
    Signature(hex::encode(hasher.finalize()))
}

/// A parameter set together with its signature.
///
/// The parameters are frozen once signed; [`SignedRequest::into_form`] yields
/// exactly those parameters plus the signature field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    parameters: BTreeMap<String, String>,
    signature: Signature,
}

impl SignedRequest {
    /// Signs `parameters` with `secret`.
    pub fn new(parameters: BTreeMap<String, String>, secret: &Secret) -> Self {
        let signature = sign(&parameters, secret);
        Self {
            parameters,
            signature,
        }
    }

    /// The signed parameters, without the signature field.
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// The computed signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The form to submit: every signed parameter, then `sig`.
    pub fn into_form(self) -> Vec<(String, String)> {
        let mut form: Vec<(String, String)> = self.parameters.into_iter().collect();
        form.push((SIGNATURE_PARAMETER.to_owned(), self.signature.0));
        form
    }
}
