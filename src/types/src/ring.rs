// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The consistent-hash ring over the storage cluster.

use std::collections::BTreeSet;
use std::fmt;

/// An opaque, lexicographically ordered point on the storage cluster's
/// consistent-hash ring.
///
/// Tokens are compared and ordered as their underlying string
/// representation; the rollup daemon never computes a token itself, it
/// only relays tokens reported by the storage cluster's system interface.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Token(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Token(raw)
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Token(raw.to_string())
    }
}

/// A storage-cluster node address, e.g. an IP or hostname.
pub type Endpoint = String;

/// A contiguous arc of the ring, owned by a set of endpoints.
///
/// `start_token` is exclusive and `end_token` is inclusive, matching the
/// storage cluster's own ring convention (`SPEC_FULL.md` §3).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenRange {
    pub start_token: Token,
    pub end_token: Token,
    pub endpoints: BTreeSet<Endpoint>,
}

impl TokenRange {
    pub fn new(
        start_token: Token,
        end_token: Token,
        endpoints: impl IntoIterator<Item = Endpoint>,
    ) -> Self {
        TokenRange {
            start_token,
            end_token,
            endpoints: endpoints.into_iter().collect(),
        }
    }

    /// Encodes the range the way the coordination service's lock paths
    /// expect it: `"<start>:<end>"`.
    pub fn encode(&self) -> String {
        format!("{}:{}", self.start_token, self.end_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_joins_start_and_end_with_a_colon() {
        let range = TokenRange::new(
            Token::new("t1"),
            Token::new("t2"),
            vec!["10.0.0.1".to_string()],
        );
        assert_eq!(range.encode(), "t1:t2");
    }
}
