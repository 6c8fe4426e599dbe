//! Correlation of outbound-call candidates with declared RPC methods.
//!
//! Edge inference asks a [`MatcherChain`] for each candidate id. The chain
//! tries its exact matcher first and then its fuzzy matchers by descending
//! priority; the first hit wins. Swapping matchers changes which `calls`
//! edges appear without touching the builder.

use crate::graph::types::RpcMethod;
use crate::ids;

/// One strategy for finding the RPC method a candidate id refers to.
pub trait RpcMatcher: Send + Sync {
    /// Matcher name (for warnings and logs).
    fn name(&self) -> &'static str;

    fn find<'m>(&self, candidate: &str, methods: &'m [RpcMethod]) -> Option<&'m RpcMethod>;

    /// Higher runs first among fuzzy matchers.
    fn priority(&self) -> i32 {
        0
    }
}

/// Case-sensitive id equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl RpcMatcher for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn find<'m>(&self, candidate: &str, methods: &'m [RpcMethod]) -> Option<&'m RpcMethod> {
        methods.iter().find(|m| m.id == candidate)
    }
}

/// The candidate's lower-cased service segment (`orderservice` for
/// `grpc:OrderService.CreateOrder`) as a substring of a method's
/// lower-cased id. First method in declaration order wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceSubstringMatcher;

impl RpcMatcher for ServiceSubstringMatcher {
    fn name(&self) -> &'static str {
        "service-substring"
    }

    fn find<'m>(&self, candidate: &str, methods: &'m [RpcMethod]) -> Option<&'m RpcMethod> {
        let lowered = candidate.to_lowercase();
        let segment = ids::service_segment(&lowered)?;
        methods
            .iter()
            .find(|m| m.id.to_lowercase().contains(segment))
    }
}

/// Result of resolving one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome<'m> {
    Exact(&'m RpcMethod),
    Fuzzy {
        method: &'m RpcMethod,
        matcher: &'static str,
    },
    Unmatched,
}

impl<'m> MatchOutcome<'m> {
    pub fn method(&self) -> Option<&'m RpcMethod> {
        match self {
            MatchOutcome::Exact(m) | MatchOutcome::Fuzzy { method: m, .. } => Some(m),
            MatchOutcome::Unmatched => None,
        }
    }
}

/// Exact matcher plus ranked fuzzy fallbacks.
pub struct MatcherChain {
    exact: Box<dyn RpcMatcher>,
    fuzzy: Vec<Box<dyn RpcMatcher>>,
}

impl Default for MatcherChain {
    fn default() -> Self {
        Self::strict().with_fuzzy(Box::new(ServiceSubstringMatcher))
    }
}

impl std::fmt::Debug for MatcherChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatcherChain")
            .field("exact", &self.exact.name())
            .field(
                "fuzzy",
                &self.fuzzy.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl MatcherChain {
    /// Exact matching only.
    pub fn strict() -> Self {
        Self {
            exact: Box::new(ExactMatcher),
            fuzzy: Vec::new(),
        }
    }

    pub fn with_exact(mut self, exact: Box<dyn RpcMatcher>) -> Self {
        self.exact = exact;
        self
    }

    pub fn with_fuzzy(mut self, matcher: Box<dyn RpcMatcher>) -> Self {
        self.fuzzy.push(matcher);
        // Stable: equal priorities keep insertion order.
        self.fuzzy.sort_by_key(|m| std::cmp::Reverse(m.priority()));
        self
    }

    pub fn resolve<'m>(&self, candidate: &str, methods: &'m [RpcMethod]) -> MatchOutcome<'m> {
        if let Some(method) = self.exact.find(candidate, methods) {
            return MatchOutcome::Exact(method);
        }
        for matcher in &self.fuzzy {
            if let Some(method) = matcher.find(candidate, methods) {
                return MatchOutcome::Fuzzy {
                    method,
                    matcher: matcher.name(),
                };
            }
        }
        MatchOutcome::Unmatched
    }
}
