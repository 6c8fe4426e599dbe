//! Canonical identifiers shared by every layer.
//!
//! All ids are `<prefix>:<discriminator>`:
//!
//! | layer    | id                                  |
//! |----------|-------------------------------------|
//! | screen   | `screen:/products/[id]`, `screen:<ns>:/route` |
//! | GraphQL  | `gql:<kind>.<fieldName>`            |
//! | resolver | `resolver:<Owner>.<method>`         |
//! | RPC      | `grpc:<Service>.<Method>`           |

use crate::graph::types::OperationKind;

pub const SCREEN_PREFIX: &str = "screen";
pub const GQL_PREFIX: &str = "gql";
pub const RESOLVER_PREFIX: &str = "resolver";
pub const GRPC_PREFIX: &str = "grpc";

pub fn screen_id(namespace: Option<&str>, route: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}:{}:{}", SCREEN_PREFIX, ns, route),
        _ => format!("{}:{}", SCREEN_PREFIX, route),
    }
}

pub fn operation_id(kind: OperationKind, field_name: &str) -> String {
    format!("{}:{}.{}", GQL_PREFIX, kind, field_name)
}

pub fn resolver_id(owner: &str, method: &str) -> String {
    format!("{}:{}.{}", RESOLVER_PREFIX, owner, method)
}

pub fn rpc_id(service: &str, method: &str) -> String {
    format!("{}:{}.{}", GRPC_PREFIX, service, method)
}

/// Split `prefix:rest` at the first colon.
pub fn split_prefix(id: &str) -> Option<(&str, &str)> {
    id.split_once(':')
}

/// The segment after the prefix and before the first `.`, e.g. `OrderService`
/// for `grpc:OrderService.CreateOrder`.
pub fn service_segment(id: &str) -> Option<&str> {
    let (_, rest) = split_prefix(id)?;
    let segment = rest.split('.').next().unwrap_or(rest);
    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

/// Upper-case the first character, leave the rest alone (`getUser` -> `GetUser`).
pub fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Candidate RPC id for a `this.<member>.<method>(...)` call.
///
/// `orderClient` -> `grpc:OrderService.<Method>`; `grpcUserService` ->
/// `grpc:UserService.<Method>`. Returns `None` when nothing is left of the
/// member name after stripping.
pub fn rpc_id_from_member(member: &str, method: &str) -> Option<String> {
    let mut base = strip_suffix_ignore_case(member, "client");
    base = strip_suffix_ignore_case(base, "service");
    base = strip_prefix_ignore_case(base, "grpc");
    if base.is_empty() {
        return None;
    }
    Some(rpc_id(
        &format!("{}Service", title_case(base)),
        &title_case(method),
    ))
}

/// Guess the kind of an operation from its imported binding name.
pub fn guess_operation_kind(name: &str) -> OperationKind {
    let lower = name.to_lowercase();
    if ["mutation", "create", "update", "delete"]
        .iter()
        .any(|hint| lower.contains(hint))
    {
        OperationKind::Mutation
    } else {
        OperationKind::Query
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> &'a str {
    if s.len() >= suffix.len() && s.is_char_boundary(s.len() - suffix.len()) {
        let (head, tail) = s.split_at(s.len() - suffix.len());
        if tail.eq_ignore_ascii_case(suffix) {
            return head;
        }
    }
    s
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> &'a str {
    if s.len() >= prefix.len() && s.is_char_boundary(prefix.len()) {
        let (head, tail) = s.split_at(prefix.len());
        if head.eq_ignore_ascii_case(prefix) {
            return tail;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_ids() {
        assert_eq!(screen_id(None, "/about"), "screen:/about");
        assert_eq!(screen_id(Some("web"), "/about"), "screen:web:/about");
        assert_eq!(screen_id(Some(""), "/"), "screen:/");
    }

    #[test]
    fn test_layer_ids() {
        assert_eq!(operation_id(OperationKind::Query, "GetUser"), "gql:query.GetUser");
        assert_eq!(
            operation_id(OperationKind::Subscription, "orderUpdated"),
            "gql:subscription.orderUpdated"
        );
        assert_eq!(resolver_id("UserResolver", "user"), "resolver:UserResolver.user");
        assert_eq!(rpc_id("UserService", "GetUser"), "grpc:UserService.GetUser");
    }

    #[test]
    fn test_service_segment() {
        assert_eq!(
            service_segment("grpc:OrderService.CreateOrder"),
            Some("OrderService")
        );
        assert_eq!(service_segment("grpc:Bare"), Some("Bare"));
        assert_eq!(service_segment("grpc:.Method"), None);
        assert_eq!(service_segment("no-prefix"), None);
    }

    #[test]
    fn test_rpc_id_from_member() {
        assert_eq!(
            rpc_id_from_member("orderClient", "createOrder").as_deref(),
            Some("grpc:OrderService.CreateOrder")
        );
        assert_eq!(
            rpc_id_from_member("userService", "getUser").as_deref(),
            Some("grpc:UserService.GetUser")
        );
        assert_eq!(
            rpc_id_from_member("grpcPayment", "charge").as_deref(),
            Some("grpc:PaymentService.Charge")
        );
        // Client suffix is stripped before Service.
        assert_eq!(
            rpc_id_from_member("inventoryServiceClient", "reserve").as_deref(),
            Some("grpc:InventoryService.Reserve")
        );
        assert_eq!(rpc_id_from_member("client", "send"), None);
        assert_eq!(rpc_id_from_member("grpcService", "send"), None);
    }

    #[test]
    fn test_guess_operation_kind() {
        assert_eq!(guess_operation_kind("CreateOrderDocument"), OperationKind::Mutation);
        assert_eq!(guess_operation_kind("DELETE_USER"), OperationKind::Mutation);
        assert_eq!(guess_operation_kind("updateProfileMutation"), OperationKind::Mutation);
        assert_eq!(guess_operation_kind("GetUserQuery"), OperationKind::Query);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("getUser"), "GetUser");
        assert_eq!(title_case(""), "");
        assert_eq!(title_case("X"), "X");
    }
}
