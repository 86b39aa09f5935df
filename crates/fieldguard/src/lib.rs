//! # fieldguard: rule-based authorization for API resolvers
//!
//! Sits between a resolver and its caller. Operators declare, per operation,
//! who may call the resolver and which fields of its result they may see.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Guarded call                                │
//! │  (operation, attrs, context, resolver)       │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  RuleRegistry                                │
//! │  └─ Rules for the operation, newest first    │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Matcher                                     │
//! │  ├─ Always        → match                    │
//! │  ├─ TypeMatch     → caller kind equals       │
//! │  └─ Predicate     → fn(resource, context)    │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  ResponseFilter                              │
//! │  - Whitelisted fields kept                   │
//! │  - Everything else set to null               │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Precedence
//!
//! Rules are checked in reverse order to how they were declared; the first
//! one that matches is used. An operation without rules denies every caller.
//!
//! ## Examples
//!
//! ```
//! use fieldguard::{AuthError, Guard, Identity, Pattern, RequestContext, RuleRegistry, WhitelistSpec};
//! use serde_json::{Value, json};
//!
//! let registry = RuleRegistry::builder()
//!     // Anyone may see a user's public profile.
//!     .rule_with_whitelist("user", Pattern::Always, WhitelistSpec::fields(["name"]))
//!     // Users see their own record in full.
//!     .rule(
//!         "user",
//!         Pattern::predicate("owner", |resource, ctx| {
//!             ctx.current_user()
//!                 .and_then(|me| me.attribute("id"))
//!                 .is_some_and(|id| resource.get("id") == Some(id))
//!         }),
//!     )
//!     .build();
//!
//! let guard = Guard::new(registry).without_audit();
//! let resolver = |_: &Value, _: &RequestContext| Ok(json!({ "id": 3, "name": "Greg" }));
//!
//! let me = RequestContext::for_user(Identity::new("User").with_attribute("id", 3));
//! assert_eq!(
//!     guard.with_auth("user", &json!({}), &me, resolver)?,
//!     json!({ "id": 3, "name": "Greg" })
//! );
//!
//! let stranger = RequestContext::anonymous();
//! assert_eq!(
//!     guard.with_auth("user", &json!({}), &stranger, resolver)?,
//!     json!({ "id": null, "name": "Greg" })
//! );
//!
//! assert_eq!(
//!     guard.with_auth("post", &json!({}), &stranger, resolver),
//!     Err(AuthError::Unauthorized)
//! );
//! # Ok::<(), AuthError>(())
//! ```

pub mod error;
pub mod filter;
pub mod guard;
pub mod identity;
pub mod matcher;
pub mod pattern;
pub mod registry;
pub mod rule;
pub mod whitelist;

// Re-export commonly used types
pub use error::{AuthError, Result};
pub use filter::{IMPLICIT_KEYS, ResponseFilter};
pub use guard::{Guard, Response};
pub use identity::{Identity, RequestContext};
pub use pattern::{Pattern, Predicate};
pub use registry::{RegistryBuilder, RuleRegistry};
pub use rule::{OperationName, Rule};
pub use whitelist::{WhitelistEntry, WhitelistSpec};
