//! Procedural macros for tributary.
//!
//! Use through the `tributary` crate with the `macros` feature enabled.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod event;

/// Derive macro for the `Event` trait.
///
/// # Structs
///
/// The routing name defaults to the type name and can be set with
/// `#[event(name = "...")]`. Mark one field `#[event(timestamp)]` to derive
/// `Timestamped` and one field `#[event(payload)]` to derive `WithPayload`.
///
/// ```rust,ignore
/// #[derive(tributary::Event)]
/// #[event(name = "order.placed")]
/// struct OrderPlaced {
///     #[event(timestamp)]
///     at: std::time::SystemTime,
///     #[event(payload)]
///     order: Order,
/// }
/// ```
///
/// # Enums
///
/// Each variant routes under its own name, overridable per variant:
///
/// ```rust,ignore
/// #[derive(tributary::Event)]
/// enum Session {
///     #[event(name = "session.opened")]
///     Opened { id: u64 },
///     Closed(u64),
/// }
/// ```
#[proc_macro_derive(Event, attributes(event))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    event::derive_event_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
