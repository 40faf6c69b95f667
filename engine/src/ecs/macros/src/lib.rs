mod component;

use proc_macro::TokenStream;

/// Derive `blaze_engine::ecs::Component` for a struct.
///
/// The registered name defaults to the struct identifier and the associated system defaults to
/// `NoopSystem`. Both can be overridden:
///
/// ```rust,ignore
/// #[derive(Component, Default)]
/// #[component(name = "Position", system = MovementSystem)]
/// struct Position { x: f32, y: f32 }
/// ```
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(item: TokenStream) -> TokenStream {
    component::derive_component(item)
}
