mod attrs;
mod impls;

use proc_macro::TokenStream;

/// Implements `Bean` and `Injectable` for a struct.
///
/// Every field of type `Inject<T>` becomes a dependency point named after
/// the field. A point may be customized with `#[inject(...)]`:
///
/// - `ref = "name"` wires the point to the bean registered under `name`,
/// - `strict`, `optional` or `none` overrides the bean's wiring mode for
///   this point.
#[proc_macro_derive(Bean, attributes(inject))]
pub fn derive_bean(item: TokenStream) -> TokenStream {
    match impls::expand_implementation(item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}
