use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr, Path, parse_macro_input};

/// Options collected from `#[component(...)]` attributes.
#[derive(Default)]
struct Options {
    name: Option<LitStr>,
    system: Option<Path>,
}

impl Options {
    fn parse(ast: &DeriveInput) -> syn::Result<Self> {
        let mut options = Self::default();
        for attr in ast.attrs.iter().filter(|a| a.path().is_ident("component")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    options.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("system") {
                    options.system = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `name` or `system`"))
                }
            })?;
        }
        Ok(options)
    }
}

pub fn derive_component(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let options = match Options::parse(&ast) {
        Ok(options) => options,
        Err(err) => return err.to_compile_error().into(),
    };

    let struct_name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let name = options
        .name
        .unwrap_or_else(|| LitStr::new(&struct_name.to_string(), struct_name.span()));

    // Use ::blaze_engine paths which work both inside and outside the crate.
    // Inside the crate, this works because of `extern crate self as blaze_engine;` in lib.rs
    let system = match options.system {
        Some(path) => quote! { #path },
        None => quote! { ::blaze_engine::ecs::system::NoopSystem },
    };

    TokenStream::from(quote! {
        impl #impl_generics ::blaze_engine::ecs::Component for #struct_name #ty_generics #where_clause {
            const NAME: &'static str = #name;
            type System = #system;
        }
    })
}
