use darling::util::PathList;
use darling::FromDeriveInput;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

#[derive(FromDeriveInput)]
#[darling(attributes(component), supports(struct_any))]
struct ComponentArgs {
    ident: syn::Ident,
    generics: syn::Generics,
    #[darling(default)]
    capabilities: PathList,
}

pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match ComponentArgs::from_derive_input(&input) {
        Ok(args) => TokenStream::from(generate_component_impl(&args)),
        Err(e) => TokenStream::from(e.write_errors()),
    }
}

fn generate_component_impl(args: &ComponentArgs) -> TokenStream2 {
    let struct_name = &args.ident;
    let (impl_generics, ty_generics, where_clause) = args.generics.split_for_impl();

    if args.capabilities.is_empty() {
        return quote! {
            impl #impl_generics ::moss::Component for #struct_name #ty_generics #where_clause {}
        };
    }

    let exposures = args.capabilities.iter().map(|path| {
        quote! {
            caps.expose::<dyn #path>(|c| c as ::std::sync::Arc<dyn #path>);
        }
    });

    quote! {
        impl #impl_generics ::moss::Component for #struct_name #ty_generics #where_clause {
            fn capabilities(caps: &mut ::moss::Capabilities<Self>) {
                #(#exposures)*
            }
        }
    }
}
