use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, Type};

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = generate_injectable_impl(&input).unwrap_or_else(|e| e.to_compile_error());
    TokenStream::from(expanded)
}

fn generate_injectable_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "#[derive(Injectable)] can only be applied to structs",
            ))
        }
    };

    let construct = match fields {
        Fields::Named(fields) => {
            let field_injections = fields
                .named
                .iter()
                .map(|field| {
                    let field_name = &field.ident;
                    let value = field_value(field)?;
                    Ok(quote!(#field_name: #value))
                })
                .collect::<syn::Result<Vec<_>>>()?;
            quote!(Self { #(#field_injections),* })
        }
        Fields::Unit => quote!(Self),
        Fields::Unnamed(fields) => {
            return Err(syn::Error::new_spanned(
                fields,
                "#[derive(Injectable)] only supports structs with named fields",
            ))
        }
    };

    Ok(quote! {
        impl #impl_generics ::moss::Injectable for #struct_name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn inject(
                registry: &::moss::Registry
            ) -> ::moss::Result<Self> {
                Ok(#construct)
            }
        }
    })
}

fn field_value(field: &Field) -> syn::Result<TokenStream2> {
    if is_default_field(field)? {
        return Ok(quote!(::std::default::Default::default()));
    }

    let Some(inner) = extract_arc_inner(&field.ty) else {
        return Err(syn::Error::new_spanned(
            &field.ty,
            "injected fields must be Arc<T> or Arc<dyn Trait>; use #[inject(default)] for owned state",
        ));
    };

    let resolve_method = match inner {
        Type::TraitObject(_) => quote!(resolve_trait),
        _ => quote!(resolve),
    };

    Ok(quote!(registry.#resolve_method::<#inner>()?))
}

fn is_default_field(field: &Field) -> syn::Result<bool> {
    let mut default = false;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("inject")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                default = true;
                Ok(())
            } else {
                Err(meta.error("unsupported inject option, expected `default`"))
            }
        })?;
    }
    Ok(default)
}

/// Extract the inner type from Arc<T> or Arc<dyn Trait>
fn extract_arc_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first()? {
            syn::GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
