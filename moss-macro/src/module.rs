use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse::Parse, parse::ParseStream, parse_macro_input, Attribute, ItemStruct, Path, Token};

struct ModuleItem {
    attrs: Vec<Attribute>,
    path: Path,
}

impl Parse for ModuleItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let path = input.parse()?;
        Ok(ModuleItem { attrs, path })
    }
}

struct ModuleArgs {
    imports: Vec<ModuleItem>,
    components: Vec<ModuleItem>,
}

impl Parse for ModuleArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut imports = Vec::new();
        let mut components = Vec::new();

        while !input.is_empty() {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            // Parse array: [Item1, Item2, ...]
            let content;
            syn::bracketed!(content in input);
            let items = content.parse_terminated(ModuleItem::parse, Token![,])?;

            if name == "imports" {
                imports = items.into_iter().collect();
            } else if name == "components" {
                components = items.into_iter().collect();
            } else {
                return Err(syn::Error::new_spanned(
                    name,
                    "unknown module key, expected `imports` or `components`",
                ));
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(ModuleArgs {
            imports,
            components,
        })
    }
}

pub fn module_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ModuleArgs);
    let input = parse_macro_input!(item as ItemStruct);
    let expanded = generate_module_impl(&args, &input);

    TokenStream::from(expanded)
}

fn generate_module_impl(args: &ModuleArgs, input: &ItemStruct) -> TokenStream2 {
    let module_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let import_registrations = args.imports.iter().map(|item| {
        let path = &item.path;
        let attrs = &item.attrs;
        quote! {
            #(#attrs)*
            builder.module::<#path>()?;
        }
    });

    let component_registrations = args.components.iter().map(|item| {
        let path = &item.path;
        let attrs = &item.attrs;
        quote! {
            #(#attrs)*
            builder.component::<#path>();
        }
    });

    quote! {
        #input

        impl #impl_generics ::moss::Module for #module_name #ty_generics #where_clause {
            fn register(
                builder: &mut ::moss::RegistryBuilder
            ) -> ::moss::Result<()> {
                // 1. Register imported modules
                #(#import_registrations)*

                // 2. Register components
                #(#component_registrations)*

                Ok(())
            }
        }
    }
}
