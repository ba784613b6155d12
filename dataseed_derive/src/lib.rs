use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input, spanned::Spanned};

#[proc_macro_derive(Mappable, attributes(mapping))]
pub fn derive_mappable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_mappable(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct MappingFieldOptions {
    rename: Option<String>,
    key: bool,
    skip: bool,
}

struct MappedField {
    ident: syn::Ident,
    ty: syn::Type,
    property_name: String,
    key: bool,
}

fn expand_mappable(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "Mappable can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new(
            data.fields.span(),
            "Mappable requires a struct with named fields",
        ));
    };

    let mut fields = Vec::new();
    for field in &named.named {
        let options = parse_mapping_field_options(&field.attrs)?;
        if options.skip {
            if options.key || options.rename.is_some() {
                return Err(syn::Error::new(
                    field.span(),
                    "#[mapping(skip)] cannot be combined with other mapping options",
                ));
            }
            continue;
        }

        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let property_name = options.rename.unwrap_or_else(|| ident.to_string());
        fields.push(MappedField {
            ident,
            ty: field.ty.clone(),
            property_name,
            key: options.key,
        });
    }

    // Cross-type mapping matches names case-insensitively
    let mut seen = std::collections::HashMap::new();
    for field in &fields {
        let folded = field.property_name.to_lowercase();
        if let Some(previous) = seen.insert(folded, field.property_name.as_str()) {
            let message = if previous == field.property_name {
                format!("duplicate mapping property '{}'", field.property_name)
            } else {
                format!(
                    "mapping property '{}' differs from '{}' only by case",
                    field.property_name, previous
                )
            };
            return Err(syn::Error::new(field.ident.span(), message));
        }
    }

    let property_entries = fields.iter().map(|field| {
        let ident = &field.ident;
        let ty = &field.ty;
        let name = field.property_name.as_str();
        quote! {
            ::dataseed::Property {
                name: #name,
                data_type: <#ty as ::dataseed::MapValue>::data_type(),
                nullable: <#ty as ::dataseed::MapValue>::NULLABLE,
                copyable: <#ty as ::dataseed::MapValue>::COPYABLE,
                get: |this: &Self| -> ::dataseed::Result<::dataseed::Value> {
                    ::dataseed::MapValue::to_value(&this.#ident)
                },
                set: |this: &mut Self, value: ::dataseed::Value| -> ::dataseed::Result<()> {
                    this.#ident = <#ty as ::dataseed::MapValue>::from_value(value)?;
                    Ok(())
                },
            }
        }
    });

    let copy_steps = fields.iter().map(|field| {
        let ident = &field.ident;
        let ty = &field.ty;
        quote! {
            if <#ty as ::dataseed::MapValue>::COPYABLE
                && !::dataseed::MapValue::is_default(&source.#ident)
            {
                destination.#ident = ::core::clone::Clone::clone(&source.#ident);
            }
        }
    });

    let key_members = fields
        .iter()
        .filter(|field| field.key)
        .map(|field| field.property_name.as_str());

    let type_name = struct_name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::dataseed::Mappable for #struct_name #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #type_name
            }

            fn properties() -> ::std::vec::Vec<::dataseed::Property<Self>> {
                ::std::vec![#(#property_entries),*]
            }

            #[allow(unused_variables)]
            fn copy_non_default(destination: &mut Self, source: &Self) {
                #(#copy_steps)*
            }

            fn key_members() -> ::std::vec::Vec<&'static str> {
                ::std::vec![#(#key_members),*]
            }
        }
    })
}

fn parse_mapping_field_options(attrs: &[syn::Attribute]) -> syn::Result<MappingFieldOptions> {
    let mut options = MappingFieldOptions {
        rename: None,
        key: false,
        skip: false,
    };

    for attr in attrs {
        if !attr.path().is_ident("mapping") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                options.rename = Some(lit.value());
                return Ok(());
            }

            if meta.path.is_ident("key") {
                options.key = true;
                return Ok(());
            }

            if meta.path.is_ident("skip") {
                options.skip = true;
                return Ok(());
            }

            Err(meta.error(
                "Unsupported mapping attribute. Supported: rename = \"...\", key, skip",
            ))
        })?;
    }

    Ok(options)
}
