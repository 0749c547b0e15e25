//! `#[derive(Event)]` implementation.

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{
    Attribute, Data, DataEnum, DataStruct, DeriveInput, Generics, Index, LitStr, Type, parse_quote,
};

/// Arguments accepted in `#[event(...)]`.
#[derive(Default)]
struct EventArgs {
    name: Option<LitStr>,
    timestamp: bool,
    payload: bool,
}

impl EventArgs {
    fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut args = EventArgs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("event")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let lit: LitStr = meta.value()?.parse()?;
                    if lit.value().is_empty() {
                        return Err(meta.error("event name must not be empty"));
                    }
                    args.name = Some(lit);
                } else if meta.path.is_ident("timestamp") {
                    args.timestamp = true;
                } else if meta.path.is_ident("payload") {
                    args.payload = true;
                } else {
                    let path = meta.path.to_token_stream().to_string();
                    return Err(meta.error(format!("unknown attribute: {}", path)));
                }
                Ok(())
            })?;
        }
        Ok(args)
    }
}

pub(crate) fn derive_event_impl(input: DeriveInput) -> syn::Result<TokenStream> {
    match &input.data {
        Data::Struct(data) => derive_struct(&input, data),
        Data::Enum(data) => derive_enum(&input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Event cannot be derived for unions",
        )),
    }
}

fn derive_struct(input: &DeriveInput, data: &DataStruct) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let generics = with_event_bounds(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let args = EventArgs::from_attrs(&input.attrs)?;
    reject_field_markers(&args, ident)?;
    let name = args
        .name
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));

    let mut timestamp: Option<TokenStream> = None;
    let mut payload: Option<(TokenStream, &Type)> = None;
    for (index, field) in data.fields.iter().enumerate() {
        let field_args = EventArgs::from_attrs(&field.attrs)?;
        if let Some(name) = &field_args.name {
            return Err(syn::Error::new_spanned(
                name,
                "`name` belongs on the type, not a field",
            ));
        }
        let access = match &field.ident {
            Some(ident) => ident.to_token_stream(),
            None => Index::from(index).to_token_stream(),
        };
        if field_args.timestamp {
            if timestamp.is_some() {
                return Err(syn::Error::new_spanned(field, "duplicate `timestamp` field"));
            }
            timestamp = Some(access.clone());
        }
        if field_args.payload {
            if payload.is_some() {
                return Err(syn::Error::new_spanned(field, "duplicate `payload` field"));
            }
            payload = Some((access, &field.ty));
        }
    }

    let timestamp_impl = timestamp.map(|access| {
        quote! {
            impl #impl_generics ::tributary::Timestamped for #ident #ty_generics #where_clause {
                fn timestamp(&self) -> ::std::time::SystemTime {
                    ::core::clone::Clone::clone(&self.#access)
                }
            }
        }
    });

    let payload_impl = payload.map(|(access, ty)| {
        quote! {
            impl #impl_generics ::tributary::WithPayload for #ident #ty_generics #where_clause {
                type Payload = #ty;

                fn payload(&self) -> &Self::Payload {
                    &self.#access
                }
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::tributary::Event for #ident #ty_generics #where_clause {
            fn name(&self) -> &str {
                #name
            }
        }

        #timestamp_impl
        #payload_impl
    })
}

fn derive_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let generics = with_event_bounds(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let args = EventArgs::from_attrs(&input.attrs)?;
    if let Some(name) = &args.name {
        return Err(syn::Error::new_spanned(
            name,
            "enum events are named per variant; put `name` on a variant",
        ));
    }
    reject_field_markers(&args, ident)?;

    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            ident,
            "Event cannot be derived for an enum without variants",
        ));
    }

    let mut arms = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        let variant_args = EventArgs::from_attrs(&variant.attrs)?;
        reject_field_markers(&variant_args, &variant.ident)?;
        for field in &variant.fields {
            let field_args = EventArgs::from_attrs(&field.attrs)?;
            if field_args.timestamp || field_args.payload || field_args.name.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "field markers are only supported on structs",
                ));
            }
        }
        let variant_ident = &variant.ident;
        let name = variant_args
            .name
            .unwrap_or_else(|| LitStr::new(&variant_ident.to_string(), variant_ident.span()));
        arms.push(quote! { Self::#variant_ident { .. } => #name, });
    }

    Ok(quote! {
        impl #impl_generics ::tributary::Event for #ident #ty_generics #where_clause {
            fn name(&self) -> &str {
                match self {
                    #(#arms)*
                }
            }
        }
    })
}

/// Every type parameter must satisfy `Event`'s supertraits.
fn with_event_bounds(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    let params: Vec<_> = generics.type_params().map(|p| p.ident.clone()).collect();
    let where_clause = generics.make_where_clause();
    for param in params {
        where_clause
            .predicates
            .push(parse_quote! { #param: ::core::marker::Send + ::core::marker::Sync + 'static });
    }
    generics
}

fn reject_field_markers(args: &EventArgs, span: impl ToTokens) -> syn::Result<()> {
    if args.timestamp || args.payload {
        return Err(syn::Error::new_spanned(
            span,
            "`timestamp` and `payload` mark struct fields",
        ));
    }
    Ok(())
}
