use heck::ToUpperCamelCase;
use proc_macro_error2::abort;
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, LitStr, Token, spanned::Spanned};

use crate::naming::{Kind, SYSTEM_TIMESTAMPS, classify, resolve_column, unraw};

/// What we need from `#[sea_orm(...)]`.
#[derive(Default)]
struct SeaOrmAttrs {
    column_name: Option<String>,
    primary_key: bool,
    ignore: bool,
}

/// What we need from `#[serde(...)]`.
#[derive(Default)]
struct SerdeAttrs {
    rename: Option<String>,
    omit: bool,
}

/// Parsed `#[crud(...)]` field attributes.
#[derive(Default)]
struct CrudAttrs {
    search: Option<Span>,
    no_search: Option<Span>,
    soft_delete: Option<Span>,
}

#[allow(clippy::struct_excessive_bools)]
struct FieldSpec {
    name: String,
    variant: syn::Ident,
    column_name: String,
    kind: Kind,
    nullable: bool,
    primary_key: bool,
    system: bool,
    searchable: bool,
    soft_delete: bool,
}

#[allow(clippy::needless_pass_by_value)] // DeriveInput is consumed by proc-macro pattern
pub fn expand_derive_crud_entity(input: DeriveInput) -> TokenStream {
    let Data::Struct(data) = &input.data else {
        abort!(
            input.span(),
            "#[derive(CrudEntity)] can only be applied to structs"
        );
    };
    let Fields::Named(named) = &data.fields else {
        abort!(
            input.span(),
            "#[derive(CrudEntity)] requires a struct with named fields"
        );
    };

    let mut specs: Vec<FieldSpec> = named
        .named
        .iter()
        .filter_map(field_spec)
        .collect();

    apply_soft_delete_default(&mut specs, input.span());

    if !specs.iter().any(|s| s.primary_key) {
        abort!(
            input.span(),
            "#[derive(CrudEntity)] requires a `#[sea_orm(primary_key)]` field"
        );
    }

    let descriptors = specs.iter().map(descriptor_tokens);
    let entity_ident = syn::Ident::new("Entity", input.ident.span());

    quote! {
        impl ::modkit_crud::CrudEntity for #entity_ident {
            const FIELDS: &'static [::modkit_crud::FieldDescriptor<Self>] = &[
                #(#descriptors),*
            ];
        }
    }
}

fn field_spec(field: &Field) -> Option<FieldSpec> {
    let ident = field.ident.as_ref()?;
    let sea = parse_sea_orm_attrs(&field.attrs);
    if sea.ignore {
        return None;
    }
    let serde = parse_serde_attrs(&field.attrs);
    let crud = parse_crud_attrs(&field.attrs);

    let raw = ident.to_string();
    let name = unraw(&raw).to_owned();
    let column_name = resolve_column(
        sea.column_name.as_deref(),
        serde.rename.as_deref(),
        serde.omit,
        &raw,
    );
    let (kind, nullable) = classify(&field.ty);

    let system = sea.primary_key || SYSTEM_TIMESTAMPS.contains(&name.as_str());
    let searchable = match (crud.search, crud.no_search) {
        (Some(span), Some(_)) => abort!(
            span,
            "crud: `search` and `no_search` cannot be combined on one field"
        ),
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => !system && kind.is_searchable(),
    };

    if let Some(span) = crud.soft_delete
        && !(nullable && kind.is_timestamp())
    {
        abort!(
            span,
            "crud: the soft-delete field must be an optional date-time, e.g. `Option<DateTimeUtc>`"
        );
    }

    Some(FieldSpec {
        variant: format_ident!("{}", name.to_upper_camel_case()),
        name,
        column_name,
        kind,
        nullable,
        primary_key: sea.primary_key,
        system,
        searchable,
        soft_delete: crud.soft_delete.is_some(),
    })
}

/// Without an explicit `#[crud(soft_delete)]`, a nullable `deleted_at` date-time is the marker.
fn apply_soft_delete_default(specs: &mut [FieldSpec], span: Span) {
    match specs.iter().filter(|s| s.soft_delete).count() {
        0 => {
            if let Some(spec) = specs
                .iter_mut()
                .find(|s| s.name == "deleted_at" && s.nullable && s.kind.is_timestamp())
            {
                spec.soft_delete = true;
            }
        }
        1 => {}
        _ => abort!(span, "crud: only one field may be marked `soft_delete`"),
    }
}

fn descriptor_tokens(spec: &FieldSpec) -> TokenStream {
    let FieldSpec {
        name,
        variant,
        column_name,
        kind,
        nullable,
        primary_key,
        system,
        searchable,
        soft_delete,
    } = spec;
    let kind = format_ident!("{}", kind.variant_name());
    let zero = if *nullable {
        quote!(::modkit_crud::ZeroRule::Unset)
    } else {
        quote!(::modkit_crud::ZeroRule::Default)
    };

    quote! {
        ::modkit_crud::FieldDescriptor {
            name: #name,
            column: Column::#variant,
            column_name: #column_name,
            kind: ::modkit_crud::FieldKind::#kind,
            zero: #zero,
            primary_key: #primary_key,
            system: #system,
            searchable: #searchable,
            soft_delete: #soft_delete,
        }
    }
}

fn parse_sea_orm_attrs(attrs: &[Attribute]) -> SeaOrmAttrs {
    let mut out = SeaOrmAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("sea_orm")) {
        let res = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column_name") {
                let lit: LitStr = meta.value()?.parse()?;
                out.column_name = Some(lit.value());
            } else if meta.path.is_ident("primary_key") {
                out.primary_key = true;
            } else if meta.path.is_ident("ignore") {
                out.ignore = true;
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        });
        if let Err(err) = res {
            abort!(attr.span(), "crud: cannot read #[sea_orm(...)]: {}", err);
        }
    }
    out
}

fn parse_serde_attrs(attrs: &[Attribute]) -> SerdeAttrs {
    let mut out = SerdeAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        let res = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if meta.input.peek(Token![=]) {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.rename = Some(lit.value());
                } else {
                    // rename(serialize = "..", deserialize = "..")
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("serialize") {
                            let lit: LitStr = inner.value()?.parse()?;
                            out.rename = Some(lit.value());
                        } else {
                            skip_meta_value(&inner)?;
                        }
                        Ok(())
                    })?;
                }
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                out.omit = true;
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        });
        if let Err(err) = res {
            abort!(attr.span(), "crud: cannot read #[serde(...)]: {}", err);
        }
    }
    out
}

fn parse_crud_attrs(attrs: &[Attribute]) -> CrudAttrs {
    let mut out = CrudAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("crud")) {
        let res = attr.parse_nested_meta(|meta| {
            let span = meta.path.span();
            if meta.path.is_ident("search") {
                out.search = Some(span);
            } else if meta.path.is_ident("no_search") {
                out.no_search = Some(span);
            } else if meta.path.is_ident("soft_delete") {
                out.soft_delete = Some(span);
            } else {
                return Err(meta.error(
                    "unknown crud attribute; expected `search`, `no_search` or `soft_delete`",
                ));
            }
            Ok(())
        });
        if let Err(err) = res {
            abort!(err.span(), "{}", err);
        }
    }
    out
}

/// Consume `= value` or `(...)` of an attribute entry we do not care about.
fn skip_meta_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta_value(&inner))?;
    }
    Ok(())
}
