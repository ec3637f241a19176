use crate::attributes::{ManagedAttributes, PropertyAttributes};
use itertools::Itertools;
use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{Attribute, Data, DataStruct, DeriveInput, Error, Field, Fields, Index, LitStr, Member, Result};

const MANAGED: &str = "managed";
const PROPERTY: &str = "property";

struct PropertyField<'a> {
    field: &'a Field,
    member: Member,
    attributes: PropertyAttributes,
}

impl PropertyField<'_> {
    fn field_name(&self) -> String {
        match &self.member {
            Member::Named(ident) => ident.to_string().trim_start_matches("r#").to_string(),
            Member::Unnamed(index) => index.index.to_string(),
        }
    }
}

fn extract_managed_attributes(attributes: &[Attribute]) -> Result<ManagedAttributes> {
    let mut attributes = attributes
        .iter()
        .filter(|attribute| attribute.path().is_ident(MANAGED));

    let result = attributes
        .next()
        .map(ManagedAttributes::try_from)
        .transpose()?
        .unwrap_or_default();

    if let Some(duplicate) = attributes.next() {
        return Err(Error::new(
            duplicate.span(),
            "Managed attributes are already defined!",
        ));
    }

    Ok(result)
}

fn extract_property_attributes(field: &Field) -> Result<Option<PropertyAttributes>> {
    let mut attributes = field
        .attrs
        .iter()
        .filter(|attribute| attribute.path().is_ident(PROPERTY));

    let result = attributes
        .next()
        .map(PropertyAttributes::try_from)
        .transpose()?;

    if let Some(duplicate) = attributes.next() {
        return Err(Error::new(
            duplicate.span(),
            "A field can be bound to a single property only!",
        ));
    }

    Ok(result)
}

fn collect_property_fields(fields: &Fields) -> Result<Vec<PropertyField>> {
    fields
        .iter()
        .enumerate()
        .filter_map(|(index, field)| {
            extract_property_attributes(field)
                .map(|attributes| {
                    attributes.map(|attributes| PropertyField {
                        field,
                        member: field
                            .ident
                            .clone()
                            .map(Member::Named)
                            .unwrap_or_else(|| Member::Unnamed(Index::from(index))),
                        attributes,
                    })
                })
                .transpose()
        })
        .try_collect()
}

fn generate_construction(fields: &Fields) -> TokenStream {
    match fields {
        Fields::Named(fields) => {
            let idents = fields.named.iter().map(|field| &field.ident);
            quote! {
                Self {
                    #(#idents: std::default::Default::default()),*
                }
            }
        }
        Fields::Unnamed(fields) => {
            let values = fields
                .unnamed
                .iter()
                .map(|_| quote!(std::default::Default::default()));
            quote! {
                Self(#(#values),*)
            }
        }
        Fields::Unit => quote! { Self },
    }
}

fn generate_kind(property: &PropertyField) -> Result<TokenStream> {
    let ty = &property.field.ty;
    match &property.attributes.kind {
        None => Ok(quote! {
            <#ty as runlet_di::coercion::PropertyValue>::KIND
        }),
        Some(kind) => {
            let variant = parse_kind(kind)?;
            Ok(quote! {
                runlet_di::marker::PrimitiveKind::#variant
            })
        }
    }
}

fn parse_kind(kind: &LitStr) -> Result<Ident> {
    let variant = match kind.value().to_ascii_lowercase().as_str() {
        "string" => "String",
        "integer" => "Integer",
        "long" => "Long",
        "boolean" => "Boolean",
        _ => {
            return Err(Error::new(
                kind.span(),
                "Unknown property kind - expected one of: string, integer, long, boolean!",
            ))
        }
    };

    Ok(Ident::new(variant, Span::call_site()))
}

fn generate_field_definition(ident: &Ident, property: &PropertyField) -> Result<TokenStream> {
    let ty = &property.field.ty;
    let member = &property.member;
    let field_name = property.field_name();
    let accessor = format_ident!("set_{}", field_name);
    let name = &property.attributes.name;
    let kind = generate_kind(property)?;
    let optional = property.attributes.is_optional;
    let origin = if property.attributes.is_system {
        quote!(runlet_di::marker::PropertyOrigin::System)
    } else {
        quote!(runlet_di::marker::PropertyOrigin::Application)
    };

    Ok(quote! {
        {
            fn #accessor(
                instance: &mut dyn std::any::Any,
                value: runlet_di::coercion::TypedValue,
            ) -> Result<(), runlet_di::coercion::TypedValue> {
                match instance.downcast_mut::<#ident>() {
                    Some(target) => {
                        target.#member = <#ty as runlet_di::coercion::PropertyValue>::from_typed(value)?;
                        Ok(())
                    }
                    None => Err(value),
                }
            }

            runlet_di::type_registry::FieldDefinition {
                field_name: #field_name,
                marker: runlet_di::marker::ApplicationPropertyMarker {
                    name: #name,
                    kind: #kind,
                    optional: #optional,
                    origin: #origin,
                },
                accessor: #accessor,
            }
        }
    })
}

pub fn expand_managed(input: &DeriveInput) -> Result<TokenStream> {
    if let Data::Struct(DataStruct { fields, .. }) = &input.data {
        if !input.generics.params.is_empty() {
            return Err(Error::new(
                input.generics.span(),
                "Managed types cannot be generic!",
            ));
        }

        let ident = &input.ident;
        let attributes = extract_managed_attributes(&input.attrs)?;
        let construction = generate_construction(fields);

        let field_definitions: Vec<_> = collect_property_fields(fields)?
            .iter()
            .map(|property| generate_field_definition(ident, property))
            .try_collect()?;

        let mut roles = vec![quote!(runlet_di::marker::Role::ManagedClass)];
        if attributes.is_application {
            roles.push(quote!(runlet_di::marker::Role::Application));
        }

        let config_file = match &attributes.config_file {
            Some(config_file) => {
                roles.push(quote!(runlet_di::marker::Role::ConfigSource));
                quote!(Some(#config_file))
            }
            None => quote!(None),
        };

        Ok(quote! {
            #[automatically_derived]
            impl runlet_di::managed::Managed for #ident {
                fn construct() -> Self {
                    #construction
                }
            }

            const _: () = {
                fn construct() -> runlet_di::type_registry::ManagedInstance {
                    Box::new(<#ident as runlet_di::managed::Managed>::construct())
                }

                fn register() -> runlet_di::type_registry::TypeDefinition {
                    runlet_di::type_registry::TypeDefinition {
                        type_id: std::any::TypeId::of::<#ident>(),
                        type_name: std::any::type_name::<#ident>(),
                        module_path: module_path!(),
                        roles: vec![#(#roles),*],
                        config_file: #config_file,
                        fields: vec![#(#field_definitions),*],
                        lifecycle_methods: vec![],
                        constructor: construct,
                    }
                }

                runlet_di::type_registry::internal::submit! {
                    runlet_di::type_registry::internal::TypeDefinitionRegisterer {
                        register
                    }
                };
            };
        })
    } else {
        Err(Error::new(input.span(), "Can only derive Managed on structs!"))
    }
}
