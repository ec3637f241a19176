use itertools::Itertools;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{Error, FnArg, ImplItem, ImplItemFn, Item, ItemImpl, Result, Type};

const PHASE_MARKERS: [(&str, &str); 3] = [
    ("app_init", "Init"),
    ("app_exec", "Execute"),
    ("app_term", "Terminate"),
];

struct LifecycleMethod {
    phase: &'static str,
    method: ImplItemFn,
}

fn take_phase(method: &mut ImplItemFn) -> Result<Option<&'static str>> {
    let phases = method
        .attrs
        .iter()
        .filter_map(|attribute| {
            PHASE_MARKERS
                .iter()
                .find(|(marker, _)| attribute.path().is_ident(marker))
                .map(|(_, phase)| (*phase, attribute.span()))
        })
        .collect_vec();

    if phases.len() > 1 {
        return Err(Error::new(
            phases[1].1,
            "A method can be bound to a single lifecycle phase only!",
        ));
    }

    method.attrs.retain(|attribute| {
        !PHASE_MARKERS
            .iter()
            .any(|(marker, _)| attribute.path().is_ident(marker))
    });

    Ok(phases.first().map(|(phase, _)| *phase))
}

fn validate_signature(method: &ImplItemFn) -> Result<bool> {
    let signature = &method.sig;
    if signature.asyncness.is_some() {
        return Err(Error::new(
            signature.span(),
            "Lifecycle methods cannot be async!",
        ));
    }

    if !signature.generics.params.is_empty() {
        return Err(Error::new(
            signature.generics.span(),
            "Lifecycle methods cannot be generic!",
        ));
    }

    match signature.inputs.first() {
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() => {}
        _ => {
            return Err(Error::new(
                signature.span(),
                "Lifecycle methods must take &self or &mut self!",
            ))
        }
    }

    match signature.inputs.len() {
        1 => Ok(false),
        2 => Ok(true),
        _ => Err(Error::new(
            signature.inputs.span(),
            "Lifecycle methods can only take an additional &ApplicationContext!",
        )),
    }
}

fn generate_registration(
    self_ty: &Type,
    ordinal: usize,
    method: &LifecycleMethod,
) -> Result<TokenStream> {
    let takes_context = validate_signature(&method.method)?;
    let ident = &method.method.sig.ident;
    let method_name = ident.to_string();
    let phase = format_ident!("{}", method.phase);
    let call = if takes_context {
        quote!(target.#ident(context))
    } else {
        quote!(target.#ident())
    };

    Ok(quote! {
        const _: () = {
            fn invoke(
                instance: &mut dyn std::any::Any,
                #[allow(unused_variables)]
                context: &runlet_di::context::ApplicationContext,
            ) -> Result<(), runlet_di::error::InvocationError> {
                let target = instance.downcast_mut::<#self_ty>().ok_or_else(|| {
                    runlet_di::error::InvocationError::IncompatibleInstance(
                        std::any::type_name::<#self_ty>().to_string(),
                    )
                })?;

                runlet_di::managed::LifecycleResult::into_lifecycle_result(#call)
                    .map_err(runlet_di::error::InvocationError::Failed)
            }

            fn register() -> runlet_di::type_registry::internal::LifecycleMethodRegistration {
                runlet_di::type_registry::internal::LifecycleMethodRegistration {
                    target: std::any::TypeId::of::<#self_ty>(),
                    target_name: std::any::type_name::<#self_ty>(),
                    file: file!(),
                    line: line!(),
                    column: column!(),
                    ordinal: #ordinal,
                    method: runlet_di::type_registry::LifecycleMethodDefinition {
                        phase: runlet_di::marker::LifecyclePhase::#phase,
                        method_name: #method_name,
                        invoker: invoke,
                    },
                }
            }

            runlet_di::type_registry::internal::submit! {
                runlet_di::type_registry::internal::LifecycleMethodRegisterer {
                    register
                }
            };
        };
    })
}

fn expand_impl(mut item_impl: ItemImpl) -> Result<TokenStream> {
    if item_impl.trait_.is_some() {
        return Err(Error::new(
            item_impl.span(),
            "Lifecycle methods can only be declared in inherent impl blocks!",
        ));
    }

    if !item_impl.generics.params.is_empty() {
        return Err(Error::new(
            item_impl.generics.span(),
            "Lifecycle impl blocks cannot be generic!",
        ));
    }

    let mut methods = vec![];
    for item in &mut item_impl.items {
        if let ImplItem::Fn(method) = item {
            if let Some(phase) = take_phase(method)? {
                methods.push(LifecycleMethod {
                    phase,
                    method: method.clone(),
                });
            }
        }
    }

    let registrations: Vec<_> = methods
        .iter()
        .enumerate()
        .map(|(ordinal, method)| generate_registration(&item_impl.self_ty, ordinal, method))
        .try_collect()?;

    Ok(quote! {
        #item_impl

        #(#registrations)*
    })
}

pub fn expand_lifecycle(item: Item) -> Result<TokenStream> {
    if let Item::Impl(item_impl) = item {
        expand_impl(item_impl)
    } else {
        Err(Error::new(
            item.span(),
            "Only impl blocks can be marked with lifecycle methods!",
        ))
    }
}
