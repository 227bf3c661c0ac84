use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::spanned::Spanned;
use syn::{FnArg, ImplItem, ItemImpl, parse_macro_input};

/// Maps `#[Event::Xxx]` attribute names to `InteractionListener` trait method names.
fn event_to_trait_method(event_name: &str) -> Option<&'static str> {
    match event_name {
        "FocusBegun" => Some("on_focus_begun"),
        "FocusEnded" => Some("on_focus_ended"),
        "InteractBegun" => Some("on_interact_begun"),
        "InteractEnded" => Some("on_interact_ended"),
        "Interacted" => Some("on_interacted"),
        _ => None,
    }
}

/// Proc-macro attribute that generates an `InteractionListener` trait implementation.
///
/// # Usage
/// ```ignore
/// #[interaction_listener]
/// impl DoorLog {
///     #[Event::Interacted]
///     fn opened(&self, event: &InteractionEvent) {
///         info!("{:?} used {:?}", event.entity, event.interactable);
///     }
/// }
/// ```
///
/// This generates:
/// - The original `impl DoorLog` block (with event attributes stripped)
/// - An `impl InteractionListener for DoorLog` that delegates to the annotated methods
#[proc_macro_attribute]
pub fn interaction_listener(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemImpl);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(mut input: ItemImpl) -> syn::Result<TokenStream2> {
    let mut trait_methods = Vec::new();

    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };

        // Find and remove #[Event::Xxx] attributes
        let mut event = None;
        method.attrs.retain(|attr| {
            let segments: Vec<_> = attr.path().segments.iter().collect();
            if segments.len() == 2 && segments[0].ident == "Event" {
                event = Some(segments[1].ident.clone());
                return false;
            }
            true
        });

        let Some(event) = event else {
            continue;
        };

        let Some(trait_method_name) = event_to_trait_method(&event.to_string()) else {
            return Err(syn::Error::new(
                event.span(),
                format!("unknown interaction event `{}`", event),
            ));
        };

        // Handlers look like `fn name(&self, event: &InteractionEvent)`
        let takes_self = matches!(method.sig.inputs.first(), Some(FnArg::Receiver(_)));
        let has_event = matches!(method.sig.inputs.iter().nth(1), Some(FnArg::Typed(_)));
        if !takes_self || !has_event || method.sig.inputs.len() != 2 {
            return Err(syn::Error::new(
                method.sig.span(),
                "event handlers must take `&self` and the event",
            ));
        }

        let trait_method_ident = syn::Ident::new(trait_method_name, method.sig.ident.span());
        let user_method_ident = &method.sig.ident;

        trait_methods.push(quote! {
            fn #trait_method_ident(&self, event: &::interplay_protocol::events::InteractionEvent) {
                self.#user_method_ident(event)
            }
        });
    }

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #input

        impl #impl_generics ::interplay_protocol::events::InteractionListener for #self_ty #where_clause {
            #(#trait_methods)*
        }
    })
}
