use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{FnArg, Ident, ItemFn, LitBool, LitStr, Pat, Path, Token, Type};

/// Arguments of `#[intent("NAME", silent = bool, error_handler = path)]`.
struct IntentArgs {
    name: LitStr,
    silent: Option<LitBool>,
    error_handler: Option<Path>,
}

impl Parse for IntentArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.is_empty() {
            return Err(input.error("expected an intent name, e.g. #[intent(\"WEATHER__CURRENT\")]"));
        }
        let name: LitStr = input.parse()?;
        if name.value().is_empty() {
            return Err(syn::Error::new(name.span(), "intent name must not be empty"));
        }

        let mut silent = None;
        let mut error_handler = None;
        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }

            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            match key.to_string().as_str() {
                "silent" if silent.is_none() => silent = Some(input.parse()?),
                "error_handler" if error_handler.is_none() => error_handler = Some(input.parse()?),
                "silent" | "error_handler" => {
                    return Err(syn::Error::new(key.span(), format!("duplicate option `{key}`")));
                }
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown intent option `{other}`, expected one of: silent, error_handler"),
                    ));
                }
            }
        }

        Ok(Self {
            name,
            silent,
            error_handler,
        })
    }
}

/// Collects the parameter names of a handler, rejecting parameters that
/// cannot be bound by name.
fn param_names(func: &ItemFn) -> syn::Result<Vec<String>> {
    let sig = &func.sig;
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            sig.generics.span(),
            "intent handlers cannot be generic",
        ));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(syn::Error::new(
            variadic.span(),
            "intent handlers cannot be variadic",
        ));
    }

    let mut names = Vec::with_capacity(sig.inputs.len());
    for input in &sig.inputs {
        let pat_type = match input {
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new(
                    receiver.span(),
                    "intent handlers cannot take `self`",
                ));
            }
            FnArg::Typed(pat_type) => pat_type,
        };

        if let Type::ImplTrait(ty) = &*pat_type.ty {
            return Err(syn::Error::new(
                ty.span(),
                "intent parameters need a concrete type, not `impl Trait`",
            ));
        }

        match &*pat_type.pat {
            Pat::Ident(pat) if pat.subpat.is_none() => names.push(pat.ident.unraw().to_string()),
            Pat::Wild(wild) => {
                return Err(syn::Error::new(
                    wild.span(),
                    "intent parameters must be named, the name selects the slot to bind",
                ));
            }
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "intent parameters must be plain identifiers",
                ));
            }
        }
    }
    Ok(names)
}

/// Implementation of `#[intent(...)]`.
///
/// Leaves the function unchanged and appends a
/// `#[::vox::framework::linkme::distributed_slice]` static that contributes
/// its registration to `::vox::framework::INTENTS`.
pub fn expand(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let args: IntentArgs = syn::parse2(attr)?;
    let func: ItemFn = syn::parse2(item)?;
    let names = param_names(&func)?;

    let fn_name = &func.sig.ident;
    let fn_name_upper = fn_name.unraw().to_string().to_uppercase();
    let static_name = Ident::new(&format!("_VOX_INTENT_{fn_name_upper}"), Span::call_site());

    let intent_name = &args.name;
    let (handler_ctor, error_ctor) = if func.sig.asyncness.is_some() {
        (quote!(asynchronous), quote!(asynchronous))
    } else {
        (quote!(blocking), quote!(blocking))
    };

    let params = (!names.is_empty()).then(|| quote!(.params([#(#names),*])));
    let silent = args.silent.map(|silent| quote!(.silent(#silent)));
    let error_handler = args.error_handler.map(
        |path| quote!(.error_handler(::vox::framework::ErrorHandler::#error_ctor(#path))),
    );

    Ok(quote! {
        #func

        #[::vox::framework::linkme::distributed_slice(::vox::framework::INTENTS)]
        #[linkme(crate = ::vox::framework::linkme)]
        static #static_name: ::vox::framework::IntentFactory = || {
            ::vox::framework::Intent::new(#intent_name)
                #params
                .handler(::vox::framework::Handler::#handler_ctor(#fn_name))
                #silent
                #error_handler
        };
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_err(attr: TokenStream, item: TokenStream) -> String {
        expand(attr, item).unwrap_err().to_string()
    }

    #[test]
    fn test_async_handler_expansion() {
        let tokens = expand(
            quote!("WEATHER", silent = false),
            quote! {
                async fn weather(location: String, mut r#type: Option<String>) -> String {
                    location
                }
            },
        )
        .unwrap()
        .to_string();

        assert!(tokens.contains("_VOX_INTENT_WEATHER"));
        assert!(tokens.contains(r#". params (["location" , "type"])"#));
        assert!(tokens.contains("Handler :: asynchronous (weather)"));
        assert!(tokens.contains(". silent (false)"));
    }

    #[test]
    fn test_blocking_handler_with_error_handler() {
        let tokens = expand(
            quote!("COUNT", error_handler = errors::recover),
            quote! {
                fn count() -> String {
                    String::new()
                }
            },
        )
        .unwrap()
        .to_string();

        assert!(tokens.contains("Handler :: blocking (count)"));
        assert!(tokens.contains("ErrorHandler :: blocking (errors :: recover)"));
        assert!(!tokens.contains(". params"));
    }

    #[test]
    fn test_rejects_unbindable_parameters() {
        let wildcard = expand_err(quote!("X"), quote!(async fn f(_: String) {}));
        assert!(wildcard.contains("must be named"));

        let tuple = expand_err(quote!("X"), quote!(async fn f((a, b): (String, String)) {}));
        assert!(tuple.contains("plain identifiers"));

        let receiver = expand_err(quote!("X"), quote!(async fn f(&self) {}));
        assert!(receiver.contains("`self`"));

        let generic = expand_err(quote!("X"), quote!(async fn f<T>(a: T) {}));
        assert!(generic.contains("generic"));

        let opaque = expand_err(quote!("X"), quote!(async fn f(a: impl Into<String>) {}));
        assert!(opaque.contains("impl Trait"));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(expand_err(quote!(), quote!(fn f() {})).contains("expected an intent name"));
        assert!(expand_err(quote!(""), quote!(fn f() {})).contains("must not be empty"));
        assert!(expand_err(quote!("X", loud = true), quote!(fn f() {})).contains("unknown intent option"));
        assert!(
            expand_err(quote!("X", silent = true, silent = false), quote!(fn f() {}))
                .contains("duplicate option")
        );
    }
}
