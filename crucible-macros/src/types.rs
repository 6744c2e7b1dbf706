use quote::ToTokens;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// How a struct field participates in injection, deduced from its syntactic
/// shape since there is no `@Inject`-on-constructor reflection to consult.
pub(crate) enum InjectionType {
    Arc { inner: syn::Type },
    OptionArc { inner: syn::Type },
    Value { typ: syn::Type },
}

pub(crate) fn deduce_injection_type(typ: &syn::Type) -> InjectionType {
    if is_smart_ptr(typ) {
        InjectionType::Arc {
            inner: strip_smart_ptr(typ),
        }
    } else if is_option(typ) {
        let element = get_option_element_type(typ);
        if is_smart_ptr(&element) {
            InjectionType::OptionArc {
                inner: strip_smart_ptr(&element),
            }
        } else {
            panic!("#[derive(Injectable)] only supports Option<Arc<T>> fields, found Option<{}>", element.to_token_stream())
        }
    } else {
        InjectionType::Value { typ: typ.clone() }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) fn is_smart_ptr(typ: &syn::Type) -> bool {
    let syn::Type::Path(typepath) = typ else {
        return false;
    };
    if typepath.qself.is_some() || typepath.path.segments.len() != 1 {
        return false;
    }
    &typepath.path.segments[0].ident == "Arc"
}

pub(crate) fn strip_smart_ptr(typ: &syn::Type) -> syn::Type {
    match typ {
        syn::Type::Path(typepath) if typepath.qself.is_none() => match typepath.path.segments.first() {
            Some(seg) if &seg.ident == "Arc" => match &seg.arguments {
                syn::PathArguments::AngleBracketed(args) => syn::parse2(args.args.to_token_stream()).unwrap(),
                _ => typ.clone(),
            },
            _ => typ.clone(),
        },
        _ => typ.clone(),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) fn is_option(typ: &syn::Type) -> bool {
    let syn::Type::Path(typepath) = typ else {
        return false;
    };
    if typepath.qself.is_some() || typepath.path.segments.len() != 1 {
        return false;
    }
    &typepath.path.segments[0].ident == "Option"
}

pub(crate) fn get_option_element_type(typ: &syn::Type) -> syn::Type {
    let syn::Type::Path(typepath) = typ else {
        panic!("Type is not an Option")
    };
    assert!(typepath.qself.is_none());
    assert_eq!(typepath.path.segments.len(), 1);
    assert_eq!(&typepath.path.segments[0].ident, "Option");
    let syn::PathArguments::AngleBracketed(args) = &typepath.path.segments[0].arguments else {
        panic!("No generic type specifier found in Option")
    };
    syn::parse2(args.args.to_token_stream()).unwrap()
}
