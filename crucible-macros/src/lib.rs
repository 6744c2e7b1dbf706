extern crate proc_macro;

mod types;

use proc_macro::TokenStream;
use quote::quote;
use types::InjectionType;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Derives `Injectable` for a struct with named fields, in place of the
/// `@Inject`-on-constructor reflection an injector on the JVM would use.
///
/// Each field becomes a positional constructor dependency:
/// - `Arc<T>` fields are a required dependency on `T`.
/// - `Option<Arc<T>>` fields are a nullable dependency on `T`.
/// - any other field type is bound as a converted constant (§4.C) of that type.
#[proc_macro_derive(Injectable)]
pub fn derive_injectable(item: TokenStream) -> TokenStream {
    let ast: syn::DeriveInput = syn::parse(item).unwrap();
    let data = match &ast.data {
        syn::Data::Struct(data) => data,
        _ => panic!("#[derive(Injectable)] only supports structs with named fields"),
    };
    let is_unit = matches!(&data.fields, syn::Fields::Unit);
    let fields: Vec<(&syn::Ident, &syn::Type)> = match &data.fields {
        syn::Fields::Named(named) => named
            .named
            .iter()
            .map(|f| (f.ident.as_ref().unwrap(), &f.ty))
            .collect(),
        syn::Fields::Unit => Vec::new(),
        _ => panic!("#[derive(Injectable)] only supports named fields or unit structs"),
    };

    let type_name = &ast.ident;

    let dependency_keys: Vec<_> = fields
        .iter()
        .map(|(_, typ)| match types::deduce_injection_type(typ) {
            InjectionType::Arc { inner } => quote! { (::crucible::Key::of::<#inner>(), false) },
            InjectionType::OptionArc { inner } => quote! { (::crucible::Key::of::<#inner>(), true) },
            InjectionType::Value { typ } => quote! { (::crucible::Key::of::<#typ>(), false) },
        })
        .collect();

    let field_names: Vec<_> = fields.iter().map(|(name, _)| *name).collect();

    let field_extractors: Vec<_> = fields
        .iter()
        .map(|(name, typ)| match types::deduce_injection_type(typ) {
            InjectionType::Arc { inner } => quote! {
                let #name: ::std::sync::Arc<#inner> = __args
                    .next()
                    .unwrap()
                    .expect("non-nullable dependency resolved to no binding")
                    .downcast::<#inner>()
                    .unwrap_or_else(|_| panic!("binding produced the wrong concrete type for {}", stringify!(#name)));
            },
            InjectionType::OptionArc { inner } => quote! {
                let #name: ::std::option::Option<::std::sync::Arc<#inner>> = __args
                    .next()
                    .unwrap()
                    .map(|v| v.downcast::<#inner>().unwrap_or_else(|_| panic!("binding produced the wrong concrete type for {}", stringify!(#name))));
            },
            InjectionType::Value { typ } => quote! {
                let #name: #typ = (*__args
                    .next()
                    .unwrap()
                    .expect("non-nullable dependency resolved to no binding")
                    .downcast::<#typ>()
                    .unwrap_or_else(|_| panic!("binding produced the wrong concrete type for {}", stringify!(#name))))
                    .clone();
            },
        })
        .collect();

    let construction = if is_unit {
        quote! { #type_name }
    } else {
        quote! { #type_name { #( #field_names, )* } }
    };

    let gen = quote! {
        impl ::crucible::Injectable for #type_name {
            fn injection_point() -> ::std::sync::Arc<::crucible::InjectionPoint> {
                ::crucible::InjectionPoint::new(
                    "new",
                    ::crucible::TypeLiteral::of::<#type_name>(),
                    ::std::vec![ #( #dependency_keys, )* ],
                )
            }

            fn construct(
                args: ::std::vec::Vec<::std::option::Option<::std::sync::Arc<dyn ::std::any::Any + Send + Sync>>>,
            ) -> ::std::result::Result<Self, ::crucible::ProvisionError> {
                let mut __args = args.into_iter();
                #( #field_extractors )*
                ::std::result::Result::Ok(#construction)
            }
        }
    };

    gen.into()
}
