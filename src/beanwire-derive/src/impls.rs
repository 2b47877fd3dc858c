use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::spanned::Spanned;
use syn::{
    AngleBracketedGenericArguments, Data, DeriveInput, Error as SynError, Fields,
    GenericArgument, Ident, PathArguments, Result as SynResult, Type, TypePath,
};

use crate::attrs::{self, ModeData, PointAttributes};

#[derive(Debug)]
struct PointData {
    field: Ident,
    target: Type,
    attributes: PointAttributes,
}

pub fn expand_implementation(input: TokenStream) -> SynResult<TokenStream2> {
    let input = syn::parse::<DeriveInput>(input)?;
    let points = parse_points(&input)?;

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let bean_body = if points.is_empty() {
        quote! {}
    } else {
        let arms = points
            .iter()
            .map(|point| {
                let field = &point.field;
                let name = field.to_string();
                quote! { #name => self.#field.inject(value), }
            })
            .collect::<TokenStream2>();

        quote! {
            fn inject(
                &self,
                point: &str,
                value: beanwire::bean::BeanRef,
            ) -> std::result::Result<(), beanwire::bean::InjectError> {
                match point {
                    #arms
                    _ => std::result::Result::Err(beanwire::bean::InjectError::unknown_point(point)),
                }
            }
        }
    };

    let point_exprs = points.iter().map(expand_point);

    Ok(quote! {
        impl #impl_generics beanwire::bean::Bean for #ident #ty_generics #where_clause {
            #bean_body
        }

        impl #impl_generics beanwire::bean::Injectable for #ident #ty_generics #where_clause {
            fn dependency_points() -> std::vec::Vec<beanwire::bean::DependencyPoint> {
                std::vec![#(#point_exprs),*]
            }
        }
    })
}

fn parse_points(input: &DeriveInput) -> SynResult<Vec<PointData>> {
    let Data::Struct(data) = &input.data else {
        return Err(SynError::new(
            input.span(),
            "`#[derive(Bean)]` only supports structs",
        ));
    };

    let fields = match &data.fields {
        Fields::Named(fields) => &fields.named,
        Fields::Unit => return Ok(Vec::new()),
        Fields::Unnamed(fields) => {
            if fields.unnamed.iter().any(|field| is_inject_type(&field.ty)) {
                return Err(SynError::new(
                    fields.span(),
                    "dependency points should be named fields",
                ));
            }
            return Ok(Vec::new());
        }
    };

    let mut points = Vec::new();
    for field in fields {
        let attributes = attrs::parse_point_attributes(&field.attrs)?;
        let Some(target) = inject_target(&field.ty) else {
            if let Some(span) = attributes.span {
                return Err(SynError::new(
                    span,
                    "`#[inject(...)]` is only allowed on fields of type `Inject<T>`",
                ));
            }
            continue;
        };

        let Some(field_ident) = field.ident.clone() else {
            unreachable!("a named field should have an identifier");
        };
        points.push(PointData {
            field: field_ident,
            target,
            attributes,
        });
    }
    Ok(points)
}

fn is_inject_type(ty: &Type) -> bool {
    inject_target(ty).is_some()
}

/// Returns `T` if `ty` is written as `Inject<T>`, possibly with a path prefix.
fn inject_target(ty: &Type) -> Option<Type> {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return None;
    };
    let segment = path.segments.last()?;
    if segment.ident != "Inject" {
        return None;
    }

    let PathArguments::AngleBracketed(AngleBracketedGenericArguments { args, .. }) =
        &segment.arguments
    else {
        return None;
    };
    if args.len() != 1 {
        return None;
    }
    match args.first()? {
        GenericArgument::Type(target) => Some(target.clone()),
        _ => None,
    }
}

fn expand_point(point: &PointData) -> TokenStream2 {
    let name = point.field.to_string();
    let target = &point.target;

    let reference = point
        .attributes
        .reference
        .as_ref()
        .map(|reference| quote! { .with_reference(#reference) });

    let mode = point.attributes.mode.map(|mode| {
        let variant = match mode {
            ModeData::Strict => quote! { Strict },
            ModeData::Optional => quote! { Optional },
            ModeData::None => quote! { None },
        };
        quote! { .with_mode(beanwire::wiring::WiringMode::#variant) }
    });

    quote! {
        beanwire::bean::DependencyPoint::of::<#target>(#name)
            #reference
            #mode
    }
}
