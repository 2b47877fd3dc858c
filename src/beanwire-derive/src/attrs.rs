use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{Attribute, Error as SynError, LitStr, Result as SynResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeData {
    Strict,
    Optional,
    None,
}

#[derive(Debug, Default)]
pub struct PointAttributes {
    pub span: Option<Span>,
    pub reference: Option<LitStr>,
    pub mode: Option<ModeData>,
}

/// Parses the `#[inject(...)]` attributes of one field.
pub fn parse_point_attributes(attrs: &[Attribute]) -> SynResult<PointAttributes> {
    let mut res = PointAttributes::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("inject")) {
        res.span = Some(attr.span());
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("ref") {
                if res.reference.is_some() {
                    return Err(meta.error("`ref` is specified more than once"));
                }
                res.reference = Some(meta.value()?.parse()?);
                return Ok(());
            }

            let mode = if meta.path.is_ident("strict") {
                ModeData::Strict
            } else if meta.path.is_ident("optional") {
                ModeData::Optional
            } else if meta.path.is_ident("none") {
                ModeData::None
            } else {
                return Err(meta.error(
                    "expects `ref = \"...\"`, `strict`, `optional` or `none` in `#[inject(...)]`",
                ));
            };

            if res.mode.is_some() {
                return Err(meta.error("only one of `strict`, `optional` or `none` is allowed"));
            }
            res.mode = Some(mode);
            Ok(())
        })?;
    }

    if let Some(reference) = &res.reference {
        if reference.value().is_empty() {
            return Err(SynError::new(
                reference.span(),
                "expects `ref` to name a bean",
            ));
        }
    }

    Ok(res)
}
