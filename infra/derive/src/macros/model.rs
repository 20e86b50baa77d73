use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::meta::ParseNestedMeta;
use syn::parse::Parser;
use syn::{Attribute, Expr, Fields, Ident, ItemStruct, LitStr, Path, Type};

/// Options given to `#[active_model(...)]`.
#[derive(Default)]
struct ModelArgs {
    name: Option<LitStr>,
    extends: Option<Path>,
}

/// One declared field and its `#[field(...)]` options.
struct FieldSpec {
    ident: Ident,
    ty: Type,
    key: LitStr,
    flags: Vec<Ident>,
    attribute: Option<Expr>,
    attribute_with: Option<Path>,
    getter: Option<Path>,
    setter: Option<Path>,
    validator: Option<Path>,
    factory: Option<Path>,
    factory_default: Option<Path>,
    computed: bool,
}

const FLAGS: [&str; 5] = ["fillable", "hidden", "protected", "readonly", "required"];

pub fn expand(args: TokenStream, input: ItemStruct) -> TokenStream {
    match try_expand(args, input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn try_expand(args: TokenStream, input: ItemStruct) -> syn::Result<TokenStream> {
    let args = parse_args(args)?;
    let Fields::Named(named) = &input.fields else {
        return Err(syn::Error::new_spanned(
            &input,
            "active_model requires a struct with named fields",
        ));
    };

    let specs = named.named.iter().map(FieldSpec::parse).collect::<syn::Result<Vec<_>>>()?;

    let ident = &input.ident;
    let vis = &input.vis;
    let docs = input.attrs.iter().filter(|a| a.path().is_ident("doc"));
    let class_name =
        args.name.unwrap_or_else(|| LitStr::new(&ident.to_string(), Span::call_site()));

    let class_init = args.extends.as_ref().map_or_else(
        || quote! { ::amodel::ModelClass::new(#class_name) },
        |parent| {
            quote! { ::amodel::ModelClass::extend(<#parent as ::amodel::ActiveModel>::class(), #class_name) }
        },
    );
    let declarations = specs.iter().map(|spec| spec.declaration(&class_name));
    let accessors = specs.iter().map(|spec| spec.accessors(vis));

    Ok(quote! {
        #(#docs)*
        #[derive(Debug, Clone, PartialEq)]
        #vis struct #ident {
            model: ::amodel::Model,
        }

        #[automatically_derived]
        impl ::amodel::ActiveModel for #ident {
            /// # Panics
            ///
            /// On first use, if the engine rejects a field declaration. The message
            /// names the class, the field and the rejected descriptor.
            fn class() -> &'static ::amodel::ModelClass {
                static CLASS: ::std::sync::LazyLock<::amodel::ModelClass> =
                    ::std::sync::LazyLock::new(|| {
                        let class = #class_init;
                        #(#declarations)*
                        class
                    });
                &CLASS
            }

            fn from_model_unchecked(model: ::amodel::Model) -> Self {
                Self { model }
            }

            fn model(&self) -> &::amodel::Model {
                &self.model
            }
        }

        impl #ident {
            #(#accessors)*
        }

        impl ::std::ops::Deref for #ident {
            type Target = ::amodel::Model;

            fn deref(&self) -> &Self::Target {
                &self.model
            }
        }

        impl ::std::convert::From<#ident> for ::amodel::Value {
            fn from(value: #ident) -> Self {
                ::amodel::Value::Model(value.model)
            }
        }

        impl ::amodel::FromValue for #ident {
            fn from_value(value: ::amodel::Value) -> Option<Self> {
                match value {
                    ::amodel::Value::Model(model) => <Self as ::amodel::ActiveModel>::from_model(model),
                    _ => None,
                }
            }
        }
    })
}

fn parse_args(args: TokenStream) -> syn::Result<ModelArgs> {
    let mut parsed = ModelArgs::default();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            parsed.name = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("extends") {
            parsed.extends = Some(meta.value()?.parse()?);
        } else {
            return Err(meta.error("unsupported active_model argument; expected `name` or `extends`"));
        }
        Ok(())
    });
    parser.parse2(args)?;
    Ok(parsed)
}

impl FieldSpec {
    fn parse(field: &syn::Field) -> syn::Result<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(field, "active_model fields must be named"))?;
        let key = LitStr::new(&ident.to_string(), ident.span());

        let mut spec = Self {
            ident,
            ty: field.ty.clone(),
            key,
            flags: Vec::new(),
            attribute: None,
            attribute_with: None,
            getter: None,
            setter: None,
            validator: None,
            factory: None,
            factory_default: None,
            computed: false,
        };

        for attr in field.attrs.iter().filter(|a| a.path().is_ident("field")) {
            spec.parse_options(attr)?;
        }

        if spec.computed && spec.getter.is_none() {
            return Err(syn::Error::new_spanned(&spec.ident, "computed fields need a `getter`"));
        }
        if spec.factory_default.is_some() && spec.factory.is_none() {
            return Err(syn::Error::new_spanned(
                &spec.ident,
                "`factory_default` requires `factory`",
            ));
        }
        Ok(spec)
    }

    fn parse_options(&mut self, attr: &Attribute) -> syn::Result<()> {
        attr.parse_nested_meta(|meta| {
            if let Some(flag) = FLAGS.iter().find(|flag| meta.path.is_ident(flag)) {
                self.flags.push(Ident::new(flag, Span::call_site()));
                return Ok(());
            }
            let Some(option) = meta.path.get_ident().map(ToString::to_string) else {
                return Err(meta.error("unsupported field option"));
            };
            match option.as_str() {
                "computed" => self.computed = true,
                "rename" => self.key = meta.value()?.parse()?,
                "attribute" => self.attribute = Some(meta.value()?.parse()?),
                "attribute_with" => self.attribute_with = Some(parse_path(&meta)?),
                "getter" => self.getter = Some(parse_path(&meta)?),
                "setter" => self.setter = Some(parse_path(&meta)?),
                "validator" => self.validator = Some(parse_path(&meta)?),
                "factory" => self.factory = Some(parse_path(&meta)?),
                "factory_default" => self.factory_default = Some(parse_path(&meta)?),
                _ => return Err(meta.error(format!("unsupported field option `{option}`"))),
            }
            Ok(())
        })
    }

    fn declaration(&self, class_name: &LitStr) -> TokenStream {
        let key = &self.key;

        if self.computed {
            let getter = &self.getter;
            return quote! { class.define_getter(#key, #getter); };
        }

        let flags = &self.flags;
        let mut chain = quote! { ::amodel::FieldDescriptor::new() #(.#flags())* };
        if let Some(value) = &self.attribute {
            chain.extend(quote! { .attribute(#value) });
        }
        if let Some(factory) = &self.attribute_with {
            chain.extend(quote! { .attribute_with(#factory) });
        }
        if let Some(getter) = &self.getter {
            chain.extend(quote! { .getter(#getter) });
        }
        if let Some(setter) = &self.setter {
            chain.extend(quote! { .setter(#setter) });
        }
        if let Some(validator) = &self.validator {
            chain.extend(quote! { .validator(#validator) });
        }
        if let Some(model) = &self.factory {
            let class = quote! { <#model as ::amodel::ActiveModel>::class().clone() };
            let config = self.factory_default.as_ref().map_or_else(
                || quote! { ::amodel::FactoryConfig::Class(#class) },
                |default| quote! { ::amodel::FactoryConfig::with_default(#class, #default) },
            );
            chain.extend(quote! { .factory(#config) });
        }

        let declared = LitStr::new(&chain.to_string(), Span::call_site());
        quote! {
            if let Err(err) = class.field(#key, #chain) {
                panic!("invalid declaration of `{}.{}` ({}): {err}", #class_name, #key, #declared);
            }
        }
    }

    fn accessors(&self, vis: &syn::Visibility) -> TokenStream {
        let Self { ident, ty, key, .. } = self;
        let reader = quote! {
            #[must_use]
            #vis fn #ident(&self) -> Option<#ty> {
                self.model.get(#key).and_then(<#ty as ::amodel::FromValue>::from_value)
            }
        };
        if self.computed {
            return reader;
        }

        let writer = format_ident!("set_{}", ident);
        quote! {
            #reader

            #vis fn #writer(
                &self,
                value: impl Into<::amodel::Value>,
            ) -> ::std::result::Result<bool, ::amodel::ModelError> {
                self.model.set(#key, value)
            }
        }
    }
}

fn parse_path(meta: &ParseNestedMeta<'_>) -> syn::Result<Path> {
    meta.value()?.parse()
}
