use super::ast::{
    AliasDecl, ClientDecl, ConstDecl, ErrorKindDecl, FieldDecl, InputDecl, ItemDecl, MethodDecl,
    MethodKind, ModuleDecl, OutputDecl, StructDecl, TypeRef,
};
use super::utils::{doc_attrs, inner_doc_attrs, make_ident};
use super::GeneratorConfig;
use crate::error::{LexiconError, Result};
use proc_macro2::TokenStream;
use quote::quote;

/// Turns declarations into tokens referring to the configured runtime crate
pub(super) struct Renderer {
    rt: syn::Path,
}

impl Renderer {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let rt = syn::parse_str::<syn::Path>(&config.runtime_crate).map_err(|e| {
            LexiconError::unsupported(
                "runtime crate",
                format!("`{}` is not a Rust path: {e}", config.runtime_crate),
            )
        })?;
        Ok(Self { rt })
    }

    /// Module contents: inner docs, the client, then every item
    pub fn module(&self, module: &ModuleDecl) -> TokenStream {
        let docs = inner_doc_attrs(module.doc.as_deref());
        let client = module.client.as_ref().map(|c| self.client(c));
        let items = module.items.iter().map(|item| self.item(item));
        quote! {
            #docs
            #client
            #(#items)*
        }
    }

    fn item(&self, item: &ItemDecl) -> TokenStream {
        match item {
            ItemDecl::Struct(decl) => self.struct_decl(decl),
            ItemDecl::Alias(decl) => self.alias(decl),
            ItemDecl::Const(decl) => self.constant(decl),
            ItemDecl::ErrorKind(decl) => self.error_kind(decl),
        }
    }

    pub fn rust_type(&self, ty: &TypeRef) -> TokenStream {
        let rt = &self.rt;
        match ty {
            TypeRef::Bool => quote!(bool),
            TypeRef::Integer => quote!(i64),
            TypeRef::Float => quote!(f64),
            TypeRef::String => quote!(::std::string::String),
            TypeRef::Datetime => quote!(#rt::types::Datetime),
            TypeRef::Cid => quote!(#rt::types::Cid),
            TypeRef::CidLink => quote!(#rt::types::CidLink),
            TypeRef::Did => quote!(#rt::types::Did),
            TypeRef::Handle => quote!(#rt::types::Handle),
            TypeRef::AtUri => quote!(#rt::types::AtUri),
            TypeRef::Nsid => quote!(#rt::types::Nsid),
            TypeRef::Language => quote!(#rt::types::Language),
            TypeRef::Uri => quote!(#rt::types::Uri),
            TypeRef::IpAddr => quote!(::std::net::IpAddr),
            TypeRef::Bytes => quote!(#rt::bytes::Bytes),
            TypeRef::Blob => quote!(#rt::types::Blob),
            TypeRef::Data => quote!(#rt::types::Data),
            TypeRef::AnyObject => quote!(#rt::types::AnyObject),
            TypeRef::Vec(inner) => {
                let inner = self.rust_type(inner);
                quote!(::std::vec::Vec<#inner>)
            }
            TypeRef::Boxed(inner) => {
                let inner = self.rust_type(inner);
                quote!(::std::boxed::Box<#inner>)
            }
            TypeRef::Named(name) => {
                let ident = make_ident(name);
                quote!(#ident)
            }
        }
    }

    fn struct_decl(&self, decl: &StructDecl) -> TokenStream {
        let docs = doc_attrs(decl.doc.as_deref());
        let name = make_ident(&decl.name);
        let fields = decl.fields.iter().map(|f| self.field(f));
        let default = decl.all_optional().then(|| quote!(Default,));
        let collection = decl.collection.as_ref().map(|c| {
            let rt = &self.rt;
            let nsid = &c.nsid;
            let key = c.key.as_str();
            quote! {
                impl #rt::types::Collection for #name {
                    const NSID: &'static str = #nsid;
                    const KEY: &'static str = #key;
                }
            }
        });
        quote! {
            #docs
            #[derive(Debug, Clone, PartialEq, #default ::serde::Serialize, ::serde::Deserialize)]
            pub struct #name {
                #(#fields)*
            }
            #collection
        }
    }

    fn field(&self, field: &FieldDecl) -> TokenStream {
        let docs = doc_attrs(field.doc.as_deref());
        let ident = make_ident(&field.ident);
        let rename = (ident.to_string().trim_start_matches("r#") != field.name.as_str()).then(|| {
            let wire = field.name.as_str();
            quote!(#[serde(rename = #wire)])
        });
        let inner = self.rust_type(&field.ty);
        let (ty, skip) = match (field.required, field.nullable) {
            (true, false) => (inner, None),
            (true, true) => (quote!(::std::option::Option<#inner>), None),
            (false, _) => (
                quote!(::std::option::Option<#inner>),
                Some(quote! {
                    #[serde(default, skip_serializing_if = "::std::option::Option::is_none")]
                }),
            ),
        };
        quote! {
            #docs
            #rename
            #skip
            pub #ident: #ty,
        }
    }

    fn alias(&self, decl: &AliasDecl) -> TokenStream {
        let docs = doc_attrs(decl.doc.as_deref());
        let name = make_ident(&decl.name);
        let target = self.rust_type(&decl.target);
        quote! {
            #docs
            pub type #name = #target;
        }
    }

    fn constant(&self, decl: &ConstDecl) -> TokenStream {
        let docs = doc_attrs(decl.doc.as_deref());
        let name = make_ident(&decl.name);
        let value = &decl.value;
        quote! {
            #docs
            pub const #name: &str = #value;
        }
    }

    fn error_kind(&self, decl: &ErrorKindDecl) -> TokenStream {
        let rt = &self.rt;
        let name = make_ident(&decl.name);
        let variants: Vec<_> = decl.variants.iter().map(|v| make_ident(&v.ident)).collect();
        let variant_docs = decl.variants.iter().map(|v| doc_attrs(v.doc.as_deref()));
        let codes: Vec<_> = decl.variants.iter().map(|v| v.code.as_str()).collect();
        quote! {
            /// Errors this method declares
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum #name {
                #(
                    #variant_docs
                    #variants,
                )*
            }

            impl #name {
                /// Error name on the wire
                pub fn as_str(&self) -> &'static str {
                    match self {
                        #(Self::#variants => #codes,)*
                    }
                }

                /// Match a server error against the declared errors
                pub fn from_error(err: &#rt::XrpcError) -> ::std::option::Option<Self> {
                    match err.error_code.as_str() {
                        #(#codes => ::std::option::Option::Some(Self::#variants),)*
                        _ => ::std::option::Option::None,
                    }
                }
            }

            impl ::std::fmt::Display for #name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        }
    }

    fn client(&self, client: &ClientDecl) -> TokenStream {
        let rt = &self.rt;
        let docs = doc_attrs(client.doc.as_deref());
        let name = make_ident(&client.name);
        let methods = client.methods.iter().map(|m| self.method(m));
        quote! {
            #docs
            #[derive(Debug, Clone)]
            pub struct #name<T> {
                transport: T,
            }

            impl<T> #name<T> {
                /// Create a client sending through `transport`
                pub fn new(transport: T) -> Self {
                    Self { transport }
                }

                /// The transport this client sends through
                pub fn transport(&self) -> &T {
                    &self.transport
                }
            }

            impl<T: #rt::XrpcTransport> #name<T> {
                #(#methods)*
            }
        }
    }

    fn method(&self, method: &MethodDecl) -> TokenStream {
        let rt = &self.rt;
        let docs = doc_attrs(method.doc.as_deref());
        let name = make_ident(&method.name);
        let nsid = &method.nsid;
        let headers_ty = quote!(::std::option::Option<#rt::xrpc::Headers>);

        let params_ty = method.params.as_deref().map(|p| {
            let ident = make_ident(p);
            quote!(&#ident)
        });

        if method.kind == MethodKind::Subscription {
            let params_arg = params_ty.map(|ty| quote!(_params: #ty,));
            return quote! {
                #docs
                ///
                /// Event streams need a streaming transport, so this always
                /// returns `ClientError::Unsupported`.
                pub fn #name(&self, #params_arg _headers: #headers_ty) -> #rt::XrpcResult<()> {
                    ::std::result::Result::Err(#rt::ClientError::unsupported(#nsid))
                }
            };
        }

        let params_arg = params_ty.map(|ty| quote!(params: #ty,));
        let (encode_params, params_expr) = if method.params.is_some() {
            (
                quote!(let params = #rt::xrpc::encode_params(params)?;),
                quote!(::std::option::Option::Some(params)),
            )
        } else {
            (quote!(), quote!(::std::option::Option::None))
        };

        let (input_arg, input_expr) = match &method.input {
            InputDecl::None => (None, quote!(#rt::xrpc::ProcedureInput::Empty)),
            InputDecl::Json(ty) => {
                let ident = make_ident(ty);
                (
                    Some(quote!(input: &#ident,)),
                    quote!(#rt::xrpc::ProcedureInput::json(input)?),
                )
            }
            InputDecl::Raw { encoding } => {
                let encoding = encoding.as_str();
                (
                    Some(quote!(input: #rt::bytes::Bytes,)),
                    quote!(#rt::xrpc::ProcedureInput::bytes(#encoding, input)),
                )
            }
        };

        let (output_ty, decode) = match &method.output {
            OutputDecl::Void => (
                quote!(#rt::xrpc::Void),
                quote!(::std::result::Result::Ok(response.into_void())),
            ),
            OutputDecl::Json(ty) => {
                let ident = make_ident(ty);
                (quote!(#ident), quote!(response.decode_json()))
            }
            OutputDecl::Raw => (
                quote!(#rt::bytes::Bytes),
                quote!(::std::result::Result::Ok(response)),
            ),
        };

        let send = match method.kind {
            MethodKind::Query => quote! {
                self.transport.send_query(#nsid, #params_expr, headers).await?
            },
            _ => quote! {
                self.transport
                    .send_procedure(#nsid, #params_expr, #input_expr, headers)
                    .await?
            },
        };
        let input_arg = if method.kind == MethodKind::Query {
            None
        } else {
            input_arg
        };

        quote! {
            #docs
            pub async fn #name(
                &self,
                #params_arg
                #input_arg
                headers: #headers_ty,
            ) -> #rt::XrpcResult<#rt::Response<#output_ty>> {
                #encode_params
                let response = #send;
                #decode
            }
        }
    }
}

/// Format a token stream as a Rust source file
pub(super) fn format_file(tokens: TokenStream, module: &str) -> Result<String> {
    let file: syn::File = syn::parse2(tokens).map_err(|source| LexiconError::Format {
        module: module.to_string(),
        source,
    })?;
    Ok(prettyplease::unparse(&file))
}
