//! Declarations produced by the generator before any Rust text exists
//!
//! Everything naming-related is decided while building these values; the
//! renderer only turns them into tokens.

use smol_str::SmolStr;

/// Rust type of a field, alias target or body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Bool,
    Integer,
    Float,
    String,
    Datetime,
    Cid,
    CidLink,
    Did,
    Handle,
    AtUri,
    Nsid,
    Language,
    Uri,
    IpAddr,
    Bytes,
    Blob,
    /// String-keyed map of arbitrary values (`unknown`)
    Data,
    /// Generic object (unions, refs that don't resolve locally)
    AnyObject,
    Vec(Box<TypeRef>),
    Boxed(Box<TypeRef>),
    /// A type generated in the same module
    Named(String),
}

impl TypeRef {
    pub fn vec(inner: TypeRef) -> Self {
        Self::Vec(Box::new(inner))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Names of generated types mentioned anywhere in this type
    pub fn named_types(&self) -> Vec<&str> {
        match self {
            Self::Named(name) => vec![name.as_str()],
            Self::Vec(inner) | Self::Boxed(inner) => inner.named_types(),
            _ => Vec::new(),
        }
    }
}

/// What a definition turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Query,
    Procedure,
    Subscription,
    Record,
    Object,
    Token,
    Alias,
}

/// Output of generating one definition
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedArtifact {
    pub def_name: SmolStr,
    pub kind: ArtifactKind,
    /// Types and constants, nested types before the types using them
    pub items: Vec<ItemDecl>,
    /// The client method, for XRPC definitions
    pub method: Option<MethodDecl>,
}

impl GeneratedArtifact {
    /// Find a generated item by name
    pub fn item(&self, name: &str) -> Option<&ItemDecl> {
        self.items.iter().find(|item| item.name() == name)
    }

    /// Find a generated struct by name
    pub fn struct_decl(&self, name: &str) -> Option<&StructDecl> {
        match self.item(name) {
            Some(ItemDecl::Struct(decl)) => Some(decl),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemDecl {
    Struct(StructDecl),
    Alias(AliasDecl),
    Const(ConstDecl),
    ErrorKind(ErrorKindDecl),
}

impl ItemDecl {
    pub fn name(&self) -> &str {
        match self {
            Self::Struct(decl) => &decl.name,
            Self::Alias(decl) => &decl.name,
            Self::Const(decl) => &decl.name,
            Self::ErrorKind(decl) => &decl.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub doc: Option<String>,
    pub fields: Vec<FieldDecl>,
    /// Set for record types
    pub collection: Option<CollectionDecl>,
}

impl StructDecl {
    /// Field by its wire name
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Every field is optional, so the struct can derive `Default`
    pub fn all_optional(&self) -> bool {
        self.fields.iter().all(FieldDecl::is_option)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Property name on the wire
    pub name: SmolStr,
    /// Rust field name, before keyword escaping
    pub ident: String,
    pub ty: TypeRef,
    pub required: bool,
    pub nullable: bool,
    pub doc: Option<String>,
}

impl FieldDecl {
    /// Whether the field is wrapped in `Option`
    pub fn is_option(&self) -> bool {
        !self.required || self.nullable
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDecl {
    pub nsid: String,
    pub key: SmolStr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasDecl {
    pub name: String,
    pub doc: Option<String>,
    pub target: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstDecl {
    pub name: String,
    pub doc: Option<String>,
    pub value: String,
}

/// Enum of the errors an XRPC method declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorKindDecl {
    pub name: String,
    pub variants: Vec<ErrorVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorVariant {
    pub ident: String,
    /// Error name on the wire
    pub code: SmolStr,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Query,
    Procedure,
    Subscription,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputDecl {
    None,
    /// JSON body of the named type
    Json(String),
    /// Raw bytes sent with the declared encoding
    Raw { encoding: SmolStr },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDecl {
    Void,
    /// JSON body decoded into the named type
    Json(String),
    /// Body handed back as bytes
    Raw,
}

/// One method on a generated client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    /// XRPC method id sent to the transport
    pub nsid: String,
    pub kind: MethodKind,
    pub doc: Option<String>,
    /// Parameter struct, when the method declares parameters
    pub params: Option<String>,
    pub input: InputDecl,
    pub output: OutputDecl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDecl {
    pub name: String,
    pub doc: Option<String>,
    pub methods: Vec<MethodDecl>,
}

/// Everything generated for one document
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDecl {
    pub nsid: String,
    pub doc: Option<String>,
    pub client: Option<ClientDecl>,
    pub items: Vec<ItemDecl>,
}
