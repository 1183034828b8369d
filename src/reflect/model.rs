use crate::parser::span::Span;
use crate::reflect::evaluator::DefaultExpr;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ClassId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConstantId(pub(crate) u32);

/// A parameter's declared type hint. `Named` keeps both the name as written
/// and the name after namespace/alias resolution; the referenced class is
/// looked up lazily, so a hint can point at a class parsed later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HintKind {
    Array,
    Named { raw: String, qualified: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeHint {
    pub nullable: bool,
    pub kind: HintKind,
}

/// One parsed parameter. Immutable once its declaration has been bound.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterDescriptor {
    pub position: usize,
    pub name: String,
    pub type_hint: Option<TypeHint>,
    pub by_ref: bool,
    pub variadic: bool,
    pub promoted: bool,
    pub default: Option<DefaultExpr>,
    /// Set by the post-pass: optional by its own default/variadic marker or
    /// forced optional by following an optional sibling.
    pub optional: bool,
    pub declaring_function: Option<FunctionId>,
    pub declaring_class: Option<ClassId>,
    pub span: Span,
}

impl ParameterDescriptor {
    /// Untyped parameters, explicitly nullable hints and `null` defaults all
    /// accept null.
    pub fn allows_null(&self) -> bool {
        let Some(hint) = &self.type_hint else {
            return true;
        };
        if hint.nullable {
            return true;
        }
        self.default
            .as_ref()
            .is_some_and(|default| default.is_null_literal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FunctionKind {
    Function,
    Method,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDescriptor {
    /// Short name; the namespace is kept separately.
    pub name: String,
    /// Owning namespace, empty for the global namespace. Methods inherit
    /// their class's namespace here.
    pub namespace: String,
    pub kind: FunctionKind,
    pub class: Option<ClassId>,
    pub parameters: Vec<ParameterDescriptor>,
    pub returns_reference: bool,
    pub is_abstract: bool,
    pub is_static: bool,
    pub doc_comment: Option<String>,
    pub span: Span,
}

impl FunctionDescriptor {
    /// Fully qualified name for free functions; methods answer with their
    /// short name, as PHP's reflection does.
    pub fn qualified_name(&self) -> String {
        if self.kind == FunctionKind::Method || self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}\\{}", self.namespace, self.name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
    Enum,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDescriptor {
    pub name: String,
    pub namespace: String,
    pub kind: ClassKind,
    /// Qualified name of the `extends` target, unresolved until queried.
    pub parent: Option<String>,
    /// Qualified names of `implements` (or interface `extends`) targets.
    pub interfaces: Vec<String>,
    pub is_abstract: bool,
    pub is_final: bool,
    /// Pre-seeded engine classes carry no source declaration.
    pub is_internal: bool,
    pub methods: Vec<FunctionId>,
    pub doc_comment: Option<String>,
    pub span: Span,
}

impl ClassDescriptor {
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}\\{}", self.namespace, self.name)
        }
    }
}

/// A `const NAME = <expr>;` declaration collected from a source unit.
#[derive(Debug, Clone, Serialize)]
pub struct ConstantDescriptor {
    pub name: String,
    pub namespace: String,
    pub default: DefaultExpr,
    pub span: Span,
}

impl ConstantDescriptor {
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}\\{}", self.namespace, self.name)
        }
    }
}
