use crate::parser::span::Span;
use crate::parser::stream::TokenStream;
use crate::reflect::binder::{Binder, UnitReport};
use crate::reflect::config::ParseConfig;
use crate::reflect::constants::{BuiltinConstants, ConstantResolver};
use crate::reflect::error::ReflectionError;
use crate::reflect::evaluator::Evaluation;
use crate::reflect::model::{
    ClassDescriptor, ClassId, ClassKind, ConstantDescriptor, ConstantId, FunctionDescriptor,
    FunctionId, FunctionKind, HintKind, ParameterDescriptor, TypeHint,
};
use crate::reflect::value::Value;
use indexmap::IndexMap;
use std::io;
use std::path::Path;

/// Engine classes that are always known, so that type hints on them resolve
/// without a source declaration. Mirrors PHP's built-in class table.
const INTERNAL_CLASSES: &[(&str, ClassKind)] = &[
    ("Throwable", ClassKind::Interface),
    ("Traversable", ClassKind::Interface),
    ("Iterator", ClassKind::Interface),
    ("IteratorAggregate", ClassKind::Interface),
    ("ArrayAccess", ClassKind::Interface),
    ("Countable", ClassKind::Interface),
    ("Stringable", ClassKind::Interface),
    ("Serializable", ClassKind::Interface),
    ("DateTimeInterface", ClassKind::Interface),
    ("Exception", ClassKind::Class),
    ("Error", ClassKind::Class),
    ("TypeError", ClassKind::Class),
    ("ValueError", ClassKind::Class),
    ("RuntimeException", ClassKind::Class),
    ("LogicException", ClassKind::Class),
    ("InvalidArgumentException", ClassKind::Class),
    ("stdClass", ClassKind::Class),
    ("Closure", ClassKind::Class),
    ("Generator", ClassKind::Class),
    ("ArrayObject", ClassKind::Class),
    ("ArrayIterator", ClassKind::Class),
    ("SplStack", ClassKind::Class),
    ("SplFileInfo", ClassKind::Class),
    ("DateTime", ClassKind::Class),
    ("DateTimeImmutable", ClassKind::Class),
    ("DateInterval", ClassKind::Class),
];

/// The descriptor arena and name tables: the "broker" every reflection view
/// borrows from. Descriptors are immutable once their unit has been parsed.
#[derive(Debug)]
pub struct Registry {
    config: ParseConfig,
    functions: Vec<FunctionDescriptor>,
    classes: Vec<ClassDescriptor>,
    constants: Vec<ConstantDescriptor>,
    /// Lowercased fully-qualified name -> id, free functions only.
    function_names: IndexMap<String, FunctionId>,
    /// Lowercased fully-qualified name -> id.
    class_names: IndexMap<String, ClassId>,
    /// Fully-qualified name -> id, case-sensitive as PHP constants are.
    constant_names: IndexMap<String, ConstantId>,
    builtins: BuiltinConstants,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(ParseConfig::default())
    }

    pub fn with_config(config: ParseConfig) -> Self {
        let mut registry = Self {
            config,
            functions: Vec::new(),
            classes: Vec::new(),
            constants: Vec::new(),
            function_names: IndexMap::new(),
            class_names: IndexMap::new(),
            constant_names: IndexMap::new(),
            builtins: BuiltinConstants,
        };
        for (name, kind) in INTERNAL_CLASSES {
            registry.add_class(ClassDescriptor {
                name: (*name).to_string(),
                namespace: String::new(),
                kind: *kind,
                parent: None,
                interfaces: Vec::new(),
                is_abstract: false,
                is_final: false,
                is_internal: true,
                methods: Vec::new(),
                doc_comment: None,
                span: Span::default(),
            });
        }
        registry
    }

    pub fn config(&self) -> ParseConfig {
        self.config
    }

    /// Parse one source unit and add its declarations. Structural errors are
    /// local to a declaration; everything else in the unit still lands in
    /// the registry, and the report lists what failed.
    pub fn parse_source(&mut self, unit: &str, source: &[u8]) -> UnitReport {
        let stream = TokenStream::new(source);
        Binder::new(self, &stream, unit).run()
    }

    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> io::Result<UnitReport> {
        let path = path.as_ref();
        let source = std::fs::read(path)?;
        Ok(self.parse_source(&path.to_string_lossy(), &source))
    }

    pub fn function(&self, name: &str) -> Option<ReflectionFunction<'_>> {
        let key = name.trim_start_matches('\\').to_ascii_lowercase();
        let id = *self.function_names.get(&key)?;
        Some(ReflectionFunction { registry: self, id })
    }

    pub fn class(&self, name: &str) -> Option<ReflectionClass<'_>> {
        let id = self.class_id_by_qualified(name)?;
        Some(ReflectionClass { registry: self, id })
    }

    pub fn constant(&self, name: &str) -> Option<&ConstantDescriptor> {
        let key = name.trim_start_matches('\\');
        let id = *self.constant_names.get(key)?;
        Some(&self.constants[id.0 as usize])
    }

    /// All free functions, in registration order.
    pub fn functions(&self) -> impl Iterator<Item = ReflectionFunction<'_>> {
        self.function_names
            .values()
            .map(|id| ReflectionFunction {
                registry: self,
                id: *id,
            })
    }

    /// All classes, internal ones included, in registration order.
    pub fn classes(&self) -> impl Iterator<Item = ReflectionClass<'_>> {
        (0..self.classes.len()).map(|index| ReflectionClass {
            registry: self,
            id: ClassId(index as u32),
        })
    }

    pub fn constants(&self) -> &[ConstantDescriptor] {
        &self.constants
    }

    pub fn function_descriptors(&self) -> &[FunctionDescriptor] {
        &self.functions
    }

    pub fn class_descriptors(&self) -> &[ClassDescriptor] {
        &self.classes
    }

    pub(crate) fn class_id_by_qualified(&self, name: &str) -> Option<ClassId> {
        let key = name.trim_start_matches('\\').to_ascii_lowercase();
        self.class_names.get(&key).copied()
    }

    /// Binding step: assign the owner ids on every parameter, then register.
    pub(crate) fn add_function(&mut self, mut descriptor: FunctionDescriptor) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        for parameter in &mut descriptor.parameters {
            parameter.declaring_function = Some(id);
            parameter.declaring_class = descriptor.class;
        }
        if descriptor.kind == FunctionKind::Function {
            self.function_names
                .insert(descriptor.qualified_name().to_ascii_lowercase(), id);
        }
        self.functions.push(descriptor);
        id
    }

    pub(crate) fn add_class(&mut self, descriptor: ClassDescriptor) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.class_names
            .insert(descriptor.qualified_name().to_ascii_lowercase(), id);
        self.classes.push(descriptor);
        id
    }

    pub(crate) fn attach_method(&mut self, class: ClassId, method: FunctionId) {
        self.classes[class.0 as usize].methods.push(method);
    }

    pub(crate) fn add_constant(&mut self, descriptor: ConstantDescriptor) -> ConstantId {
        let id = ConstantId(self.constants.len() as u32);
        self.constant_names.insert(descriptor.qualified_name(), id);
        self.constants.push(descriptor);
        id
    }

    /// Constant lookup with PHP's fallback rules: an unqualified name tries
    /// the current namespace, then the global namespace, then the engine
    /// constants; qualified names resolve exactly.
    pub(crate) fn lookup_constant_value(&self, namespace: &str, name: &str) -> Option<Value> {
        let user = |key: &str| -> Option<Value> {
            let id = self.constant_names.get(key)?;
            match &self.constants[id.0 as usize].default.evaluation {
                Evaluation::Value(value) => Some(value.clone()),
                _ => None,
            }
        };

        if let Some(absolute) = name.strip_prefix('\\') {
            return user(absolute).or_else(|| {
                if absolute.contains('\\') {
                    None
                } else {
                    self.builtins.resolve_constant(absolute.as_bytes())
                }
            });
        }

        if name.contains('\\') {
            return if namespace.is_empty() {
                user(name)
            } else {
                user(&format!("{namespace}\\{name}"))
            };
        }

        if !namespace.is_empty() {
            if let Some(value) = user(&format!("{namespace}\\{name}")) {
                return Some(value);
            }
        }
        user(name).or_else(|| self.builtins.resolve_constant(name.as_bytes()))
    }
}

/// Read-only view of a function or method.
#[derive(Debug, Clone, Copy)]
pub struct ReflectionFunction<'r> {
    registry: &'r Registry,
    id: FunctionId,
}

impl<'r> ReflectionFunction<'r> {
    fn descriptor(&self) -> &'r FunctionDescriptor {
        &self.registry.functions[self.id.0 as usize]
    }

    pub fn id(&self) -> FunctionId {
        self.id
    }

    /// Fully qualified name for free functions, short name for methods.
    pub fn name(&self) -> String {
        self.descriptor().qualified_name()
    }

    pub fn short_name(&self) -> &'r str {
        &self.descriptor().name
    }

    pub fn namespace_name(&self) -> &'r str {
        &self.descriptor().namespace
    }

    pub fn is_method(&self) -> bool {
        self.descriptor().kind == FunctionKind::Method
    }

    pub fn is_abstract(&self) -> bool {
        self.descriptor().is_abstract
    }

    pub fn is_static(&self) -> bool {
        self.descriptor().is_static
    }

    pub fn returns_reference(&self) -> bool {
        self.descriptor().returns_reference
    }

    pub fn doc_comment(&self) -> Option<&'r str> {
        self.descriptor().doc_comment.as_deref()
    }

    pub fn parameters(&self) -> impl Iterator<Item = ReflectionParameter<'r>> + use<'r> {
        let registry = self.registry;
        let id = self.id;
        (0..self.descriptor().parameters.len()).map(move |index| ReflectionParameter {
            registry,
            function: id,
            index,
        })
    }

    pub fn parameter(&self, position: usize) -> Option<ReflectionParameter<'r>> {
        if position < self.descriptor().parameters.len() {
            Some(ReflectionParameter {
                registry: self.registry,
                function: self.id,
                index: position,
            })
        } else {
            None
        }
    }

    pub fn parameter_by_name(&self, name: &str) -> Option<ReflectionParameter<'r>> {
        self.descriptor()
            .parameters
            .iter()
            .position(|p| p.name == name)
            .and_then(|index| self.parameter(index))
    }

    pub fn declaring_class(&self) -> Option<ReflectionClass<'r>> {
        self.descriptor().class.map(|id| ReflectionClass {
            registry: self.registry,
            id,
        })
    }

    pub fn declaring_class_name(&self) -> Option<String> {
        self.declaring_class().map(|class| class.name())
    }
}

/// Read-only view of a class-like declaration.
#[derive(Debug, Clone, Copy)]
pub struct ReflectionClass<'r> {
    registry: &'r Registry,
    id: ClassId,
}

impl<'r> ReflectionClass<'r> {
    fn descriptor(&self) -> &'r ClassDescriptor {
        &self.registry.classes[self.id.0 as usize]
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> String {
        self.descriptor().qualified_name()
    }

    pub fn short_name(&self) -> &'r str {
        &self.descriptor().name
    }

    pub fn namespace_name(&self) -> &'r str {
        &self.descriptor().namespace
    }

    pub fn kind(&self) -> ClassKind {
        self.descriptor().kind
    }

    pub fn is_interface(&self) -> bool {
        self.descriptor().kind == ClassKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.descriptor().is_abstract
    }

    pub fn is_final(&self) -> bool {
        self.descriptor().is_final
    }

    pub fn is_internal(&self) -> bool {
        self.descriptor().is_internal
    }

    pub fn doc_comment(&self) -> Option<&'r str> {
        self.descriptor().doc_comment.as_deref()
    }

    pub fn parent_name(&self) -> Option<&'r str> {
        self.descriptor().parent.as_deref()
    }

    pub fn interface_names(&self) -> &'r [String] {
        &self.descriptor().interfaces
    }

    pub fn methods(&self) -> impl Iterator<Item = ReflectionFunction<'r>> + use<'r> {
        let registry = self.registry;
        self.descriptor()
            .methods
            .iter()
            .map(move |id| ReflectionFunction { registry, id: *id })
    }

    pub fn method(&self, name: &str) -> Option<ReflectionFunction<'r>> {
        self.methods()
            .find(|m| m.short_name().eq_ignore_ascii_case(name))
    }
}

/// Read-only view of one parameter: position, nullability, optionality,
/// defaults, hints and owner back-references.
#[derive(Debug, Clone, Copy)]
pub struct ReflectionParameter<'r> {
    registry: &'r Registry,
    function: FunctionId,
    index: usize,
}

impl<'r> ReflectionParameter<'r> {
    fn descriptor(&self) -> &'r ParameterDescriptor {
        &self.registry.functions[self.function.0 as usize].parameters[self.index]
    }

    pub fn position(&self) -> usize {
        self.descriptor().position
    }

    pub fn name(&self) -> &'r str {
        &self.descriptor().name
    }

    pub fn allows_null(&self) -> bool {
        self.descriptor().allows_null()
    }

    pub fn is_optional(&self) -> bool {
        self.descriptor().optional
    }

    pub fn is_variadic(&self) -> bool {
        self.descriptor().variadic
    }

    pub fn is_passed_by_reference(&self) -> bool {
        self.descriptor().by_ref
    }

    pub fn is_promoted(&self) -> bool {
        self.descriptor().promoted
    }

    pub fn type_hint(&self) -> Option<&'r TypeHint> {
        self.descriptor().type_hint.as_ref()
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self.descriptor().type_hint,
            Some(TypeHint {
                kind: HintKind::Array,
                ..
            })
        )
    }

    pub fn is_default_value_available(&self) -> bool {
        self.descriptor().default.is_some()
    }

    /// The concrete default value. Fails with `NoDefaultValue` when there is
    /// no default at all (distinct from a default that evaluates to null)
    /// and with `ValueNotEvaluable` when only the definition text exists.
    pub fn default_value(&self) -> Result<&'r Value, ReflectionError> {
        let descriptor = self.descriptor();
        match &descriptor.default {
            None => Err(ReflectionError::NoDefaultValue {
                parameter: descriptor.name.clone(),
            }),
            Some(default) => match &default.evaluation {
                Evaluation::Value(value) => Ok(value),
                Evaluation::NotEvaluable | Evaluation::Disabled => {
                    Err(ReflectionError::ValueNotEvaluable {
                        parameter: descriptor.name.clone(),
                        definition: default.definition.clone(),
                    })
                }
            },
        }
    }

    /// The default expression exactly as written, `None` without a default.
    pub fn default_value_definition(&self) -> Option<&'r str> {
        self.descriptor()
            .default
            .as_ref()
            .map(|d| d.definition.as_str())
    }

    /// Resolved name of the class-type hint, `None` when the hint is absent
    /// or the `array` marker.
    pub fn class_name(&self) -> Option<&'r str> {
        match &self.descriptor().type_hint {
            Some(TypeHint {
                kind: HintKind::Named { qualified, .. },
                ..
            }) => Some(qualified),
            _ => None,
        }
    }

    /// The hinted class. `Ok(None)` means no class-type hint; a hint naming
    /// a class the registry has not seen is the distinct `UnresolvedClass`
    /// signal, resolved anew on every call so a later unit can supply it.
    pub fn class(&self) -> Result<Option<ReflectionClass<'r>>, ReflectionError> {
        match self.class_name() {
            None => Ok(None),
            Some(name) => match self.registry.class_id_by_qualified(name) {
                Some(id) => Ok(Some(ReflectionClass {
                    registry: self.registry,
                    id,
                })),
                None => Err(ReflectionError::UnresolvedClass {
                    name: name.to_string(),
                }),
            },
        }
    }

    pub fn declaring_function(&self) -> ReflectionFunction<'r> {
        ReflectionFunction {
            registry: self.registry,
            id: self.function,
        }
    }

    pub fn declaring_function_name(&self) -> String {
        self.declaring_function().name()
    }

    pub fn declaring_class(&self) -> Option<ReflectionClass<'r>> {
        self.descriptor().declaring_class.map(|id| ReflectionClass {
            registry: self.registry,
            id,
        })
    }

    pub fn declaring_class_name(&self) -> Option<String> {
        self.declaring_class().map(|class| class.name())
    }
}
