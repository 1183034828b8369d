use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;
use crate::parser::stream::TokenStream;
use crate::reflect::constants::ConstantResolver;
use crate::reflect::error::ParseError;
use crate::reflect::evaluator::Evaluator;
use crate::reflect::model::{
    ClassDescriptor, ClassId, ClassKind, ConstantDescriptor, ConstantId, FunctionDescriptor,
    FunctionId, FunctionKind, HintKind,
};
use crate::reflect::params::{ParameterListBuilder, skip_balanced};
use crate::reflect::registry::Registry;
use crate::reflect::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

/// Outcome of binding one source unit. Per-declaration errors are recorded
/// here; the declarations around them were still parsed.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub unit: String,
    pub errors: Vec<ParseError>,
    pub functions: Vec<FunctionId>,
    pub classes: Vec<ClassId>,
    pub constants: Vec<ConstantId>,
}

impl UnitReport {
    fn new(unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
            errors: Vec::new(),
            functions: Vec::new(),
            classes: Vec::new(),
            constants: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Type names that never resolve against the current namespace.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "int", "float", "string", "bool", "mixed", "never", "void", "null", "false", "true",
    "callable", "iterable", "object", "array", "self", "parent", "static",
];

/// PHP's class-name resolution: leading `\` is absolute, the first segment
/// is matched case-insensitively against use-aliases, anything else is
/// prefixed with the current namespace.
pub(crate) fn resolve_class_name(
    namespace: &str,
    aliases: &IndexMap<String, String>,
    raw: &str,
) -> String {
    if RESERVED_TYPE_NAMES
        .iter()
        .any(|r| raw.eq_ignore_ascii_case(r))
    {
        return raw.to_string();
    }

    if let Some(absolute) = raw.strip_prefix('\\') {
        return absolute.to_string();
    }

    let (first, rest) = match raw.split_once('\\') {
        Some((first, rest)) => (first, Some(rest)),
        None => (raw, None),
    };
    if let Some(target) = aliases.get(&first.to_ascii_lowercase()) {
        return match rest {
            Some(rest) => format!("{target}\\{rest}"),
            None => target.clone(),
        };
    }

    if namespace.is_empty() {
        raw.to_string()
    } else {
        format!("{namespace}\\{raw}")
    }
}

/// Constant lookup scoped to the namespace a declaration is parsed in.
struct UnitConstantResolver<'a> {
    registry: &'a Registry,
    namespace: &'a str,
}

impl ConstantResolver for UnitConstantResolver<'_> {
    fn resolve_constant(&self, name: &[u8]) -> Option<Value> {
        self.registry
            .lookup_constant_value(self.namespace, &String::from_utf8_lossy(name))
    }
}

/// Walks a unit's token stream, builds descriptors for every declaration it
/// finds, and binds parameters to their owners. A malformed declaration is
/// recorded and dropped; its siblings continue to parse.
pub(crate) struct Binder<'r, 'src> {
    registry: &'r mut Registry,
    stream: &'r TokenStream<'src>,
    pos: usize,
    namespace: String,
    aliases: IndexMap<String, String>,
    report: UnitReport,
}

impl<'r, 'src> Binder<'r, 'src> {
    pub(crate) fn new(
        registry: &'r mut Registry,
        stream: &'r TokenStream<'src>,
        unit: &str,
    ) -> Self {
        Self {
            registry,
            stream,
            pos: 0,
            namespace: String::new(),
            aliases: IndexMap::new(),
            report: UnitReport::new(unit),
        }
    }

    pub(crate) fn run(mut self) -> UnitReport {
        let mut head: Option<usize> = None;
        let mut is_abstract = false;
        let mut is_final = false;

        while self.pos < self.stream.len() {
            match self.kind() {
                TokenKind::Namespace => {
                    head = None;
                    self.parse_namespace();
                }
                TokenKind::Use => {
                    head = None;
                    self.parse_use();
                }
                TokenKind::Const => {
                    head = None;
                    if let Err(error) = self.parse_const() {
                        self.report.errors.push(error);
                        self.recover();
                    }
                }
                TokenKind::Attribute => {
                    head.get_or_insert(self.pos);
                    self.skip_group();
                }
                TokenKind::Abstract => {
                    head.get_or_insert(self.pos);
                    is_abstract = true;
                    self.pos += 1;
                }
                TokenKind::Final => {
                    head.get_or_insert(self.pos);
                    is_final = true;
                    self.pos += 1;
                }
                TokenKind::Readonly if self.next_kind() == TokenKind::Class => {
                    head.get_or_insert(self.pos);
                    self.pos += 1;
                }
                TokenKind::Static if self.next_kind() == TokenKind::Function => {
                    // Static closure; the closure path below skips it.
                    head.get_or_insert(self.pos);
                    self.pos += 1;
                }
                TokenKind::Function if self.prev_kind_is_member_access() => {
                    self.pos += 1;
                }
                TokenKind::Function => {
                    let start = head.take().unwrap_or(self.pos);
                    is_abstract = false;
                    is_final = false;
                    match self.parse_function(None, start, false, false) {
                        Ok(Some(id)) => self.report.functions.push(id),
                        Ok(None) => {}
                        Err(error) => {
                            self.report.errors.push(error);
                            self.recover();
                        }
                    }
                }
                TokenKind::Class
                | TokenKind::Interface
                | TokenKind::Trait
                | TokenKind::Enum => {
                    if self.prev_kind_is_member_access() {
                        // `Foo::class` and friends
                        self.pos += 1;
                        continue;
                    }
                    let start = head.take().unwrap_or(self.pos);
                    let class_flags = (is_abstract, is_final);
                    is_abstract = false;
                    is_final = false;
                    match self.parse_class_like(start, class_flags.0, class_flags.1) {
                        Ok(Some(id)) => self.report.classes.push(id),
                        Ok(None) => {}
                        Err(error) => {
                            self.report.errors.push(error);
                            self.recover();
                        }
                    }
                }
                _ => {
                    head = None;
                    is_abstract = false;
                    is_final = false;
                    self.pos += 1;
                }
            }
        }

        self.report
    }

    fn kind(&self) -> TokenKind {
        self.stream.kind(self.pos)
    }

    fn next_kind(&self) -> TokenKind {
        self.stream.kind(self.pos + 1)
    }

    fn prev_kind_is_member_access(&self) -> bool {
        self.pos > 0
            && matches!(
                self.stream.kind(self.pos - 1),
                TokenKind::Arrow | TokenKind::NullSafeArrow | TokenKind::DoubleColon
            )
    }

    fn span(&self) -> Span {
        self.stream.span(self.pos)
    }

    /// Skip past the balanced bracket group opening at the current token.
    fn skip_group(&mut self) {
        let tokens = self.stream.slice(0..self.stream.len());
        self.pos = skip_balanced(tokens, self.pos);
    }

    fn doc_text(&self, head: usize) -> Option<String> {
        self.stream
            .doc_before(head)
            .map(|span| String::from_utf8_lossy(span.as_str(self.stream.source())).into_owned())
    }

    /// Error recovery: skip to the end of the broken declaration, either the
    /// next top-level `;` or past a brace-delimited body, then continue with
    /// siblings.
    fn recover(&mut self) {
        while self.pos < self.stream.len() {
            match self.kind() {
                TokenKind::SemiColon => {
                    self.pos += 1;
                    return;
                }
                TokenKind::OpenBrace => {
                    self.skip_group();
                    return;
                }
                TokenKind::CloseBrace => return,
                TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::Attribute => {
                    self.skip_group();
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Consume a possibly namespaced name at the cursor. A `\` that is not
    /// followed by a further segment is left unconsumed (it may introduce a
    /// group import brace).
    fn read_name(&mut self) -> Option<String> {
        let mut name: Vec<u8> = Vec::new();
        if self.kind() == TokenKind::NsSeparator && self.next_kind().is_name_like() {
            name.push(b'\\');
            self.pos += 1;
        }
        if !self.kind().is_name_like() {
            return None;
        }
        name.extend_from_slice(self.stream.text(self.pos));
        self.pos += 1;
        while self.kind() == TokenKind::NsSeparator && self.next_kind().is_name_like() {
            name.push(b'\\');
            name.extend_from_slice(self.stream.text(self.pos + 1));
            self.pos += 2;
        }
        Some(String::from_utf8_lossy(&name).into_owned())
    }

    /// `namespace Foo\Bar;` or `namespace Foo\Bar { ... }`. A `namespace\`
    /// relative-name usage in expression position is left alone.
    fn parse_namespace(&mut self) {
        if self.next_kind() == TokenKind::NsSeparator {
            self.pos += 1;
            return;
        }
        self.pos += 1;
        let name = self.read_name().unwrap_or_default();
        self.namespace = name;
        self.aliases.clear();
        match self.kind() {
            TokenKind::SemiColon | TokenKind::OpenBrace => self.pos += 1,
            _ => {}
        }
    }

    /// `use A\B;`, `use A\B as C;`, comma lists, and `use A\{B, C as D};`.
    /// Function/const imports are consumed but not recorded; closure `use`
    /// clauses never reach here (the closure path swallows them).
    fn parse_use(&mut self) {
        self.pos += 1;
        if self.kind() == TokenKind::OpenParen {
            // Defensive: a stray closure use-clause
            self.skip_group();
            return;
        }
        let import_kind = self.kind();
        if import_kind == TokenKind::Function || import_kind == TokenKind::Const {
            // use function / use const imports don't feed class resolution
            self.pos += 1;
            self.skip_to_semicolon();
            return;
        }

        loop {
            let Some(name) = self.read_name() else {
                self.skip_to_semicolon();
                return;
            };
            if self.kind() == TokenKind::NsSeparator && self.next_kind() == TokenKind::OpenBrace {
                // Group import: the name so far is the prefix
                self.pos += 2;
                loop {
                    let Some(member) = self.read_name() else { break };
                    let full = format!("{name}\\{member}");
                    let alias = self.read_alias(&full);
                    self.register_alias(alias, full);
                    if self.kind() == TokenKind::Comma {
                        self.pos += 1;
                        continue;
                    }
                    break;
                }
                if self.kind() == TokenKind::CloseBrace {
                    self.pos += 1;
                }
                break;
            }

            let alias = self.read_alias(&name);
            self.register_alias(alias, name);
            if self.kind() == TokenKind::Comma {
                self.pos += 1;
                continue;
            }
            break;
        }
        if self.kind() == TokenKind::SemiColon {
            self.pos += 1;
        }
    }

    fn read_alias(&mut self, qualified: &str) -> String {
        if self.kind() == TokenKind::As {
            self.pos += 1;
            if self.kind().is_name_like() {
                let alias = String::from_utf8_lossy(self.stream.text(self.pos)).into_owned();
                self.pos += 1;
                return alias;
            }
        }
        qualified
            .rsplit('\\')
            .next()
            .unwrap_or(qualified)
            .to_string()
    }

    fn register_alias(&mut self, alias: String, qualified: String) {
        let target = qualified.trim_start_matches('\\').to_string();
        self.aliases.insert(alias.to_ascii_lowercase(), target);
    }

    fn skip_to_semicolon(&mut self) {
        while self.pos < self.stream.len() {
            match self.kind() {
                TokenKind::SemiColon => {
                    self.pos += 1;
                    return;
                }
                TokenKind::CloseBrace => return,
                TokenKind::OpenBrace => {
                    // Brace groups terminate the member here: property
                    // hooks, trait adaptations and group imports all end
                    // with their closing brace.
                    self.skip_group();
                    if self.kind() == TokenKind::SemiColon {
                        self.pos += 1;
                    }
                    return;
                }
                TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::Attribute => {
                    self.skip_group()
                }
                _ => self.pos += 1,
            }
        }
    }

    /// `const NAME = <expr> (, NAME = <expr>)* ;` — possibly typed (PHP 8.3);
    /// the last name-like token before `=` is the constant's name.
    fn parse_const(&mut self) -> Result<(), ParseError> {
        let const_span = self.span();
        self.pos += 1;
        loop {
            let mut name_at: Option<usize> = None;
            while self.kind().is_name_like() || self.kind() == TokenKind::NsSeparator {
                if self.kind().is_name_like() {
                    name_at = Some(self.pos);
                }
                self.pos += 1;
            }
            let Some(name_at) = name_at else {
                return Err(ParseError::new(const_span, "missing constant name"));
            };
            if self.kind() != TokenKind::Eq {
                return Err(ParseError::new(self.span(), "expected '=' in constant"));
            }
            self.pos += 1;

            let expr_start = self.pos;
            while self.pos < self.stream.len()
                && !matches!(self.kind(), TokenKind::Comma | TokenKind::SemiColon)
            {
                match self.kind() {
                    TokenKind::OpenParen
                    | TokenKind::OpenBracket
                    | TokenKind::OpenBrace
                    | TokenKind::Attribute => self.skip_group(),
                    _ => self.pos += 1,
                }
            }
            let expr_tokens = self.stream.slice(expr_start..self.pos);
            let default = {
                let resolver = UnitConstantResolver {
                    registry: self.registry,
                    namespace: &self.namespace,
                };
                let evaluator = Evaluator::new(
                    self.stream.source(),
                    &resolver,
                    self.registry.config().parse_value_definitions,
                );
                evaluator.evaluate(expr_tokens)?
            };

            let name = String::from_utf8_lossy(self.stream.text(name_at)).into_owned();
            let descriptor = ConstantDescriptor {
                name,
                namespace: self.namespace.clone(),
                default,
                span: Span::new(const_span.start, self.span().end),
            };
            let id = self.registry.add_constant(descriptor);
            self.report.constants.push(id);

            if self.kind() == TokenKind::Comma {
                self.pos += 1;
                continue;
            }
            break;
        }
        if self.kind() == TokenKind::SemiColon {
            self.pos += 1;
        }
        Ok(())
    }

    /// A `function` keyword: either a named declaration (built and bound) or
    /// a closure (skipped wholesale, body included). Returns `None` for
    /// closures.
    fn parse_function(
        &mut self,
        class: Option<ClassId>,
        head: usize,
        is_abstract: bool,
        is_static: bool,
    ) -> Result<Option<FunctionId>, ParseError> {
        let decl_span = self.span();
        self.pos += 1;

        let mut returns_reference = false;
        if self.kind() == TokenKind::Ampersand {
            returns_reference = true;
            self.pos += 1;
        }

        let named = if class.is_some() {
            self.kind().is_name_like()
        } else {
            matches!(self.kind(), TokenKind::Identifier | TokenKind::Readonly)
        };
        if !named {
            self.skip_closure();
            return Ok(None);
        }
        let name = String::from_utf8_lossy(self.stream.text(self.pos)).into_owned();
        self.pos += 1;

        if self.kind() != TokenKind::OpenParen {
            return Err(ParseError::new(self.span(), "expected parameter list"));
        }
        let open = self.pos;
        let tokens = self.stream.slice(0..self.stream.len());
        let close = skip_balanced(tokens, open);
        if close > self.stream.len() || self.stream.kind(close - 1) != TokenKind::CloseParen {
            return Err(ParseError::new(decl_span, "unterminated parameter list"));
        }
        let list = self.stream.slice(open + 1..close - 1);

        let mut parameters = {
            let resolver = UnitConstantResolver {
                registry: self.registry,
                namespace: &self.namespace,
            };
            let evaluator = Evaluator::new(
                self.stream.source(),
                &resolver,
                self.registry.config().parse_value_definitions,
            );
            ParameterListBuilder::new(self.stream.source(), &evaluator).build(list)?
        };
        for parameter in &mut parameters {
            if let Some(hint) = &mut parameter.type_hint {
                if let HintKind::Named { raw, qualified } = &mut hint.kind {
                    if !raw.contains(['|', '&', '(']) {
                        *qualified = resolve_class_name(&self.namespace, &self.aliases, raw);
                    }
                }
            }
        }
        self.pos = close;

        // Return type
        if self.kind() == TokenKind::Colon {
            self.pos += 1;
            self.skip_type();
        }

        // Body, or `;` for abstract/interface methods
        match self.kind() {
            TokenKind::OpenBrace => self.skip_group(),
            TokenKind::SemiColon => self.pos += 1,
            _ => return Err(ParseError::new(self.span(), "expected function body")),
        }

        let descriptor = FunctionDescriptor {
            name,
            namespace: self.namespace.clone(),
            kind: if class.is_some() {
                FunctionKind::Method
            } else {
                FunctionKind::Function
            },
            class,
            parameters,
            returns_reference,
            is_abstract,
            is_static,
            doc_comment: self.doc_text(head),
            span: Span::new(decl_span.start, self.stream.span(self.pos.saturating_sub(1)).end),
        };
        Ok(Some(self.registry.add_function(descriptor)))
    }

    fn skip_closure(&mut self) {
        if self.kind() == TokenKind::OpenParen {
            self.skip_group();
        }
        if self.kind() == TokenKind::Use {
            self.pos += 1;
            if self.kind() == TokenKind::OpenParen {
                self.skip_group();
            }
        }
        if self.kind() == TokenKind::Colon {
            self.pos += 1;
            self.skip_type();
        }
        if self.kind() == TokenKind::OpenBrace {
            self.skip_group();
        }
    }

    /// Consume return-type tokens up to the body / terminator.
    fn skip_type(&mut self) {
        while self.pos < self.stream.len() {
            match self.kind() {
                TokenKind::OpenBrace | TokenKind::SemiColon | TokenKind::Eof => return,
                TokenKind::OpenParen => self.skip_group(),
                _ => self.pos += 1,
            }
        }
    }

    fn parse_class_like(
        &mut self,
        head: usize,
        is_abstract: bool,
        is_final: bool,
    ) -> Result<Option<ClassId>, ParseError> {
        let decl_span = self.span();
        let kind = match self.kind() {
            TokenKind::Interface => ClassKind::Interface,
            TokenKind::Trait => ClassKind::Trait,
            TokenKind::Enum => ClassKind::Enum,
            _ => ClassKind::Class,
        };
        self.pos += 1;

        if !self.kind().is_name_like() {
            // Anonymous class in expression position: skip arguments,
            // heritage and body.
            if self.kind() == TokenKind::OpenParen {
                self.skip_group();
            }
            while !matches!(self.kind(), TokenKind::OpenBrace | TokenKind::Eof) {
                self.pos += 1;
            }
            if self.kind() == TokenKind::OpenBrace {
                self.skip_group();
            }
            return Ok(None);
        }
        let name = String::from_utf8_lossy(self.stream.text(self.pos)).into_owned();
        self.pos += 1;

        // Enum backing type
        if kind == ClassKind::Enum && self.kind() == TokenKind::Colon {
            self.pos += 1;
            while !matches!(
                self.kind(),
                TokenKind::Implements | TokenKind::OpenBrace | TokenKind::Eof
            ) {
                self.pos += 1;
            }
        }

        let mut parent = None;
        let mut interfaces = Vec::new();
        if self.kind() == TokenKind::Extends {
            self.pos += 1;
            loop {
                let Some(target) = self.read_name() else { break };
                let resolved = resolve_class_name(&self.namespace, &self.aliases, &target);
                if kind == ClassKind::Interface {
                    interfaces.push(resolved);
                } else if parent.is_none() {
                    parent = Some(resolved);
                }
                if self.kind() == TokenKind::Comma {
                    self.pos += 1;
                    continue;
                }
                break;
            }
        }
        if self.kind() == TokenKind::Implements {
            self.pos += 1;
            loop {
                let Some(target) = self.read_name() else { break };
                interfaces.push(resolve_class_name(&self.namespace, &self.aliases, &target));
                if self.kind() == TokenKind::Comma {
                    self.pos += 1;
                    continue;
                }
                break;
            }
        }

        if self.kind() != TokenKind::OpenBrace {
            return Err(ParseError::new(decl_span, "expected class body"));
        }
        self.pos += 1;

        let descriptor = ClassDescriptor {
            name,
            namespace: self.namespace.clone(),
            kind,
            parent,
            interfaces,
            is_abstract,
            is_final,
            is_internal: false,
            methods: Vec::new(),
            doc_comment: self.doc_text(head),
            span: decl_span,
        };
        let class_id = self.registry.add_class(descriptor);
        self.parse_class_body(class_id);
        Ok(Some(class_id))
    }

    fn parse_class_body(&mut self, class_id: ClassId) {
        let mut head: Option<usize> = None;
        let mut is_abstract = false;
        let mut is_static = false;

        while self.pos < self.stream.len() {
            match self.kind() {
                TokenKind::CloseBrace => {
                    self.pos += 1;
                    return;
                }
                TokenKind::Attribute => {
                    head.get_or_insert(self.pos);
                    self.skip_group();
                }
                TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Final
                | TokenKind::Readonly => {
                    head.get_or_insert(self.pos);
                    self.pos += 1;
                }
                TokenKind::Abstract => {
                    head.get_or_insert(self.pos);
                    is_abstract = true;
                    self.pos += 1;
                }
                TokenKind::Static => {
                    head.get_or_insert(self.pos);
                    is_static = true;
                    self.pos += 1;
                }
                TokenKind::Function => {
                    let start = head.take().unwrap_or(self.pos);
                    let flags = (is_abstract, is_static);
                    is_abstract = false;
                    is_static = false;
                    match self.parse_function(Some(class_id), start, flags.0, flags.1) {
                        Ok(Some(method)) => self.registry.attach_method(class_id, method),
                        Ok(None) => {}
                        Err(error) => {
                            self.report.errors.push(error);
                            self.recover();
                        }
                    }
                }
                TokenKind::Const | TokenKind::Use | TokenKind::Variable => {
                    // Class constants, trait uses and properties have no
                    // parameter lists to reflect; properties may carry hook
                    // bodies, which the skip handles.
                    head = None;
                    is_abstract = false;
                    is_static = false;
                    self.pos += 1;
                    self.skip_to_semicolon();
                }
                TokenKind::SemiColon => {
                    head = None;
                    is_abstract = false;
                    is_static = false;
                    self.pos += 1;
                }
                TokenKind::OpenBrace => self.skip_group(),
                _ => {
                    self.pos += 1;
                }
            }
        }
    }
}
