use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, ClassElement, Declaration, Expression, ImportDeclarationSpecifier,
    MethodDefinitionKind, ModuleExportName, PropertyKey, Statement, TSAccessibility,
    TSEnumMemberName,
};
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;
use rustc_hash::FxHashSet;
use std::path::Path;
use std::sync::OnceLock;

/// One import-like edge discovered in a module.
#[derive(Debug, Clone)]
pub struct ImportInfo {
    pub specifier: String,
    pub kind: ImportKind,
    pub names: ImportedNames,
    pub type_only: bool,
}

impl ImportInfo {
    pub fn side_effect(specifier: impl Into<String>, kind: ImportKind) -> Self {
        Self {
            specifier: specifier.into(),
            kind,
            names: ImportedNames::SideEffect,
            type_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportKind {
    Static,
    Dynamic,
    Require,
    ExportFrom,
    ExportStar,
    SideEffect,
}

/// What an import statement binds: specific names, the whole namespace,
/// or nothing (side-effect only).
#[derive(Debug, Clone)]
pub enum ImportedNames {
    Named(Vec<NamedImport>),
    Namespace,
    SideEffect,
}

/// `import { imported as local }`; for default imports `imported` is "default".
#[derive(Debug, Clone)]
pub struct NamedImport {
    pub imported: String,
    pub local: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExportKind {
    Value,
    Type,
    Default,
    Enum,
    Class,
    Namespace,
}

/// An exported member of an enum or class.
#[derive(Debug, Clone)]
pub struct ExportMember {
    pub name: String,
    pub span_start: u32,
}

/// One export produced by a module, under its external name.
#[derive(Debug, Clone)]
pub struct ExportInfo {
    pub name: String,
    pub kind: ExportKind,
    pub span_start: u32,
    /// JSDoc tags on the export, without the leading `@`.
    pub tags: Vec<String>,
    /// Enum or class members, empty otherwise.
    pub members: Vec<ExportMember>,
    /// Local binding backing this export, when it has one.
    pub local_name: Option<String>,
}

/// Everything the graph needs to know about one source file.
#[derive(Debug, Clone, Default)]
pub struct ModuleAnalysis {
    pub imports: Vec<ImportInfo>,
    pub exports: Vec<ExportInfo>,
    /// `object.property` accesses on plain identifiers, for member usage.
    pub member_accesses: Vec<(String, String)>,
    /// Identifiers read anywhere in the module body.
    pub local_refs: FxHashSet<String>,
}

#[derive(Debug)]
pub enum ParseError {
    IoError(std::io::Error),
    ParseFailed(String),
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::IoError(err)
    }
}

/// Analyze a JS/TS source file: imports, exports, and member accesses.
pub fn analyze_module(path: &Path) -> Result<ModuleAnalysis, ParseError> {
    let source = std::fs::read_to_string(path)?;
    analyze_source(&source, path)
}

pub fn analyze_source(source: &str, path: &Path) -> Result<ModuleAnalysis, ParseError> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_default();
    let parsed = Parser::new(&allocator, source, source_type).parse();

    if parsed.panicked {
        return Err(ParseError::ParseFailed(format!("Parser panicked on {}", path.display())));
    }

    let mut analysis = ModuleAnalysis::default();

    for stmt in &parsed.program.body {
        collect_module_items(stmt, source, &mut analysis);
    }
    for stmt in &parsed.program.body {
        collect_from_statement(stmt, &mut analysis);
    }

    Ok(analysis)
}

fn module_export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

fn property_key_name(key: &PropertyKey) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(ident) => Some(ident.name.to_string()),
        PropertyKey::StringLiteral(lit) => Some(lit.value.to_string()),
        _ => None,
    }
}

/// Imports, exports and re-exports from top-level module declarations.
fn collect_module_items(stmt: &Statement, source: &str, analysis: &mut ModuleAnalysis) {
    match stmt {
        Statement::ImportDeclaration(decl) => {
            let specifier = decl.source.value.to_string();
            let type_only = decl.import_kind.is_type();

            match &decl.specifiers {
                Some(specifiers) if !specifiers.is_empty() => {
                    let mut named = Vec::new();
                    let mut namespace = false;
                    for spec in specifiers {
                        match spec {
                            ImportDeclarationSpecifier::ImportSpecifier(s) => {
                                named.push(NamedImport {
                                    imported: module_export_name(&s.imported),
                                    local: s.local.name.to_string(),
                                });
                            }
                            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                                named.push(NamedImport {
                                    imported: "default".to_string(),
                                    local: s.local.name.to_string(),
                                });
                            }
                            ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => {
                                namespace = true;
                            }
                        }
                    }
                    let names = if namespace && named.is_empty() {
                        ImportedNames::Namespace
                    } else if namespace {
                        // `import def, * as ns` binds both; the namespace wins
                        // for counting (it covers every export anyway).
                        ImportedNames::Namespace
                    } else {
                        ImportedNames::Named(named)
                    };
                    analysis.imports.push(ImportInfo {
                        specifier,
                        kind: ImportKind::Static,
                        names,
                        type_only,
                    });
                }
                _ => {
                    analysis.imports.push(ImportInfo {
                        specifier,
                        kind: ImportKind::SideEffect,
                        names: ImportedNames::SideEffect,
                        type_only,
                    });
                }
            }
        }
        Statement::ExportNamedDeclaration(decl) => {
            let tags = jsdoc_tags(source, decl.span.start);

            if let Some(source_spec) = &decl.source {
                // `export { a, b as c } from './x'`
                let mut named = Vec::new();
                for spec in &decl.specifiers {
                    let imported = module_export_name(&spec.local);
                    let exported = module_export_name(&spec.exported);
                    named.push(NamedImport { imported: imported.clone(), local: exported.clone() });
                    analysis.exports.push(ExportInfo {
                        name: exported,
                        kind: if decl.export_kind.is_type() {
                            ExportKind::Type
                        } else {
                            ExportKind::Value
                        },
                        span_start: decl.span.start,
                        tags: tags.clone(),
                        members: Vec::new(),
                        local_name: None,
                    });
                }
                analysis.imports.push(ImportInfo {
                    specifier: source_spec.value.to_string(),
                    kind: ImportKind::ExportFrom,
                    names: ImportedNames::Named(named),
                    type_only: decl.export_kind.is_type(),
                });
            } else if let Some(declaration) = &decl.declaration {
                collect_exported_declaration(declaration, source, &tags, analysis);
            } else {
                // `export { a, b as c }` over local bindings
                for spec in &decl.specifiers {
                    let local = module_export_name(&spec.local);
                    let exported = module_export_name(&spec.exported);
                    analysis.exports.push(ExportInfo {
                        name: exported,
                        kind: if decl.export_kind.is_type() {
                            ExportKind::Type
                        } else {
                            ExportKind::Value
                        },
                        span_start: decl.span.start,
                        tags: tags.clone(),
                        members: Vec::new(),
                        local_name: Some(local),
                    });
                }
            }
        }
        Statement::ExportDefaultDeclaration(decl) => {
            let tags = jsdoc_tags(source, decl.span.start);
            analysis.exports.push(ExportInfo {
                name: "default".to_string(),
                kind: ExportKind::Default,
                span_start: decl.span.start,
                tags,
                members: Vec::new(),
                local_name: None,
            });
        }
        Statement::ExportAllDeclaration(decl) => {
            match &decl.exported {
                Some(alias) => {
                    // `export * as ns from './x'`: a fresh namespace export
                    // here, and every export of the target counts as used.
                    analysis.exports.push(ExportInfo {
                        name: module_export_name(alias),
                        kind: ExportKind::Namespace,
                        span_start: decl.span.start,
                        tags: jsdoc_tags(source, decl.span.start),
                        members: Vec::new(),
                        local_name: None,
                    });
                    analysis.imports.push(ImportInfo {
                        specifier: decl.source.value.to_string(),
                        kind: ImportKind::Static,
                        names: ImportedNames::Namespace,
                        type_only: decl.export_kind.is_type(),
                    });
                }
                None => {
                    analysis.imports.push(ImportInfo {
                        specifier: decl.source.value.to_string(),
                        kind: ImportKind::ExportStar,
                        names: ImportedNames::Namespace,
                        type_only: decl.export_kind.is_type(),
                    });
                }
            }
        }
        _ => {}
    }
}

fn collect_exported_declaration(
    declaration: &Declaration,
    source: &str,
    tags: &[String],
    analysis: &mut ModuleAnalysis,
) {
    match declaration {
        Declaration::VariableDeclaration(var_decl) => {
            for declarator in &var_decl.declarations {
                if let Some(name) = declarator.id.get_identifier_name() {
                    let name = name.to_string();
                    analysis.exports.push(ExportInfo {
                        name: name.clone(),
                        kind: ExportKind::Value,
                        span_start: declarator.span.start,
                        tags: tags.to_vec(),
                        members: Vec::new(),
                        local_name: Some(name),
                    });
                }
            }
        }
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                analysis.exports.push(ExportInfo {
                    name: id.name.to_string(),
                    kind: ExportKind::Value,
                    span_start: func.span.start,
                    tags: tags.to_vec(),
                    members: Vec::new(),
                    local_name: Some(id.name.to_string()),
                });
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                let members = class
                    .body
                    .body
                    .iter()
                    .filter_map(|element| class_member(element))
                    .collect();
                analysis.exports.push(ExportInfo {
                    name: id.name.to_string(),
                    kind: ExportKind::Class,
                    span_start: class.span.start,
                    tags: tags.to_vec(),
                    members,
                    local_name: Some(id.name.to_string()),
                });
            }
        }
        Declaration::TSEnumDeclaration(ts_enum) => {
            let members = ts_enum
                .members
                .iter()
                .map(|member| ExportMember {
                    name: enum_member_name(&member.id),
                    span_start: member.span.start,
                })
                .collect();
            analysis.exports.push(ExportInfo {
                name: ts_enum.id.name.to_string(),
                kind: ExportKind::Enum,
                span_start: ts_enum.span.start,
                tags: tags.to_vec(),
                members,
                local_name: Some(ts_enum.id.name.to_string()),
            });
        }
        Declaration::TSTypeAliasDeclaration(alias) => {
            analysis.exports.push(ExportInfo {
                name: alias.id.name.to_string(),
                kind: ExportKind::Type,
                span_start: alias.span.start,
                tags: tags.to_vec(),
                members: Vec::new(),
                local_name: Some(alias.id.name.to_string()),
            });
        }
        Declaration::TSInterfaceDeclaration(interface) => {
            analysis.exports.push(ExportInfo {
                name: interface.id.name.to_string(),
                kind: ExportKind::Type,
                span_start: interface.span.start,
                tags: tags.to_vec(),
                members: Vec::new(),
                local_name: Some(interface.id.name.to_string()),
            });
        }
        _ => {}
    }
}

/// Public, non-constructor members of an exported class.
fn class_member(element: &ClassElement) -> Option<ExportMember> {
    match element {
        ClassElement::MethodDefinition(method) => {
            if matches!(method.kind, MethodDefinitionKind::Constructor) {
                return None;
            }
            if matches!(
                method.accessibility,
                Some(TSAccessibility::Private) | Some(TSAccessibility::Protected)
            ) {
                return None;
            }
            let name = property_key_name(&method.key)?;
            Some(ExportMember { name, span_start: method.span.start })
        }
        ClassElement::PropertyDefinition(prop) => {
            if matches!(
                prop.accessibility,
                Some(TSAccessibility::Private) | Some(TSAccessibility::Protected)
            ) {
                return None;
            }
            let name = property_key_name(&prop.key)?;
            Some(ExportMember { name, span_start: prop.span.start })
        }
        _ => None,
    }
}

fn enum_member_name(id: &TSEnumMemberName) -> String {
    match id {
        TSEnumMemberName::Identifier(ident) => ident.name.to_string(),
        TSEnumMemberName::String(lit) => lit.value.to_string(),
        _ => String::new(),
    }
}

/// JSDoc tags from the block comment immediately preceding `span_start`.
fn jsdoc_tags(source: &str, span_start: u32) -> Vec<String> {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TAG_REGEX.get_or_init(|| Regex::new(r"@([A-Za-z][A-Za-z0-9]*)").unwrap());

    let head = match source.get(..span_start as usize) {
        Some(h) => h.trim_end(),
        None => return Vec::new(),
    };
    if !head.ends_with("*/") {
        return Vec::new();
    }
    let open = match head.rfind("/**") {
        Some(i) => i,
        None => return Vec::new(),
    };
    let comment = &head[open..];

    regex.captures_iter(comment).map(|cap| cap[1].to_string()).collect()
}

/// Imports buried in statements and expressions: dynamic `import()`,
/// `require()`, plus identifier and member-access usage tracking.
fn collect_from_statement(stmt: &Statement, analysis: &mut ModuleAnalysis) {
    match stmt {
        Statement::ExpressionStatement(expr_stmt) => {
            collect_from_expression(&expr_stmt.expression, analysis);
        }
        Statement::VariableDeclaration(var_decl) => {
            for decl in &var_decl.declarations {
                if let Some(init) = &decl.init {
                    collect_from_expression(init, analysis);
                }
            }
        }
        Statement::BlockStatement(block) => {
            for stmt in &block.body {
                collect_from_statement(stmt, analysis);
            }
        }
        Statement::IfStatement(if_stmt) => {
            collect_from_expression(&if_stmt.test, analysis);
            collect_from_statement(&if_stmt.consequent, analysis);
            if let Some(alt) = &if_stmt.alternate {
                collect_from_statement(alt, analysis);
            }
        }
        Statement::WhileStatement(while_stmt) => {
            collect_from_expression(&while_stmt.test, analysis);
            collect_from_statement(&while_stmt.body, analysis);
        }
        Statement::ForStatement(for_stmt) => {
            collect_from_statement(&for_stmt.body, analysis);
        }
        Statement::ForInStatement(for_in) => {
            collect_from_statement(&for_in.body, analysis);
        }
        Statement::ForOfStatement(for_of) => {
            collect_from_statement(&for_of.body, analysis);
        }
        Statement::TryStatement(try_stmt) => {
            for stmt in &try_stmt.block.body {
                collect_from_statement(stmt, analysis);
            }
            if let Some(handler) = &try_stmt.handler {
                for stmt in &handler.body.body {
                    collect_from_statement(stmt, analysis);
                }
            }
            if let Some(finalizer) = &try_stmt.finalizer {
                for stmt in &finalizer.body {
                    collect_from_statement(stmt, analysis);
                }
            }
        }
        Statement::SwitchStatement(switch_stmt) => {
            collect_from_expression(&switch_stmt.discriminant, analysis);
            for case in &switch_stmt.cases {
                if let Some(test) = &case.test {
                    collect_from_expression(test, analysis);
                }
                for stmt in &case.consequent {
                    collect_from_statement(stmt, analysis);
                }
            }
        }
        Statement::ReturnStatement(ret) => {
            if let Some(arg) = &ret.argument {
                collect_from_expression(arg, analysis);
            }
        }
        Statement::ThrowStatement(throw_stmt) => {
            collect_from_expression(&throw_stmt.argument, analysis);
        }
        Statement::FunctionDeclaration(func) => {
            if let Some(body) = &func.body {
                for stmt in &body.statements {
                    collect_from_statement(stmt, analysis);
                }
            }
        }
        Statement::ClassDeclaration(class) => {
            collect_from_class_body(&class.body, analysis);
        }
        Statement::ExportNamedDeclaration(decl) => {
            if let Some(declaration) = &decl.declaration {
                collect_from_declaration(declaration, analysis);
            }
        }
        Statement::ExportDefaultDeclaration(decl) => {
            if let Some(expr) = decl.declaration.as_expression() {
                collect_from_expression(expr, analysis);
            }
        }
        _ => {}
    }
}

fn collect_from_declaration(declaration: &Declaration, analysis: &mut ModuleAnalysis) {
    match declaration {
        Declaration::VariableDeclaration(var_decl) => {
            for decl in &var_decl.declarations {
                if let Some(init) = &decl.init {
                    collect_from_expression(init, analysis);
                }
            }
        }
        Declaration::FunctionDeclaration(func) => {
            if let Some(body) = &func.body {
                for stmt in &body.statements {
                    collect_from_statement(stmt, analysis);
                }
            }
        }
        Declaration::ClassDeclaration(class) => {
            collect_from_class_body(&class.body, analysis);
        }
        _ => {}
    }
}

fn collect_from_class_body(body: &oxc_ast::ast::ClassBody, analysis: &mut ModuleAnalysis) {
    for element in &body.body {
        match element {
            ClassElement::MethodDefinition(method) => {
                if let Some(body) = &method.value.body {
                    for stmt in &body.statements {
                        collect_from_statement(stmt, analysis);
                    }
                }
            }
            ClassElement::PropertyDefinition(prop) => {
                if let Some(value) = &prop.value {
                    collect_from_expression(value, analysis);
                }
            }
            _ => {}
        }
    }
}

fn collect_from_expression(expr: &Expression, analysis: &mut ModuleAnalysis) {
    match expr {
        Expression::Identifier(ident) => {
            analysis.local_refs.insert(ident.name.to_string());
        }
        Expression::ImportExpression(import_expr) => {
            if let Expression::StringLiteral(lit) = &import_expr.source {
                analysis.imports.push(ImportInfo::side_effect(
                    lit.value.to_string(),
                    ImportKind::Dynamic,
                ));
            }
        }
        Expression::StaticMemberExpression(member) => {
            if let Expression::Identifier(ident) = &member.object {
                analysis.local_refs.insert(ident.name.to_string());
                analysis
                    .member_accesses
                    .push((ident.name.to_string(), member.property.name.to_string()));
            } else {
                collect_from_expression(&member.object, analysis);
            }
        }
        Expression::CallExpression(call) => {
            if let Expression::Identifier(ident) = &call.callee {
                if ident.name == "require" {
                    if let Some(Argument::StringLiteral(lit)) = call.arguments.first() {
                        analysis.imports.push(ImportInfo::side_effect(
                            lit.value.to_string(),
                            ImportKind::Require,
                        ));
                    }
                }
            }
            collect_from_expression(&call.callee, analysis);
            for arg in &call.arguments {
                if let Argument::SpreadElement(spread) = arg {
                    collect_from_expression(&spread.argument, analysis);
                } else if let Some(expr) = arg.as_expression() {
                    collect_from_expression(expr, analysis);
                }
            }
        }
        Expression::ArrowFunctionExpression(arrow) => {
            for stmt in &arrow.body.statements {
                collect_from_statement(stmt, analysis);
            }
        }
        Expression::FunctionExpression(func) => {
            if let Some(body) = &func.body {
                for stmt in &body.statements {
                    collect_from_statement(stmt, analysis);
                }
            }
        }
        Expression::ClassExpression(class) => {
            collect_from_class_body(&class.body, analysis);
        }
        Expression::ConditionalExpression(cond) => {
            collect_from_expression(&cond.test, analysis);
            collect_from_expression(&cond.consequent, analysis);
            collect_from_expression(&cond.alternate, analysis);
        }
        Expression::SequenceExpression(seq) => {
            for expr in &seq.expressions {
                collect_from_expression(expr, analysis);
            }
        }
        Expression::AssignmentExpression(assign) => {
            collect_from_expression(&assign.right, analysis);
        }
        Expression::LogicalExpression(logical) => {
            collect_from_expression(&logical.left, analysis);
            collect_from_expression(&logical.right, analysis);
        }
        Expression::BinaryExpression(binary) => {
            collect_from_expression(&binary.left, analysis);
            collect_from_expression(&binary.right, analysis);
        }
        Expression::UnaryExpression(unary) => {
            collect_from_expression(&unary.argument, analysis);
        }
        Expression::AwaitExpression(await_expr) => {
            collect_from_expression(&await_expr.argument, analysis);
        }
        Expression::NewExpression(new_expr) => {
            collect_from_expression(&new_expr.callee, analysis);
            for arg in &new_expr.arguments {
                if let Some(expr) = arg.as_expression() {
                    collect_from_expression(expr, analysis);
                }
            }
        }
        Expression::ParenthesizedExpression(paren) => {
            collect_from_expression(&paren.expression, analysis);
        }
        Expression::TemplateLiteral(template) => {
            for expr in &template.expressions {
                collect_from_expression(expr, analysis);
            }
        }
        Expression::ArrayExpression(arr) => {
            for elem in &arr.elements {
                if let Some(expr) = elem.as_expression() {
                    collect_from_expression(expr, analysis);
                }
            }
        }
        Expression::ObjectExpression(obj) => {
            for prop in &obj.properties {
                if let oxc_ast::ast::ObjectPropertyKind::ObjectProperty(p) = prop {
                    collect_from_expression(&p.value, analysis);
                }
            }
        }
        _ => {
            if let Some(member) = expr.as_member_expression() {
                collect_from_expression(member.object(), analysis);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn analyze(source: &str) -> ModuleAnalysis {
        analyze_source(source, &PathBuf::from("test.ts")).unwrap()
    }

    fn import_specifiers(analysis: &ModuleAnalysis) -> Vec<&str> {
        analysis.imports.iter().map(|i| i.specifier.as_str()).collect()
    }

    #[test]
    fn static_import_names() {
        let analysis = analyze(r#"import def, { a, b as c } from "./mod";"#);
        assert_eq!(import_specifiers(&analysis), ["./mod"]);
        match &analysis.imports[0].names {
            ImportedNames::Named(named) => {
                let imported: Vec<_> = named.iter().map(|n| n.imported.as_str()).collect();
                assert_eq!(imported, ["default", "a", "b"]);
                assert_eq!(named[2].local, "c");
            }
            other => panic!("expected named imports, got {other:?}"),
        }
    }

    #[test]
    fn namespace_and_side_effect_imports() {
        let analysis = analyze(r#"import * as ns from "./a"; import "./b";"#);
        assert!(matches!(analysis.imports[0].names, ImportedNames::Namespace));
        assert_eq!(analysis.imports[1].kind, ImportKind::SideEffect);
    }

    #[test]
    fn dynamic_and_require_imports() {
        let analysis = analyze(r#"const x = require("./r"); import("./d").then(() => {});"#);
        let kinds: Vec<_> = analysis.imports.iter().map(|i| i.kind.clone()).collect();
        assert!(kinds.contains(&ImportKind::Require));
        assert!(kinds.contains(&ImportKind::Dynamic));
    }

    #[test]
    fn export_const_and_function() {
        let analysis = analyze("export const x = 1;\nexport function go() {}\n");
        let names: Vec<_> = analysis.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["x", "go"]);
        assert_eq!(analysis.exports[0].kind, ExportKind::Value);
    }

    #[test]
    fn export_default_is_distinct_name() {
        let analysis = analyze("const a = 1;\nexport default a;\n");
        assert_eq!(analysis.exports[0].name, "default");
        assert_eq!(analysis.exports[0].kind, ExportKind::Default);
    }

    #[test]
    fn reexport_records_import_and_exports() {
        let analysis = analyze(r#"export { one, two as dos } from "./nums";"#);
        assert_eq!(analysis.imports[0].kind, ImportKind::ExportFrom);
        let names: Vec<_> = analysis.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["one", "dos"]);
    }

    #[test]
    fn export_star_forwards() {
        let analysis = analyze(r#"export * from "./all";"#);
        assert_eq!(analysis.imports[0].kind, ImportKind::ExportStar);
        assert!(analysis.exports.is_empty());
    }

    #[test]
    fn enum_members_collected() {
        let analysis = analyze("export enum Color { Red, Green, Blue }\n");
        assert_eq!(analysis.exports[0].kind, ExportKind::Enum);
        let members: Vec<_> =
            analysis.exports[0].members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(members, ["Red", "Green", "Blue"]);
    }

    #[test]
    fn class_members_skip_private_and_constructor() {
        let analysis = analyze(
            "export class Widget {\n  constructor() {}\n  private hidden() {}\n  render() {}\n  size = 2;\n}\n",
        );
        assert_eq!(analysis.exports[0].kind, ExportKind::Class);
        let members: Vec<_> =
            analysis.exports[0].members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(members, ["render", "size"]);
    }

    #[test]
    fn jsdoc_tags_attach_to_export() {
        let analysis = analyze("/** @public */\nexport const api = 1;\n");
        assert_eq!(analysis.exports[0].tags, ["public"]);
    }

    #[test]
    fn member_access_recorded() {
        let analysis = analyze("import { Color } from './c';\nconst x = Color.Red;\n");
        assert!(analysis.member_accesses.contains(&("Color".to_string(), "Red".to_string())));
    }

    #[test]
    fn type_only_import_flagged() {
        let analysis = analyze(r#"import type { T } from "./types";"#);
        assert!(analysis.imports[0].type_only);
    }

    #[test]
    fn local_refs_track_same_file_usage() {
        let analysis = analyze("export const used = 1;\nexport const lone = 2;\nconst sum = used + 1;\n");
        assert!(analysis.local_refs.contains("used"));
        assert!(!analysis.local_refs.contains("lone"));
    }
}
