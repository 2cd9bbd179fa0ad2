use super::PluginError;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, Expression, ModuleDeclaration, ObjectExpression, ObjectPropertyKind, PropertyKey,
    Statement,
};
use oxc_parser::Parser;
use oxc_span::SourceType;
use rustc_hash::FxHashMap;
use std::path::Path;

/// Load a tool configuration file as a JSON value, whatever its syntax.
///
/// JSON and JSONC parse directly. JS/TS configs are parsed with oxc and the
/// exported object literal is evaluated statically: `export default {...}`,
/// `export default defineConfig({...})`, `module.exports = {...}`, and
/// variable indirection all unwrap to the same shape. Anything dynamic
/// becomes `null`, which readers treat as absent.
pub fn load_config_value(path: &Path) -> Result<serde_json::Value, PluginError> {
    let content = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    if ext == "json" || ext.is_empty() {
        let mut stripped = content;
        json_strip_comments::strip(&mut stripped)
            .map_err(|e| PluginError::ConfigParse(e.to_string()))?;
        return serde_json::from_str(&stripped)
            .map_err(|e| PluginError::ConfigParse(e.to_string()));
    }

    if ext == "yml" || ext == "yaml" {
        let parsed: serde_yaml::Value = serde_yaml::from_str(&content)
            .map_err(|e| PluginError::ConfigParse(e.to_string()))?;
        return serde_json::to_value(parsed)
            .map_err(|e| PluginError::ConfigParse(e.to_string()));
    }

    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_default();
    let parsed = Parser::new(&allocator, &content, source_type).parse();

    if parsed.panicked {
        return Err(PluginError::ConfigParse(format!("failed to parse {}", path.display())));
    }

    // First pass: object literals bound to top-level variables
    let mut var_objects: FxHashMap<String, serde_json::Value> = FxHashMap::default();
    for stmt in &parsed.program.body {
        if let Statement::VariableDeclaration(var_decl) = stmt {
            for decl in &var_decl.declarations {
                let Some(name) = decl.id.get_identifier_name() else { continue };
                if let Some(init) = &decl.init {
                    if let Some(value) = expression_value(init, &FxHashMap::default()) {
                        var_objects.insert(name.to_string(), value);
                    }
                }
            }
        }
    }

    // Second pass: the export
    for stmt in &parsed.program.body {
        if let Some(value) = exported_value(stmt, &var_objects) {
            return Ok(value);
        }
    }

    Ok(serde_json::Value::Null)
}

fn exported_value(
    stmt: &Statement,
    var_objects: &FxHashMap<String, serde_json::Value>,
) -> Option<serde_json::Value> {
    match stmt {
        // module.exports = ...
        Statement::ExpressionStatement(expr_stmt) => {
            if let Expression::AssignmentExpression(assign) = &expr_stmt.expression {
                return expression_value(&assign.right, var_objects);
            }
            None
        }
        _ => {
            if let Some(ModuleDeclaration::ExportDefaultDeclaration(export)) =
                stmt.as_module_declaration()
            {
                if let Some(expr) = export.declaration.as_expression() {
                    return expression_value(expr, var_objects);
                }
            }
            None
        }
    }
}

/// Statically evaluate a literal-ish expression to JSON.
fn expression_value(
    expr: &Expression,
    var_objects: &FxHashMap<String, serde_json::Value>,
) -> Option<serde_json::Value> {
    match expr {
        Expression::ObjectExpression(obj) => Some(object_value(obj, var_objects)),
        Expression::ArrayExpression(arr) => {
            let items = arr
                .elements
                .iter()
                .filter_map(|elem| elem.as_expression())
                .map(|e| expression_value(e, var_objects).unwrap_or(serde_json::Value::Null))
                .collect();
            Some(serde_json::Value::Array(items))
        }
        Expression::StringLiteral(lit) => Some(serde_json::Value::String(lit.value.to_string())),
        Expression::TemplateLiteral(template) if template.expressions.is_empty() => template
            .quasis
            .first()
            .and_then(|q| q.value.cooked.as_ref())
            .map(|s| serde_json::Value::String(s.to_string())),
        Expression::NumericLiteral(lit) => serde_json::Number::from_f64(lit.value)
            .map(serde_json::Value::Number),
        Expression::BooleanLiteral(lit) => Some(serde_json::Value::Bool(lit.value)),
        Expression::NullLiteral(_) => Some(serde_json::Value::Null),
        Expression::Identifier(ident) => var_objects.get(ident.name.as_str()).cloned(),
        // defineConfig({...}) and friends: unwrap the first object argument
        Expression::CallExpression(call) => call.arguments.iter().find_map(|arg| match arg {
            Argument::ObjectExpression(obj) => Some(object_value(obj, var_objects)),
            _ => arg.as_expression().and_then(|e| match e {
                Expression::ObjectExpression(_) => expression_value(e, var_objects),
                _ => None,
            }),
        }),
        Expression::TSAsExpression(as_expr) => expression_value(&as_expr.expression, var_objects),
        Expression::TSSatisfiesExpression(sat) => expression_value(&sat.expression, var_objects),
        Expression::ParenthesizedExpression(paren) => {
            expression_value(&paren.expression, var_objects)
        }
        _ => None,
    }
}

fn object_value(
    obj: &ObjectExpression,
    var_objects: &FxHashMap<String, serde_json::Value>,
) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for prop in &obj.properties {
        if let ObjectPropertyKind::ObjectProperty(property) = prop {
            let key = match &property.key {
                PropertyKey::StaticIdentifier(ident) => ident.name.to_string(),
                PropertyKey::StringLiteral(lit) => lit.value.to_string(),
                _ => continue,
            };
            let value = expression_value(&property.value, var_objects)
                .unwrap_or(serde_json::Value::Null);
            map.insert(key, value);
        }
    }
    serde_json::Value::Object(map)
}

/// `value[key]` as a string array; a lone string becomes a one-element array.
pub fn string_array(value: &serde_json::Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(serde_json::Value::String(s)) => vec![s.clone()],
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

/// A string at a dotted path, e.g. `test.environment`.
pub fn string_at<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a str> {
    let mut current = value;
    for key in path.split('.') {
        current = current.get(key)?;
    }
    current.as_str()
}

/// Every string found anywhere under `value`. Used for config shapes where
/// commands or names appear at arbitrary depth (lint-staged, husky-like).
pub fn strings_anywhere(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => {
            for item in items {
                strings_anywhere(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                strings_anywhere(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn json_config_with_comments() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.json",
            "{\n  // a comment\n  \"preset\": \"ts-jest\"\n}",
        );
        let value = load_config_value(&path).unwrap();
        assert_eq!(value["preset"], "ts-jest");
    }

    #[test]
    fn export_default_object() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.ts",
            "export default { testMatch: ['**/*.spec.ts'], verbose: true };",
        );
        let value = load_config_value(&path).unwrap();
        assert_eq!(string_array(&value, "testMatch"), ["**/*.spec.ts"]);
        assert_eq!(value["verbose"], true);
    }

    #[test]
    fn module_exports_object() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "config.js", "module.exports = { preset: 'ts-jest' };");
        let value = load_config_value(&path).unwrap();
        assert_eq!(value["preset"], "ts-jest");
    }

    #[test]
    fn define_config_wrapper_unwraps() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "vitest.config.ts",
            "import { defineConfig } from 'vitest/config';\nexport default defineConfig({ test: { environment: 'jsdom' } });",
        );
        let value = load_config_value(&path).unwrap();
        assert_eq!(string_at(&value, "test.environment"), Some("jsdom"));
    }

    #[test]
    fn variable_indirection() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.ts",
            "const config = { stories: ['../src/**/*.stories.tsx'] };\nexport default config;",
        );
        let value = load_config_value(&path).unwrap();
        assert_eq!(string_array(&value, "stories"), ["../src/**/*.stories.tsx"]);
    }

    #[test]
    fn satisfies_and_as_const_unwrap() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.ts",
            "export default { addons: ['@storybook/addon-links'] } satisfies { addons: string[] };",
        );
        let value = load_config_value(&path).unwrap();
        assert_eq!(string_array(&value, "addons"), ["@storybook/addon-links"]);
    }

    #[test]
    fn string_or_array_helpers() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{ "a": "one", "b": ["x", "y"], "n": 3 }"#).unwrap();
        assert_eq!(string_array(&value, "a"), ["one"]);
        assert_eq!(string_array(&value, "b"), ["x", "y"]);
        assert!(string_array(&value, "n").is_empty());

        let mut all = Vec::new();
        strings_anywhere(&value, &mut all);
        all.sort();
        assert_eq!(all, ["one", "x", "y"]);
    }
}
