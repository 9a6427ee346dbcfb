//! Rust source rendering for compiled contracts and function signatures.
//!
//! The rendered code targets `flowgen_core` at runtime for coercion and uses
//! the same type table as the in-process contracts, so both agree on
//! representation and fail-fast behaviour.

use crate::contract::Contract;
use crate::signature::Signature;
use crate::typemap::RepresentationType;
use crate::types::{FieldType, exported_ident, rust_ident};

/// Render a record struct with `to_map` and `from_map`, named after the contract.
pub fn render_contract(contract: &Contract) -> String {
    render_contract_named(&exported_ident(contract.name()), contract)
}

/// Render a record struct under an explicit type name.
pub fn render_contract_named(type_name: &str, contract: &Contract) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "#[allow(non_snake_case)]\n#[derive(Debug, Clone, Default, PartialEq)]\npub struct {type_name} {{\n"
    ));
    for field in contract.fields() {
        out.push_str(&format!(
            "    /// `{}` ({})\n    pub {}: {},\n",
            field.name,
            field.field_type,
            field.ident,
            field.representation().rust_type()
        ));
    }
    out.push_str("}\n\n");

    out.push_str(&format!("impl {type_name} {{\n"));
    out.push_str(
        "    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {\n        let mut map = serde_json::Map::new();\n",
    );
    for field in contract.fields() {
        out.push_str(&format!(
            "        map.insert({:?}.to_string(), serde_json::json!(self.{}));\n",
            field.name, field.ident
        ));
    }
    out.push_str("        map\n    }\n\n");

    out.push_str(
        "    pub fn from_map(\n        &mut self,\n        values: &serde_json::Map<String, serde_json::Value>,\n    ) -> Result<(), flowgen_core::ContractError> {\n",
    );
    if !contract.is_empty() {
        out.push_str("        let null = serde_json::Value::Null;\n");
    }
    for (index, field) in contract.fields().iter().enumerate() {
        out.push_str(&format!(
            "        // {} {}\n        let raw = values.get({:?}).unwrap_or(&null);\n",
            field.name, field.field_type, field.name
        ));
        out.push_str(&format!(
            "        let typed = flowgen_core::coerce::{}(raw).map_err(|source| {{\n            flowgen_core::ContractError::FieldCoercion {{ index: {index}, field: {:?}.into(), source }}\n        }})?;\n",
            field.mapping.coerce_name, field.name
        ));
        out.push_str(&format!(
            "        if let flowgen_core::TypedValue::{}(v) = typed {{\n            self.{} = v;\n        }}\n",
            variant(field.representation()),
            field.ident
        ));
    }
    out.push_str("        Ok(())\n    }\n}\n");
    out
}

/// Render a function skeleton: signature table, eval prologue and a
/// placeholder return for the author to replace.
pub fn render_function(name: &str, category: &str, signature: &Signature) -> String {
    let type_name = function_type_name(name);
    let arity = signature.arity();
    let (param_types, _) = signature.sig();
    let mut out = String::new();

    out.push_str(&format!("pub struct {type_name};\n\nimpl {type_name} {{\n"));
    out.push_str(&format!(
        "    pub fn name(&self) -> &'static str {{\n        {name:?}\n    }}\n\n"
    ));
    out.push_str(&format!(
        "    pub fn category(&self) -> &'static str {{\n        {category:?}\n    }}\n\n"
    ));

    let types = param_types
        .iter()
        .map(|t| format!("flowgen_core::RepresentationType::{}", variant(*t)))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!(
        "    pub fn sig(&self) -> (Vec<flowgen_core::RepresentationType>, bool) {{\n        (vec![{types}], false)\n    }}\n\n"
    ));

    out.push_str(
        "    pub fn eval(\n        &self,\n        params: &[serde_json::Value],\n    ) -> Result<flowgen_core::TypedValue, flowgen_core::ContractError> {\n",
    );
    out.push_str(&format!(
        "        tracing::debug!(\"Start of function {name}\");\n\n        if params.len() != {arity} {{\n            return Err(flowgen_core::ContractError::ArityMismatch {{\n                expected: {arity},\n                actual: params.len(),\n            }});\n        }}\n"
    ));

    let locals: Vec<String> = signature.params().iter().map(|p| local_ident(&p.name)).collect();
    for (param, local) in signature.params().iter().zip(&locals) {
        let index = param.index;
        let name = &param.name;
        let repr = param.mapping.representation;
        if repr == RepresentationType::Any {
            out.push_str(&format!(
                "\n        let {local} = params[{index}].clone(); // any type\n"
            ));
            continue;
        }
        let variant = variant(repr);
        out.push_str(&format!(
            "\n        // Coerce parameter {index} ({name}) to {}\n",
            param.arg_type
        ));
        out.push_str(&format!(
            "        let {local}: {} = match flowgen_core::coerce::{}(&params[{index}]).map_err(|source| {{\n            flowgen_core::ContractError::ArgumentCoercion {{ index: {index}, argument: {name:?}.into(), source }}\n        }})? {{\n            flowgen_core::TypedValue::{variant}(v) => v,\n            other => {{\n                return Err(flowgen_core::ContractError::TypeMismatch {{\n                    field: {name:?}.into(),\n                    expected: flowgen_core::RepresentationType::{variant},\n                    actual: other.representation(),\n                }});\n            }}\n        }};\n",
            repr.rust_type(),
            param.mapping.coerce_name
        ));
    }

    if !locals.is_empty() {
        out.push_str(&format!("        let _ = ({});\n", locals.join(", ")));
    }

    out.push_str(&format!(
        "\n        // Replace with the actual implementation.\n        Ok({})\n    }}\n}}\n",
        placeholder_expr(signature.return_type())
    ));
    out
}

/// Type name of a rendered function skeleton.
pub fn function_type_name(name: &str) -> String {
    format!("{}Func", exported_ident(name))
}

// `params` is the name of the eval slice, so an argument cannot shadow it.
fn local_ident(name: &str) -> String {
    match rust_ident(name) {
        ident if ident == "params" => "params_".to_string(),
        ident => ident,
    }
}

fn variant(repr: RepresentationType) -> &'static str {
    match repr {
        RepresentationType::String => "String",
        RepresentationType::Float64 => "Float64",
        RepresentationType::Bool => "Bool",
        RepresentationType::Int64 => "Int64",
        RepresentationType::DateTime => "DateTime",
        RepresentationType::Object => "Object",
        RepresentationType::Any => "Any",
    }
}

fn placeholder_expr(return_type: FieldType) -> &'static str {
    match return_type {
        FieldType::String => "flowgen_core::TypedValue::from(\"function result\")",
        FieldType::Int => "flowgen_core::TypedValue::Int64(42)",
        FieldType::Number => "flowgen_core::TypedValue::Float64(3.14)",
        FieldType::Boolean => "flowgen_core::TypedValue::Bool(true)",
        FieldType::Object => "flowgen_core::TypedValue::Object(serde_json::Map::new())",
        FieldType::DateTime => "flowgen_core::TypedValue::DateTime(flowgen_core::coerce::epoch())",
        FieldType::Any => "flowgen_core::TypedValue::Any(serde_json::Value::from(\"default result\"))",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArgumentSpec, FieldSpec, Schema};

    #[test]
    fn contract_uses_capitalized_idents_and_declared_keys() {
        let schema = Schema::new(vec![
            FieldSpec::new("anInputString", FieldType::String),
            FieldSpec::new("when", FieldType::DateTime),
        ])
        .unwrap();
        let source = render_contract(&Contract::compile("input", &schema));

        assert!(source.contains("pub struct Input {"));
        assert!(source.contains("pub AnInputString: String,"));
        assert!(source.contains(
            "map.insert(\"anInputString\".to_string(), serde_json::json!(self.AnInputString));"
        ));
        // datetime fields stay strings in records
        assert!(source.contains("pub When: String,"));
        assert!(source.contains("flowgen_core::coerce::to_string(raw)"));
        assert!(source.contains("index: 1, field: \"when\".into()"));
    }

    #[test]
    fn contract_fields_are_valid_identifiers() {
        let schema = Schema::new(vec![
            FieldSpec::new("content-type", FieldType::String),
            FieldSpec::new("self", FieldType::Int),
            FieldSpec::new("3d", FieldType::Boolean),
        ])
        .unwrap();
        let source = render_contract_named("GreeterInput", &Contract::compile("Input", &schema));

        assert!(source.contains("pub struct GreeterInput {"));
        assert!(source.contains("pub Content_type: String,"));
        assert!(source.contains("pub Self_: i64,"));
        assert!(source.contains("pub _3d: bool,"));
        // map keys keep the declared spelling
        assert!(source.contains("values.get(\"content-type\")"));
    }

    #[test]
    fn empty_contract_has_no_unused_bindings() {
        let source = render_contract(&Contract::compile("Output", &Schema::empty()));
        assert!(!source.contains("let null"));
        assert!(source.contains("Ok(())"));
    }

    #[test]
    fn function_skeleton_has_arity_check_and_typed_locals() {
        let sig = Signature::compile(
            &[
                ArgumentSpec::new("a", FieldType::Int),
                ArgumentSpec::new("when", FieldType::DateTime),
                ArgumentSpec::new("rest", FieldType::Any),
            ],
            FieldType::Boolean,
        )
        .unwrap();
        let source = render_function("check", "util", &sig);

        assert!(source.contains("pub struct CheckFunc;"));
        assert!(source.contains("if params.len() != 3 {"));
        assert!(source.contains(
            "let a: i64 = match flowgen_core::coerce::to_int64(&params[0])"
        ));
        assert!(source.contains("flowgen_core::TypedValue::Int64(v) => v,"));
        assert!(source.contains(
            "let when: chrono::DateTime<chrono::FixedOffset> = \
             match flowgen_core::coerce::to_datetime(&params[1])"
        ));
        assert!(source.contains("expected: flowgen_core::RepresentationType::DateTime,"));
        assert!(source.contains("let rest = params[2].clone(); // any type"));
        assert!(source.contains("let _ = (a, when, rest);"));
        assert!(source.contains("flowgen_core::TypedValue::Bool(true)"));
        assert!(source.contains(
            "RepresentationType::Int64, flowgen_core::RepresentationType::DateTime"
        ));
    }

    #[test]
    fn function_arguments_are_valid_identifiers() {
        let sig = Signature::compile(
            &[
                ArgumentSpec::new("type", FieldType::String),
                ArgumentSpec::new("params", FieldType::Int),
                ArgumentSpec::new("max-len", FieldType::Int),
            ],
            FieldType::String,
        )
        .unwrap();
        let source = render_function("pad-left", "text", &sig);

        assert!(source.contains("pub struct Pad_leftFunc;"));
        assert!(source.contains("let r#type: String = match"));
        assert!(source.contains("let params_: i64 = match"));
        assert!(source.contains("let max_len: i64 = match"));
        // declared names are kept in error values
        assert!(source.contains("argument: \"max-len\".into()"));
        assert!(source.contains("let _ = (r#type, params_, max_len);"));
    }
}
