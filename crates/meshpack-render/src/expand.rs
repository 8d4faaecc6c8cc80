//! Expansion of template expressions inside the input bundle
//!
//! The spec values, user values and every parameter value may contain
//! `{{ ... }}` expressions evaluated against the bundle itself, e.g.
//! `namespace: {{ installNamespace }}`. Each field is expanded exactly once;
//! output is never re-scanned for further expressions.
//!
//! Expressions use MiniJinja syntax with the bundle's camelCase field names
//! at the top level, so a Go-template style `{{.InstallNamespace}}` is written
//! `{{ installNamespace }}` and `{{.MeshRef.Namespace}}` is written
//! `{{ meshRef.namespace }}`.

use meshpack_core::ValuesInputs;

use crate::engine::{Engine, contains_template_syntax};
use crate::error::TemplateError;

/// Expand spec values, then user values, then parameters
///
/// Later fields see the already-expanded earlier ones. The first failing
/// expression aborts the whole expansion; nothing is partially applied.
pub fn exec_input_values_templates(
    engine: &Engine,
    inputs: ValuesInputs,
) -> Result<ValuesInputs, TemplateError> {
    let mut inputs = inputs;

    if contains_template_syntax(&inputs.spec_defined_values) {
        inputs.spec_defined_values =
            engine.render_string(&inputs.spec_defined_values, &inputs, "specValues")?;
    }

    if contains_template_syntax(&inputs.user_defined_values) {
        inputs.user_defined_values =
            engine.render_string(&inputs.user_defined_values, &inputs, "userValues")?;
    }

    let names: Vec<String> = inputs.params.keys().cloned().collect();
    for name in names {
        let Some(value) = inputs.params.get(&name) else {
            continue;
        };
        if !contains_template_syntax(value) {
            continue;
        }

        let expanded = engine.render_string(value, &inputs, &name)?;
        inputs.params.insert(name, expanded);
    }

    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateErrorKind;

    fn inputs() -> ValuesInputs {
        ValuesInputs::new("demo", "app").with_mesh("linkerd", "linkerd-system")
    }

    #[test]
    fn test_expands_spec_and_user_values() {
        let inputs = inputs()
            .with_spec_values("namespace: {{ installNamespace }}\n")
            .with_user_values("release: {{ name }}\nmesh: {{ meshRef.name }}\n");

        let expanded = exec_input_values_templates(&Engine::default(), inputs).unwrap();

        assert_eq!(expanded.spec_defined_values, "namespace: app\n");
        assert_eq!(expanded.user_defined_values, "release: demo\nmesh: linkerd\n");
    }

    #[test]
    fn test_expands_params() {
        let inputs = inputs()
            .with_param("meshNamespace", "{{ meshRef.namespace }}")
            .with_param("replicas", "2");

        let expanded = exec_input_values_templates(&Engine::default(), inputs).unwrap();

        assert_eq!(expanded.params["meshNamespace"], "linkerd-system");
        assert_eq!(expanded.params["replicas"], "2");
    }

    #[test]
    fn test_user_values_see_expanded_spec_values() {
        let inputs = inputs()
            .with_spec_values("ns: {{ installNamespace }}")
            .with_user_values("{{ specDefinedValues }}");

        let expanded = exec_input_values_templates(&Engine::default(), inputs).unwrap();

        assert_eq!(expanded.user_defined_values, "ns: app");
    }

    #[test]
    fn test_single_pass() {
        // The output of the expansion is itself template syntax; it stays literal
        let inputs = inputs()
            .with_param("literal", "{{ '{{ name }}' }}")
            .with_user_values("x: {{ params.literal }}");

        let expanded = exec_input_values_templates(&Engine::default(), inputs).unwrap();

        assert_eq!(expanded.params["literal"], "{{ name }}");
        // user values were expanded before params, so they saw the raw param text
        assert_eq!(expanded.user_defined_values, "x: {{ '{{ name }}' }}");
    }

    #[test]
    fn test_plain_text_untouched() {
        let inputs = inputs().with_spec_values("a: 1\n\n").with_param("p", "v");
        let expanded = exec_input_values_templates(&Engine::default(), inputs.clone()).unwrap();

        assert_eq!(expanded, inputs);
    }

    #[test]
    fn test_malformed_expression_fails() {
        let inputs = inputs().with_user_values("x: {{ name");
        let err = exec_input_values_templates(&Engine::default(), inputs).unwrap_err();

        assert_eq!(err.kind(), TemplateErrorKind::SyntaxError);
        assert_eq!(err.template_name, "userValues");
    }

    #[test]
    fn test_undefined_reference_fails() {
        let inputs = inputs().with_param("p", "{{ nosuchfield }}");
        let err = exec_input_values_templates(&Engine::default(), inputs).unwrap_err();

        assert_eq!(err.kind(), TemplateErrorKind::UndefinedVariable);
        assert_eq!(err.template_name, "p");
    }
}
