//! Template engine based on MiniJinja

use minijinja::Environment;
use serde::Serialize;

use crate::error::TemplateError;
use crate::filters;

/// Template engine builder
pub struct EngineBuilder {
    strict_mode: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self { strict_mode: true }
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Build the engine
    pub fn build(self) -> Engine {
        Engine::new(self.strict_mode)
    }
}

/// The template engine
#[derive(Debug, Clone)]
pub struct Engine {
    strict_mode: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Engine {
    pub fn new(strict_mode: bool) -> Self {
        Self { strict_mode }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Create a configured MiniJinja environment
    fn create_environment(&self) -> Environment<'static> {
        let mut env = Environment::new();

        if self.strict_mode {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Lenient);
        }
        // Values text is YAML; a dropped final newline would alter it
        env.set_keep_trailing_newline(true);

        env.add_filter("toyaml", filters::toyaml);
        env.add_filter("tojson", filters::tojson);
        env.add_filter("b64encode", filters::b64encode);
        env.add_filter("b64decode", filters::b64decode);
        env.add_filter("quote", filters::quote);
        env.add_filter("squote", filters::squote);
        env.add_filter("nindent", filters::nindent);
        env.add_filter("indent", filters::indent);
        env.add_filter("required", filters::required);

        env
    }

    /// Render a single template string against a serializable context
    pub fn render_string<S: Serialize>(
        &self,
        template: &str,
        context: &S,
        template_name: &str,
    ) -> Result<String, TemplateError> {
        let mut env = self.create_environment();

        env.add_template_owned(template_name.to_string(), template.to_string())
            .map_err(|e| TemplateError::from_minijinja(e, template_name, template))?;

        let tmpl = env
            .get_template(template_name)
            .map_err(|e| TemplateError::from_minijinja(e, template_name, template))?;

        tmpl.render(context)
            .map_err(|e| TemplateError::from_minijinja(e, template_name, template))
    }

    /// Render a set of named templates sharing one environment
    ///
    /// Every template is loaded first so `include` and `import` can reach
    /// helpers; helpers (file name starting with `_`) are loaded but not
    /// rendered. Output keeps input order.
    pub fn render_templates<S: Serialize>(
        &self,
        templates: &[(String, String)],
        context: &S,
    ) -> Result<Vec<(String, String)>, TemplateError> {
        let mut env = self.create_environment();

        for (name, source) in templates {
            env.add_template_owned(name.clone(), source.clone())
                .map_err(|e| TemplateError::from_minijinja(e, name, source))?;
        }

        let mut rendered = Vec::with_capacity(templates.len());
        for (name, source) in templates {
            if is_helper(name) {
                continue;
            }

            let tmpl = env
                .get_template(name)
                .map_err(|e| TemplateError::from_minijinja(e, name, source))?;
            let output = tmpl
                .render(context)
                .map_err(|e| TemplateError::from_minijinja(e, name, source))?;

            rendered.push((name.clone(), output));
        }

        Ok(rendered)
    }
}

fn is_helper(name: &str) -> bool {
    name.rsplit('/').next().is_some_and(|file| file.starts_with('_'))
}

/// True if the text holds any template syntax at all
pub fn contains_template_syntax(text: &str) -> bool {
    text.contains("{{") || text.contains("{%") || text.contains("{#")
}
