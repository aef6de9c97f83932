//! Prompt rendering.

use crate::types::{PromptDefinition, RenderedPrompt};
use handlebars::Handlebars;
use std::collections::HashMap;
use vetted_core::{AppError, AppResult};

/// Render a prompt definition with the given variables.
///
/// Both the system and the user template are rendered with the same
/// variable set, so an overridden prompt may move a variable between the
/// two messages without code changes.
///
/// # Example
/// ```
/// use vetted_prompt::{load_prompt, render_prompt};
/// use std::collections::HashMap;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(Path::new("."), "grade.relevance")?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is Rust?".to_string());
/// vars.insert("answer".to_string(), "A systems language.".to_string());
/// let rendered = render_prompt(&def, &vars)?;
/// assert!(rendered.user.contains("What is Rust?"));
/// # Ok(())
/// # }
/// ```
pub fn render_prompt(
    definition: &PromptDefinition,
    variables: &HashMap<String, String>,
) -> AppResult<RenderedPrompt> {
    tracing::debug!("Rendering prompt: {}", definition.id);

    let user = render_template(&definition.template, variables)?;

    let system = match &definition.system {
        Some(system) => Some(render_template(system, variables)?),
        None => None,
    };

    Ok(RenderedPrompt { system, user })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(system: Option<&str>, template: &str) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            system: system.map(String::from),
            template: template.to_string(),
        }
    }

    #[test]
    fn test_render_substitutes_variables() {
        let def = definition(None, "Question: {{question}}");
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Why?".to_string());

        let rendered = render_prompt(&def, &vars).unwrap();
        assert_eq!(rendered.user, "Question: Why?");
        assert!(rendered.system.is_none());
    }

    #[test]
    fn test_render_system_message() {
        let def = definition(Some("Grade as {{mode}}."), "{{question}}");
        let mut vars = HashMap::new();
        vars.insert("mode".to_string(), "strict".to_string());
        vars.insert("question".to_string(), "Why?".to_string());

        let rendered = render_prompt(&def, &vars).unwrap();
        assert_eq!(rendered.system.as_deref(), Some("Grade as strict."));
    }

    #[test]
    fn test_render_does_not_escape_html() {
        let def = definition(None, "{{text}}");
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), "a < b && c > d".to_string());

        let rendered = render_prompt(&def, &vars).unwrap();
        assert_eq!(rendered.user, "a < b && c > d");
    }
}
