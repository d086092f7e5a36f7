//! Prompt templates and placeholder rendering.

use crate::error::ApiError;
use std::collections::HashMap;
use std::path::Path;

pub const PLACEHOLDER_DISPLAY_NAME: &str = "display_name";
pub const PLACEHOLDER_ATTRIBUTES: &str = "attributes";
pub const PLACEHOLDER_TIME_BOUND: &str = "time_bound";
pub const PLACEHOLDER_DATE: &str = "date";

const REQUIRED_PLACEHOLDERS: [&str; 3] = [
    PLACEHOLDER_DISPLAY_NAME,
    PLACEHOLDER_ATTRIBUTES,
    PLACEHOLDER_TIME_BOUND,
];

const TEMPLATE_ES: &str = "\
Eres un coach de hábitos. Crea el reto diario de hoy ({date}) para {display_name}.

Perfil de la persona:
{attributes}

Requisitos del reto:
- Debe ser positivo y accionable.
- Debe poder completarse en menos de {time_bound} minutos.
- Responde únicamente con el texto del reto, sin introducción, saludo ni explicación.";

const TEMPLATE_EN: &str = "\
You are a habits coach. Write today's ({date}) daily challenge for {display_name}.

About this person:
{attributes}

Challenge requirements:
- It must be positive and actionable.
- It must be completable in under {time_bound} minutes.
- Reply with the challenge text only, with no preamble, greeting or explanation.";

/// Localized fixed strings used when rendering attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeLabels {
    pub empty_value: String,
    pub no_attributes: String,
}

impl AttributeLabels {
    pub fn for_language(language: &str) -> Self {
        match language {
            "en" => Self {
                empty_value: "(no data)".to_string(),
                no_attributes: "No profile details recorded.".to_string(),
            },
            _ => Self {
                empty_value: "(sin dato)".to_string(),
                no_attributes: "Sin datos de perfil registrados.".to_string(),
            },
        }
    }
}

/// A validated prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// Built-in template for a supported language.
    pub fn builtin(language: &str) -> Option<Self> {
        let text = match language {
            "es" => TEMPLATE_ES,
            "en" => TEMPLATE_EN,
            _ => return None,
        };
        Some(Self {
            text: text.to_string(),
        })
    }

    /// Parse a custom template; it must reference `{display_name}`, `{attributes}`
    /// and `{time_bound}`.
    pub fn parse(text: impl Into<String>) -> Result<Self, ApiError> {
        let text = text.into();
        for key in REQUIRED_PLACEHOLDERS {
            let needle = format!("{{{}}}", key);
            if !text.contains(&needle) {
                return Err(ApiError::TemplateError(format!(
                    "Template must contain the {} placeholder",
                    needle
                )));
            }
        }
        Ok(Self { text })
    }

    pub fn from_file(path: &Path) -> Result<Self, ApiError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ApiError::TemplateError(format!("Failed to read template {}: {}", path.display(), e))
        })?;
        Self::parse(text)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Substitute `{name}` placeholders in a single pass.
    ///
    /// Substituted values are never rescanned, and unknown placeholders are kept verbatim.
    pub fn render(&self, values: &HashMap<&str, String>) -> String {
        let mut out = String::with_capacity(self.text.len() + 256);
        let mut rest = self.text.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let key = &after[..close];
                    // A stray '{' before the real placeholder is literal text
                    if let Some(inner) = key.rfind('{') {
                        out.push('{');
                        out.push_str(&key[..inner]);
                        rest = &after[inner..];
                        continue;
                    }
                    match values.get(key) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(key);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
