//! Template style directives.
//!
//! A [`TemplateConfig`] maps template names to a [`TemplateStyle`]: inline
//! CSS per structural [`Role`]. Lookups never fail; unknown names resolve to
//! the `default` entry, which is always present.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the fallback template.
pub const DEFAULT_TEMPLATE: &str = "default";

/// Structural role of a rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// The page container.
    Page,
    /// Name, job title and contact line.
    Header,
    /// Title bar above each section.
    SectionTitle,
    /// Heading line of an item (company, project, school).
    ItemTitle,
    /// Free-text body.
    Body,
}

/// Ordered CSS declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Style(BTreeMap<String, String>);

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: &str, value: &str) -> Self {
        self.0.insert(property.to_string(), value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialise as an inline `style` attribute value.
    pub fn to_css(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Style directives of one template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateStyle {
    #[serde(default)]
    pub roles: BTreeMap<Role, Style>,
}

impl TemplateStyle {
    pub fn with_role(mut self, role: Role, style: Style) -> Self {
        self.roles.insert(role, style);
        self
    }

    /// Style for a role; empty when the template does not style it.
    pub fn style(&self, role: Role) -> Style {
        self.roles.get(&role).cloned().unwrap_or_default()
    }
}

/// Registry of templates with guaranteed `default` fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, TemplateStyle>", into = "BTreeMap<String, TemplateStyle>")]
pub struct TemplateConfig {
    fallback: TemplateStyle,
    templates: BTreeMap<String, TemplateStyle>,
}

impl TemplateConfig {
    /// Built-in templates: `default`, `classic`, `modern`.
    pub fn builtin() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(
            "classic".to_string(),
            default_style().with_role(
                Role::SectionTitle,
                Style::new()
                    .with("font-size", "18px")
                    .with("font-weight", "bold")
                    .with("text-align", "center")
                    .with("border-bottom", "1px solid var(--theme-color)")
                    .with("margin", "16px 0 8px"),
            ),
        );
        templates.insert(
            "modern".to_string(),
            default_style().with_role(
                Role::SectionTitle,
                Style::new()
                    .with("font-size", "16px")
                    .with("font-weight", "600")
                    .with("color", "#ffffff")
                    .with("background", "var(--theme-color)")
                    .with("padding", "4px 8px")
                    .with("margin", "16px 0 8px"),
            ),
        );
        Self {
            fallback: default_style(),
            templates,
        }
    }

    /// Add or replace a template. Inserting `default` replaces the fallback.
    pub fn insert(&mut self, name: impl Into<String>, style: TemplateStyle) {
        let name = name.into();
        if name == DEFAULT_TEMPLATE {
            self.fallback = style;
        } else {
            self.templates.insert(name, style);
        }
    }

    /// Resolve a template name, falling back to `default`.
    pub fn resolve(&self, name: &str) -> &TemplateStyle {
        self.templates.get(name).unwrap_or(&self.fallback)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(DEFAULT_TEMPLATE).chain(self.templates.keys().map(String::as_str))
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl From<BTreeMap<String, TemplateStyle>> for TemplateConfig {
    fn from(mut templates: BTreeMap<String, TemplateStyle>) -> Self {
        let fallback = templates
            .remove(DEFAULT_TEMPLATE)
            .unwrap_or_else(default_style);
        Self {
            fallback,
            templates,
        }
    }
}

impl From<TemplateConfig> for BTreeMap<String, TemplateStyle> {
    fn from(config: TemplateConfig) -> Self {
        let mut map = config.templates;
        map.insert(DEFAULT_TEMPLATE.to_string(), config.fallback);
        map
    }
}

fn default_style() -> TemplateStyle {
    TemplateStyle::default()
        .with_role(
            Role::Page,
            Style::new()
                .with("font-family", "var(--font-family)")
                .with("font-size", "var(--base-font-size)")
                .with("line-height", "1.5")
                .with("color", "#222222"),
        )
        .with_role(
            Role::Header,
            Style::new()
                .with("text-align", "center")
                .with("margin-bottom", "12px"),
        )
        .with_role(
            Role::SectionTitle,
            Style::new()
                .with("font-size", "16px")
                .with("font-weight", "bold")
                .with("color", "var(--theme-color)")
                .with("border-bottom", "2px solid var(--theme-color)")
                .with("margin", "16px 0 8px"),
        )
        .with_role(
            Role::ItemTitle,
            Style::new()
                .with("display", "flex")
                .with("justify-content", "space-between")
                .with("font-weight", "600"),
        )
        .with_role(Role::Body, Style::new().with("margin", "4px 0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_template_falls_back_to_default() {
        let config = TemplateConfig::builtin();
        assert_eq!(config.resolve("nope"), config.resolve(DEFAULT_TEMPLATE));
        assert_ne!(config.resolve("modern"), config.resolve(DEFAULT_TEMPLATE));
    }

    #[test]
    fn deserialized_registry_gains_default() {
        let json = r#"{"compact": {"roles": {"sectionTitle": {"font-size": "12px"}}}}"#;
        let config: TemplateConfig = serde_json::from_str(json).unwrap();
        assert!(config.names().any(|n| n == DEFAULT_TEMPLATE));
        assert_eq!(
            config.resolve("compact").style(Role::SectionTitle).to_css(),
            "font-size: 12px"
        );
        assert_eq!(config.resolve("missing"), &default_style());
    }

    #[test]
    fn style_css_is_sorted_and_joined() {
        let s = Style::new().with("margin", "0").with("color", "red");
        assert_eq!(s.to_css(), "color: red; margin: 0");
        assert!(Style::new().is_empty());
    }
}
