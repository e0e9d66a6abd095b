//! The résumé state container and its update operations.

use crate::error::DocumentError;
use crate::model::base_info::{BaseInfo, FieldOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Immutable identifier assigned when an item is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// A fresh, collision-free identifier (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Common behaviour of every item stored in an ordered section.
pub trait SectionItem {
    fn id(&self) -> &ItemId;
    fn visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);
}

macro_rules! section_item {
    ($ty:ty) => {
        impl SectionItem for $ty {
            fn id(&self) -> &ItemId {
                &self.id
            }
            fn visible(&self) -> bool {
                self.visible
            }
            fn set_visible(&mut self, visible: bool) {
                self.visible = visible;
            }
        }
    };
}

fn visible_default() -> bool {
    true
}

/// A work-experience entry. `details` is rich-text HTML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: ItemId,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub details: String,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

impl Experience {
    pub fn new(company: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            id: ItemId::generate(),
            company: company.into(),
            position: position.into(),
            date: String::new(),
            details: String::new(),
            visible: true,
        }
    }
}

/// A project entry. `description` is rich-text HTML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

impl Project {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: ItemId::generate(),
            name: name.into(),
            role: role.into(),
            date: String::new(),
            description: String::new(),
            link: None,
            visible: true,
        }
    }
}

/// An education entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: ItemId,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub gpa: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

impl Education {
    pub fn new(school: impl Into<String>, major: impl Into<String>) -> Self {
        Self {
            id: ItemId::generate(),
            school: school.into(),
            major: major.into(),
            degree: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            gpa: None,
            description: String::new(),
            visible: true,
        }
    }
}

/// An entry of a user-defined module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomItem {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub date_range: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

impl CustomItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ItemId::generate(),
            title: title.into(),
            subtitle: String::new(),
            date_range: String::new(),
            description: String::new(),
            visible: true,
        }
    }
}

section_item!(Experience);
section_item!(Project);
section_item!(Education);
section_item!(CustomItem);

/// A user-defined module: a titled, ordered list of [`CustomItem`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomModule {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub items: Vec<CustomItem>,
}

/// One entry of the section menu; its position is its render order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuSection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default = "visible_default")]
    pub enabled: bool,
    #[serde(default)]
    pub order: usize,
}

impl MenuSection {
    fn new(id: &str, title: &str, icon: &str, order: usize) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            icon: icon.to_string(),
            enabled: true,
            order,
        }
    }
}

/// Page-level layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutSettings {
    pub theme_color: String,
    pub font_family: String,
    /// Base font size in CSS pixels.
    pub base_font_size: f64,
    /// Uniform page padding in CSS pixels.
    pub page_padding: f64,
    /// Shrink content to fit one page.
    pub auto_fit: bool,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            theme_color: "#000000".to_string(),
            font_family: "sans-serif".to_string(),
            base_font_size: 14.0,
            page_padding: 32.0,
            auto_fit: true,
        }
    }
}

/// A complete résumé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub id: ItemId,
    pub title: String,
    #[serde(default = "default_template")]
    pub template_id: String,
    #[serde(default)]
    pub base_info: BaseInfo,
    #[serde(default)]
    pub field_order: FieldOrder,
    #[serde(default = "default_menu_sections")]
    pub menu_sections: Vec<MenuSection>,
    #[serde(default = "default_active_section")]
    pub active_section: String,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub education: Vec<Education>,
    /// Rich-text HTML.
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub custom_modules: Vec<CustomModule>,
    #[serde(default)]
    pub layout: LayoutSettings,
}

fn default_template() -> String {
    "default".to_string()
}

fn default_active_section() -> String {
    "basic".to_string()
}

fn default_menu_sections() -> Vec<MenuSection> {
    vec![
        MenuSection::new("basic", "Basic info", "👤", 0),
        MenuSection::new("skills", "Skills", "⚡", 1),
        MenuSection::new("experience", "Experience", "💼", 2),
        MenuSection::new("projects", "Projects", "🚀", 3),
        MenuSection::new("education", "Education", "🎓", 4),
    ]
}

impl ResumeDocument {
    /// An empty résumé with the standard section menu.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ItemId::generate(),
            title: title.into(),
            template_id: default_template(),
            base_info: BaseInfo::default(),
            field_order: FieldOrder::default(),
            menu_sections: default_menu_sections(),
            active_section: default_active_section(),
            experience: Vec::new(),
            projects: Vec::new(),
            education: Vec::new(),
            skills: String::new(),
            custom_modules: Vec::new(),
            layout: LayoutSettings::default(),
        }
    }

    // ── Experience ───────────────────────────────────────────────────────

    /// Append a blank experience entry and return its id.
    pub fn add_experience(&mut self) -> ItemId {
        let item = Experience::new("", "");
        let id = item.id.clone();
        self.experience.push(item);
        id
    }

    /// Replace the entry with the same id in place, or append it.
    pub fn update_experience(&mut self, item: Experience) {
        upsert(&mut self.experience, item);
    }

    /// Replace the whole sequence after a drag reorder.
    pub fn update_experience_batch(&mut self, order: Vec<Experience>) -> Result<(), DocumentError> {
        reorder(&mut self.experience, order, "experience")
    }

    pub fn toggle_experience_visibility(&mut self, id: &ItemId) -> Result<bool, DocumentError> {
        toggle(&mut self.experience, id, "experience")
    }

    // ── Projects ─────────────────────────────────────────────────────────

    pub fn add_project(&mut self) -> ItemId {
        let item = Project::new("", "");
        let id = item.id.clone();
        self.projects.push(item);
        id
    }

    pub fn update_projects(&mut self, item: Project) {
        upsert(&mut self.projects, item);
    }

    pub fn update_projects_batch(&mut self, order: Vec<Project>) -> Result<(), DocumentError> {
        reorder(&mut self.projects, order, "projects")
    }

    pub fn toggle_project_visibility(&mut self, id: &ItemId) -> Result<bool, DocumentError> {
        toggle(&mut self.projects, id, "project")
    }

    // ── Education ────────────────────────────────────────────────────────

    pub fn add_education(&mut self) -> ItemId {
        let item = Education::new("", "");
        let id = item.id.clone();
        self.education.push(item);
        id
    }

    pub fn update_education(&mut self, item: Education) {
        upsert(&mut self.education, item);
    }

    pub fn update_education_batch(&mut self, order: Vec<Education>) -> Result<(), DocumentError> {
        reorder(&mut self.education, order, "education")
    }

    pub fn toggle_education_visibility(&mut self, id: &ItemId) -> Result<bool, DocumentError> {
        toggle(&mut self.education, id, "education")
    }

    // ── Custom modules ───────────────────────────────────────────────────

    /// Create a custom module, register it in the section menu and return
    /// its id.
    pub fn add_custom_module(&mut self, title: impl Into<String>) -> ItemId {
        let title = title.into();
        let id = ItemId::generate();
        self.menu_sections.push(MenuSection {
            id: id.to_string(),
            title: title.clone(),
            icon: "➕".to_string(),
            enabled: true,
            order: self.menu_sections.len(),
        });
        self.custom_modules.push(CustomModule {
            id: id.clone(),
            title,
            items: Vec::new(),
        });
        id
    }

    /// Rename a custom module and its menu entry.
    pub fn rename_custom_module(
        &mut self,
        module_id: &ItemId,
        title: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let title = title.into();
        let module = self.custom_module_mut(module_id)?;
        module.title = title.clone();
        if let Some(section) = self
            .menu_sections
            .iter_mut()
            .find(|s| s.id == module_id.as_str())
        {
            section.title = title;
        }
        Ok(())
    }

    pub fn update_custom_item(
        &mut self,
        module_id: &ItemId,
        item: CustomItem,
    ) -> Result<(), DocumentError> {
        upsert(&mut self.custom_module_mut(module_id)?.items, item);
        Ok(())
    }

    pub fn update_custom_items_batch(
        &mut self,
        module_id: &ItemId,
        order: Vec<CustomItem>,
    ) -> Result<(), DocumentError> {
        let module = self.custom_module_mut(module_id)?;
        let section = module.title.clone();
        reorder(&mut module.items, order, &section)
    }

    fn custom_module_mut(&mut self, module_id: &ItemId) -> Result<&mut CustomModule, DocumentError> {
        self.custom_modules
            .iter_mut()
            .find(|m| &m.id == module_id)
            .ok_or_else(|| DocumentError::UnknownId {
                kind: "custom module",
                id: module_id.to_string(),
            })
    }

    // ── Base info, skills, layout ───────────────────────────────────────

    pub fn update_base_info(&mut self, info: BaseInfo) {
        self.base_info = info;
    }

    pub fn set_field_order(&mut self, order: FieldOrder) {
        self.field_order = order;
    }

    pub fn update_skills(&mut self, html: impl Into<String>) {
        self.skills = html.into();
    }

    pub fn set_template(&mut self, template_id: impl Into<String>) {
        self.template_id = template_id.into();
    }

    // ── Section menu ─────────────────────────────────────────────────────

    /// Replace the section menu order. Ids must be a permutation of the
    /// current ones; `order` fields are re-indexed.
    pub fn reorder_sections(&mut self, mut sections: Vec<MenuSection>) -> Result<(), DocumentError> {
        let before: HashSet<&str> = self.menu_sections.iter().map(|s| s.id.as_str()).collect();
        let after: HashSet<&str> = sections.iter().map(|s| s.id.as_str()).collect();
        if after.len() != sections.len() || before != after {
            return Err(DocumentError::ReorderMismatch {
                section: "menu".to_string(),
                expected: self.menu_sections.len(),
                actual: sections.len(),
            });
        }
        for (i, s) in sections.iter_mut().enumerate() {
            s.order = i;
        }
        self.menu_sections = sections;
        Ok(())
    }

    /// Enable or disable a section in the rendered output.
    pub fn toggle_section(&mut self, section_id: &str) -> Result<bool, DocumentError> {
        let section = self
            .menu_sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| DocumentError::UnknownId {
                kind: "section",
                id: section_id.to_string(),
            })?;
        section.enabled = !section.enabled;
        Ok(section.enabled)
    }

    pub fn set_active_section(&mut self, section_id: &str) -> Result<(), DocumentError> {
        if !self.menu_sections.iter().any(|s| s.id == section_id) {
            return Err(DocumentError::UnknownId {
                kind: "section",
                id: section_id.to_string(),
            });
        }
        self.active_section = section_id.to_string();
        Ok(())
    }

    /// Enabled sections in render order.
    pub fn enabled_sections(&self) -> impl Iterator<Item = &MenuSection> {
        self.menu_sections.iter().filter(|s| s.enabled)
    }

    pub fn custom_module(&self, module_id: &str) -> Option<&CustomModule> {
        self.custom_modules
            .iter()
            .find(|m| m.id.as_str() == module_id)
    }
}

// ── Generic section helpers ──────────────────────────────────────────────

fn upsert<T: SectionItem>(items: &mut Vec<T>, item: T) {
    match items.iter().position(|i| i.id() == item.id()) {
        Some(pos) => items[pos] = item,
        None => items.push(item),
    }
}

fn reorder<T: SectionItem>(
    items: &mut Vec<T>,
    order: Vec<T>,
    section: &str,
) -> Result<(), DocumentError> {
    let before: HashSet<&ItemId> = items.iter().map(|i| i.id()).collect();
    let after: HashSet<&ItemId> = order.iter().map(|i| i.id()).collect();
    if order.len() != items.len() || after.len() != order.len() || before != after {
        return Err(DocumentError::ReorderMismatch {
            section: section.to_string(),
            expected: items.len(),
            actual: order.len(),
        });
    }
    *items = order;
    Ok(())
}

fn toggle<T: SectionItem>(items: &mut [T], id: &ItemId, kind: &'static str) -> Result<bool, DocumentError> {
    let item = items
        .iter_mut()
        .find(|i| i.id() == id)
        .ok_or_else(|| DocumentError::UnknownId {
            kind,
            id: id.to_string(),
        })?;
    item.set_visible(!item.visible());
    Ok(item.visible())
}
