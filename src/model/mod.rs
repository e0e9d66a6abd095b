//! The résumé document model.
//!
//! A [`ResumeDocument`] is an explicit state container: every mutation goes
//! through one of its `&mut self` methods, so the borrow checker provides
//! the single-writer guarantee and there is no hidden global store.
//!
//! - [`document`]: the container, its sections and update operations
//! - [`base_info`]: the single personal-info record and its [`FieldOrder`]
//! - [`template`]: per-template style directives with `default` fallback

pub mod base_info;
pub mod document;
pub mod template;

pub use base_info::{BaseInfo, CustomField, FieldDescriptor, FieldOrder, FieldType};
pub use document::{
    CustomItem, CustomModule, Education, Experience, ItemId, LayoutSettings, MenuSection, Project,
    ResumeDocument, SectionItem,
};
pub use template::{Role, Style, TemplateConfig, TemplateStyle};
