//! Résumé → [`Fragment`] rendering.
//!
//! Sections are emitted in menu order, skipping disabled sections and hidden
//! items. Rich-text fields become [`Node::Raw`] so any images pasted into
//! them are still found by the inliner.

use crate::markup::{escape_text, Element, Fragment, Node};
use crate::model::{
    BaseInfo, CustomModule, Education, Experience, FieldType, Project, ResumeDocument, Role,
    TemplateConfig, TemplateStyle,
};

/// Render a document with the template it references.
pub fn render_document(doc: &ResumeDocument, templates: &TemplateConfig) -> Fragment {
    let style = templates.resolve(&doc.template_id);
    let layout = &doc.layout;

    let page_css = format!(
        "--theme-color: {}; --font-family: {}; --base-font-size: {}px; padding: {}px; box-sizing: border-box; {}",
        layout.theme_color,
        layout.font_family,
        layout.base_font_size,
        layout.page_padding,
        style.style(Role::Page).to_css()
    );

    let mut page = Element::new("div")
        .attr("class", "resume")
        .attr("data-template", doc.template_id.clone())
        .attr("style", page_css);

    for section in doc.enabled_sections() {
        let rendered = match section.id.as_str() {
            "basic" => Some(render_header(&doc.base_info, doc, style)),
            "skills" => render_skills(&section.title, &doc.skills, style),
            "experience" => render_list(&section.title, &doc.experience, style, experience_item),
            "projects" => render_list(&section.title, &doc.projects, style, project_item),
            "education" => render_list(&section.title, &doc.education, style, education_item),
            other => doc
                .custom_module(other)
                .and_then(|m| render_custom(m, style)),
        };
        if let Some(el) = rendered {
            page = page.child(el);
        }
    }

    Fragment::new(vec![page.into()])
}

/// Wrap rendered body markup into a standalone A4 HTML document.
pub fn html_document(body: &str, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
<style>@page {{ size: A4; margin: 0; }} html, body {{ margin: 0; padding: 0; }} \
* {{ -webkit-print-color-adjust: exact; print-color-adjust: exact; }}</style>\n\
</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_text(title),
        body
    )
}

fn styled(tag: &str, style: &TemplateStyle, role: Role) -> Element {
    let css = style.style(role);
    let el = Element::new(tag);
    if css.is_empty() {
        el
    } else {
        el.attr("style", css.to_css())
    }
}

fn section(title: &str, style: &TemplateStyle, body: Vec<Node>) -> Element {
    Element::new("section")
        .child(styled("h2", style, Role::SectionTitle).child(Node::text(title)))
        .children(body)
}

fn render_header(info: &BaseInfo, doc: &ResumeDocument, style: &TemplateStyle) -> Element {
    let mut header = styled("header", style, Role::Header);

    if let Some(ref photo) = info.photo {
        if !photo.trim().is_empty() {
            header = header.child(
                Element::new("img")
                    .attr("class", "photo")
                    .attr("src", photo.clone())
                    .attr("alt", info.name.clone())
                    .attr("style", "width: 90px; height: 120px; object-fit: cover"),
            );
        }
    }

    header = header.child(Element::new("h1").child(Node::text(info.name.clone())));

    let mut contacts: Vec<Node> = Vec::new();
    for field in doc.field_order.visible() {
        let Some(value) = info.value_of(&field.key) else {
            continue;
        };
        let node: Node = match field.field_type {
            FieldType::Email => Element::new("a")
                .attr("href", format!("mailto:{value}"))
                .child(Node::text(value))
                .into(),
            FieldType::Phone => Element::new("a")
                .attr("href", format!("tel:{value}"))
                .child(Node::text(value))
                .into(),
            FieldType::Link => Element::new("a")
                .attr("href", value)
                .child(Node::text(value))
                .into(),
            FieldType::Text | FieldType::Date => Node::text(value),
        };
        contacts.push(Element::new("span").attr("class", "field").child(node).into());
    }
    for custom in info.custom_fields.iter().filter(|f| f.visible && !f.value.is_empty()) {
        contacts.push(
            Element::new("span")
                .attr("class", "field")
                .child(Node::text(format!("{}: {}", custom.label, custom.value)))
                .into(),
        );
    }
    if !contacts.is_empty() {
        header = header.child(Element::new("div").attr("class", "contacts").children(contacts));
    }
    header
}

fn render_skills(title: &str, skills: &str, style: &TemplateStyle) -> Option<Element> {
    if skills.trim().is_empty() {
        return None;
    }
    Some(section(
        title,
        style,
        vec![styled("div", style, Role::Body).child(Node::raw(skills)).into()],
    ))
}

fn render_list<T: crate::model::SectionItem>(
    title: &str,
    items: &[T],
    style: &TemplateStyle,
    item: fn(&T, &TemplateStyle) -> Element,
) -> Option<Element> {
    let body: Vec<Node> = items
        .iter()
        .filter(|i| i.visible())
        .map(|i| Node::from(item(i, style)))
        .collect();
    if body.is_empty() {
        None
    } else {
        Some(section(title, style, body))
    }
}

fn title_row(style: &TemplateStyle, left: &str, right: &str) -> Element {
    styled("div", style, Role::ItemTitle)
        .child(Element::new("span").child(Node::text(left)))
        .child(Element::new("span").child(Node::text(right)))
}

fn rich_body(style: &TemplateStyle, html: &str) -> Option<Node> {
    if html.trim().is_empty() {
        None
    } else {
        Some(styled("div", style, Role::Body).child(Node::raw(html)).into())
    }
}

fn experience_item(e: &Experience, style: &TemplateStyle) -> Element {
    Element::new("div")
        .attr("class", "item")
        .child(title_row(style, &e.company, &e.date))
        .child(Element::new("div").child(Node::text(e.position.clone())))
        .children(rich_body(style, &e.details))
}

fn project_item(p: &Project, style: &TemplateStyle) -> Element {
    let mut el = Element::new("div")
        .attr("class", "item")
        .child(title_row(style, &p.name, &p.date))
        .child(Element::new("div").child(Node::text(p.role.clone())));
    if let Some(ref link) = p.link {
        if !link.is_empty() {
            el = el.child(
                Element::new("a")
                    .attr("href", link.clone())
                    .child(Node::text(link.clone())),
            );
        }
    }
    el.children(rich_body(style, &p.description))
}

fn education_item(e: &Education, style: &TemplateStyle) -> Element {
    let dates = match (e.start_date.is_empty(), e.end_date.is_empty()) {
        (false, false) => format!("{} - {}", e.start_date, e.end_date),
        (false, true) => e.start_date.clone(),
        (true, false) => e.end_date.clone(),
        (true, true) => String::new(),
    };
    let mut details: Vec<&str> = [e.major.as_str(), e.degree.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    let gpa = e.gpa.as_ref().map(|g| format!("GPA {g}"));
    if let Some(ref g) = gpa {
        details.push(g);
    }
    Element::new("div")
        .attr("class", "item")
        .child(title_row(style, &e.school, &dates))
        .child(Element::new("div").child(Node::text(details.join(" · "))))
        .children(rich_body(style, &e.description))
}

fn render_custom(module: &CustomModule, style: &TemplateStyle) -> Option<Element> {
    render_list(&module.title, &module.items, style, |item, style| {
        Element::new("div")
            .attr("class", "item")
            .child(title_row(style, &item.title, &item.date_range))
            .child(Element::new("div").child(Node::text(item.subtitle.clone())))
            .children(rich_body(style, &item.description))
    })
}
