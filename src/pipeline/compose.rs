//! Composition: map a [`DocumentSpec`] onto the section tree.
//!
//! ## Layout
//!
//! ```text
//! [cover]            optional, static, from GenerationConfig::cover_page
//! title + outline    title, outline label, numbered outline points
//! one per point      POINT IN UPPER CASE, then its body paragraphs
//! conclusion         label, conclusion text
//! references         label, numbered references
//! ```
//!
//! Every section after the first starts on a new page. Composition is pure:
//! no I/O, no model calls, same input gives the same tree.

use crate::config::{CoverPage, GenerationConfig};
use crate::document::{Alignment, Block, ComposedDocument, DocumentSpec, HeadingLevel, Section};

/// Named style for outline list items.
pub const LIST_STYLE: &str = "ListParagraph";

/// Body text size in half-points (14 pt).
pub const BODY_FONT_SIZE: usize = 28;

/// Space before a body paragraph, in twips.
pub const BODY_SPACING_BEFORE: u32 = 360;

/// First-line indentation of body paragraphs, in twips (0.5 in).
pub const FIRST_LINE_INDENT: i32 = 720;

/// Build the full section tree for `spec`.
pub fn compose(spec: &DocumentSpec, config: &GenerationConfig) -> ComposedDocument {
    let mut sections = Vec::with_capacity(spec.outline.len() + 4);

    if let Some(cover) = &config.cover_page {
        sections.push(cover_section(cover));
    }

    sections.push(outline_section(spec, &config.labels.outline));

    for point in &spec.outline {
        sections.push(point_section(point, spec.paragraphs.for_point(point)));
    }

    sections.push(Section::new(vec![
        section_heading(&config.labels.conclusion),
        body(&spec.conclusion).spacing_before(0),
    ]));

    let mut references = vec![section_heading(&config.labels.references)];
    references.extend(
        spec.references
            .iter()
            .enumerate()
            .map(|(i, r)| Block::text(format!("{}. {}", i + 1, r)).align(Alignment::Justified)),
    );
    sections.push(Section::new(references));

    for (i, section) in sections.iter_mut().enumerate() {
        section.page_break_before = i > 0;
    }

    ComposedDocument { sections }
}

fn cover_section(cover: &CoverPage) -> Section {
    let title_line = |text: &str, alignment: Alignment| {
        Block::text(text)
            .heading(HeadingLevel::Title)
            .align(alignment)
    };

    Section::new(vec![
        title_line(&cover.institution, Alignment::Center),
        Block::blank(),
        Block::blank(),
        title_line(&cover.subject, Alignment::Center),
        Block::blank(),
        title_line(&cover.author, Alignment::End),
        title_line(&cover.reviewer, Alignment::End),
        Block::blank(),
        Block::blank(),
        title_line(&cover.place_and_year, Alignment::Center),
    ])
}

fn outline_section(spec: &DocumentSpec, label: &str) -> Section {
    let mut blocks = vec![
        Block::text(&spec.title)
            .heading(HeadingLevel::Title)
            .align(Alignment::Center),
        Block::blank(),
        section_heading(label),
    ];
    blocks.extend(
        spec.outline
            .iter()
            .enumerate()
            .map(|(i, point)| Block::text(format!("{}. {}", i + 1, point)).style(LIST_STYLE)),
    );
    blocks.push(Block::blank());
    Section::new(blocks)
}

fn point_section(point: &str, paragraphs: Vec<String>) -> Section {
    let mut blocks = Vec::with_capacity(paragraphs.len() + 1);
    blocks.push(section_heading(&point.to_uppercase()));
    blocks.extend(paragraphs.into_iter().map(body));
    Section::new(blocks)
}

fn section_heading(text: &str) -> Block {
    Block::text(text)
        .heading(HeadingLevel::Heading)
        .align(Alignment::Center)
}

fn body(text: impl Into<String>) -> Block {
    Block::text(text)
        .align(Alignment::Justified)
        .font_size(BODY_FONT_SIZE)
        .spacing_before(BODY_SPACING_BEFORE)
        .first_line_indent(FIRST_LINE_INDENT)
}
