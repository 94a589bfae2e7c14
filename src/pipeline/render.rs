//! DOCX rendering: serialise a [`ComposedDocument`] with docx-rs.
//!
//! The composed tree is already fully laid out, so this stage is a direct
//! mapping from [`Block`] directives to paragraph properties:
//!
//! | Block field          | DOCX property                         |
//! |----------------------|---------------------------------------|
//! | `heading`            | paragraph style `Title` / `Heading2`  |
//! | `style`              | named paragraph style                 |
//! | `alignment`          | `w:jc`                                |
//! | `first_line_indent`  | `w:ind w:firstLine`                   |
//! | `spacing_before`     | `w:spacing w:before`                  |
//! | `font_size`          | run `w:sz`                            |
//!
//! A section with `page_break_before` gets a page-break run in front of its
//! first paragraph.

use crate::document::{Alignment, Block, ComposedDocument, HeadingLevel};
use crate::error::DocGenError;
use crate::pipeline::compose::LIST_STYLE;
use docx_rs::{
    AlignmentType, BreakType, Docx, LineSpacing, Paragraph, Run, SpecialIndentType, Style,
    StyleType,
};
use std::io::Cursor;
use tracing::debug;

/// MIME type of the rendered bytes.
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const TITLE_STYLE: &str = "Title";
const HEADING_STYLE: &str = "Heading2";

/// Render `doc` into DOCX bytes.
///
/// # Errors
/// [`DocGenError::RenderFailed`] when the archive cannot be packed.
pub fn render_docx(doc: &ComposedDocument) -> Result<Vec<u8>, DocGenError> {
    let mut docx = with_styles(Docx::new());

    for section in &doc.sections {
        for (i, block) in section.blocks.iter().enumerate() {
            let page_break = section.page_break_before && i == 0;
            docx = docx.add_paragraph(paragraph(block, page_break));
        }
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| DocGenError::RenderFailed {
            detail: e.to_string(),
        })?;

    let bytes = buf.into_inner();
    debug!(
        "Rendered {} sections ({} paragraphs) into {} bytes",
        doc.sections.len(),
        doc.block_count(),
        bytes.len()
    );
    Ok(bytes)
}

fn with_styles(docx: Docx) -> Docx {
    docx.add_style(
        Style::new(TITLE_STYLE, StyleType::Paragraph)
            .name("Title")
            .size(32)
            .bold(),
    )
    .add_style(
        Style::new(HEADING_STYLE, StyleType::Paragraph)
            .name("Heading 2")
            .size(28)
            .bold(),
    )
    .add_style(Style::new(LIST_STYLE, StyleType::Paragraph).name("List Paragraph"))
}

fn paragraph(block: &Block, page_break: bool) -> Paragraph {
    let mut p = Paragraph::new();

    if page_break {
        p = p.add_run(Run::new().add_break(BreakType::Page));
    }

    if !block.text.is_empty() {
        let mut run = Run::new().add_text(&block.text);
        if let Some(size) = block.font_size {
            run = run.size(size);
        }
        p = p.add_run(run);
    }

    match block.heading {
        HeadingLevel::Title => p = p.style(TITLE_STYLE),
        HeadingLevel::Heading => p = p.style(HEADING_STYLE),
        HeadingLevel::None => {
            if let Some(style) = &block.style {
                p = p.style(style);
            }
        }
    }

    p = p.align(alignment_type(block.alignment));

    if let Some(twips) = block.first_line_indent {
        p = p.indent(None, Some(SpecialIndentType::FirstLine(twips)), None, None);
    }
    if let Some(twips) = block.spacing_before {
        p = p.line_spacing(LineSpacing::new().before(twips));
    }

    p
}

fn alignment_type(alignment: Alignment) -> AlignmentType {
    match alignment {
        Alignment::Left => AlignmentType::Left,
        Alignment::Center => AlignmentType::Center,
        Alignment::End => AlignmentType::Right,
        Alignment::Justified => AlignmentType::Both,
    }
}
