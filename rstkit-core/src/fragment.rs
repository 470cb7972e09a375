//! Fragment formatting: one typed content request in, one markup string out.
//!
//! Requests arrive as a kind tag plus a loose field map. [`Fragment`] is the
//! closed set of kinds, each variant carrying only the fields it uses, and
//! [`Fragment::render`] is the single exhaustive match producing markup.
//! Formatting is total: unknown kinds fall back to [`Fragment::Plain`] and
//! absent fields drop their optional lines.
//!
//! Free text is not escaped. A `*` inside bold text reaches the output as-is.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fields::Fields;
use crate::text::{display_width, indent_block, INDENT};

/// Raw request as posted by the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentRequest {
    pub kind: String,
    #[serde(default)]
    pub fields: Fields,
}

impl FragmentRequest {
    pub fn new(kind: impl Into<String>, fields: Fields) -> Self {
        Self {
            kind: kind.into(),
            fields,
        }
    }

    pub fn format(&self) -> String {
        Fragment::from_request(self).render()
    }
}

/// Every fragment kind the formatter knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Title,
    Bold,
    Italic,
    ExternalLinks,
    InternalLinks,
    Paragraphs,
    Subscript,
    Superscript,
    Reference,
    TitleReference,
    Version,
    CsvTable,
    Toctree,
    Codeblock,
    Image,
    Math,
    Note,
    Warning,
    Figure,
    GridTable,
    Plain,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 21] = [
        FragmentKind::Title,
        FragmentKind::Bold,
        FragmentKind::Italic,
        FragmentKind::ExternalLinks,
        FragmentKind::InternalLinks,
        FragmentKind::Paragraphs,
        FragmentKind::Subscript,
        FragmentKind::Superscript,
        FragmentKind::Reference,
        FragmentKind::TitleReference,
        FragmentKind::Version,
        FragmentKind::CsvTable,
        FragmentKind::Toctree,
        FragmentKind::Codeblock,
        FragmentKind::Image,
        FragmentKind::Math,
        FragmentKind::Note,
        FragmentKind::Warning,
        FragmentKind::Figure,
        FragmentKind::GridTable,
        FragmentKind::Plain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Title => "title",
            FragmentKind::Bold => "bold",
            FragmentKind::Italic => "italic",
            FragmentKind::ExternalLinks => "external_links",
            FragmentKind::InternalLinks => "internal_links",
            FragmentKind::Paragraphs => "paragraphs",
            FragmentKind::Subscript => "subscript",
            FragmentKind::Superscript => "superscript",
            FragmentKind::Reference => "reference",
            FragmentKind::TitleReference => "title_reference",
            FragmentKind::Version => "version",
            FragmentKind::CsvTable => "csv_table",
            FragmentKind::Toctree => "toctree",
            FragmentKind::Codeblock => "codeblock",
            FragmentKind::Image => "image",
            FragmentKind::Math => "math",
            FragmentKind::Note => "note",
            FragmentKind::Warning => "warning",
            FragmentKind::Figure => "figure",
            FragmentKind::GridTable => "grid_table",
            FragmentKind::Plain => "plain",
        }
    }

    /// Parse a kind tag. Unrecognized tags map to [`FragmentKind::Plain`].
    pub fn parse(tag: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .unwrap_or(FragmentKind::Plain)
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionChange {
    #[default]
    Added,
    Changed,
    Deprecated,
}

impl VersionChange {
    fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "changed" | "versionchanged" => Self::Changed,
            "deprecated" => Self::Deprecated,
            _ => Self::Added,
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            Self::Added => "versionadded",
            Self::Changed => "versionchanged",
            Self::Deprecated => "deprecated",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionNote {
    pub change: VersionChange,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub title: String,
    pub header: String,
    pub widths: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toctree {
    pub maxdepth: String,
    pub caption: String,
    pub numbered: bool,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
    pub lineno_start: String,
    pub emphasize_lines: String,
    pub caption: String,
    pub name: String,
    pub linenos: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub path: String,
    pub align: String,
    pub alt: String,
    pub height: String,
    pub width: String,
    pub loading: String,
    pub scale: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Figure {
    pub path: String,
    pub align: String,
    pub alt: String,
    pub width: String,
    pub scale: String,
    pub target: String,
    pub caption: String,
}

/// A typed content fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Title { text: String },
    Bold { text: String },
    Italic { text: String },
    ExternalLink { name: String, url: String },
    InternalLink { target: String },
    Paragraph { text: String },
    Subscript { text: String },
    Superscript { text: String },
    Reference { text: String },
    TitleReference { text: String },
    Version(VersionNote),
    CsvTable(CsvTable),
    Toctree(Toctree),
    CodeBlock(CodeBlock),
    Image(Image),
    Math { equation: String },
    Note { text: String },
    Warning { text: String },
    Figure(Figure),
    GridTable { rows: Vec<Vec<String>> },
    Plain { text: String },
}

impl Fragment {
    pub fn from_request(request: &FragmentRequest) -> Self {
        Self::from_parts(FragmentKind::parse(&request.kind), &request.fields)
    }

    /// Pick the fields relevant to `kind` out of the loose map.
    pub fn from_parts(kind: FragmentKind, fields: &Fields) -> Self {
        let text = || fields.text("text");
        match kind {
            FragmentKind::Title => Fragment::Title {
                text: fields.first_text(&["text", "title"]),
            },
            FragmentKind::Bold => Fragment::Bold { text: text() },
            FragmentKind::Italic => Fragment::Italic { text: text() },
            FragmentKind::ExternalLinks => Fragment::ExternalLink {
                name: fields.first_text(&["ref_name", "name"]),
                url: fields.first_text(&["ref_link", "url"]),
            },
            FragmentKind::InternalLinks => Fragment::InternalLink { target: text() },
            FragmentKind::Paragraphs => Fragment::Paragraph {
                text: fields.first_text(&["text", "content"]),
            },
            FragmentKind::Subscript => Fragment::Subscript { text: text() },
            FragmentKind::Superscript => Fragment::Superscript { text: text() },
            FragmentKind::Reference => Fragment::Reference { text: text() },
            FragmentKind::TitleReference => Fragment::TitleReference { text: text() },
            FragmentKind::Version => Fragment::Version(VersionNote {
                change: VersionChange::parse(&fields.text("change")),
                version: fields.text("version"),
                description: fields.text("description"),
            }),
            FragmentKind::CsvTable => Fragment::CsvTable(CsvTable {
                title: fields.first_text(&["title", "table_title"]),
                header: csv_header(fields),
                widths: fields.list("widths").join(", "),
                body: fields.first_text(&["body", "table_content"]),
            }),
            FragmentKind::Toctree => Fragment::Toctree(Toctree {
                maxdepth: fields.text("maxdepth"),
                caption: fields.text("caption"),
                numbered: fields.flag("numbered"),
                documents: fields.list("documents"),
            }),
            FragmentKind::Codeblock => Fragment::CodeBlock(CodeBlock {
                language: fields.text("language"),
                code: fields.text("code"),
                lineno_start: fields.text("lineno_start"),
                emphasize_lines: fields.text("emphasize_lines"),
                caption: fields.text("caption"),
                name: fields.text("name"),
                linenos: fields.flag("linenos"),
            }),
            FragmentKind::Image => Fragment::Image(Image {
                path: fields.first_text(&["path", "image_url"]),
                align: fields.text("align"),
                alt: fields.text("alt"),
                height: fields.text("height"),
                width: fields.text("width"),
                loading: fields.text("loading"),
                scale: fields.text("scale"),
                target: fields.text("target"),
            }),
            FragmentKind::Math => Fragment::Math {
                equation: fields.first_text(&["equation", "text"]),
            },
            FragmentKind::Note => Fragment::Note {
                text: fields.first_text(&["text", "note_text"]),
            },
            FragmentKind::Warning => Fragment::Warning {
                text: fields.first_text(&["text", "warning_text"]),
            },
            FragmentKind::Figure => Fragment::Figure(Figure {
                path: fields.first_text(&["path", "figure_url"]),
                align: fields.text("align"),
                alt: fields.text("alt"),
                width: fields.text("width"),
                scale: fields.text("scale"),
                target: fields.text("target"),
                caption: fields.text("caption"),
            }),
            FragmentKind::GridTable => Fragment::GridTable {
                rows: fields.table("rows"),
            },
            FragmentKind::Plain => Fragment::Plain { text: text() },
        }
    }

    pub fn kind(&self) -> FragmentKind {
        match self {
            Fragment::Title { .. } => FragmentKind::Title,
            Fragment::Bold { .. } => FragmentKind::Bold,
            Fragment::Italic { .. } => FragmentKind::Italic,
            Fragment::ExternalLink { .. } => FragmentKind::ExternalLinks,
            Fragment::InternalLink { .. } => FragmentKind::InternalLinks,
            Fragment::Paragraph { .. } => FragmentKind::Paragraphs,
            Fragment::Subscript { .. } => FragmentKind::Subscript,
            Fragment::Superscript { .. } => FragmentKind::Superscript,
            Fragment::Reference { .. } => FragmentKind::Reference,
            Fragment::TitleReference { .. } => FragmentKind::TitleReference,
            Fragment::Version(_) => FragmentKind::Version,
            Fragment::CsvTable(_) => FragmentKind::CsvTable,
            Fragment::Toctree(_) => FragmentKind::Toctree,
            Fragment::CodeBlock(_) => FragmentKind::Codeblock,
            Fragment::Image(_) => FragmentKind::Image,
            Fragment::Math { .. } => FragmentKind::Math,
            Fragment::Note { .. } => FragmentKind::Note,
            Fragment::Warning { .. } => FragmentKind::Warning,
            Fragment::Figure(_) => FragmentKind::Figure,
            Fragment::GridTable { .. } => FragmentKind::GridTable,
            Fragment::Plain { .. } => FragmentKind::Plain,
        }
    }

    /// Render the fragment as reStructuredText.
    pub fn render(&self) -> String {
        match self {
            Fragment::Title { text } => {
                format!("{text}\n{}\n", "=".repeat(display_width(text)))
            }
            Fragment::Bold { text } => format!("**{text}**"),
            Fragment::Italic { text } => format!("*{text}*"),
            Fragment::ExternalLink { name, url } => format!(".. _{name}: {url}\n"),
            Fragment::InternalLink { target } => format!(":ref:`{target}`"),
            Fragment::Paragraph { text } => format!("{text}\n"),
            // The escaped spaces let the role sit flush against neighbouring words.
            Fragment::Subscript { text } => format!("\\ :sub:`{text}`\\ "),
            Fragment::Superscript { text } => format!("\\ :sup:`{text}`\\ "),
            Fragment::Reference { text } => format!(":literal:`{text}`"),
            Fragment::TitleReference { text } => format!("*《{text}》*"),
            Fragment::Version(note) => {
                let mut out = Directive::new(note.change.directive(), &note.version).finish();
                out.push_str(&indent_block(&note.description, INDENT));
                out
            }
            Fragment::CsvTable(table) => {
                let mut directive = Directive::new("csv-table", &table.title);
                directive
                    .option("header", &table.header)
                    .option("widths", &table.widths);
                let mut out = directive.finish();
                out.push('\n');
                out.push_str(&table.body);
                if !table.body.is_empty() && !table.body.ends_with('\n') {
                    out.push('\n');
                }
                out
            }
            Fragment::Toctree(tree) => {
                let mut directive = Directive::new("toctree", "");
                directive
                    .option("maxdepth", &tree.maxdepth)
                    .option("caption", &tree.caption)
                    .flag("numbered", tree.numbered);
                let mut out = directive.finish();
                out.push('\n');
                for document in &tree.documents {
                    out.push_str(INDENT);
                    out.push_str(document);
                    out.push('\n');
                }
                out
            }
            Fragment::CodeBlock(block) => {
                let mut directive = Directive::new("code-block", &block.language);
                directive
                    .option("lineno-start", &block.lineno_start)
                    .option("emphasize-lines", &block.emphasize_lines)
                    .option("caption", &block.caption)
                    .option("name", &block.name)
                    .flag("linenos", block.linenos);
                directive.content(&block.code)
            }
            Fragment::Image(image) => {
                let mut directive = Directive::new("image", &image.path);
                directive
                    .option("align", &image.align)
                    .option("alt", &image.alt)
                    .option("height", &image.height)
                    .option("width", &image.width)
                    .option("loading", &image.loading)
                    .option("scale", &image.scale)
                    .option("target", &image.target);
                directive.finish()
            }
            Fragment::Math { equation } => Directive::new("math", "").content(equation),
            Fragment::Note { text } => Directive::new("note", "").content(text),
            Fragment::Warning { text } => Directive::new("warning", "").content(text),
            Fragment::Figure(figure) => {
                let mut directive = Directive::new("figure", &figure.path);
                directive
                    .option("align", &figure.align)
                    .option("alt", &figure.alt)
                    .option("width", &figure.width)
                    .option("scale", &figure.scale)
                    .option("target", &figure.target);
                if figure.caption.trim().is_empty() {
                    directive.finish()
                } else {
                    directive.content(&figure.caption)
                }
            }
            Fragment::GridTable { rows } => grid_table(rows),
            Fragment::Plain { text } => text.clone(),
        }
    }
}

/// Format one fragment from a kind tag and its fields.
///
/// ```
/// use rstkit_core::{format, Fields};
///
/// let fields = Fields::new().with("text", "Intro");
/// assert_eq!(format("title", &fields), "Intro\n=====\n");
/// assert_eq!(format("frobnicate", &Fields::new().with("text", "hi")), "hi");
/// ```
pub fn format(kind: &str, fields: &Fields) -> String {
    Fragment::from_parts(FragmentKind::parse(kind), fields).render()
}

fn csv_header(fields: &Fields) -> String {
    // A plain string is taken as an already formatted header line.
    let raw = fields.text("header");
    if !raw.is_empty() {
        return raw;
    }
    fields
        .list("header")
        .iter()
        .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Accumulates a directive header and its option lines.
///
/// Options are written in call order and skipped when empty, since an option
/// with no value is invalid markup.
struct Directive {
    out: String,
}

impl Directive {
    fn new(name: &str, argument: &str) -> Self {
        let out = if argument.is_empty() {
            format!(".. {name}::\n")
        } else {
            format!(".. {name}:: {argument}\n")
        };
        Self { out }
    }

    fn option(&mut self, name: &str, value: &str) -> &mut Self {
        let value = value.trim();
        if !value.is_empty() {
            self.out.push_str(&format!("{INDENT}:{name}: {value}\n"));
        }
        self
    }

    fn flag(&mut self, name: &str, enabled: bool) -> &mut Self {
        if enabled {
            self.out.push_str(&format!("{INDENT}:{name}:\n"));
        }
        self
    }

    fn finish(self) -> String {
        self.out
    }

    /// Finish with a blank line and the indented body.
    fn content(self, body: &str) -> String {
        let mut out = self.out;
        out.push('\n');
        out.push_str(&indent_block(body, INDENT));
        out
    }
}

fn grid_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            (0..columns)
                .map(|i| {
                    row.get(i)
                        .map(|cell| cell.replace(['\r', '\n'], " "))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            cells
                .iter()
                .map(|row| display_width(&row[i]))
                .max()
                .unwrap_or(0)
                .max(1)
        })
        .collect();

    let border = |fill: char| {
        let mut line = String::from("+");
        for width in &widths {
            line.extend(std::iter::repeat(fill).take(width + 2));
            line.push('+');
        }
        line.push('\n');
        line
    };
    let render_row = |row: &[String]| {
        let mut line = String::from("|");
        for (cell, width) in row.iter().zip(&widths) {
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(width - display_width(cell) + 1));
            line.push('|');
        }
        line.push('\n');
        line
    };

    let mut out = border('-');
    for (index, row) in cells.iter().enumerate() {
        out.push_str(&render_row(row));
        // The first row is the header when there is a body below it.
        if index == 0 && cells.len() > 1 {
            out.push_str(&border('='));
        } else {
            out.push_str(&border('-'));
        }
    }
    out
}
