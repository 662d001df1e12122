//! Turning info-block trees into displayable lines.
//!
//! [`InfoBlock::accept`] dispatches each variant to a [`BlockVisitor`];
//! [`LineRenderer`] is the visitor used by both the TUI and the CLI.

use crate::config::{ColorMode, Config};
use crate::models::{
    DamageProfile, FormattedValue, InfoBlock, Item, Rank, TranslationString,
};

// ---------------------------------------------------------------------------
// Visitor
// ---------------------------------------------------------------------------

/// One callback per info-block variant.
///
/// `visit_list` receives the children unvisited; implementations decide how
/// to descend (see [`walk_blocks`]).
pub trait BlockVisitor {
    fn visit_text(&mut self, title: Option<&TranslationString>, text: &TranslationString);
    fn visit_numeric(
        &mut self,
        name: &TranslationString,
        value: f64,
        formatted: Option<&FormattedValue>,
    );
    fn visit_damage(&mut self, damage: &DamageProfile);
    fn visit_range(&mut self, name: &TranslationString, min: f64, max: f64);
    fn visit_key_value(&mut self, key: &TranslationString, value: &TranslationString);
    fn visit_list(&mut self, title: Option<&TranslationString>, elements: &[InfoBlock]);
    fn visit_usage(&mut self, name: &TranslationString);
    fn visit_item(&mut self, name: &TranslationString);
}

impl InfoBlock {
    pub fn accept<V: BlockVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            InfoBlock::Text { title, text } => visitor.visit_text(title.as_ref(), text),
            InfoBlock::Numeric {
                name,
                value,
                formatted,
            } => visitor.visit_numeric(name, *value, formatted.as_ref()),
            InfoBlock::Damage(damage) => visitor.visit_damage(damage),
            InfoBlock::Range { name, min, max } => visitor.visit_range(name, *min, *max),
            InfoBlock::KeyValue { key, value } => visitor.visit_key_value(key, value),
            InfoBlock::List { title, elements } => visitor.visit_list(title.as_ref(), elements),
            InfoBlock::Usage { name } => visitor.visit_usage(name),
            InfoBlock::Item { name } => visitor.visit_item(name),
        }
    }
}

pub fn walk_blocks<V: BlockVisitor + ?Sized>(blocks: &[InfoBlock], visitor: &mut V) {
    for block in blocks {
        block.accept(visitor);
    }
}

// ---------------------------------------------------------------------------
// Rendered output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `RRGGBB`, with or without a leading `#`.
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Highlight colours that stay readable on a light background.
const POSITIVE: &str = "53C353";
const NEGATIVE: &str = "C15252";

pub fn rank_color(rank: Rank) -> Rgb {
    match rank {
        Rank::Default => Rgb(0xB4, 0xB4, 0xB4),
        Rank::Newbie => Rgb(0x4C, 0xAF, 0x50),
        Rank::Stalker => Rgb(0x21, 0x96, 0xF3),
        Rank::Veteran => Rgb(0xFF, 0x00, 0xDC),
        Rank::Master => Rgb(0xB0, 0x00, 0x00),
        Rank::Legend => Rgb(0xFF, 0xEB, 0x3B),
        Rank::Other => Rgb(0xFF, 0xFF, 0xFF),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Section title (list titles, the damage table header).
    Header,
    /// A label with a value.
    Entry,
    /// A label on its own.
    Note,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLine {
    pub depth: usize,
    pub kind: LineKind,
    pub label: String,
    pub value: Option<String>,
    pub value_color: Option<Rgb>,
}

impl RenderedLine {
    fn new(depth: usize, kind: LineKind, label: impl Into<String>) -> Self {
        Self {
            depth,
            kind,
            label: label.into(),
            value: None,
            value_color: None,
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub language: String,
    pub color_mode: ColorMode,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            language: "ru".into(),
            color_mode: ColorMode::Dark,
        }
    }
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self {
            language: config.language.clone(),
            color_mode: config.color_mode,
        }
    }
}

/// Shortest decimal form: `12` rather than `12.0`.
pub fn format_number(value: f64) -> String {
    value.to_string()
}

// ---------------------------------------------------------------------------
// Line renderer
// ---------------------------------------------------------------------------

pub struct LineRenderer<'a> {
    options: &'a RenderOptions,
    depth: usize,
    lines: Vec<RenderedLine>,
}

impl<'a> LineRenderer<'a> {
    pub fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            depth: 0,
            lines: Vec::new(),
        }
    }

    pub fn finish(self) -> Vec<RenderedLine> {
        self.lines
    }

    fn tr<'s>(&self, s: &'s TranslationString) -> &'s str {
        s.resolve(&self.options.language)
    }

    fn push(&mut self, kind: LineKind, label: impl Into<String>) -> &mut RenderedLine {
        self.lines.push(RenderedLine::new(self.depth, kind, label));
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    fn entry(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let line = RenderedLine::new(self.depth, LineKind::Entry, label).with_value(value);
        self.lines.push(line);
    }

    fn value_color(&self, hex: Option<&str>) -> Option<Rgb> {
        let hex = hex?;
        match self.options.color_mode {
            ColorMode::Dark => Rgb::parse_hex(hex),
            ColorMode::Light => {
                let bare = hex.trim_start_matches('#');
                if bare.eq_ignore_ascii_case(POSITIVE) || bare.eq_ignore_ascii_case(NEGATIVE) {
                    Rgb::parse_hex(bare)
                } else {
                    None
                }
            }
        }
    }
}

impl BlockVisitor for LineRenderer<'_> {
    fn visit_text(&mut self, title: Option<&TranslationString>, text: &TranslationString) {
        let text = self.tr(text).to_string();
        match title.map(|t| self.tr(t)).filter(|t| !t.is_empty()) {
            Some(title) => {
                let title = title.to_string();
                self.entry(title, text);
            }
            None => {
                self.push(LineKind::Note, text);
            }
        }
    }

    fn visit_numeric(
        &mut self,
        name: &TranslationString,
        value: f64,
        formatted: Option<&FormattedValue>,
    ) {
        let label = self.tr(name).to_string();
        let shown = formatted
            .map(|f| f.value.resolve(&self.options.language))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format_number(value));
        let color = self.value_color(formatted.and_then(|f| f.value_color.as_deref()));
        self.entry(label, shown);
        if let Some(line) = self.lines.last_mut() {
            line.value_color = color;
        }
    }

    fn visit_damage(&mut self, damage: &DamageProfile) {
        self.push(LineKind::Header, "Damage");
        self.entry(
            format!("up to {} m", format_number(damage.damage_decrease_start)),
            format_number(damage.start_damage),
        );
        self.entry(
            format!(
                "from {} to {} m",
                format_number(damage.damage_decrease_end),
                format_number(damage.max_distance)
            ),
            format_number(damage.end_damage),
        );
    }

    fn visit_range(&mut self, name: &TranslationString, min: f64, max: f64) {
        let label = self.tr(name).to_string();
        self.entry(label, format!("[{}, {}]", format_number(min), format_number(max)));
    }

    fn visit_key_value(&mut self, key: &TranslationString, value: &TranslationString) {
        let (key, value) = (self.tr(key).to_string(), self.tr(value).to_string());
        self.entry(key, value);
    }

    fn visit_list(&mut self, title: Option<&TranslationString>, elements: &[InfoBlock]) {
        let title = title.map(|t| self.tr(t)).filter(|t| !t.is_empty());
        let indent = match title {
            Some(title) => {
                let title = title.to_string();
                self.push(LineKind::Header, title);
                1
            }
            None => 0,
        };
        self.depth += indent;
        walk_blocks(elements, self);
        self.depth -= indent;
    }

    fn visit_usage(&mut self, name: &TranslationString) {
        let name = self.tr(name).to_string();
        self.push(LineKind::Note, name);
    }

    fn visit_item(&mut self, name: &TranslationString) {
        let name = self.tr(name).to_string();
        self.push(LineKind::Note, name);
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

pub fn render_blocks(blocks: &[InfoBlock], options: &RenderOptions) -> Vec<RenderedLine> {
    let mut renderer = LineRenderer::new(options);
    walk_blocks(blocks, &mut renderer);
    renderer.finish()
}

/// The full detail view of an item: summary entries, then its info blocks.
pub fn render_item(item: &Item, options: &RenderOptions) -> Vec<RenderedLine> {
    let rank = item.rank();
    let mut lines = vec![
        RenderedLine::new(0, LineKind::Header, item.display_name(&options.language)),
        RenderedLine {
            value_color: Some(rank_color(rank)),
            ..RenderedLine::new(0, LineKind::Entry, "Rarity").with_value(rank.label())
        },
        RenderedLine::new(0, LineKind::Entry, "Category").with_value(item.category.as_str()),
        RenderedLine::new(0, LineKind::Entry, "Status").with_value(item.status.state.as_str()),
    ];
    if !item.info_blocks.is_empty() {
        lines.push(RenderedLine::new(0, LineKind::Header, "Characteristics"));
        lines.extend(render_blocks(&item.info_blocks, options));
    }
    lines
}

/// Flatten rendered lines to indented text.
pub fn render_plain(lines: &[RenderedLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&"  ".repeat(line.depth));
        match (&line.kind, &line.value) {
            (LineKind::Header, _) => {
                out.push_str("== ");
                out.push_str(&line.label);
            }
            (_, Some(value)) => {
                out.push_str(&line.label);
                out.push_str(": ");
                out.push_str(value);
            }
            (_, None) => out.push_str(&line.label),
        }
        out.push('\n');
    }
    out
}
