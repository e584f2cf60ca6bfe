//! HTML gallery builder
//!
//! Buffers frames by a caller-supplied grouping key for the whole run. The
//! document is written once, at shutdown: one section per key (in key order),
//! up to `max_per_group` thumbnails each, followed by `...` when a group holds
//! more. Each thumbnail links to the frame's original source and is captioned from
//! the first tag of the caption kind, when present.

use crate::error::StageError;
use crate::frame::{Frame, HistoryStep};
use crate::stage::{Stage, StageContext};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const HTML_HEAD: &str =
    "<html>\n<style>\nimg.Image {\nmax-width:128px;\nwidth:128px;\n}\n</style>\n<body>\n";
const HTML_TAIL: &str = "</body>\n</html>\n";

/// Default number of thumbnails shown per group
pub const DEFAULT_MAX_PER_GROUP: usize = 5;

type GroupKey = Box<dyn FnMut(&Frame) -> Option<String>>;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    image: String,
    source: Option<String>,
    caption: Option<String>,
}

#[derive(Debug, Default)]
struct Group {
    shown: Vec<Entry>,
    total: usize,
}

pub struct HtmlGallery {
    output: PathBuf,
    group_key: GroupKey,
    caption_kind: Option<String>,
    max_per_group: usize,
    groups: BTreeMap<String, Group>,
}

impl HtmlGallery {
    /// Gallery written to `output`, grouping frames by `group_key`. Frames for which
    /// the key is `None` are left out.
    pub fn new(
        output: impl Into<PathBuf>,
        group_key: impl FnMut(&Frame) -> Option<String> + 'static,
    ) -> Self {
        Self {
            output: output.into(),
            group_key: Box::new(group_key),
            caption_kind: None,
            max_per_group: DEFAULT_MAX_PER_GROUP,
            groups: BTreeMap::new(),
        }
    }

    /// Group by the label of the first tag of `kind`.
    pub fn by_tag_label(output: impl Into<PathBuf>, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self::new(output, move |frame| {
            frame.first_tag(&kind).map(|tag| tag.label().to_string())
        })
    }

    pub fn with_caption_kind(mut self, kind: impl Into<String>) -> Self {
        self.caption_kind = Some(kind.into());
        self
    }

    pub fn with_max_per_group(mut self, max: usize) -> Self {
        self.max_per_group = max;
        self
    }

    fn entry_for(&self, frame: &Frame) -> Option<Entry> {
        let image = frame.location()?.to_string();
        let source = frame.history().iter().find_map(|step| match step {
            HistoryStep::Loaded(location) => Some(location.to_string()),
            HistoryStep::Cropped(_) => None,
        });
        let caption = self.caption_kind.as_deref().and_then(|kind| {
            frame.first_tag(kind).map(|tag| {
                if tag.label().is_empty() {
                    tag.kind().to_string()
                } else {
                    tag.label().to_string()
                }
            })
        });
        Some(Entry {
            image,
            source,
            caption,
        })
    }

    /// Render the gallery document.
    pub fn render(&self) -> String {
        let mut html = String::from(HTML_HEAD);
        for (key, group) in &self.groups {
            let _ = writeln!(html, "<h2>{}:</h2>", escape(key));
            for entry in &group.shown {
                let href = entry.source.as_deref().unwrap_or(&entry.image);
                let _ = write!(
                    html,
                    "<a href='{}'> <img src='{}' class='Image'/></a>",
                    escape(href),
                    escape(&entry.image)
                );
                if let Some(caption) = &entry.caption {
                    let _ = write!(html, " <span class='Caption'>{}</span>", escape(caption));
                }
                html.push('\n');
            }
            if group.total > group.shown.len() {
                html.push_str("...\n");
            }
            html.push_str("<br/><hr/>\n");
        }
        html.push_str(HTML_TAIL);
        html
    }
}

impl Stage for HtmlGallery {
    fn process(&mut self, frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        if let Some(key) = (self.group_key)(&frame) {
            match self.entry_for(&frame) {
                Some(entry) => {
                    let group = self.groups.entry(key).or_default();
                    group.total += 1;
                    if group.shown.len() < self.max_per_group {
                        group.shown.push(entry);
                    }
                }
                None => warn!(
                    frame = %frame.describe(),
                    "Frame has no location; save it before the gallery stage"
                ),
            }
        }
        ctx.output(frame);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), StageError> {
        write_atomically(&self.output, self.render().as_bytes())?;
        info!(
            output = %self.output.display(),
            groups = self.groups.len(),
            "Wrote gallery"
        );
        Ok(())
    }
}

fn write_atomically(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("html.tmp");
    fs::write(&temp_path, data)?;
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        e
    })
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
