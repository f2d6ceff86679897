//! # Block Codec
//!
//! Locates, removes and inserts the managed block: the region between a dialect's exact
//! begin/end marker lines. Nothing outside the markers is ever rewritten; the codec never
//! tries to understand the surrounding file.

use crate::error::BlockError;
use crate::libs::setting_mapper::SettingMapper;
use crate::schemas::dialect::{Dialect, DialectProfile, PHP_MODULE_GUARDS};
use crate::schemas::settings::SettingKey;
use crate::{log_debug, log_warn};
use std::collections::BTreeMap;

/// Upper bound on stale blocks drained in one mutation.
const MAX_STALE_BLOCKS: usize = 16;

/// Byte span of one managed block, end-exclusive, including the newline after the end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

/// Stateless namespace for the managed-block edits.
pub struct BlockCodec;

impl BlockCodec {
    /// Produces the full managed block (markers included, trailing newline included) with
    /// one statement per setting, in `SettingKey` order.
    ///
    /// Settings the dialect cannot express are left out.
    pub fn render_block(profile: &DialectProfile, settings: &BTreeMap<SettingKey, String>) -> String {
        let statements: Vec<String> = settings
            .iter()
            .filter_map(|(key, value)| {
                SettingMapper::map(*key, value, profile.dialect).line().map(str::to_string)
            })
            .collect();

        let mut block = String::new();
        block.push_str(&profile.begin);
        block.push('\n');

        match profile.dialect {
            Dialect::DirectiveBlock => {
                for guard in PHP_MODULE_GUARDS {
                    block.push_str(&format!("<IfModule {guard}>\n"));
                    for statement in &statements {
                        block.push_str(statement);
                        block.push('\n');
                    }
                    block.push_str("</IfModule>\n");
                }
            },
            Dialect::ConstantDefine | Dialect::IniLines => {
                for statement in &statements {
                    block.push_str(statement);
                    block.push('\n');
                }
            },
        }

        block.push_str(&profile.end);
        block.push('\n');
        block
    }

    /// Number of begin markers present in `content`.
    pub fn count_blocks(profile: &DialectProfile, content: &str) -> usize {
        content.matches(profile.begin.as_str()).count()
    }

    /// Excises the first managed block (markers inclusive) from `content`.
    ///
    /// Content without a begin marker is returned unchanged.
    ///
    /// # Errors
    /// * `BlockError::Unterminated` when a begin marker has no end marker after it, or an end
    ///   marker appears without (or before) a begin marker. The file is never truncated to EOF.
    /// * `BlockError::Oversized` when the span would remove more than half of the file and
    ///   holds lines that the managed block never writes, i.e. the markers matched too much.
    pub fn remove_block(profile: &DialectProfile, content: &str) -> Result<String, BlockError> {
        let Some(span) = Self::locate(profile, content)? else {
            return Ok(content.to_string());
        };

        let blocks = Self::count_blocks(profile, content);
        if blocks > 1 {
            log_warn!(
                "[Codec] Found {} {} blocks; removing only the first",
                blocks,
                profile.dialect
            );
        }

        let removed = span.end - span.start;
        if removed * 2 > content.len() && !Self::span_is_managed(profile, &content[span.start..span.end]) {
            return Err(BlockError::Oversized {
                dialect: profile.dialect,
                removed,
                original: content.len(),
            });
        }

        let mut remaining = String::with_capacity(content.len() - removed);
        remaining.push_str(&content[..span.start]);
        remaining.push_str(&content[span.end..]);
        log_debug!("[Codec] Removed {} bytes of {} block", removed, profile.dialect);
        Ok(remaining)
    }

    /// Removes every managed block, oldest drift included.
    pub fn strip_blocks(profile: &DialectProfile, content: &str) -> Result<String, BlockError> {
        let mut current = content.to_string();
        for _ in 0..MAX_STALE_BLOCKS {
            if Self::count_blocks(profile, &current) == 0 && !current.contains(profile.end.as_str()) {
                return Ok(current);
            }
            let next = Self::remove_block(profile, &current)?;
            if next == current {
                break;
            }
            current = next;
        }
        if Self::count_blocks(profile, &current) > 0 {
            return Err(BlockError::Unterminated { dialect: profile.dialect });
        }
        Ok(current)
    }

    /// Inserts `block` at the start of the line holding the first occurrence of `anchor`,
    /// or appends it (after a newline, if the content does not end with one).
    pub fn insert_block(content: &str, block: &str, anchor: Option<&str>) -> String {
        if let Some(anchor) = anchor {
            if let Some(index) = content.find(anchor) {
                let line_start = content[..index].rfind('\n').map(|i| i + 1).unwrap_or(0);
                let mut out = String::with_capacity(content.len() + block.len());
                out.push_str(&content[..line_start]);
                out.push_str(block);
                out.push_str(&content[line_start..]);
                return out;
            }
        }

        let mut out = String::with_capacity(content.len() + block.len() + 1);
        out.push_str(content);
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(block);
        out
    }

    /// Strips all prior blocks, renders a fresh one and inserts it at the dialect's anchor.
    pub fn replace_block(
        profile: &DialectProfile,
        content: &str,
        settings: &BTreeMap<SettingKey, String>,
    ) -> Result<String, BlockError> {
        let stripped = Self::strip_blocks(profile, content)?;
        let block = Self::render_block(profile, settings);
        if let Some(anchor) = profile.anchor_in(&stripped) {
            return Ok(Self::insert_block(&stripped, &block, Some(anchor)));
        }
        if let Some(at) = Self::closing_tag_offset(profile, &stripped) {
            let mut out = String::with_capacity(stripped.len() + block.len());
            out.push_str(&stripped[..at]);
            out.push_str(&block);
            out.push_str(&stripped[at..]);
            return Ok(out);
        }
        Ok(Self::insert_block(&stripped, &block, None))
    }

    /// Where to put a PHP block when the file ends with `?>`: the start of that line, or
    /// right before the tag when the same line also opens PHP.
    fn closing_tag_offset(profile: &DialectProfile, content: &str) -> Option<usize> {
        if profile.dialect != Dialect::ConstantDefine {
            return None;
        }
        let body = content.trim_end();
        let tag_at = body.strip_suffix("?>").map(str::len)?;
        let line_start = body[..tag_at].rfind('\n').map(|i| i + 1).unwrap_or(0);
        if body[line_start..tag_at].contains("<?") {
            Some(tag_at)
        } else {
            Some(line_start)
        }
    }

    /// Settings currently written inside the first managed block.
    ///
    /// A missing or malformed block yields an empty map.
    pub fn parse_block(profile: &DialectProfile, content: &str) -> BTreeMap<SettingKey, String> {
        let mut settings = BTreeMap::new();
        let Ok(Some(span)) = Self::locate(profile, content) else {
            return settings;
        };
        for line in content[span.start..span.end].lines() {
            if let Some((key, value)) = SettingMapper::parse_statement(line, profile.dialect) {
                settings.entry(key).or_insert(value);
            }
        }
        settings
    }

    /// Finds the span of the first block. `Ok(None)` when no markers are present at all.
    fn locate(profile: &DialectProfile, content: &str) -> Result<Option<Span>, BlockError> {
        let begin = content.find(profile.begin.as_str());
        let first_end = content.find(profile.end.as_str());

        let Some(start) = begin else {
            return match first_end {
                Some(_) => Err(BlockError::Unterminated { dialect: profile.dialect }),
                None => Ok(None),
            };
        };
        if matches!(first_end, Some(end) if end < start) {
            return Err(BlockError::Unterminated { dialect: profile.dialect });
        }

        let search_from = start + profile.begin.len();
        let Some(relative_end) = content[search_from..].find(profile.end.as_str()) else {
            return Err(BlockError::Unterminated { dialect: profile.dialect });
        };

        let mut end = search_from + relative_end + profile.end.len();
        let rest = &content[end..];
        if rest.starts_with("\r\n") {
            end += 2;
        } else if rest.starts_with('\n') {
            end += 1;
        }
        Ok(Some(Span { start, end }))
    }

    /// Whether every line of `span` is something the codec itself writes.
    fn span_is_managed(profile: &DialectProfile, span: &str) -> bool {
        span.lines().all(|line| {
            let trimmed = line.trim();
            trimmed.is_empty()
                || trimmed == profile.begin
                || trimmed == profile.end
                || (profile.dialect == Dialect::DirectiveBlock
                    && (trimmed.starts_with("<IfModule ") || trimmed == "</IfModule>"))
                || SettingMapper::parse_statement(trimmed, profile.dialect).is_some()
        })
    }
}
