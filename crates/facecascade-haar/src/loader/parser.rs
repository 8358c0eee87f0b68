use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::error::{CascadeLoadError, CascadeParseError};
use super::params::LoaderParams;
use super::tokenizer::{parse_document, Element};
use crate::cascade::{Cascade, DEFAULT_BASE_SIZE};
use crate::classifier::{Stage, WeakClassifier};
use crate::feature::{Feature, FeatureKind};

const STAGE_THRESHOLD: &[&str] = &["stageThreshold", "stage_threshold"];
const CLASSIFIER_LIST: &[&str] = &["weakClassifiers", "trees"];
const LEFT_VAL: &[&str] = &["left_val", "leftVal"];
const RIGHT_VAL: &[&str] = &["right_val", "rightVal"];
const NODE_TAGS: &[&str] = &["internalNodes", "rects", "feature", "threshold"];

/// Parse a cascade definition from text.
///
/// Returns [`CascadeLoadError::NotLoaded`] when the text is well formed but
/// yields no usable stage.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(text, params), fields(bytes = text.len()))
)]
pub fn parse_cascade(text: &str, params: &LoaderParams) -> Result<Cascade, CascadeLoadError> {
    let doc = parse_document(text)?;
    let (container, stages_idx) = doc
        .find_parent_of("stages")
        .ok_or(CascadeParseError::MissingStages)?;
    let stages_el = &container.children[stages_idx];

    let (base_width, base_height) = base_size(&container.children[..stages_idx])?;
    let features = container.child(&["features"]);

    let items: Vec<&Element<'_>> = stages_el.items().collect();
    if let Some(declared) = container.child(&["stageNum"]) {
        let declared: usize = parse_num(declared)?;
        if declared != items.len() {
            log::warn!(
                "cascade declares {declared} stages but contains {}",
                items.len()
            );
        }
    }

    let limit = params.max_stages.unwrap_or(items.len()).min(items.len());
    if limit < items.len() {
        log::info!(
            "stage limit {limit} applied, skipping {} of {} stages",
            items.len() - limit,
            items.len()
        );
    }

    let mut cascade = Cascade::new(base_width, base_height);
    for (idx, item) in items[..limit].iter().enumerate() {
        let stage = parse_stage(item, features)?;
        if stage.is_empty() {
            log::warn!("stage {idx} has no weak classifiers, dropped");
            continue;
        }
        cascade.add_stage(stage);
    }

    if !cascade.is_loaded() {
        return Err(CascadeLoadError::NotLoaded);
    }
    log::debug!(
        "parsed cascade {}x{} with {} stages, {} classifiers",
        cascade.base_width(),
        cascade.base_height(),
        cascade.stages().len(),
        cascade.classifier_count()
    );
    Ok(cascade)
}

/// Read and parse a cascade definition file.
pub fn load_cascade_file(
    path: impl AsRef<Path>,
    params: &LoaderParams,
) -> Result<Cascade, CascadeLoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let cascade = parse_cascade(&text, params)?;
    log::info!(
        "loaded cascade {} ({} stages)",
        path.display(),
        cascade.stages().len()
    );
    Ok(cascade)
}

impl Cascade {
    /// Convenience wrapper around [`load_cascade_file`].
    pub fn from_file(path: impl AsRef<Path>, params: &LoaderParams) -> Result<Self, CascadeLoadError> {
        load_cascade_file(path, params)
    }
}

/// Base window size from the elements preceding `<stages>`.
fn base_size(header: &[Element<'_>]) -> Result<(u32, u32), CascadeParseError> {
    let mut width = DEFAULT_BASE_SIZE;
    let mut height = DEFAULT_BASE_SIZE;
    for el in header {
        match el.name {
            "width" => width = parse_num(el)?,
            "height" => height = parse_num(el)?,
            "size" => {
                let dims: Vec<u32> = parse_list(el)?;
                if let &[w, h] = dims.as_slice() {
                    width = w;
                    height = h;
                } else {
                    log::warn!("ignoring <size> with {} values", dims.len());
                }
            }
            _ => {}
        }
    }
    Ok((width, height))
}

fn parse_stage(item: &Element<'_>, features: Option<&Element<'_>>) -> Result<Stage, CascadeParseError> {
    let threshold = match item.child(STAGE_THRESHOLD) {
        Some(el) => parse_num(el)?,
        None => 0.0,
    };
    let mut stage = Stage::new(threshold);
    let Some(list) = item.child(CLASSIFIER_LIST) else {
        return Ok(stage);
    };
    for entry in list.items() {
        if let Some(wc) = parse_classifier(entry, features)? {
            stage.push(wc);
        }
    }
    Ok(stage)
}

/// One weak classifier; `None` when the entry carries no usable feature.
fn parse_classifier(
    entry: &Element<'_>,
    features: Option<&Element<'_>>,
) -> Result<Option<WeakClassifier>, CascadeParseError> {
    // Tree entries wrap their nodes in `_` items; only the root node is used.
    let node = if entry.child(NODE_TAGS).is_some() {
        entry
    } else {
        match entry.items().next() {
            Some(root) => root,
            None => return Ok(None),
        }
    };

    let leaves: Vec<f32> = match node.child(&["leafValues"]) {
        Some(el) => parse_list(el)?,
        None => Vec::new(),
    };

    let mut feature = if let Some(rects) = node.find(&["rects"]) {
        let mut f = feature_from_rects(rects)?;
        if let Some(el) = node.child(&["threshold"]) {
            f.threshold = parse_num(el)?;
        }
        f
    } else if let Some(nodes) = node.child(&["internalNodes"]) {
        let values: Vec<f32> = parse_list(nodes)?;
        if values.len() < 4 {
            return Err(CascadeParseError::InvalidNumber {
                tag: nodes.name.to_string(),
                value: nodes.text(),
                line: nodes.line,
            });
        }
        let index = values[2] as usize;
        let mut f = match features.and_then(|list| list.items().nth(index)) {
            Some(def) => match def.find(&["rects"]) {
                Some(rects) => feature_from_rects(rects)?,
                None => Feature::canonical(index),
            },
            None => Feature::canonical(index),
        };
        f.threshold = values[3];
        f
    } else {
        log::debug!("line {}: weak classifier without a feature, skipped", entry.line);
        return Ok(None);
    };

    feature.left_val = match node.child(LEFT_VAL) {
        Some(el) => parse_num(el)?,
        None => leaves.first().copied().unwrap_or(-1.0),
    };
    feature.right_val = match node.child(RIGHT_VAL) {
        Some(el) => parse_num(el)?,
        None => leaves.get(1).copied().unwrap_or(1.0),
    };
    if let Some(el) = node.child(&["polarity"]).or_else(|| entry.child(&["polarity"])) {
        feature.polarity = parse_bool(el)?;
    }
    let weight = match node.child(&["weight"]).or_else(|| entry.child(&["weight"])) {
        Some(el) => parse_num(el)?,
        None => 1.0,
    };
    Ok(Some(WeakClassifier::new(feature, weight)))
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Rect {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

fn parse_rect(el: &Element<'_>) -> Result<Rect, CascadeParseError> {
    let invalid = || CascadeParseError::InvalidRect {
        value: el.text(),
        line: el.line,
    };
    let words: Vec<&str> = el.words().collect();
    if !(4..=5).contains(&words.len()) {
        return Err(invalid());
    }
    let mut nums = [0f32; 5];
    for (slot, word) in nums.iter_mut().zip(&words) {
        *slot = word.parse().map_err(|_| invalid())?;
        if !slot.is_finite() {
            return Err(invalid());
        }
    }
    Ok(Rect {
        x: nums[0] as i32,
        y: nums[1] as i32,
        w: nums[2] as i32,
        h: nums[3] as i32,
    })
}

/// Infer kind and geometry from a rectangle list.
///
/// Two rectangles on the same row span give a horizontal pair, on the same
/// column span a vertical pair; three give a horizontal triple and four a
/// quad. Geometry is taken from the first rectangle.
fn feature_from_rects(rects: &Element<'_>) -> Result<Feature, CascadeParseError> {
    let parsed = rects
        .children
        .iter()
        .filter(|c| c.name == "_" || c.name == "rect")
        .map(parse_rect)
        .collect::<Result<Vec<_>, _>>()?;
    let Some(first) = parsed.first().copied() else {
        return Err(CascadeParseError::InvalidRect {
            value: rects.text(),
            line: rects.line,
        });
    };
    let kind = match parsed.as_slice() {
        [a, b] if a.y == b.y && a.h == b.h => FeatureKind::TwoHorizontal,
        [a, b] if a.x == b.x && a.w == b.w => FeatureKind::TwoVertical,
        [_, _, _] => FeatureKind::ThreeHorizontal,
        [_, _, _, _] => FeatureKind::FourSquare,
        _ => FeatureKind::TwoHorizontal,
    };
    Ok(Feature::new(kind, first.x, first.y, first.w, first.h))
}

fn parse_num<T: std::str::FromStr>(el: &Element<'_>) -> Result<T, CascadeParseError> {
    let text = el.text();
    text.parse().map_err(|_| CascadeParseError::InvalidNumber {
        tag: el.name.to_string(),
        value: text.clone(),
        line: el.line,
    })
}

fn parse_list<T: std::str::FromStr>(el: &Element<'_>) -> Result<Vec<T>, CascadeParseError> {
    el.words()
        .map(|w| {
            w.parse().map_err(|_| CascadeParseError::InvalidNumber {
                tag: el.name.to_string(),
                value: w.to_string(),
                line: el.line,
            })
        })
        .collect()
}

fn parse_bool(el: &Element<'_>) -> Result<bool, CascadeParseError> {
    match el.text().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(CascadeParseError::InvalidNumber {
            tag: el.name.to_string(),
            value: other.to_string(),
            line: el.line,
        }),
    }
}
