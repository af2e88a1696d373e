//! Evaluation of XGBoost `gbtree` models saved in the JSON format
//! (`Booster.save_model("model.json")`).
//!
//! Only single-target regression boosters are accepted. Each tree is
//! validated once at load time, so prediction walks plain vectors without
//! bounds surprises.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Input order the model was trained with.
pub const FEATURE_NAMES: [&str; 5] = ["sog", "draft", "length", "wind_speed", "wave_height"];

#[derive(Debug, Error)]
pub enum ModelError {
  #[error("failed to read model file {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid model json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unsupported model: {0}")]
  Unsupported(String),

  #[error("malformed tree {tree}: {reason}")]
  MalformedTree { tree: usize, reason: String },

  #[error("model expects {expected} features, got {actual}")]
  FeatureCount { expected: usize, actual: usize },

  #[error("model produced a non-finite prediction")]
  NonFinite,
}

// ─── JSON layout ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ModelFile {
  learner: Learner,
}

#[derive(Deserialize)]
struct Learner {
  #[serde(default)]
  feature_names:       Vec<String>,
  gradient_booster:    GradientBooster,
  learner_model_param: LearnerModelParam,
  objective:           Objective,
}

#[derive(Deserialize)]
struct GradientBooster {
  name:  String,
  #[serde(default)]
  model: Option<TreeEnsemble>,
}

#[derive(Deserialize)]
struct TreeEnsemble {
  trees: Vec<RawTree>,
}

#[derive(Deserialize)]
struct RawTree {
  left_children:    Vec<i64>,
  right_children:   Vec<i64>,
  split_indices:    Vec<i64>,
  split_conditions: Vec<f32>,
  default_left:     Vec<Flag>,
}

/// Written as `true`/`false` by XGBoost 1.x and as `1`/`0` by 2.x.
#[derive(Deserialize, Clone, Copy)]
#[serde(untagged)]
enum Flag {
  Bool(bool),
  Int(i64),
}

impl Flag {
  fn is_set(self) -> bool {
    match self {
      Flag::Bool(b) => b,
      Flag::Int(i) => i != 0,
    }
  }
}

#[derive(Deserialize)]
struct LearnerModelParam {
  base_score:  String,
  #[serde(default)]
  num_feature: Option<String>,
  #[serde(default)]
  num_class:   Option<String>,
  #[serde(default)]
  num_target:  Option<String>,
}

#[derive(Deserialize)]
struct Objective {
  name: String,
}

// ─── Validated model ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
  Identity,
  Log,
}

impl Link {
  fn for_objective(name: &str) -> Option<Self> {
    match name {
      "reg:squarederror" | "reg:squaredlogerror" | "reg:absoluteerror" | "reg:pseudohubererror"
      | "reg:linear" => Some(Link::Identity),
      "reg:gamma" | "reg:tweedie" | "count:poisson" => Some(Link::Log),
      _ => None,
    }
  }
}

#[derive(Debug, Clone)]
enum Node {
  Leaf(f32),
  Split {
    feature:      usize,
    threshold:    f32,
    left:         usize,
    right:        usize,
    default_left: bool,
  },
}

#[derive(Debug, Clone)]
struct Tree {
  nodes: Vec<Node>,
}

impl Tree {
  fn from_raw(index: usize, raw: RawTree, num_feature: usize) -> Result<Self, ModelError> {
    let malformed = |reason: String| ModelError::MalformedTree { tree: index, reason };

    let n = raw.left_children.len();
    if n == 0 {
      return Err(malformed("no nodes".into()));
    }
    if [
      raw.right_children.len(),
      raw.split_indices.len(),
      raw.split_conditions.len(),
      raw.default_left.len(),
    ]
    .iter()
    .any(|&len| len != n)
    {
      return Err(malformed("node arrays differ in length".into()));
    }

    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
      let (left, right) = (raw.left_children[i], raw.right_children[i]);
      if left == -1 {
        nodes.push(Node::Leaf(raw.split_conditions[i]));
        continue;
      }
      // Children always come after their parent, which also rules out cycles.
      let child = |c: i64| usize::try_from(c).ok().filter(|&c| c > i && c < n);
      let (Some(left), Some(right)) = (child(left), child(right)) else {
        return Err(malformed(format!("node {i} has invalid children {left}/{right}")));
      };
      let feature = usize::try_from(raw.split_indices[i])
        .ok()
        .filter(|&f| f < num_feature)
        .ok_or_else(|| malformed(format!("node {i} splits on unknown feature")))?;
      nodes.push(Node::Split {
        feature,
        threshold: raw.split_conditions[i],
        left,
        right,
        default_left: raw.default_left[i].is_set(),
      });
    }
    Ok(Self { nodes })
  }

  fn leaf_value(&self, features: &[f32]) -> f32 {
    let mut i = 0;
    loop {
      match self.nodes[i] {
        Node::Leaf(value) => return value,
        Node::Split { feature, threshold, left, right, default_left } => {
          let x = features[feature];
          i = if x.is_nan() {
            if default_left { left } else { right }
          } else if x < threshold {
            left
          } else {
            right
          };
        }
      }
    }
  }
}

/// A loaded, validated gradient-boosted tree ensemble.
#[derive(Debug, Clone)]
pub struct BoosterModel {
  trees:       Vec<Tree>,
  base_margin: f32,
  link:        Link,
  objective:   String,
  num_feature: usize,
}

fn parse_base_score(raw: &str) -> Result<f32, ModelError> {
  let trimmed = raw.trim();
  let inner = trimmed
    .strip_prefix('[')
    .and_then(|s| s.strip_suffix(']'))
    .unwrap_or(trimmed);
  let mut values = inner.split(',').map(str::trim).filter(|s| !s.is_empty());
  let (Some(first), None) = (values.next(), values.next()) else {
    return Err(ModelError::Unsupported(format!("base_score {raw:?} is not a single value")));
  };
  first
    .parse::<f32>()
    .map_err(|_| ModelError::Unsupported(format!("base_score {raw:?} is not a number")))
}

fn parse_count(field: &str, raw: Option<&str>) -> Result<Option<usize>, ModelError> {
  raw
    .map(|s| {
      s.trim()
        .parse::<usize>()
        .map_err(|_| ModelError::Unsupported(format!("{field} {s:?} is not a count")))
    })
    .transpose()
}

impl BoosterModel {
  /// Read and validate the model at `path`.
  pub fn load(path: &Path) -> Result<Self, ModelError> {
    let raw = std::fs::read_to_string(path)
      .map_err(|source| ModelError::Io { path: path.to_path_buf(), source })?;
    Self::from_json(&raw)
  }

  pub fn from_json(raw: &str) -> Result<Self, ModelError> {
    let file: ModelFile = serde_json::from_str(raw)?;
    let learner = file.learner;

    if learner.gradient_booster.name != "gbtree" {
      return Err(ModelError::Unsupported(format!(
        "booster {:?}",
        learner.gradient_booster.name
      )));
    }
    let link = Link::for_objective(&learner.objective.name)
      .ok_or_else(|| ModelError::Unsupported(format!("objective {:?}", learner.objective.name)))?;

    if !learner.feature_names.is_empty() && learner.feature_names != FEATURE_NAMES {
      return Err(ModelError::Unsupported(format!(
        "feature names {:?}, expected {FEATURE_NAMES:?}",
        learner.feature_names
      )));
    }

    let param = &learner.learner_model_param;
    if parse_count("num_class", param.num_class.as_deref())?.unwrap_or(0) > 1
      || parse_count("num_target", param.num_target.as_deref())?.unwrap_or(1) > 1
    {
      return Err(ModelError::Unsupported("multi-output boosters".into()));
    }
    let num_feature =
      parse_count("num_feature", param.num_feature.as_deref())?.unwrap_or(FEATURE_NAMES.len());

    let base_score = parse_base_score(&param.base_score)?;
    let base_margin = match link {
      Link::Identity => base_score,
      Link::Log if base_score > 0.0 => base_score.ln(),
      Link::Log => {
        return Err(ModelError::Unsupported(format!(
          "base_score {base_score} with a log-link objective"
        )));
      }
    };

    let ensemble = learner
      .gradient_booster
      .model
      .ok_or_else(|| ModelError::Unsupported("gbtree without trees".into()))?;
    let trees = ensemble
      .trees
      .into_iter()
      .enumerate()
      .map(|(i, raw)| Tree::from_raw(i, raw, num_feature))
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self {
      trees,
      base_margin,
      link,
      objective: learner.objective.name,
      num_feature,
    })
  }

  pub fn num_trees(&self) -> usize { self.trees.len() }

  pub fn num_features(&self) -> usize { self.num_feature }

  pub fn objective(&self) -> &str { &self.objective }

  /// Predict for one row laid out as [`FEATURE_NAMES`]. `NaN` marks a
  /// missing value.
  pub fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
    if features.len() != self.num_feature {
      return Err(ModelError::FeatureCount {
        expected: self.num_feature,
        actual:   features.len(),
      });
    }
    let row: Vec<f32> = features.iter().map(|&x| x as f32).collect();

    let margin = self.base_margin + self.trees.iter().map(|t| t.leaf_value(&row)).sum::<f32>();
    let value = match self.link {
      Link::Identity => margin,
      Link::Log => margin.exp(),
    };

    if value.is_finite() {
      Ok(f64::from(value))
    } else {
      Err(ModelError::NonFinite)
    }
  }
}
