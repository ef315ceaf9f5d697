//! Risk regression over scaled feature vectors.
//!
//! `TreeEnsemble` evaluates a gradient-boosted tree model saved in XGBoost's
//! JSON format (`booster.save_model("risk_model.json")`). Only `gbtree`
//! boosters with an identity-link regression objective are accepted; the
//! prediction is `base_score + Σ leaf values`.

use std::path::Path;

use ndarray::Array1;
use serde::Deserialize;
use tracing::info;
use triage_core::{Error, Result};

/// Feature vector → scalar risk.
pub trait RiskRegressor: Send + Sync {
    fn predict(&self, features: &Array1<f64>) -> Result<f64>;
}

const IDENTITY_OBJECTIVES: &[&str] = &[
    "reg:squarederror",
    "reg:squaredlogerror",
    "reg:pseudohubererror",
    "reg:absoluteerror",
    "reg:linear",
];

#[derive(Deserialize)]
struct ModelFile {
    learner: LearnerFile,
}

#[derive(Deserialize)]
struct LearnerFile {
    gradient_booster: BoosterFile,
    learner_model_param: LearnerParam,
    objective: ObjectiveFile,
}

#[derive(Deserialize)]
struct BoosterFile {
    name: String,
    model: Option<GbTreeFile>,
}

#[derive(Deserialize)]
struct GbTreeFile {
    trees: Vec<TreeFile>,
}

#[derive(Deserialize)]
struct LearnerParam {
    base_score: String,
    #[serde(default)]
    num_feature: Option<String>,
}

#[derive(Deserialize)]
struct ObjectiveFile {
    name: String,
}

#[derive(Deserialize)]
struct TreeFile {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<u64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
}

/// XGBoost writes `default_left` as 0/1 integers in some versions and as
/// booleans in others.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn as_bool(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Int(i) => *i != 0,
        }
    }
}

/// One regression tree in flat array form. A node is a leaf when it has no
/// left child; a leaf's `condition` holds its output value.
#[derive(Debug, Clone)]
struct Tree {
    left: Vec<i64>,
    right: Vec<i64>,
    feature: Vec<usize>,
    condition: Vec<f32>,
    default_left: Vec<bool>,
}

impl Tree {
    fn from_file(index: usize, file: TreeFile) -> Result<Self> {
        let n = file.left_children.len();
        let invalid = |msg: String| Error::Config(format!("tree {}: {}", index, msg));

        if n == 0 {
            return Err(invalid("no nodes".into()));
        }
        if file.right_children.len() != n
            || file.split_indices.len() != n
            || file.split_conditions.len() != n
            || file.default_left.len() != n
        {
            return Err(invalid("node arrays differ in length".into()));
        }
        for node in 0..n {
            let (l, r) = (file.left_children[node], file.right_children[node]);
            if l == -1 {
                continue;
            }
            // Children always come after their parent, which rules out cycles.
            for child in [l, r] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(invalid(format!("node {} has invalid child {}", node, child)));
                }
            }
        }

        Ok(Self {
            left: file.left_children,
            right: file.right_children,
            feature: file.split_indices.into_iter().map(|i| i as usize).collect(),
            condition: file.split_conditions,
            default_left: file.default_left.iter().map(Flag::as_bool).collect(),
        })
    }

    fn max_feature(&self) -> Option<usize> {
        (0..self.left.len())
            .filter(|&i| self.left[i] != -1)
            .map(|i| self.feature[i])
            .max()
    }

    fn leaf_value(&self, features: &[f32]) -> f32 {
        let mut node = 0usize;
        loop {
            let left = self.left[node];
            if left == -1 {
                return self.condition[node];
            }
            let x = features.get(self.feature[node]).copied().unwrap_or(f32::NAN);
            let go_left = if x.is_nan() {
                self.default_left[node]
            } else {
                x < self.condition[node]
            };
            node = (if go_left { left } else { self.right[node] }) as usize;
        }
    }
}

/// Gradient-boosted regression trees.
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    base_score: f32,
    trees: Vec<Tree>,
    num_features: usize,
}

impl TreeEnsemble {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(json)?;
        let learner = file.learner;

        let objective = learner.objective.name;
        if !IDENTITY_OBJECTIVES.contains(&objective.as_str()) {
            return Err(Error::Config(format!(
                "unsupported objective '{}': expected a regression objective",
                objective
            )));
        }
        if learner.gradient_booster.name != "gbtree" {
            return Err(Error::Config(format!(
                "unsupported booster '{}': expected gbtree",
                learner.gradient_booster.name
            )));
        }
        let model = learner
            .gradient_booster
            .model
            .ok_or_else(|| Error::Config("gbtree model section missing".into()))?;

        let base_score = parse_base_score(&learner.learner_model_param.base_score)?;
        let trees = model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| Tree::from_file(i, t))
            .collect::<Result<Vec<_>>>()?;

        let declared = learner
            .learner_model_param
            .num_feature
            .as_deref()
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let used = trees
            .iter()
            .filter_map(Tree::max_feature)
            .max()
            .map(|m| m + 1)
            .unwrap_or(0);
        if declared != 0 && used > declared {
            return Err(Error::Config(format!(
                "trees split on feature {} but the model declares {} features",
                used - 1,
                declared
            )));
        }

        Ok(Self {
            base_score,
            trees,
            num_features: declared.max(used),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let model = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!(
            "Risk model loaded: {} trees, {} features from {}",
            model.trees.len(),
            model.num_features,
            path.display()
        );
        Ok(model)
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }
}

/// `base_score` is a plain number string ("5E-1") or, since XGBoost 2.1, a
/// bracketed vector ("[5E-1]").
fn parse_base_score(raw: &str) -> Result<f32> {
    let inner = raw.trim().trim_start_matches('[').trim_end_matches(']');
    inner
        .split(',')
        .next()
        .map(str::trim)
        .and_then(|s| s.parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Config(format!("invalid base_score '{}'", raw)))
}

impl RiskRegressor for TreeEnsemble {
    fn predict(&self, features: &Array1<f64>) -> Result<f64> {
        if features.len() != self.num_features {
            return Err(Error::Inference(format!(
                "feature width mismatch: model expects {}, got {}",
                self.num_features,
                features.len()
            )));
        }
        // XGBoost evaluates splits in single precision.
        let x: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let margin = self
            .trees
            .iter()
            .fold(self.base_score, |acc, tree| acc + tree.leaf_value(&x));
        Ok(f64::from(margin))
    }
}
