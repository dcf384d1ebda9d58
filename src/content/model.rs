use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type LearnLineId = String;

/// How the learner moves past a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NextAction {
    /// No learner input required, move on immediately.
    AutoProceed,
    /// Wait for an explicit continue from the learner.
    ContinueButton,
}

impl NextAction {
    /// Whether the cursor may move past an item with this action without learner input.
    pub fn proceeds_automatically(action: Option<NextAction>) -> bool {
        !matches!(action, Some(NextAction::ContinueButton))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionTrigger {
    ContinueButton,
}

/// Equation balance settings handed to the focused content surface.
///
/// Every field is optional: a config only overwrites the fields it carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_side: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_side: Option<String>,
    /// Value of the unknown that balances the equation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_value: Option<f64>,
    /// Symbol rendered for the unknown ("x", "🍎", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_evaluation: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "contentType", rename_all = "camelCase")]
pub enum ContentKind {
    Text {
        text: String,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    MathProblem {
        problem: String,
    },
    #[serde(rename_all = "camelCase")]
    Visualization {
        #[serde(default, alias = "text", skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
        config: VisualizationConfig,
    },
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text { .. } => "text",
            ContentKind::Image { .. } => "image",
            ContentKind::MathProblem { .. } => "mathProblem",
            ContentKind::Visualization { .. } => "visualization",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<NextAction>,
    #[serde(flatten)]
    pub kind: ContentKind,
}

impl ContentItem {
    pub fn visualization(&self) -> Option<&VisualizationConfig> {
        match &self.kind {
            ContentKind::Visualization { config, .. } => Some(config),
            ContentKind::Text { .. } | ContentKind::Image { .. } | ContentKind::MathProblem { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MathProblem {
    pub id: String,
    pub problem: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "assessmentType", rename_all = "camelCase")]
pub enum AssessmentKind {
    #[serde(rename_all = "camelCase")]
    ProblemSet {
        problems: Vec<MathProblem>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_correct: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    #[serde(flatten)]
    pub kind: AssessmentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_trigger: Option<CompletionTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<Assessment>,
}

/// Display strings of a learn line in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineTranslation {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnLine {
    pub id: LearnLineId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<LearnLineId>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_assessment: Option<Assessment>,
    /// Per-language display strings keyed by language code.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub translations: BTreeMap<String, LineTranslation>,
}

impl LearnLine {
    pub fn new(id: impl Into<LearnLineId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            example: None,
            prerequisites: Vec::new(),
            tags: Vec::new(),
            steps: Vec::new(),
            final_assessment: None,
            translations: BTreeMap::new(),
        }
    }

    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<LearnLineId>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn content_at(&self, step_index: usize, content_index: usize) -> Option<&ContentItem> {
        self.steps.get(step_index)?.content.get(content_index)
    }

    /// Total number of content items across all steps.
    pub fn content_len(&self) -> usize {
        self.steps.iter().map(|step| step.content.len()).sum()
    }
}
