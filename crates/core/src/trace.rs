use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Correlation context spanning every sub-step of one processed turn.
///
/// Created when a turn begins, referenced by each [`StepRecord`], closed when
/// the turn ends. Execution ids are never reused across turns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceScope {
    pub execution_id: String,
    pub agent_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Tool,
    Model,
}

impl StepKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Model => "model",
        }
    }
}

/// One write-once observability entry. The pipeline never reads these back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub node_name: String,
    pub node_type: StepKind,
    pub input: Value,
    pub output: Value,
    pub execution_id: String,
}

/// A step captured before it is bound to a trace scope.
#[derive(Clone, Debug, PartialEq)]
pub struct StepDraft {
    pub node_name: String,
    pub node_type: StepKind,
    pub input: Value,
    pub output: Value,
}

impl StepDraft {
    pub fn new(
        node_name: impl Into<String>,
        node_type: StepKind,
        input: Value,
        output: Value,
    ) -> Self {
        Self { node_name: node_name.into(), node_type, input, output }
    }

    pub fn bind(self, scope: &TraceScope) -> StepRecord {
        StepRecord {
            node_name: self.node_name,
            node_type: self.node_type,
            input: self.input,
            output: self.output,
            execution_id: scope.execution_id.clone(),
        }
    }
}
