use std::collections::HashSet;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

// Stage under which techniques missing from the stage table are grouped
pub const UNSTAGED_GROUP: &str = "Other";

// Define the process stages of a UX project
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProcessStage {
    Discover,
    Define,
    Ideate,
    Prototype,
    Test,
}

impl ProcessStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProcessStage::Discover => "Discover",
            ProcessStage::Define => "Define",
            ProcessStage::Ideate => "Ideate",
            ProcessStage::Prototype => "Prototype",
            ProcessStage::Test => "Test",
        }
    }

    pub fn all_stages() -> Vec<ProcessStage> {
        vec![
            ProcessStage::Discover,
            ProcessStage::Define,
            ProcessStage::Ideate,
            ProcessStage::Prototype,
            ProcessStage::Test,
        ]
    }

    fn techniques(&self) -> &'static [&'static str] {
        match self {
            ProcessStage::Discover => &[
                "Stakeholder Interviews",
                "User Interviews",
                "Contextual Inquiry",
                "Surveys",
                "Diary Studies",
                "Analytics Review",
                "Competitive Analysis",
                "Heuristic Evaluation",
                "Content Audit",
                "Interface Inventory",
            ],
            ProcessStage::Define => &[
                "Affinity Diagramming",
                "Empathy Mapping",
                "Personas",
                "Jobs To Be Done",
                "Customer Journey Mapping",
                "Service Blueprinting",
                "Problem Statements",
                "Card Sorting",
                "User Flows",
            ],
            ProcessStage::Ideate => &[
                "How Might We",
                "Sketching",
                "Crazy Eights",
                "Storyboarding",
                "Design Studio",
                "Moodboards",
            ],
            ProcessStage::Prototype => &[
                "Sitemapping",
                "Content Modeling",
                "Wireframing",
                "Paper Prototyping",
                "Prototyping",
                "Visual Design",
                "Style Guide",
                "Component Library",
            ],
            ProcessStage::Test => &[
                "Usability Testing",
                "Tree Testing",
                "First Click Testing",
                "Preference Testing",
                "A/B Testing",
                "Accessibility Audit",
            ],
        }
    }
}

// Output type -> techniques that produce it
const OUTPUT_TYPE_TECHNIQUES: &[(&str, &[&str])] = &[
    ("User Research", &["User Interviews", "Contextual Inquiry", "Surveys", "Diary Studies", "Analytics Review", "Affinity Diagramming"]),
    ("Personas", &["User Interviews", "Surveys", "Empathy Mapping", "Personas", "Jobs To Be Done"]),
    ("Journey Map", &["User Interviews", "Empathy Mapping", "Customer Journey Mapping", "Service Blueprinting"]),
    ("Problem Definition", &["Stakeholder Interviews", "How Might We", "Problem Statements", "Jobs To Be Done"]),
    ("Information Architecture", &["Content Audit", "Card Sorting", "Sitemapping", "User Flows", "Tree Testing"]),
    ("Wireframe", &["Sketching", "Crazy Eights", "User Flows", "Wireframing", "Paper Prototyping"]),
    ("Prototype", &["Storyboarding", "Paper Prototyping", "Prototyping", "Usability Testing"]),
    ("UI Design", &["Moodboards", "Design Studio", "Visual Design", "Style Guide", "Prototyping", "Preference Testing"]),
    ("Design System", &["Interface Inventory", "Style Guide", "Component Library", "Accessibility Audit"]),
    ("Content Strategy", &["Stakeholder Interviews", "Content Audit", "Content Modeling", "Sitemapping"]),
    ("Competitive Analysis", &["Stakeholder Interviews", "Competitive Analysis", "Heuristic Evaluation", "Analytics Review"]),
    ("Service Blueprint", &["Stakeholder Interviews", "Contextual Inquiry", "Customer Journey Mapping", "Service Blueprinting"]),
    ("Usability Report", &["Heuristic Evaluation", "Usability Testing", "First Click Testing", "A/B Testing", "Accessibility Audit"]),
];

lazy_static! {
    static ref BUILTIN_CATALOG: TechniqueCatalog = TechniqueCatalog::builtin();
}

/// Techniques recommended for one process stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecommendation {
    pub stage: String,
    pub techniques: Vec<String>,
}

/// Static lookup tables from output types and process stages to technique names.
///
/// Both tables keep their declaration order, which is the order stages are
/// presented in and the order output types are listed in.
#[derive(Debug, Clone)]
pub struct TechniqueCatalog {
    output_types: Vec<(String, Vec<String>)>,
    stages: Vec<(String, Vec<String>)>,
}

impl TechniqueCatalog {
    pub fn new(output_types: Vec<(String, Vec<String>)>, stages: Vec<(String, Vec<String>)>) -> Self {
        Self { output_types, stages }
    }

    fn builtin() -> Self {
        let output_types = OUTPUT_TYPE_TECHNIQUES
            .iter()
            .map(|(name, techniques)| {
                (name.to_string(), techniques.iter().map(|t| t.to_string()).collect())
            })
            .collect();

        let stages = ProcessStage::all_stages()
            .into_iter()
            .map(|stage| {
                (
                    stage.display_name().to_string(),
                    stage.techniques().iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();

        Self::new(output_types, stages)
    }

    pub fn output_type_names(&self) -> Vec<String> {
        self.output_types.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|(name, _)| name.clone()).collect()
    }

    fn techniques_for_output_type(&self, output_type: &str) -> &[String] {
        self.output_types
            .iter()
            .find(|(name, _)| name == output_type)
            .map(|(_, techniques)| techniques.as_slice())
            .unwrap_or(&[])
    }

    /// Union of the technique lists of every output type, in input order,
    /// without duplicates. Unknown output types contribute nothing.
    pub fn resolve<S: AsRef<str>>(&self, output_types: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for output_type in output_types {
            for technique in self.techniques_for_output_type(output_type.as_ref()) {
                if seen.insert(technique.as_str()) {
                    resolved.push(technique.clone());
                }
            }
        }

        resolved
    }

    /// Techniques listed for a stage; the stage name is matched case-insensitively
    pub fn resolve_for_stage(&self, stage: &str) -> Vec<String> {
        let stage = stage.trim();
        self.stages
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(stage))
            .map(|(_, techniques)| techniques.clone())
            .unwrap_or_default()
    }

    /// Resolved techniques grouped by the stage that lists them. Stages come in
    /// catalog order and empty stages are dropped; a technique appears under
    /// the first stage that lists it.
    pub fn recommend_by_stage<S: AsRef<str>>(&self, output_types: &[S]) -> Vec<StageRecommendation> {
        let resolved = self.resolve(output_types);
        let mut placed: HashSet<String> = HashSet::new();
        let mut recommendations = Vec::new();

        for (stage, stage_techniques) in &self.stages {
            let techniques: Vec<String> = resolved
                .iter()
                .filter(|t| !placed.contains(*t) && stage_techniques.contains(*t))
                .cloned()
                .collect();

            if techniques.is_empty() {
                continue;
            }

            placed.extend(techniques.iter().cloned());
            recommendations.push(StageRecommendation {
                stage: stage.clone(),
                techniques,
            });
        }

        let unstaged: Vec<String> = resolved
            .iter()
            .filter(|t| !placed.contains(*t))
            .cloned()
            .collect();
        if !unstaged.is_empty() {
            recommendations.push(StageRecommendation {
                stage: UNSTAGED_GROUP.to_string(),
                techniques: unstaged,
            });
        }

        recommendations
    }
}

/// The built-in catalog shared by the whole process
pub fn builtin() -> &'static TechniqueCatalog {
    &BUILTIN_CATALOG
}

pub fn resolve<S: AsRef<str>>(output_types: &[S]) -> Vec<String> {
    builtin().resolve(output_types)
}

pub fn resolve_for_stage(stage: &str) -> Vec<String> {
    builtin().resolve_for_stage(stage)
}

pub fn recommend_by_stage<S: AsRef<str>>(output_types: &[S]) -> Vec<StageRecommendation> {
    builtin().recommend_by_stage(output_types)
}
