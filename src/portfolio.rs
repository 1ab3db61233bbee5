use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::generator::CaseStudy;
use crate::models::{ChecklistItem, RemixWithProject, PLACEHOLDER_PROJECT_NAME};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioChecklistEntry {
    pub text: String,
    pub checked: bool,
}

impl From<&ChecklistItem> for PortfolioChecklistEntry {
    fn from(item: &ChecklistItem) -> Self {
        Self {
            text: item.text.clone(),
            checked: item.checked,
        }
    }
}

/// A remix flattened for the full portfolio prompt, tagged with its project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTechnique {
    pub project_name: String,
    pub technique_name: String,
    pub date: Option<String>,
    pub duration: Option<String>,
    pub team_size: Option<String>,
    pub role: Option<String>,
    pub why: Option<String>,
    pub overview: Option<String>,
    pub problem_statement: Option<String>,
    pub prerequisites: Vec<PortfolioChecklistEntry>,
    pub execution_steps: Vec<PortfolioChecklistEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioInput {
    pub techniques: Vec<PortfolioTechnique>,
}

impl PortfolioInput {
    /// Distinct project names in first-seen order. Names are compared
    /// exactly; "Checkout" and "checkout " are different projects.
    pub fn project_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for technique in &self.techniques {
            if !names.contains(&technique.project_name) {
                names.push(technique.project_name.clone());
            }
        }
        names
    }
}

impl From<&RemixWithProject> for PortfolioTechnique {
    fn from(entry: &RemixWithProject) -> Self {
        let remix = &entry.remix;
        Self {
            project_name: entry
                .project_name
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_PROJECT_NAME.to_string()),
            technique_name: remix.technique_name.clone(),
            date: remix.date.map(|d| d.format("%Y-%m-%d").to_string()),
            duration: remix.duration.clone(),
            team_size: remix.team_size.clone(),
            role: remix.role.clone(),
            why: remix.why.clone(),
            overview: remix.overview.clone(),
            problem_statement: remix.problem_statement.clone(),
            prerequisites: remix.prerequisites.iter().map(PortfolioChecklistEntry::from).collect(),
            execution_steps: remix.execution_steps.iter().map(PortfolioChecklistEntry::from).collect(),
        }
    }
}

/// Flatten remixes into the full portfolio input, keeping each project's
/// techniques together in the order the projects first appear
pub fn build_portfolio_input(remixes: &[RemixWithProject]) -> PortfolioInput {
    let flattened: Vec<PortfolioTechnique> = remixes.iter().map(PortfolioTechnique::from).collect();
    let unordered = PortfolioInput { techniques: flattened };

    let mut techniques = Vec::with_capacity(unordered.techniques.len());
    for project_name in unordered.project_names() {
        techniques.extend(
            unordered
                .techniques
                .iter()
                .filter(|t| t.project_name == project_name)
                .cloned(),
        );
    }

    PortfolioInput { techniques }
}

/// Render generated case studies as a Markdown portfolio document
pub fn render_markdown(case_studies: &[CaseStudy]) -> String {
    let mut doc = String::from("# Portfolio\n");

    for study in case_studies {
        let _ = write!(doc, "\n## {}\n\n", study.project_name);

        if !study.tags.is_empty() {
            let _ = writeln!(doc, "_{}_\n", study.tags.join(" · "));
        }

        let metadata = [
            ("Date", &study.metadata.date),
            ("Duration", &study.metadata.duration),
            ("Team size", &study.metadata.team_size),
            ("Role", &study.metadata.role),
        ];
        let mut wrote_metadata = false;
        for (label, value) in metadata {
            if let Some(value) = value {
                let _ = writeln!(doc, "- **{}:** {}", label, value);
                wrote_metadata = true;
            }
        }
        if wrote_metadata {
            doc.push('\n');
        }

        let _ = write!(doc, "### Overview\n\n{}\n\n", study.overview);
        let _ = write!(doc, "### Problem\n\n{}\n\n", study.problem_statement);
        if let Some(why) = study.why.as_deref().filter(|w| !w.trim().is_empty()) {
            let _ = write!(doc, "### Why\n\n{}\n\n", why);
        }

        if !study.techniques.is_empty() {
            doc.push_str("### Process\n");
            for technique in &study.techniques {
                let _ = write!(doc, "\n#### {}\n", technique.technique_name);
                if !technique.prerequisites.is_empty() {
                    doc.push_str("\n**Prerequisites**\n\n");
                    for prerequisite in &technique.prerequisites {
                        let _ = writeln!(doc, "- {}", prerequisite);
                    }
                }
                if !technique.execution_steps.is_empty() {
                    doc.push_str("\n**Execution**\n\n");
                    for (index, step) in technique.execution_steps.iter().enumerate() {
                        let _ = writeln!(doc, "{}. {}", index + 1, step);
                    }
                }
            }
            doc.push('\n');
        }

        let _ = writeln!(doc, "### Impact\n\n{}", study.impact);
    }

    doc
}
