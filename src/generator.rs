use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::errors::{ProfolioError, ProfolioResult};
use crate::llm_handler::GenerationService;
use crate::portfolio::PortfolioInput;
use crate::prompts::{self, PromptOverrides, PromptTemplate, TemplateId};
use crate::schema;

/// Title + URL pair pointing at an external resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueResources {
    pub creation_tools: Vec<ResourceLink>,
    pub guides: Vec<ResourceLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub step_number: u32,
    pub title: String,
    pub description: String,
}

/// Generated elaboration of a single technique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueDetail {
    pub overview: String,
    pub prerequisites: Vec<String>,
    pub execution_steps: Vec<ExecutionStep>,
    pub resources: TechniqueResources,
    #[serde(default)]
    pub time_estimate: Option<String>,
    #[serde(default)]
    pub best_for: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseStudyMetadata {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub team_size: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseStudyTechnique {
    pub technique_name: String,
    pub prerequisites: Vec<String>,
    pub execution_steps: Vec<String>,
}

/// One project's case study in the compiled portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseStudy {
    pub project_name: String,
    pub tags: Vec<String>,
    pub metadata: CaseStudyMetadata,
    pub overview: String,
    pub problem_statement: String,
    #[serde(default)]
    pub why: Option<String>,
    pub techniques: Vec<CaseStudyTechnique>,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PortfolioOutput {
    projects: Vec<CaseStudy>,
}

/// Schema-checked prompt orchestration over an injected generation service
pub struct ContentGenerator {
    service: Arc<dyn GenerationService>,
    templates: HashMap<TemplateId, Box<dyn PromptTemplate>>,
}

impl ContentGenerator {
    pub fn new(service: Arc<dyn GenerationService>, overrides: &PromptOverrides) -> Self {
        let templates = prompts::default_templates(overrides)
            .into_iter()
            .map(|template| (template.id(), template))
            .collect();

        Self { service, templates }
    }

    fn template(&self, template_id: TemplateId) -> ProfolioResult<&dyn PromptTemplate> {
        self.templates
            .get(&template_id)
            .map(|template| template.as_ref())
            .ok_or_else(|| ProfolioError::Config(format!("Template {} is not registered", template_id)))
    }

    /// Validate the input, render the prompt, call the service once and
    /// validate what comes back. Invalid input never reaches the service.
    pub async fn generate(&self, template_id: TemplateId, input: &Value) -> ProfolioResult<Value> {
        let template = self.template(template_id)?;

        schema::validate(&template.input_schema(), input)?;
        let prompt = template.render(input)?;
        let output_schema = template.output_schema();

        info!("Generating {} content", template_id);
        let output = self
            .service
            .generate(&prompt, &output_schema)
            .await?
            .ok_or_else(|| ProfolioError::Generation(format!("{}: the service returned no output", template_id)))?;

        if let Err(e) = schema::validate(&output_schema, &output) {
            error!("{} output failed validation: {}", template_id, e);
            return Err(ProfolioError::Generation(format!("{}: output did not match schema ({})", template_id, e)));
        }

        Ok(output)
    }

    pub async fn technique_detail(&self, technique_name: &str) -> ProfolioResult<TechniqueDetail> {
        self.technique_detail_from(&json!({ "technique_name": technique_name }))
            .await
    }

    /// Technique detail for a raw request body, validated against the input schema
    pub async fn technique_detail_from(&self, input: &Value) -> ProfolioResult<TechniqueDetail> {
        let output = self.generate(TemplateId::TechniqueDetail, input).await?;

        serde_json::from_value(output)
            .map_err(|e| ProfolioError::Generation(format!("technique_detail: {}", e)))
    }

    /// One case study per distinct project name in the input
    pub async fn full_portfolio(&self, input: &PortfolioInput) -> ProfolioResult<Vec<CaseStudy>> {
        let output = self
            .generate(TemplateId::FullPortfolio, &serde_json::to_value(input)?)
            .await?;
        let output: PortfolioOutput = serde_json::from_value(output)
            .map_err(|e| ProfolioError::Generation(format!("full_portfolio: {}", e)))?;

        check_projects(&input.project_names(), &output.projects)?;
        Ok(output.projects)
    }
}

// The generated case studies must cover each requested project exactly once
fn check_projects(expected: &[String], case_studies: &[CaseStudy]) -> ProfolioResult<()> {
    let expected_set: HashSet<&str> = expected.iter().map(|s| s.as_str()).collect();
    let mut seen = HashSet::new();

    for case_study in case_studies {
        let name = case_study.project_name.as_str();
        if !expected_set.contains(name) {
            return Err(ProfolioError::Generation(format!("unexpected project '{}' in portfolio", name)));
        }
        if !seen.insert(name) {
            return Err(ProfolioError::Generation(format!("project '{}' appears more than once", name)));
        }
    }

    let missing: Vec<&str> = expected
        .iter()
        .map(|s| s.as_str())
        .filter(|name| !seen.contains(name))
        .collect();
    if !missing.is_empty() {
        return Err(ProfolioError::Generation(format!("portfolio is missing projects: {}", missing.join(", "))));
    }

    Ok(())
}
