use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ProfolioError, ProfolioResult};
use crate::schema;

// Default prompts for the generation service
pub const DEFAULT_TECHNIQUE_DETAIL_SYSTEM_PROMPT: &str = "You are a senior UX practitioner who explains research and design techniques to working designers. You answer with practical, specific guidance and only cite resources that exist.";
pub const DEFAULT_TECHNIQUE_DETAIL_USER_PROMPT: &str = "Explain the UX technique \"{technique_name}\". Give an overview of what it is and when it pays off, the prerequisites a team needs before starting, the numbered execution steps (each with a short title and a description), tools for creating the deliverable and guides for learning the technique (each with a title and URL), a rough time and effort estimate, the situations it is best for, and practical tips.";
pub const DEFAULT_FULL_PORTFOLIO_SYSTEM_PROMPT: &str = "You are a UX portfolio editor. You turn a designer's working notes into concise, credible case studies written in the first person, without inventing results that the notes do not support.";
pub const DEFAULT_FULL_PORTFOLIO_USER_PROMPT: &str = "Below are techniques a designer applied, each tagged with the project it belongs to. Write exactly one case study per distinct project_name, using the project_name values exactly as given. For each project, synthesize tags, aggregate the metadata (date, duration, team size, role), write a combined overview, problem statement and motivation, rewrite the prerequisites and execution steps of every technique as concise portfolio-ready sentences grouped by technique, and describe the impact of the work.\n\n{techniques}";

/// Identity of a prompt template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    TechniqueDetail,
    FullPortfolio,
}

impl TemplateId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::TechniqueDetail => "technique_detail",
            TemplateId::FullPortfolio => "full_portfolio",
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateId {
    type Err = ProfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "technique_detail" => Ok(TemplateId::TechniqueDetail),
            "full_portfolio" => Ok(TemplateId::FullPortfolio),
            other => Err(ProfolioError::validation("template", format!("unknown template '{}'", other))),
        }
    }
}

/// System and user prompt ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// User-configurable prompt text; `None` falls back to the defaults above
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptOverrides {
    pub technique_detail_system_prompt: Option<String>,
    pub technique_detail_user_prompt: Option<String>,
    pub full_portfolio_system_prompt: Option<String>,
    pub full_portfolio_user_prompt: Option<String>,
}

/// A prompt template with declared input and output schemas
pub trait PromptTemplate: Send + Sync {
    fn id(&self) -> TemplateId;

    /// JSON schema the caller's input must satisfy
    fn input_schema(&self) -> Value;

    /// JSON schema the generated output must satisfy
    fn output_schema(&self) -> Value;

    /// Interpolate validated input into the prompt text
    fn render(&self, input: &Value) -> ProfolioResult<RenderedPrompt>;
}

pub struct TechniqueDetailTemplate {
    system_prompt: String,
    user_prompt: String,
}

impl TechniqueDetailTemplate {
    pub fn new(overrides: &PromptOverrides) -> Self {
        Self {
            system_prompt: overrides
                .technique_detail_system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_TECHNIQUE_DETAIL_SYSTEM_PROMPT.to_string()),
            user_prompt: overrides
                .technique_detail_user_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_TECHNIQUE_DETAIL_USER_PROMPT.to_string()),
        }
    }
}

impl PromptTemplate for TechniqueDetailTemplate {
    fn id(&self) -> TemplateId {
        TemplateId::TechniqueDetail
    }

    fn input_schema(&self) -> Value {
        schema::technique_detail_input()
    }

    fn output_schema(&self) -> Value {
        schema::technique_detail_output()
    }

    fn render(&self, input: &Value) -> ProfolioResult<RenderedPrompt> {
        let technique_name = input["technique_name"]
            .as_str()
            .ok_or_else(|| ProfolioError::validation("technique_name", "is required"))?;

        Ok(RenderedPrompt {
            system: self.system_prompt.clone(),
            user: self.user_prompt.replace("{technique_name}", technique_name.trim()),
        })
    }
}

pub struct FullPortfolioTemplate {
    system_prompt: String,
    user_prompt: String,
}

impl FullPortfolioTemplate {
    pub fn new(overrides: &PromptOverrides) -> Self {
        Self {
            system_prompt: overrides
                .full_portfolio_system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_FULL_PORTFOLIO_SYSTEM_PROMPT.to_string()),
            user_prompt: overrides
                .full_portfolio_user_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_FULL_PORTFOLIO_USER_PROMPT.to_string()),
        }
    }
}

impl PromptTemplate for FullPortfolioTemplate {
    fn id(&self) -> TemplateId {
        TemplateId::FullPortfolio
    }

    fn input_schema(&self) -> Value {
        schema::full_portfolio_input()
    }

    fn output_schema(&self) -> Value {
        schema::full_portfolio_output()
    }

    fn render(&self, input: &Value) -> ProfolioResult<RenderedPrompt> {
        let techniques = serde_json::to_string_pretty(&input["techniques"])?;

        Ok(RenderedPrompt {
            system: self.system_prompt.clone(),
            user: self.user_prompt.replace("{techniques}", &techniques),
        })
    }
}

/// Every template the generator serves, built from the configured overrides
pub fn default_templates(overrides: &PromptOverrides) -> Vec<Box<dyn PromptTemplate>> {
    vec![
        Box::new(TechniqueDetailTemplate::new(overrides)),
        Box::new(FullPortfolioTemplate::new(overrides)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_technique_detail_interpolation() {
        let template = TechniqueDetailTemplate::new(&PromptOverrides::default());
        let prompt = template.render(&json!({ "technique_name": " Card Sorting " })).unwrap();

        assert!(prompt.user.contains("\"Card Sorting\""));
        assert!(!prompt.user.contains("{technique_name}"));
        assert_eq!(prompt.system, DEFAULT_TECHNIQUE_DETAIL_SYSTEM_PROMPT);
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let overrides = PromptOverrides {
            technique_detail_user_prompt: Some("Describe {technique_name} briefly".to_string()),
            ..Default::default()
        };
        let template = TechniqueDetailTemplate::new(&overrides);
        let prompt = template.render(&json!({ "technique_name": "Surveys" })).unwrap();

        assert_eq!(prompt.user, "Describe Surveys briefly");
    }

    #[test]
    fn test_portfolio_prompt_embeds_techniques() {
        let template = FullPortfolioTemplate::new(&PromptOverrides::default());
        let input = json!({
            "techniques": [{ "project_name": "Checkout", "technique_name": "Surveys", "prerequisites": [], "execution_steps": [] }]
        });
        let prompt = template.render(&input).unwrap();

        assert!(prompt.user.contains("\"project_name\": \"Checkout\""));
    }

    #[test]
    fn test_template_id_parsing() {
        assert_eq!("full_portfolio".parse::<TemplateId>().unwrap(), TemplateId::FullPortfolio);
        assert!("summary".parse::<TemplateId>().is_err());
        assert_eq!(TemplateId::TechniqueDetail.to_string(), "technique_detail");
    }
}
