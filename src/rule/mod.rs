//! Rule templater.
//!
//! # Responsibilities
//! - Compile the default rule template once per builder
//! - Evaluate it per instance against `.Name` / `.Labels`
//!
//! # Design Decisions
//! - Evaluation never fails the caller: any error renders as an empty rule
//! - Helper functions are pure and see only the instance context

pub mod funcs;
pub mod template;

pub use funcs::normalize_name;
pub use template::{RuleContext, Template, TemplateError, Value};

/// A precompiled rule template that renders to an empty rule on failure.
#[derive(Debug, Clone)]
pub struct RuleTemplate {
    compiled: Result<Template, TemplateError>,
}

impl RuleTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = Template::parse(&source);
        if let Err(e) = &compiled {
            tracing::warn!(
                template = %source,
                error = %e,
                "Rule template does not parse, instances without an explicit rule get no default router"
            );
        }
        Self { compiled }
    }

    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }

    /// Evaluate for one instance. Returns an empty string if the template is invalid or fails.
    pub fn render(&self, ctx: RuleContext<'_>) -> String {
        let Ok(template) = &self.compiled else {
            return String::new();
        };
        match template.execute(ctx) {
            Ok(rule) => rule,
            Err(e) => {
                tracing::warn!(instance = %ctx.name, error = %e, "Rule template evaluation failed");
                String::new()
            }
        }
    }
}
