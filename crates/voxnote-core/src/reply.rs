use crate::config::ReplyConfig;
use crate::types::ExtractedContent;

const TEXT_PLACEHOLDER: &str = "{text}";

/// Builds the outbound message text for a pipeline run.
#[derive(Debug, Clone)]
pub struct ReplyFormatter {
    template: String,
    not_recognized: String,
    failure: String,
}

impl ReplyFormatter {
    pub fn new(config: &ReplyConfig) -> Self {
        Self {
            template: config.template.clone(),
            not_recognized: config.not_recognized.clone(),
            failure: config.failure.clone(),
        }
    }

    pub fn format(&self, content: &ExtractedContent) -> String {
        if content.is_empty() {
            return self.not_recognized.clone();
        }
        self.template.replace(TEXT_PLACEHOLDER, content.value())
    }

    pub fn failure(&self) -> &str {
        &self.failure
    }

    pub fn not_recognized(&self) -> &str {
        &self.not_recognized
    }
}

impl Default for ReplyFormatter {
    fn default() -> Self {
        Self::new(&ReplyConfig::default())
    }
}
