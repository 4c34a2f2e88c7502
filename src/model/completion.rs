/// Default sampling temperature for completions
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// A single request to the AI completion endpoint
#[derive(Clone, PartialEq, Debug)]
pub struct CompletionRequest {
    /// Instructions for the model
    pub system_prompt: String,
    /// The actual user content
    pub user_prompt: String,
    /// Maximum number of tokens to generate, always greater than zero
    pub max_tokens: u32,
    /// Sampling temperature, always in the `[0, 2]` range
    pub temperature: f32,
}

impl CompletionRequest {
    /// Builds a new request with the default temperature.
    ///
    /// A `max_tokens` of zero is raised to one.
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens: max_tokens.max(1),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Updates the temperature, clamped to the `[0, 2]` range
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = if temperature.is_nan() {
            DEFAULT_TEMPERATURE
        } else {
            temperature.clamp(0.0, 2.0)
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_request_bounds() {
        let req = CompletionRequest::new("sys", "user", 0).with_temperature(3.5);
        assert_eq!(req.max_tokens, 1);
        assert_eq!(req.temperature, 2.0);

        let req = CompletionRequest::new("sys", "user", 220).with_temperature(f32::NAN);
        assert_eq!(req.max_tokens, 220);
        assert_eq!(req.temperature, DEFAULT_TEMPERATURE);
    }
}
