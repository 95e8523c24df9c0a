//! Prompt composition.

use immigra_service::completion::{CompletionRequest, Message};

use crate::{AgentInput, AgentRequest, PersonaConfig};

/// Ordered messages sent to the provider: system, history, current question.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    pub messages: Vec<Message>,
}

impl ComposedPrompt {
    /// Composes the prompt for a request. Deterministic.
    pub fn compose(request: &AgentRequest, persona: &PersonaConfig) -> Self {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(Message::system(persona.system_instruction.clone()));
        messages.extend(request.history.iter().cloned());

        let current = match &request.input {
            AgentInput::Text(text) => Message::user(text.clone()),
            AgentInput::Image { prompt, image } => {
                Message::user_with_image(prompt.clone(), image.clone())
            }
        };
        messages.push(current);

        Self { messages }
    }

    /// Builds the provider request using the persona's limits.
    pub fn into_request(self, model: &str, persona: &PersonaConfig) -> CompletionRequest {
        CompletionRequest::new(model, self.messages)
            .with_temperature(persona.temperature)
            .with_max_tokens(persona.max_output_tokens)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use immigra_service::completion::{ImageData, Role};

    use super::*;
    use crate::{AgentKind, PersonaTable};

    fn persona(kind: AgentKind) -> PersonaConfig {
        PersonaTable::builtin().get(kind).cloned().unwrap()
    }

    #[test]
    fn system_then_history_then_question() {
        let request = AgentRequest {
            kind: AgentKind::Citizenship,
            input: AgentInput::Text("When can I apply?".into()),
            history: vec![
                Message::user("I got my green card in 2021."),
                Message::assistant("Congratulations!"),
            ],
            document_id: None,
        };
        let persona = persona(AgentKind::Citizenship);

        let prompt = ComposedPrompt::compose(&request, &persona);
        assert_eq!(prompt.len(), 4);
        assert_eq!(prompt.messages[0].role, Role::System);
        assert_eq!(prompt.messages[0].content.text(), persona.system_instruction);
        assert_eq!(prompt.messages[1], Message::user("I got my green card in 2021."));
        assert_eq!(prompt.messages[3], Message::user("When can I apply?"));

        assert_eq!(ComposedPrompt::compose(&request, &persona), prompt);
    }

    #[test]
    fn image_goes_into_the_last_message() {
        let image = ImageData::new("image/jpeg", vec![0xFF, 0xD8, 0xFF]);
        let request = AgentRequest {
            kind: AgentKind::Image,
            input: AgentInput::Image {
                prompt: "Read this visa stamp".into(),
                image,
            },
            history: vec![],
            document_id: None,
        };
        let persona = persona(AgentKind::Image);

        let completion = ComposedPrompt::compose(&request, &persona).into_request("gpt-4o", &persona);
        assert_eq!(completion.messages.len(), 2);
        assert!(completion.has_image());
        assert_eq!(completion.max_tokens, persona.max_output_tokens);
        assert_eq!(completion.temperature, persona.temperature);
        assert_eq!(completion.model, "gpt-4o");
    }
}
